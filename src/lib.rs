pub mod backoff;
pub mod client;
pub mod csv_export;
pub mod document;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod guard;
pub mod handoff;
pub mod models;
pub mod normalizer;

pub use client::{Auth, JiraClient, JiraConfig, SearchApi};
pub use error::{Error, Result};
pub use models::*;

// Pipeline re-exports
pub use backoff::BackoffPolicy;
pub use csv_export::{UTF8_BOM, serialize, serialize_to_string};
pub use document::{DocNode, flatten};
pub use export::{ExportConfig, ExportReport, IssueExporter, export, export_with_report};
pub use fetcher::{FetchedIssues, IssueFetcher, ProgressCallback};
pub use guard::{GuardedQuery, guard, is_unbounded};
pub use handoff::AnalysisRequest;
pub use normalizer::IssueNormalizer;
