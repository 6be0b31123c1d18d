use std::env;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::backoff::BackoffPolicy;
use crate::client::{Auth, JiraClient, JiraConfig, SearchApi};
use crate::csv_export;
use crate::error::{Error, Result};
use crate::fetcher::{IssueFetcher, ProgressCallback};
use crate::guard;
use crate::normalizer::IssueNormalizer;

pub const DEFAULT_JQL: &str = "order by created desc";
pub const DEFAULT_BOUND: &str = "updated >= -30d";
pub const DEFAULT_EXPAND: &str = "names,renderedFields";
pub const DEFAULT_FIELDS: &[&str] = &[
    "summary",
    "status",
    "priority",
    "assignee",
    "reporter",
    "labels",
    "fixVersions",
    "components",
    "project",
    "issuetype",
    "description",
    "created",
    "updated",
    "resolutiondate",
    "customfield_10016",
    "customfield_10020",
];

/// エクスポート1回分の設定
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub base_url: String,
    pub auth: Auth,
    /// 検索JQL（フィルター・並び替え）
    pub jql: String,
    /// 全件取得を防ぐために前置するJQL句
    pub default_bound: String,
    pub fields: Vec<String>,
    pub expand: Vec<String>,
}

impl ExportConfig {
    /// 既定値で設定を作成
    pub fn new(base_url: impl Into<String>, auth: Auth) -> Self {
        Self {
            base_url: base_url.into(),
            auth,
            jql: DEFAULT_JQL.to_string(),
            default_bound: DEFAULT_BOUND.to_string(),
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
            expand: split_list(DEFAULT_EXPAND),
        }
    }

    pub fn jql(mut self, jql: impl Into<String>) -> Self {
        self.jql = jql.into();
        self
    }

    pub fn default_bound(mut self, bound: impl Into<String>) -> Self {
        self.default_bound = bound.into();
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    pub fn expand(mut self, expand: Vec<String>) -> Self {
        self.expand = expand;
        self
    }

    /// 環境変数から設定を読み込む
    ///
    /// 必須: `JIRA_BASE_URL`, `JIRA_EMAIL`, `JIRA_API_TOKEN`。
    /// 任意: `JQL`, `DEFAULT_BOUND`, `FIELDS`, `EXPAND`（空なら既定値）。
    pub fn from_env() -> Result<Self> {
        let base_url = env_value("JIRA_BASE_URL");
        let email = env_value("JIRA_EMAIL");
        let token = env_value("JIRA_API_TOKEN");

        let missing: Vec<&str> = [
            ("JIRA_BASE_URL", &base_url),
            ("JIRA_EMAIL", &email),
            ("JIRA_API_TOKEN", &token),
        ]
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| *name)
        .collect();

        let (Some(base_url), Some(email), Some(token)) = (base_url, email, token) else {
            return Err(Error::ConfigurationMissing(format!(
                "Missing env vars: {}",
                missing.join(", ")
            )));
        };

        let mut config = Self::new(base_url, Auth::basic(email, token));
        if let Some(jql) = env_value("JQL") {
            config.jql = jql;
        }
        if let Some(bound) = env_value("DEFAULT_BOUND") {
            config.default_bound = bound;
        }
        if let Some(fields) = env_value("FIELDS") {
            config.fields = split_list(&fields);
        }
        if let Some(expand) = env_value("EXPAND") {
            config.expand = split_list(&expand);
        }
        Ok(config)
    }

    /// 必須項目がすべて揃っているか検証する
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::ConfigurationMissing("base URL is empty".to_string()));
        }
        if self.jql.trim().is_empty() {
            return Err(Error::InvalidConfiguration("search expression is empty".to_string()));
        }
        if self.default_bound.trim().is_empty() {
            return Err(Error::InvalidConfiguration("default bound is empty".to_string()));
        }
        if self.fields.iter().all(|f| f.trim().is_empty()) {
            return Err(Error::InvalidConfiguration("field list is empty".to_string()));
        }
        if self.expand.iter().all(|e| e.trim().is_empty()) {
            return Err(Error::InvalidConfiguration("expand list is empty".to_string()));
        }
        Ok(())
    }

    /// HTTPクライアント用の接続設定（URL・認証の検証を含む）
    pub fn jira_config(&self) -> Result<JiraConfig> {
        JiraConfig::new(self.base_url.clone(), self.auth.clone())
    }
}

/// エクスポート結果の詳細
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// BOM付きのCSVテキスト
    pub csv: String,
    pub row_count: usize,
    pub pages: usize,
    pub throttled_retries: u32,
    /// ガード適用後に実際に送ったJQL
    pub effective_jql: String,
}

/// ガード → 取得 → 正規化 → CSV化をまとめて実行する
pub struct IssueExporter<'a, S: SearchApi + ?Sized> {
    api: &'a S,
    policy: BackoffPolicy,
    on_progress: Option<ProgressCallback>,
}

impl<'a, S: SearchApi + ?Sized> IssueExporter<'a, S> {
    pub fn new(api: &'a S) -> Self {
        Self {
            api,
            policy: BackoffPolicy::default(),
            on_progress: None,
        }
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub async fn export(self, config: &ExportConfig, cancel: &CancellationToken) -> Result<String> {
        Ok(self.export_with_report(config, cancel).await?.csv)
    }

    pub async fn export_with_report(
        self,
        config: &ExportConfig,
        cancel: &CancellationToken,
    ) -> Result<ExportReport> {
        config.validate()?;

        let guarded = guard::guard(&config.jql, &config.default_bound);
        if guarded.rewritten {
            warn!(
                jql = %guarded.jql,
                "Unbounded JQL detected. Using bounded JQL: {}",
                guarded.jql
            );
        }

        let fields = clean_list(&config.fields);
        let expand = clean_list(&config.expand);

        let mut fetcher = IssueFetcher::new(self.api).with_policy(self.policy);
        if let Some(callback) = self.on_progress {
            fetcher = fetcher.with_progress(callback);
        }
        let fetched = fetcher.fetch_all(&guarded.jql, &fields, &expand, cancel).await?;

        let rows = IssueNormalizer::normalize_all(&fetched.issues);
        let csv = csv_export::serialize_to_string(&rows)?;

        info!(
            rows = rows.len(),
            pages = fetched.pages,
            throttled_retries = fetched.throttled_retries,
            "Export completed"
        );

        Ok(ExportReport {
            csv,
            row_count: rows.len(),
            pages: fetched.pages,
            throttled_retries: fetched.throttled_retries,
            effective_jql: guarded.jql,
        })
    }
}

/// 設定からHTTPクライアントを組み立ててエクスポートする
pub async fn export(config: &ExportConfig, cancel: &CancellationToken) -> Result<String> {
    Ok(export_with_report(config, cancel).await?.csv)
}

pub async fn export_with_report(
    config: &ExportConfig,
    cancel: &CancellationToken,
) -> Result<ExportReport> {
    config.validate()?;
    let client = JiraClient::new(config.jira_config()?)?;
    IssueExporter::new(&client)
        .export_with_report(config, cancel)
        .await
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PageRequest, PageResult, SearchOutcome};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingApi {
        requests: Mutex<Vec<PageRequest>>,
    }

    #[async_trait]
    impl SearchApi for RecordingApi {
        async fn search_page(&self, request: &PageRequest) -> Result<SearchOutcome> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(SearchOutcome::Page(PageResult {
                issues: vec![json!({
                    "key": "TEST-1",
                    "id": "1",
                    "fields": { "summary": "Hello, world", "labels": ["a", "b"] }
                })],
                next_page_token: None,
            }))
        }
    }

    fn config() -> ExportConfig {
        ExportConfig::new("https://example.atlassian.net", Auth::basic("me@example.com", "token"))
    }

    #[test]
    fn test_default_config() {
        let config = config();

        assert_eq!(config.jql, "order by created desc");
        assert_eq!(config.default_bound, "updated >= -30d");
        assert_eq!(config.fields.len(), 16);
        assert_eq!(config.expand, vec!["names", "renderedFields"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_values() {
        assert!(config().jql("  ").validate().is_err());
        assert!(config().default_bound("").validate().is_err());
        assert!(config().fields(Vec::new()).validate().is_err());
        assert!(config().expand(vec![" ".to_string()]).validate().is_err());

        let mut missing_url = config();
        missing_url.base_url = String::new();
        assert!(matches!(missing_url.validate(), Err(Error::ConfigurationMissing(_))));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a, b,,c "), vec!["a", "b", "c"]);
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn test_from_env() {
        // Given: 環境変数を設定
        unsafe {
            env::set_var("JIRA_BASE_URL", "https://test.atlassian.net/");
            env::set_var("JIRA_EMAIL", "test@example.com");
            env::set_var("JIRA_API_TOKEN", "secret");
            env::set_var("JQL", "project = TEST");
            env::set_var("FIELDS", "summary, status");
            env::remove_var("EXPAND");
            env::remove_var("DEFAULT_BOUND");
        }

        // When: from_env()を呼び出す
        let result = ExportConfig::from_env();

        // Cleanup（アサーション前に戻す）
        unsafe {
            env::remove_var("JIRA_BASE_URL");
            env::remove_var("JIRA_EMAIL");
            env::remove_var("JIRA_API_TOKEN");
            env::remove_var("JQL");
            env::remove_var("FIELDS");
        }

        // Then: 指定値と既定値が反映される
        let config = result.unwrap();
        assert_eq!(config.base_url, "https://test.atlassian.net/");
        assert_eq!(config.auth, Auth::basic("test@example.com", "secret"));
        assert_eq!(config.jql, "project = TEST");
        assert_eq!(config.fields, vec!["summary", "status"]);
        assert_eq!(config.expand, vec!["names", "renderedFields"]);
        assert_eq!(config.default_bound, DEFAULT_BOUND);
        assert_eq!(
            config.jira_config().unwrap().base_url,
            "https://test.atlassian.net"
        );
    }

    #[tokio::test]
    async fn test_exporter_applies_guard_and_cleans_lists() {
        // Given: 並び替えのみのJQLと空要素を含むフィールド一覧
        let api = RecordingApi {
            requests: Mutex::new(Vec::new()),
        };
        let config = config().fields(vec![
            "summary".to_string(),
            " ".to_string(),
            "labels".to_string(),
        ]);

        // When: エクスポート
        let report = IssueExporter::new(&api)
            .export_with_report(&config, &CancellationToken::new())
            .await
            .unwrap();

        // Then: フォールバック句が前置され、空要素は送られない
        let requests = api.requests.lock().unwrap();
        assert_eq!(requests[0].jql, "updated >= -30d order by created desc");
        assert_eq!(requests[0].fields, vec!["summary", "labels"]);
        assert_eq!(report.effective_jql, "updated >= -30d order by created desc");
        assert_eq!(report.row_count, 1);
        assert!(report.csv.starts_with('\u{feff}'));
        assert!(report.csv.contains("TEST-1,1,,,\"Hello, world\""));
        assert!(report.csv.contains(",a;b,"));
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_any_request() {
        let api = RecordingApi {
            requests: Mutex::new(Vec::new()),
        };

        let result = IssueExporter::new(&api)
            .export(&config().expand(Vec::new()), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
        assert!(api.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_rejects_missing_credentials() {
        let config = ExportConfig::new("https://example.atlassian.net", Auth::basic("", ""));

        let result = export(&config, &CancellationToken::new()).await;

        assert!(matches!(result, Err(Error::ConfigurationMissing(_))));
    }
}
