use serde_json::Value;

use crate::document;
use crate::models::{NormalizedRow, RawIssue, render_scalar};

/// ストーリーポイントのカスタムフィールド
pub const STORY_POINTS_FIELD: &str = "customfield_10016";
/// スプリントのカスタムフィールド
pub const SPRINT_FIELD: &str = "customfield_10020";

/// 生のIssueを固定列の行に変換するノーマライザー
///
/// 失敗しない。欠損・null・想定外の型はすべて空文字列に落とす。
pub struct IssueNormalizer;

impl IssueNormalizer {
    pub fn normalize(raw: &RawIssue) -> NormalizedRow {
        NormalizedRow {
            key: text(raw.top_level("key")),
            id: text(raw.top_level("id")),
            issue_type: text(raw.field_path("issuetype.name")),
            project: text(raw.field_path("project.key")),
            summary: text(raw.field("summary")),
            status: text(raw.field_path("status.name")),
            priority: text(raw.field_path("priority.name")),
            assignee: text(raw.field_path("assignee.displayName")),
            reporter: text(raw.field_path("reporter.displayName")),
            created: text(raw.field("created")),
            updated: text(raw.field("updated")),
            resolved: text(raw.field("resolutiondate")),
            sprint: join_tagged(raw.field(SPRINT_FIELD)),
            labels: join_labels(raw.field("labels")),
            fix_versions: join_tagged(raw.field("fixVersions")),
            components: join_tagged(raw.field("components")),
            story_points: raw.field(STORY_POINTS_FIELD).cloned().unwrap_or(Value::Null),
            description_text: description(raw.field("description")),
        }
    }

    pub fn normalize_all(issues: &[RawIssue]) -> Vec<NormalizedRow> {
        issues.iter().map(Self::normalize).collect()
    }
}

fn text(value: Option<&Value>) -> String {
    value.map(render_scalar).unwrap_or_default()
}

/// 文字列ならそのまま、オブジェクトなら `name` → `value` → `id` の順
fn tagged_value(element: &Value) -> String {
    match element {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["name", "value", "id"]
            .iter()
            .filter_map(|attr| map.get(*attr))
            .map(render_scalar)
            .find(|s| !s.is_empty())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn join_tagged(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => items.iter().map(tagged_value).collect::<Vec<_>>().join(";"),
        _ => String::new(),
    }
}

fn join_labels(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|label| match label {
                Value::Object(_) | Value::Array(_) => String::new(),
                scalar => render_scalar(scalar),
            })
            .collect::<Vec<_>>()
            .join(";"),
        _ => String::new(),
    }
}

fn description(value: Option<&Value>) -> String {
    match value {
        Some(doc @ (Value::Object(_) | Value::Array(_))) => document::flatten(doc),
        other => text(other),
    }
}
