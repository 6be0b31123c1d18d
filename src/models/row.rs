use serde::{Deserialize, Serialize};
use serde_json::Value;

/// CSVの列（順序固定）
pub const COLUMNS: [&str; 18] = [
    "key",
    "id",
    "type",
    "project",
    "summary",
    "status",
    "priority",
    "assignee",
    "reporter",
    "created",
    "updated",
    "resolved",
    "sprint",
    "labels",
    "fixVersions",
    "components",
    "storyPoints",
    "descriptionText",
];

/// 1 Issue を平坦化した行
///
/// 全列が常に存在する。欠損値は空文字列。`story_points` のみ元の値を保持する。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRow {
    pub key: String,
    pub id: String,
    #[serde(rename = "type")]
    pub issue_type: String,
    pub project: String,
    pub summary: String,
    pub status: String,
    pub priority: String,
    pub assignee: String,
    pub reporter: String,
    pub created: String,
    pub updated: String,
    pub resolved: String,
    pub sprint: String,
    pub labels: String,
    pub fix_versions: String,
    pub components: String,
    pub story_points: Value,
    pub description_text: String,
}

impl NormalizedRow {
    /// `COLUMNS` と同じ順序のセル列
    pub fn to_record(&self) -> [String; 18] {
        [
            self.key.clone(),
            self.id.clone(),
            self.issue_type.clone(),
            self.project.clone(),
            self.summary.clone(),
            self.status.clone(),
            self.priority.clone(),
            self.assignee.clone(),
            self.reporter.clone(),
            self.created.clone(),
            self.updated.clone(),
            self.resolved.clone(),
            self.sprint.clone(),
            self.labels.clone(),
            self.fix_versions.clone(),
            self.components.clone(),
            render_scalar(&self.story_points),
            self.description_text.clone(),
        ]
    }
}

/// スカラー値をセル文字列に変換
///
/// 整数値の浮動小数（`3.0`）は `3` と表記する。オブジェクトや配列はJSON表記。
pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
