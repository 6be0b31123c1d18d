use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 検索APIから返されたままのIssue
///
/// スキーマはインスタンスごとに異なるため、型付けせずJSONのまま保持する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawIssue(pub Value);

impl RawIssue {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// トップレベルの属性（`key`, `id` など）
    pub fn top_level(&self, name: &str) -> Option<&Value> {
        non_null(self.0.get(name))
    }

    /// `fields` 配下の属性
    pub fn field(&self, name: &str) -> Option<&Value> {
        non_null(self.0.get("fields").and_then(|f| f.get(name)))
    }

    /// `fields` 配下をドット区切りのパスで辿る（例: `status.name`）
    ///
    /// 途中のリンクが欠けていれば `None`。
    pub fn field_path(&self, path: &str) -> Option<&Value> {
        let mut current = self.0.get("fields")?;
        for segment in path.split('.') {
            current = non_null(current.get(segment))?;
        }
        Some(current)
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}
