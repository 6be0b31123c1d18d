use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 分析アシスタントへの入力
///
/// エクスポートしたCSVを加工せず `fileText` として渡す。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub user_prompt: String,
    pub file_text: String,
}

impl AnalysisRequest {
    pub fn new(user_prompt: impl Into<String>, file_text: impl Into<String>) -> Result<Self> {
        let user_prompt = user_prompt.into();
        let file_text = file_text.into();

        if user_prompt.trim().is_empty() || file_text.is_empty() {
            return Err(Error::InvalidInput(
                "Prompt and file texts are required.".to_string(),
            ));
        }

        Ok(Self {
            user_prompt,
            file_text,
        })
    }
}
