use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Search failed: {status} {body}")]
    SearchFailed { status: u16, body: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Rate limit still exceeded after {attempts} retries")]
    RateLimitExceeded { attempts: u32 },

    #[error("Export cancelled")]
    Cancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// 呼び出し側による中断かどうか
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// 設定エラーかどうか
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::ConfigurationMissing(_) | Error::InvalidConfiguration(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_failed_message_contains_status_and_body() {
        let err = Error::SearchFailed {
            status: 400,
            body: "{\"errorMessages\":[\"bad jql\"]}".to_string(),
        };

        let message = err.to_string();
        assert!(message.contains("400"));
        assert!(message.contains("bad jql"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(Error::ConfigurationMissing("JIRA_EMAIL".to_string()).is_configuration());
        assert!(Error::InvalidConfiguration("bad url".to_string()).is_configuration());
        assert!(!Error::RateLimitExceeded { attempts: 3 }.is_configuration());
    }
}
