use crate::error::{Error, Result};
use crate::models::{PageRequest, PageResult, SearchOutcome};
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode, header};
use std::sync::Arc;
use tracing::warn;
use url::Url;

/// 検索エンドポイント（REST v3, nextPageToken 方式）
pub const SEARCH_ENDPOINT: &str = "/rest/api/3/search/jql";

/// Basic認証（メールアドレス + APIトークン）
#[derive(Debug, Clone, PartialEq)]
pub struct Auth {
    pub username: String,
    pub api_token: String,
}

impl Auth {
    pub fn basic(username: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_token: api_token.into(),
        }
    }

    fn header_value(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.username, self.api_token).as_bytes());
        format!("Basic {}", encoded)
    }

    fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.api_token.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JiraConfig {
    /// 末尾のスラッシュを除いたインスタンスURL
    pub base_url: String,
    pub auth: Auth,
}

impl JiraConfig {
    pub fn new(base_url: impl Into<String>, auth: Auth) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();

        let _ = Url::parse(&base_url)
            .map_err(|_| Error::InvalidConfiguration("Invalid base URL".to_string()))?;

        if !auth.is_complete() {
            return Err(Error::ConfigurationMissing("Jira credentials are empty".to_string()));
        }

        Ok(Self { base_url, auth })
    }
}

/// 検索APIの抽象化（HTTP実装とテスト用の差し替えの境界）
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// 1ページ分を取得し、ステータスに応じて分類する
    async fn search_page(&self, request: &PageRequest) -> Result<SearchOutcome>;
}

#[derive(Debug, Clone)]
pub struct JiraClient {
    pub(crate) client: Client,
    pub(crate) config: Arc<JiraConfig>,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&config.auth.header_value())
                .map_err(|_| Error::InvalidConfiguration("Invalid auth header".to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::InvalidConfiguration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    fn search_url(&self) -> String {
        format!("{}{}", self.config.base_url, SEARCH_ENDPOINT)
    }
}

#[async_trait]
impl SearchApi for JiraClient {
    async fn search_page(&self, request: &PageRequest) -> Result<SearchOutcome> {
        let response = self
            .client
            .get(self.search_url())
            .query(&request.query_pairs())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0);
            return Ok(SearchOutcome::Throttled { retry_after_secs });
        }

        if status != StatusCode::OK {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(status = status.as_u16(), error = %e, "Failed to read search error body");
                    String::new()
                }
            };
            return Ok(SearchOutcome::Failed {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let value: serde_json::Value = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body)?
        };
        Ok(SearchOutcome::Page(PageResult::from_body(value)?))
    }
}
