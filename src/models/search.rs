use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 1ページあたりの取得件数（固定）
pub const PAGE_SIZE: u32 = 100;

/// `/search/jql` への1回分のリクエスト
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub jql: String,
    pub max_results: u32,
    pub fields: Vec<String>,
    pub expand: Vec<String>,
    /// 初回リクエストでは `None`。クエリパラメータ自体を送らない
    pub next_page_token: Option<String>,
}

impl PageRequest {
    pub fn new(jql: impl Into<String>) -> Self {
        Self {
            jql: jql.into(),
            max_results: PAGE_SIZE,
            fields: Vec::new(),
            expand: Vec::new(),
            next_page_token: None,
        }
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
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

    pub fn next_page_token(mut self, token: Option<String>) -> Self {
        self.next_page_token = token;
        self
    }

    /// HTTPクエリパラメータに変換（fields / expand はカンマ区切り）
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("jql", self.jql.clone()),
            ("maxResults", self.max_results.to_string()),
            ("fields", self.fields.join(",")),
            ("expand", self.expand.join(",")),
        ];
        if let Some(token) = &self.next_page_token {
            pairs.push(("nextPageToken", token.clone()));
        }
        pairs
    }
}

/// 検索結果の1ページ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageResult {
    #[serde(default)]
    pub issues: Vec<Value>,

    #[serde(rename = "nextPageToken")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl PageResult {
    /// レスポンスボディを寛容に解釈する（`null` は空ページ扱い）
    pub fn from_body(body: Value) -> serde_json::Result<Self> {
        if body.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(body)
    }

    /// このページで打ち切るべきかどうか
    pub fn is_last(&self) -> bool {
        self.issues.is_empty() || self.next_page_token.is_none()
    }
}

/// 1回の検索呼び出しの分類結果
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Page(PageResult),
    /// HTTP 429。`retry-after` ヘッダー（秒）があれば保持する
    Throttled { retry_after_secs: Option<u64> },
    /// 200 / 429 以外のステータス
    Failed { status: u16, body: String },
}
