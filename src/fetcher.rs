use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff::BackoffPolicy;
use crate::client::SearchApi;
use crate::error::{Error, Result};
use crate::models::{PAGE_SIZE, PageRequest, RawIssue, SearchOutcome};

/// 取得済みIssue数を受け取るコールバック
pub type ProgressCallback = Box<dyn Fn(usize) + Send + Sync>;

/// 全ページ取得の結果
#[derive(Debug, Clone, Default)]
pub struct FetchedIssues {
    /// サーバーが返した順のIssue
    pub issues: Vec<RawIssue>,
    /// 成功したページ数
    pub pages: usize,
    /// 429 によるリトライ回数（全ページ合計）
    pub throttled_retries: u32,
}

/// ページング状態。attempt はページごとにリセットされる
#[derive(Debug, Clone, Default, PartialEq)]
struct FetchState {
    attempt: u32,
    cursor: Option<String>,
}

/// 429 をバックオフで吸収しながら全ページを順に取得する
pub struct IssueFetcher<'a, S: SearchApi + ?Sized> {
    api: &'a S,
    policy: BackoffPolicy,
    on_progress: Option<ProgressCallback>,
}

impl<'a, S: SearchApi + ?Sized> IssueFetcher<'a, S> {
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

    /// カーソルが尽きるまで全ページを取得する
    ///
    /// 429 はポリシーに従って待機して同じページを再送する。それ以外の
    /// 非200応答は `SearchFailed` で即座に失敗する。`cancel` が発火すると
    /// リクエスト中・待機中にかかわらず `Cancelled` を返す。
    pub async fn fetch_all(
        &self,
        jql: &str,
        fields: &[String],
        expand: &[String],
        cancel: &CancellationToken,
    ) -> Result<FetchedIssues> {
        let mut fetched = FetchedIssues::default();
        let mut state = FetchState::default();

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let request = PageRequest::new(jql)
                .max_results(PAGE_SIZE)
                .fields(fields.to_vec())
                .expand(expand.to_vec())
                .next_page_token(state.cursor.clone());

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                outcome = self.api.search_page(&request) => outcome?,
            };

            match outcome {
                SearchOutcome::Throttled { retry_after_secs } => {
                    if self.policy.exhausted(state.attempt) {
                        return Err(Error::RateLimitExceeded {
                            attempts: state.attempt,
                        });
                    }

                    let delay = self.policy.delay_for(state.attempt, retry_after_secs);
                    warn!(
                        status = 429,
                        attempt = state.attempt,
                        retry_after_secs = ?retry_after_secs,
                        "Search throttled, retrying in {:?}",
                        delay
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(Error::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }

                    state.attempt += 1;
                    fetched.throttled_retries += 1;
                }
                SearchOutcome::Failed { status, body } => {
                    return Err(Error::SearchFailed { status, body });
                }
                SearchOutcome::Page(page) => {
                    state.attempt = 0;
                    fetched.pages += 1;

                    let is_last = page.is_last();
                    fetched
                        .issues
                        .extend(page.issues.into_iter().map(RawIssue::new));

                    debug!(
                        page = fetched.pages,
                        total = fetched.issues.len(),
                        "Fetched {} issues",
                        fetched.issues.len()
                    );
                    if let Some(callback) = &self.on_progress {
                        callback(fetched.issues.len());
                    }

                    if is_last {
                        break;
                    }
                    state.cursor = page.next_page_token;
                }
            }
        }

        info!(
            issues = fetched.issues.len(),
            pages = fetched.pages,
            throttled_retries = fetched.throttled_retries,
            "Search completed"
        );
        Ok(fetched)
    }
}
