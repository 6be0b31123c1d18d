use rand::Rng;
use std::time::Duration;

/// 429 応答時の待機ポリシー
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// attempt 0 の待機時間（以降 2 倍ずつ）
    pub base_delay: Duration,
    /// 指数バックオフの上限（`retry-after` 指定時は適用しない）
    pub max_delay: Duration,
    /// ジッターの上限（`[0, max_jitter)` を加算）
    pub max_jitter: Duration,
    /// 同一ページでの連続リトライ上限。`None` なら無制限
    pub max_retries: Option<u32>,
}

impl BackoffPolicy {
    pub fn new() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(16000),
            max_jitter: Duration::from_millis(250),
            max_retries: None,
        }
    }

    /// 待機なし（テスト用）
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
            max_retries: None,
        }
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// ジッターを含まない待機時間
    ///
    /// サーバーが `retry-after` を返していればそれを優先し、
    /// なければ `min(max_delay, base_delay * 2^attempt)`。
    pub fn base_delay_for(&self, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
        if let Some(secs) = retry_after_secs.filter(|s| *s > 0) {
            return Duration::from_secs(secs);
        }
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
            .min(self.max_delay)
    }

    /// ジッターを加えた実際の待機時間
    pub fn delay_for(&self, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
        self.base_delay_for(attempt, retry_after_secs) + self.jitter()
    }

    /// リトライ上限を超えたかどうか
    pub fn exhausted(&self, attempt: u32) -> bool {
        self.max_retries.is_some_and(|max| attempt >= max)
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max_ms))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new()
    }
}
