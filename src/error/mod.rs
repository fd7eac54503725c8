// src/error/mod.rs
//! Error taxonomy for the inventory feed and the revalidation webhook.

use log::{debug, error, info, warn};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// Failures of the fetch/parse/cache pipeline.
///
/// `Clone` so that every caller waiting on a shared refresh receives the same error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// Upstream feed unreachable, non-success status, or body read failure
    #[error("Fetch Error: {0}")]
    Fetch(String),

    /// Upstream feed did not answer within the transport timeout
    #[error("Timeout Error: {0}")]
    Timeout(String),

    /// Payload is not a `<vehicles>` XML document
    #[error("Parse Error: {0}")]
    Parse(String),

    /// Invalid process configuration
    #[error("Config Error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(format!("feed request timed out: {}", err))
        } else {
            FeedError::Fetch(format!("feed request failed: {}", err))
        }
    }
}

impl From<quick_xml::Error> for FeedError {
    fn from(err: quick_xml::Error) -> Self {
        FeedError::Parse(format!("malformed feed XML: {}", err))
    }
}

impl FeedError {
    /// True for every failure that happened before a payload was obtained.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, FeedError::Fetch(_) | FeedError::Timeout(_))
    }

    /// Transport-level failures are worth another attempt; a bad payload is not.
    pub fn should_retry(&self) -> bool {
        match self {
            FeedError::Fetch(_) => true,
            FeedError::Timeout(_) => true,
            FeedError::Parse(_) => false,
            FeedError::Config(_) => false,
        }
    }

    /// Categorizes error for logging
    pub fn categorize(&self) -> ErrorCategory {
        match self {
            FeedError::Fetch(_) | FeedError::Timeout(_) => ErrorCategory::Network,
            FeedError::Parse(_) => ErrorCategory::Data,
            FeedError::Config(_) => ErrorCategory::Configuration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
}

/// Rejections of the revalidation webhook.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RevalidateError {
    /// No server-side secret is configured
    #[error("Webhook not configured")]
    NotConfigured,

    /// Supplied secret does not match
    #[error("Invalid secret")]
    Unauthorized,

    /// Request body could not be decoded
    #[error("Revalidation failed: {0}")]
    BadRequest(String),
}

impl RevalidateError {
    /// HTTP status the webhook answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            RevalidateError::NotConfigured => 500,
            RevalidateError::Unauthorized => 401,
            RevalidateError::BadRequest(_) => 500,
        }
    }

    /// Message placed in the `error` field of the response body.
    pub fn public_message(&self) -> &'static str {
        match self {
            RevalidateError::NotConfigured => "Webhook not configured",
            RevalidateError::Unauthorized => "Invalid secret",
            RevalidateError::BadRequest(_) => "Revalidation failed",
        }
    }
}

/// Retry policy with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Calculate delay for a given attempt (exponential backoff)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }

        let exponent = (attempt - 1).min(16);
        let delay_ms = self.base_delay.as_millis() * 2_u128.pow(exponent);
        let delay = Duration::from_millis(delay_ms.min(self.max_delay.as_millis()) as u64);

        debug!("Retry attempt {}: delay = {:?}", attempt, delay);
        delay
    }

    /// Execute operation with retry logic
    pub async fn execute<F, T, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = self.delay_for_attempt(attempt);
                // Up to 10% jitter.
                let jitter_ms = fastrand::u64(0..=(delay.as_millis() as u64 / 10));
                sleep(delay + Duration::from_millis(jitter_ms)).await;
            }

            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!("Feed fetch succeeded after {} retries", attempt);
                    }
                    return Ok(result);
                }
                Err(e) => {
                    if !e.should_retry() {
                        warn!("Non-retryable error on attempt {}: {}", attempt + 1, e);
                        return Err(e);
                    }
                    warn!("Attempt {} failed: {} (retrying...)", attempt + 1, e);
                    last_error = Some(e);
                }
            }
        }

        error!("All {} feed fetch attempts failed", self.max_attempts);
        Err(last_error.unwrap_or_else(|| FeedError::Fetch("max retries exceeded".to_string())))
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_retry_classification() {
        assert!(FeedError::Fetch("503".into()).should_retry());
        assert!(FeedError::Timeout("slow".into()).should_retry());
        assert!(!FeedError::Parse("bad".into()).should_retry());
        assert!(FeedError::Timeout("slow".into()).is_fetch_failure());
        assert!(!FeedError::Parse("bad".into()).is_fetch_failure());
    }

    #[test]
    fn test_revalidate_status_codes() {
        assert_eq!(RevalidateError::NotConfigured.status_code(), 500);
        assert_eq!(RevalidateError::Unauthorized.status_code(), 401);
        assert_eq!(
            RevalidateError::BadRequest("eof".into()).public_message(),
            "Revalidation failed"
        );
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::new(5, Duration::from_millis(500), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parse_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(10));
        let counter = calls.clone();
        let result: Result<()> = policy
            .execute(|| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(FeedError::Parse("not xml".into())) }
            })
            .await;
        assert!(matches!(result, Err(FeedError::Parse(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_errors_retry_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(10));
        let counter = calls.clone();
        let result = policy
            .execute(|| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(FeedError::Fetch("connection reset".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
