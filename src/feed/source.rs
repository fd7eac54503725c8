// src/feed/source.rs
//! Where the raw inventory payload comes from.

use crate::{
    config::Config,
    error::{FeedError, Result, RetryPolicy},
};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use std::time::{Duration, Instant};

const FEED_USER_AGENT: &str = concat!("inventory-feed/", env!("CARGO_PKG_VERSION"));
const MAX_RETRY_DELAY: Duration = Duration::from_secs(8);

/// Produces the raw XML document of the upstream feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_raw(&self) -> Result<String>;

    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;
}

/// Fetches the feed over HTTP with a bounded timeout and bounded retries.
pub struct HttpFeedSource {
    client: Client,
    url: String,
    retry: RetryPolicy,
}

impl HttpFeedSource {
    pub fn new(url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(FEED_USER_AGENT)
            .build()
            .map_err(|e| FeedError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
            retry,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let retry = RetryPolicy::new(
            config.feed_max_retries.saturating_add(1),
            Duration::from_millis(config.feed_retry_base_ms),
            MAX_RETRY_DELAY,
        );
        Self::new(&config.feed_url, config.feed_timeout(), retry)
    }

    async fn fetch_once(&self) -> Result<String> {
        debug!("📡 Requesting inventory feed from {}", self.url);

        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(FeedError::Fetch(format!(
                "feed endpoint {} answered {}",
                self.url, status
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_raw(&self) -> Result<String> {
        let started = Instant::now();
        let body = self.retry.execute(|| self.fetch_once()).await?;
        info!(
            "✅ Inventory feed downloaded ({} bytes in {}ms)",
            body.len(),
            started.elapsed().as_millis()
        );
        Ok(body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_uses_retry_settings() {
        let config = Config {
            feed_max_retries: 4,
            feed_retry_base_ms: 250,
            ..Config::default()
        };
        let source = HttpFeedSource::from_config(&config).unwrap();
        assert_eq!(source.retry.max_attempts, 5);
        assert_eq!(source.retry.base_delay, Duration::from_millis(250));
        assert_eq!(source.describe(), config.feed_url);
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_fetch_failure() {
        // Bind then release an ephemeral port so nothing is listening on it.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let source = HttpFeedSource::new(
            &format!("http://127.0.0.1:{}/vehicles.xml", port),
            Duration::from_secs(2),
            RetryPolicy::no_retry(),
        )
        .unwrap();
        let err = source.fetch_raw().await.unwrap_err();
        assert!(err.is_fetch_failure(), "unexpected error: {:?}", err);
    }
}
