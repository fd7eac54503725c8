use std::env;
use std::time::Duration;

pub const DEFAULT_FEED_URL: &str =
    "https://www.assets.gnmotors.co.nz/gnmotors-vehicles/gnmotorsr.xml";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://www.assets.gnmotors.co.nz/brands";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone)]
pub struct Config {
    pub feed_url: String,
    pub image_base_url: String,
    pub webhook_secret: Option<String>,
    pub images_unoptimized: bool,
    pub cache_ttl_secs: u64,
    pub feed_timeout_secs: u64,
    pub feed_max_retries: u32,
    pub feed_retry_base_ms: u64,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            feed_url: DEFAULT_FEED_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            webhook_secret: None,
            images_unoptimized: false,
            cache_ttl_secs: 300,
            feed_timeout_secs: 15,
            feed_max_retries: 2,
            feed_retry_base_ms: 500,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

// The secret never reaches the logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("feed_url", &self.feed_url)
            .field("image_base_url", &self.image_base_url)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("images_unoptimized", &self.images_unoptimized)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("feed_timeout_secs", &self.feed_timeout_secs)
            .field("feed_max_retries", &self.feed_max_retries)
            .field("feed_retry_base_ms", &self.feed_retry_base_ms)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        Config {
            feed_url: lookup("FEED_URL").unwrap_or(defaults.feed_url),
            image_base_url: lookup("IMAGE_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.image_base_url),
            webhook_secret: lookup("WEBHOOK_SECRET").filter(|s| !s.is_empty()),
            images_unoptimized: lookup("NEXT_PUBLIC_IMAGE_UNOPTIMIZED")
                .map(|v| v == "true")
                .unwrap_or(false),
            cache_ttl_secs: lookup("CACHE_TTL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_ttl_secs),
            feed_timeout_secs: lookup("FEED_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.feed_timeout_secs),
            feed_max_retries: lookup("FEED_MAX_RETRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.feed_max_retries),
            feed_retry_base_ms: lookup("FEED_RETRY_BASE_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.feed_retry_base_ms),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    pub fn validate_and_log(&self) {
        log::info!("Application Configuration Loaded: {:?}", self);
        if self.webhook_secret.is_none() {
            log::warn!("WEBHOOK_SECRET is not set; /api/revalidate will answer 500");
        }
    }
}
