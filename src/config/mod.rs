pub mod settings;

pub use settings::Config;

use crate::error::FeedError;
use std::sync::Arc;
use url::Url;

/// Loads the configuration from the environment (and `.env` when present).
pub fn load_config() -> Result<Arc<Config>, FeedError> {
    dotenv::dotenv().ok(); // Load .env file if present, ignore errors

    let config = Config::from_env();
    validate(&config)?;
    config.validate_and_log();

    Ok(Arc::new(config))
}

/// Rejects configurations the feed client cannot work with.
pub fn validate(config: &Config) -> Result<(), FeedError> {
    for (name, value) in [
        ("FEED_URL", &config.feed_url),
        ("IMAGE_BASE_URL", &config.image_base_url),
    ] {
        let url = Url::parse(value)
            .map_err(|e| FeedError::Config(format!("{} is not a valid URL: {}", name, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(FeedError::Config(format!(
                "{} must use http or https, got {}",
                name,
                url.scheme()
            )));
        }
    }
    Ok(())
}
