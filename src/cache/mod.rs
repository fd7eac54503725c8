pub mod feed_cache;

pub use feed_cache::{CacheStats, FeedCache, InventorySnapshot, DEFAULT_TTL};

use crate::{
    config::Config,
    error::Result,
    feed::{HttpFeedSource, ImageUrlBuilder},
};
use std::sync::Arc;

/// Builds the production cache: HTTP feed source, configured image host and TTL.
pub fn from_config(config: &Config) -> Result<FeedCache> {
    let source = Arc::new(HttpFeedSource::from_config(config)?);
    Ok(FeedCache::new(
        source,
        ImageUrlBuilder::new(&config.image_base_url),
        config.cache_ttl(),
    ))
}
