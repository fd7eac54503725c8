//! Test doubles and fixtures for the feed pipeline.
//!
//! Public so integration tests under `tests/` can build caches without a
//! network.

pub mod fixtures;
pub mod mock_feed;

pub use mock_feed::MockFeedSource;

use crate::{cache::FeedCache, feed::ImageUrlBuilder};
use std::{sync::Arc, time::Duration};

/// Image base used by test caches.
pub const TEST_IMAGE_BASE: &str = "https://images.test/brands";

/// Cache over a mock source serving `xml`, with the given TTL.
pub fn cache_with_fixture(xml: &str, ttl: Duration) -> (FeedCache, Arc<MockFeedSource>) {
    let source = Arc::new(MockFeedSource::new(xml));
    let cache = FeedCache::new(source.clone(), ImageUrlBuilder::new(TEST_IMAGE_BASE), ttl);
    (cache, source)
}
