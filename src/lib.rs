//! Vehicle inventory feed: fetch, parse and time-cache a dealership's XML
//! stock feed, and clear it on demand through an authenticated webhook.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod feed;
pub mod testing;
pub mod utils;
pub mod webhooks;

pub use cache::{CacheStats, FeedCache, InventorySnapshot};
pub use error::{FeedError, RevalidateError};
pub use feed::{FeedSource, HttpFeedSource, ImageUrlBuilder, VehicleRecord};
pub use webhooks::{AppState, InventoryServer, Revalidator};
