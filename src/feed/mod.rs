// src/feed/mod.rs
//! Upstream inventory feed: transport, wire schema and record normalization.

pub mod record;
pub mod schema;
pub mod source;

pub use record::{ImageUrlBuilder, VehicleRecord, IMAGES_PER_VEHICLE};
pub use schema::{FeedDocument, FeedVehicle};
pub use source::{FeedSource, HttpFeedSource};

use crate::error::Result;
use log::debug;

/// Parses a raw payload into normalized records, preserving feed order.
pub fn parse_feed(xml: &str, images: &ImageUrlBuilder) -> Result<Vec<VehicleRecord>> {
    let document = schema::parse_document(xml)?;
    let records: Vec<VehicleRecord> = document
        .vehicles
        .iter()
        .map(|entry| VehicleRecord::from_feed(entry, images))
        .collect();
    debug!("Parsed {} vehicles from feed", records.len());
    Ok(records)
}
