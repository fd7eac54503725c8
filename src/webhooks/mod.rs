// src/webhooks/mod.rs
//! Inbound HTTP: the revalidation webhook and the JSON read API
//!
//! This module provides:
//! - The invalidation gateway (shared-secret check, cache clear, stale routes)
//! - The axum router serving inventory reads and the webhook

pub mod revalidate;
pub mod server;
pub mod types;

pub use revalidate::{PageInvalidator, RecordingInvalidator, Revalidator, StaleMark};
pub use server::{router, AppState, InventoryServer};
pub use types::*;
