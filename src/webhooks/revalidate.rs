// src/webhooks/revalidate.rs
//! Authenticated on-demand invalidation.
//!
//! A trusted upstream system posts the shared secret; on a match the
//! inventory cache is cleared and every inventory route pattern is handed to
//! the page layer as stale.

use crate::{
    cache::FeedCache,
    error::RevalidateError,
    utils::constant_time_eq,
    webhooks::types::{RevalidateRequest, RevalidateResponse, StaleRoute, INVENTORY_ROUTES},
};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Receives the route patterns whose rendered pages are now stale.
pub trait PageInvalidator: Send + Sync {
    fn mark_stale(&self, route: &StaleRoute);
}

/// One stale-route signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaleMark {
    pub route: StaleRoute,
    pub marked_at: DateTime<Utc>,
}

/// Revalidation rounds kept by a default [`RecordingInvalidator`].
pub const RETAINED_ROUNDS: usize = 16;

/// Logs each route and keeps the marks of the most recent rounds.
#[derive(Debug)]
pub struct RecordingInvalidator {
    marks: Mutex<VecDeque<StaleMark>>,
    capacity: usize,
}

impl Default for RecordingInvalidator {
    fn default() -> Self {
        Self::with_retained_rounds(RETAINED_ROUNDS)
    }
}

impl RecordingInvalidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `rounds` full revalidations; older marks are dropped first.
    pub fn with_retained_rounds(rounds: usize) -> Self {
        let capacity = rounds.max(1) * INVENTORY_ROUTES.len();
        Self {
            marks: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Retained marks, oldest first.
    pub fn marks(&self) -> Vec<StaleMark> {
        self.lock().iter().cloned().collect()
    }

    /// Marks from the most recent revalidation, one per route pattern.
    pub fn latest(&self) -> Vec<StaleMark> {
        let marks = self.lock();
        let start = marks.len().saturating_sub(INVENTORY_ROUTES.len());
        marks.iter().skip(start).cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<StaleMark>> {
        self.marks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PageInvalidator for RecordingInvalidator {
    fn mark_stale(&self, route: &StaleRoute) {
        info!("[ISR] Revalidated: {}", route.pattern);
        let mut marks = self.lock();
        if marks.len() == self.capacity {
            marks.pop_front();
        }
        marks.push_back(StaleMark {
            route: *route,
            marked_at: Utc::now(),
        });
    }
}

/// The invalidation gateway.
pub struct Revalidator {
    cache: FeedCache,
    secret: Option<String>,
    pages: Arc<dyn PageInvalidator>,
}

impl Revalidator {
    /// An empty secret is treated as unset.
    pub fn new(cache: FeedCache, secret: Option<String>, pages: Arc<dyn PageInvalidator>) -> Self {
        Self {
            cache,
            secret: secret.filter(|s| !s.is_empty()),
            pages,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Checks the supplied secret against the configured one.
    pub fn authorize(&self, supplied: Option<&str>) -> Result<(), RevalidateError> {
        let expected = match self.secret.as_deref() {
            Some(secret) => secret,
            None => {
                warn!("[ISR] WEBHOOK_SECRET not configured");
                return Err(RevalidateError::NotConfigured);
            }
        };

        match supplied {
            Some(given) if constant_time_eq(given.as_bytes(), expected.as_bytes()) => Ok(()),
            _ => {
                warn!("[ISR] Invalid webhook secret received");
                Err(RevalidateError::Unauthorized)
            }
        }
    }

    /// Authorizes, clears the cache, then marks every inventory route stale.
    pub fn revalidate(
        &self,
        request: &RevalidateRequest,
    ) -> Result<RevalidateResponse, RevalidateError> {
        self.authorize(request.secret.as_deref())?;

        info!("[ISR] Webhook received - Starting revalidation");
        self.cache.clear_cache();
        for route in INVENTORY_ROUTES.iter() {
            self.pages.mark_stale(route);
        }

        Ok(RevalidateResponse::at(Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cache_with_fixture, fixtures};
    use crate::webhooks::types::RouteKind;
    use std::time::Duration;

    fn gateway(secret: Option<&str>) -> (Revalidator, FeedCache, Arc<RecordingInvalidator>) {
        let (cache, _source) = cache_with_fixture(fixtures::THREE_VEHICLES, Duration::from_secs(300));
        let pages = Arc::new(RecordingInvalidator::new());
        let revalidator = Revalidator::new(cache.clone(), secret.map(str::to_string), pages.clone());
        (revalidator, cache, pages)
    }

    fn request(secret: Option<&str>) -> RevalidateRequest {
        RevalidateRequest {
            secret: secret.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_matching_secret_clears_and_marks_routes() {
        let (revalidator, cache, pages) = gateway(Some("abc"));
        cache.get_vehicles().await.unwrap();
        assert!(cache.snapshot().is_some());

        let response = revalidator.revalidate(&request(Some("abc"))).unwrap();
        assert!(response.revalidated);
        assert!(cache.snapshot().is_none());

        let patterns: Vec<_> = pages.marks().iter().map(|m| m.route.pattern).collect();
        assert_eq!(
            patterns,
            vec![
                "/vehicles",
                "/vehicles/[manufacturer]",
                "/vehicles/[manufacturer]/[model]",
                "/vehicles/[manufacturer]/[model]/[id]",
            ]
        );
        assert_eq!(pages.marks()[0].route.kind, RouteKind::Path);
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let (revalidator, cache, pages) = gateway(Some("abc"));
        assert_eq!(
            revalidator.revalidate(&request(Some("xyz"))),
            Err(RevalidateError::Unauthorized)
        );
        assert_eq!(
            revalidator.revalidate(&request(None)),
            Err(RevalidateError::Unauthorized)
        );
        assert!(pages.marks().is_empty());
        assert_eq!(cache.stats().clears, 0);
    }

    #[test]
    fn test_unset_secret_is_not_configured() {
        for server_secret in [None, Some("")] {
            let (revalidator, cache, _pages) = gateway(server_secret);
            assert!(!revalidator.is_configured());
            for supplied in [None, Some(""), Some("abc")] {
                assert_eq!(
                    revalidator.revalidate(&request(supplied)),
                    Err(RevalidateError::NotConfigured)
                );
            }
            assert_eq!(cache.stats().clears, 0);
        }
    }

    #[test]
    fn test_latest_returns_last_round() {
        let (revalidator, _cache, pages) = gateway(Some("abc"));
        revalidator.revalidate(&request(Some("abc"))).unwrap();
        revalidator.revalidate(&request(Some("abc"))).unwrap();
        assert_eq!(pages.marks().len(), 8);
        assert_eq!(pages.latest().len(), 4);
    }

    #[test]
    fn test_recorded_marks_are_bounded() {
        let (cache, _source) = cache_with_fixture(fixtures::THREE_VEHICLES, Duration::from_secs(300));
        let pages = Arc::new(RecordingInvalidator::with_retained_rounds(2));
        let revalidator = Revalidator::new(cache, Some("abc".to_string()), pages.clone());

        for _ in 0..5 {
            revalidator.revalidate(&request(Some("abc"))).unwrap();
        }

        let marks = pages.marks();
        assert_eq!(marks.len(), 2 * INVENTORY_ROUTES.len());
        assert_eq!(marks[0].route.pattern, "/vehicles");
        assert_eq!(pages.latest().len(), INVENTORY_ROUTES.len());
        assert_eq!(RecordingInvalidator::new().capacity, RETAINED_ROUNDS * INVENTORY_ROUTES.len());
    }
}
