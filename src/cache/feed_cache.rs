// src/cache/feed_cache.rs
//! Single-slot, time-bounded inventory cache with coalesced refreshes.
//!
//! The slot holds one immutable [`InventorySnapshot`]. A read inside the TTL
//! returns it without touching the network. A read on an empty or expired
//! slot starts a refresh; reads arriving while that refresh is running await
//! the same shared result instead of fetching again.
//!
//! A refresh runs on its own task and finishes even if every caller waiting
//! on it goes away. A failed refresh leaves the slot as it was and hands the
//! error to every waiter.

use crate::{
    catalog,
    error::{FeedError, Result},
    feed::{parse_feed, FeedSource, ImageUrlBuilder, VehicleRecord},
};
use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, error, info};
use serde::Serialize;
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
    time::Duration,
};
use tokio::time::Instant;

/// Default snapshot lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

type Records = Arc<Vec<VehicleRecord>>;
type SharedRefresh = Shared<BoxFuture<'static, Result<Records>>>;

/// One fully parsed copy of the inventory.
#[derive(Debug, Clone)]
pub struct InventorySnapshot {
    pub records: Records,
    pub captured_at: Instant,
}

impl InventorySnapshot {
    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}

struct InFlight {
    id: u64,
    result: SharedRefresh,
}

#[derive(Default)]
struct CacheSlot {
    snapshot: Option<InventorySnapshot>,
    /// Bumped by every clear; a refresh only stores if the generation it
    /// started under is still current.
    generation: u64,
    in_flight: Option<InFlight>,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    refreshes: AtomicU64,
    failures: AtomicU64,
    clears: AtomicU64,
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
    pub refreshes: u64,
    pub failures: u64,
    pub clears: u64,
    pub cached_records: Option<usize>,
    pub snapshot_age_ms: Option<u64>,
    pub ttl_secs: u64,
    pub refresh_in_flight: bool,
}

impl CacheStats {
    /// Share of reads served without starting a refresh
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.coalesced;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Feed cache: {:.1}% hit rate, {} refreshes, {} failures, {} clears",
            self.hit_rate() * 100.0,
            self.refreshes,
            self.failures,
            self.clears
        )
    }
}

struct CacheInner {
    source: Arc<dyn FeedSource>,
    images: ImageUrlBuilder,
    ttl: Duration,
    slot: RwLock<CacheSlot>,
    next_flight_id: AtomicU64,
    counters: Counters,
}

/// The inventory read API.
#[derive(Clone)]
pub struct FeedCache {
    inner: Arc<CacheInner>,
}

impl fmt::Debug for FeedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedCache")
            .field("source", &self.inner.source.describe())
            .field("ttl", &self.inner.ttl)
            .finish()
    }
}

impl FeedCache {
    pub fn new(source: Arc<dyn FeedSource>, images: ImageUrlBuilder, ttl: Duration) -> Self {
        info!(
            "🗄️  Initializing inventory cache (source: {}, TTL: {}s)",
            source.describe(),
            ttl.as_secs()
        );
        Self {
            inner: Arc::new(CacheInner {
                source,
                images,
                ttl,
                slot: RwLock::new(CacheSlot::default()),
                next_flight_id: AtomicU64::new(1),
                counters: Counters::default(),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Current inventory, refreshed from the feed when missing or expired.
    pub async fn get_vehicles(&self) -> Result<Records> {
        if let Some(records) = self.fresh_records() {
            self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!("🎯 Serving cached inventory ({} vehicles)", records.len());
            return Ok(records);
        }

        let pending = {
            let mut slot = self.inner.write_slot();
            // Another caller may have stored a snapshot between the two locks.
            if let Some(snapshot) = slot.snapshot.as_ref().filter(|s| s.is_fresh(self.inner.ttl)) {
                self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(snapshot.records.clone());
            }
            match slot.in_flight.as_ref() {
                Some(flight) => {
                    self.inner.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                    debug!("⏳ Joining in-flight inventory refresh #{}", flight.id);
                    flight.result.clone()
                }
                None => {
                    self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
                    let flight = self.inner.clone().start_refresh(slot.generation);
                    let result = flight.result.clone();
                    slot.in_flight = Some(flight);
                    result
                }
            }
        };

        pending.await
    }

    /// Linear scan by id. Unknown ids are `Ok(None)`.
    pub async fn get_vehicle_by_id(&self, id: &str) -> Result<Option<VehicleRecord>> {
        let records = self.get_vehicles().await?;
        Ok(records.iter().find(|v| v.id == id).cloned())
    }

    /// Case-insensitive match of `query` against manufacturer, model and stock number.
    pub async fn search(&self, query: &str) -> Result<Vec<VehicleRecord>> {
        let records = self.get_vehicles().await?;
        Ok(catalog::search(&records, query))
    }

    /// Drops the held snapshot. Idempotent.
    pub fn clear_cache(&self) {
        let mut slot = self.inner.write_slot();
        let had_snapshot = slot.snapshot.take().is_some();
        slot.generation = slot.generation.wrapping_add(1);
        // Readers after a clear must not join a refresh that began before it.
        slot.in_flight = None;
        self.inner.counters.clears.fetch_add(1, Ordering::Relaxed);
        info!(
            "🧹 Inventory cache cleared (snapshot held: {})",
            had_snapshot
        );
    }

    /// The held snapshot, fresh or not.
    pub fn snapshot(&self) -> Option<InventorySnapshot> {
        self.inner.read_slot().snapshot.clone()
    }

    /// Age of the held snapshot; `None` when the slot is empty.
    pub fn snapshot_age(&self) -> Option<Duration> {
        self.inner.read_slot().snapshot.as_ref().map(InventorySnapshot::age)
    }

    pub fn stats(&self) -> CacheStats {
        let c = &self.inner.counters;
        let slot = self.inner.read_slot();
        CacheStats {
            hits: c.hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            coalesced: c.coalesced.load(Ordering::Relaxed),
            refreshes: c.refreshes.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
            clears: c.clears.load(Ordering::Relaxed),
            cached_records: slot.snapshot.as_ref().map(|s| s.records.len()),
            snapshot_age_ms: slot.snapshot.as_ref().map(|s| s.age().as_millis() as u64),
            ttl_secs: self.inner.ttl.as_secs(),
            refresh_in_flight: slot.in_flight.is_some(),
        }
    }

    fn fresh_records(&self) -> Option<Records> {
        let slot = self.inner.read_slot();
        slot.snapshot
            .as_ref()
            .filter(|s| s.is_fresh(self.inner.ttl))
            .map(|s| s.records.clone())
    }
}

impl CacheInner {
    fn read_slot(&self) -> RwLockReadGuard<'_, CacheSlot> {
        self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, CacheSlot> {
        self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn start_refresh(self: Arc<Self>, generation: u64) -> InFlight {
        let id = self.next_flight_id.fetch_add(1, Ordering::Relaxed);
        info!("📡 Refreshing inventory from {} (refresh #{})", self.source.describe(), id);

        let task = tokio::spawn(async move { self.run_refresh(id, generation).await });
        let result = async move {
            match task.await {
                Ok(result) => result,
                Err(join_error) => Err(FeedError::Fetch(format!(
                    "inventory refresh task aborted: {}",
                    join_error
                ))),
            }
        }
        .boxed()
        .shared();

        InFlight { id, result }
    }

    async fn run_refresh(&self, id: u64, generation: u64) -> Result<Records> {
        let started = Instant::now();
        let outcome = match self.source.fetch_raw().await {
            Ok(raw) => parse_feed(&raw, &self.images).map(Arc::new),
            Err(e) => Err(e),
        };

        let mut slot = self.write_slot();
        if slot.in_flight.as_ref().map(|f| f.id) == Some(id) {
            slot.in_flight = None;
        }

        match outcome {
            Ok(records) => {
                if slot.generation == generation {
                    slot.snapshot = Some(InventorySnapshot {
                        records: records.clone(),
                        captured_at: Instant::now(),
                    });
                    self.counters.refreshes.fetch_add(1, Ordering::Relaxed);
                    info!(
                        "✅ Inventory refreshed: {} vehicles in {}ms",
                        records.len(),
                        started.elapsed().as_millis()
                    );
                } else {
                    debug!(
                        "Refresh #{} finished after a cache clear; result not stored",
                        id
                    );
                }
                Ok(records)
            }
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    "❌ Inventory refresh #{} failed ({:?}): {}",
                    id,
                    e.categorize(),
                    e
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cache_with_fixture, fixtures, MockFeedSource, TEST_IMAGE_BASE};

    const TTL: Duration = DEFAULT_TTL;

    #[tokio::test(start_paused = true)]
    async fn test_read_within_ttl_does_not_refetch() {
        let (cache, source) = cache_with_fixture(fixtures::THREE_VEHICLES, TTL);

        let first = cache.get_vehicles().await.unwrap();
        assert_eq!(first.len(), 3);
        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        let second = cache.get_vehicles().await.unwrap();

        assert_eq!(source.fetch_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_after_ttl_refetches_once() {
        let (cache, source) = cache_with_fixture(fixtures::THREE_VEHICLES, TTL);

        cache.get_vehicles().await.unwrap();
        tokio::time::advance(TTL + Duration::from_millis(1)).await;
        cache.get_vehicles().await.unwrap();
        cache.get_vehicles().await.unwrap();

        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_forces_refetch_inside_ttl() {
        let (cache, source) = cache_with_fixture(fixtures::THREE_VEHICLES, TTL);

        cache.get_vehicles().await.unwrap();
        cache.clear_cache();
        assert!(cache.snapshot().is_none());
        cache.get_vehicles().await.unwrap();

        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let (cache, source) = cache_with_fixture(fixtures::THREE_VEHICLES, TTL);
        cache.clear_cache();
        cache.clear_cache();
        assert_eq!(cache.stats().clears, 2);
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_propagates_and_keeps_slot() {
        let (cache, source) = cache_with_fixture(fixtures::THREE_VEHICLES, TTL);
        let original = cache.get_vehicles().await.unwrap();

        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        source.push_result(Err(FeedError::Fetch("503 Service Unavailable".into())));

        let err = cache.get_vehicles().await.unwrap_err();
        assert!(err.is_fetch_failure());

        let held = cache.snapshot().expect("previous snapshot kept");
        assert!(Arc::ptr_eq(&held.records, &original));

        // The expired snapshot is not served; the next read fetches again.
        let recovered = cache.get_vehicles().await.unwrap();
        assert_eq!(recovered.len(), 3);
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_failure_on_empty_slot_stays_empty() {
        let source = Arc::new(MockFeedSource::failing(FeedError::Fetch("dns".into())));
        let cache = FeedCache::new(source.clone(), ImageUrlBuilder::new(TEST_IMAGE_BASE), TTL);

        assert!(matches!(cache.get_vehicles().await, Err(FeedError::Fetch(_))));
        assert!(cache.snapshot().is_none());
        assert_eq!(cache.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_parse_error_is_distinct_from_empty_inventory() {
        let (cache, source) = cache_with_fixture(fixtures::WRONG_ROOT, TTL);
        assert!(matches!(cache.get_vehicles().await, Err(FeedError::Parse(_))));

        source.set_payload(fixtures::EMPTY_FEED);
        let records = cache.get_vehicles().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_share_one_fetch() {
        let (cache, source) = cache_with_fixture(fixtures::THREE_VEHICLES, TTL);
        source.set_latency(Duration::from_millis(200));

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_vehicles().await })
            })
            .collect();

        for reader in readers {
            assert_eq!(reader.await.unwrap().unwrap().len(), 3);
        }
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_share_the_error() {
        let (cache, source) = cache_with_fixture(fixtures::THREE_VEHICLES, TTL);
        source.set_latency(Duration::from_millis(50));
        source.push_result(Err(FeedError::Timeout("upstream slow".into())));

        let (a, b) = tokio::join!(cache.get_vehicles(), cache.get_vehicles());
        assert_eq!(a.unwrap_err(), FeedError::Timeout("upstream slow".into()));
        assert_eq!(b.unwrap_err(), FeedError::Timeout("upstream slow".into()));
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_during_refresh_is_not_undone() {
        let (cache, source) = cache_with_fixture(fixtures::THREE_VEHICLES, TTL);
        source.set_latency(Duration::from_millis(100));

        let early = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_vehicles().await })
        };
        // Let the first refresh start, then clear while it is still fetching.
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.clear_cache();

        assert_eq!(early.await.unwrap().unwrap().len(), 3);
        assert!(cache.snapshot().is_none(), "pre-clear refresh must not store");

        source.set_latency(Duration::ZERO);
        source.set_payload(fixtures::EMPTY_FEED);
        assert!(cache.get_vehicles().await.unwrap().is_empty());
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_survives_dropped_caller() {
        let (cache, source) = cache_with_fixture(fixtures::THREE_VEHICLES, TTL);
        source.set_latency(Duration::from_millis(100));

        let caller = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_vehicles().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        caller.abort();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(cache.snapshot().map(|s| s.records.len()), Some(3));
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_lookup_by_id() {
        let (cache, _source) = cache_with_fixture(fixtures::THREE_VEHICLES, TTL);
        let found = cache.get_vehicle_by_id("102").await.unwrap();
        assert_eq!(found.map(|v| v.model), Some("Corolla".to_string()));
        assert_eq!(cache.get_vehicle_by_id("999").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let (cache, _source) = cache_with_fixture(fixtures::THREE_VEHICLES, TTL);
        let lower = cache.search("ford").await.unwrap();
        let upper = cache.search("FORD").await.unwrap();
        assert_eq!(lower.len(), 1);
        assert_eq!(lower[0].id, "101");
        assert_eq!(lower, upper);
        assert!(cache.search("lamborghini").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_track_hits_and_age() {
        let (cache, _source) = cache_with_fixture(fixtures::THREE_VEHICLES, TTL);
        cache.get_vehicles().await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        cache.get_vehicles().await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.refreshes, 1);
        assert_eq!(stats.cached_records, Some(3));
        assert_eq!(stats.snapshot_age_ms, Some(30_000));
        assert_eq!(cache.snapshot_age(), Some(Duration::from_secs(30)));
        assert_eq!(stats.hit_rate(), 0.5);
    }
}
