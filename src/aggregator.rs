// src/aggregator.rs
//! Cache-coordinated aggregator.
//!
//! One cache slot per source key, created lazily on first fetch. Each slot
//! carries two locks with different jobs:
//! - `entry`: a short-lived `RwLock` around the cached data, never held
//!   across an `.await`, so reads never wait on an upstream fetch;
//! - `fill`: an async mutex serialising fetches for that key only.
//!
//! Callers that queue on `fill` while another fetch is running pick up that
//! fetch's outcome (tracked through `fills`, a per-slot generation counter)
//! instead of hitting the site again, even when they asked for `force`.
//!
//! A fill runs in its own task that owns the `fill` guard. Dropping the
//! caller (client disconnect, cancelled `run_all`) does not release the lock
//! early: the fetch still completes, is stored, and is seen by the next caller.
//!
//! Failure policy: an adapter error, panic or timeout leaves the cached entry
//! untouched. The caller gets whatever was cached before, or an empty list.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_CACHE_TTL_SECS, DEFAULT_FETCH_TIMEOUT_SECS};
use crate::error::{AggregatorError, Result};
use crate::record::Record;
use crate::registry::AdapterRegistry;
use crate::sources::types::SourceAdapter;

pub const DEFAULT_TTL: Duration = Duration::from_secs(DEFAULT_CACHE_TTL_SECS);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS);

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scrape_fetch_total", "Adapter fetches started.");
        describe_counter!(
            "scrape_cache_hits_total",
            "Requests served from a fresh cache entry."
        );
        describe_counter!(
            "scrape_joined_total",
            "Requests that waited on another caller's in-flight fetch."
        );
        describe_counter!(
            "scrape_fetch_errors_total",
            "Adapter fetch failures (error, panic or timeout)."
        );
        describe_histogram!("scrape_fetch_ms", "Adapter fetch time in milliseconds.");
        describe_gauge!("scrape_cached_records", "Records currently cached per source.");
    });
}

/// Freshness of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

/// How a `get_or_fetch` call was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Fresh entry returned without calling the adapter.
    Hit,
    /// This call ran the adapter and stored its result.
    Fetched,
    /// Another caller's in-flight fetch finished while this one waited.
    Joined,
    /// This call ran the adapter, which failed; prior data returned.
    Failed,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Fetched => "MISS",
            CacheStatus::Joined => "JOINED",
            CacheStatus::Failed => "FAILED",
        }
    }
}

/// Point-in-time copy of one cache entry.
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    pub data: Arc<Vec<Record>>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl CacheSnapshot {
    pub fn is_cached(&self) -> bool {
        self.fetched_at.is_some()
    }
}

/// Result of `get_or_fetch`: the data plus how it was obtained.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub data: Arc<Vec<Record>>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub status: CacheStatus,
}

#[derive(Debug, Default)]
struct CacheEntry {
    data: Arc<Vec<Record>>,
    fetched_at: Option<DateTime<Utc>>,
    /// Monotonic twin of `fetched_at`, used for TTL checks.
    fetched_instant: Option<Instant>,
}

impl CacheEntry {
    fn state(&self, ttl: Duration) -> CacheState {
        match self.fetched_instant {
            None => CacheState::Empty,
            Some(t) if t.elapsed() < ttl => CacheState::Fresh,
            Some(_) => CacheState::Stale,
        }
    }

    fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            data: Arc::clone(&self.data),
            fetched_at: self.fetched_at,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    entry: RwLock<CacheEntry>,
    fill: Arc<tokio::sync::Mutex<()>>,
    /// Completed fetch attempts (success or failure).
    fills: AtomicU64,
    /// Outcome of the most recent fill; written before `fills` is bumped.
    last_failed: AtomicBool,
}

impl Slot {
    fn read(&self) -> std::sync::RwLockReadGuard<'_, CacheEntry> {
        self.entry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, status: CacheStatus) -> Lookup {
        let e = self.read();
        Lookup {
            data: Arc::clone(&e.data),
            fetched_at: e.fetched_at,
            status,
        }
    }

    fn store(&self, records: Vec<Record>) {
        let mut e = self.entry.write().unwrap_or_else(PoisonError::into_inner);
        e.data = Arc::new(records);
        e.fetched_at = Some(Utc::now());
        e.fetched_instant = Some(Instant::now());
    }

    /// Apply one fetch outcome and publish it to queued callers.
    fn finish(&self, key: &str, outcome: Result<Vec<Record>>) -> CacheStatus {
        let status = match outcome {
            Ok(records) => {
                info!(source = key, count = records.len(), "fetch finished");
                gauge!("scrape_cached_records", "source" => key.to_string()).set(records.len() as f64);
                self.store(records);
                CacheStatus::Fetched
            }
            Err(e) => {
                warn!(source = key, error = %e, "fetch failed; keeping previous cache entry");
                counter!("scrape_fetch_errors_total", "source" => key.to_string()).increment(1);
                CacheStatus::Failed
            }
        };
        self.last_failed
            .store(status == CacheStatus::Failed, Ordering::Release);
        self.fills.fetch_add(1, Ordering::Release);
        status
    }

    /// Status for a caller that waited on someone else's fill.
    fn joined_status(&self) -> CacheStatus {
        if self.last_failed.load(Ordering::Acquire) {
            CacheStatus::Failed
        } else {
            CacheStatus::Joined
        }
    }
}

pub struct Aggregator {
    registry: Arc<AdapterRegistry>,
    slots: RwLock<HashMap<String, Arc<Slot>>>,
    ttl: Duration,
    fetch_timeout: Duration,
}

impl Aggregator {
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self::with_limits(registry, DEFAULT_TTL, DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_limits(registry: Arc<AdapterRegistry>, ttl: Duration, fetch_timeout: Duration) -> Self {
        ensure_metrics_described();
        Self {
            registry,
            slots: RwLock::new(HashMap::new()),
            ttl,
            fetch_timeout,
        }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Existing slot for `key`, if any fetch was ever requested for it.
    fn peek(&self, key: &str) -> Option<Arc<Slot>> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).cloned()
    }

    /// Slot for `key`, inserted on first use. The map lock is only held for
    /// the lookup/insert itself.
    fn slot(&self, key: &str) -> Arc<Slot> {
        if let Some(s) = self.peek(key) {
            return s;
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.to_string()).or_default())
    }

    /// Freshness of `key` without touching anything.
    pub fn state(&self, key: &str) -> Result<CacheState> {
        self.ensure_known(key)?;
        Ok(self
            .peek(key)
            .map(|s| s.read().state(self.ttl))
            .unwrap_or(CacheState::Empty))
    }

    /// Return cached data for `key`, running the adapter first when forced,
    /// empty or stale. Only `UnknownSource` is ever returned as an error.
    pub async fn get_or_fetch(&self, key: &str, force: bool) -> Result<Lookup> {
        let adapter = self.registry.get(key)?;
        let slot = self.slot(key);

        if !force && slot.read().state(self.ttl) == CacheState::Fresh {
            debug!(source = key, "cache hit");
            counter!("scrape_cache_hits_total", "source" => key.to_string()).increment(1);
            return Ok(slot.lookup(CacheStatus::Hit));
        }

        // Read the generation before queueing: if it moves while we wait,
        // someone else fetched on our behalf.
        let seen = slot.fills.load(Ordering::Acquire);
        let guard = Arc::clone(&slot.fill).lock_owned().await;

        if slot.fills.load(Ordering::Acquire) != seen {
            debug!(source = key, "joined in-flight fetch");
            counter!("scrape_joined_total", "source" => key.to_string()).increment(1);
            return Ok(slot.lookup(slot.joined_status()));
        }
        // A fill may have completed between the first check and `seen`.
        if !force && slot.read().state(self.ttl) == CacheState::Fresh {
            counter!("scrape_cache_hits_total", "source" => key.to_string()).increment(1);
            return Ok(slot.lookup(CacheStatus::Hit));
        }

        // The fill task owns the guard, so it outlives this caller.
        let fill = {
            let slot = Arc::clone(&slot);
            let key = key.to_string();
            let timeout = self.fetch_timeout;
            tokio::spawn(async move {
                let outcome = fetch_bounded(&key, adapter, timeout).await;
                let status = slot.finish(&key, outcome);
                drop(guard);
                status
            })
        };

        let status = match fill.await {
            Ok(status) => status,
            Err(e) => {
                warn!(source = key, error = %e, "fill task failed");
                CacheStatus::Failed
            }
        };
        Ok(slot.lookup(status))
    }

    /// Cached data for `key`; never fetches.
    pub fn cached(&self, key: &str) -> Result<CacheSnapshot> {
        self.ensure_known(key)?;
        Ok(self
            .peek(key)
            .map(|s| s.read().snapshot())
            .unwrap_or_default())
    }

    /// Snapshots of every slot created so far, sorted by key.
    pub fn snapshots(&self) -> Vec<(String, CacheSnapshot)> {
        let slots: Vec<(String, Arc<Slot>)> = {
            let map = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            map.iter().map(|(k, s)| (k.clone(), Arc::clone(s))).collect()
        };
        let mut out: Vec<(String, CacheSnapshot)> = slots
            .into_iter()
            .map(|(k, s)| {
                let snap = s.read().snapshot();
                (k, snap)
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    fn ensure_known(&self, key: &str) -> Result<()> {
        if self.registry.contains(key) {
            Ok(())
        } else {
            Err(AggregatorError::UnknownSource(key.to_string()))
        }
    }
}

/// Run one adapter fetch in its own task, bounded by `timeout`.
/// Errors, panics and timeouts all come back as `FetchFailed`.
async fn fetch_bounded(key: &str, adapter: Arc<dyn SourceAdapter>, timeout: Duration) -> Result<Vec<Record>> {
    info!(source = key, "running adapter");
    counter!("scrape_fetch_total", "source" => key.to_string()).increment(1);
    let t0 = Instant::now();

    let handle = tokio::spawn(async move { adapter.fetch().await });
    let abort = handle.abort_handle();
    let outcome = tokio::time::timeout(timeout, handle).await;

    histogram!("scrape_fetch_ms", "source" => key.to_string())
        .record(t0.elapsed().as_secs_f64() * 1_000.0);

    let failed = |reason: String| AggregatorError::FetchFailed {
        key: key.to_string(),
        reason,
    };
    match outcome {
        Ok(Ok(Ok(records))) => Ok(records),
        Ok(Ok(Err(e))) => Err(failed(format!("{e:#}"))),
        Ok(Err(join)) => Err(failed(format!("adapter task failed: {join}"))),
        Err(_) => {
            abort.abort();
            Err(failed(format!("timed out after {timeout:?}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::record_from;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SourceAdapter for Counting {
        async fn fetch(&self) -> anyhow::Result<Vec<Record>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(vec![record_from([("n", n as u64)])])
        }
        fn name(&self) -> &'static str {
            "counting"
        }
    }

    struct Panicking;

    #[async_trait]
    impl SourceAdapter for Panicking {
        async fn fetch(&self) -> anyhow::Result<Vec<Record>> {
            panic!("selector exploded");
        }
        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    fn aggregator_with(key: &str, adapter: Arc<dyn SourceAdapter>) -> Aggregator {
        let mut r = AdapterRegistry::new();
        r.register(key, adapter, None);
        Aggregator::new(Arc::new(r))
    }

    #[tokio::test]
    async fn empty_then_fresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let agg = aggregator_with("a", Arc::new(Counting { calls: calls.clone() }));

        assert_eq!(agg.state("a").unwrap(), CacheState::Empty);
        let first = agg.get_or_fetch("a", false).await.unwrap();
        assert_eq!(first.status, CacheStatus::Fetched);
        assert_eq!(agg.state("a").unwrap(), CacheState::Fresh);

        let second = agg.get_or_fetch("a", false).await.unwrap();
        assert_eq!(second.status, CacheStatus::Hit);
        assert!(Arc::ptr_eq(&first.data, &second.data));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panicking_adapter_is_absorbed() {
        let agg = aggregator_with("p", Arc::new(Panicking));
        let out = agg.get_or_fetch("p", false).await.unwrap();
        assert_eq!(out.status, CacheStatus::Failed);
        assert!(out.data.is_empty());
        assert!(out.fetched_at.is_none());
        assert_eq!(agg.state("p").unwrap(), CacheState::Empty);
    }

    #[tokio::test]
    async fn unknown_key_is_rejected_everywhere() {
        let agg = aggregator_with("a", Arc::new(Panicking));
        assert!(agg.get_or_fetch("zz", false).await.unwrap_err().is_unknown_source());
        assert!(agg.cached("zz").unwrap_err().is_unknown_source());
        assert!(agg.state("zz").unwrap_err().is_unknown_source());
    }

    #[test]
    fn cached_never_creates_a_slot() {
        let agg = aggregator_with("a", Arc::new(Panicking));
        let snap = agg.cached("a").unwrap();
        assert!(snap.data.is_empty());
        assert!(!snap.is_cached());
        assert!(agg.snapshots().is_empty());
    }
}
