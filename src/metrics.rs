//! In-process request metrics.
//!
//! This module provides the metrics registry shared by the middleware chain
//! and the inspection endpoints. It is deliberately self-contained: plain
//! atomic counters for the hot path, a mutexed map for lazily-created named
//! counters, and a bounded FIFO log of completed requests.
//!
//! # Available measurements
//!
//! - `total_requests` / `successful_responses` / `failed_responses` -
//!   monotonic counters; a response with status in `[200, 400)` counts as
//!   successful, everything else as failed
//! - custom counters - arbitrary event names, created on first increment
//! - request log - the most recent 1000 completed requests (method, path,
//!   status, duration, timestamp), oldest evicted first
//!
//! The registry is owned by [`crate::server::state::AppState`] and injected
//! into the middleware explicitly; there is no global instance.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Capacity of the bounded request log.
pub const REQUEST_LOG_CAPACITY: usize = 1000;

/// Default number of entries returned by the recent-requests query.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// One recorded observation of a completed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestLogEntry {
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub duration_ms: f64,
    pub timestamp: String,
}

/// Process memory figures in megabytes, two-decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub resident_mb: f64,
    pub virtual_mb: f64,
}

/// Read-only view of the registry at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_responses: u64,
    pub failed_responses: u64,
    pub uptime_seconds: u64,
    pub memory: MemoryStats,
    pub custom_counters: BTreeMap<String, u64>,
    pub generated_at: String,
}

/// Request metrics registry.
///
/// Counter mutation happens on completion callbacks of concurrently
/// in-flight requests, so the counters are atomics and the compound
/// structures (counter map, request log) take a mutex. The log's
/// evict-then-append runs under a single lock acquisition so the capacity
/// bound holds at every observation point.
pub struct MetricsRegistry {
    started_at: Instant,
    total_requests: AtomicU64,
    successful_responses: AtomicU64,
    failed_responses: AtomicU64,
    custom_counters: Mutex<HashMap<String, u64>>,
    request_log: Mutex<VecDeque<RequestLogEntry>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_requests: AtomicU64::new(0),
            successful_responses: AtomicU64::new(0),
            failed_responses: AtomicU64::new(0),
            custom_counters: Mutex::new(HashMap::new()),
            request_log: Mutex::new(VecDeque::with_capacity(REQUEST_LOG_CAPACITY)),
        }
    }

    /// Count an inbound request. Called exactly once per request, at
    /// arrival, before any other middleware runs.
    pub fn observe_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed request. Called exactly once per accepted
    /// request, after the response has been produced.
    pub fn record_completion(&self, method: &str, path: &str, status_code: u16, elapsed: Duration) {
        if (200..400).contains(&status_code) {
            self.successful_responses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_responses.fetch_add(1, Ordering::Relaxed);
        }

        let entry = RequestLogEntry {
            method: method.to_string(),
            path: path.to_string(),
            status_code,
            duration_ms: round2(elapsed.as_secs_f64() * 1000.0),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let mut log = lock_unpoisoned(&self.request_log);
        if log.len() >= REQUEST_LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(entry);
    }

    /// Increment a named counter, creating it on first use.
    ///
    /// A name that is empty after trimming is rejected with a warning
    /// rather than a fault.
    pub fn increment(&self, event: &str) {
        let event = event.trim();
        if event.is_empty() {
            tracing::warn!("Ignoring increment for empty counter name");
            return;
        }

        let mut counters = lock_unpoisoned(&self.custom_counters);
        *counters.entry(event.to_string()).or_insert(0) += 1;
    }

    /// Materialize the current counters. Does not mutate state.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let custom_counters = lock_unpoisoned(&self.custom_counters)
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect();

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_responses: self.successful_responses.load(Ordering::Relaxed),
            failed_responses: self.failed_responses.load(Ordering::Relaxed),
            uptime_seconds: self.started_at.elapsed().as_secs(),
            memory: read_memory_stats(),
            custom_counters,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Up to `limit` most recent completed requests, most recent first.
    ///
    /// `limit` is clamped to a minimum of 1.
    pub fn recent_requests(&self, limit: usize) -> Vec<RequestLogEntry> {
        let log = lock_unpoisoned(&self.request_log);
        log.iter().rev().take(limit.max(1)).cloned().collect()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a raw `limit` query value for the recent-requests endpoint.
///
/// Missing, non-numeric, or non-positive input falls back to the default
/// of 10.
pub fn resolve_recent_limit(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|limit| *limit > 0)
        .map(|limit| limit as usize)
        .unwrap_or(DEFAULT_RECENT_LIMIT)
}

/// A poisoned lock only means another thread panicked mid-update; the
/// counters underneath are still usable, so recover the guard.
fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Resident-set and virtual-size figures from `/proc/self/statm`.
#[cfg(target_os = "linux")]
fn read_memory_stats() -> MemoryStats {
    // statm reports sizes in pages; 4 KiB pages on every target we deploy to
    const PAGE_SIZE: u64 = 4096;

    let (virtual_pages, resident_pages) = std::fs::read_to_string("/proc/self/statm")
        .ok()
        .and_then(|contents| {
            let mut fields = contents.split_whitespace();
            let virtual_pages = fields.next()?.parse::<u64>().ok()?;
            let resident_pages = fields.next()?.parse::<u64>().ok()?;
            Some((virtual_pages, resident_pages))
        })
        .unwrap_or((0, 0));

    MemoryStats {
        resident_mb: round2(resident_pages as f64 * PAGE_SIZE as f64 / (1024.0 * 1024.0)),
        virtual_mb: round2(virtual_pages as f64 * PAGE_SIZE as f64 / (1024.0 * 1024.0)),
    }
}

#[cfg(not(target_os = "linux"))]
fn read_memory_stats() -> MemoryStats {
    MemoryStats {
        resident_mb: 0.0,
        virtual_mb: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(registry: &MetricsRegistry, path: &str, status: u16) {
        registry.observe_request();
        registry.record_completion("GET", path, status, Duration::from_millis(5));
    }

    #[test]
    fn test_counter_invariant() {
        let registry = MetricsRegistry::new();
        for status in [200, 201, 301, 399, 400, 404, 500] {
            record(&registry, "/v1/chat", status);
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.total_requests, 7);
        assert_eq!(snapshot.successful_responses, 4);
        assert_eq!(snapshot.failed_responses, 3);
        assert_eq!(
            snapshot.total_requests,
            snapshot.successful_responses + snapshot.failed_responses
        );
    }

    #[test]
    fn test_increment_rejects_blank_names() {
        let registry = MetricsRegistry::new();
        registry.increment("");
        registry.increment("   ");
        assert!(registry.snapshot().custom_counters.is_empty());
    }

    #[test]
    fn test_increment_creates_and_accumulates() {
        let registry = MetricsRegistry::new();
        registry.increment("chat_messages");
        registry.increment("chat_messages");
        registry.increment(" auth_failures ");

        let counters = registry.snapshot().custom_counters;
        assert_eq!(counters["chat_messages"], 2);
        assert_eq!(counters["auth_failures"], 1);
    }

    #[test]
    fn test_request_log_bounded_fifo() {
        let registry = MetricsRegistry::new();
        for i in 0..(REQUEST_LOG_CAPACITY + 1) {
            record(&registry, &format!("/r/{i}"), 200);
        }

        let entries = registry.recent_requests(REQUEST_LOG_CAPACITY + 10);
        assert_eq!(entries.len(), REQUEST_LOG_CAPACITY);
        // Most recent first; the very first request was evicted.
        assert_eq!(entries[0].path, format!("/r/{}", REQUEST_LOG_CAPACITY));
        assert_eq!(entries[REQUEST_LOG_CAPACITY - 1].path, "/r/1");
    }

    #[test]
    fn test_recent_requests_reverse_chronological() {
        let registry = MetricsRegistry::new();
        for path in ["/a", "/b", "/c", "/d", "/e"] {
            record(&registry, path, 200);
        }

        let recent: Vec<String> = registry
            .recent_requests(3)
            .into_iter()
            .map(|entry| entry.path)
            .collect();
        assert_eq!(recent, vec!["/e", "/d", "/c"]);
    }

    #[test]
    fn test_recent_requests_empty_and_min_clamp() {
        let registry = MetricsRegistry::new();
        assert!(registry.recent_requests(3).is_empty());

        record(&registry, "/a", 200);
        record(&registry, "/b", 200);
        // limit 0 is clamped up to 1
        assert_eq!(registry.recent_requests(0).len(), 1);
    }

    #[test]
    fn test_resolve_recent_limit() {
        assert_eq!(resolve_recent_limit(None), 10);
        assert_eq!(resolve_recent_limit(Some("abc")), 10);
        assert_eq!(resolve_recent_limit(Some("-5")), 10);
        assert_eq!(resolve_recent_limit(Some("0")), 10);
        assert_eq!(resolve_recent_limit(Some("3")), 3);
        assert_eq!(resolve_recent_limit(Some(" 25 ")), 25);
    }

    #[test]
    fn test_duration_two_decimal_precision() {
        let registry = MetricsRegistry::new();
        registry.observe_request();
        registry.record_completion("POST", "/v1/chat", 200, Duration::from_micros(1_234_567));

        let entries = registry.recent_requests(1);
        assert_eq!(entries[0].duration_ms, 1234.57);
    }

    #[test]
    fn test_snapshot_is_read_only() {
        let registry = MetricsRegistry::new();
        record(&registry, "/a", 200);

        let first = registry.snapshot();
        let second = registry.snapshot();
        assert_eq!(first.total_requests, second.total_requests);
        assert_eq!(first.successful_responses, second.successful_responses);
        assert!(!second.generated_at.is_empty());
    }
}
