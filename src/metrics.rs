//! Translation metrics and observability module.
//!
//! Counters for cache traffic and backend calls. Each store owns its own
//! `StoreMetrics` instance; there is no process-wide singleton, so tests and
//! multiple stores in one process never bleed counts into each other.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-store translation metrics.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    /// Number of times a translation was found in the cache
    cache_hits: AtomicUsize,

    /// Number of times a translation was not found in the cache
    cache_misses: AtomicUsize,

    /// Number of calls made to the translation backend
    backend_calls: AtomicUsize,

    /// Number of backend calls that failed
    backend_failures: AtomicUsize,
}

impl StoreMetrics {
    /// Create a fresh metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache hit (translation found in cache).
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss (translation not found in cache).
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a call to the translation backend.
    pub fn record_backend_call(&self) {
        self.backend_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a backend call failure.
    pub fn record_backend_failure(&self) {
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current cache hit count.
    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Get the current cache miss count.
    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Get the current backend call count.
    pub fn backend_calls(&self) -> usize {
        self.backend_calls.load(Ordering::Relaxed)
    }

    /// Get the current backend failure count.
    pub fn backend_failures(&self) -> usize {
        self.backend_failures.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total_cache_queries = hits + misses;
        let cache_hit_rate = if total_cache_queries > 0 {
            (hits as f64 / total_cache_queries as f64) * 100.0
        } else {
            0.0
        };

        let calls = self.backend_calls();
        let failures = self.backend_failures();
        let backend_success_rate = if calls > 0 {
            ((calls - failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            backend_calls: calls,
            backend_failures: failures,
            backend_success_rate,
        }
    }
}

/// Metrics report containing current translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    /// Number of cache hits
    pub cache_hits: usize,

    /// Number of cache misses
    pub cache_misses: usize,

    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,

    /// Number of backend calls made
    pub backend_calls: usize,

    /// Number of backend failures
    pub backend_failures: usize,

    /// Backend success rate as a percentage (0-100)
    pub backend_success_rate: f64,
}
