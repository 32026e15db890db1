use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by the memoizers and the asset cache.
///
/// `hits` counts requests served by an entry that already existed, whether its
/// value was settled or still loading. `misses` counts requests that created
/// the entry. `failures` counts asset entries evicted because their load
/// failed; memoizers never record one.
///
/// Counters are `Relaxed`; use [`snapshot`](Self::snapshot) to read all three
/// at once for reporting.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    failures: AtomicU64,
}

/// Plain copy of [`CacheStats`] at one moment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub failures: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Hits plus misses. Failures are outcomes, not requests, and are excluded.
    pub fn total_accesses(&self) -> u64 {
        self.snapshot().total_accesses()
    }

    /// Share of requests that joined an existing entry; 0.0 before any request.
    pub fn hit_rate(&self) -> f64 {
        self.snapshot().hit_rate()
    }

    /// `1.0 - hit_rate()`.
    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            failures: self.failures(),
        }
    }

    pub fn reset(&self) {
        for counter in [&self.hits, &self.misses, &self.failures] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Clone for CacheStats {
    fn clone(&self) -> Self {
        let StatsSnapshot {
            hits,
            misses,
            failures,
        } = self.snapshot();
        Self {
            hits: AtomicU64::new(hits),
            misses: AtomicU64::new(misses),
            failures: AtomicU64::new(failures),
        }
    }
}

impl StatsSnapshot {
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        match self.total_accesses() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

impl fmt::Display for StatsSnapshot {
    /// ```
    /// use preloadkit_core::CacheStats;
    ///
    /// let stats = CacheStats::new();
    /// stats.record_miss();
    /// stats.record_hit();
    /// stats.record_hit();
    /// stats.record_hit();
    /// assert_eq!(
    ///     stats.snapshot().to_string(),
    ///     "3 hits, 1 misses, 0 failures (75.0% hit rate)"
    /// );
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hits, {} misses, {} failures ({:.1}% hit rate)",
            self.hits,
            self.misses,
            self.failures,
            self.hit_rate() * 100.0
        )
    }
}
