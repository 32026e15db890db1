use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Accumulated wall-clock timings for one label.
///
/// # Examples
///
/// ```
/// use preloadkit_core::timing_registry::TimingStats;
/// use std::time::Duration;
///
/// let stats = TimingStats::new();
/// stats.record(Duration::from_millis(4));
/// stats.record(Duration::from_millis(2));
///
/// assert_eq!(stats.count(), 2);
/// assert_eq!(stats.total(), Duration::from_millis(6));
/// assert_eq!(stats.max(), Duration::from_millis(4));
/// assert_eq!(stats.last(), Duration::from_millis(2));
/// assert_eq!(stats.mean(), Duration::from_millis(3));
/// ```
#[derive(Debug, Default)]
pub struct TimingStats {
    count: AtomicU64,
    total_nanos: AtomicU64,
    max_nanos: AtomicU64,
    last_nanos: AtomicU64,
}

impl TimingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);
        self.last_nanos.store(nanos, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed))
    }

    pub fn max(&self) -> Duration {
        Duration::from_nanos(self.max_nanos.load(Ordering::Relaxed))
    }

    pub fn last(&self) -> Duration {
        Duration::from_nanos(self.last_nanos.load(Ordering::Relaxed))
    }

    /// Mean duration per call, zero when nothing was recorded.
    pub fn mean(&self) -> Duration {
        match self.count() {
            0 => Duration::ZERO,
            n => Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed) / n),
        }
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.total_nanos.store(0, Ordering::Relaxed);
        self.max_nanos.store(0, Ordering::Relaxed);
        self.last_nanos.store(0, Ordering::Relaxed);
    }
}

impl Clone for TimingStats {
    fn clone(&self) -> Self {
        Self {
            count: AtomicU64::new(self.count()),
            total_nanos: AtomicU64::new(self.total_nanos.load(Ordering::Relaxed)),
            max_nanos: AtomicU64::new(self.max_nanos.load(Ordering::Relaxed)),
            last_nanos: AtomicU64::new(self.last_nanos.load(Ordering::Relaxed)),
        }
    }
}

/// Global registry of timing statistics, indexed by measurement label.
///
/// Every [`Measured`](crate::Measured) wrapper records here, so timings can be
/// read back by label without holding on to the wrapper.
///
/// ```
/// use preloadkit_core::timing_registry;
///
/// if let Some(stats) = timing_registry::get("render_rows") {
///     println!("render_rows: {} calls, mean {:?}", stats.count(), stats.mean());
/// }
/// ```
static TIMING_REGISTRY: Lazy<RwLock<HashMap<String, Arc<TimingStats>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Returns the statistics registered under `label`, creating them if needed.
///
/// Wrappers sharing a label share one set of statistics.
pub fn register(label: &str) -> Arc<TimingStats> {
    if let Some(stats) = TIMING_REGISTRY.read().get(label) {
        return Arc::clone(stats);
    }
    let mut registry = TIMING_REGISTRY.write();
    Arc::clone(
        registry
            .entry(label.to_string())
            .or_insert_with(|| Arc::new(TimingStats::new())),
    )
}

/// Snapshot of the statistics for `label`.
pub fn get(label: &str) -> Option<TimingStats> {
    TIMING_REGISTRY
        .read()
        .get(label)
        .map(|stats| (**stats).clone())
}

/// Lists every registered label.
pub fn list() -> Vec<String> {
    TIMING_REGISTRY.read().keys().cloned().collect()
}

/// Resets the counters for `label`; `false` if it was never registered.
pub fn reset(label: &str) -> bool {
    match TIMING_REGISTRY.read().get(label) {
        Some(stats) => {
            stats.reset();
            true
        }
        None => false,
    }
}

/// Removes every label. Live wrappers keep recording into their own
/// statistics, which are no longer reachable through the registry.
pub fn clear() {
    TIMING_REGISTRY.write().clear();
}
