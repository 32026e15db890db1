//! # Preloadkit
//!
//! Asset preloading and execution control for Rust applications.
//!
//! ## Features
//!
//! - **Single-flight loading**: concurrent requests for one asset share one load
//! - **Failure eviction**: a failed load is forgotten, so the next request retries
//! - **Bulk preloading**: load scripts, stylesheets and images in parallel
//! - **Rate control**: debounce and throttle wrappers with cancellation
//! - **Memoization**: per-wrapper result caches keyed by the arguments
//! - **Timing**: transparent wall-clock measurement into a global registry
//! - **Scheduling**: idle deferral, visibility gating and frame batching with
//!   pluggable environment capabilities
//!
//! This crate re-exports [`preloadkit_core`] and [`preloadkit_async`].
//!
//! ## Quick Start
//!
//! ```rust
//! use preloadkit::{AssetCache, InMemoryHost, ScriptOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = AssetCache::new(InMemoryHost::new().with_resource("/js/charts.js"));
//!
//! cache
//!     .load_script("/js/charts.js", ScriptOptions::default().is_async(false))
//!     .await
//!     .unwrap();
//! assert!(cache.is_asset_loaded("/js/charts.js"));
//! # }
//! ```
//!
//! ## Memoization and Timing
//!
//! ```rust
//! use preloadkit::{measure_performance, memoize, timing_stats};
//!
//! let render = measure_performance(
//!     |rows: usize| (0..rows).map(|row| format!("<tr>{row}</tr>")).collect::<String>(),
//!     "render_rows",
//! );
//! render.call(3);
//!
//! let stats = timing_stats("render_rows").unwrap();
//! assert!(stats.count() >= 1);
//!
//! let severity = memoize(|score: &u32| if *score >= 7 { "high" } else { "low" });
//! assert_eq!(severity.call(&9), "high");
//! ```
//!
//! ## Custom Cache Keys
//!
//! Memoized arguments are keyed through [`CacheableKey`]. Types with a useful
//! `Debug` output can opt into the Debug-based key:
//!
//! ```rust
//! use preloadkit::{memoize, DefaultCacheableKey};
//!
//! #[derive(Debug)]
//! struct Package {
//!     name: String,
//!     version: String,
//! }
//!
//! impl DefaultCacheableKey for Package {}
//!
//! let purl = memoize(|p: &Package| format!("pkg:cargo/{}@{}", p.name, p.version));
//! let pkg = Package { name: "serde".into(), version: "1.0.0".into() };
//! assert_eq!(purl.call(&pkg), "pkg:cargo/serde@1.0.0");
//! ```
//!
//! Or with a custom implementation:
//!
//! ```rust
//! use preloadkit::CacheableKey;
//!
//! struct Sbom {
//!     digest: String,
//!     components: Vec<String>,
//! }
//!
//! impl CacheableKey for Sbom {
//!     fn to_cache_key(&self) -> String {
//!         // the digest already identifies the document
//!         self.digest.clone()
//!     }
//! }
//! ```
pub use preloadkit_async::*;
pub use preloadkit_core::{
    keys, measure_performance, memoize, memoize_result, timing_registry, CacheableKey,
    DefaultCacheableKey, Measured, Memoized, MemoizedResult, TimingStats,
};

/// Snapshot of the timings recorded under `label`
///
/// # Arguments
///
/// * `label` - The label given to [`measure_performance`]
///
/// # Returns
///
/// The statistics, or `None` if nothing was ever measured under `label`
///
/// # Examples
///
/// ```rust
/// use preloadkit::{measure_performance, timing_stats};
///
/// let parse = measure_performance(|line: &str| line.split_whitespace().count(), "parse_log");
/// parse.call("2024-05-01 12:00:00 scan started");
///
/// assert!(timing_stats("parse_log").is_some());
/// assert!(timing_stats("never_measured").is_none());
/// ```
pub fn timing_stats(label: &str) -> Option<TimingStats> {
    timing_registry::get(label)
}

/// Every label with recorded timings, sorted, paired with its statistics
///
/// # Examples
///
/// ```rust
/// use preloadkit::{measure_performance, timing_report};
///
/// measure_performance(|_: ()| {}, "noop").call(());
///
/// let report = timing_report();
/// assert!(report.iter().any(|(label, _)| label == "noop"));
/// ```
pub fn timing_report() -> Vec<(String, TimingStats)> {
    let mut labels = timing_registry::list();
    labels.sort();
    labels
        .into_iter()
        .filter_map(|label| timing_registry::get(&label).map(|stats| (label, stats)))
        .collect()
}

/// Reset the timings recorded under `label`
///
/// # Returns
///
/// `true` if the label was known, `false` otherwise
pub fn reset_timings(label: &str) -> bool {
    timing_registry::reset(label)
}
