//! # Preloadkit Core
//!
//! Runtime-independent building blocks for preloadkit.
//!
//! This crate holds everything that does not need an async executor: the asset
//! descriptors and error type shared with the asset cache, and the synchronous
//! execution-control wrappers.
//!
//! ## Module Organization
//!
//! - [`asset`] - Asset kinds, load options, host element descriptors, bulk requests
//! - [`keys`] - Cache key generation traits used by memoization
//! - `memoize` - Unbounded per-wrapper result caches
//! - `measure` - Transparent wall-clock timing of calls
//! - [`timing_registry`] - Global timing statistics indexed by label
//! - `stats` - Hit/miss/failure counters (feature `stats`)
//!
//! ## Quick Start
//!
//! ```rust
//! use preloadkit_core::{memoize, measure_performance};
//!
//! let slug = memoize(|title: &str| title.to_lowercase().replace(' ', "-"));
//! assert_eq!(slug.call("Scan Result"), "scan-result");
//!
//! let timed = measure_performance(|n: usize| (0..n).sum::<usize>(), "sum");
//! assert_eq!(timed.call(4), 6);
//! ```
pub mod asset;
mod error;
pub mod keys;
mod measure;
mod memoize;
pub mod timing_registry;

#[cfg(feature = "stats")]
mod stats;

pub use asset::{
    AssetKind, AssetOptions, AssetRequest, DecodedImage, OnLoad, ScriptElement, ScriptOptions,
    StylesheetElement, StylesheetOptions,
};
pub use error::AssetError;
pub use keys::{CacheableKey, DefaultCacheableKey};
pub use measure::{measure_performance, Measured};
pub use memoize::{memoize, memoize_result, Memoized, MemoizedResult};
pub use timing_registry::TimingStats;

#[cfg(feature = "stats")]
pub use stats::{CacheStats, StatsSnapshot};
