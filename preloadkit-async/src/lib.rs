//! # Preloadkit Async
//!
//! Asset preloading and execution control for Tokio applications.
//!
//! The [`AssetCache`] makes sure every script, stylesheet and image is fetched
//! at most once: concurrent requests for the same locator share one in-flight
//! load, a successful load stays cached, and a failed load is evicted so the
//! next request retries. The host environment is abstracted behind
//! [`AssetHost`]; [`InMemoryHost`] is a scriptable implementation for tests and
//! headless use.
//!
//! The remaining utilities shape *when* functions run:
//!
//! - [`debounce`] - run once calls have stopped for a while
//! - [`throttle`] - run at most once per interval, keeping the latest arguments
//! - [`defer_execution`] - run when the environment is idle
//! - [`execute_when_visible`] - run once an element scrolls into view
//! - [`batch_dom_updates`] - apply queued updates together at the next frame
//!
//! Environment primitives such as idle callbacks, animation frames and
//! intersection observers are supplied through a [`Capabilities`] provider.
//! Whatever the provider lacks falls back to Tokio timers or immediate
//! execution.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! preloadkit-async = "0.3.0"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ## Examples
//!
//! ### Preloading Assets
//!
//! ```rust
//! use preloadkit_async::{
//!     AssetCache, AssetRequest, InMemoryHost, ScriptOptions, StylesheetOptions,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let host = InMemoryHost::new()
//!     .with_resource("/js/app.js")
//!     .with_resource("/css/app.css")
//!     .with_image("/img/logo.png", 64, 64);
//! let cache = AssetCache::new(host);
//!
//! let first = cache.load_script("/js/app.js", ScriptOptions::default());
//! let second = cache.load_script("/js/app.js", ScriptOptions::default());
//! assert!(first.await.is_ok());
//! assert!(second.await.is_ok());
//! assert_eq!(cache.host().load_count("/js/app.js"), 1);
//!
//! cache
//!     .load_assets(vec![
//!         AssetRequest::stylesheet("/css/app.css", StylesheetOptions::default()),
//!         AssetRequest::image("/img/logo.png"),
//!     ])
//!     .await
//!     .unwrap();
//! assert!(cache.is_asset_loaded("/img/logo.png"));
//! # }
//! ```
//!
//! ### Throttling
//!
//! ```rust
//! use preloadkit_async::throttle;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let redraws = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&redraws);
//! let on_scroll = throttle(
//!     move |_offset: u32| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     },
//!     Duration::from_millis(50),
//! );
//!
//! for offset in 0..100 {
//!     on_scroll.call(offset);
//! }
//! // the leading call ran, the rest collapsed into one trailing call
//! tokio::time::sleep(Duration::from_millis(100)).await;
//! assert_eq!(redraws.load(Ordering::SeqCst), 2);
//! # }
//! ```
//!
//! ## Runtime
//!
//! Asset loads are spawned when they are requested, and the timer-based
//! utilities spawn their timers, so these calls must happen inside a Tokio
//! runtime. Wrapped functions are never called while an internal lock is
//! held and may re-enter their own wrapper.
//!
//! ## Statistics
//!
//! With the `stats` feature (enabled by default) the asset cache counts hits,
//! misses and failed loads, see [`AssetCache::stats`].
mod asset_cache;
mod batch;
pub mod capabilities;
mod debounce;
mod defer;
mod disposer;
mod host;
mod throttle;
mod visibility;

pub use asset_cache::AssetCache;
pub use batch::{batch_dom_updates, batch_dom_updates_with, Batched};
pub use capabilities::{
    Capabilities, ElementId, FrameScheduler, IdleScheduler, IntersectionObserver,
    NoCapabilities, Observation, Task, FALLBACK_FRAME_INTERVAL, FALLBACK_IDLE_DELAY,
};
pub use debounce::{debounce, Debounced, DEFAULT_DEBOUNCE_WAIT};
pub use defer::{
    defer_execution, defer_execution_with, DeferOptions, Deferred, DEFAULT_IDLE_TIMEOUT,
};
pub use disposer::Disposer;
pub use host::{AssetHost, InMemoryHost};
pub use throttle::{throttle, throttle_default, Throttled, DEFAULT_THROTTLE_WAIT};
pub use visibility::{
    execute_when_visible, execute_when_visible_with, VisibilityGate, VisibilityOptions,
    DEFAULT_VISIBILITY_THRESHOLD,
};

// Re-export the shared types from preloadkit-core
pub use preloadkit_core::{
    AssetError, AssetKind, AssetOptions, AssetRequest, DecodedImage, OnLoad, ScriptElement,
    ScriptOptions, StylesheetElement, StylesheetOptions,
};

#[cfg(feature = "stats")]
pub use preloadkit_core::{CacheStats, StatsSnapshot};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        batch_dom_updates, debounce, defer_execution, execute_when_visible, throttle,
    };
    pub use crate::{AssetCache, AssetError, AssetRequest, InMemoryHost, ScriptOptions};
    pub use crate::{Capabilities, Disposer, ElementId, NoCapabilities};
}
