use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;
use log::{debug, warn};
#[cfg(feature = "stats")]
use preloadkit_core::CacheStats;
use preloadkit_core::{
    AssetError, AssetKind, AssetRequest, DecodedImage, ScriptElement, ScriptOptions,
    StylesheetElement, StylesheetOptions,
};

use crate::AssetHost;

/// What a settled entry holds. Scripts and stylesheets carry no value.
#[derive(Clone, Debug)]
enum LoadedAsset {
    Installed(AssetKind),
    Image(DecodedImage),
}

/// Converts what a host load produced into a cache value.
trait IntoLoaded: Send + 'static {
    fn into_loaded(self, kind: AssetKind) -> LoadedAsset;
}

impl IntoLoaded for () {
    fn into_loaded(self, kind: AssetKind) -> LoadedAsset {
        LoadedAsset::Installed(kind)
    }
}

impl IntoLoaded for DecodedImage {
    fn into_loaded(self, _kind: AssetKind) -> LoadedAsset {
        LoadedAsset::Image(self)
    }
}

type LoadOutcome = Result<LoadedAsset, AssetError>;
type SharedLoad = Shared<BoxFuture<'static, LoadOutcome>>;

struct AssetEntry {
    /// Distinguishes this entry from later ones under the same key.
    id: u64,
    load: SharedLoad,
    loaded: Arc<AtomicBool>,
}

struct Inner<H> {
    host: H,
    entries: DashMap<String, AssetEntry>,
    next_id: AtomicU64,
    #[cfg(feature = "stats")]
    stats: CacheStats,
}

impl<H> Inner<H> {
    /// Drops the entry for `key` if it is still the one created as `id`.
    fn evict_failed(&self, key: &str, id: u64, err: &AssetError) {
        let evicted = self.entries.remove_if(key, |_, entry| entry.id == id).is_some();
        if evicted {
            #[cfg(feature = "stats")]
            self.stats.record_failure();
            warn!("{}; evicted cache entry for retry", err);
        } else {
            warn!("{}; cache entry already cleared", err);
        }
    }
}

/// A single-flight cache of asset loads.
///
/// Each locator maps to at most one entry: the shared future of the one real
/// load started for it. Every request for a locator that already has an entry
/// gets a handle to that same future, whatever kind it asks for, so all callers
/// observe the same outcome and the host sees a single load.
///
/// Successful loads stay cached until [`clear_asset_cache`](Self::clear_asset_cache).
/// A failed load evicts its entry as it settles, so the next request starts
/// over.
///
/// Loads are spawned on the Tokio runtime when requested and progress whether
/// or not the returned future is polled. The `load_*` methods must therefore be
/// called from within a Tokio runtime.
///
/// Cloning the cache is cheap and the clones share entries.
///
/// # Examples
///
/// ```
/// use preloadkit_async::{AssetCache, InMemoryHost};
/// use preloadkit_core::ScriptOptions;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let host = InMemoryHost::new().with_resource("/js/app.js");
/// let cache = AssetCache::new(host.clone());
///
/// let first = cache.load_script("/js/app.js", ScriptOptions::default());
/// let second = cache.load_script("/js/app.js", ScriptOptions::default());
///
/// assert!(first.await.is_ok());
/// assert!(second.await.is_ok());
/// assert_eq!(host.load_count("/js/app.js"), 1);
/// assert!(cache.is_asset_loaded("/js/app.js"));
/// # }
/// ```
pub struct AssetCache<H> {
    inner: Arc<Inner<H>>,
}

impl<H> Clone for AssetCache<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: AssetHost> AssetCache<H> {
    pub fn new(host: H) -> Self {
        Self {
            inner: Arc::new(Inner {
                host,
                entries: DashMap::new(),
                next_id: AtomicU64::new(0),
                #[cfg(feature = "stats")]
                stats: CacheStats::new(),
            }),
        }
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    /// Loads a script, or joins the load already registered for `src`.
    ///
    /// A script the host already has resolves immediately without creating an
    /// element. Otherwise the element is created with the requested async/defer
    /// flags and, when an integrity hash is given, the anonymous cross-origin
    /// mode. `on_load` runs after a successful load, before the future
    /// resolves. Options are ignored when `src` already has an entry.
    pub fn load_script(
        &self,
        src: &str,
        options: ScriptOptions,
    ) -> impl Future<Output = Result<(), AssetError>> + Send + 'static {
        let load = self.request(src, AssetKind::Script, move |host| {
            if host.has_script(src) {
                return None;
            }
            let pending = host.load_script(ScriptElement::new(src, &options));
            let on_load = options.on_load;
            Some(
                async move {
                    pending.await?;
                    if let Some(callback) = on_load {
                        callback();
                    }
                    Ok::<(), String>(())
                }
                .boxed(),
            )
        });
        load.map(|outcome| outcome.map(|_| ()))
    }

    /// Loads a stylesheet, or joins the load already registered for `href`.
    pub fn load_stylesheet(
        &self,
        href: &str,
        options: StylesheetOptions,
    ) -> impl Future<Output = Result<(), AssetError>> + Send + 'static {
        let load = self.request(href, AssetKind::Stylesheet, |host| {
            if host.has_stylesheet(href) {
                return None;
            }
            Some(host.load_stylesheet(StylesheetElement::new(href, &options)))
        });
        load.map(|outcome| outcome.map(|_| ()))
    }

    /// Loads and decodes an image, or joins the load already registered for
    /// `src`.
    ///
    /// If `src` is cached as a script or stylesheet the future resolves with
    /// [`AssetError::KindMismatch`].
    pub fn load_image(
        &self,
        src: &str,
    ) -> impl Future<Output = Result<DecodedImage, AssetError>> + Send + 'static {
        let load = self.request(src, AssetKind::Image, |host| Some(host.load_image(src)));
        let locator = src.to_string();
        load.map(move |outcome| match outcome? {
            LoadedAsset::Image(image) => Ok(image),
            LoadedAsset::Installed(cached) => Err(AssetError::KindMismatch {
                locator,
                cached,
                requested: AssetKind::Image,
            }),
        })
    }

    /// Loads every request in parallel and resolves once all have loaded.
    ///
    /// Every item is registered before this returns; unknown kinds become
    /// failed sub-loads rather than an immediate error. The aggregate fails
    /// with the first error to settle and does not report which other items
    /// succeeded.
    pub fn load_assets<I>(
        &self,
        requests: I,
    ) -> impl Future<Output = Result<(), AssetError>> + Send + 'static
    where
        I: IntoIterator<Item = AssetRequest>,
    {
        let loads: Vec<BoxFuture<'static, Result<(), AssetError>>> = requests
            .into_iter()
            .map(|request| self.dispatch(request))
            .collect();
        future::try_join_all(loads).map(|joined| joined.map(|_| ()))
    }

    fn dispatch(&self, request: AssetRequest) -> BoxFuture<'static, Result<(), AssetError>> {
        match request.asset_kind() {
            Ok(AssetKind::Script) => self
                .load_script(&request.locator, request.script_options())
                .boxed(),
            Ok(AssetKind::Stylesheet) => self
                .load_stylesheet(&request.locator, request.stylesheet_options())
                .boxed(),
            Ok(AssetKind::Image) => self
                .load_image(&request.locator)
                .map(|outcome| outcome.map(|_| ()))
                .boxed(),
            Err(err) => {
                debug!("rejecting bulk item {}: {}", request.locator, err);
                future::ready(Err(err)).boxed()
            }
        }
    }

    /// Returns the shared load for `locator`, registering a new one if absent.
    ///
    /// `start` runs only for a new entry, under the map's entry lock. It
    /// returns `None` when the host already has the resource, which settles
    /// the entry as loaded on the spot.
    fn request<F, T>(&self, locator: &str, kind: AssetKind, start: F) -> SharedLoad
    where
        F: FnOnce(&H) -> Option<BoxFuture<'static, Result<T, String>>>,
        T: IntoLoaded,
    {
        match self.inner.entries.entry(locator.to_string()) {
            Entry::Occupied(occupied) => {
                #[cfg(feature = "stats")]
                self.inner.stats.record_hit();
                debug!("asset cache hit for {} {}", kind, locator);
                occupied.get().load.clone()
            }
            Entry::Vacant(vacant) => {
                #[cfg(feature = "stats")]
                self.inner.stats.record_miss();

                let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                let loaded = Arc::new(AtomicBool::new(false));

                let load = match start(&self.inner.host) {
                    None => {
                        debug!("{} {} already present", kind, locator);
                        loaded.store(true, Ordering::Release);
                        future::ready(Ok(LoadedAsset::Installed(kind)))
                            .boxed()
                            .shared()
                    }
                    Some(pending) => {
                        debug!("loading {} {}", kind, locator);
                        let work = pending
                            .map(move |outcome| outcome.map(|value| value.into_loaded(kind)));
                        self.spawn_load(locator, kind, id, Arc::clone(&loaded), work)
                    }
                };

                vacant.insert(AssetEntry {
                    id,
                    load: load.clone(),
                    loaded,
                });
                load
            }
        }
    }

    fn spawn_load<W>(
        &self,
        locator: &str,
        kind: AssetKind,
        id: u64,
        loaded: Arc<AtomicBool>,
        work: W,
    ) -> SharedLoad
    where
        W: Future<Output = Result<LoadedAsset, String>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let key = locator.to_string();

        let task = tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(Ok(asset)) => Ok(asset),
                Ok(Err(reason)) => Err(AssetError::load_failure(kind, key.as_str(), reason)),
                Err(_) => Err(AssetError::load_failure(
                    kind,
                    key.as_str(),
                    "load panicked",
                )),
            };
            match &outcome {
                Ok(_) => loaded.store(true, Ordering::Release),
                Err(err) => inner.evict_failed(&key, id, err),
            }
            outcome
        });

        let key = locator.to_string();
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(AssetError::load_failure(kind, key, join_err.to_string())),
            }
        }
        .boxed()
        .shared()
    }

    /// True only when `locator` has an entry whose load settled successfully.
    pub fn is_asset_loaded(&self, locator: &str) -> bool {
        self.inner
            .entries
            .get(locator)
            .map_or(false, |entry| entry.loaded.load(Ordering::Acquire))
    }

    /// True when `locator` has an entry, pending or settled.
    pub fn contains(&self, locator: &str) -> bool {
        self.inner.entries.contains_key(locator)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Forgets every entry. Futures already handed out still settle, but later
    /// requests start fresh loads.
    pub fn clear_asset_cache(&self) {
        let dropped = self.inner.entries.len();
        self.inner.entries.clear();
        debug!("asset cache cleared ({} entries)", dropped);
    }

    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &CacheStats {
        &self.inner.stats
    }
}
