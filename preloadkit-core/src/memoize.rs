use std::collections::HashMap;
use std::marker::PhantomData;

use log::trace;
use parking_lot::RwLock;

#[cfg(feature = "stats")]
use crate::CacheStats;
use crate::CacheableKey;

/// A function wrapped with an unbounded result cache.
///
/// Results are keyed by [`CacheableKey::to_cache_key`] of the arguments, so two
/// argument sets that serialize identically share one result. The cache is
/// owned by this wrapper instance: memoizing the same function twice yields two
/// independent caches. Nothing is ever evicted except by [`Memoized::clear`].
///
/// The wrapped function runs without any lock held. Two threads missing on the
/// same key at the same moment may both compute it; the first insert wins.
///
/// # Examples
///
/// ```
/// use preloadkit_core::memoize;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// static CALLS: AtomicUsize = AtomicUsize::new(0);
///
/// let area = memoize(|dims: &(u32, u32)| {
///     CALLS.fetch_add(1, Ordering::SeqCst);
///     dims.0 * dims.1
/// });
///
/// assert_eq!(area.call(&(3, 4)), 12);
/// assert_eq!(area.call(&(3, 4)), 12);
/// assert_eq!(CALLS.load(Ordering::SeqCst), 1);
/// ```
pub struct Memoized<A: ?Sized, R, F> {
    func: F,
    cache: RwLock<HashMap<String, R>>,
    #[cfg(feature = "stats")]
    stats: CacheStats,
    _args: PhantomData<fn(&A)>,
}

/// Wraps `func` with a result cache. See [`Memoized`].
pub fn memoize<A, R, F>(func: F) -> Memoized<A, R, F>
where
    A: CacheableKey + ?Sized,
    R: Clone,
    F: Fn(&A) -> R,
{
    Memoized {
        func,
        cache: RwLock::new(HashMap::new()),
        #[cfg(feature = "stats")]
        stats: CacheStats::new(),
        _args: PhantomData,
    }
}

impl<A, R, F> Memoized<A, R, F>
where
    A: CacheableKey + ?Sized,
    R: Clone,
    F: Fn(&A) -> R,
{
    /// Returns the cached result for `args`, computing it on first use.
    pub fn call(&self, args: &A) -> R {
        let key = args.to_cache_key();

        if let Some(value) = self.cache.read().get(&key) {
            #[cfg(feature = "stats")]
            self.stats.record_hit();
            return value.clone();
        }

        #[cfg(feature = "stats")]
        self.stats.record_miss();
        trace!("memoize miss for key {}", key);

        let value = (self.func)(args);
        self.cache
            .write()
            .entry(key)
            .or_insert_with(|| value.clone())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Drops every cached result.
    pub fn clear(&self) {
        self.cache.write().clear();
    }

    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// Memoizer for fallible functions: only `Ok` values are cached, errors are
/// returned to the caller and recomputed on the next call.
///
/// ```
/// use preloadkit_core::memoize_result;
///
/// let parse = memoize_result(|s: &str| s.parse::<u16>());
///
/// assert_eq!(parse.call("8080"), Ok(8080));
/// assert!(parse.call("http").is_err());
/// assert_eq!(parse.len(), 1);
/// ```
pub struct MemoizedResult<A: ?Sized, T, E, F> {
    func: F,
    cache: RwLock<HashMap<String, T>>,
    #[cfg(feature = "stats")]
    stats: CacheStats,
    _args: PhantomData<fn(&A) -> E>,
}

/// Wraps a fallible `func` with a cache of its successful results.
pub fn memoize_result<A, T, E, F>(func: F) -> MemoizedResult<A, T, E, F>
where
    A: CacheableKey + ?Sized,
    T: Clone,
    F: Fn(&A) -> Result<T, E>,
{
    MemoizedResult {
        func,
        cache: RwLock::new(HashMap::new()),
        #[cfg(feature = "stats")]
        stats: CacheStats::new(),
        _args: PhantomData,
    }
}

impl<A, T, E, F> MemoizedResult<A, T, E, F>
where
    A: CacheableKey + ?Sized,
    T: Clone,
    F: Fn(&A) -> Result<T, E>,
{
    pub fn call(&self, args: &A) -> Result<T, E> {
        let key = args.to_cache_key();

        if let Some(value) = self.cache.read().get(&key) {
            #[cfg(feature = "stats")]
            self.stats.record_hit();
            return Ok(value.clone());
        }

        #[cfg(feature = "stats")]
        self.stats.record_miss();

        let value = (self.func)(args)?;
        Ok(self
            .cache
            .write()
            .entry(key)
            .or_insert_with(|| value.clone())
            .clone())
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }

    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
