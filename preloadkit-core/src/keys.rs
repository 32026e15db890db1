use std::fmt::Debug;

/// Structural serialization of a call's arguments, used as a memoization key.
///
/// Two argument sets that produce the same key are treated as the same call.
/// Implement this directly when a cheaper or more selective key exists;
/// otherwise opt into the `Debug`-based default through [`DefaultCacheableKey`].
///
/// A type must not implement both traits.
///
/// # Examples
///
/// ```
/// use preloadkit_core::CacheableKey;
///
/// struct Viewport {
///     width: u32,
///     height: u32,
///     label: String,
/// }
///
/// // `label` is presentation only and does not affect results
/// impl CacheableKey for Viewport {
///     fn to_cache_key(&self) -> String {
///         format!("{}x{}", self.width, self.height)
///     }
/// }
///
/// let a = Viewport { width: 800, height: 600, label: "main".into() };
/// let b = Viewport { width: 800, height: 600, label: "side".into() };
/// assert_eq!(a.to_cache_key(), b.to_cache_key());
/// ```
pub trait CacheableKey {
    fn to_cache_key(&self) -> String;
}

/// Marker trait selecting the `Debug` representation as the cache key.
///
/// ```
/// use preloadkit_core::{CacheableKey, DefaultCacheableKey};
///
/// #[derive(Debug)]
/// struct Query {
///     term: String,
///     page: u32,
/// }
///
/// impl DefaultCacheableKey for Query {}
///
/// let q = Query { term: "openssl".into(), page: 2 };
/// assert_eq!(q.to_cache_key(), r#"Query { term: "openssl", page: 2 }"#);
/// ```
pub trait DefaultCacheableKey: Debug {}

impl<T: DefaultCacheableKey + ?Sized> CacheableKey for T {
    fn to_cache_key(&self) -> String {
        format!("{:?}", self)
    }
}

macro_rules! default_key {
    ($($t:ty),* $(,)?) => {
        $(impl DefaultCacheableKey for $t {})*
    };
}

default_key!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    str,
    String,
);

macro_rules! tuple_key {
    ($($name:ident),+) => {
        impl<$($name: Debug),+> DefaultCacheableKey for ($($name,)+) {}
    };
}

tuple_key!(A);
tuple_key!(A, B);
tuple_key!(A, B, C);
tuple_key!(A, B, C, D);
tuple_key!(A, B, C, D, E);
tuple_key!(A, B, C, D, E, F);

impl<T: Debug> DefaultCacheableKey for Vec<T> {}
impl<T: Debug> DefaultCacheableKey for [T] {}
impl<T: Debug> DefaultCacheableKey for Option<T> {}
impl<T: Debug + ?Sized> DefaultCacheableKey for &T {}
