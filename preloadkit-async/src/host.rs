//! The environment assets are loaded into.
//!
//! [`AssetHost`] is the seam between the cache and whatever actually fetches
//! and installs resources: a browser binding, a headless renderer, or the
//! [`InMemoryHost`] used by demos and tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use preloadkit_core::{DecodedImage, ScriptElement, StylesheetElement};

/// Loads resources on behalf of an [`AssetCache`](crate::AssetCache).
///
/// The `load_*` methods are called synchronously while the cache registers a
/// new entry, so they must not call back into the cache. Installing the element
/// should happen in that synchronous part; the returned future settles when
/// the resource has finished loading. Failures are reported as a short reason
/// string which the cache wraps into a `LoadFailure`.
///
/// A host should not report an element whose load failed as present through
/// `has_script`/`has_stylesheet`; otherwise a retry would be satisfied by the
/// broken element instead of loading again.
pub trait AssetHost: Send + Sync + 'static {
    /// Whether a script with this `src` is already installed.
    fn has_script(&self, src: &str) -> bool;

    /// Whether a stylesheet with this `href` is already installed.
    fn has_stylesheet(&self, href: &str) -> bool;

    fn load_script(&self, element: ScriptElement) -> BoxFuture<'static, Result<(), String>>;

    fn load_stylesheet(
        &self,
        element: StylesheetElement,
    ) -> BoxFuture<'static, Result<(), String>>;

    fn load_image(&self, src: &str) -> BoxFuture<'static, Result<DecodedImage, String>>;
}

impl<H: AssetHost + ?Sized> AssetHost for Arc<H> {
    fn has_script(&self, src: &str) -> bool {
        (**self).has_script(src)
    }

    fn has_stylesheet(&self, href: &str) -> bool {
        (**self).has_stylesheet(href)
    }

    fn load_script(&self, element: ScriptElement) -> BoxFuture<'static, Result<(), String>> {
        (**self).load_script(element)
    }

    fn load_stylesheet(
        &self,
        element: StylesheetElement,
    ) -> BoxFuture<'static, Result<(), String>> {
        (**self).load_stylesheet(element)
    }

    fn load_image(&self, src: &str) -> BoxFuture<'static, Result<DecodedImage, String>> {
        (**self).load_image(src)
    }
}

#[derive(Default)]
struct HostState {
    resources: HashSet<String>,
    images: HashMap<String, DecodedImage>,
    installed_scripts: HashSet<String>,
    installed_stylesheets: HashSet<String>,
    script_elements: Vec<ScriptElement>,
    stylesheet_elements: Vec<StylesheetElement>,
    load_counts: HashMap<String, usize>,
    latency: Duration,
}

impl HostState {
    fn count_load(&mut self, locator: &str) {
        *self.load_counts.entry(locator.to_string()).or_insert(0) += 1;
    }
}

/// A headless host that serves resources from memory.
///
/// Scripts and stylesheets succeed when their locator was registered with
/// [`with_resource`](Self::with_resource); images when registered with
/// [`with_image`](Self::with_image). Anything else fails with `404 Not Found`.
/// Every load waits for the configured latency on the Tokio timer first.
///
/// Clones share state, so a test can keep one handle while the cache owns
/// another and flip resources on or off between attempts.
///
/// ```
/// use preloadkit_async::InMemoryHost;
///
/// let host = InMemoryHost::new()
///     .with_resource("/js/app.js")
///     .with_existing_script("/js/vendor.js");
///
/// assert!(host.has_installed_script("/js/vendor.js"));
/// assert!(!host.has_installed_script("/js/app.js"));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryHost {
    state: Arc<Mutex<HostState>>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(self, locator: impl Into<String>) -> Self {
        self.set_available(locator, true);
        self
    }

    pub fn with_image(self, src: impl Into<String>, width: u32, height: u32) -> Self {
        self.add_image(src, width, height);
        self
    }

    /// Marks a script as already present before any load.
    pub fn with_existing_script(self, src: impl Into<String>) -> Self {
        self.state.lock().installed_scripts.insert(src.into());
        self
    }

    /// Marks a stylesheet as already present before any load.
    pub fn with_existing_stylesheet(self, href: impl Into<String>) -> Self {
        self.state.lock().installed_stylesheets.insert(href.into());
        self
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    /// Makes an RGBA image of the given size servable.
    pub fn add_image(&self, src: impl Into<String>, width: u32, height: u32) {
        let src = src.into();
        let bytes = vec![0u8; (width as usize) * (height as usize) * 4];
        let image = DecodedImage::new(src.clone(), width, height, bytes);
        self.state.lock().images.insert(src, image);
    }

    /// Latency applied to loads started from now on.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Makes a script/stylesheet locator servable or not.
    pub fn set_available(&self, locator: impl Into<String>, available: bool) {
        let locator = locator.into();
        let mut state = self.state.lock();
        if available {
            state.resources.insert(locator);
        } else {
            state.resources.remove(&locator);
        }
    }

    /// Number of real loads started for `locator`.
    pub fn load_count(&self, locator: &str) -> usize {
        self.state
            .lock()
            .load_counts
            .get(locator)
            .copied()
            .unwrap_or(0)
    }

    /// Script elements created so far, in creation order.
    pub fn script_elements(&self) -> Vec<ScriptElement> {
        self.state.lock().script_elements.clone()
    }

    /// Stylesheet elements created so far, in creation order.
    pub fn stylesheet_elements(&self) -> Vec<StylesheetElement> {
        self.state.lock().stylesheet_elements.clone()
    }

    pub fn has_installed_script(&self, src: &str) -> bool {
        self.state.lock().installed_scripts.contains(src)
    }

    pub fn has_installed_stylesheet(&self, href: &str) -> bool {
        self.state.lock().installed_stylesheets.contains(href)
    }
}

impl AssetHost for InMemoryHost {
    fn has_script(&self, src: &str) -> bool {
        self.has_installed_script(src)
    }

    fn has_stylesheet(&self, href: &str) -> bool {
        self.has_installed_stylesheet(href)
    }

    fn load_script(&self, element: ScriptElement) -> BoxFuture<'static, Result<(), String>> {
        let latency = {
            let mut state = self.state.lock();
            state.count_load(&element.src);
            state.script_elements.push(element.clone());
            state.latency
        };
        let state = Arc::clone(&self.state);
        async move {
            tokio::time::sleep(latency).await;
            let mut state = state.lock();
            if state.resources.contains(&element.src) {
                state.installed_scripts.insert(element.src);
                Ok(())
            } else {
                Err("404 Not Found".to_string())
            }
        }
        .boxed()
    }

    fn load_stylesheet(
        &self,
        element: StylesheetElement,
    ) -> BoxFuture<'static, Result<(), String>> {
        let latency = {
            let mut state = self.state.lock();
            state.count_load(&element.href);
            state.stylesheet_elements.push(element.clone());
            state.latency
        };
        let state = Arc::clone(&self.state);
        async move {
            tokio::time::sleep(latency).await;
            let mut state = state.lock();
            if state.resources.contains(&element.href) {
                state.installed_stylesheets.insert(element.href);
                Ok(())
            } else {
                Err("404 Not Found".to_string())
            }
        }
        .boxed()
    }

    fn load_image(&self, src: &str) -> BoxFuture<'static, Result<DecodedImage, String>> {
        let latency = {
            let mut state = self.state.lock();
            state.count_load(src);
            state.latency
        };
        let state = Arc::clone(&self.state);
        let src = src.to_string();
        async move {
            tokio::time::sleep(latency).await;
            state
                .lock()
                .images
                .get(&src)
                .cloned()
                .ok_or_else(|| "404 Not Found".to_string())
        }
        .boxed()
    }
}
