//! Asset descriptors: kinds, per-kind options, the element descriptions handed
//! to a host, bulk requests and decoded image handles.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::AssetError;

/// Cross-origin mode applied whenever an integrity hash is present.
pub const CROSS_ORIGIN_ANONYMOUS: &str = "anonymous";

/// Media query used for stylesheets when none is given.
pub const DEFAULT_MEDIA: &str = "all";

/// The three kinds of resource the asset cache knows how to load.
///
/// # Examples
///
/// ```
/// use preloadkit_core::AssetKind;
///
/// let kind: AssetKind = "stylesheet".parse().unwrap();
/// assert_eq!(kind, AssetKind::Stylesheet);
/// assert_eq!(kind.to_string(), "stylesheet");
///
/// assert!("font".parse::<AssetKind>().is_err());
/// assert!("CSS".parse::<AssetKind>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Script,
    Stylesheet,
    Image,
}

impl AssetKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Script => "script",
            AssetKind::Stylesheet => "stylesheet",
            AssetKind::Image => "image",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts exactly the lowercase tags `script`, `stylesheet` and `image`;
/// anything else is [`AssetError::UnknownAssetKind`].
impl FromStr for AssetKind {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "script" => Ok(AssetKind::Script),
            "stylesheet" => Ok(AssetKind::Stylesheet),
            "image" => Ok(AssetKind::Image),
            _ => Err(AssetError::UnknownAssetKind(s.to_string())),
        }
    }
}

/// Callback fired after a script loads and before its future resolves.
pub type OnLoad = Arc<dyn Fn() + Send + Sync>;

/// Options for loading a script.
///
/// ```
/// use preloadkit_core::ScriptOptions;
///
/// let opts = ScriptOptions::default().integrity("sha384-abc");
/// assert!(opts.is_async && opts.is_deferred);
/// assert_eq!(opts.integrity.as_deref(), Some("sha384-abc"));
/// ```
#[derive(Clone)]
pub struct ScriptOptions {
    pub is_async: bool,
    pub is_deferred: bool,
    pub integrity: Option<String>,
    pub on_load: Option<OnLoad>,
}

impl ScriptOptions {
    pub fn is_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    pub fn is_deferred(mut self, is_deferred: bool) -> Self {
        self.is_deferred = is_deferred;
        self
    }

    pub fn integrity(mut self, hash: impl Into<String>) -> Self {
        self.integrity = Some(hash.into());
        self
    }

    pub fn on_load<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_load = Some(Arc::new(callback));
        self
    }
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            is_async: true,
            is_deferred: true,
            integrity: None,
            on_load: None,
        }
    }
}

impl fmt::Debug for ScriptOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptOptions")
            .field("is_async", &self.is_async)
            .field("is_deferred", &self.is_deferred)
            .field("integrity", &self.integrity)
            .field("on_load", &self.on_load.is_some())
            .finish()
    }
}

/// Options for loading a stylesheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StylesheetOptions {
    pub media: String,
    pub integrity: Option<String>,
}

impl StylesheetOptions {
    pub fn media(mut self, media: impl Into<String>) -> Self {
        self.media = media.into();
        self
    }

    pub fn integrity(mut self, hash: impl Into<String>) -> Self {
        self.integrity = Some(hash.into());
        self
    }
}

impl Default for StylesheetOptions {
    fn default() -> Self {
        Self {
            media: DEFAULT_MEDIA.to_string(),
            integrity: None,
        }
    }
}

/// A script element as it is handed to the host for insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptElement {
    pub src: String,
    pub is_async: bool,
    pub is_deferred: bool,
    pub integrity: Option<String>,
    pub cross_origin: Option<String>,
}

impl ScriptElement {
    /// Builds the element, setting the anonymous cross-origin mode exactly
    /// when an integrity hash is present.
    ///
    /// ```
    /// use preloadkit_core::{ScriptElement, ScriptOptions};
    ///
    /// let plain = ScriptElement::new("/a.js", &ScriptOptions::default());
    /// assert_eq!(plain.cross_origin, None);
    ///
    /// let pinned = ScriptElement::new("/a.js", &ScriptOptions::default().integrity("sha384-x"));
    /// assert_eq!(pinned.cross_origin.as_deref(), Some("anonymous"));
    /// ```
    pub fn new(src: impl Into<String>, options: &ScriptOptions) -> Self {
        let integrity = options.integrity.clone().filter(|h| !h.is_empty());
        Self {
            src: src.into(),
            is_async: options.is_async,
            is_deferred: options.is_deferred,
            cross_origin: integrity.as_ref().map(|_| CROSS_ORIGIN_ANONYMOUS.to_string()),
            integrity,
        }
    }
}

/// A stylesheet link element as it is handed to the host for insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StylesheetElement {
    pub href: String,
    pub rel: String,
    pub media: String,
    pub integrity: Option<String>,
    pub cross_origin: Option<String>,
}

impl StylesheetElement {
    pub fn new(href: impl Into<String>, options: &StylesheetOptions) -> Self {
        let integrity = options.integrity.clone().filter(|h| !h.is_empty());
        Self {
            href: href.into(),
            rel: "stylesheet".to_string(),
            media: options.media.clone(),
            cross_origin: integrity.as_ref().map(|_| CROSS_ORIGIN_ANONYMOUS.to_string()),
            integrity,
        }
    }
}

/// Per-kind options attached to a bulk request item.
#[derive(Clone, Debug, Default)]
pub enum AssetOptions {
    #[default]
    None,
    Script(ScriptOptions),
    Stylesheet(StylesheetOptions),
}

/// One item of a bulk load.
///
/// The kind is kept as the raw tag it arrived with and only resolved when the
/// request is dispatched, so an unrecognized tag surfaces as a failed
/// sub-load rather than a construction error.
#[derive(Clone, Debug)]
pub struct AssetRequest {
    pub kind: String,
    pub locator: String,
    pub options: AssetOptions,
}

impl AssetRequest {
    pub fn new(kind: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            locator: locator.into(),
            options: AssetOptions::None,
        }
    }

    pub fn script(src: impl Into<String>, options: ScriptOptions) -> Self {
        Self {
            kind: AssetKind::Script.as_str().to_string(),
            locator: src.into(),
            options: AssetOptions::Script(options),
        }
    }

    pub fn stylesheet(href: impl Into<String>, options: StylesheetOptions) -> Self {
        Self {
            kind: AssetKind::Stylesheet.as_str().to_string(),
            locator: href.into(),
            options: AssetOptions::Stylesheet(options),
        }
    }

    pub fn image(src: impl Into<String>) -> Self {
        Self::new(AssetKind::Image.as_str(), src)
    }

    /// Resolves the raw kind tag.
    pub fn asset_kind(&self) -> Result<AssetKind, AssetError> {
        self.kind.parse()
    }

    /// Script options carried by this request, or the defaults.
    pub fn script_options(&self) -> ScriptOptions {
        match &self.options {
            AssetOptions::Script(options) => options.clone(),
            _ => ScriptOptions::default(),
        }
    }

    /// Stylesheet options carried by this request, or the defaults.
    pub fn stylesheet_options(&self) -> StylesheetOptions {
        match &self.options {
            AssetOptions::Stylesheet(options) => options.clone(),
            _ => StylesheetOptions::default(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ImageData {
    src: String,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

/// Handle to a decoded image, cheap to clone and share between waiters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    inner: Arc<ImageData>,
}

impl DecodedImage {
    pub fn new(src: impl Into<String>, width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(ImageData {
                src: src.into(),
                width,
                height,
                bytes,
            }),
        }
    }

    pub fn src(&self) -> &str {
        &self.inner.src
    }

    pub fn width(&self) -> u32 {
        self.inner.width
    }

    pub fn height(&self) -> u32 {
        self.inner.height
    }

    pub fn bytes(&self) -> &[u8] {
        &self.inner.bytes
    }

    /// True when both handles point at the same decoded image.
    pub fn ptr_eq(&self, other: &DecodedImage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
