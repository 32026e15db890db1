use thiserror::Error;

use crate::AssetKind;

/// Errors produced by asset loading.
///
/// Every variant is local and recoverable: re-issuing the same request after a
/// failure starts over. The type is `Clone` because one outcome is delivered
/// to every caller waiting on the same in-flight load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// The host failed to fetch, parse or decode the resource.
    #[error("Failed to load {kind}: {locator}")]
    LoadFailure {
        kind: AssetKind,
        locator: String,
        reason: String,
    },

    /// A bulk request named a kind other than script, stylesheet or image.
    #[error("Unknown asset type: {0}")]
    UnknownAssetKind(String),

    /// An image was requested for a locator already cached as another kind.
    #[error("{locator} is cached as a {cached}, not a {requested}")]
    KindMismatch {
        locator: String,
        cached: AssetKind,
        requested: AssetKind,
    },
}

impl AssetError {
    pub fn load_failure(
        kind: AssetKind,
        locator: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AssetError::LoadFailure {
            kind,
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    /// The locator the error refers to, if any.
    pub fn locator(&self) -> Option<&str> {
        match self {
            AssetError::LoadFailure { locator, .. } | AssetError::KindMismatch { locator, .. } => {
                Some(locator)
            }
            AssetError::UnknownAssetKind(_) => None,
        }
    }
}
