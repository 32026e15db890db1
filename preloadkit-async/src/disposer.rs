use std::fmt;

/// Cancels something set up earlier, such as a pending visibility observation.
///
/// Dropping a `Disposer` without calling [`dispose`](Self::dispose) leaves the
/// setup in place.
#[must_use = "dropping a Disposer does not cancel anything"]
pub struct Disposer {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Disposer {
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A disposer with nothing to cancel.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn dispose(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}
