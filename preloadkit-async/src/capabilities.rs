//! Optional scheduling primitives of the execution environment.
//!
//! Browsers differ in what they offer (idle callbacks, animation frames,
//! intersection observers). Instead of probing for them inline, the utilities
//! take a [`Capabilities`] provider and fall back to plain Tokio timers, or to
//! immediate execution, for anything the provider does not supply.
//! [`NoCapabilities`] supplies nothing and is the default.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::time::Instant;

/// A unit of deferred work handed to a scheduler.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Delay used in place of an idle callback when none is available.
pub const FALLBACK_IDLE_DELAY: Duration = Duration::from_millis(1);

/// Frame interval used in place of animation frames when none are available.
pub const FALLBACK_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Runs work when the environment reports spare capacity.
pub trait IdleScheduler: Send + Sync {
    /// Runs `task` during an idle period, and no later than `timeout` from now.
    fn request_idle_callback(&self, timeout: Duration, task: Task);
}

/// Runs work at the next frame boundary.
pub trait FrameScheduler: Send + Sync {
    fn request_animation_frame(&self, task: Task);
}

/// An opaque reference to an observable element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A live observation created by [`IntersectionObserver::observe`].
pub trait Observation: Send {
    /// Stops delivering visibility changes. Calling it twice is harmless.
    fn disconnect(&mut self);
}

/// Reports how much of an element is visible in the viewport.
pub trait IntersectionObserver: Send + Sync {
    /// Starts watching `target`, calling `on_change` with the visible ratio
    /// (0.0 to 1.0) whenever it crosses `threshold`. The callback may be
    /// invoked from within `observe` itself.
    fn observe(
        &self,
        target: &ElementId,
        threshold: f64,
        on_change: Box<dyn FnMut(f64) + Send>,
    ) -> Box<dyn Observation>;
}

/// Supplies whichever primitives the environment has.
pub trait Capabilities: Send + Sync {
    fn idle_scheduler(&self) -> Option<Arc<dyn IdleScheduler>> {
        None
    }

    fn frame_scheduler(&self) -> Option<Arc<dyn FrameScheduler>> {
        None
    }

    fn intersection_observer(&self) -> Option<Arc<dyn IntersectionObserver>> {
        None
    }
}

/// An environment with none of the optional primitives.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCapabilities;

impl Capabilities for NoCapabilities {}

/// Frame scheduling on a fixed Tokio timer.
struct TimerFrames;

impl FrameScheduler for TimerFrames {
    fn request_animation_frame(&self, task: Task) {
        let due = Instant::now() + FALLBACK_FRAME_INTERVAL;
        tokio::spawn(async move {
            tokio::time::sleep_until(due).await;
            task();
        });
    }
}

/// The provider's frame scheduler, or a timer-based stand-in.
pub(crate) fn frames_or_timer(capabilities: &dyn Capabilities) -> Arc<dyn FrameScheduler> {
    capabilities.frame_scheduler().unwrap_or_else(|| {
        debug!(
            "animation frames unavailable, batching on a {:?} timer",
            FALLBACK_FRAME_INTERVAL
        );
        Arc::new(TimerFrames)
    })
}
