use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::capabilities::{
    Capabilities, ElementId, IntersectionObserver, NoCapabilities, Observation,
};
use crate::disposer::Disposer;

/// Share of an element that must be visible before the work runs.
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityOptions {
    /// Visible ratio, from 0.0 to 1.0, that triggers the work.
    pub threshold: f64,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_VISIBILITY_THRESHOLD,
        }
    }
}

type ObservationSlot = Arc<Mutex<Option<Box<dyn Observation>>>>;

/// Runs a function once per [`setup`](Self::setup), the first time the target
/// element becomes visible enough.
///
/// Without an [`IntersectionObserver`] nothing can be watched and `setup`
/// runs the function on the spot.
pub struct VisibilityGate {
    func: Arc<dyn Fn() + Send + Sync>,
    options: VisibilityOptions,
    observer: Option<Arc<dyn IntersectionObserver>>,
}

/// Gates `func` on visibility in an environment without intersection
/// observers. Every `setup` runs it immediately.
pub fn execute_when_visible<F>(func: F, options: VisibilityOptions) -> VisibilityGate
where
    F: Fn() + Send + Sync + 'static,
{
    execute_when_visible_with(func, options, &NoCapabilities)
}

/// Gates `func` on visibility reported by the observer `capabilities`
/// provides, if any.
pub fn execute_when_visible_with<F>(
    func: F,
    options: VisibilityOptions,
    capabilities: &dyn Capabilities,
) -> VisibilityGate
where
    F: Fn() + Send + Sync + 'static,
{
    VisibilityGate {
        func: Arc::new(func),
        options,
        observer: capabilities.intersection_observer(),
    }
}

impl VisibilityGate {
    /// Starts watching `target`. The returned [`Disposer`] stops watching
    /// without running the function.
    pub fn setup(&self, target: &ElementId) -> Disposer {
        let Some(observer) = &self.observer else {
            debug!("intersection observer unavailable, running for {} now", target);
            (self.func)();
            return Disposer::noop();
        };

        let fired = Arc::new(AtomicBool::new(false));
        let slot: ObservationSlot = Arc::new(Mutex::new(None));

        let threshold = self.options.threshold;
        let on_change = {
            let fired = Arc::clone(&fired);
            let slot = Arc::clone(&slot);
            let func = Arc::clone(&self.func);
            let target = target.clone();
            move |ratio: f64| {
                if ratio < threshold || fired.swap(true, Ordering::SeqCst) {
                    return;
                }
                let observation = slot.lock().take();
                if let Some(mut observation) = observation {
                    observation.disconnect();
                }
                trace!("{} became visible at ratio {:.2}", target, ratio);
                func();
            }
        };

        let observation = observer.observe(target, threshold, Box::new(on_change));

        // the callback may have fired inside observe, before the slot was filled
        {
            let mut guard = slot.lock();
            if !fired.load(Ordering::SeqCst) {
                *guard = Some(observation);
                drop(guard);
                return Self::disposer(fired, slot);
            }
        }
        let mut observation = observation;
        observation.disconnect();
        Self::disposer(fired, slot)
    }

    fn disposer(fired: Arc<AtomicBool>, slot: ObservationSlot) -> Disposer {
        Disposer::new(move || {
            fired.store(true, Ordering::SeqCst);
            let observation = slot.lock().take();
            if let Some(mut observation) = observation {
                observation.disconnect();
            }
        })
    }

    pub fn options(&self) -> VisibilityOptions {
        self.options
    }
}
