use std::sync::Arc;

use log::trace;
use parking_lot::Mutex;

use crate::capabilities::{frames_or_timer, Capabilities, FrameScheduler, NoCapabilities};

struct BatchState<A> {
    updates: Vec<A>,
    scheduled: bool,
    generation: u64,
}

/// Collects updates and applies them together at the next frame.
///
/// Every [`schedule`](Self::schedule) queues one argument set. The first
/// queued set requests a frame; when it fires, `update` is invoked once per
/// queued set in call order. Sets queued while a flush runs wait for the
/// following frame.
pub struct Batched<A> {
    update: Arc<dyn Fn(A) + Send + Sync>,
    frames: Arc<dyn FrameScheduler>,
    state: Arc<Mutex<BatchState<A>>>,
}

/// Batches calls to `update` on a [`FALLBACK_FRAME_INTERVAL`] Tokio timer.
///
/// [`FALLBACK_FRAME_INTERVAL`]: crate::FALLBACK_FRAME_INTERVAL
pub fn batch_dom_updates<A, F>(update: F) -> Batched<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    batch_dom_updates_with(update, &NoCapabilities)
}

/// Batches calls to `update` on the frame scheduler `capabilities` provides,
/// falling back to a timer.
pub fn batch_dom_updates_with<A, F>(update: F, capabilities: &dyn Capabilities) -> Batched<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Batched {
        update: Arc::new(update),
        frames: frames_or_timer(capabilities),
        state: Arc::new(Mutex::new(BatchState {
            updates: Vec::new(),
            scheduled: false,
            generation: 0,
        })),
    }
}

impl<A: Send + 'static> Batched<A> {
    pub fn schedule(&self, args: A) {
        let generation = {
            let mut state = self.state.lock();
            state.updates.push(args);
            if state.scheduled {
                return;
            }
            state.scheduled = true;
            state.generation
        };

        let update = Arc::clone(&self.update);
        let shared = Arc::clone(&self.state);
        self.frames.request_animation_frame(Box::new(move || {
            let updates = {
                let mut state = shared.lock();
                if state.generation != generation {
                    return;
                }
                state.scheduled = false;
                std::mem::take(&mut state.updates)
            };
            trace!("flushing {} batched updates", updates.len());
            for args in updates {
                update(args);
            }
        }));
    }

    /// Discards queued updates. A frame already requested for them does
    /// nothing when it fires.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.updates.clear();
        state.scheduled = false;
        state.generation = state.generation.wrapping_add(1);
    }

    /// Number of updates waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.state.lock().updates.len()
    }
}

impl<A> Clone for Batched<A> {
    fn clone(&self) -> Self {
        Self {
            update: Arc::clone(&self.update),
            frames: Arc::clone(&self.frames),
            state: Arc::clone(&self.state),
        }
    }
}
