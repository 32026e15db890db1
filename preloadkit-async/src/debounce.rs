use std::sync::Arc;
use std::time::Duration;

use log::trace;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Wait used when callers have no better value.
pub const DEFAULT_DEBOUNCE_WAIT: Duration = Duration::from_millis(300);

struct DebounceState {
    pending: Option<JoinHandle<()>>,
    /// Bumped on every call and cancel; a timer only fires if it still matches.
    generation: u64,
}

/// A function that only runs once calls have stopped for `wait`.
///
/// Every [`call`](Self::call) restarts the timer with its own arguments, so
/// from a burst of calls only the last one runs, `wait` after it was made.
///
/// In *immediate* mode the roles flip: the call that opens a quiet window runs
/// synchronously and the timer only marks when the window closes, so the
/// function runs at the leading edge of a burst and not again at the trailing
/// edge. Arguments of the suppressed calls are dropped.
///
/// Timers run on Tokio, so `call` must be made from within a runtime. Clones
/// share one timer.
///
/// # Examples
///
/// ```
/// use preloadkit_async::debounce;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let searches = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&searches);
/// let search = debounce(
///     move |_query: String| {
///         counter.fetch_add(1, Ordering::SeqCst);
///     },
///     Duration::from_millis(20),
///     false,
/// );
///
/// for query in ["o", "op", "ope", "open"] {
///     search.call(query.to_string());
/// }
/// tokio::time::sleep(Duration::from_millis(50)).await;
/// assert_eq!(searches.load(Ordering::SeqCst), 1);
/// # }
/// ```
pub struct Debounced<A> {
    func: Arc<dyn Fn(A) + Send + Sync>,
    wait: Duration,
    immediate: bool,
    state: Arc<Mutex<DebounceState>>,
}

/// Wraps `func` so bursts of calls collapse into one. See [`Debounced`].
pub fn debounce<A, F>(func: F, wait: Duration, immediate: bool) -> Debounced<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Debounced {
        func: Arc::new(func),
        wait,
        immediate,
        state: Arc::new(Mutex::new(DebounceState {
            pending: None,
            generation: 0,
        })),
    }
}

impl<A: Send + 'static> Debounced<A> {
    pub fn call(&self, args: A) {
        let mut state = self.state.lock();
        let call_now = self.immediate && state.pending.is_none();

        if let Some(previous) = state.pending.take() {
            previous.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;

        let (run_now, run_later) = match (self.immediate, call_now) {
            (false, _) => (None, Some(args)),
            (true, true) => (Some(args), None),
            (true, false) => (None, None),
        };

        let func = Arc::clone(&self.func);
        let shared = Arc::clone(&self.state);
        let wait = self.wait;
        // measured from the call, not from when the task first runs
        let due = Instant::now() + wait;
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep_until(due).await;
            {
                let mut state = shared.lock();
                if state.generation != generation {
                    return;
                }
                state.pending = None;
            }
            if let Some(args) = run_later {
                trace!("debounce: trailing call after {:?}", wait);
                func(args);
            }
        }));
        drop(state);

        if let Some(args) = run_now {
            trace!("debounce: leading call");
            (self.func)(args);
        }
    }

    /// Drops the pending invocation, if any. In immediate mode this also
    /// reopens the window, so the next call runs at once.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        state.generation = state.generation.wrapping_add(1);
    }

    /// True while a timer is running.
    pub fn is_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }
}

impl<A> Clone for Debounced<A> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            wait: self.wait,
            immediate: self.immediate,
            state: Arc::clone(&self.state),
        }
    }
}
