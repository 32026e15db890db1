use std::sync::Arc;
use std::time::Duration;

use log::trace;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Minimum spacing used by [`throttle_default`].
pub const DEFAULT_THROTTLE_WAIT: Duration = Duration::from_millis(300);

struct ThrottleState {
    last_ran: Option<Instant>,
    pending: Option<JoinHandle<()>>,
    generation: u64,
}

/// A function that runs at most once per `wait`.
///
/// A call made when the function has not run for at least `wait` runs
/// synchronously. Calls arriving sooner are coalesced into a single trailing
/// run, scheduled exactly `wait` after the previous run and carrying the most
/// recent arguments.
///
/// Timers run on Tokio, so `call` must be made from within a runtime. Clones
/// share one schedule.
pub struct Throttled<A> {
    func: Arc<dyn Fn(A) + Send + Sync>,
    wait: Duration,
    state: Arc<Mutex<ThrottleState>>,
}

/// Wraps `func` so it runs at most once per `wait`. See [`Throttled`].
pub fn throttle<A, F>(func: F, wait: Duration) -> Throttled<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Throttled {
        func: Arc::new(func),
        wait,
        state: Arc::new(Mutex::new(ThrottleState {
            last_ran: None,
            pending: None,
            generation: 0,
        })),
    }
}

/// [`throttle`] with [`DEFAULT_THROTTLE_WAIT`].
pub fn throttle_default<A, F>(func: F) -> Throttled<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    throttle(func, DEFAULT_THROTTLE_WAIT)
}

impl<A: Send + 'static> Throttled<A> {
    pub fn call(&self, args: A) {
        let now = Instant::now();
        let mut state = self.state.lock();

        // the previous trailing slot is superseded either way
        if let Some(previous) = state.pending.take() {
            previous.abort();
        }
        state.generation = state.generation.wrapping_add(1);

        let last_ran = state.last_ran;
        let due = match last_ran {
            Some(last) if now.duration_since(last) < self.wait => last + self.wait,
            _ => {
                state.last_ran = Some(now);
                drop(state);
                trace!("throttle: leading call");
                (self.func)(args);
                return;
            }
        };

        let generation = state.generation;
        let func = Arc::clone(&self.func);
        let shared = Arc::clone(&self.state);
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep_until(due).await;
            {
                let mut state = shared.lock();
                if state.generation != generation {
                    return;
                }
                state.pending = None;
                state.last_ran = Some(Instant::now());
            }
            trace!("throttle: trailing call");
            func(args);
        }));
    }

    /// Drops the pending trailing invocation, if any. The spacing from the
    /// last run is kept.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        state.generation = state.generation.wrapping_add(1);
    }

    /// True while a trailing run is scheduled.
    pub fn is_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }
}

impl<A> Clone for Throttled<A> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            wait: self.wait,
            state: Arc::clone(&self.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, sleep};

    fn recorder() -> (Arc<Mutex<Vec<(u32, Instant)>>>, impl Fn(u32) + Send + Sync) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, move |n| sink.lock().push((n, Instant::now())))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_fires_immediately() {
        let (calls, f) = recorder();
        let throttled = throttle(f, Duration::from_millis(100));

        throttled.call(1);
        assert_eq!(calls.lock().len(), 1);
        assert!(!throttled.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_calls_are_spaced_by_wait() {
        let (calls, f) = recorder();
        let throttled = throttle(f, Duration::from_millis(100));

        let start = Instant::now();
        for n in 0..10 {
            throttled.call(n);
            advance(Duration::from_millis(50)).await;
        }
        sleep(Duration::from_millis(200)).await;

        let calls = calls.lock();
        assert_eq!(calls[0], (0, start));
        for pair in calls.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(100));
        }
        // the last call always lands in the trailing slot
        assert_eq!(calls.last().map(|(n, _)| *n), Some(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trailing_call_uses_latest_arguments() {
        let (calls, f) = recorder();
        let throttled = throttle(f, Duration::from_millis(100));

        let start = Instant::now();
        throttled.call(1);
        advance(Duration::from_millis(10)).await;
        throttled.call(2);
        advance(Duration::from_millis(10)).await;
        throttled.call(3);
        assert!(throttled.is_pending());

        sleep(Duration::from_millis(150)).await;
        let calls = calls.lock();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, 3);
        assert!(calls[1].1 - start >= Duration::from_millis(100));
        assert!(calls[1].1 - start < Duration::from_millis(102));
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_after_silence_fires_immediately() {
        let (calls, f) = recorder();
        let throttled = throttle(f, Duration::from_millis(100));

        throttled.call(1);
        sleep(Duration::from_millis(250)).await;
        throttled.call(2);
        assert_eq!(calls.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_trailing_call() {
        let (calls, f) = recorder();
        let throttled = throttle(f, Duration::from_millis(100));

        throttled.call(1);
        throttled.call(2);
        throttled.cancel();
        sleep(Duration::from_millis(200)).await;

        let fired: Vec<u32> = calls.lock().iter().map(|(n, _)| *n).collect();
        assert_eq!(fired, vec![1]);
    }

    #[test]
    fn test_default_wait() {
        let throttled = throttle_default(|_: ()| {});
        assert_eq!(throttled.wait(), Duration::from_millis(300));
    }
}
