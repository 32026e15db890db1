use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::time::Instant;

use crate::capabilities::{Capabilities, IdleScheduler, NoCapabilities, FALLBACK_IDLE_DELAY};

/// Latest acceptable start for deferred work, unless configured otherwise.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeferOptions {
    /// Upper bound on how long the work may wait for an idle period.
    pub timeout: Duration,
}

impl Default for DeferOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// A function whose calls run when the environment is idle.
///
/// Each [`call`](Self::call) queues one run with its arguments. With an
/// [`IdleScheduler`] the run is handed to it together with the timeout;
/// without one it runs on a [`FALLBACK_IDLE_DELAY`] Tokio timer, so `call`
/// must then be made from within a runtime.
pub struct Deferred<A> {
    func: Arc<dyn Fn(A) + Send + Sync>,
    options: DeferOptions,
    idle: Option<Arc<dyn IdleScheduler>>,
}

/// Defers `func` in an environment without idle callbacks.
pub fn defer_execution<A, F>(func: F, options: DeferOptions) -> Deferred<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    defer_execution_with(func, options, &NoCapabilities)
}

/// Defers `func` using the idle scheduler `capabilities` provides, if any.
pub fn defer_execution_with<A, F>(
    func: F,
    options: DeferOptions,
    capabilities: &dyn Capabilities,
) -> Deferred<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    let idle = capabilities.idle_scheduler();
    if idle.is_none() {
        debug!(
            "idle callbacks unavailable, deferring on a {:?} timer",
            FALLBACK_IDLE_DELAY
        );
    }
    Deferred {
        func: Arc::new(func),
        options,
        idle,
    }
}

impl<A: Send + 'static> Deferred<A> {
    pub fn call(&self, args: A) {
        let func = Arc::clone(&self.func);
        match &self.idle {
            Some(idle) => {
                idle.request_idle_callback(self.options.timeout, Box::new(move || func(args)))
            }
            None => {
                let due = Instant::now() + FALLBACK_IDLE_DELAY;
                tokio::spawn(async move {
                    tokio::time::sleep_until(due).await;
                    func(args);
                });
            }
        }
    }

    pub fn options(&self) -> DeferOptions {
        self.options
    }
}

impl<A> Clone for Deferred<A> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            options: self.options,
            idle: self.idle.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Task;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct QueuedIdle {
        queue: Mutex<Vec<(Duration, Task)>>,
    }

    impl QueuedIdle {
        fn run_idle(&self) {
            let tasks: Vec<_> = std::mem::take(&mut *self.queue.lock());
            for (_, task) in tasks {
                task();
            }
        }
    }

    impl IdleScheduler for QueuedIdle {
        fn request_idle_callback(&self, timeout: Duration, task: Task) {
            self.queue.lock().push((timeout, task));
        }
    }

    struct IdleOnly(Arc<QueuedIdle>);

    impl Capabilities for IdleOnly {
        fn idle_scheduler(&self) -> Option<Arc<dyn IdleScheduler>> {
            Some(self.0.clone())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_falls_back_to_short_timer() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let deferred = defer_execution(
            move |n: usize| {
                counter.fetch_add(n, Ordering::SeqCst);
            },
            DeferOptions::default(),
        );

        deferred.call(2);
        deferred.call(3);
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_delay_counts_from_the_call() {
        let fired_at = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&fired_at);
        let deferred = defer_execution(
            move |_: ()| *sink.lock() = Some(Instant::now()),
            DeferOptions::default(),
        );

        let called_at = Instant::now();
        deferred.call(());
        tokio::time::advance(FALLBACK_IDLE_DELAY).await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(*fired_at.lock(), Some(called_at + FALLBACK_IDLE_DELAY));
    }

    #[test]
    fn test_uses_idle_scheduler_with_timeout() {
        let idle = Arc::new(QueuedIdle::default());
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let deferred = defer_execution_with(
            move |_: ()| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            DeferOptions {
                timeout: Duration::from_millis(250),
            },
            &IdleOnly(Arc::clone(&idle)),
        );

        deferred.call(());
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(idle.queue.lock()[0].0, Duration::from_millis(250));

        idle.run_idle();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
