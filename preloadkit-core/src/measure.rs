use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use log::debug;

use crate::timing_registry::{self, TimingStats};

/// A transparent wrapper that times every call.
///
/// The wrapped function's return value is passed through untouched, including
/// `Err` values; a panic propagates before anything is recorded. Each
/// measurement is logged at debug level and added to the
/// [`timing_registry`] under the wrapper's label.
///
/// # Examples
///
/// ```
/// use preloadkit_core::measure_performance;
///
/// let parse = measure_performance(|line: &str| line.split_whitespace().count(), "count_words");
/// assert_eq!(parse.call("2024/01/02 10:00:00 scan started"), 4);
/// assert_eq!(parse.stats().count(), 1);
/// ```
pub struct Measured<A, R, F> {
    func: F,
    label: String,
    stats: Arc<TimingStats>,
    _sig: PhantomData<fn(A) -> R>,
}

/// Wraps `func` so each call is timed under `label`.
pub fn measure_performance<A, R, F>(func: F, label: impl Into<String>) -> Measured<A, R, F>
where
    F: Fn(A) -> R,
{
    let label = label.into();
    let stats = timing_registry::register(&label);
    Measured {
        func,
        label,
        stats,
        _sig: PhantomData,
    }
}

impl<A, R, F> Measured<A, R, F>
where
    F: Fn(A) -> R,
{
    pub fn call(&self, args: A) -> R {
        let start = Instant::now();
        let result = (self.func)(args);
        let elapsed = start.elapsed();

        self.stats.record(elapsed);
        debug!(
            "{} execution time: {:.2}ms",
            self.label,
            elapsed.as_secs_f64() * 1000.0
        );

        result
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Live statistics for this wrapper's label.
    pub fn stats(&self) -> &TimingStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::time::Duration;

    #[test]
    #[serial]
    fn test_passes_value_through_and_records() {
        let m = measure_performance(|n: u64| n * 3, "measure_value");
        assert_eq!(m.call(5), 15);
        assert_eq!(m.call(1), 3);
        assert_eq!(m.stats().count(), 2);
        assert_eq!(timing_registry::get("measure_value").unwrap().count(), 2);
    }

    #[test]
    #[serial]
    fn test_errors_pass_through() {
        let m = measure_performance(|s: &str| s.parse::<u8>(), "measure_errors");
        assert!(m.call("300").is_err());
        assert_eq!(m.call("30"), Ok(30));
        assert_eq!(m.stats().count(), 2);
    }

    #[test]
    #[serial]
    fn test_elapsed_time_is_recorded() {
        let m = measure_performance(
            |d: Duration| std::thread::sleep(d),
            "measure_sleep",
        );
        m.call(Duration::from_millis(5));
        assert!(m.stats().max() >= Duration::from_millis(5));
    }

    #[test]
    #[serial]
    fn test_panic_propagates_unrecorded() {
        let m = measure_performance(|_: ()| -> u8 { panic!("boom") }, "measure_panic");
        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| m.call(())));
        assert!(caught.is_err());
        assert_eq!(m.stats().count(), 0);
    }
}
