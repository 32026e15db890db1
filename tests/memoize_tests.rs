use preloadkit::{
    measure_performance, memoize, memoize_result, reset_timings, timing_registry, timing_report,
    timing_stats, CacheableKey, DefaultCacheableKey,
};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug)]
struct ScanRequest {
    source: String,
    include_dev: bool,
}

impl DefaultCacheableKey for ScanRequest {}

#[test]
fn test_identical_arguments_compute_once() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    let summarize = memoize(|request: &ScanRequest| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        format!("{} (dev: {})", request.source, request.include_dev)
    });

    let a = ScanRequest {
        source: "Cargo.lock".to_string(),
        include_dev: false,
    };
    let b = ScanRequest {
        source: "Cargo.lock".to_string(),
        include_dev: false,
    };

    assert_eq!(summarize.call(&a), "Cargo.lock (dev: false)");
    assert_eq!(summarize.call(&b), "Cargo.lock (dev: false)");
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(summarize.len(), 1);

    summarize.call(&ScanRequest {
        source: "Cargo.lock".to_string(),
        include_dev: true,
    });
    assert_eq!(CALLS.load(Ordering::SeqCst), 2);
}

#[test]
fn test_independent_wrappers_have_independent_caches() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn double(n: &u64) -> u64 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        n * 2
    }

    let first = memoize(double);
    let second = memoize(double);
    assert_eq!(first.call(&21), 42);
    assert_eq!(second.call(&21), 42);
    assert_eq!(CALLS.load(Ordering::SeqCst), 2);

    first.clear();
    assert!(first.is_empty());
    assert_eq!(second.len(), 1);
}

#[test]
fn test_custom_key_groups_arguments() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    struct Severity(String);

    impl CacheableKey for Severity {
        fn to_cache_key(&self) -> String {
            self.0.to_ascii_lowercase()
        }
    }

    let rank = memoize(|severity: &Severity| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        match severity.0.to_ascii_lowercase().as_str() {
            "critical" => 4,
            "high" => 3,
            _ => 0,
        }
    });

    assert_eq!(rank.call(&Severity("HIGH".into())), 3);
    assert_eq!(rank.call(&Severity("high".into())), 3);
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_result_memoization_retries_errors() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    let parse_port = memoize_result(|raw: &str| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        raw.parse::<u16>().map_err(|e| e.to_string())
    });

    assert_eq!(parse_port.call("8080"), Ok(8080));
    assert_eq!(parse_port.call("8080"), Ok(8080));
    assert!(parse_port.call("http").is_err());
    assert!(parse_port.call("http").is_err());
    assert_eq!(CALLS.load(Ordering::SeqCst), 3);
    assert_eq!(parse_port.len(), 1);
}

#[cfg(feature = "stats")]
#[test]
fn test_memoize_stats() {
    let square = memoize(|n: &i32| n * n);
    square.call(&3);
    square.call(&3);
    square.call(&4);

    assert_eq!(square.stats().hits(), 1);
    assert_eq!(square.stats().misses(), 2);
}

#[test]
#[serial]
fn test_measure_is_transparent_and_recorded() {
    timing_registry::clear();

    let checksum = measure_performance(
        |bytes: Vec<u8>| bytes.iter().map(|b| *b as u32).sum::<u32>(),
        "checksum",
    );
    assert_eq!(checksum.call(vec![1, 2, 3]), 6);
    assert_eq!(checksum.call(vec![]), 0);

    let stats = timing_stats("checksum").unwrap();
    assert_eq!(stats.count(), 2);
    assert!(stats.max() >= stats.last());
    assert!(stats.total() >= stats.max());
}

#[test]
#[serial]
fn test_measure_preserves_errors() {
    timing_registry::clear();

    let fetch = measure_performance(
        |path: &str| -> Result<usize, String> {
            std::thread::sleep(Duration::from_millis(2));
            if path.starts_with('/') {
                Ok(path.len())
            } else {
                Err(format!("relative path: {path}"))
            }
        },
        "fetch",
    );

    assert_eq!(fetch.call("/logs"), Ok(5));
    assert_eq!(fetch.call("logs"), Err("relative path: logs".to_string()));

    let stats = timing_stats("fetch").unwrap();
    assert_eq!(stats.count(), 2);
    assert!(stats.total() >= Duration::from_millis(4));
}

#[test]
#[serial]
fn test_timing_report_lists_labels_in_order() {
    timing_registry::clear();

    measure_performance(|_: ()| {}, "render").call(());
    measure_performance(|_: ()| {}, "analyze").call(());

    let labels: Vec<String> = timing_report().into_iter().map(|(label, _)| label).collect();
    assert_eq!(labels, vec!["analyze", "render"]);

    assert!(reset_timings("render"));
    assert_eq!(timing_stats("render").unwrap().count(), 0);
    assert!(!reset_timings("unknown"));
}
