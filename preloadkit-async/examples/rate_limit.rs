//! # Rate Limiting Example
//!
//! This example compares debounce and throttle on the same stream of events.

use preloadkit_async::{debounce, throttle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() {
    println!("=== Rate Limiting Example ===\n");

    let start = Instant::now();
    let debounced_runs = Arc::new(AtomicUsize::new(0));
    let throttled_runs = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&debounced_runs);
    let search = debounce(
        move |query: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            println!("[{:>4}ms] debounced search for {:?}", start.elapsed().as_millis(), query);
        },
        Duration::from_millis(150),
        false,
    );

    let counter = Arc::clone(&throttled_runs);
    let resize = throttle(
        move |width: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
            println!("[{:>4}ms] throttled resize to {}px", start.elapsed().as_millis(), width);
        },
        Duration::from_millis(100),
    );

    // 20 events, one every 25ms
    let query = "dependency-track";
    for i in 0..20 {
        search.call(query[..(i % query.len()) + 1].to_string());
        resize.call(800 + i as u32 * 10);
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    println!("\nEvents:          20");
    println!("Debounced runs:  {}", debounced_runs.load(Ordering::SeqCst));
    println!("Throttled runs:  {}", throttled_runs.load(Ordering::SeqCst));

    println!("\n--- Cancelling a pending call ---");
    search.call("never sent".to_string());
    println!("Pending: {}", search.is_pending());
    search.cancel();
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("Debounced runs:  {}", debounced_runs.load(Ordering::SeqCst));
}
