//! # Asset Preloading Example
//!
//! This example shows how concurrent requests share one load, how failures
//! are evicted and retried, and how bulk preloading behaves.

use preloadkit_async::{
    AssetCache, AssetRequest, InMemoryHost, ScriptOptions, StylesheetOptions,
};
use std::time::Duration;

#[tokio::main]
async fn main() {
    println!("=== Asset Preloading Example ===\n");

    let host = InMemoryHost::new()
        .with_latency(Duration::from_millis(100))
        .with_resource("/js/dashboard.js")
        .with_resource("/css/dashboard.css")
        .with_image("/img/logo.png", 128, 128)
        .with_existing_script("/js/vendor.js");
    let cache = AssetCache::new(host.clone());

    println!("--- Concurrent requests for the same script ---");
    let (a, b, c) = tokio::join!(
        cache.load_script("/js/dashboard.js", ScriptOptions::default()),
        cache.load_script("/js/dashboard.js", ScriptOptions::default()),
        cache.load_script("/js/dashboard.js", ScriptOptions::default()),
    );
    println!("Outcomes: {:?} {:?} {:?}", a, b, c);
    println!("Underlying loads: {}", host.load_count("/js/dashboard.js"));

    println!("\n--- Script already on the page ---");
    cache
        .load_script("/js/vendor.js", ScriptOptions::default())
        .await
        .unwrap();
    println!("Elements created: {}", host.script_elements().len());

    println!("\n--- Failure and retry ---");
    match cache
        .load_stylesheet("/css/print.css", StylesheetOptions::default().media("print"))
        .await
    {
        Ok(()) => println!("Loaded unexpectedly"),
        Err(err) => println!("First attempt: {}", err),
    }
    host.set_available("/css/print.css", true);
    let retry = cache
        .load_stylesheet("/css/print.css", StylesheetOptions::default().media("print"))
        .await;
    println!("Second attempt: {:?}", retry);
    println!("Underlying loads: {}", host.load_count("/css/print.css"));

    println!("\n--- Bulk preload ---");
    let outcome = cache
        .load_assets(vec![
            AssetRequest::stylesheet("/css/dashboard.css", StylesheetOptions::default()),
            AssetRequest::image("/img/logo.png"),
            AssetRequest::new("font", "/fonts/inter.woff2"),
        ])
        .await;
    println!("Bulk outcome: {:?}", outcome);
    println!("Logo loaded: {}", cache.is_asset_loaded("/img/logo.png"));

    println!("\n--- Cache contents ---");
    println!("Entries: {}", cache.len());
    #[cfg(feature = "stats")]
    {
        let stats = cache.stats();
        println!("  Hits:      {}", stats.hits());
        println!("  Misses:    {}", stats.misses());
        println!("  Failures:  {}", stats.failures());
        println!("  Hit rate:  {:.2}%", stats.hit_rate() * 100.0);
    }

    cache.clear_asset_cache();
    println!("After clear: {} entries", cache.len());
}
