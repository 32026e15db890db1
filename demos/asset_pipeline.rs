//! # Asset Pipeline Demo
//!
//! Preloads the assets of a report page, renders it through batched updates,
//! and lazily loads a chart once it scrolls into view.

use preloadkit::{
    batch_dom_updates, defer_execution, execute_when_visible_with, measure_performance, memoize,
    timing_report, AssetCache, AssetRequest, Capabilities, DeferOptions, ElementId, InMemoryHost,
    IntersectionObserver, Observation, ScriptOptions, StylesheetOptions, VisibilityOptions,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A viewport that reports every watched element as fully visible after a delay.
struct DelayedViewport {
    delay: Duration,
}

struct Connection(Arc<AtomicBool>);

impl Observation for Connection {
    fn disconnect(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl IntersectionObserver for DelayedViewport {
    fn observe(
        &self,
        target: &ElementId,
        _threshold: f64,
        mut on_change: Box<dyn FnMut(f64) + Send>,
    ) -> Box<dyn Observation> {
        let connected = Arc::new(AtomicBool::new(true));
        let live = Arc::clone(&connected);
        let delay = self.delay;
        println!("watching #{}", target);
        tokio::spawn(async move {
            for ratio in [0.0, 0.05, 0.4, 1.0] {
                tokio::time::sleep(delay).await;
                if !live.load(Ordering::SeqCst) {
                    return;
                }
                on_change(ratio);
            }
        });
        Box::new(Connection(connected))
    }
}

struct Browser;

impl Capabilities for Browser {
    fn intersection_observer(&self) -> Option<Arc<dyn IntersectionObserver>> {
        Some(Arc::new(DelayedViewport {
            delay: Duration::from_millis(50),
        }))
    }
}

#[tokio::main]
async fn main() {
    println!("=== Asset Pipeline Demo ===\n");

    let host = InMemoryHost::new()
        .with_latency(Duration::from_millis(40))
        .with_resource("/js/report.js")
        .with_resource("/js/chart.js")
        .with_resource("/css/report.css")
        .with_image("/img/severity.png", 48, 48);
    let cache = AssetCache::new(host.clone());

    println!("--- Preloading ---");
    let preload = measure_performance(
        |requests: Vec<AssetRequest>| cache.load_assets(requests),
        "preload_dispatch",
    );
    preload
        .call(vec![
            AssetRequest::script("/js/report.js", ScriptOptions::default().integrity("sha384-demo")),
            AssetRequest::stylesheet("/css/report.css", StylesheetOptions::default()),
            AssetRequest::image("/img/severity.png"),
        ])
        .await
        .unwrap();
    for element in host.script_elements() {
        println!("installed {:?}", element);
    }

    println!("\n--- Rendering ---");
    let label = memoize(|score: &u8| match score {
        9..=10 => "critical",
        7..=8 => "high",
        4..=6 => "medium",
        _ => "low",
    });
    let rows = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&rows);
    let render = batch_dom_updates(move |row: String| {
        sink.lock().push(row);
    });
    for (id, score) in [("CVE-2024-0001", 9u8), ("CVE-2024-0002", 5), ("CVE-2024-0003", 9)] {
        render.schedule(format!("{} {}", id, label.call(&score)));
    }
    println!("queued {} rows", render.pending());
    tokio::time::sleep(Duration::from_millis(30)).await;
    for row in rows.lock().iter() {
        println!("  {}", row);
    }

    println!("\n--- Lazy chart ---");
    let chart_cache = cache.clone();
    let load_chart = execute_when_visible_with(
        move || {
            let cache = chart_cache.clone();
            tokio::spawn(async move {
                match cache.load_script("/js/chart.js", ScriptOptions::default()).await {
                    Ok(()) => println!("chart script ready"),
                    Err(err) => println!("chart failed: {}", err),
                }
            });
        },
        VisibilityOptions::default(),
        &Browser,
    );
    let _chart = load_chart.setup(&ElementId::new("severity-chart"));
    tokio::time::sleep(Duration::from_millis(300)).await;

    let warm = defer_execution(
        move |locator: &'static str| println!("idle: would warm {}", locator),
        DeferOptions::default(),
    );
    warm.call("/js/export.js");
    tokio::time::sleep(Duration::from_millis(10)).await;

    println!("\n--- Timings ---");
    for (label, stats) in timing_report() {
        println!("{}: {} calls, last {:?}", label, stats.count(), stats.last());
    }
    println!("chart loaded: {}", cache.is_asset_loaded("/js/chart.js"));
}
