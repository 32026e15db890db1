use futures::future::join_all;
use preloadkit::{
    AssetCache, AssetError, AssetKind, AssetRequest, InMemoryHost, ScriptOptions,
    StylesheetOptions,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn slow_host() -> InMemoryHost {
    InMemoryHost::new().with_latency(Duration::from_millis(25))
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_share_one_load() {
    let host = slow_host().with_resource("/js/report.js");
    let cache = AssetCache::new(host.clone());

    let loads: Vec<_> = (0..8)
        .map(|_| cache.load_script("/js/report.js", ScriptOptions::default()))
        .collect();
    assert!(!cache.is_asset_loaded("/js/report.js"));
    assert!(cache.contains("/js/report.js"));

    let outcomes = join_all(loads).await;
    assert!(outcomes.iter().all(|outcome| outcome.is_ok()));
    assert_eq!(host.load_count("/js/report.js"), 1);
    assert_eq!(host.script_elements().len(), 1);
    assert!(cache.is_asset_loaded("/js/report.js"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_across_threads() {
    let host = InMemoryHost::new()
        .with_latency(Duration::from_millis(20))
        .with_image("/img/graph.png", 320, 200);
    let cache = AssetCache::new(host.clone());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            cache.load_image("/img/graph.png").await
        }));
    }

    let mut images = Vec::new();
    for handle in handles {
        images.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(host.load_count("/img/graph.png"), 1);
    assert!(images.iter().all(|image| image.ptr_eq(&images[0])));
    assert_eq!((images[0].width(), images[0].height()), (320, 200));
}

#[tokio::test(start_paused = true)]
async fn test_every_caller_sees_the_same_failure() {
    let host = slow_host();
    let cache = AssetCache::new(host.clone());

    let first = cache.load_stylesheet("/css/missing.css", StylesheetOptions::default());
    let second = cache.load_stylesheet("/css/missing.css", StylesheetOptions::default());
    let (first, second) = tokio::join!(first, second);

    let expected = AssetError::load_failure(AssetKind::Stylesheet, "/css/missing.css", "404 Not Found");
    assert_eq!(first, Err(expected.clone()));
    assert_eq!(second, Err(expected));
    assert_eq!(host.load_count("/css/missing.css"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_load_is_evicted_and_retried() {
    let host = slow_host();
    let cache = AssetCache::new(host.clone());

    let err = cache
        .load_script("/js/flaky.js", ScriptOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to load script: /js/flaky.js");
    assert_eq!(err.locator(), Some("/js/flaky.js"));
    assert!(!cache.is_asset_loaded("/js/flaky.js"));
    assert!(!cache.contains("/js/flaky.js"));

    host.set_available("/js/flaky.js", true);
    cache
        .load_script("/js/flaky.js", ScriptOptions::default())
        .await
        .unwrap();
    assert_eq!(host.load_count("/js/flaky.js"), 2);
    assert!(cache.is_asset_loaded("/js/flaky.js"));
}

#[tokio::test(start_paused = true)]
async fn test_success_is_cached_until_cleared() {
    let host = slow_host().with_resource("/css/theme.css");
    let cache = AssetCache::new(host.clone());

    for _ in 0..3 {
        cache
            .load_stylesheet("/css/theme.css", StylesheetOptions::default())
            .await
            .unwrap();
    }
    assert_eq!(host.load_count("/css/theme.css"), 1);
    assert!(cache.is_asset_loaded("/css/theme.css"));

    cache.clear_asset_cache();
    assert!(!cache.is_asset_loaded("/css/theme.css"));
    assert!(cache.is_empty());

    // the stylesheet is still on the page, so no second element is created
    let reload = cache.load_stylesheet("/css/theme.css", StylesheetOptions::default());
    assert_eq!(reload.await, Ok(()));
    assert!(cache.is_asset_loaded("/css/theme.css"));
    assert_eq!(host.load_count("/css/theme.css"), 1);
    assert_eq!(host.stylesheet_elements().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_image_is_fetched_again_after_clear() {
    let host = slow_host().with_image("/img/banner.png", 800, 200);
    let cache = AssetCache::new(host.clone());

    cache.load_image("/img/banner.png").await.unwrap();
    cache.load_image("/img/banner.png").await.unwrap();
    assert_eq!(host.load_count("/img/banner.png"), 1);

    cache.clear_asset_cache();
    let image = cache.load_image("/img/banner.png").await.unwrap();
    assert_eq!((image.width(), image.height()), (800, 200));
    assert_eq!(host.load_count("/img/banner.png"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_on_load_runs_once_before_resolution() {
    let host = slow_host().with_resource("/js/widget.js");
    let cache = AssetCache::new(host);
    let loaded = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&loaded);
    let options = ScriptOptions::default().on_load(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let first = cache.load_script("/js/widget.js", options);
    let second = cache.load_script("/js/widget.js", ScriptOptions::default());

    first.await.unwrap();
    assert_eq!(loaded.load(Ordering::SeqCst), 1);
    second.await.unwrap();
    assert_eq!(loaded.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_load_assets_mixed_kinds() {
    let host = slow_host()
        .with_resource("/js/app.js")
        .with_resource("/css/app.css")
        .with_image("/img/hero.webp", 1280, 720);
    let cache = AssetCache::new(host.clone());

    cache
        .load_assets(vec![
            AssetRequest::script("/js/app.js", ScriptOptions::default().is_deferred(false)),
            AssetRequest::new("stylesheet", "/css/app.css"),
            AssetRequest::image("/img/hero.webp"),
        ])
        .await
        .unwrap();

    assert_eq!(cache.len(), 3);
    for locator in ["/js/app.js", "/css/app.css", "/img/hero.webp"] {
        assert!(cache.is_asset_loaded(locator), "{locator} not loaded");
    }
    assert!(!host.script_elements()[0].is_deferred);
}

#[tokio::test(start_paused = true)]
async fn test_load_assets_rejects_kind_aliases() {
    let host = slow_host().with_resource("/css/app.css");
    let cache = AssetCache::new(host.clone());

    let pending = cache.load_assets(vec![AssetRequest::new("css", "/css/app.css")]);
    assert_eq!(
        pending.await,
        Err(AssetError::UnknownAssetKind("css".to_string()))
    );
    assert_eq!(host.load_count("/css/app.css"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_load_assets_unknown_kind_rejects_asynchronously() {
    let cache = AssetCache::new(InMemoryHost::new());

    let pending = cache.load_assets(vec![AssetRequest::new("bogus", "x")]);
    assert_eq!(
        pending.await,
        Err(AssetError::UnknownAssetKind("bogus".to_string()))
    );
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_load_assets_fails_if_any_item_fails() {
    let host = slow_host().with_resource("/js/ok.js");
    let cache = AssetCache::new(host);

    let outcome = cache
        .load_assets(vec![
            AssetRequest::script("/js/ok.js", ScriptOptions::default()),
            AssetRequest::image("/img/gone.png"),
        ])
        .await;

    assert!(matches!(
        outcome,
        Err(AssetError::LoadFailure { kind: AssetKind::Image, .. })
    ));
    // the successful item stays cached, the failed one is evicted
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(cache.is_asset_loaded("/js/ok.js"));
    assert!(!cache.contains("/img/gone.png"));
}

#[tokio::test(start_paused = true)]
async fn test_existing_script_skips_element_creation() {
    let host = InMemoryHost::new().with_existing_script("/js/vendor.js");
    let cache = AssetCache::new(host.clone());

    cache
        .load_script("/js/vendor.js", ScriptOptions::default())
        .await
        .unwrap();
    assert!(host.script_elements().is_empty());
    assert!(cache.is_asset_loaded("/js/vendor.js"));
}

#[cfg(feature = "stats")]
#[tokio::test(start_paused = true)]
async fn test_stats_count_hits_misses_and_failures() {
    let host = slow_host().with_resource("/js/a.js");
    let cache = AssetCache::new(host);

    let a1 = cache.load_script("/js/a.js", ScriptOptions::default());
    let a2 = cache.load_script("/js/a.js", ScriptOptions::default());
    let b = cache.load_script("/js/b.js", ScriptOptions::default());
    let (a1, a2, b) = tokio::join!(a1, a2, b);
    assert!(a1.is_ok() && a2.is_ok() && b.is_err());

    let stats = cache.stats();
    assert_eq!(stats.hits(), 1);
    assert_eq!(stats.misses(), 2);
    assert_eq!(stats.failures(), 1);
}
