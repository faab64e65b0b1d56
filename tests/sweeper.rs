//! Periodic cache sweeping and shutdown.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use serde_json::json;

use partial::cache::{CacheSweeper, ExpiringCache};
use partial::events::{Event, EventBus, EventKind};
use partial::Shutdown;

mod common;

#[tokio::test]
async fn test_sweeper_ticks_until_shutdown() {
    let events = Arc::new(EventBus::new());
    let ticks = Arc::new(Mutex::new(Vec::new()));
    let t = ticks.clone();
    events.subscribe(EventKind::Service, move |e| {
        if let Event::Service { tick } = e {
            t.lock().push(*tick);
        }
    });

    let cache: ExpiringCache<String> = ExpiringCache::new("pages");
    cache.write("old", "x".into(), SystemTime::now() - Duration::from_secs(5));
    cache.write("fresh", "y".into(), SystemTime::now() + Duration::from_secs(3600));

    let sweeper = CacheSweeper::new(events, Duration::from_millis(20))
        .with_cache(Arc::new(cache.clone()));

    let mut shutdown = Shutdown::new();
    shutdown.track(tokio::spawn(sweeper.clone().run(shutdown.subscribe())));

    tokio::time::sleep(Duration::from_millis(110)).await;
    assert!(shutdown.stop(Duration::from_secs(1)).await);

    let seen = ticks.lock().clone();
    assert!(seen.len() >= 2, "expected several ticks, got {:?}", seen);
    assert!(seen.windows(2).all(|w| w[1] == w[0] + 1));
    assert_eq!(seen.len() as u64, sweeper.ticks());

    assert_eq!(cache.keys(), vec!["fresh".to_string()]);
}

#[tokio::test]
async fn test_framework_sweeper_evicts_stale_data() {
    let fw = common::framework();
    let events = common::record(&fw, &[EventKind::Service]);
    fw.data_cache()
        .write("stale", json!(1), SystemTime::now() - Duration::from_secs(1));

    let mut shutdown = Shutdown::new();
    shutdown.start_sweeper(&fw);
    assert_eq!(shutdown.task_count(), 1);

    // default interval is 60s, so only an explicit sweep runs here
    let report = fw.sweep();
    assert_eq!(report.evicted, 1);
    assert!(shutdown.stop(Duration::from_secs(1)).await);

    assert_eq!(*events.lock(), vec![Event::Service { tick: 1 }]);
    assert!(fw.data_cache().is_empty());
}

#[test]
fn test_reads_see_expired_values_until_swept() {
    let cache: ExpiringCache<i32> = ExpiringCache::new("numbers");
    let now = SystemTime::now();
    cache.write("k", 1, now - Duration::from_millis(1));

    assert_eq!(cache.read("k"), Some(1));
    assert_eq!(cache.sweep_at(now), 1);
    assert_eq!(cache.read("k"), None);
}
