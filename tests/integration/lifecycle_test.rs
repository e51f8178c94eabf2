use std::sync::Arc;

use vitalwatch::core::perf_monitor::keys;
use vitalwatch::platform::{
    HostCapabilities, IntersectionEntry, ManualHost, PaintEvent,
};
use vitalwatch::{CollectorConfig, CollectorState, PerformanceMonitor};

use super::support::settle;

fn running(host: &Arc<ManualHost>) -> PerformanceMonitor {
    let monitor = PerformanceMonitor::new(host.clone(), CollectorConfig::default());
    monitor.init();
    monitor
}

#[tokio::test]
async fn test_host_without_capabilities_degrades_gracefully() {
    let host = Arc::new(ManualHost::new(HostCapabilities::none()));
    let monitor = running(&host);

    assert_eq!(monitor.state(), CollectorState::Running);
    assert!(monitor.get_metrics().is_empty());
    assert_eq!(monitor.get_performance_score().overall, None);
    assert!(!monitor.observe_element("#hero"));

    // Custom metrics still work
    assert!(monitor.track("search", 2.0));
    assert_eq!(monitor.get_metrics().latest_scalar("search"), Some(2.0));

    monitor.destroy();
}

#[tokio::test]
async fn test_vital_history_keeps_latest_hundred() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);

    for i in 1..=150 {
        host.emit_paint(PaintEvent::LargestContentfulPaint {
            start_time: f64::from(i),
        });
    }
    settle().await;

    let snapshot = monitor.get_metrics();
    let values: Vec<f64> = snapshot
        .get(keys::LARGEST_CONTENTFUL_PAINT)
        .unwrap()
        .iter()
        .filter_map(|sample| sample.as_scalar())
        .collect();

    assert_eq!(values.len(), 100);
    assert_eq!(values.first(), Some(&51.0));
    assert_eq!(values.last(), Some(&150.0));
}

#[tokio::test]
async fn test_double_init_does_not_duplicate_sources() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);
    monitor.init();

    host.emit_paint(PaintEvent::LargestContentfulPaint { start_time: 1200.0 });
    settle().await;

    assert_eq!(
        monitor
            .get_metrics()
            .get(keys::LARGEST_CONTENTFUL_PAINT)
            .map(|s| s.len()),
        Some(1)
    );
}

#[tokio::test]
async fn test_destroy_stops_every_source() {
    let host = Arc::new(ManualHost::with_all());
    let observer = host.intersection_observer().unwrap();
    let monitor = running(&host);
    monitor.observe_element("#hero");

    host.emit_paint(PaintEvent::LargestContentfulPaint { start_time: 1500.0 });
    settle().await;
    assert!(!monitor.get_metrics().is_empty());

    monitor.destroy();
    monitor.destroy();
    settle().await;

    assert_eq!(monitor.state(), CollectorState::Destroyed);
    assert!(monitor.get_metrics().is_empty());
    assert_eq!(observer.observed_count(), 0);

    // Nobody is listening any more
    assert!(!host.emit_paint(PaintEvent::LargestContentfulPaint { start_time: 1600.0 }));
    assert!(!host.emit_intersection(IntersectionEntry {
        target: "#hero".to_string(),
        is_intersecting: true,
        ratio: 1.0,
    }));
}

#[tokio::test]
async fn test_calls_after_destroy_are_noops() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);
    monitor.destroy();

    assert_eq!(monitor.measure("render", || "done"), "done");
    let output = monitor.measure_async("load", async { 7 }).await;
    assert_eq!(output, 7);
    assert!(!monitor.track("render", 1.0));
    assert!(!monitor.observe_element("#hero"));
    assert!(monitor.get_metrics().is_empty());

    monitor.init();
    assert_eq!(monitor.state(), CollectorState::Destroyed);
}

#[tokio::test]
async fn test_snapshot_is_detached() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);
    monitor.track("login", 1.0);

    let before = monitor.get_metrics();
    monitor.track("login", 2.0);

    assert_eq!(before.get("login").map(|s| s.len()), Some(1));
    assert_eq!(monitor.get_metrics().get("login").map(|s| s.len()), Some(2));
}

#[test]
fn test_init_without_runtime_records_custom_metrics() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);

    assert_eq!(monitor.state(), CollectorState::Running);
    let total = monitor.measure("compute", || (1..=10).sum::<u32>());
    assert_eq!(total, 55);
    assert!(monitor.get_metrics().latest_scalar("compute").is_some());
}
