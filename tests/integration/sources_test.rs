use std::sync::Arc;
use std::time::Duration;

use vitalwatch::core::perf_monitor::keys;
use vitalwatch::platform::{
    BatteryStatus, ConnectionInfo, DeviceHints, EffectiveConnectionType, HeapUsage,
    IntersectionEntry, ManualHost, PaintEvent, ResourceKind, ResourceTiming,
};
use vitalwatch::{CollectorConfig, PerformanceMonitor, SampleValue};

use super::support::settle;

fn running(host: &Arc<ManualHost>) -> PerformanceMonitor {
    let monitor = PerformanceMonitor::new(host.clone(), CollectorConfig::default());
    monitor.init();
    monitor
}

#[tokio::test]
async fn test_first_input_and_layout_shift() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);

    host.emit_paint(PaintEvent::FirstInput {
        start_time: 2000.0,
        processing_start: 2350.0,
    });
    for (value, had_recent_input) in [(0.08, false), (0.3, true), (0.12, false)] {
        host.emit_paint(PaintEvent::LayoutShift {
            value,
            had_recent_input,
        });
    }
    settle().await;

    let snapshot = monitor.get_metrics();
    assert_eq!(snapshot.latest_scalar(keys::FIRST_INPUT_DELAY), Some(350.0));
    let cls = snapshot.latest_scalar(keys::CUMULATIVE_LAYOUT_SHIFT).unwrap();
    assert!((cls - 0.2).abs() < 1e-9);

    let score = monitor.get_performance_score();
    // fid 350 -> 50, cls 0.2 -> 75
    assert_eq!(score.overall, Some(63));
    assert_eq!(score.recommendations.len(), 1);
}

#[tokio::test]
async fn test_resources_keep_media_only() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);

    for (name, kind) in [
        ("hero.avif", ResourceKind::Img),
        ("bundle.js", ResourceKind::Script),
        ("promo.webm", ResourceKind::Video),
        ("styles.css", ResourceKind::Css),
    ] {
        host.emit_resource(ResourceTiming {
            name: name.to_string(),
            kind,
            duration: 240.0,
            transfer_size: 120_000,
        });
    }
    settle().await;

    let snapshot = monitor.get_metrics();
    assert_eq!(snapshot.get(keys::RESOURCE_LOAD).map(|s| s.len()), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_memory_pressure_is_polled() {
    let host = Arc::new(ManualHost::with_all());
    host.set_heap_usage(HeapUsage {
        used_bytes: 950,
        limit_bytes: 1000,
    });
    let monitor = running(&host);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(monitor.get_metrics().get(keys::MEMORY_PRESSURE).is_none());

    tokio::time::sleep(Duration::from_secs(21)).await;
    let snapshot = monitor.get_metrics();
    assert!(matches!(
        snapshot.latest(keys::MEMORY_PRESSURE).map(|s| s.value()),
        Some(SampleValue::Memory(reading)) if reading.critical
    ));

    let score = monitor.get_performance_score();
    assert!(score.recommendations.iter().any(|r| r.contains("Memory")));

    monitor.destroy();
}

#[tokio::test(start_paused = true)]
async fn test_low_end_device_polls_memory_less_often() {
    let host = Arc::new(ManualHost::with_all().with_hints(DeviceHints {
        logical_cpus: Some(2),
        device_memory_gb: Some(1.0),
        ..Default::default()
    }));
    host.set_heap_usage(HeapUsage {
        used_bytes: 800,
        limit_bytes: 1000,
    });
    let monitor = running(&host);
    assert!(monitor.device_profile().is_low_end_device);

    tokio::time::sleep(Duration::from_secs(45)).await;
    assert!(monitor.get_metrics().get(keys::MEMORY_PRESSURE).is_none());

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(
        monitor.get_metrics().get(keys::MEMORY_PRESSURE).map(|s| s.len()),
        Some(1)
    );

    monitor.destroy();
}

#[tokio::test]
async fn test_connection_and_battery_changes() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);

    host.emit_connection(ConnectionInfo {
        effective_type: Some(EffectiveConnectionType::TwoG),
        downlink_mbps: Some(0.25),
        rtt_ms: Some(1400.0),
        save_data: true,
    });
    host.emit_battery(BatteryStatus {
        level: 0.15,
        charging: false,
    });
    settle().await;

    let snapshot = monitor.get_metrics();
    assert!(matches!(
        snapshot.latest(keys::CONNECTION).map(|s| s.value()),
        Some(SampleValue::Connection(info)) if info.save_data
    ));
    assert!(matches!(
        snapshot.latest(keys::BATTERY).map(|s| s.value()),
        Some(SampleValue::Battery(status)) if !status.charging
    ));
}

#[tokio::test]
async fn test_element_visibility() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);

    // Not observed yet, so the host drops it
    assert!(!host.emit_intersection(IntersectionEntry {
        target: "#pricing".to_string(),
        is_intersecting: true,
        ratio: 0.5,
    }));

    assert!(monitor.observe_element("#pricing"));
    host.emit_intersection(IntersectionEntry {
        target: "#pricing".to_string(),
        is_intersecting: true,
        ratio: 0.75,
    });
    host.emit_intersection(IntersectionEntry {
        target: "#pricing".to_string(),
        is_intersecting: false,
        ratio: 0.0,
    });
    settle().await;

    let snapshot = monitor.get_metrics();
    assert_eq!(snapshot.get(keys::ELEMENT_VISIBILITY).map(|s| s.len()), Some(1));
    assert!(matches!(
        snapshot.latest(keys::ELEMENT_VISIBILITY).map(|s| s.value()),
        Some(SampleValue::Visibility(record)) if record.target == "#pricing"
    ));
}
