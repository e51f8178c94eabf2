use std::sync::Arc;
use std::time::Duration;

use vitalwatch::core::perf_monitor::{keys, ReportError, Reporter, SampleValue};
use vitalwatch::platform::{
    EffectiveConnectionType, ManualHost, PageContext, PaintEvent, PaintKind, Viewport,
};
use vitalwatch::{CollectorConfig, PerformanceMonitor};
use wiremock::ResponseTemplate;

use super::support::{
    analytics_server, closed_endpoint, received_bodies, settle, wait_for_bodies,
};

fn page_host() -> ManualHost {
    ManualHost::with_all().with_context(PageContext {
        url: "https://shop.example/checkout".to_string(),
        user_agent: "Mozilla/5.0 (test)".to_string(),
        viewport: Some(Viewport {
            width: 1280,
            height: 720,
        }),
        connection: Some(EffectiveConnectionType::FourG),
    })
}

fn reporter_for(endpoint: url::Url, timeout: Duration) -> Reporter {
    Reporter::new(endpoint, timeout, Arc::new(page_host())).unwrap()
}

#[tokio::test]
async fn test_delivery_posts_payload() {
    let (server, endpoint) = analytics_server(ResponseTemplate::new(204)).await;
    let reporter = reporter_for(endpoint, Duration::from_secs(5));

    let payload = reporter.payload(keys::LARGEST_CONTENTFUL_PAINT, SampleValue::Scalar(1800.0));
    reporter.deliver(&payload).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].headers.get("content-type").unwrap(),
        "application/json"
    );

    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["metric"], "lcp");
    assert_eq!(body["value"], 1800.0);
    assert_eq!(body["url"], "https://shop.example/checkout");
    assert_eq!(body["userAgent"], "Mozilla/5.0 (test)");
    assert_eq!(body["viewport"]["height"], 720);
    assert_eq!(body["connection"], "4g");
}

#[tokio::test]
async fn test_server_error_is_reported_not_raised() {
    let (_server, endpoint) = analytics_server(ResponseTemplate::new(500)).await;
    let reporter = reporter_for(endpoint, Duration::from_secs(5));

    let payload = reporter.payload(keys::FIRST_INPUT_DELAY, SampleValue::Scalar(12.0));
    let result = reporter.deliver(&payload).await;

    assert!(matches!(result, Err(ReportError::Status(status)) if status.as_u16() == 500));
}

#[tokio::test]
async fn test_unresponsive_endpoint_times_out() {
    // The server answers long after the reporter has given up
    let slow = ResponseTemplate::new(200).set_delay(Duration::from_secs(2));
    let (_server, endpoint) = analytics_server(slow).await;
    let reporter = reporter_for(endpoint, Duration::from_millis(200));

    let payload = reporter.payload(keys::CUMULATIVE_LAYOUT_SHIFT, SampleValue::Scalar(0.02));
    let result = reporter.deliver(&payload).await;

    assert!(matches!(result, Err(ReportError::Timeout(_))));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let reporter = reporter_for(closed_endpoint(), Duration::from_secs(2));

    let payload = reporter.payload(keys::FIRST_CONTENTFUL_PAINT, SampleValue::Scalar(400.0));
    let result = reporter.deliver(&payload).await;

    assert!(matches!(result, Err(ReportError::Network(_)) | Err(ReportError::Timeout(_))));
}

#[tokio::test]
async fn test_fire_and_forget_never_blocks_caller() {
    let slow = ResponseTemplate::new(200).set_delay(Duration::from_secs(2));
    let (server, endpoint) = analytics_server(slow).await;
    let reporter = reporter_for(endpoint, Duration::from_millis(200));

    let started = std::time::Instant::now();
    reporter.report(keys::LARGEST_CONTENTFUL_PAINT, SampleValue::Scalar(2100.0));
    assert!(started.elapsed() < Duration::from_millis(200));

    let bodies = wait_for_bodies(&server, 1, Duration::from_secs(5)).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["metric"], "lcp");
}

#[tokio::test]
async fn test_only_vitals_are_forwarded() {
    let (server, endpoint) = analytics_server(ResponseTemplate::new(204)).await;
    let host = Arc::new(page_host());
    let config = CollectorConfig {
        endpoint: Some(endpoint.to_string()),
        ..Default::default()
    };
    let monitor = PerformanceMonitor::new(host.clone(), config);
    assert!(monitor.is_reporting());
    monitor.init();

    host.emit_paint(PaintEvent::Paint {
        kind: PaintKind::FirstPaint,
        start_time: 300.0,
    });
    settle().await;
    host.emit_paint(PaintEvent::LargestContentfulPaint { start_time: 1900.0 });

    let bodies = wait_for_bodies(&server, 1, Duration::from_secs(5)).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["metric"], "lcp");

    // First paint is stored locally but never sent
    assert_eq!(monitor.get_metrics().latest_scalar(keys::FIRST_PAINT), Some(300.0));
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(received_bodies(&server).await.len(), 1);

    monitor.destroy();
}

#[tokio::test]
async fn test_tracked_metric_is_forwarded_with_namespace() {
    let (server, endpoint) = analytics_server(ResponseTemplate::new(204)).await;
    let config = CollectorConfig {
        endpoint: Some(endpoint.to_string()),
        namespace: Some("storefront".to_string()),
        ..Default::default()
    };
    let monitor = PerformanceMonitor::new(Arc::new(page_host()), config);
    monitor.init();

    assert!(monitor.track("add-to-cart", 1.0));

    let bodies = wait_for_bodies(&server, 1, Duration::from_secs(5)).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["metric"], "storefront/add-to-cart");
    assert_eq!(bodies[0]["value"], 1.0);

    monitor.destroy();
}
