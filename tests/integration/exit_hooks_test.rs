use std::sync::Arc;

use vitalwatch::platform::{HostCapabilities, ManualHost, PageLifecycle};
use vitalwatch::{register_exit_hooks, CollectorConfig, CollectorState, PerformanceMonitor};

use super::support::settle;

fn running(host: &Arc<ManualHost>) -> Arc<PerformanceMonitor> {
    let monitor = Arc::new(PerformanceMonitor::new(host.clone(), CollectorConfig::default()));
    monitor.init();
    monitor
}

#[tokio::test]
async fn test_page_hide_destroys_monitor() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);
    let _hooks = register_exit_hooks(&monitor);
    monitor.track("checkout", 1.0);

    host.emit_lifecycle(PageLifecycle::Hidden);
    host.emit_lifecycle(PageLifecycle::Visible);
    settle().await;
    assert_eq!(monitor.state(), CollectorState::Running);

    host.emit_lifecycle(PageLifecycle::PageHide);
    settle().await;
    assert_eq!(monitor.state(), CollectorState::Destroyed);
    assert!(monitor.get_metrics().is_empty());
}

#[tokio::test]
async fn test_hooks_survive_dropped_handle() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);
    register_exit_hooks(&monitor);
    settle().await;

    assert!(host.emit_lifecycle(PageLifecycle::Unload));
    settle().await;
    assert_eq!(monitor.state(), CollectorState::Destroyed);
}

#[tokio::test]
async fn test_hook_is_inactive_after_firing() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);
    let hooks = register_exit_hooks(&monitor);

    host.emit_lifecycle(PageLifecycle::PageHide);
    monitor.destroyed().await;
    settle().await;
    assert!(!hooks.is_active());
}

#[tokio::test]
async fn test_unload_after_manual_destroy_is_harmless() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);
    let _hooks = register_exit_hooks(&monitor);

    monitor.destroy();
    host.emit_lifecycle(PageLifecycle::Unload);
    settle().await;

    assert_eq!(monitor.state(), CollectorState::Destroyed);
}

#[tokio::test]
async fn test_hook_does_not_keep_monitor_alive() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);
    let _hooks = register_exit_hooks(&monitor);

    drop(monitor);
    host.emit_lifecycle(PageLifecycle::Unload);
    settle().await;
}

#[tokio::test]
async fn test_stopped_hook_no_longer_fires() {
    let host = Arc::new(ManualHost::with_all());
    let monitor = running(&host);
    let mut hooks = register_exit_hooks(&monitor);
    assert!(hooks.is_active());

    hooks.stop();
    settle().await;
    host.emit_lifecycle(PageLifecycle::PageHide);
    settle().await;

    assert_eq!(monitor.state(), CollectorState::Running);
    monitor.destroy();
}

#[tokio::test]
async fn test_host_without_lifecycle_events() {
    let host = Arc::new(ManualHost::new(HostCapabilities {
        lifecycle: false,
        ..HostCapabilities::all()
    }));
    let monitor = running(&host);

    let hooks = register_exit_hooks(&monitor);
    assert!(!hooks.is_active());
    monitor.destroy();
}
