//! Failure tests for the poll workers
//!
//! These tests verify that the system handles failures gracefully:
//! - Repeated confirmed outages notify once
//! - Recovery re-arms notification
//! - Transient probe errors never notify
//! - A faulty client cannot take down other services
//! - Refused connections against a real socket are detected

use std::sync::Arc;
use std::time::Duration;

use liveness_monitor::{Client, MonitorConfig, MonitorService, ProbeOutcome, Service};
use tokio::net::TcpListener;
use tokio::time::sleep;

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn test_repeated_refusals_flip_status_once() {
    let prober = ScriptedProber::new(ProbeOutcome::Refused);

    let first = Notifications::default();
    let second = Notifications::default();
    let muted = Notifications::default();

    let service = Service::new("h", 7000);
    service.register_client(first.client(1000, past_window()));
    service.register_client(second.client(3000, past_window()));
    service.register_client(muted.client(1000, active_window()));

    let monitor = create_monitor_with(
        MonitorConfig::with_services(1000, vec![service.clone()]),
        prober.clone(),
    );
    monitor.start_service_monitor();

    // three refused probes, each confirmed by a refused recheck
    sleep(Duration::from_millis(3100)).await;
    assert!(prober.calls(7000) >= 6);

    assert!(!service.status());
    assert_eq!(first.count(), 1);
    assert_eq!(second.count(), 1);
    assert_eq!(muted.count(), 0);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_recovery_rearms_notification() {
    let prober = ScriptedProber::new(ProbeOutcome::Refused);
    let notifications = Notifications::default();

    let service = Service::new("localhost", 7001);
    service.register_client(notifications.client(1000, past_window()));
    let monitor = create_monitor_with(
        MonitorConfig::with_services(1000, vec![service.clone()]),
        prober.clone(),
    );
    monitor.start_service_monitor();

    sleep(Duration::from_millis(1500)).await;
    assert!(!service.status());
    assert_eq!(notifications.count(), 1);

    prober.set(7001, ProbeOutcome::Reachable);
    sleep(Duration::from_millis(2000)).await;
    assert!(service.status());

    prober.set(7001, ProbeOutcome::Refused);
    sleep(Duration::from_millis(2500)).await;
    assert!(!service.status());
    assert_eq!(notifications.count(), 2);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_never_notify() {
    let prober = ScriptedProber::new(ProbeOutcome::Transient("timed out".to_string()));
    let notifications = Notifications::default();

    let service = Service::new("localhost", 7002);
    service.register_client(notifications.client(1000, past_window()));
    let monitor = create_monitor_with(
        MonitorConfig::with_services(1000, vec![service.clone()]),
        prober.clone(),
    );
    monitor.start_service_monitor();

    sleep(Duration::from_millis(5500)).await;

    assert!(prober.calls(7002) >= 5);
    assert!(service.status());
    assert_eq!(notifications.count(), 0);

    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_panicking_client_does_not_stop_other_workers() {
    let prober = ScriptedProber::new(ProbeOutcome::Reachable);
    prober.set(7003, ProbeOutcome::Refused);

    let faulty = Service::new("localhost", 7003);
    faulty.register_client(
        Client::new(1000, past_window())
            .with_callback(|_| panic!("client callback failed")),
    );

    let healthy = Service::new("localhost", 7004);
    healthy.register_client(Notifications::default().client(1000, past_window()));

    let monitor = create_monitor_with(
        MonitorConfig::with_services(1000, vec![faulty, healthy]),
        prober.clone(),
    );
    monitor.start_service_monitor();

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(monitor.active_workers(), 1);

    let before = prober.calls(7004);
    sleep(Duration::from_millis(3000)).await;
    assert!(prober.calls(7004) > before);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_detects_closed_port_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let notifications = Notifications::default();
    let service = Service::new("127.0.0.1", port);
    service.register_client(notifications.client(1000, past_window()));

    let monitor = MonitorService::new(Arc::new(MonitorConfig::new(1000)));
    monitor
        .add_and_monitor_new_service(service.clone())
        .await
        .unwrap();

    sleep(Duration::from_millis(200)).await;
    assert!(service.status());

    drop(listener);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while notifications.count() == 0 && tokio::time::Instant::now() < deadline {
        sleep(Duration::from_millis(100)).await;
    }

    assert!(!service.status());
    assert_eq!(notifications.count(), 1);

    monitor.shutdown().await;
}
