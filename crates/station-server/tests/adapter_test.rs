mod common;

use common::FakeDevice;
use serde_json::json;
use station_server::{PollOrchestrator, PollSettings, StationAdapter};
use station_state::MemoryStateStore;
use station_types::StoredState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn adapter(device: Arc<FakeDevice>, interval: Duration, poll_on_start: bool) -> StationAdapter {
    let store = Arc::new(MemoryStateStore::new());
    let orchestrator = Arc::new(PollOrchestrator::new(
        device,
        store,
        PollSettings {
            base_url: "http://192.168.100.1".to_string(),
            password: "secret".to_string(),
            sync_about: false,
        },
    ));
    StationAdapter::new(orchestrator, interval, poll_on_start)
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_polls_on_interval() {
    let device = Arc::new(FakeDevice::new());
    let mut adapter = adapter(device.clone(), Duration::from_secs(60), true);

    adapter.start();
    assert!(adapter.is_running());

    // t = 0, 60, 120
    tokio::time::sleep(Duration::from_secs(150)).await;
    assert_eq!(device.count("login"), 3);

    adapter.stop().await;
    assert!(!adapter.is_running());

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(device.count("login"), 3);
    assert_eq!(device.count("logout"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_first_poll_waits_one_interval() {
    let device = Arc::new(FakeDevice::new());
    let mut adapter = adapter(device.clone(), Duration::from_secs(60), false);

    adapter.start();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(device.count("login"), 0);

    tokio::time::sleep(Duration::from_secs(40)).await;
    assert_eq!(device.count("login"), 1);

    adapter.stop().await;
}

/// 重复 start 只保留一个定时器
#[tokio::test(start_paused = true)]
async fn test_restart_replaces_scheduler() {
    let device = Arc::new(FakeDevice::new());
    let mut adapter = adapter(device.clone(), Duration::from_secs(60), false);

    adapter.start();
    adapter.start();
    tokio::time::sleep(Duration::from_secs(90)).await;
    assert_eq!(device.count("login"), 1);

    adapter.stop().await;
}

/// 停止后不能再次启动
#[tokio::test(start_paused = true)]
async fn test_start_after_stop_is_refused() {
    let device = Arc::new(FakeDevice::new());
    let mut adapter = adapter(device.clone(), Duration::from_secs(60), true);

    adapter.start();
    tokio::time::sleep(Duration::from_secs(10)).await;
    adapter.stop().await;
    assert_eq!(device.count("login"), 1);

    adapter.start();
    assert!(!adapter.is_running());

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(device.count("login"), 1);
}

/// 停止不等待进行中的轮询
#[tokio::test(start_paused = true)]
async fn test_stop_does_not_wait_for_inflight_poll() {
    let device = Arc::new(FakeDevice::new());
    *device.login_delay.lock().unwrap() = Duration::from_secs(30);
    let mut adapter = adapter(device.clone(), Duration::from_secs(60), true);

    adapter.start();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(device.count("login"), 1);

    let started = tokio::time::Instant::now();
    adapter.stop().await;
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(device.count("logout"), 1);
}

/// 设备不可达时卸载仍然调用回调
#[tokio::test]
async fn test_unload_always_invokes_callback() {
    let device = Arc::new(FakeDevice::new());
    device.fail_logout.store(true, Ordering::SeqCst);
    let mut adapter = adapter(device.clone(), Duration::from_secs(60), false);
    adapter.start();

    let called = AtomicBool::new(false);
    adapter.unload(|| called.store(true, Ordering::SeqCst)).await;

    assert!(called.load(Ordering::SeqCst));
    assert!(adapter.orchestrator().is_terminated());
    assert_eq!(device.calls(), vec!["logout"]);
}

#[tokio::test]
async fn test_unload_without_start() {
    let device = Arc::new(FakeDevice::new());
    let mut adapter = adapter(device.clone(), Duration::from_secs(60), true);

    let called = AtomicBool::new(false);
    adapter.unload(|| called.store(true, Ordering::SeqCst)).await;
    assert!(called.load(Ordering::SeqCst));
}

/// 外部状态变化只记录日志
#[tokio::test]
async fn test_external_state_change_has_no_effect() {
    let device = Arc::new(FakeDevice::new());
    let adapter = adapter(device.clone(), Duration::from_secs(60), true);

    adapter.on_external_state_change("status.uptime", Some(&StoredState::new(json!(5), false)));
    adapter.on_external_state_change("status.uptime", None);

    assert!(device.calls().is_empty());
    assert!(!adapter.orchestrator().is_terminated());
}
