// Host-level scenarios: lifecycle delegation and options binding.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracelink_host::{BrokerHost, Host, LifecycleParticipant};

#[derive(Default)]
struct MockHostedService {
    start_count: AtomicUsize,
    stop_count: AtomicUsize,
    running: AtomicBool,
}

#[async_trait]
impl LifecycleParticipant for MockHostedService {
    fn name(&self) -> String {
        "mock_hosted_service".to_string()
    }

    async fn start(&self) -> anyhow::Result<()> {
        self.start_count.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.stop_count.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct CountingInnerHost {
    started: AtomicUsize,
    stopped: AtomicUsize,
}

#[async_trait]
impl Host for CountingInnerHost {
    async fn start(&self) -> anyhow::Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_host_can_be_started_and_stopped() {
    let service = Arc::new(MockHostedService::default());
    let inner = Arc::new(CountingInnerHost::default());

    let host = BrokerHost::builder()
        .add_participant(service.clone())
        .with_host(inner.clone())
        .build()
        .unwrap();

    host.start().await.unwrap();
    assert_eq!(service.start_count.load(Ordering::SeqCst), 1);
    assert_eq!(service.stop_count.load(Ordering::SeqCst), 0);
    assert_eq!(
        inner.started.load(Ordering::SeqCst),
        1,
        "Start must delegate to the inner host after the lifecycle refresh"
    );

    host.stop().await.unwrap();
    assert_eq!(service.start_count.load(Ordering::SeqCst), 1);
    assert_eq!(service.stop_count.load(Ordering::SeqCst), 1);
    assert_eq!(inner.stopped.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_host_initializes_lifecycle() {
    let service = Arc::new(MockHostedService::default());

    let host = BrokerHost::builder()
        .add_participant(service.clone())
        .build()
        .unwrap();
    assert!(!host.lifecycle().is_running());

    host.start().await.unwrap();
    assert!(host.lifecycle().is_running());
    assert!(service.is_running());

    host.stop().await.unwrap();
    assert!(!host.lifecycle().is_running());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_host_binds_broker_options_from_settings() {
    let host = BrokerHost::builder()
        .with_setting("broker.host", "ThisIsATest")
        .with_setting("broker.port", "1234")
        .with_setting("broker.username", "TestUser")
        .with_setting("broker.password", "TestPassword")
        .build()
        .unwrap();

    let options = host.options();
    assert_eq!(options.host, "ThisIsATest");
    assert_eq!(options.port, 1234);
    assert_eq!(options.username, "TestUser");
    assert_eq!(options.password, "TestPassword");
    assert_eq!(
        options.virtual_host, "/",
        "Unset keys keep their defaults"
    );
    assert_eq!(options.address(), "ThisIsATest:1234");
}
