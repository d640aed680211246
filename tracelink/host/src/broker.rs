use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use tracelink_core::config;
use tracelink_proto::prelude::BrokerOptions;

use crate::lifecycle::{HostError, LifecycleParticipant, LifecycleProcessor};

/// The external hosting collaborator.
///
/// Request routing, transports, and scheduling all live behind this seam,
/// in the framework that implements it; the broker host only delegates.
#[async_trait]
pub trait Host: Send + Sync {
    async fn start(&self) -> anyhow::Result<()>;

    async fn stop(&self) -> anyhow::Result<()>;
}

/// Default inner host for processes that run without an external hosting
/// framework. Start and stop only log.
#[derive(Debug, Default)]
pub struct StandaloneHost;

#[async_trait]
impl Host for StandaloneHost {
    async fn start(&self) -> anyhow::Result<()> {
        log::info!("standalone host started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        log::info!("standalone host stopped");
        Ok(())
    }
}

/// Host wrapper for message-broker applications.
///
/// Start runs the lifecycle refresh before delegating to the inner host,
/// stop runs the lifecycle stop before delegating; the wrapper adds nothing
/// else.
pub struct BrokerHost {
    inner: Arc<dyn Host>,
    lifecycle: LifecycleProcessor,
    options: BrokerOptions,
}

impl BrokerHost {
    pub fn builder() -> BrokerHostBuilder {
        BrokerHostBuilder::default()
    }

    pub async fn start(&self) -> Result<(), HostError> {
        self.lifecycle.on_refresh().await?;
        log::info!(
            "broker host starting against {} as {}",
            self.options.address(),
            self.options.username
        );
        self.inner.start().await.map_err(|source| HostError::Inner {
            phase: "start",
            source,
        })
    }

    pub async fn stop(&self) -> Result<(), HostError> {
        self.lifecycle.stop().await?;
        log::info!("broker host stopping");
        self.inner.stop().await.map_err(|source| HostError::Inner {
            phase: "stop",
            source,
        })
    }

    pub fn lifecycle(&self) -> &LifecycleProcessor {
        &self.lifecycle
    }

    pub fn options(&self) -> &BrokerOptions {
        &self.options
    }
}

/// Builder for [`BrokerHost`].
///
/// Collects lifecycle participants, configuration seeds, and an optional
/// inner host; `build` seeds the configuration store, binds
/// [`BrokerOptions`], and fails fast on malformed values.
#[derive(Default)]
pub struct BrokerHostBuilder {
    participants: Vec<Arc<dyn LifecycleParticipant>>,
    settings: Vec<(String, Value)>,
    inner: Option<Arc<dyn Host>>,
}

impl BrokerHostBuilder {
    pub fn add_participant(mut self, participant: Arc<dyn LifecycleParticipant>) -> Self {
        self.participants.push(participant);
        self
    }

    /// Seeds a configuration key before options are bound.
    pub fn with_setting<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        self.settings.push((key.to_string(), value.into()));
        self
    }

    /// Supplies the external hosting collaborator to delegate to.
    pub fn with_host(mut self, host: Arc<dyn Host>) -> Self {
        self.inner = Some(host);
        self
    }

    pub fn build(self) -> Result<BrokerHost, HostError> {
        for (key, value) in self.settings {
            config::set(&key, value);
        }

        let options = config::broker_options()?;

        let mut lifecycle = LifecycleProcessor::new();
        for participant in self.participants {
            lifecycle.register(participant);
        }

        Ok(BrokerHost {
            inner: self
                .inner
                .unwrap_or_else(|| Arc::new(StandaloneHost)),
            lifecycle,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_standalone_host_roundtrip() {
        let host = StandaloneHost;
        host.start().await.unwrap();
        host.stop().await.unwrap();
    }
}
