use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use tracelink_core::config::ConfigError;

/// Errors from the hosting glue.
#[derive(Debug, Error)]
pub enum HostError {
    /// A lifecycle participant failed; carries the participant name and the
    /// phase it failed in so the operator can see which hook broke.
    #[error("lifecycle participant [{name}] failed during {phase}: {source}")]
    Lifecycle {
        name: String,
        phase: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The wrapped external host failed to start or stop.
    #[error("inner host failed during {phase}: {source}")]
    Inner {
        phase: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A component whose lifetime is tied to the host.
///
/// Participants are registered with a [`LifecycleProcessor`] and started
/// when the host refreshes, stopped when it shuts down.
#[async_trait]
pub trait LifecycleParticipant: Send + Sync {
    /// Name used in logs and error reports.
    fn name(&self) -> String;

    async fn start(&self) -> anyhow::Result<()>;

    async fn stop(&self) -> anyhow::Result<()>;

    fn is_running(&self) -> bool;
}

/// Drives registered lifecycle participants as a group.
///
/// `on_refresh` starts participants in registration order; `stop` stops
/// them in reverse order, so dependents shut down before their
/// dependencies.
#[derive(Default)]
pub struct LifecycleProcessor {
    participants: Vec<Arc<dyn LifecycleParticipant>>,
    running: AtomicBool,
}

impl LifecycleProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, participant: Arc<dyn LifecycleParticipant>) {
        log::debug!("registered lifecycle participant [{}]", participant.name());
        self.participants.push(participant);
    }

    /// Starts every participant that is not already running.
    ///
    /// Stops at the first failure; participants started earlier stay
    /// running, and the error names the one that broke.
    pub async fn on_refresh(&self) -> Result<(), HostError> {
        for participant in &self.participants {
            if participant.is_running() {
                continue;
            }
            log::debug!("starting lifecycle participant [{}]", participant.name());
            participant
                .start()
                .await
                .map_err(|source| HostError::Lifecycle {
                    name: participant.name(),
                    phase: "start",
                    source,
                })?;
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Stops running participants in reverse registration order.
    pub async fn stop(&self) -> Result<(), HostError> {
        for participant in self.participants.iter().rev() {
            if !participant.is_running() {
                continue;
            }
            log::debug!("stopping lifecycle participant [{}]", participant.name());
            participant
                .stop()
                .await
                .map_err(|source| HostError::Lifecycle {
                    name: participant.name(),
                    phase: "stop",
                    source,
                })?;
        }
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
