// ABOUTME: Container operations trait for container runtimes.
// ABOUTME: Create, start, wait on, and remove containers.

use super::shared_types::{ContainerConfig, ExitStatus};
use crate::types::ContainerId;
use async_trait::async_trait;
use tokio::sync::oneshot;

/// Container lifecycle operations.
#[async_trait]
pub trait ContainerOps: Send + Sync {
    /// Create a container from the given configuration.
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError>;

    /// Start a created container.
    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError>;

    /// Subscribe to the container leaving the running state.
    ///
    /// Returns immediately with two independent channels. Exactly one of them
    /// is expected to resolve with a value; the other is dropped.
    async fn wait_container(&self, id: &ContainerId) -> Result<WaitSignals, ContainerError>;

    /// Remove a container.
    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError>;
}

/// Receiving side of a container wait.
#[derive(Debug)]
pub struct WaitSignals {
    /// Resolves when the container is no longer running.
    pub not_running: oneshot::Receiver<ExitStatus>,
    /// Resolves when the runtime reports a failure while waiting.
    pub error: oneshot::Receiver<ContainerError>,
}

/// Sending side of a container wait, held by the runtime implementation.
#[derive(Debug)]
pub struct WaitSenders {
    pub not_running: oneshot::Sender<ExitStatus>,
    pub error: oneshot::Sender<ContainerError>,
}

impl WaitSignals {
    /// Create a connected sender/receiver pair.
    pub fn channel() -> (WaitSenders, WaitSignals) {
        let (done_tx, done_rx) = oneshot::channel();
        let (error_tx, error_rx) = oneshot::channel();
        (
            WaitSenders {
                not_running: done_tx,
                error: error_tx,
            },
            WaitSignals {
                not_running: done_rx,
                error: error_rx,
            },
        )
    }
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("container already exists: {0}")]
    AlreadyExists(String),

    #[error("container already running: {0}")]
    AlreadyRunning(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
