// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: States after creation carry the container ID, so it exists exactly when it should.

use crate::runtime::ExitStatus;
use crate::types::ContainerId;

/// Initial state: container spec built, nothing on the runtime yet.
/// Available actions: `pull_image()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

/// Image pulled: worker image available locally.
/// Available actions: `create_container()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePulled;

/// Container created but not started.
/// Available actions: `start()`, `discard()`
#[derive(Debug, Clone)]
pub struct Created {
    pub(crate) container_id: ContainerId,
}

/// Worker running.
/// Available actions: `await_completion()`, `discard()`
#[derive(Debug, Clone)]
pub struct Running {
    pub(crate) container_id: ContainerId,
}

/// Worker no longer running.
/// Available actions: `stream_logs()`, `discard()`
#[derive(Debug, Clone)]
pub struct Finished {
    pub(crate) container_id: ContainerId,
    pub(crate) outcome: DeploymentOutcome,
}

/// How the wait on a running worker ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentOutcome {
    /// The container stopped. The exit code is carried, not judged.
    Completed(ExitStatus),
    /// The runtime signalled an error before the container stopped.
    Failed(String),
}

/// States that own a container on the runtime.
pub trait HasContainer {
    fn container_id(&self) -> &ContainerId;
}

impl HasContainer for Created {
    fn container_id(&self) -> &ContainerId {
        &self.container_id
    }
}

impl HasContainer for Running {
    fn container_id(&self) -> &ContainerId {
        &self.container_id
    }
}

impl HasContainer for Finished {
    fn container_id(&self) -> &ContainerId {
        &self.container_id
    }
}
