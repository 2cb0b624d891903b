// ABOUTME: Error types for deployment operations.
// ABOUTME: One variant per failure kind, each mapped to a stable machine-readable name.

use crate::staging::StagingError;

/// Errors that end a deployment attempt.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The payload could not be turned into a deployment request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Credentials could not be resolved.
    #[error("credentials unavailable: {0}")]
    Credentials(String),

    /// Writing the staged files failed.
    #[error("staging failed: {0}")]
    Staging(#[from] StagingError),

    /// The runtime did not answer.
    #[error("runtime connection failed: {0}")]
    Connection(String),

    /// Image pull failed.
    #[error("failed to pull image: {0}")]
    Pull(String),

    /// Container creation failed.
    #[error("failed to create container: {0}")]
    Creation(String),

    /// Container start failed.
    #[error("failed to start container: {0}")]
    Start(String),

    /// The runtime reported an error while the worker was running.
    #[error("failed waiting for container: {0}")]
    Wait(String),

    /// The worker ran to completion but exited non-zero.
    #[error("worker exited with code {code}")]
    WorkerExit { code: i64 },

    /// Output could not be relayed.
    #[error("failed to stream worker output: {0}")]
    LogStream(String),

    /// The staging root could not be emptied.
    #[error("failed to clean staging directory: {0}")]
    Cleanup(String),
}

/// Stable category of a [`DeployError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeployErrorKind {
    InvalidRequest,
    Credentials,
    Staging,
    Connection,
    Pull,
    Creation,
    Start,
    Wait,
    WorkerExit,
    LogStream,
    Cleanup,
}

impl DeployErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployErrorKind::InvalidRequest => "invalid_request",
            DeployErrorKind::Credentials => "credentials",
            DeployErrorKind::Staging => "staging",
            DeployErrorKind::Connection => "connection",
            DeployErrorKind::Pull => "pull",
            DeployErrorKind::Creation => "creation",
            DeployErrorKind::Start => "start",
            DeployErrorKind::Wait => "wait",
            DeployErrorKind::WorkerExit => "worker_exit",
            DeployErrorKind::LogStream => "log_stream",
            DeployErrorKind::Cleanup => "cleanup",
        }
    }
}

impl std::fmt::Display for DeployErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::InvalidRequest(_) => DeployErrorKind::InvalidRequest,
            DeployError::Credentials(_) => DeployErrorKind::Credentials,
            // A reserved name is the caller's mistake, not a filesystem failure.
            DeployError::Staging(StagingError::ReservedName(_)) => DeployErrorKind::InvalidRequest,
            DeployError::Staging(_) => DeployErrorKind::Staging,
            DeployError::Connection(_) => DeployErrorKind::Connection,
            DeployError::Pull(_) => DeployErrorKind::Pull,
            DeployError::Creation(_) => DeployErrorKind::Creation,
            DeployError::Start(_) => DeployErrorKind::Start,
            DeployError::Wait(_) => DeployErrorKind::Wait,
            DeployError::WorkerExit { .. } => DeployErrorKind::WorkerExit,
            DeployError::LogStream(_) => DeployErrorKind::LogStream,
            DeployError::Cleanup(_) => DeployErrorKind::Cleanup,
        }
    }
}
