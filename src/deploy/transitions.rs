// ABOUTME: State transition methods for the worker container lifecycle.
// ABOUTME: Each method consumes self and returns the next state on success.

use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::runtime::{
    ContainerError, ContainerOps, ImageOps, LogOps, LogOptions, RegistryAuth, WaitSignals,
};
use crate::types::ContainerId;

use super::Deployment;
use super::error::DeployError;
use super::state::{
    Created, DeploymentOutcome, Finished, HasContainer, Idle, ImagePulled, Running,
};

/// Result type for transitions that hand the deployment back on failure, so
/// the caller can still remove its container.
pub type TransitionResult<T, S> = Result<Deployment<T>, (Deployment<S>, DeployError)>;

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S> Deployment<S> {
    fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            id: self.id,
            spec: self.spec,
            state,
        }
    }
}

impl<S: HasContainer> Deployment<S> {
    /// Force-remove this deployment's container, giving up the deployment.
    pub async fn discard<R: ContainerOps + ?Sized>(
        self,
        runtime: &R,
    ) -> Result<ContainerId, ContainerError> {
        let id = self.state.container_id().clone();
        runtime.remove_container(&id, true).await?;
        tracing::debug!(container = %id.short(), "removed worker container");
        Ok(id)
    }
}

// =============================================================================
// Idle -> ImagePulled
// =============================================================================

impl Deployment<Idle> {
    /// Pull the worker image, returning once the progress stream is drained.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Pull` if the image cannot be pulled.
    #[must_use = "deployment state must be used"]
    pub async fn pull_image<R: ImageOps + ?Sized>(
        self,
        runtime: &R,
        auth: Option<&RegistryAuth>,
    ) -> Result<Deployment<ImagePulled>, DeployError> {
        tracing::info!(image = %self.spec.image, "pulling worker image");
        runtime
            .pull_image(&self.spec.image, auth)
            .await
            .map_err(|e| DeployError::Pull(e.to_string()))?;
        Ok(self.transition(ImagePulled))
    }
}

// =============================================================================
// ImagePulled -> Created
// =============================================================================

impl Deployment<ImagePulled> {
    /// Create the worker container.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Creation` if the runtime rejects the spec.
    #[must_use = "deployment state must be used"]
    pub async fn create_container<R: ContainerOps + ?Sized>(
        self,
        runtime: &R,
    ) -> Result<Deployment<Created>, DeployError> {
        let container_id = runtime
            .create_container(&self.spec)
            .await
            .map_err(|e| DeployError::Creation(e.to_string()))?;
        tracing::info!(container = %container_id.short(), "created worker container");
        Ok(self.transition(Created { container_id }))
    }
}

// =============================================================================
// Created -> Running
// =============================================================================

impl Deployment<Created> {
    /// Start the worker.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Start` together with the created deployment.
    #[must_use = "deployment state must be used"]
    pub async fn start<R: ContainerOps + ?Sized>(
        self,
        runtime: &R,
    ) -> TransitionResult<Running, Created> {
        match runtime.start_container(&self.state.container_id).await {
            Ok(()) => {
                tracing::info!(container = %self.state.container_id.short(), "started worker");
                let container_id = self.state.container_id.clone();
                Ok(self.transition(Running { container_id }))
            }
            Err(e) => Err((self, DeployError::Start(e.to_string()))),
        }
    }
}

// =============================================================================
// Running -> Finished
// =============================================================================

impl Deployment<Running> {
    /// Wait for the worker to leave the running state.
    ///
    /// Races the runtime's not-running signal against its error signal. An
    /// error resolving first gives `Failed`; the not-running signal resolving
    /// first gives `Completed` with whatever exit code the worker returned.
    /// A channel that closes without a value drops out of the race.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Wait` if the wait cannot be set up, or if both
    /// channels close without a value.
    pub async fn await_completion<R: ContainerOps + ?Sized>(
        self,
        runtime: &R,
    ) -> TransitionResult<Finished, Running> {
        let WaitSignals {
            mut not_running,
            mut error,
        } = match runtime.wait_container(&self.state.container_id).await {
            Ok(signals) => signals,
            Err(e) => return Err((self, DeployError::Wait(e.to_string()))),
        };

        let mut done_open = true;
        let mut error_open = true;
        let outcome = loop {
            tokio::select! {
                biased;

                res = &mut error, if error_open => match res {
                    Ok(err) => break DeploymentOutcome::Failed(err.to_string()),
                    Err(_) => error_open = false,
                },
                res = &mut not_running, if done_open => match res {
                    Ok(status) => break DeploymentOutcome::Completed(status),
                    Err(_) => done_open = false,
                },
                else => {
                    return Err((
                        self,
                        DeployError::Wait("wait ended without an exit status".to_string()),
                    ));
                }
            }
        };

        match &outcome {
            DeploymentOutcome::Completed(status) => {
                tracing::info!(code = status.code, "worker finished");
            }
            DeploymentOutcome::Failed(reason) => {
                tracing::warn!(reason = %reason, "runtime reported an error while waiting");
            }
        }

        let container_id = self.state.container_id.clone();
        Ok(self.transition(Finished {
            container_id,
            outcome,
        }))
    }
}

// =============================================================================
// Finished
// =============================================================================

impl Deployment<Finished> {
    pub fn outcome(&self) -> &DeploymentOutcome {
        &self.state.outcome
    }

    /// Copy the worker's combined output into `sink` until the runtime closes
    /// the stream. Returns the number of bytes relayed.
    ///
    /// The stream is owned here and released on every return path.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::LogStream` if the stream cannot be opened or read,
    /// or the sink rejects a write.
    pub async fn stream_logs<R, W>(&self, runtime: &R, sink: &mut W) -> Result<u64, DeployError>
    where
        R: LogOps + ?Sized,
        W: AsyncWrite + Unpin + Send,
    {
        let mut stream = runtime
            .container_logs(&self.state.container_id, &LogOptions::combined_follow())
            .await
            .map_err(|e| DeployError::LogStream(e.to_string()))?;

        let mut relayed = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DeployError::LogStream(e.to_string()))?;
            sink.write_all(&chunk.bytes)
                .await
                .map_err(|e| DeployError::LogStream(e.to_string()))?;
            relayed += chunk.bytes.len() as u64;
        }
        sink.flush()
            .await
            .map_err(|e| DeployError::LogStream(e.to_string()))?;

        tracing::debug!(bytes = relayed, "worker output relayed");
        Ok(relayed)
    }
}
