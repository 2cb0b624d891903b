// ABOUTME: Runs one deployment end to end: stage, run the worker, relay output, clean.
// ABOUTME: Holds the staging slot for the whole attempt and cleans up on every exit path.

use std::sync::Arc;

use tokio::io::AsyncWrite;
use tracing::Instrument;

use crate::config::{Config, CredentialSource, ExitPolicy, RegistryAuthConfig};
use crate::diagnostics::{Diagnostics, Warning};
use crate::runtime::{ContainerOps, FullRuntime};
use crate::staging::{Cleaner, Stager};
use crate::types::DeploymentId;

use super::deployment::{Deployment, WorkerSpec};
use super::error::DeployError;
use super::lock::StagingSlot;
use super::report::DeploymentReport;
use super::request::DeploymentRequest;
use super::state::{DeploymentOutcome, HasContainer};

/// The deployment service: one runtime, one staging root, one slot.
pub struct Pipeline<R> {
    runtime: Arc<R>,
    credentials: Arc<dyn CredentialSource>,
    stager: Stager,
    cleaner: Cleaner,
    slot: StagingSlot,
    worker: WorkerSpec,
    exit_policy: ExitPolicy,
    remove_container: bool,
    registry_auth: Option<RegistryAuthConfig>,
}

impl<R> std::fmt::Debug for Pipeline<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("staging_root", &self.stager.root())
            .field("exit_policy", &self.exit_policy)
            .finish_non_exhaustive()
    }
}

impl<R: FullRuntime> Pipeline<R> {
    pub fn new(config: &Config, runtime: Arc<R>, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            runtime,
            credentials,
            stager: Stager::new(&config.staging.root, config.staging.template_file.clone())
                .with_worker_output(config.target.packaged_template.clone()),
            cleaner: Cleaner::new(&config.staging.root),
            slot: StagingSlot::new(),
            worker: WorkerSpec::from_config(config),
            exit_policy: config.worker.exit_policy,
            remove_container: config.worker.remove_container,
            registry_auth: config.worker.registry_auth.clone(),
        }
    }

    pub fn slot(&self) -> &StagingSlot {
        &self.slot
    }

    pub fn cleaner(&self) -> &Cleaner {
        &self.cleaner
    }

    /// Run one deployment, relaying worker output to `sink`.
    ///
    /// Waits for the staging slot first. The staging root is emptied before
    /// the slot is released, whatever happened.
    pub async fn run<W>(
        &self,
        request: &DeploymentRequest,
        sink: &mut W,
    ) -> Result<DeploymentReport, DeployError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let id = DeploymentId::generate();
        let span = tracing::info_span!("deployment", id = %id.short());

        async {
            let _slot = self.slot.acquire(&id).await;
            tracing::info!(functions = request.functions().len(), "deployment started");

            let mut diagnostics = Diagnostics::default();
            let result = self.run_locked(&id, request, sink, &mut diagnostics).await;
            let cleaned = self.cleaner.clean().await;

            match (result, cleaned) {
                (Ok(mut report), Ok(removed)) => {
                    tracing::info!(removed, exit_code = report.exit_code, "deployment finished");
                    report.warnings = diagnostics.into_warnings();
                    Ok(report)
                }
                (Ok(_), Err(e)) => {
                    let e = DeployError::Cleanup(e.to_string());
                    tracing::error!(kind = %e.kind(), error = %e, "deployment failed");
                    Err(e)
                }
                (Err(e), Ok(_)) => {
                    tracing::error!(kind = %e.kind(), error = %e, "deployment failed");
                    Err(e)
                }
                (Err(e), Err(cleanup)) => {
                    diagnostics.warn(Warning::cleanup(cleanup.to_string()));
                    tracing::error!(kind = %e.kind(), error = %e, "deployment failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_locked<W>(
        &self,
        id: &DeploymentId,
        request: &DeploymentRequest,
        sink: &mut W,
        diagnostics: &mut Diagnostics,
    ) -> Result<DeploymentReport, DeployError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let credentials = self
            .credentials
            .resolve()
            .map_err(|e| DeployError::Credentials(e.to_string()))?;
        let auth = self
            .registry_auth
            .as_ref()
            .map(RegistryAuthConfig::resolve)
            .transpose()
            .map_err(|e| DeployError::Credentials(e.to_string()))?;

        let staged = self.stager.stage(request).await?;
        tracing::info!(files = staged.file_count(), "artifacts staged");

        let runtime = self.runtime.as_ref();
        runtime
            .ping()
            .await
            .map_err(|e| DeployError::Connection(e.to_string()))?;

        let deployment = Deployment::new(id.clone(), self.worker.container_config(id, &credentials));
        let deployment = deployment.pull_image(runtime, auth.as_ref()).await?;
        let deployment = deployment.create_container(runtime).await?;

        let deployment = match deployment.start(runtime).await {
            Ok(running) => running,
            Err((created, e)) => {
                discard(created, runtime, diagnostics).await;
                return Err(e);
            }
        };

        let finished = match deployment.await_completion(runtime).await {
            Ok(finished) => finished,
            Err((running, e)) => {
                discard(running, runtime, diagnostics).await;
                return Err(e);
            }
        };

        let status = match finished.outcome() {
            DeploymentOutcome::Completed(status) => status.clone(),
            DeploymentOutcome::Failed(reason) => {
                let e = DeployError::Wait(reason.clone());
                discard(finished, runtime, diagnostics).await;
                return Err(e);
            }
        };

        let output_bytes = match finished.stream_logs(runtime, sink).await {
            Ok(n) => n,
            Err(e) => {
                diagnostics.warn(Warning::log_stream(e.to_string()));
                0
            }
        };

        let container_id = finished.container_id().clone();
        if self.remove_container {
            discard(finished, runtime, diagnostics).await;
        }

        if self.exit_policy == ExitPolicy::Enforce && !status.success() {
            return Err(DeployError::WorkerExit { code: status.code });
        }
        if !status.success() {
            tracing::warn!(code = status.code, "worker exited non-zero, ignored by policy");
        }

        Ok(DeploymentReport {
            deployment_id: id.clone(),
            container_id,
            exit_code: status.code,
            output_bytes,
            warnings: Vec::new(),
        })
    }
}

/// Remove a deployment's container, recording a failure as a warning.
async fn discard<S, R>(deployment: Deployment<S>, runtime: &R, diagnostics: &mut Diagnostics)
where
    S: HasContainer,
    R: ContainerOps + ?Sized,
{
    let id = deployment.container_id().short().to_string();
    if let Err(e) = deployment.discard(runtime).await {
        diagnostics.warn(Warning::container_removal(format!(
            "failed to remove container {id}: {e}"
        )));
    }
}
