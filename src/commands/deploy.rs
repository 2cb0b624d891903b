// ABOUTME: Deploy command implementation.
// ABOUTME: Runs a single deployment from a payload file through the same pipeline as the service.

use std::path::Path;
use std::sync::Arc;

use super::runtime_connection::connect_to_runtime;
use stagehand::api::DeployPayload;
use stagehand::config::{APP_ENV_VAR, Config, EnvCredentials, load_env_file};
use stagehand::deploy::Pipeline;
use stagehand::error::Result;
use stagehand::output::Output;

/// Deploy the functions described in `payload`, relaying worker output to
/// stdout (stderr in JSON mode).
pub async fn deploy(config: Config, payload: &Path, mut output: Output) -> Result<()> {
    config.validate()?;

    let bytes = std::fs::read(payload)?;
    let request = DeployPayload::from_slice(&bytes)?
        .into_request(&config.staging.default_function_name)?;

    let app_env = std::env::var(APP_ENV_VAR).ok();
    load_env_file(app_env.as_deref(), &config.credentials.env_file)?;

    output.start_timer();
    let runtime = connect_to_runtime(&config.runtime, &output).await?;
    let pipeline = Pipeline::new(&config, Arc::new(runtime), Arc::new(EnvCredentials));

    output.progress(&format!(
        "→ Deploying {} function(s) with {}",
        request.functions().len(),
        config.worker.image
    ));

    let report = if output.worker_output_to_stderr() {
        pipeline.run(&request, &mut tokio::io::stderr()).await?
    } else {
        pipeline.run(&request, &mut tokio::io::stdout()).await?
    };

    output.report(&report);
    Ok(())
}
