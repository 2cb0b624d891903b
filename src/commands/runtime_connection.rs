// ABOUTME: Shared helper for connecting to the local container runtime.
// ABOUTME: Used by both the service and one-shot deploys.

use stagehand::error::Result;
use stagehand::output::Output;
use stagehand::runtime::{BollardRuntime, RuntimeConfig, RuntimeError, RuntimeInfo, detect_local};

/// Detect the runtime socket, connect, and check the daemon answers.
pub async fn connect_to_runtime(config: &RuntimeConfig, output: &Output) -> Result<BollardRuntime> {
    output.progress("→ Detecting runtime...");
    let endpoint = detect_local(config).map_err(RuntimeError::from)?;

    output.progress(&format!(
        "→ Found {} at {}",
        endpoint.runtime_type, endpoint.socket_path
    ));

    let runtime = BollardRuntime::connect(&endpoint, config.timeout)
        .await
        .map_err(RuntimeError::from)?;

    let info = runtime.info().await.map_err(RuntimeError::from)?;
    tracing::info!(
        runtime = %info.name,
        version = %info.version,
        api = %info.api_version,
        "connected to container runtime"
    );

    Ok(runtime)
}
