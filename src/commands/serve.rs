// ABOUTME: Serve command implementation.
// ABOUTME: Connects to the runtime once, then answers deploy requests over HTTP.

use std::sync::Arc;

use super::runtime_connection::connect_to_runtime;
use stagehand::api::{self, AppState};
use stagehand::config::{APP_ENV_VAR, Config, EnvCredentials, load_env_file};
use stagehand::deploy::Pipeline;
use stagehand::error::Result;
use stagehand::output::Output;

/// Run the HTTP service until interrupted.
///
/// Failing to reach the runtime here ends the process; after startup every
/// failure is scoped to a single request.
pub async fn serve(config: Config, output: Output) -> Result<()> {
    config.validate()?;

    let app_env = std::env::var(APP_ENV_VAR).ok();
    load_env_file(app_env.as_deref(), &config.credentials.env_file)?;

    let runtime = connect_to_runtime(&config.runtime, &output).await?;
    let pipeline = Arc::new(Pipeline::new(
        &config,
        Arc::new(runtime),
        Arc::new(EnvCredentials),
    ));

    let state = Arc::new(AppState {
        pipeline,
        default_function_name: config.staging.default_function_name.clone(),
    });
    let route = config.server.deploy_route();
    let app = api::router(state, &config.server);

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    output.progress(&format!("Running on {}", config.server.port));
    tracing::info!(%addr, %route, staging = %config.staging.root.display(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
