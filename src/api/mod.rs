// ABOUTME: HTTP gateway for deployments.
// ABOUTME: Decodes the payload, runs the pipeline on its own task, and maps the result to JSON.

mod error;
mod payload;

pub use error::{ApiError, ErrorBody};
pub use payload::{DeployPayload, FunctionPayload};

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::deploy::{DeployError, DeploymentReport, Pipeline};
use crate::runtime::FullRuntime;
use crate::types::FunctionName;

pub const SUCCESS_MESSAGE: &str = "Successfully deployed to AWS lambda";

/// Shared state for the gateway.
pub struct AppState<R> {
    pub pipeline: Arc<Pipeline<R>>,
    pub default_function_name: FunctionName,
}

/// Build the router: the deploy route under `server.route_prefix` plus `/health`.
pub fn router<R: FullRuntime + 'static>(state: Arc<AppState<R>>, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(&server.deploy_route(), post(deploy::<R>))
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Run one deployment. The caller waits for the whole lifecycle.
///
/// The pipeline runs on a spawned task, so a client that disconnects does not
/// abort a deployment half way; it still finishes and cleans up.
async fn deploy<R: FullRuntime + 'static>(
    State(state): State<Arc<AppState<R>>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<DeployResponse>, ApiError> {
    let body = body.map_err(body_error)?;
    let request = DeployPayload::from_slice(&body)?.into_request(&state.default_function_name)?;

    let pipeline = state.pipeline.clone();
    let report = tokio::spawn(async move {
        let mut out = tokio::io::stdout();
        pipeline.run(&request, &mut out).await
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(DeployResponse::from(report)))
}

fn body_error(rejection: BytesRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        DeployError::InvalidRequest(rejection.body_text()).into()
    }
}

#[derive(Debug, Serialize)]
pub struct DeployResponse {
    pub status: u16,
    pub message: &'static str,
    #[serde(flatten)]
    pub report: DeploymentReport,
}

impl From<DeploymentReport> for DeployResponse {
    fn from(report: DeploymentReport) -> Self {
        Self {
            status: 200,
            message: SUCCESS_MESSAGE,
            report,
        }
    }
}
