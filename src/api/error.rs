// ABOUTME: HTTP error responses for the gateway.
// ABOUTME: Maps deployment error kinds to status codes and a structured JSON body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::deploy::{DeployError, DeployErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Deploy(#[from] DeployError),

    /// The body exceeded `server.max_body_bytes`.
    #[error("request body exceeds the configured size limit")]
    PayloadTooLarge,

    /// The deployment task ended without producing a result.
    #[error("deployment task failed: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Deploy(e) => e.kind().as_str(),
            Self::PayloadTooLarge => "payload_too_large",
            Self::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Deploy(e) => match e.kind() {
                DeployErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
                DeployErrorKind::Connection => StatusCode::SERVICE_UNAVAILABLE,
                DeployErrorKind::Pull => StatusCode::BAD_GATEWAY,
                DeployErrorKind::Credentials
                | DeployErrorKind::Staging
                | DeployErrorKind::Creation
                | DeployErrorKind::Start
                | DeployErrorKind::Wait
                | DeployErrorKind::WorkerExit
                | DeployErrorKind::LogStream
                | DeployErrorKind::Cleanup => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub kind: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            status: status.as_u16(),
            kind: self.error_type(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
