// ABOUTME: Summary of a successful deployment.
// ABOUTME: Serialized as the body of the HTTP success response and CLI JSON output.

use serde::Serialize;

use crate::diagnostics::Warning;
use crate::types::{ContainerId, DeploymentId};

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    pub deployment_id: DeploymentId,
    pub container_id: ContainerId,
    pub exit_code: i64,
    /// Bytes of worker output relayed to the operator.
    pub output_bytes: u64,
    pub warnings: Vec<Warning>,
}
