// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports the request model, state markers, the staging slot and the pipeline.

mod command;
mod deployment;
mod error;
mod lock;
mod pipeline;
mod report;
mod request;
mod state;
mod transitions;

pub use command::WorkerCommand;
pub use deployment::{DEPLOYMENT_LABEL, Deployment, MANAGED_LABEL, WorkerSpec};
pub use error::{DeployError, DeployErrorKind};
pub use lock::{SlotGuard, SlotHolder, StagingSlot};
pub use pipeline::Pipeline;
pub use report::DeploymentReport;
pub use request::{DeploymentRequest, FunctionDefinition, RequestError};
pub use state::{Created, DeploymentOutcome, Finished, HasContainer, Idle, ImagePulled, Running};
pub use transitions::TransitionResult;
