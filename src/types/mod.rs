// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Phantom-typed IDs, worker image references, and staged function names.

mod function_name;
mod id;
mod image_ref;

pub use function_name::{FunctionName, FunctionNameError};
pub use id::{ContainerId, DeploymentId};
pub use image_ref::{ImageRef, ParseImageRefError};
