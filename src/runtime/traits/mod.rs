// ABOUTME: Composable capability traits for container runtimes.
// ABOUTME: Defines ImageOps, ContainerOps, LogOps, RuntimeInfo and the FullRuntime bundle.

mod container;
mod image;
mod logs;
mod runtime_info;
mod shared_types;

pub use container::{ContainerError, ContainerOps, WaitSenders, WaitSignals};
pub use image::{ImageError, ImageOps};
pub use logs::{LogChunk, LogError, LogOps, LogOptions, LogStream, LogStreamKind};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
pub use shared_types::*;

/// Everything the deployment pipeline needs from a runtime.
pub trait FullRuntime: RuntimeInfo + ImageOps + ContainerOps + LogOps {}

impl<T> FullRuntime for T where T: RuntimeInfo + ImageOps + ContainerOps + LogOps {}
