// ABOUTME: Log operations trait for container runtimes.
// ABOUTME: Streams raw container output bytes tagged by origin.

use crate::types::ContainerId;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// A boxed stream of output chunks.
pub type LogStream = Pin<Box<dyn Stream<Item = Result<LogChunk, LogError>> + Send>>;

/// Log streaming operations.
#[async_trait]
pub trait LogOps: Send + Sync {
    /// Open an output stream for a container.
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<LogStream, LogError>;
}

/// Options for log streaming.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Include stdout.
    pub stdout: bool,
    /// Include stderr.
    pub stderr: bool,
    /// Keep the stream open until the container closes it.
    pub follow: bool,
    /// Prefix lines with runtime timestamps.
    pub timestamps: bool,
    /// Number of lines to show from the end (None = all).
    pub tail: Option<u64>,
}

impl LogOptions {
    /// Combined stdout and stderr, followed to the end, untouched.
    pub fn combined_follow() -> Self {
        Self {
            stdout: true,
            stderr: true,
            follow: true,
            timestamps: false,
            tail: None,
        }
    }
}

/// A chunk of raw output from a container.
#[derive(Debug, Clone)]
pub struct LogChunk {
    pub kind: LogStreamKind,
    pub bytes: Bytes,
}

/// Which stream a chunk came from. TTY containers only produce `Console`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStreamKind {
    Stdout,
    Stderr,
    Console,
}

/// Errors from log operations.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
