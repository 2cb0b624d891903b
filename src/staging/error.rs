// ABOUTME: Error types for staging and cleanup.
// ABOUTME: Every variant carries the path that failed.

use std::path::PathBuf;

use crate::types::FunctionName;

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("function name {0} is reserved by the worker")]
    ReservedName(FunctionName),

    #[error("failed to create staging directory {path}: {source}")]
    CreateRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list staging directory {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
