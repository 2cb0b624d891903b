// ABOUTME: Staging directory management for deployment artifacts.
// ABOUTME: Writes the template and functions, and empties the directory afterwards.

mod cleaner;
mod error;
mod stager;

pub use cleaner::Cleaner;
pub use error::StagingError;
pub use stager::{StagedArtifacts, Stager};
