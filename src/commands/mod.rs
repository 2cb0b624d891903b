// ABOUTME: Command module aggregator for the stagehand CLI.
// ABOUTME: Re-exports serve, deploy, and clean command handlers.

mod clean;
mod deploy;
mod runtime_connection;
mod serve;

pub use clean::clean;
pub use deploy::deploy;
pub use serve::serve;
