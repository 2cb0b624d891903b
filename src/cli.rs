// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stagehand::output::OutputMode;

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(about = "Stage function code and deploy it through an ephemeral worker container")]
#[command(version)]
pub struct Cli {
    /// Path to the config file (default: discover stagehand.yml in the current directory)
    #[arg(short, long, global = true, env = "STAGEHAND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP deploy service
    Serve {
        /// Listen port (overrides PORT and the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one deployment from a JSON payload file
    Deploy {
        /// Payload in the same shape the HTTP route accepts
        #[arg(short, long)]
        payload: PathBuf,
    },

    /// Empty the staging directory
    Clean,

    /// Create a stagehand.yml in the current directory
    Init {
        /// Bucket the packaged template is uploaded to
        #[arg(long)]
        bucket: Option<String>,

        /// Name of the stack to deploy
        #[arg(long)]
        stack_name: Option<String>,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}
