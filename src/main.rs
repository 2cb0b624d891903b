// ABOUTME: Entry point for the stagehand CLI application.
// ABOUTME: Parses arguments, sets up logging and config, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use stagehand::config::{self, Config};
use stagehand::error::Result;
use stagehand::output::Output;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "stagehand=info,tower_http=info";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(cli.output_mode());
    let error_output = Output::new(cli.output_mode());

    if let Err(e) = run(cli, output).await {
        error_output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: Output) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let load_config = || -> Result<Config> {
        let mut config = Config::resolve(cli.config.as_deref(), &cwd)?;
        config.apply_env_overrides()?;
        Ok(config)
    };

    match &cli.command {
        Commands::Init {
            bucket,
            stack_name,
            force,
        } => {
            config::init_config(&cwd, bucket.as_deref(), stack_name.as_deref(), *force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Serve { port } => {
            let mut config = load_config()?;
            if let Some(port) = port {
                config.server.port = *port;
            }
            commands::serve(config, output).await
        }
        Commands::Deploy { payload } => commands::deploy(load_config()?, payload, output).await,
        Commands::Clean => commands::clean(load_config()?, output).await,
    }
}
