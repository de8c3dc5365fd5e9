// ABOUTME: Entry point for the labforge CLI application.
// ABOUTME: Parses arguments, sets up logging, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use labforge::config::{self, Config};
use labforge::error::Result;
use labforge::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    match cli.command {
        Commands::Init { lab, force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, lab.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Validate => {
            let config = load_config(cli.config.as_deref())?;
            config.validate()?;
            output.success(&format!(
                "Configuration is valid: {} build in lab {}",
                config.os_type, config.lab_name
            ));
            Ok(())
        }
        Commands::Plan => {
            let config = load_config(cli.config.as_deref())?;
            commands::plan(&config, &output)
        }
        Commands::Rehearse { pending_polls } => {
            let config = load_config(cli.config.as_deref())?;
            commands::rehearse(config, pending_polls, output).await
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::discover(&env::current_dir()?),
    }
}
