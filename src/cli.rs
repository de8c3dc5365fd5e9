// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands, their arguments, and global output flags.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "labforge")]
#[command(about = "Build reusable machine images in a cloud lab")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the configuration file (default: discovered in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new labforge.yml configuration file
    Init {
        /// Lab name to write into the template
        #[arg(short, long)]
        lab: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Parse and validate the configuration
    Validate,

    /// Show the steps a build would run
    Plan,

    /// Run the full build against an in-memory lab
    Rehearse {
        /// Status polls each simulated operation reports as in progress
        #[arg(long, default_value_t = 0)]
        pending_polls: u32,
    },
}
