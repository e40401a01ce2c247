//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run waves of requests until the duration budget is spent
    Run {
        /// Duration budget in seconds
        #[arg(long, value_name = "SECONDS")]
        duration: Option<u64>,

        /// Workload instances per wave
        #[arg(long, value_name = "COUNT")]
        users: Option<usize>,

        /// Maximum requests in flight
        #[arg(long, value_name = "COUNT")]
        max_concurrency: Option<usize>,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },

    /// Inspect or clear the persisted order state
    State {
        #[command(subcommand)]
        state_cmd: StateCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file, or the environment when none is given
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: Option<PathBuf>,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path; prints to stdout when omitted
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum StateCommands {
    /// Summarize the persisted orders
    Show {
        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forget every persisted order
    Reset,
}
