use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "site-select")]
#[command(about = "Recommend candidate sites for a project from a scored site registry")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "site-select.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Rank sites for the requirements in a JSON file and record the job
    Recommend {
        #[arg(long)]
        owner: String,

        /// Display name; defaults to the owner id
        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        requirements: PathBuf,
    },

    /// List the owner's past jobs, newest first
    History {
        #[arg(long)]
        owner: String,
    },

    /// Recompute a past job's recommendations
    Replay {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        job: String,
    },

    /// Load the registry and model and report readiness without serving requests
    Check,
}
