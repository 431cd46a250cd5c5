//! Command-line interface for strictly_wager.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Wager - stake-backed tic-tac-toe in a sandbox
#[derive(Parser, Debug)]
#[command(name = "strictly_wager")]
#[command(about = "Escrowed tic-tac-toe registry with payouts and timeout forfeits", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a scripted session against a fresh registry
    Play {
        /// Path to the script (TOML: [[accounts]] and [[calls]])
        #[arg(short, long)]
        script: PathBuf,

        /// Path to the registry configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        /// Path to the registry configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
