//! CLI Adapter
//!
//! Command-line interface for the scanner. Uses clap derive macros for
//! argument parsing; command execution lives in `main.rs` where the
//! components are wired.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// GemScout - memecoin discovery and screening pipeline
#[derive(Parser, Debug)]
#[command(
    name = "gemscout",
    version = env!("CARGO_PKG_VERSION"),
    about = "Memecoin discovery and screening pipeline",
    long_about = "GemScout polls DexScreener for fresh token listings, screens them \
                  through on-chain security checks and an AI risk model, and runs two \
                  paper-trading strategies over the survivors."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the continuous scan loop
    Run(RunCmd),

    /// Run a single scan cycle and exit
    Scan(ScanCmd),

    /// Load and validate the configuration, then exit
    Check(CheckCmd),
}

/// Start the scan loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/gemscout.toml")]
    pub config: PathBuf,

    /// Print alerts to the log instead of sending them
    #[arg(long)]
    pub no_alerts: bool,
}

/// Run one cycle
#[derive(Parser, Debug)]
pub struct ScanCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/gemscout.toml")]
    pub config: PathBuf,

    /// Print alerts to the log instead of sending them
    #[arg(long)]
    pub no_alerts: bool,
}

/// Validate configuration
#[derive(Parser, Debug)]
pub struct CheckCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/gemscout.toml")]
    pub config: PathBuf,
}
