//! Command-line interface for borgdeck.
//!
//! Exposes source size estimation, byte formatting and version details
//! using clap.

use clap::{Parser, Subcommand};

pub mod about;
pub mod format;
pub mod settings;
pub mod size;

/// borgdeck - helpers for a borg backup front-end
#[derive(Parser)]
#[command(name = "borgdeck")]
#[command(about = "Estimate backup source sizes and format byte counts")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log to the console
    #[arg(long, global = true)]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Estimate the size of backup sources
    Size(size::SizeArgs),
    /// Format byte counts
    Format(format::FormatArgs),
    /// Show version details
    About(about::AboutArgs),
    /// Show or toggle settings
    Settings(settings::SettingsArgs),
}
