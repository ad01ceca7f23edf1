//! borgdeck - command-line access to the front-end helpers

use borgdeck::cli::{Cli, Commands};
use borgdeck::logging::{self, LogFiles};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let log_files = if cli.no_log_file {
        None
    } else {
        Some(LogFiles::new(logging::default_log_dir()?))
    };
    logging::init_logging(level, log_files.as_ref(), false)?;

    match cli.command {
        Commands::Size(args) => borgdeck::cli::size::run(args).await,
        Commands::Format(args) => borgdeck::cli::format::run(args),
        Commands::About(args) => borgdeck::cli::about::run(args, log_files.as_ref()),
        Commands::Settings(args) => borgdeck::cli::settings::run(args),
    }
}
