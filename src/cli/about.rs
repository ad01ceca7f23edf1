//! About command implementation.

use crate::about::{detect_borg, AboutInfo};
use crate::logging::LogFiles;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::warn;

/// Arguments for the about command
#[derive(Args)]
pub struct AboutArgs {
    /// Backup tool binary to query
    #[arg(long, default_value = "borg")]
    pub borg: PathBuf,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the about command
pub fn run(args: AboutArgs, log_files: Option<&LogFiles>) -> Result<()> {
    let borg = match detect_borg(&args.borg) {
        Ok(info) => Some(info),
        Err(e) => {
            warn!("{}", e);
            None
        }
    };
    let about = AboutInfo::new(borg, log_files.map(|files| files.dir().to_path_buf()));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&about)?);
        return Ok(());
    }

    println!("borgdeck {}", about.app_version);
    match &about.borg {
        Some(borg) => println!("Borg version: {}", borg.version),
        None => println!("Borg version: unknown"),
    }
    println!("{}", about.borg_path_label());
    if let Some(dir) = &about.log_dir {
        println!("Logs: {}", dir.display());
    }
    Ok(())
}
