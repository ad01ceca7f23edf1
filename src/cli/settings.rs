//! Settings command implementation.

use crate::autostart::{sync_autostart, DesktopEntryAutostart};
use crate::config::{default_settings_path, SettingsStore, TOGGLE_KEYS};
use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Arguments for the settings command
#[derive(Args)]
pub struct SettingsArgs {
    /// Flip a boolean setting (metric_units, fixed_units, autostart, check_full_disk_access)
    #[arg(long)]
    pub toggle: Option<String>,

    /// Settings file to use instead of the per-user one
    #[arg(long)]
    pub file: Option<PathBuf>,
}

/// Run the settings command
pub fn run(args: SettingsArgs) -> Result<()> {
    let path = match args.file {
        Some(path) => path,
        None => default_settings_path()?,
    };
    let mut store = SettingsStore::load(&path)?;

    if let Some(key) = &args.toggle {
        if !TOGGLE_KEYS.contains(&key.as_str()) {
            bail!("unknown setting {key}, expected one of {}", TOGGLE_KEYS.join(", "));
        }

        let autostart = DesktopEntryAutostart::for_current_user("borgdeck", "borgdeck")?;
        sync_autostart(&mut store, Arc::new(autostart))?;

        let value = store.toggle(key)?;
        store.save(&path)?;
        info!("{} is now {}", key, value);
    }

    print!("{}", toml::to_string_pretty(store.settings())?);
    Ok(())
}
