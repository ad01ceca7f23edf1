//! Start-at-login support via XDG desktop entries.

use crate::config::{SettingChanged, SettingsStore};
use crate::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Something that can register the application to start at login
pub trait Autostart: Send + Sync {
    fn enable(&self) -> Result<()>;
    fn disable(&self) -> Result<()>;
    fn is_enabled(&self) -> bool;
}

/// Writes `<dir>/<app>.desktop` to enable autostart
#[derive(Debug, Clone)]
pub struct DesktopEntryAutostart {
    dir: PathBuf,
    app_name: String,
    exec: String,
}

impl DesktopEntryAutostart {
    pub fn new(
        dir: impl Into<PathBuf>,
        app_name: impl Into<String>,
        exec: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            app_name: app_name.into(),
            exec: exec.into(),
        }
    }

    /// Use `$XDG_CONFIG_HOME/autostart`, or `~/.config/autostart` when the
    /// variable is unset
    pub fn for_current_user(app_name: impl Into<String>, exec: impl Into<String>) -> Result<Self> {
        Ok(Self::new(default_autostart_dir()?, app_name, exec))
    }

    pub fn entry_path(&self) -> PathBuf {
        self.dir.join(format!("{}.desktop", self.app_name))
    }

    fn desktop_entry(&self) -> String {
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Name={name}\n\
             Exec={exec}\n\
             Terminal=false\n\
             X-GNOME-Autostart-enabled=true\n",
            name = self.app_name,
            exec = self.exec,
        )
    }
}

impl Autostart for DesktopEntryAutostart {
    fn enable(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.entry_path(), self.desktop_entry())?;
        info!("Autostart enabled: {}", self.entry_path().display());
        Ok(())
    }

    fn disable(&self) -> Result<()> {
        match fs::remove_file(self.entry_path()) {
            Ok(()) => {
                info!("Autostart disabled: {}", self.entry_path().display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Autostart entry already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn is_enabled(&self) -> bool {
        self.entry_path().is_file()
    }
}

fn default_autostart_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
        return Ok(Path::new(&dir).join("autostart"));
    }

    let home = dirs::home_dir().ok_or_else(|| Error::Configuration {
        reason: "Could not determine home directory".to_string(),
    })?;
    Ok(home.join(".config").join("autostart"))
}

/// Keep the autostart entry in line with the `autostart` setting.
///
/// The current value is applied immediately; later changes are applied as
/// they happen.
pub fn sync_autostart(store: &mut SettingsStore, autostart: Arc<dyn Autostart>) -> Result<()> {
    apply(autostart.as_ref(), store.settings().autostart)?;

    store.subscribe(move |event: &SettingChanged| {
        if event.key == "autostart" {
            if let Err(e) = apply(autostart.as_ref(), event.value) {
                warn!("Failed to update autostart: {}", e);
            }
        }
    });
    Ok(())
}

fn apply(autostart: &dyn Autostart, enabled: bool) -> Result<()> {
    match (enabled, autostart.is_enabled()) {
        (true, false) => autostart.enable(),
        (false, true) => autostart.disable(),
        _ => Ok(()),
    }
}
