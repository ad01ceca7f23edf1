use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// User settings shared by the front-end and the command-line tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Use powers of 1000 (`MB`) instead of 1024 (`MiB`)
    pub metric_units: bool,
    /// Show all sizes of a listing in one shared unit
    pub fixed_units: bool,
    pub size_precision: usize,
    /// Start the application at login
    pub autostart: bool,
    pub check_full_disk_access: bool,
    pub log_level: String,
    pub exclude_defaults: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            metric_units: true,
            fixed_units: true,
            size_precision: 1,
            autostart: false,
            check_full_disk_access: true,
            log_level: "info".to_string(),
            exclude_defaults: vec![
                "*/.cache".to_string(),
                "*/node_modules".to_string(),
                "*/.Trash*".to_string(),
            ],
        }
    }
}

/// Boolean settings that can be toggled from the settings view
pub const TOGGLE_KEYS: [&str; 4] = [
    "metric_units",
    "fixed_units",
    "autostart",
    "check_full_disk_access",
];

/// Notification sent to subscribers when a setting changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingChanged {
    pub key: String,
    pub value: bool,
}

type Listener = Box<dyn Fn(&SettingChanged) + Send + Sync>;

/// Settings plus change notification
#[derive(Default)]
pub struct SettingsStore {
    settings: Settings,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("settings", &self.settings)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            listeners: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Register a callback invoked after every effective change
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&SettingChanged) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match key {
            "metric_units" => Ok(self.settings.metric_units),
            "fixed_units" => Ok(self.settings.fixed_units),
            "autostart" => Ok(self.settings.autostart),
            "check_full_disk_access" => Ok(self.settings.check_full_disk_access),
            _ => Err(unknown_key(key)),
        }
    }

    /// Update a boolean setting. Listeners are only notified when the value
    /// actually changes.
    pub fn set_bool(&mut self, key: &str, value: bool) -> Result<()> {
        let slot = match key {
            "metric_units" => &mut self.settings.metric_units,
            "fixed_units" => &mut self.settings.fixed_units,
            "autostart" => &mut self.settings.autostart,
            "check_full_disk_access" => &mut self.settings.check_full_disk_access,
            _ => return Err(unknown_key(key)),
        };

        if *slot == value {
            return Ok(());
        }
        *slot = value;

        debug!("Setting {} changed to {}", key, value);
        let event = SettingChanged {
            key: key.to_string(),
            value,
        };
        for listener in &self.listeners {
            listener(&event);
        }
        Ok(())
    }

    /// Flip a boolean setting and return its new value
    pub fn toggle(&mut self, key: &str) -> Result<bool> {
        let value = !self.get_bool(key)?;
        self.set_bool(key, value)?;
        Ok(value)
    }

    /// Load settings from `path`, falling back to defaults when the file is
    /// missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Settings file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        debug!("Loading settings from {}", path.display());
        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(Self::new(settings))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&self.settings)?;
        fs::write(path, content)?;

        debug!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Load from the per-user settings file
    pub fn load_default() -> Result<Self> {
        Self::load(&default_settings_path()?)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.size_precision > 6 {
            return Err(Error::Configuration {
                reason: format!("size_precision must be at most 6, got {}", self.size_precision),
            });
        }

        if tracing_subscriber::EnvFilter::try_new(&self.log_level).is_err() {
            warn!("Ignoring invalid log level: {}", self.log_level);
        }

        Ok(())
    }
}

fn unknown_key(key: &str) -> Error {
    Error::Configuration {
        reason: format!("Unknown setting: {key}"),
    }
}

/// `<config dir>/borgdeck/settings.toml`
pub fn default_settings_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| Error::Configuration {
        reason: "Could not determine config directory".to_string(),
    })?;

    Ok(config_dir.join("borgdeck").join("settings.toml"))
}
