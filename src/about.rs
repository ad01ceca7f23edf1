//! Version details shown on the about page.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Version and location of the backup tool binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorgInfo {
    pub version: String,
    pub path: PathBuf,
}

/// Everything the about page displays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AboutInfo {
    pub app_version: String,
    pub borg: Option<BorgInfo>,
    pub log_dir: Option<PathBuf>,
}

impl AboutInfo {
    pub fn new(borg: Option<BorgInfo>, log_dir: Option<PathBuf>) -> Self {
        Self {
            app_version: crate::VERSION.to_string(),
            borg,
            log_dir,
        }
    }

    /// Text for the "path to borg" label
    pub fn borg_path_label(&self) -> String {
        match &self.borg {
            Some(borg) => format!("Path to Borg: {}", borg.path.display()),
            None => "Borg not found".to_string(),
        }
    }
}

/// Extract the version from `borg --version` output such as `borg 1.2.4`
pub fn parse_borg_version(output: &str) -> Option<String> {
    let line = output.lines().map(str::trim).find(|line| !line.is_empty())?;
    let version = match line.split_once(char::is_whitespace) {
        Some((_, version)) => version.trim(),
        None => line,
    };
    version
        .starts_with(|c: char| c.is_ascii_digit())
        .then(|| version.to_string())
}

/// Run `<binary> --version` and report the result
pub fn detect_borg(binary: &Path) -> Result<BorgInfo> {
    debug!("Querying backup tool version: {}", binary.display());
    let output = Command::new(binary)
        .arg("--version")
        .output()
        .map_err(|e| Error::BackupTool {
            reason: format!("failed to run {}: {}", binary.display(), e),
        })?;

    if !output.status.success() {
        return Err(Error::BackupTool {
            reason: format!("{} --version exited with {}", binary.display(), output.status),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = parse_borg_version(&stdout).ok_or_else(|| Error::BackupTool {
        reason: format!("unexpected version output: {}", stdout.trim()),
    })?;

    Ok(BorgInfo {
        version,
        path: binary.to_path_buf(),
    })
}
