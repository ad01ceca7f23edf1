//! Logging setup.
//!
//! Logs go to a daily file in the user's cache directory
//! (`~/.cache/borgdeck/log` on Linux) and, when running in the foreground,
//! to the console as well.

use crate::{Error, Result};
use chrono::{Local, NaiveDate};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Number of daily log files kept on disk
pub const KEEP_LOG_FILES: usize = 5;

const LOG_STEM: &str = "borgdeck";

/// Daily log files named `borgdeck.<YYYY-MM-DD>.log`
#[derive(Debug, Clone)]
pub struct LogFiles {
    dir: PathBuf,
    keep: usize,
}

impl LogFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            keep: KEEP_LOG_FILES,
        }
    }

    pub fn with_keep(mut self, keep: usize) -> Self {
        self.keep = keep.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for `date`; always ends in `.log`
    pub fn file_name(date: NaiveDate) -> String {
        format!("{LOG_STEM}.{}.log", date.format("%Y-%m-%d"))
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(Self::file_name(date))
    }

    pub fn current_path(&self) -> PathBuf {
        self.path_for(Local::now().date_naive())
    }

    /// Existing log files, oldest first
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_log_file(path))
            .collect();
        // ISO dates sort chronologically
        files.sort();
        Ok(files)
    }

    /// Delete all but the newest log files; returns how many were removed
    pub fn prune(&self) -> Result<usize> {
        let files = self.list()?;
        let excess = files.len().saturating_sub(self.keep);
        for old in &files[..excess] {
            debug!("Removing old log file {}", old.display());
            fs::remove_file(old)?;
        }
        Ok(excess)
    }
}

fn is_log_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.strip_prefix(LOG_STEM)
        .and_then(|rest| rest.strip_prefix('.'))
        .and_then(|rest| rest.strip_suffix(".log"))
        .is_some_and(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok())
}

/// `<cache dir>/borgdeck/log`
pub fn default_log_dir() -> Result<PathBuf> {
    let cache = dirs::cache_dir().ok_or_else(|| Error::Configuration {
        reason: "Could not determine cache directory".to_string(),
    })?;
    Ok(cache.join(LOG_STEM).join("log"))
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{LOG_STEM}={level}")))
        .unwrap_or_else(|_| EnvFilter::new(format!("{LOG_STEM}=info")))
}

/// Install the global subscriber.
///
/// With `log_files` set, output is appended to today's file and old files
/// are pruned. Console output is skipped when `background` is true.
pub fn init_logging(level: &str, log_files: Option<&LogFiles>, background: bool) -> Result<()> {
    let file_layer = match log_files {
        Some(files) => {
            fs::create_dir_all(files.dir())?;
            files.prune()?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(files.current_path())?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true),
            )
        }
        None => None,
    };

    let console_layer = (!background).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
    });

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| Error::Configuration {
            reason: format!("Failed to initialise logging: {e}"),
        })
}
