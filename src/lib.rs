//! # borgdeck
//!
//! Core helpers for a desktop front-end to the borg backup tool.
//!
//! ## Features
//!
//! - **Size units**: shared unit selection and human-readable byte formatting
//! - **Source estimation**: exclusion-aware size and file count of backup sources
//! - **Settings**: persisted user settings with change notification
//! - **Autostart**: start-at-login via XDG desktop entries
//! - **Keyring**: repository passphrase storage behind a trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use borgdeck::{find_best_unit_for_sizes, get_path_datasize, pretty_bytes};
//!
//! # fn main() -> borgdeck::Result<()> {
//! let (bytes, files) = get_path_datasize("/home/me/Documents", ["*/.cache"])?;
//! let unit = find_best_unit_for_sizes([bytes], true, 1);
//! println!("{} in {} files", pretty_bytes(bytes, true, 1, Some(unit)), files);
//! # Ok(())
//! # }
//! ```

pub mod about;
pub mod archive;
pub mod autostart;
pub mod cli;
pub mod config;
pub mod error;

#[cfg(feature = "keyring")]
pub mod keyring;

pub mod logging;
pub mod pattern;
pub mod scanner;
pub mod units;

// Re-export commonly used types
pub use error::{Error, Result};
pub use scanner::{estimate_sources, get_path_datasize, DataSize, DatasizeScanner};
pub use units::{find_best_unit_for_size, find_best_unit_for_sizes, pretty_bytes};

#[cfg(feature = "keyring")]
pub use keyring::{MemoryKeyring, SecretStore};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
