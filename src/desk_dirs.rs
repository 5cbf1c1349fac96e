//! Application directory paths for account-desk.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Config | `~/Library/Application Support/account-desk/` | `~/.config/account-desk/` |
//! | Data (logs) | `~/Library/Application Support/account-desk/` | `~/.local/share/account-desk/` |
//!
//! # Environment Overrides
//!
//! - `ACCOUNT_DESK_CONFIG_DIR` overrides [`config_dir`]
//! - `ACCOUNT_DESK_DATA_DIR` overrides [`data_dir`]

use std::path::PathBuf;

const APP_DIR: &str = "account-desk";

/// Application config directory.
///
/// Holds `config.toml`. Override with `ACCOUNT_DESK_CONFIG_DIR`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ACCOUNT_DESK_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("/tmp/account-desk-config"))
}

/// Application data root directory.
///
/// Override with `ACCOUNT_DESK_DATA_DIR`.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ACCOUNT_DESK_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("/tmp/account-desk-data"))
}

/// Diagnostic log directory: `data_dir()/logs/`.
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Default config file path: `config_dir()/config.toml`.
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
