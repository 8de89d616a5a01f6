//! Path resolution for config and store files.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_config_path, default_store_path, LockboxConfig};

/// Resolve the config file path: `--config` / `LOCKBOX_CONFIG`, then the XDG default.
pub fn resolve_config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(value) = cli.config.as_deref() {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Resolve the store file path: `--store` / `LOCKBOX_STORE`, then `[store] path`,
/// then the XDG data default.
pub fn resolve_store_path(cli: &Cli, config: &LockboxConfig) -> anyhow::Result<PathBuf> {
    if let Some(value) = cli.store.as_deref() {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    if let Some(value) = config.store.path.as_deref() {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_store_path()
}

/// Error message when the store file is missing.
pub fn missing_store_message(path: &Path) -> String {
    format!(
        "No store found at {}\n\nAdd a secret to create it:\n  lockbox add <NAME>\n\nOr point at an existing store:\n  LOCKBOX_STORE=/path/to/secrets.llk lockbox status",
        path.display()
    )
}
