//! Application context for the Lockbox CLI.
//!
//! Bundles the parsed arguments with a lazily opened credential store.

use std::path::PathBuf;

use once_cell::unsync::OnceCell;

use lockbox_core::CredentialStore;

use crate::cli::Cli;
use crate::config::{read_config_or_default, LockboxConfig};
use crate::settings::ConfigSettings;

use super::resolver::{resolve_config_path, resolve_store_path};

/// Store type used by every command.
pub type CliStore = CredentialStore<ConfigSettings>;

/// Application context that bundles CLI args with the open store.
///
/// The store is opened on first use so `completions` never touches the
/// config file or generates a key.
pub struct AppContext<'a> {
    cli: &'a Cli,
    store: OnceCell<CliStore>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            store: OnceCell::new(),
        }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Get the credential store, opening it if needed.
    ///
    /// Opening loads the master key from the config file, generating and
    /// persisting one on first use.
    pub fn store(&self) -> anyhow::Result<&CliStore> {
        self.store.get_or_try_init(|| {
            let (config_path, config) = self.load_config()?;
            let store_path = resolve_store_path(self.cli, &config)?;
            tracing::debug!(
                config = %config_path.display(),
                store = %store_path.display(),
                "opening store"
            );
            let settings = ConfigSettings::new(config_path, config);
            Ok(CredentialStore::open(store_path, settings)?)
        })
    }

    /// Resolve the store file path without opening the store.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        let (_, config) = self.load_config()?;
        resolve_store_path(self.cli, &config)
    }

    fn load_config(&self) -> anyhow::Result<(PathBuf, LockboxConfig)> {
        let config_path = resolve_config_path(self.cli)?;
        let config = read_config_or_default(&config_path)?;
        Ok((config_path, config))
    }
}
