//! Key/value settings used to persist master key metadata.
//!
//! The store manager never owns a config file itself; it reads and writes
//! these four keys through a [`SettingsStore`]. The CLI backs this with its
//! TOML config file; [`MemorySettings`] serves embedding and tests.

use std::collections::HashMap;

use zeroize::Zeroizing;

use crate::error::Result;

/// Master key material, persisted in cleartext.
pub const KEY_MATERIAL: &str = "keyA";

/// Integer master key version.
pub const KEY_VERSION: &str = "keyVersion";

/// Absolute key expiry, RFC 3339.
pub const KEY_EXPIRES_AT: &str = "keyTtl";

/// TTL in (possibly fractional) hours, used when generating or rotating.
pub const KEY_TTL_HOURS: &str = "keyTtlHours";

/// Durable key/value settings.
pub trait SettingsStore {
    /// Read a setting, `Ok(None)` when unset.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write several settings as one durable update.
    ///
    /// Implementations must either persist every pair or none of them.
    fn set_many(&mut self, values: &[(&str, String)]) -> Result<()>;
}

/// In-memory settings. Values are zeroized when overwritten or dropped.
#[derive(Clone, Default)]
pub struct MemorySettings {
    values: HashMap<String, Zeroizing<String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for seeding values.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values
            .insert(key.to_string(), Zeroizing::new(value.into()));
        self
    }
}

impl std::fmt::Debug for MemorySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("MemorySettings").field("keys", &keys).finish()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).map(|value| value.to_string()))
    }

    fn set_many(&mut self, values: &[(&str, String)]) -> Result<()> {
        for (key, value) in values {
            self.values
                .insert((*key).to_string(), Zeroizing::new(value.clone()));
        }
        Ok(())
    }
}

impl<S: SettingsStore + ?Sized> SettingsStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set_many(&mut self, values: &[(&str, String)]) -> Result<()> {
        (**self).set_many(values)
    }
}
