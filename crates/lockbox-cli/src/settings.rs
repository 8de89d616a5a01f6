//! Settings backed by the `[key]` table of the TOML config file.

use std::path::PathBuf;

use lockbox_core::{LockboxError, SettingsStore};
use zeroize::Zeroize;

use crate::config::{write_config, LockboxConfig};

/// [`SettingsStore`] that rewrites the config file on every update.
///
/// The whole file is replaced atomically, so a batch of keys lands together
/// or not at all.
pub struct ConfigSettings {
    path: PathBuf,
    config: LockboxConfig,
}

impl ConfigSettings {
    pub fn new(path: PathBuf, config: LockboxConfig) -> Self {
        Self { path, config }
    }
}

impl SettingsStore for ConfigSettings {
    fn get(&self, key: &str) -> lockbox_core::Result<Option<String>> {
        Ok(self.config.key.get(key).cloned())
    }

    fn set_many(&mut self, values: &[(&str, String)]) -> lockbox_core::Result<()> {
        let mut updated = self.config.clone();
        for (key, value) in values {
            if let Some(mut previous) = updated.key.insert((*key).to_string(), value.clone()) {
                previous.zeroize();
            }
        }
        if let Err(err) = write_config(&self.path, &updated) {
            scrub_key_section(&mut updated);
            return Err(LockboxError::Config(err.to_string()));
        }
        let mut previous = std::mem::replace(&mut self.config, updated);
        scrub_key_section(&mut previous);
        Ok(())
    }
}

impl std::fmt::Debug for ConfigSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSettings")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Drop for ConfigSettings {
    fn drop(&mut self) {
        scrub_key_section(&mut self.config);
    }
}

/// Zero every `[key]` value in place; the key section holds cleartext material.
fn scrub_key_section(config: &mut LockboxConfig) {
    config.key.values_mut().for_each(Zeroize::zeroize);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::read_config;
    use tempfile::tempdir;

    #[test]
    fn test_set_many_persists_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut settings = ConfigSettings::new(path.clone(), LockboxConfig::default());

        settings
            .set_many(&[("keyA", "0123456789abcdef".to_string()), ("keyVersion", "1".to_string())])
            .unwrap();

        assert_eq!(settings.get("keyA").unwrap().as_deref(), Some("0123456789abcdef"));
        let on_disk = read_config(&path).unwrap();
        assert_eq!(on_disk.key.get("keyVersion").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_failed_write_leaves_settings_unchanged() {
        let dir = tempdir().unwrap();
        // A directory where the config file should be makes the rename fail.
        let path = dir.path().join("config.toml");
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let mut config = LockboxConfig::default();
        config.key.insert("keyVersion".to_string(), "4".to_string());
        let mut settings = ConfigSettings::new(path, config);

        let err = settings
            .set_many(&[("keyVersion", "5".to_string())])
            .unwrap_err();
        assert!(matches!(err, LockboxError::Config(_)));
        assert_eq!(settings.get("keyVersion").unwrap().as_deref(), Some("4"));
    }

    #[test]
    fn test_scrub_key_section_clears_values() {
        let mut config = LockboxConfig::default();
        config.store.path = Some("/srv/secrets.llk".to_string());
        config.key.insert("keyA".to_string(), "0123456789abcdef".to_string());
        config.key.insert("keyVersion".to_string(), "3".to_string());

        scrub_key_section(&mut config);

        assert!(config.key.values().all(String::is_empty));
        assert_eq!(config.key.len(), 2);
        assert_eq!(config.store.path.as_deref(), Some("/srv/secrets.llk"));
    }

    #[test]
    fn test_preserves_store_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = LockboxConfig::default();
        config.store.path = Some("/srv/secrets.llk".to_string());
        let mut settings = ConfigSettings::new(path.clone(), config);

        settings.set_many(&[("keyTtlHours", "1".to_string())]).unwrap();

        let on_disk = read_config(&path).unwrap();
        assert_eq!(on_disk.store.path.as_deref(), Some("/srv/secrets.llk"));
    }
}
