use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LockboxConfig {
    #[serde(default)]
    pub store: StoreSection,
    /// Master key metadata, keyed by the settings names the core reads.
    #[serde(default)]
    pub key: BTreeMap<String, String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: Option<String>,
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("secrets.llk"))
}

/// Read the config file, falling back to defaults when it does not exist yet.
pub fn read_config_or_default(path: &Path) -> anyhow::Result<LockboxConfig> {
    if !path.exists() {
        return Ok(LockboxConfig::default());
    }
    read_config(path)
}

pub fn read_config(path: &Path) -> anyhow::Result<LockboxConfig> {
    let contents = Zeroizing::new(
        std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?,
    );
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &LockboxConfig) -> anyhow::Result<()> {
    let contents = Zeroizing::new(
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?,
    );
    lockbox_core::fs::write_atomic(path, contents.as_bytes())
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("lockbox"));
        }
    }
    Ok(home_dir()?.join(".config").join("lockbox"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("lockbox"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("lockbox"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = read_config_or_default(&dir.path().join("config.toml")).unwrap();
        assert!(config.store.path.is_none());
        assert!(config.key.is_empty());
    }

    #[test]
    fn test_config_round_trips_key_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = LockboxConfig::default();
        config.store.path = Some("/tmp/secrets.llk".to_string());
        config.key.insert("keyA".to_string(), "abcdefghijklmnop".to_string());
        config.key.insert("keyVersion".to_string(), "3".to_string());
        write_config(&path, &config).unwrap();

        let loaded = read_config(&path).unwrap();
        assert_eq!(loaded.store.path.as_deref(), Some("/tmp/secrets.llk"));
        assert_eq!(loaded.key.get("keyA").map(String::as_str), Some("abcdefghijklmnop"));
        assert_eq!(loaded.key.get("keyVersion").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_parses_hand_written_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[store]\npath = \"/data/s.llk\"\n\n[key]\nkeyTtlHours = \"2\"\n",
        )
        .unwrap();

        let config = read_config(&path).unwrap();
        assert_eq!(config.store.path.as_deref(), Some("/data/s.llk"));
        assert_eq!(config.key.get("keyTtlHours").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_rejects_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store\npath = ").unwrap();
        let err = read_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
