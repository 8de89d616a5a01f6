//! Master key lifecycle and store file persistence.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info, warn};
use zeroize::{Zeroize, Zeroizing};

use super::{CredentialStore, StoreHealth, StoreState};
use crate::crypto::key::expiry_from_ttl;
use crate::crypto::{Cipher, MasterKey, DEFAULT_TTL_HOURS};
use crate::error::{LockboxError, Result};
use crate::fs::{copy_atomic, write_atomic};
use crate::settings::{
    SettingsStore, KEY_EXPIRES_AT, KEY_MATERIAL, KEY_TTL_HOURS, KEY_VERSION,
};
use crate::storage::SecretTable;

/// Outcome of a successful key rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationSummary {
    pub old_version: i32,
    pub new_version: i32,
    pub expires_at: DateTime<Utc>,
    pub reencrypted: usize,
}

impl<S: SettingsStore> StoreState<S> {
    pub(super) fn load(path: &Path, mut settings: S) -> Result<Self> {
        let now = Utc::now();
        let key = match read_persisted_key(&mut settings, now)? {
            Some(key) => {
                debug!(version = key.version(), "loaded master key");
                key
            }
            None => {
                let ttl_hours = ttl_hours(&settings)?;
                let key = MasterKey::generate(1, ttl_hours, now)?;
                persist_key(&mut settings, &key, ttl_hours)?;
                info!(
                    version = key.version(),
                    expires_at = %key.expires_at(),
                    "generated new master key"
                );
                key
            }
        };

        let cipher = key.cipher();
        let (table, health) = read_table(path, &cipher)?;
        debug!(path = %path.display(), entries = table.len(), "store loaded");

        Ok(Self {
            settings,
            key,
            cipher,
            table,
            health,
        })
    }

    /// Refuse writes once the key's TTL has elapsed.
    pub(super) fn ensure_writable(&self, now: DateTime<Utc>) -> Result<()> {
        if self.key.is_expired_at(now) {
            return Err(LockboxError::KeyExpired {
                expired_at: self.key.expires_at(),
            });
        }
        Ok(())
    }

    /// Encrypt `table` under the active key and replace the store file.
    pub(super) fn persist(&mut self, path: &Path, table: &SecretTable) -> Result<()> {
        let payload = self.cipher.encrypt(&table.encode());
        self.write_payload(path, &payload)
    }

    /// Atomically write an already encrypted payload, quarantining an
    /// unreadable file first.
    fn write_payload(&mut self, path: &Path, payload: &[u8]) -> Result<()> {
        self.quarantine_unreadable(path)?;
        write_atomic(path, payload)?;
        debug!(path = %path.display(), bytes = payload.len(), "store file written");
        Ok(())
    }

    fn quarantine_unreadable(&mut self, path: &Path) -> Result<()> {
        let StoreHealth::Unreadable { quarantined_to, .. } = &mut self.health else {
            return Ok(());
        };
        if quarantined_to.is_some() || !path.exists() {
            return Ok(());
        }
        let target = quarantine_path(path);
        copy_atomic(path, &target)?;
        warn!(
            path = %path.display(),
            copy = %target.display(),
            "preserved unreadable store file before overwriting"
        );
        *quarantined_to = Some(target);
        Ok(())
    }
}

impl<S: SettingsStore> CredentialStore<S> {
    /// Replace the master key and re-encrypt every secret under it.
    ///
    /// Works whether or not the current key has expired. Either the new key
    /// metadata and the re-encrypted file are both persisted, or the store is
    /// left on the old key with the old file.
    ///
    /// # Errors
    ///
    /// Returns `LockboxError::InvalidCiphertext` if an existing value cannot be
    /// decrypted under the current key (nothing is changed), or a
    /// `Config`/`Storage` error if persisting fails (the old key is restored).
    pub fn rotate(&self) -> Result<RotationSummary> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let now = Utc::now();
        let ttl_hours = ttl_hours(&state.settings)?;

        let next_key = state.key.successor(ttl_hours, now)?;
        let next_cipher = next_key.cipher();

        let mut reencrypted = SecretTable::new();
        for (name, ciphertext) in state.table.iter() {
            let plaintext = Zeroizing::new(state.cipher.decrypt_str(ciphertext)?);
            reencrypted.insert(name, next_cipher.encrypt_str(&plaintext));
        }
        let payload = next_cipher.encrypt(&reencrypted.encode());

        persist_key(&mut state.settings, &next_key, ttl_hours)?;
        if let Err(err) = state.write_payload(&self.path, &payload) {
            if let Err(restore_err) = persist_key(&mut state.settings, &state.key, ttl_hours) {
                warn!(
                    error = %restore_err,
                    "failed to restore previous key metadata after aborted rotation"
                );
            }
            return Err(err);
        }

        let summary = RotationSummary {
            old_version: state.key.version(),
            new_version: next_key.version(),
            expires_at: next_key.expires_at(),
            reencrypted: reencrypted.len(),
        };

        let retired = std::mem::replace(&mut state.key, next_key);
        state.cipher = next_cipher;
        state.table = reencrypted;
        retired.retire();

        info!(
            old_version = summary.old_version,
            new_version = summary.new_version,
            entries = summary.reencrypted,
            expires_at = %summary.expires_at,
            "rotated master key"
        );
        Ok(summary)
    }
}

/// Read key metadata from settings, completing a hand-written `keyA` with
/// version 1 and a fresh expiry.
fn read_persisted_key<S: SettingsStore>(
    settings: &mut S,
    now: DateTime<Utc>,
) -> Result<Option<MasterKey>> {
    let material = match settings.get(KEY_MATERIAL)? {
        Some(material) if !material.is_empty() => Zeroizing::new(material),
        _ => return Ok(None),
    };

    let version = match settings.get(KEY_VERSION)? {
        Some(raw) => raw.trim().parse::<i32>().map_err(|e| {
            LockboxError::Config(format!("Invalid {} value '{}': {}", KEY_VERSION, raw, e))
        })?,
        None => 1,
    };

    match settings.get(KEY_EXPIRES_AT)? {
        Some(raw) => {
            let expires_at = parse_expiry(&raw)?;
            Ok(Some(MasterKey::new(material.as_str(), version, expires_at)))
        }
        None => {
            let ttl_hours = ttl_hours(settings)?;
            let key = MasterKey::new(material.as_str(), version, expiry_from_ttl(now, ttl_hours)?);
            persist_key(settings, &key, ttl_hours)?;
            info!(version, "completed key metadata for configured key");
            Ok(Some(key))
        }
    }
}

/// Parse a persisted expiry: RFC 3339, or an offset-less ISO-8601 timestamp
/// (fractional seconds allowed) read as UTC.
fn parse_expiry(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(parsed) => Ok(parsed.with_timezone(&Utc)),
        Err(rfc_err) => NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|_| {
                LockboxError::Config(format!(
                    "Invalid {} value '{}': {}",
                    KEY_EXPIRES_AT, raw, rfc_err
                ))
            }),
    }
}

fn persist_key<S: SettingsStore>(settings: &mut S, key: &MasterKey, ttl_hours: f64) -> Result<()> {
    let mut values = [
        (KEY_MATERIAL, key.material().to_string()),
        (KEY_VERSION, key.version().to_string()),
        (KEY_EXPIRES_AT, key.expires_at().to_rfc3339()),
        (KEY_TTL_HOURS, ttl_hours.to_string()),
    ];
    let result = settings.set_many(&values);
    values[0].1.zeroize();
    result
}

fn ttl_hours<S: SettingsStore>(settings: &S) -> Result<f64> {
    match settings.get(KEY_TTL_HOURS)? {
        Some(raw) => raw.trim().parse::<f64>().map_err(|e| {
            LockboxError::Config(format!("Invalid {} value '{}': {}", KEY_TTL_HOURS, raw, e))
        }),
        None => Ok(DEFAULT_TTL_HOURS),
    }
}

/// Read and decrypt the store file. A missing file is an empty table; a file
/// that does not decrypt or decode is an empty table with degraded health.
fn read_table(path: &Path, cipher: &Cipher) -> Result<(SecretTable, StoreHealth)> {
    let encrypted = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Ok((SecretTable::new(), StoreHealth::Healthy));
        }
        Err(err) => {
            return Err(LockboxError::Storage(format!(
                "Failed to read store {}: {}",
                path.display(),
                err
            )));
        }
    };

    let decoded = cipher
        .decrypt(&encrypted)
        .map(Zeroizing::new)
        .and_then(|payload| SecretTable::decode(&payload));
    match decoded {
        Ok(table) => Ok((table, StoreHealth::Healthy)),
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "store file unreadable under current key; continuing with an empty table"
            );
            Ok((
                SecretTable::new(),
                StoreHealth::Unreadable {
                    reason: err.to_string(),
                    quarantined_to: None,
                },
            ))
        }
    }
}

fn quarantine_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "store".to_string());
    let stamp = Utc::now().format("%Y%m%dT%H%M%S");
    path.with_file_name(format!("{}.unreadable-{}", name, stamp))
}
