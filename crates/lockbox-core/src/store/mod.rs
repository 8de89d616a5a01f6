//! Credential store manager.
//!
//! [`CredentialStore`] owns the master key, the active cipher, the decrypted
//! secret table and the settings collaborator behind a single mutex. Every
//! public operation locks once, so a rotation can never interleave with an
//! add or remove and the on-disk file always matches the in-memory key.
//!
//! Lifecycle:
//!
//! - [`CredentialStore::open`] loads or generates the master key and reads the
//!   store file (missing file → empty table).
//! - Writes (`add`, `import_rows`) are refused once the key has expired.
//! - [`CredentialStore::rotate`] replaces the key and re-encrypts everything,
//!   all or nothing.

mod lifecycle;
mod ops;

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::crypto::{Cipher, MasterKey};
use crate::error::{LockboxError, Result};
use crate::settings::SettingsStore;
use crate::storage::SecretTable;

pub use lifecycle::RotationSummary;
pub use ops::{ImportSummary, SearchHit, IMPORT_MIN_FIELDS};

/// Whether the store file was readable when the store was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreHealth {
    /// File absent or decrypted and decoded cleanly.
    Healthy,
    /// File present but unreadable under the current key; the store runs
    /// with an empty table. On the first write the old file is copied to
    /// `quarantined_to`.
    Unreadable {
        reason: String,
        quarantined_to: Option<PathBuf>,
    },
}

impl StoreHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, StoreHealth::Healthy)
    }
}

/// Snapshot of key and table state, free of secret material.
#[derive(Debug, Clone)]
pub struct StoreStatus {
    pub path: PathBuf,
    pub key_version: i32,
    pub expires_at: DateTime<Utc>,
    pub expired: bool,
    pub entries: usize,
    pub health: StoreHealth,
}

/// Encrypted credential store backed by a single file.
pub struct CredentialStore<S> {
    path: PathBuf,
    state: Mutex<StoreState<S>>,
}

struct StoreState<S> {
    settings: S,
    key: MasterKey,
    cipher: Cipher,
    table: SecretTable,
    health: StoreHealth,
}

impl<S: SettingsStore> CredentialStore<S> {
    /// Open the store at `path`, loading the master key from `settings` or
    /// generating and persisting a fresh one.
    ///
    /// # Errors
    ///
    /// Returns `LockboxError::Config` if persisted key metadata cannot be
    /// parsed or written, and `LockboxError::Storage` if the store file exists
    /// but cannot be read. An unreadable *payload* is not an error; see
    /// [`StoreHealth::Unreadable`].
    pub fn open(path: impl Into<PathBuf>, settings: S) -> Result<Self> {
        let path = path.into();
        let state = StoreState::load(&path, settings)?;
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Key version, expiry, entry count and file health.
    pub fn status(&self) -> Result<StoreStatus> {
        let state = self.lock()?;
        Ok(StoreStatus {
            path: self.path.clone(),
            key_version: state.key.version(),
            expires_at: state.key.expires_at(),
            expired: state.key.is_expired_at(Utc::now()),
            entries: state.table.len(),
            health: state.health.clone(),
        })
    }

    /// Consume the store and hand back the settings collaborator.
    pub fn into_settings(self) -> Result<S> {
        let state = self
            .state
            .into_inner()
            .map_err(|_| LockboxError::Storage("Store lock poisoned".to_string()))?;
        Ok(state.settings)
    }

    /// Lock the store state, returning an error if the mutex is poisoned.
    fn lock(&self) -> Result<MutexGuard<'_, StoreState<S>>> {
        self.state
            .lock()
            .map_err(|_| LockboxError::Storage("Store lock poisoned".to_string()))
    }
}

impl<S> std::fmt::Debug for CredentialStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
