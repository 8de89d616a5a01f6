//! Secret CRUD, search and bulk import.

use chrono::Utc;
use secrecy::SecretString;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::CredentialStore;
use crate::error::{LockboxError, Result};
use crate::settings::SettingsStore;
use crate::storage::SecretEntry;

/// Minimum fields in an import row: name, url, username, password, note.
pub const IMPORT_MIN_FIELDS: usize = 5;

/// Separator used for composite names and values.
const FIELD_SEPARATOR: char = '|';

/// One search result.
///
/// Without reveal, `field1` holds the ciphertext and `field2` is `None`.
/// With reveal, the plaintext is split on the first `|` (the
/// `username|password` convention). Fields are zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SearchHit {
    pub name: String,
    pub field1: String,
    pub field2: Option<String>,
    #[zeroize(skip)]
    pub revealed: bool,
}

impl std::fmt::Debug for SearchHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("SearchHit");
        debug.field("name", &self.name);
        if self.revealed {
            debug.field("field1", &"[REDACTED]").field("field2", &"[REDACTED]");
        } else {
            debug.field("field1", &self.field1);
        }
        debug.field("revealed", &self.revealed).finish()
    }
}

/// Counts from a bulk import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

impl<S: SettingsStore> CredentialStore<S> {
    /// Encrypt `plaintext` and store it under `name`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `LockboxError::KeyExpired` if the master key has expired (the
    /// table is unchanged), `LockboxError::InvalidInput` for an empty name, or
    /// a storage error if the file rewrite fails (the table is unchanged).
    pub fn add(&self, name: &str, plaintext: &str) -> Result<()> {
        validate_name(name)?;
        let mut state = self.lock()?;
        state.ensure_writable(Utc::now())?;

        let mut staged = state.table.clone();
        let replaced = staged
            .insert(name, state.cipher.encrypt_str(plaintext))
            .is_some();
        state.persist(&self.path, &staged)?;
        state.table = staged;

        debug!(replaced, entries = state.table.len(), "stored secret");
        Ok(())
    }

    /// The stored ciphertext for `name`. Never decrypts.
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        let state = self.lock()?;
        Ok(state.table.get(name).map(str::to_string))
    }

    /// Decrypt the value stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns `LockboxError::InvalidCiphertext` if the stored value does not
    /// decrypt under the current key.
    pub fn reveal(&self, name: &str) -> Result<Option<SecretString>> {
        let state = self.lock()?;
        state
            .table
            .get(name)
            .map(|ciphertext| state.cipher.decrypt_str(ciphertext).map(SecretString::from))
            .transpose()
    }

    /// Decrypt a ciphertext previously returned by [`CredentialStore::get`]
    /// or [`CredentialStore::entries`].
    pub fn decrypt_value(&self, ciphertext: &str) -> Result<SecretString> {
        let state = self.lock()?;
        state.cipher.decrypt_str(ciphertext).map(SecretString::from)
    }

    /// All secret names, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let state = self.lock()?;
        Ok(state.table.names().map(str::to_string).collect())
    }

    /// All entries as name + ciphertext, sorted by name.
    pub fn entries(&self) -> Result<Vec<SecretEntry>> {
        let state = self.lock()?;
        Ok(state.table.entries())
    }

    /// Delete `name`. Returns `false` (and writes nothing) if it was absent.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let mut state = self.lock()?;
        if !state.table.contains(name) {
            return Ok(false);
        }

        let mut staged = state.table.clone();
        staged.remove(name);
        state.persist(&self.path, &staged)?;
        state.table = staged;

        debug!(entries = state.table.len(), "removed secret");
        Ok(true)
    }

    /// Case-insensitive substring search over names.
    ///
    /// # Errors
    ///
    /// With `reveal`, returns `LockboxError::InvalidCiphertext` if any matching
    /// value fails to decrypt.
    pub fn search(&self, keyword: &str, reveal: bool) -> Result<Vec<SearchHit>> {
        let state = self.lock()?;
        let needle = keyword.to_lowercase();

        let mut hits = Vec::new();
        for (name, ciphertext) in state.table.iter() {
            if !name.to_lowercase().contains(&needle) {
                continue;
            }
            let hit = if reveal {
                let plaintext = Zeroizing::new(state.cipher.decrypt_str(ciphertext)?);
                let mut parts = plaintext.splitn(2, FIELD_SEPARATOR);
                SearchHit {
                    name: name.to_string(),
                    field1: parts.next().unwrap_or_default().to_string(),
                    field2: parts.next().map(str::to_string),
                    revealed: true,
                }
            } else {
                SearchHit {
                    name: name.to_string(),
                    field1: ciphertext.to_string(),
                    field2: None,
                    revealed: false,
                }
            };
            hits.push(hit);
        }
        Ok(hits)
    }

    /// Import password-manager rows.
    ///
    /// Row 0 is a header and is skipped. Each later row with at least
    /// [`IMPORT_MIN_FIELDS`] fields `(name, url, username, password, note)` is
    /// stored as `name|url|note` → `username|password`; shorter rows are
    /// skipped and only counted. All rows land in one file rewrite.
    ///
    /// # Errors
    ///
    /// Returns `LockboxError::KeyExpired` before touching any row if the key
    /// has expired, or a storage error if the rewrite fails (nothing imported).
    pub fn import_rows<R: AsRef<[String]>>(&self, rows: &[R]) -> Result<ImportSummary> {
        let mut state = self.lock()?;
        state.ensure_writable(Utc::now())?;

        let mut staged = state.table.clone();
        let mut summary = ImportSummary::default();
        for row in rows.iter().skip(1) {
            let fields = row.as_ref();
            if fields.len() < IMPORT_MIN_FIELDS {
                summary.skipped += 1;
                continue;
            }
            let name = format!(
                "{}{sep}{}{sep}{}",
                fields[0],
                fields[1],
                fields[4],
                sep = FIELD_SEPARATOR
            );
            let value = Zeroizing::new(format!(
                "{}{sep}{}",
                fields[2],
                fields[3],
                sep = FIELD_SEPARATOR
            ));
            staged.insert(name, state.cipher.encrypt_str(&value));
            summary.imported += 1;
        }

        if summary.imported > 0 {
            state.persist(&self.path, &staged)?;
            state.table = staged;
        }

        debug!(
            imported = summary.imported,
            skipped = summary.skipped,
            "imported rows"
        );
        Ok(summary)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(LockboxError::InvalidInput(
            "Secret name cannot be empty".to_string(),
        ));
    }
    Ok(())
}
