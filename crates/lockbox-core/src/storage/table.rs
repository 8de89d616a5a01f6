//! The secret table and its versioned binary payload.
//!
//! Payload layout (before encryption):
//!
//! | field        | encoding                         |
//! |--------------|----------------------------------|
//! | magic        | length-prefixed UTF-8 `"llk"`    |
//! | version      | `i32` little-endian, currently 1 |
//! | count `N`    | `i32` little-endian, `>= 0`      |
//! | `N` entries  | name, ciphertext (both strings)  |

use std::collections::BTreeMap;

use super::codec::{malformed, PayloadReader, PayloadWriter};
use crate::error::Result;

/// Magic tag at the start of every payload.
pub const MAGIC: &str = "llk";

/// Current payload format version.
pub const FORMAT_VERSION: i32 = 1;

/// A named secret as stored: the value is base64 ciphertext, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretEntry {
    pub name: String,
    pub ciphertext: String,
}

/// Mapping of secret name to ciphertext, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretTable {
    entries: BTreeMap<String, String>,
}

impl SecretTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Insert or overwrite an entry, returning the previous ciphertext.
    pub fn insert(&mut self, name: impl Into<String>, ciphertext: impl Into<String>) -> Option<String> {
        self.entries.insert(name.into(), ciphertext.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, ciphertext)| (name.as_str(), ciphertext.as_str()))
    }

    pub fn entries(&self) -> Vec<SecretEntry> {
        self.iter()
            .map(|(name, ciphertext)| SecretEntry {
                name: name.to_string(),
                ciphertext: ciphertext.to_string(),
            })
            .collect()
    }

    /// Serialize to the plaintext payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::new();
        writer.write_str(MAGIC);
        writer.write_i32(FORMAT_VERSION);
        // BTreeMap sizes beyond i32::MAX are not reachable in practice.
        writer.write_i32(self.entries.len() as i32);
        for (name, ciphertext) in &self.entries {
            writer.write_str(name);
            writer.write_str(ciphertext);
        }
        writer.into_bytes()
    }

    /// Parse a plaintext payload.
    ///
    /// # Errors
    ///
    /// Returns `LockboxError::MalformedStoreFile` on a magic mismatch, an
    /// unsupported version, a negative or impossible count, truncation,
    /// invalid UTF-8 or trailing bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = PayloadReader::new(bytes);

        let magic = reader.read_str()?;
        if magic != MAGIC {
            return Err(malformed("magic tag mismatch"));
        }

        let version = reader.read_i32()?;
        if version != FORMAT_VERSION {
            return Err(malformed(&format!(
                "unsupported format version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }

        let count = reader.read_i32()?;
        if count < 0 {
            return Err(malformed("negative entry count"));
        }
        // Each entry needs at least two length bytes.
        if count as usize > reader.remaining() / 2 {
            return Err(malformed("entry count exceeds payload size"));
        }

        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let name = reader.read_str()?;
            let ciphertext = reader.read_str()?;
            entries.insert(name.to_string(), ciphertext.to_string());
        }

        if reader.remaining() != 0 {
            return Err(malformed("trailing bytes after last entry"));
        }

        Ok(Self { entries })
    }
}
