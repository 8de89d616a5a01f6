//! Master key material and lifecycle metadata.
//!
//! A [`MasterKey`] is never mutated in place: rotation builds a successor
//! with `version + 1` and the retired key's material is zeroized.

use chrono::{DateTime, Duration, Utc};
use zeroize::{Zeroize, Zeroizing};

use super::cipher::{Cipher, KEY_LEN};
use crate::error::{LockboxError, Result};

/// Number of characters in generated key material.
pub const MATERIAL_LEN: usize = KEY_LEN;

/// Default key TTL when none is configured (30 minutes).
pub const DEFAULT_TTL_HOURS: f64 = 0.5;

/// Upper bound on a configured TTL, roughly a century.
const MAX_TTL_HOURS: f64 = 24.0 * 366.0 * 100.0;

/// URL-safe 64-symbol alphabet; one random byte masked to 6 bits picks a symbol
/// without modulo bias.
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// The master key: material, version and expiry.
pub struct MasterKey {
    material: Zeroizing<String>,
    version: i32,
    expires_at: DateTime<Utc>,
}

impl MasterKey {
    /// Build a key from persisted fields.
    pub fn new(material: impl Into<String>, version: i32, expires_at: DateTime<Utc>) -> Self {
        Self {
            material: Zeroizing::new(material.into()),
            version,
            expires_at,
        }
    }

    /// Generate fresh random material expiring `ttl_hours` after `now`.
    pub fn generate(version: i32, ttl_hours: f64, now: DateTime<Utc>) -> Result<Self> {
        let expires_at = expiry_from_ttl(now, ttl_hours)?;
        Ok(Self {
            material: generate_material()?,
            version,
            expires_at,
        })
    }

    /// Generate the key that replaces this one on rotation.
    pub fn successor(&self, ttl_hours: f64, now: DateTime<Utc>) -> Result<Self> {
        let version = self
            .version
            .checked_add(1)
            .ok_or_else(|| LockboxError::Config("Key version overflow".to_string()))?;
        Self::generate(version, ttl_hours, now)
    }

    /// Raw key material as persisted in settings.
    ///
    /// Avoid logging or displaying this value.
    pub fn material(&self) -> &str {
        &self.material
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the key is expired at `now` (strictly after `expires_at`).
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Build a cipher whose active key is this key's material.
    pub fn cipher(&self) -> Cipher {
        Cipher::new(&self.material)
    }

    /// Zero the material and drop the key.
    pub fn retire(mut self) {
        self.material.zeroize();
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("material", &"[REDACTED]")
            .field("version", &self.version)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Compute an absolute expiry `ttl_hours` after `now`.
///
/// # Errors
///
/// Returns `LockboxError::Config` for negative, non-finite or absurdly large TTLs.
pub fn expiry_from_ttl(now: DateTime<Utc>, ttl_hours: f64) -> Result<DateTime<Utc>> {
    if !ttl_hours.is_finite() || ttl_hours < 0.0 || ttl_hours > MAX_TTL_HOURS {
        return Err(LockboxError::Config(format!(
            "Key TTL must be between 0 and {} hours (got {})",
            MAX_TTL_HOURS, ttl_hours
        )));
    }
    let millis = (ttl_hours * 3_600_000.0).round() as i64;
    now.checked_add_signed(Duration::milliseconds(millis))
        .ok_or_else(|| LockboxError::Config("Key expiry is out of range".to_string()))
}

fn generate_material() -> Result<Zeroizing<String>> {
    let mut bytes = Zeroizing::new([0u8; MATERIAL_LEN]);
    getrandom::getrandom(bytes.as_mut_slice())
        .map_err(|e| LockboxError::Storage(format!("Failed to generate key bytes: {}", e)))?;
    let mut material = Zeroizing::new(String::with_capacity(MATERIAL_LEN));
    for byte in bytes.iter() {
        material.push(ALPHABET[(byte & 0x3f) as usize] as char);
    }
    Ok(material)
}
