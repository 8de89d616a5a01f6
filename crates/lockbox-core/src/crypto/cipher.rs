//! AES-128-CBC encryption under a single active key.
//!
//! The cipher uses PKCS#7 padding and a fixed all-zero IV, so encryption is
//! deterministic: the same plaintext under the same key always yields the same
//! ciphertext. That leaks equality of repeated values and is the documented
//! behavior of the store format.

use aes::Aes128;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{LockboxError, Result};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Length of the active key in bytes (128 bits).
pub const KEY_LEN: usize = 16;

/// AES block length in bytes.
pub const BLOCK_LEN: usize = 16;

const ZERO_IV: [u8; BLOCK_LEN] = [0u8; BLOCK_LEN];

/// Normalize a passphrase to exactly [`KEY_LEN`] bytes.
///
/// Shorter passphrases are right-padded with ASCII spaces; longer ones are
/// truncated. Operates on UTF-8 bytes, not characters.
pub fn normalize_key(passphrase: &str) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([b' '; KEY_LEN]);
    let bytes = passphrase.as_bytes();
    let len = bytes.len().min(KEY_LEN);
    key[..len].copy_from_slice(&bytes[..len]);
    key
}

/// Symmetric cipher holding the active 128-bit key.
///
/// Key bytes are zeroized when replaced via [`Cipher::set_key`] and on drop.
pub struct Cipher {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl Cipher {
    /// Create a cipher whose active key is derived from `passphrase`.
    pub fn new(passphrase: &str) -> Self {
        Self {
            key: normalize_key(passphrase),
        }
    }

    /// Replace the active key. Always succeeds.
    pub fn set_key(&mut self, passphrase: &str) {
        self.key = normalize_key(passphrase);
    }

    /// Encrypt raw bytes with CBC + PKCS#7 under the active key and zero IV.
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        Aes128CbcEnc::new(
            GenericArray::from_slice(self.key.as_slice()),
            GenericArray::from_slice(&ZERO_IV),
        )
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }

    /// Decrypt raw bytes produced by [`Cipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns `LockboxError::InvalidCiphertext` if the input is empty, is not a
    /// multiple of the block size, or the padding is malformed (typically a
    /// wrong key).
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(LockboxError::InvalidCiphertext(format!(
                "length {} is not a positive multiple of {}",
                ciphertext.len(),
                BLOCK_LEN
            )));
        }
        Aes128CbcDec::new(
            GenericArray::from_slice(self.key.as_slice()),
            GenericArray::from_slice(&ZERO_IV),
        )
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| LockboxError::InvalidCiphertext("padding check failed".to_string()))
    }

    /// Encrypt a UTF-8 string and return the ciphertext as base64 text.
    pub fn encrypt_str(&self, plaintext: &str) -> String {
        STANDARD.encode(self.encrypt(plaintext.as_bytes()))
    }

    /// Decode base64 text, decrypt it, and interpret the result as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns `LockboxError::InvalidCiphertext` for bad base64, a failed
    /// decryption, or plaintext that is not valid UTF-8.
    pub fn decrypt_str(&self, ciphertext: &str) -> Result<String> {
        let raw = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| LockboxError::InvalidCiphertext(format!("invalid base64: {}", e)))?;
        let plaintext = self.decrypt(&raw)?;
        String::from_utf8(plaintext).map_err(|err| {
            err.into_bytes().zeroize();
            LockboxError::InvalidCiphertext("plaintext is not valid UTF-8".to_string())
        })
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
