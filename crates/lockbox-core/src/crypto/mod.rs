//! Cryptographic primitives for Lockbox.
//!
//! - **cipher**: AES-128-CBC with PKCS#7 padding and a zero IV
//! - **key**: master key material, version and expiry
//!
//! ## Security Model
//!
//! - One active 128-bit key encrypts every value and the whole store file
//! - Key material is generated from the OS CSPRNG: 16 characters drawn from a
//!   64-symbol alphabet, so 96 bits of entropy behind the 128-bit key
//! - Retired and dropped key material is zeroized
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the store file alone
//!
//! We do NOT defend against:
//! - Access to the config file, which holds the key material in cleartext
//! - Equality analysis: encryption is deterministic, so identical values
//!   produce identical ciphertext
//! - Compromised OS / memory inspection of a running process

pub mod cipher;
pub mod key;

pub use cipher::{normalize_key, Cipher};
pub use key::{MasterKey, DEFAULT_TTL_HOURS};
