//! # Lockbox Core
//!
//! Core library for Lockbox - a local, single-operator encrypted credential store.
//!
//! This crate provides the cipher, the master key lifecycle, the store file
//! format and the credential store manager, independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **crypto**: AES-128-CBC cipher and master key material
//! - **storage**: secret table and its versioned binary payload
//! - **settings**: key/value collaborator holding master key metadata
//! - **store**: lifecycle (generate, expire, rotate) and CRUD/search/import
//! - **fs**: atomic file replacement

pub mod crypto;
pub mod error;
pub mod fs;
pub mod settings;
pub mod storage;
pub mod store;

pub use error::{LockboxError, Result};
pub use settings::{MemorySettings, SettingsStore};
pub use storage::{SecretEntry, SecretTable};
pub use store::{CredentialStore, ImportSummary, RotationSummary, SearchHit, StoreHealth, StoreStatus};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
