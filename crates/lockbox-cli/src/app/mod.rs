//! Application-level utilities for the Lockbox CLI.
//!
//! This module provides:
//! - Path resolution for config and store files
//! - The per-invocation context that opens the store lazily

mod context;
mod resolver;

pub use context::AppContext;
pub use resolver::{missing_store_message, resolve_config_path, resolve_store_path};
