//! Store payload model and binary encoding.

mod codec;
pub mod table;

pub use table::{SecretEntry, SecretTable, FORMAT_VERSION, MAGIC};
