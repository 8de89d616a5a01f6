//! Command handlers, one module per command group.

mod import;
mod keys;
mod maintenance;
mod secrets;

pub use import::handle_import;
pub use keys::{handle_rotate, handle_status};
pub use maintenance::{handle_backup, handle_completions};
pub use secrets::{handle_add, handle_get, handle_list, handle_remove, handle_search};
