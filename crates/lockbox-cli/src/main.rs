//! Lockbox CLI - A local, encrypted credential store
//!
//! This is the command-line interface for Lockbox. It resolves the config and
//! store paths, opens the store and dispatches to the command handlers.

mod app;
mod cli;
mod commands;
mod config;
mod helpers;
mod output;
mod settings;

use clap::Parser;
use lockbox_core::LockboxError;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("Error: {:#}", err);
        if let Some(hint) = error_hint(&err) {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = AppContext::new(cli);
    match &cli.command {
        Commands::Add(args) => commands::handle_add(&ctx, args),
        Commands::Get(args) => commands::handle_get(&ctx, args),
        Commands::List(args) => commands::handle_list(&ctx, args),
        Commands::Remove(args) => commands::handle_remove(&ctx, args),
        Commands::Import(args) => commands::handle_import(&ctx, args),
        Commands::Search(args) => commands::handle_search(&ctx, args),
        Commands::Rotate => commands::handle_rotate(&ctx),
        Commands::Status(args) => commands::handle_status(&ctx, args),
        Commands::Backup(args) => commands::handle_backup(&ctx, args),
        Commands::Completions { shell } => {
            commands::handle_completions(*shell);
            Ok(())
        }
    }
}

/// Initialize the tracing subscriber on stderr. `RUST_LOG` overrides `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn error_hint(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<LockboxError>()? {
        LockboxError::KeyExpired { .. } => Some("Run `lockbox rotate` to issue a new master key."),
        LockboxError::MalformedStoreFile(_) | LockboxError::InvalidCiphertext(_) => {
            Some("Check `lockbox status`; restore the store from a backup if it stays unreadable.")
        }
        _ => None,
    }
}
