use std::io::IsTerminal;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::app::{missing_store_message, AppContext};
use crate::cli::{BackupArgs, Cli};

pub fn handle_backup(ctx: &AppContext, args: &BackupArgs) -> anyhow::Result<()> {
    let source = ctx.store_path()?;
    if !source.exists() {
        return Err(anyhow::anyhow!(missing_store_message(&source)));
    }
    if std::io::stdin().is_terminal() && !ctx.quiet() {
        let proceed = dialoguer::Confirm::new()
            .with_prompt(format!("Back up store to {}?", args.destination))
            .default(true)
            .interact()?;
        if !proceed {
            return Err(anyhow::anyhow!("Backup cancelled"));
        }
    }
    let count = lockbox_core::fs::copy_atomic(&source, Path::new(&args.destination))?;
    if count == 0 {
        return Err(anyhow::anyhow!("Backup failed: zero bytes written"));
    }
    if !ctx.quiet() {
        println!("Backed up store to {}", args.destination);
    }
    Ok(())
}

pub fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "lockbox", &mut std::io::stdout());
}
