use lockbox_core::StoreHealth;

use crate::app::AppContext;
use crate::cli::StatusArgs;
use crate::output::{rotation_text, status_json, OutputMode};

pub fn handle_rotate(ctx: &AppContext) -> anyhow::Result<()> {
    let summary = ctx.store()?.rotate()?;
    if !ctx.quiet() {
        println!("{}", rotation_text(&summary));
    }
    Ok(())
}

pub fn handle_status(ctx: &AppContext, args: &StatusArgs) -> anyhow::Result<()> {
    let status = ctx.store()?.status()?;
    if OutputMode::detect(args.json) == OutputMode::Json {
        println!("{}", serde_json::to_string_pretty(&status_json(&status))?);
        return Ok(());
    }

    println!("Store: {}", status.path.display());
    println!("Key version: {}", status.key_version);
    println!(
        "Key expires: {}{}",
        status.expires_at.to_rfc3339(),
        if status.expired { " (expired)" } else { "" }
    );
    println!("Secrets: {}", status.entries);
    match &status.health {
        StoreHealth::Healthy => println!("Health: OK"),
        StoreHealth::Unreadable {
            reason,
            quarantined_to,
        } => {
            println!("Health: UNREADABLE ({})", reason);
            match quarantined_to {
                Some(path) => println!("Previous file saved to {}", path.display()),
                None => println!("The previous file is copied aside on the next write."),
            }
        }
    }
    if status.expired && !ctx.quiet() {
        println!("Hint: Run `lockbox rotate` before adding secrets.");
    }
    Ok(())
}
