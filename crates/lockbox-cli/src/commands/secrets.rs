use secrecy::ExposeSecret;
use zeroize::Zeroizing;

use crate::app::AppContext;
use crate::cli::{AddArgs, GetArgs, ListArgs, RemoveArgs, SearchArgs};
use crate::helpers::read_secret_value;
use crate::output::{search_hits_json, table, OutputMode};

pub fn handle_add(ctx: &AppContext, args: &AddArgs) -> anyhow::Result<()> {
    let value = read_secret_value(args.value.as_deref())?;
    ctx.store()?.add(&args.name, &value)?;
    if !ctx.quiet() {
        println!("Stored {}", args.name);
    }
    Ok(())
}

pub fn handle_get(ctx: &AppContext, args: &GetArgs) -> anyhow::Result<()> {
    let store = ctx.store()?;
    if args.reveal {
        let value = store
            .reveal(&args.name)?
            .ok_or_else(|| anyhow::anyhow!("Secret not found: {}", args.name))?;
        println!("{}", value.expose_secret());
    } else {
        let ciphertext = store
            .get(&args.name)?
            .ok_or_else(|| anyhow::anyhow!("Secret not found: {}", args.name))?;
        println!("{}", ciphertext);
    }
    Ok(())
}

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let mode = OutputMode::detect(args.json);

    if !args.reveal {
        let names = store.list()?;
        if mode == OutputMode::Json {
            println!("{}", serde_json::to_string_pretty(&names)?);
        } else if names.is_empty() {
            if !ctx.quiet() {
                println!("No secrets stored.");
            }
        } else {
            let rows: Vec<Vec<String>> = names.into_iter().map(|name| vec![name]).collect();
            println!("{}", table(mode, &["Name"], &rows));
        }
        return Ok(());
    }

    let mut rows: Zeroizing<Vec<Vec<String>>> = Zeroizing::new(Vec::new());
    for entry in store.entries()? {
        let value = store.decrypt_value(&entry.ciphertext)?;
        rows.push(vec![entry.name, value.expose_secret().to_string()]);
    }

    if mode == OutputMode::Json {
        let items: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| serde_json::json!({ "name": row[0], "value": row[1] }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if rows.is_empty() {
        if !ctx.quiet() {
            println!("No secrets stored.");
        }
    } else {
        println!("{}", table(mode, &["Name", "Value"], &rows));
    }
    Ok(())
}

pub fn handle_remove(ctx: &AppContext, args: &RemoveArgs) -> anyhow::Result<()> {
    if !ctx.store()?.remove(&args.name)? {
        return Err(anyhow::anyhow!("Secret not found: {}", args.name));
    }
    if !ctx.quiet() {
        println!("Removed {}", args.name);
    }
    Ok(())
}

pub fn handle_search(ctx: &AppContext, args: &SearchArgs) -> anyhow::Result<()> {
    let hits = ctx.store()?.search(&args.keyword, args.reveal)?;
    let mode = OutputMode::detect(args.json);

    if mode == OutputMode::Json {
        println!("{}", serde_json::to_string_pretty(&search_hits_json(&hits))?);
        return Ok(());
    }
    if hits.is_empty() {
        if !ctx.quiet() {
            println!("No secrets match \"{}\".", args.keyword);
        }
        return Ok(());
    }

    let rendered = if args.reveal {
        let rows: Zeroizing<Vec<Vec<String>>> = Zeroizing::new(
            hits.iter()
                .map(|hit| {
                    vec![
                        hit.name.clone(),
                        hit.field1.clone(),
                        hit.field2.clone().unwrap_or_default(),
                    ]
                })
                .collect(),
        );
        table(mode, &["Name", "Username", "Password"], &rows)
    } else {
        let rows: Vec<Vec<String>> = hits
            .iter()
            .map(|hit| vec![hit.name.clone(), hit.field1.clone()])
            .collect();
        table(mode, &["Name", "Ciphertext"], &rows)
    };
    println!("{}", rendered);
    Ok(())
}
