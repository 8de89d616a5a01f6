use std::path::Path;

use zeroize::Zeroizing;

use crate::app::AppContext;
use crate::cli::ImportArgs;

pub fn handle_import(ctx: &AppContext, args: &ImportArgs) -> anyhow::Result<()> {
    let rows = read_csv_rows(Path::new(&args.file))?;
    let summary = ctx.store()?.import_rows(rows.as_slice())?;
    if !ctx.quiet() {
        println!(
            "Imported {} secrets ({} rows skipped)",
            summary.imported, summary.skipped
        );
    }
    Ok(())
}

/// Read every CSV record, header included, as owned fields.
///
/// Records may have differing field counts; short rows are counted as
/// skipped by the store rather than rejected here.
fn read_csv_rows(path: &Path) -> anyhow::Result<Zeroizing<Vec<Vec<String>>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| anyhow::anyhow!("Failed to open CSV {}: {}", path.display(), e))?;

    let mut rows = Zeroizing::new(Vec::new());
    for record in reader.records() {
        let record = record
            .map_err(|e| anyhow::anyhow!("Failed to parse CSV {}: {}", path.display(), e))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<String>>());
    }
    Ok(rows)
}
