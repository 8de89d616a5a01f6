//! Output formatting for the CLI.
//!
//! Three modes:
//! - **Json**: machine-readable, selected by `--json`
//! - **Pretty**: bordered comfy-table output on a TTY
//! - **Plain**: tab-separated rows without a header when piped or `TERM=dumb`

use std::io::IsTerminal;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use lockbox_core::{RotationSummary, SearchHit, StoreHealth, StoreStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Json,
    Plain,
    Pretty,
}

impl OutputMode {
    /// `--json` always wins; otherwise pretty only on a capable terminal.
    pub fn resolve(json: bool, is_tty: bool, term_dumb: bool) -> Self {
        if json {
            Self::Json
        } else if is_tty && !term_dumb {
            Self::Pretty
        } else {
            Self::Plain
        }
    }

    /// Resolve against the real stdout and `TERM`.
    pub fn detect(json: bool) -> Self {
        let term_dumb = std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false);
        Self::resolve(json, std::io::stdout().is_terminal(), term_dumb)
    }
}

/// Render rows as a bordered table (pretty) or tab-separated lines (plain).
pub fn table(mode: OutputMode, headers: &[&str], rows: &[Vec<String>]) -> String {
    if mode == OutputMode::Pretty {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(headers.to_vec());
        for row in rows {
            table.add_row(row);
        }
        table.to_string()
    } else {
        rows.iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn search_hits_json(hits: &[SearchHit]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = hits
        .iter()
        .map(|hit| {
            if hit.revealed {
                serde_json::json!({
                    "name": hit.name,
                    "username": hit.field1,
                    "password": hit.field2,
                })
            } else {
                serde_json::json!({
                    "name": hit.name,
                    "ciphertext": hit.field1,
                })
            }
        })
        .collect();
    serde_json::Value::Array(items)
}

pub fn status_json(status: &StoreStatus) -> serde_json::Value {
    let (healthy, reason, quarantined_to) = match &status.health {
        StoreHealth::Healthy => (true, None, None),
        StoreHealth::Unreadable {
            reason,
            quarantined_to,
        } => (
            false,
            Some(reason.clone()),
            quarantined_to
                .as_ref()
                .map(|path| path.display().to_string()),
        ),
    };
    serde_json::json!({
        "path": status.path.display().to_string(),
        "key_version": status.key_version,
        "expires_at": status.expires_at.to_rfc3339(),
        "expired": status.expired,
        "entries": status.entries,
        "healthy": healthy,
        "unreadable_reason": reason,
        "quarantined_to": quarantined_to,
    })
}

pub fn rotation_text(summary: &RotationSummary) -> String {
    format!(
        "Rotated master key v{} -> v{} ({} secrets re-encrypted, expires {})",
        summary.old_version,
        summary.new_version,
        summary.reencrypted,
        summary.expires_at.to_rfc3339()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    #[test]
    fn test_json_exclusive() {
        assert_eq!(OutputMode::resolve(true, true, false), OutputMode::Json);
        assert_eq!(OutputMode::resolve(true, false, true), OutputMode::Json);
    }

    #[test]
    fn test_tty_gets_pretty() {
        assert_eq!(OutputMode::resolve(false, true, false), OutputMode::Pretty);
    }

    #[test]
    fn test_term_dumb_or_pipe_gets_plain() {
        assert_eq!(OutputMode::resolve(false, true, true), OutputMode::Plain);
        assert_eq!(OutputMode::resolve(false, false, false), OutputMode::Plain);
    }

    #[test]
    fn test_plain_table_is_tab_separated() {
        let rows = vec![
            vec!["mail".to_string(), "secret1".to_string()],
            vec!["bank".to_string(), "pin".to_string()],
        ];
        let rendered = table(OutputMode::Plain, &["Name", "Value"], &rows);
        assert_eq!(rendered, "mail\tsecret1\nbank\tpin");
    }

    #[test]
    fn test_pretty_table_has_header() {
        let rows = vec![vec!["mail".to_string()]];
        let rendered = table(OutputMode::Pretty, &["Name"], &rows);
        assert!(rendered.contains("Name"));
        assert!(rendered.contains("mail"));
    }

    #[test]
    fn test_status_json_reports_health() {
        let status = StoreStatus {
            path: PathBuf::from("/tmp/s.llk"),
            key_version: 3,
            expires_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            expired: false,
            entries: 2,
            health: StoreHealth::Unreadable {
                reason: "bad magic".to_string(),
                quarantined_to: None,
            },
        };
        let value = status_json(&status);
        assert_eq!(value["key_version"], 3);
        assert_eq!(value["healthy"], false);
        assert_eq!(value["unreadable_reason"], "bad magic");
        assert!(value["quarantined_to"].is_null());
    }

    #[test]
    fn test_search_hits_json_never_mixes_shapes() {
        let hits = vec![SearchHit {
            name: "svc|https://x|note".to_string(),
            field1: "alice".to_string(),
            field2: Some("p@ss".to_string()),
            revealed: true,
        }];
        let value = search_hits_json(&hits);
        assert_eq!(value[0]["username"], "alice");
        assert_eq!(value[0]["password"], "p@ss");
        assert!(value[0].get("ciphertext").is_none());
    }
}
