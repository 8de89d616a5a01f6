//! Input helper functions for the CLI.

use std::io::{self, IsTerminal, Read};

use dialoguer::Password;
use zeroize::Zeroizing;

/// Resolve a secret value: explicit argument, then `LOCKBOX_VALUE`, then a
/// hidden prompt on a TTY, then stdin.
pub fn read_secret_value(explicit: Option<&str>) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = explicit {
        return Ok(Zeroizing::new(value.to_string()));
    }
    if let Ok(value) = std::env::var("LOCKBOX_VALUE") {
        if !value.is_empty() {
            return Ok(Zeroizing::new(value));
        }
    }
    if io::stdin().is_terminal() {
        let value = Password::new()
            .with_prompt("Secret value")
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read secret value: {}", e))?;
        return Ok(Zeroizing::new(value));
    }

    let mut buffer = Zeroizing::new(String::new());
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to read secret value from stdin: {}", e))?;
    let trimmed = Zeroizing::new(trim_line_ending(&buffer).to_string());
    if trimmed.is_empty() {
        return Err(anyhow::anyhow!(
            "No secret value provided. Pass it as an argument, set LOCKBOX_VALUE, or pipe it on stdin."
        ));
    }
    Ok(trimmed)
}

/// Strip one trailing newline left by `echo` or heredocs.
fn trim_line_ending(value: &str) -> &str {
    value
        .strip_suffix("\r\n")
        .or_else(|| value.strip_suffix('\n'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_value_wins() {
        let value = read_secret_value(Some("hunter2")).unwrap();
        assert_eq!(value.as_str(), "hunter2");
    }

    #[test]
    fn test_trim_line_ending() {
        assert_eq!(trim_line_ending("secret\n"), "secret");
        assert_eq!(trim_line_ending("secret\r\n"), "secret");
        assert_eq!(trim_line_ending("a b \n\n"), "a b \n");
        assert_eq!(trim_line_ending("plain"), "plain");
    }
}
