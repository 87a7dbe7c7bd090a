//! Formatted output helpers for CLI commands.

use std::collections::BTreeMap;
use std::fmt::Write;

/// Renders variables as `KEY=VALUE` lines, quoting values that contain
/// whitespace or quotes.
#[must_use]
pub fn format_env(env: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in env {
        let needs_quotes = value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\'');
        if needs_quotes {
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            let _ = writeln!(out, "{key}=\"{escaped}\"");
        } else {
            let _ = writeln!(out, "{key}={value}");
        }
    }
    out
}
