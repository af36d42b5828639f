//! Report rendering.
//!
//! The text format is one line per normtag:
//! `<label> <value:.3> <deviation:+.1>%`.

use crate::models::{DeviationEntry, DeviationReport};
use anyhow::Result;
use std::path::Path;

/// Format a single report line.
pub fn format_entry(entry: &DeviationEntry) -> String {
    format!(
        "{} {:.3} {:+.1}%",
        entry.label, entry.value, entry.deviation_percent
    )
}

/// Generate the plain-text report, one line per entry.
pub fn generate_text_report(report: &DeviationReport) -> String {
    let mut output = String::new();
    for entry in &report.entries {
        output.push_str(&format_entry(entry));
        output.push('\n');
    }
    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DeviationReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)?;
    Ok(())
}
