//! Parsing of brilcalc CSV summary output.
//!
//! brilcalc ends its CSV output with a summary block:
//!
//! ```text
//! #Summary:
//! #nfill,nrun,nls,ncms,totdelivered(/nb),totrecorded(/nb)
//! #1,1,264,264,85.318,85.318
//! ```
//!
//! The total we want is field 4 of the record that follows the `#nfill` header.

use crate::error::{LumiError, Result};
use tracing::debug;

/// Marker that starts the summary header line.
pub const SUMMARY_MARKER: &str = "#nfill";

/// Zero-based index of the total luminosity field in the summary record.
pub const TOTAL_FIELD_INDEX: usize = 4;

/// Extract the integrated luminosity total from a brilcalc report.
///
/// Returns `Ok(None)` when the report has no summary marker at all. Only the
/// first marker is consulted.
pub fn parse_total(label: &str, report: &str) -> Result<Option<f64>> {
    let mut lines = report.lines();

    while let Some(line) = lines.next() {
        if !line.starts_with(SUMMARY_MARKER) {
            continue;
        }

        let record = lines.next().ok_or_else(|| LumiError::MalformedRecord {
            label: label.to_string(),
            reason: "report ends right after the #nfill header".to_string(),
        })?;

        return parse_record(label, record).map(Some);
    }

    debug!(label = label, "no {} marker in report", SUMMARY_MARKER);
    Ok(None)
}

/// Parse the total out of a single comma-separated summary record.
fn parse_record(label: &str, record: &str) -> Result<f64> {
    let fields: Vec<&str> = record.split(',').collect();

    let field = fields
        .get(TOTAL_FIELD_INDEX)
        .ok_or_else(|| LumiError::MalformedRecord {
            label: label.to_string(),
            reason: format!(
                "expected at least {} fields, found {}",
                TOTAL_FIELD_INDEX + 1,
                fields.len()
            ),
        })?
        .trim();

    let value = field.parse::<f64>().map_err(|source| LumiError::InvalidTotal {
        label: label.to_string(),
        field: field.to_string(),
        source,
    })?;

    // f64 parsing accepts "nan" and "inf"
    if !value.is_finite() {
        return Err(LumiError::NonFiniteTotal {
            label: label.to_string(),
            field: field.to_string(),
        });
    }

    Ok(value)
}
