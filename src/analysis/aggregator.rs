//! Mean and deviation computation.
//!
//! This module turns the per-normtag measurements into a report of each
//! normtag's deviation from the average.

use crate::error::{LumiError, Result};
use crate::models::{DeviationEntry, DeviationReport, LumiResults};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::debug;

/// Report metadata that does not come from the measurements themselves.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub input: &'a str,
    pub unit: &'a str,
    pub scale_factors: &'a BTreeMap<String, f64>,
}

/// Arithmetic mean of a set of values.
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(LumiError::EmptyResults);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if !mean.is_finite() {
        return Err(LumiError::NonFiniteResult("mean luminosity".to_string()));
    }
    Ok(mean)
}

/// Signed percentage deviation of `value` from `mean`.
pub fn deviation_percent(value: f64, mean: f64) -> Result<f64> {
    if mean == 0.0 {
        return Err(LumiError::ZeroMean);
    }
    let pct = 100.0 * (value - mean) / mean;
    if !pct.is_finite() {
        return Err(LumiError::NonFiniteResult(format!(
            "deviation of {} from mean {}",
            value, mean
        )));
    }
    // -0.0 would print as "-0.0%"
    Ok(if pct == 0.0 { 0.0 } else { pct })
}

/// Collect the value of every configured label, in configuration order.
///
/// Fails on the first label with no measurement.
pub fn collect_values(labels: &[String], results: &LumiResults) -> Result<Vec<f64>> {
    labels
        .iter()
        .map(|label| {
            results.get(label).ok_or_else(|| LumiError::MissingEntry {
                label: label.clone(),
            })
        })
        .collect()
}

/// Build the deviation report for the configured labels.
pub fn build_report(
    labels: &[String],
    results: &LumiResults,
    ctx: ReportContext<'_>,
) -> Result<DeviationReport> {
    let values = collect_values(labels, results)?;
    let mean = mean(&values)?;
    debug!(mean = mean, count = values.len(), "computed mean luminosity");

    let mut sorted: Vec<(&String, f64)> = labels.iter().zip(values).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let entries = sorted
        .into_iter()
        .map(|(label, value)| -> Result<DeviationEntry> {
            Ok(DeviationEntry {
                label: label.clone(),
                value,
                deviation_percent: deviation_percent(value, mean)?,
                scale_factor: ctx.scale_factors.get(label).copied(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DeviationReport {
        generated_at: Utc::now(),
        input: ctx.input.to_string(),
        unit: ctx.unit.to_string(),
        mean,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn results(pairs: &[(&str, f64)]) -> LumiResults {
        pairs.iter().map(|(l, v)| (l.to_string(), *v)).collect()
    }

    fn build(names: &[&str], pairs: &[(&str, f64)]) -> Result<DeviationReport> {
        let scale_factors = BTreeMap::new();
        build_report(
            &labels(names),
            &results(pairs),
            ReportContext {
                input: "vdm2018.json",
                unit: "/nb",
                scale_factors: &scale_factors,
            },
        )
    }

    #[test]
    fn test_mean_and_deviation_sum() {
        let values = [85.3, 86.1, 84.9, 85.7, 86.4];
        let m = mean(&values).unwrap();
        assert!((m - 85.68).abs() < 1e-9);

        let residual: f64 = values.iter().map(|v| v - m).sum();
        assert!(residual.abs() < 1e-9);
    }

    #[test]
    fn test_mean_empty_is_error() {
        assert!(matches!(mean(&[]), Err(LumiError::EmptyResults)));
    }

    #[test]
    fn test_deviation_at_mean_is_positive_zero() {
        let pct = deviation_percent(200.0, 200.0).unwrap();
        assert_eq!(pct, 0.0);
        assert!(pct.is_sign_positive());

        let pct = deviation_percent(-5.0, -5.0).unwrap();
        assert!(pct.is_sign_positive());
    }

    #[test]
    fn test_zero_mean_is_error() {
        assert!(matches!(
            deviation_percent(1.0, 0.0),
            Err(LumiError::ZeroMean)
        ));

        let err = build(&["a", "b"], &[("a", -10.0), ("b", 10.0)]).unwrap_err();
        assert!(matches!(err, LumiError::ZeroMean));
    }

    #[test]
    fn test_overflowing_mean_is_error() {
        assert!(matches!(
            mean(&[f64::MAX, f64::MAX]),
            Err(LumiError::NonFiniteResult(_))
        ));

        let err = build(&["a", "b"], &[("a", f64::MAX), ("b", f64::MAX)]).unwrap_err();
        assert!(matches!(err, LumiError::NonFiniteResult(_)));
    }

    #[test]
    fn test_non_finite_inputs_rejected() {
        assert!(matches!(
            mean(&[f64::NAN, 1.0]),
            Err(LumiError::NonFiniteResult(_))
        ));
        assert!(matches!(
            deviation_percent(f64::INFINITY, 1.0),
            Err(LumiError::NonFiniteResult(_))
        ));
    }

    #[test]
    fn test_two_label_report() {
        let report = build(&["a", "b"], &[("a", 100.0), ("b", 300.0)]).unwrap();
        assert_eq!(report.mean, 200.0);
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].label, "a");
        assert_eq!(report.entries[0].deviation_percent, -50.0);
        assert_eq!(report.entries[1].label, "b");
        assert_eq!(report.entries[1].deviation_percent, 50.0);
    }

    #[test]
    fn test_entries_sorted_regardless_of_label_order() {
        let report = build(
            &["pltReproc18PAS", "hfoc18PAS", "bcm1f18PAS"],
            &[
                ("pltReproc18PAS", 3.0),
                ("hfoc18PAS", 2.0),
                ("bcm1f18PAS", 1.0),
            ],
        )
        .unwrap();
        let order: Vec<&str> = report.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(order, vec!["bcm1f18PAS", "hfoc18PAS", "pltReproc18PAS"]);
    }

    #[test]
    fn test_missing_label_fails() {
        let err = build(&["a", "b", "c"], &[("a", 1.0), ("c", 3.0)]).unwrap_err();
        assert!(matches!(err, LumiError::MissingEntry { ref label } if label == "b"));
    }

    #[test]
    fn test_empty_labels_fail() {
        let err = build(&[], &[]).unwrap_err();
        assert!(matches!(err, LumiError::EmptyResults));
    }

    #[test]
    fn test_scale_factor_recorded_in_entry() {
        let mut scale_factors = BTreeMap::new();
        scale_factors.insert("b".to_string(), 2.0);
        let report = build_report(
            &labels(&["a", "b"]),
            &results(&[("a", 1.0), ("b", 1.0)]),
            ReportContext {
                input: "in.json",
                unit: "/nb",
                scale_factors: &scale_factors,
            },
        )
        .unwrap();
        assert_eq!(report.entries[0].scale_factor, None);
        assert_eq!(report.entries[1].scale_factor, Some(2.0));
    }
}
