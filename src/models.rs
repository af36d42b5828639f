//! Data models for the luminosity comparison.
//!
//! This module contains the result mapping filled in by the driver and the
//! report structures produced by the aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Measured luminosity per normtag.
///
/// Keys iterate in ascending lexicographic order, which is the order the
/// report is printed in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LumiResults {
    values: BTreeMap<String, f64>,
}

impl LumiResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the measurement for a label, returning the previous value if any.
    pub fn insert(&mut self, label: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(label.into(), value)
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.values.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(label, value)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, f64)> for LumiResults {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// One line of the deviation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationEntry {
    /// Normtag label.
    pub label: String,
    /// Integrated luminosity reported by brilcalc.
    pub value: f64,
    /// Signed deviation from the mean, in percent.
    pub deviation_percent: f64,
    /// Scale factor passed to brilcalc, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_factor: Option<f64>,
}

/// The complete comparison across normtags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviationReport {
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Input dataset passed to brilcalc.
    pub input: String,
    /// Luminosity unit of every value.
    pub unit: String,
    /// Mean luminosity across all normtags.
    pub mean: f64,
    /// Entries in ascending label order.
    pub entries: Vec<DeviationEntry>,
}

impl DeviationReport {
    /// Largest absolute deviation across entries.
    pub fn max_abs_deviation(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| e.deviation_percent.abs())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_iterate_sorted() {
        let mut results = LumiResults::new();
        results.insert("pcc18PAS", 3.0);
        results.insert("bcm1f18PAS", 1.0);
        results.insert("hfoc18PAS", 2.0);

        let labels: Vec<&str> = results.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["bcm1f18PAS", "hfoc18PAS", "pcc18PAS"]);
    }

    #[test]
    fn test_results_insert_replaces() {
        let mut results = LumiResults::new();
        assert_eq!(results.insert("a", 1.0), None);
        assert_eq!(results.insert("a", 2.0), Some(1.0));
        assert_eq!(results.get("a"), Some(2.0));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_max_abs_deviation() {
        let report = DeviationReport {
            generated_at: Utc::now(),
            input: "vdm2018.json".to_string(),
            unit: "/nb".to_string(),
            mean: 200.0,
            entries: vec![
                DeviationEntry {
                    label: "a".to_string(),
                    value: 100.0,
                    deviation_percent: -50.0,
                    scale_factor: None,
                },
                DeviationEntry {
                    label: "b".to_string(),
                    value: 260.0,
                    deviation_percent: 30.0,
                    scale_factor: None,
                },
            ],
        };
        assert_eq!(report.max_abs_deviation(), 50.0);
    }
}
