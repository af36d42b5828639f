//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.normtag-compare.toml` files.

use crate::error::LumiError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".normtag-compare.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// brilcalc invocation settings.
    #[serde(default)]
    pub brilcalc: BrilcalcConfig,

    /// Normtags to compare.
    #[serde(default)]
    pub normtags: NormtagConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// brilcalc invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrilcalcConfig {
    /// Executable name or path.
    #[serde(default = "default_command")]
    pub command: String,

    /// Luminosity unit passed with `-u`.
    #[serde(default = "default_unit")]
    pub unit: String,

    /// Input dataset (JSON run/lumisection selection).
    #[serde(default = "default_input")]
    pub input: String,

    /// File name brilcalc writes its CSV report to.
    #[serde(default = "default_output_name")]
    pub output_name: String,
}

impl Default for BrilcalcConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            unit: default_unit(),
            input: default_input(),
            output_name: default_output_name(),
        }
    }
}

fn default_command() -> String {
    "brilcalc".to_string()
}

fn default_unit() -> String {
    "/nb".to_string()
}

fn default_input() -> String {
    "vdm2018.json".to_string()
}

fn default_output_name() -> String {
    "temp.csv".to_string()
}

/// Normtag list and optional per-normtag scale factors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormtagConfig {
    /// Normtags to measure, in invocation order.
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,

    /// Normalization factors passed to brilcalc with `-n`.
    #[serde(default = "default_scale_factors")]
    pub scale_factors: BTreeMap<String, f64>,
}

impl Default for NormtagConfig {
    fn default() -> Self {
        Self {
            labels: default_labels(),
            scale_factors: default_scale_factors(),
        }
    }
}

fn default_labels() -> Vec<String> {
    vec![
        "hfoc18PAS",
        "hfet18PAS",
        "pcc18PAS",
        "bcm1f18PAS",
        "pltReproc18PAS",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// Corrections for the pre-PAS normtags. The PAS normtags carry the final
// cross sections, so none of the default labels is scaled.
fn default_scale_factors() -> BTreeMap<String, f64> {
    [
        ("hfoc18v6", 805.9 / 803.99),
        ("hfet18v6", 2503.6 / 2508.09),
        ("pcc18v4", 5.982 / 5.99746),
        ("pltzero18v4Reproc", 261.8 / 259.98),
        ("bcm1fpcvd18test14", 197.84 / 198.53),
    ]
    .into_iter()
    .map(|(label, factor)| (label.to_string(), factor))
    .collect()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.brilcalc.input = input.display().to_string();
        }
        if let Some(ref command) = args.brilcalc {
            self.brilcalc.command = command.clone();
        }
        if let Some(ref unit) = args.unit {
            self.brilcalc.unit = unit.clone();
        }
        if let Some(ref labels) = args.normtags {
            self.normtags.labels = labels.clone();
        }
        for (label, factor) in &args.scale {
            self.normtags.scale_factors.insert(label.clone(), *factor);
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> std::result::Result<(), LumiError> {
        let labels = &self.normtags.labels;
        if labels.is_empty() {
            return Err(LumiError::InvalidConfig(
                "at least one normtag is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for label in labels {
            if label.trim().is_empty() {
                return Err(LumiError::InvalidConfig("empty normtag label".to_string()));
            }
            if !seen.insert(label.as_str()) {
                return Err(LumiError::InvalidConfig(format!(
                    "duplicate normtag '{}'",
                    label
                )));
            }
        }

        for (label, factor) in &self.normtags.scale_factors {
            if !factor.is_finite() || *factor <= 0.0 {
                return Err(LumiError::InvalidConfig(format!(
                    "scale factor for '{}' must be a positive number, got {}",
                    label, factor
                )));
            }
        }

        if self.brilcalc.output_name.is_empty() || self.brilcalc.output_name.contains('/') {
            return Err(LumiError::InvalidConfig(format!(
                "output_name must be a plain file name, got '{}'",
                self.brilcalc.output_name
            )));
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
