//! Measurement driver.
//!
//! Runs the luminosity tool once per normtag, in configuration order, and
//! collects the extracted totals. Each run writes into its own temporary
//! directory, which is removed when the run finishes, on success or failure.

use crate::brilcalc::{parse_total, LumiRequest, LumiTool};
use crate::error::{LumiError, Result};
use crate::models::LumiResults;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Settings for a measurement pass.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Input dataset passed to every invocation.
    pub input: PathBuf,
    /// File name of the per-run report inside its temporary directory.
    pub output_name: String,
    /// If set, raw reports are copied here as `<label>.csv`.
    pub keep_reports: Option<PathBuf>,
    /// Show a spinner while the tool runs.
    pub show_progress: bool,
}

/// Drives the luminosity tool over a list of normtags.
pub struct Driver<'a, T: LumiTool> {
    tool: &'a T,
    config: DriverConfig,
}

impl<'a, T: LumiTool> Driver<'a, T> {
    pub fn new(tool: &'a T, config: DriverConfig) -> Self {
        Self { tool, config }
    }

    /// Measure every label. Labels whose report has no summary are left out
    /// of the returned results.
    pub fn collect(
        &self,
        labels: &[String],
        scale_factors: &BTreeMap<String, f64>,
    ) -> Result<LumiResults> {
        let mut results = LumiResults::new();

        for (label, factor) in scale_factors {
            if !labels.contains(label) {
                debug!("Scale factor for {} ({}) is not used", label, factor);
            }
        }

        let spinner = self.spinner();

        for label in labels {
            if let Some(ref pb) = spinner {
                pb.set_message(format!("measuring {}", label));
            }

            let scale_factor = scale_factors.get(label).copied();
            match self.measure_one(label, scale_factor)? {
                Some(value) => {
                    info!("{}: {} (scale factor: {:?})", label, value, scale_factor);
                    results.insert(label.clone(), value);
                }
                None => warn!("No luminosity summary in report for {}", label),
            }
        }

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        Ok(results)
    }

    /// Run the tool for a single label and parse its report.
    pub fn measure_one(&self, label: &str, scale_factor: Option<f64>) -> Result<Option<f64>> {
        let io_err = |source: std::io::Error| LumiError::Io {
            label: label.to_string(),
            source,
        };

        let workdir = TempDir::new().map_err(io_err)?;
        let output = workdir.path().join(&self.config.output_name);

        let request = LumiRequest {
            label,
            input: &self.config.input,
            output: &output,
            scale_factor,
        };
        self.tool.measure(&request)?;

        let report = match fs::read_to_string(&output) {
            Ok(report) => report,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Tool wrote no report for {} at {}", label, output.display());
                return Ok(None);
            }
            Err(e) => return Err(io_err(e)),
        };

        if let Some(ref dir) = self.config.keep_reports {
            self.keep_report(dir, label, &output)?;
        }

        parse_total(label, &report)
    }

    /// Command lines that `collect` would run, without running them.
    pub fn plan(&self, labels: &[String], scale_factors: &BTreeMap<String, f64>) -> Vec<String> {
        let output = PathBuf::from(&self.config.output_name);
        labels
            .iter()
            .map(|label| {
                self.tool.describe(&LumiRequest {
                    label,
                    input: &self.config.input,
                    output: &output,
                    scale_factor: scale_factors.get(label).copied(),
                })
            })
            .collect()
    }

    fn keep_report(&self, dir: &Path, label: &str, report: &Path) -> Result<()> {
        let io_err = |source: std::io::Error| LumiError::Io {
            label: label.to_string(),
            source,
        };
        fs::create_dir_all(dir).map_err(io_err)?;
        let target = dir.join(format!("{}.csv", label));
        fs::copy(report, &target).map_err(io_err)?;
        debug!("Kept report for {} at {}", label, target.display());
        Ok(())
    }

    fn spinner(&self) -> Option<ProgressBar> {
        if !self.config.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }
}
