//! brilcalc invocation.
//!
//! This module runs `brilcalc lumi` for one normtag at a time. Arguments are
//! passed as an explicit vector, never through a shell.

use crate::error::{LumiError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// One measurement request for the collaborator.
#[derive(Debug, Clone)]
pub struct LumiRequest<'a> {
    /// Normtag to measure with.
    pub label: &'a str,
    /// Input dataset (brilcalc `-i`).
    pub input: &'a Path,
    /// Where brilcalc should write its CSV report.
    pub output: &'a Path,
    /// Optional normalization factor (brilcalc `-n`).
    pub scale_factor: Option<f64>,
}

/// Something that can produce a luminosity report for a normtag.
///
/// Implementations write the report to `request.output`.
pub trait LumiTool {
    fn measure(&self, request: &LumiRequest<'_>) -> Result<()>;

    /// Human-readable command line for a request (used by dry runs).
    fn describe(&self, request: &LumiRequest<'_>) -> String;
}

/// Options for running brilcalc.
#[derive(Debug, Clone)]
pub struct BrilcalcOptions {
    /// Executable to run.
    pub command: PathBuf,
    /// Luminosity unit (brilcalc `-u`).
    pub unit: String,
}

impl Default for BrilcalcOptions {
    fn default() -> Self {
        Self {
            command: PathBuf::from("brilcalc"),
            unit: "/nb".to_string(),
        }
    }
}

/// Runs the real `brilcalc` executable.
#[derive(Debug, Clone, Default)]
pub struct BrilcalcTool {
    options: BrilcalcOptions,
}

impl BrilcalcTool {
    pub fn new(options: BrilcalcOptions) -> Self {
        Self { options }
    }

    /// Build the argument vector for a request.
    pub fn args(&self, request: &LumiRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "lumi".into(),
            "-u".into(),
            self.options.unit.clone().into(),
            "-i".into(),
            request.input.as_os_str().to_owned(),
            "--normtag".into(),
            request.label.into(),
            "-o".into(),
            request.output.as_os_str().to_owned(),
        ];

        if let Some(factor) = request.scale_factor {
            args.push("-n".into());
            args.push(format_scale(factor).into());
        }

        args
    }
}

impl LumiTool for BrilcalcTool {
    fn measure(&self, request: &LumiRequest<'_>) -> Result<()> {
        info!("Running brilcalc for normtag: {}", request.label);
        debug!("Command: {}", self.describe(request));

        let output = Command::new(&self.options.command)
            .args(self.args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| LumiError::CollaboratorFailed {
                label: request.label.to_string(),
                detail: format!(
                    "could not execute {}: {}",
                    self.options.command.display(),
                    e
                ),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            debug!("brilcalc: {}", line);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LumiError::CollaboratorFailed {
                label: request.label.to_string(),
                detail: failure_detail(&output.status.to_string(), &stdout, &stderr),
            });
        }

        debug!(
            label = request.label,
            stdout_bytes = output.stdout.len(),
            "brilcalc finished"
        );
        Ok(())
    }

    fn describe(&self, request: &LumiRequest<'_>) -> String {
        let mut parts = vec![self.options.command.display().to_string()];
        parts.extend(
            self.args(request)
                .iter()
                .map(|a| a.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

/// Lines of stdout kept in a failure message when stderr is empty.
const STDOUT_TAIL_LINES: usize = 5;

/// Build the failure message for a non-zero exit.
///
/// brilcalc prints most of its complaints to stdout, so the tail of stdout
/// stands in when stderr has nothing.
fn failure_detail(status: &str, stdout: &str, stderr: &str) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return format!("{} ({})", status, stderr);
    }

    let lines: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return status.to_string();
    }
    let tail = &lines[lines.len().saturating_sub(STDOUT_TAIL_LINES)..];
    format!("{} ({})", status, tail.join(" | "))
}

/// Format a scale factor the way it is handed to `-n`.
///
/// Rounds to 12 significant digits, then prints the shortest representation
/// with a decimal point, e.g. `1.00237565144` or `2.0`.
pub fn format_scale(factor: f64) -> String {
    let rounded = format!("{:.11e}", factor)
        .parse::<f64>()
        .unwrap_or(factor);
    format!("{:?}", rounded)
}
