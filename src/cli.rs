//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// normtag-compare - luminosity agreement across brilcalc normtags
///
/// Runs brilcalc once per normtag over the same input dataset, then prints
/// each normtag's integrated luminosity and its deviation from the mean.
///
/// Examples:
///   normtag-compare
///   normtag-compare -i vdm2018.json --normtags hfoc18PAS,pcc18PAS
///   normtag-compare --scale hfoc18v6=1.0024 --normtags hfoc18v6,pcc18v4
///   normtag-compare --dry-run
///   normtag-compare --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Input dataset passed to brilcalc (-i)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Normtags to compare (comma-separated)
    ///
    /// Example: --normtags hfoc18PAS,pcc18PAS
    #[arg(long, value_name = "TAGS", value_delimiter = ',')]
    pub normtags: Option<Vec<String>>,

    /// Scale factor for a normtag, passed to brilcalc as -n
    ///
    /// May be repeated. Example: --scale hfoc18v6=1.0024
    #[arg(long, value_name = "TAG=FACTOR", value_parser = parse_scale)]
    pub scale: Vec<(String, f64)>,

    /// Luminosity unit (brilcalc -u)
    #[arg(short, long, value_name = "UNIT")]
    pub unit: Option<String>,

    /// brilcalc executable
    #[arg(long, value_name = "PATH", env = "BRILCALC")]
    pub brilcalc: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .normtag-compare.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Also write the report to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Copy each raw brilcalc report into this directory
    #[arg(long, value_name = "DIR")]
    pub keep_reports: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the brilcalc commands that would run, then exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .normtag-compare.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line per normtag (default)
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Parse a `TAG=FACTOR` pair.
fn parse_scale(s: &str) -> Result<(String, f64), String> {
    let (label, factor) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TAG=FACTOR, got '{}'", s))?;

    let label = label.trim();
    if label.is_empty() {
        return Err(format!("missing normtag in '{}'", s));
    }

    let factor: f64 = factor
        .trim()
        .parse()
        .map_err(|e| format!("invalid scale factor in '{}': {}", s, e))?;

    Ok((label.to_string(), factor))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref normtags) = self.normtags {
            if normtags.iter().any(|t| t.trim().is_empty()) {
                return Err("--normtags contains an empty entry".to_string());
            }
        }

        if let Some(ref dir) = self.keep_reports {
            if dir.exists() && !dir.is_dir() {
                return Err(format!(
                    "--keep-reports path is not a directory: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: None,
            normtags: None,
            scale: Vec::new(),
            unit: None,
            brilcalc: None,
            config: None,
            format: OutputFormat::Text,
            output: None,
            keep_reports: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_scale() {
        assert_eq!(
            parse_scale("hfoc18v6=1.5").unwrap(),
            ("hfoc18v6".to_string(), 1.5)
        );
        assert!(parse_scale("hfoc18v6").is_err());
        assert!(parse_scale("=1.5").is_err());
        assert!(parse_scale("hfoc18v6=abc").is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let args = Args::try_parse_from([
            "normtag-compare",
            "-i",
            "fill6868.json",
            "--normtags",
            "a,b,c",
            "--scale",
            "a=2.0",
            "--scale",
            "b=0.5",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.input, Some(PathBuf::from("fill6868.json")));
        assert_eq!(
            args.normtags,
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(
            args.scale,
            vec![("a".to_string(), 2.0), ("b".to_string(), 0.5)]
        );
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_empty_normtag() {
        let mut args = make_args();
        args.normtags = Some(vec!["a".to_string(), " ".to_string()]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
