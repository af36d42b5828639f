//! normtag-compare - luminosity agreement across brilcalc normtags
//!
//! Runs brilcalc over one input dataset with each configured normtag, then
//! reports every normtag's integrated luminosity and its percentage
//! deviation from the mean of all of them.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (configuration, brilcalc failure, missing or bad summary)

mod analysis;
mod brilcalc;
mod cli;
mod config;
mod driver;
mod error;
mod models;
mod report;

use anyhow::{Context, Result};
use brilcalc::{BrilcalcOptions, BrilcalcTool};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use driver::{Driver, DriverConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("normtag-compare v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args, &config) {
        error!("Comparison failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default configuration file.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout carries only the report.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        Config::load(config_path)?
    } else {
        match Config::load_default() {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(e) => {
                eprintln!("Warning: ignoring {}: {:#}", CONFIG_FILE_NAME, e);
                Config::default()
            }
        }
    };

    config.merge_with_args(args);
    config.validate()?;
    Ok(config)
}

/// Measure every normtag and print the deviation report.
fn run(args: &Args, config: &Config) -> Result<()> {
    let tool = BrilcalcTool::new(BrilcalcOptions {
        command: PathBuf::from(&config.brilcalc.command),
        unit: config.brilcalc.unit.clone(),
    });

    let driver = Driver::new(
        &tool,
        DriverConfig {
            input: PathBuf::from(&config.brilcalc.input),
            output_name: config.brilcalc.output_name.clone(),
            keep_reports: args.keep_reports.clone(),
            show_progress: !args.quiet,
        },
    );

    let labels = &config.normtags.labels;
    let scale_factors = &config.normtags.scale_factors;

    if args.dry_run {
        for command in driver.plan(labels, scale_factors) {
            println!("{}", command);
        }
        return Ok(());
    }

    if !Path::new(&config.brilcalc.input).exists() {
        warn!("Input {} does not exist locally", config.brilcalc.input);
    }

    // JSON on stdout must stay parseable
    match args.format {
        OutputFormat::Text => println!("Getting lumi, please wait..."),
        OutputFormat::Json => eprintln!("Getting lumi, please wait..."),
    }
    let results = driver.collect(labels, scale_factors)?;

    if results.is_empty() {
        warn!("No normtag produced a luminosity summary");
    }
    debug!("Measured {} of {} normtags", results.len(), labels.len());
    for (label, value) in results.iter() {
        debug!("  {} = {}", label, value);
    }

    let report = analysis::build_report(
        labels,
        &results,
        analysis::ReportContext {
            input: &config.brilcalc.input,
            unit: &config.brilcalc.unit,
            scale_factors,
        },
    )?;

    info!(
        "Mean: {:.3} {}, largest deviation {:.1}%",
        report.mean,
        report.unit,
        report.max_abs_deviation()
    );

    let output = match args.format {
        OutputFormat::Text => report::generate_text_report(&report),
        OutputFormat::Json => report::generate_json_report(&report)?,
    };

    print!("{}", output);
    if args.format == OutputFormat::Json {
        println!();
    }

    if let Some(ref path) = args.output {
        report::write_report(&output, path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report saved to: {}", path.display());
    }

    Ok(())
}
