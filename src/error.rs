//! Error types for the measurement pipeline.
//!
//! Every variant that can be tied to a normtag carries its label so the
//! fatal message printed by `main` names the offending source.

use std::num::ParseFloatError;
use thiserror::Error;

/// Errors raised while measuring, parsing, or aggregating luminosity.
#[derive(Error, Debug)]
pub enum LumiError {
    /// The report for a label never contained the `#nfill` marker.
    #[error("no luminosity total found for normtag '{label}' (missing #nfill summary)")]
    MissingEntry { label: String },

    /// The summary record after the marker is unusable.
    #[error("malformed summary record for normtag '{label}': {reason}")]
    MalformedRecord { label: String, reason: String },

    /// The total field is present but not a number.
    #[error("invalid luminosity total '{field}' for normtag '{label}': {source}")]
    InvalidTotal {
        label: String,
        field: String,
        #[source]
        source: ParseFloatError,
    },

    /// The total parsed, but is NaN or infinite.
    #[error("luminosity total '{field}' for normtag '{label}' is not a finite number")]
    NonFiniteTotal { label: String, field: String },

    /// A mean or deviation overflowed or became NaN.
    #[error("{0} is not a finite number")]
    NonFiniteResult(String),

    /// Mean luminosity is exactly zero, so deviations are undefined.
    #[error("mean luminosity is zero; percentage deviation is undefined")]
    ZeroMean,

    /// Aggregation asked to run over no labels.
    #[error("no normtags to aggregate")]
    EmptyResults,

    /// The external tool could not be started or exited unsuccessfully.
    #[error("brilcalc failed for normtag '{label}': {detail}")]
    CollaboratorFailed { label: String, detail: String },

    /// Temporary report handling failed.
    #[error("I/O error for normtag '{label}': {source}")]
    Io {
        label: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience Result type for the pipeline.
pub type Result<T> = std::result::Result<T, LumiError>;
