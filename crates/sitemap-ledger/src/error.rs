//! Error type shared by every pipeline stage.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Failures raised while fetching, parsing, merging or partitioning.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to fetch sitemap {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("failed to parse sitemap {url}: {reason}")]
    Parse { url: String, reason: String },
    #[error("sitemap {url} has an entry without <{element}>")]
    MissingElement { url: String, element: &'static str },
    #[error("date format not recognized: {0:?}")]
    DateFormat(String),
    #[error("malformed master file {} at row {line}: {reason}", path.display())]
    MasterFormat {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl LedgerError {
    /// Process exit code reported when this error aborts a top-level sitemap.
    pub fn exit_code(&self) -> u8 {
        match self {
            LedgerError::Config(_) => 2,
            LedgerError::Fetch { .. } => 3,
            LedgerError::Parse { .. } => 4,
            LedgerError::MissingElement { .. } => 5,
            LedgerError::DateFormat(_) => 6,
            LedgerError::MasterFormat { .. } | LedgerError::Io(_) | LedgerError::Csv(_) => 7,
        }
    }

    /// Short machine-readable name, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Fetch { .. } => "fetch",
            LedgerError::Parse { .. } => "parse",
            LedgerError::MissingElement { .. } => "missing_element",
            LedgerError::DateFormat(_) => "date_format",
            LedgerError::MasterFormat { .. } => "master_format",
            LedgerError::Config(_) => "config",
            LedgerError::Io(_) => "io",
            LedgerError::Csv(_) => "csv",
        }
    }
}
