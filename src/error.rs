use std::path::PathBuf;

use thiserror::Error;

use crate::data::model::ExcludedFile;

/// Failures of the extraction pipeline.
///
/// Per-file variants are caught by the batch loop and turned into
/// [`ExcludedFile`] entries; only batch-level variants reach the caller.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("no files to extract from")]
    EmptyBatch,

    #[error("batch mixes {first} and {other} files ({})", path.display())]
    MixedFormats {
        first: &'static str,
        other: &'static str,
        path: PathBuf,
    },

    #[error("extraction target '{target}' does not apply to {kind} files")]
    TargetMismatch { target: String, kind: &'static str },

    #[error("malformed document {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse delimited text {}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read spreadsheet {}: {reason}", path.display())]
    Spreadsheet { path: PathBuf, reason: String },

    #[error("none of the {} file(s) produced data", excluded.len())]
    NothingExtracted { excluded: Vec<ExcludedFile> },
}

impl ExtractError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ExtractError::MalformedDocument {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = ExtractError> = std::result::Result<T, E>;
