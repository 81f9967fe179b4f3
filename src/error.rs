use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------
//
// Two failure domains: the input cannot be loaded, or the output cannot be
// written.  Both are fatal and unrecovered.  A referenced image file being
// absent is never an error; it is data (`file_exists = false`).

/// The input file is missing, unreadable, or not parseable.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported input format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("reading {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("parsing {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{path}: expected a top-level JSON array of row objects")]
    JsonShape { path: PathBuf },

    #[error("reading {path}: {source}")]
    Parquet {
        path: PathBuf,
        source: parquet::errors::ParquetError,
    },

    #[error("reading {path}: {source}")]
    Arrow {
        path: PathBuf,
        source: arrow::error::ArrowError,
    },
}

/// The output destination cannot be created or written.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("unsupported output format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("writing {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("writing {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("writing {path}: {source}")]
    Parquet {
        path: PathBuf,
        source: parquet::errors::ParquetError,
    },

    #[error("writing {path}: {source}")]
    Arrow {
        path: PathBuf,
        source: arrow::error::ArrowError,
    },
}

/// Umbrella error returned by a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
