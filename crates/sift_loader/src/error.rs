//! Error types for configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that can occur while loading or evaluating configuration.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Not a configuration directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Variable file not found: {0}")]
    VarfileNotFound(PathBuf),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("Invalid module manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl LoadError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}
