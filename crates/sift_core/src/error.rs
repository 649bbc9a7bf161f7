//! Error types for the detection engine.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during detection.
///
/// None of these abort a run. Resolution errors skip one value, oracle
/// errors fail one rule in one module scope, and a malformed state file
/// degrades to an empty snapshot.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{file}:{line}: cannot evaluate expression: {message}")]
    Evaluation {
        file: String,
        line: usize,
        message: String,
    },

    #[error("{file}:{line}: expected {expected}, found {found}")]
    TypeMismatch {
        file: String,
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("Oracle error: {0}")]
    Oracle(#[from] sift_oracle::OracleError),

    #[error("Failed to parse state file: {0}")]
    StateParse(String),

    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Rule {rule} cannot move from {from} to {to}")]
    Lifecycle {
        rule: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Load error: {0}")]
    Load(#[from] sift_loader::LoadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
