use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Everything that can go wrong between invoking the simulator and saving a plot.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("simulator source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("build directory not found: {0}")]
    BuildDirNotFound(PathBuf),

    #[error("simulator executable not found: {0}")]
    ExecutableNotFound(PathBuf),

    #[error("simulation output not found: {0}")]
    OutputNotFound(PathBuf),

    #[error("{stage} failed with {status}: {stderr}")]
    ProcessFailed {
        stage: &'static str,
        status: String,
        stderr: String,
    },

    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("unknown model preset: {0}")]
    UnknownModel(String),

    #[error("output file has no data rows: {0}")]
    EmptyTable(PathBuf),

    #[error("invalid model spec: {0}")]
    InvalidSpec(String),

    #[error("failed to parse model spec: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to render plot: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
