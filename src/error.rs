use thiserror::Error;

#[derive(Error, Debug)]
pub enum QualityError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Matrix shape mismatch: kill matrix is {kill_rows}x{kill_cols}, coverage matrix is {coverage_rows}x{coverage_cols}")]
    ShapeMismatch {
        kill_rows: usize,
        kill_cols: usize,
        coverage_rows: usize,
        coverage_cols: usize,
    },

    #[error("{axis} index {index} out of range (len {len})")]
    IndexOutOfRange {
        axis: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Mutant {mutant} references unknown test id '{test}'")]
    UnknownTest { mutant: String, test: String },

    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, QualityError>;
