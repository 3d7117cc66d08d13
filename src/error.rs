// src/error.rs

/// Errors raised by the plotting path.
///
/// Soft misses of the source scanner are never errors; they surface as `None`.
#[derive(thiserror::Error, Debug)]
pub enum PlotError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for PlotError {
    fn from(err: csv::Error) -> Self {
        PlotError::DataSource(err.to_string())
    }
}

impl From<serde_json::Error> for PlotError {
    fn from(err: serde_json::Error) -> Self {
        PlotError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlotError>;

// src/error.rs
