use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort a conversion pass.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Input missing or unreadable, or output not creatable.
    #[error("cannot open {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Date text does not match `DD-Mon-YYYY`.
    #[error("time data '{input}' does not match format '%d-%b-%Y': {source}")]
    Parse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Timestamp field is a single token.
    #[error("timestamp '{input}' has no space between date and time")]
    Format { input: String },

    #[error("timestamp column {index} out of range for row of {len} fields")]
    Index { index: usize, len: usize },

    #[error("input has no header row")]
    EmptyInput,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
