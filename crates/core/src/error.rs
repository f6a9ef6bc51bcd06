use thiserror::Error;

/// Top-level error type used across the entire workspace.
#[derive(Debug, Error)]
pub enum TrendError {
    /// `get` was called with an index outside `[0, size)`.
    #[error("index {index} out of range (size {size})")]
    IndexOutOfRange { index: usize, size: usize },

    /// The live ring buffer could not be resized; its previous content is kept.
    #[error("cannot resize live buffer to {requested} samples: {reason}")]
    Capacity { requested: usize, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("system error: {0}")]
    System(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = TrendError> = std::result::Result<T, E>;
