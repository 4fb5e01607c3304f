//! Error taxonomy shared by the catalog, emitters and manifest.

use thiserror::Error as ThisError;

/// Result type for dispatch generation.
pub type Result<T> = std::result::Result<T, DispatchError>;

#[derive(ThisError, Debug)]
pub enum DispatchError {
    /// `load()` was called on a manifest that is already populated.
    #[error("manifest is already loaded; load() may only be called once")]
    Reinitialization,

    /// A filter value or catalog entry is not acceptable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No emitter is registered for the requested dialect.
    #[error("unsupported MLIR dialect `{0}`")]
    UnsupportedDialect(String),

    /// An emitter was handed a dispatch it cannot render.
    #[error("{dialect} emitter cannot render `{dispatch}`: {reason}")]
    UnsupportedOperation {
        dialect: String,
        dispatch: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DispatchError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
