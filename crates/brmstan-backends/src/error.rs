//! Backend error types.

use crate::kind::BackendKind;

/// Errors raised while building or sampling a model.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Backend name is not one of the supported values.
    #[error("unsupported backend '{name}'; select from {{'cmdstanpy', 'pystan'}}")]
    Unsupported { name: String },

    /// Backend is supported but not installed or reachable.
    #[error("{backend} backend unavailable: {detail}")]
    Unavailable { backend: BackendKind, detail: String },

    /// Model compilation failed.
    #[error("{backend} failed to build the model: {detail}")]
    Build { backend: BackendKind, detail: String },

    /// Sampling failed.
    #[error("{backend} sampling failed: {detail}")]
    Sample { backend: BackendKind, detail: String },

    /// A model built by one backend was handed to another.
    #[error("model was built by {found}, cannot sample with {expected}")]
    WrongModel {
        expected: BackendKind,
        found: BackendKind,
    },

    /// A subprocess exited unsuccessfully.
    #[error("`{program}` exited with {status}: {stderr}")]
    Process {
        program: String,
        status: String,
        stderr: String,
    },

    /// Malformed sampler output.
    #[error("malformed sampler output: {detail}")]
    Output { detail: String },

    /// Invalid backend argument.
    #[error("invalid backend argument '{key}': {detail}")]
    InvalidArgument { key: String, detail: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialisation error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
