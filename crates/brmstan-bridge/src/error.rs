//! Bridge error types.

use brmstan_core::CoreError;

/// Errors that can occur while converting between host and R values.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The R result is not a named list.
    #[error("expected an R named list, got {found}")]
    NotAList { found: String },

    /// An R value has no host numeric representation.
    #[error("cannot convert '{name}': {detail}")]
    UnsupportedValue { name: String, detail: String },

    /// An operation that requires the bridge to be inactive ran inside a scope.
    #[error("{operation} must not run while a conversion scope is active")]
    ScopeActive { operation: String },

    /// Host data model error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Malformed JSON from the R side.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
