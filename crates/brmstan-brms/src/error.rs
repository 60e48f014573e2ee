//! Model compiler adapter errors.

use std::path::PathBuf;

use brmstan_bridge::BridgeError;

/// Errors raised while talking to R and brms.
#[derive(Debug, thiserror::Error)]
pub enum BrmsError {
    /// R exited with an error. The message is R's own, uninterpreted.
    #[error("R evaluation failed ({status}): {stderr}")]
    Foreign { status: String, stderr: String },

    /// The R interpreter could not be started.
    #[error("R runtime not found at {}", path.display())]
    RuntimeNotFound { path: PathBuf },

    /// Required R packages are missing and could not be installed.
    #[error("R package(s) unavailable: {}", packages.join(", "))]
    DependencyUnavailable { packages: Vec<String> },

    /// A prior specification is malformed.
    #[error("invalid prior: {detail}")]
    InvalidPrior { detail: String },

    /// Bridge error (including building priors inside a conversion scope).
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// I/O error around the R process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for brms operations.
pub type Result<T> = std::result::Result<T, BrmsError>;
