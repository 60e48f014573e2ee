//! Facade error type.

use brmstan_backends::BackendError;
use brmstan_bridge::BridgeError;
use brmstan_brms::BrmsError;
use brmstan_core::CoreError;

/// Any error raised along the formula-to-posterior pipeline.
#[derive(Debug, thiserror::Error)]
pub enum BrmstanError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Brms(#[from] BrmsError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type Result<T> = std::result::Result<T, BrmstanError>;
