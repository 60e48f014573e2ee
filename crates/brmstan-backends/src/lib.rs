//! Sampling backends for brmstan.
//!
//! A compiled Stan program plus coerced data go to one of two interchangeable
//! backends, each implementing [`SamplingBackend`]:
//!
//! - [`cmdstan`]: compile with `make`, sample with the model executable
//! - [`pystan`]: the `httpstan` REST interface, or legacy `pystan` 2
//!
//! Availability is checked once, when a backend is constructed or probed
//! into a [`Backends`] set; dispatch never falls back at call time.
//!
//! ## Modules
//!
//! - [`kind`]: the closed set of backend names
//! - [`args`]: backend keyword arguments
//! - [`dispatch`]: `SamplingBackend`, `Backends`, and `dispatch`
//! - [`model`]: built model handles and the fit outcome
//! - [`posterior`]: posterior draws
//! - [`stan_csv`]: Stan CSV output parsing
//! - [`process`]: subprocess helper
//! - [`error`]: `BackendError`

pub mod args;
pub mod cmdstan;
pub mod dispatch;
pub mod error;
pub mod kind;
pub mod model;
pub mod posterior;
pub mod process;
pub mod pystan;
pub mod stan_csv;

pub use args::SampleArgs;
pub use cmdstan::{CmdStan, CmdStanModel};
pub use dispatch::{dispatch, BackendConfig, Backends, SamplingBackend};
pub use error::BackendError;
pub use kind::BackendKind;
pub use model::{BuiltModel, FitOutcome};
pub use posterior::Posterior;
pub use pystan::{HttpStan, HttpStanModel, LegacyPyStan, LegacyPyStanModel, PyStan};
