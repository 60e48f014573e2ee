//! brms model compiler adapter.
//!
//! Turns a formula, data, priors and family into a Stan program and a
//! preprocessed data list by calling `brms::make_stancode` and
//! `brms::make_standata` in an R process.
//!
//! ## Modules
//!
//! - [`runtime`]: `RRuntime` trait, `RProgram`, and the `Rscript` runtime
//! - [`call`]: R function call rendering
//! - [`prior`]: `PriorSpec` and `CombinedPrior`
//! - [`install`]: `PackageInstaller` implementations
//! - [`brms`]: the initialised `Brms` handle
//! - [`error`]: `BrmsError`

pub mod brms;
pub mod call;
pub mod error;
pub mod install;
pub mod prior;
pub mod runtime;

pub use brms::{Brms, REQUIRED_PACKAGES};
pub use call::RCall;
pub use error::BrmsError;
pub use install::{CranInstaller, NoInstall, PackageInstaller};
pub use prior::{CombinedPrior, PriorSpec};
pub use runtime::{RProgram, RRuntime, Rscript};
