//! brmstan: Stan programs, Stan data and posterior fits from brms model
//! formulas.
//!
//! R and brms generate the Stan program and its data; a sampling backend
//! (CmdStan or PyStan) compiles and runs it. A [`Session`] owns one
//! initialised brms handle plus the probed backends:
//!
//! ```no_run
//! use brmstan::{FitRequest, Session, SessionConfig, TabularInput};
//!
//! # fn main() -> brmstan::Result<()> {
//! let session = Session::open(&SessionConfig::default())?;
//! let epilepsy = TabularInput::Table(session.get_brms_data("epilepsy")?);
//! let request = FitRequest::new("count ~ zAge + zBase * Trt + (1|patient)", &epilepsy);
//! let fit = session.fit(&request)?;
//! if let Some(posterior) = fit.posterior() {
//!     println!("b_Intercept = {:?}", posterior.mean("b_Intercept"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod request;
pub mod session;

pub use error::{BrmstanError, Result};
pub use request::FitRequest;
pub use session::{PreparedModel, Session, SessionConfig};

pub use brmstan_backends::{
    BackendConfig, BackendKind, Backends, BuiltModel, FitOutcome, Posterior, SampleArgs,
    SamplingBackend,
};
pub use brmstan_brms::{Brms, NoInstall, PriorSpec, Rscript};
pub use brmstan_core::{
    Column, Family, ModelSpec, SamplePrior, StanData, StanValue, TabularInput, Table,
};
