//! Built model handles and fit outcomes.

use crate::cmdstan::CmdStanModel;
use crate::kind::BackendKind;
use crate::posterior::Posterior;
use crate::pystan::{HttpStanModel, LegacyPyStanModel};

/// A model compiled by a backend, ready to sample.
///
/// Dropping the handle releases whatever the backend keeps for it
/// (executables, pickles).
#[derive(Debug)]
pub enum BuiltModel {
    /// CmdStan executable.
    CmdStan(CmdStanModel),
    /// Model registered with an httpstan server, with its data.
    HttpStan(HttpStanModel),
    /// Pickled pystan 2 `StanModel`.
    LegacyPyStan(LegacyPyStanModel),
}

impl BuiltModel {
    /// The backend that built this model.
    pub fn backend(&self) -> BackendKind {
        match self {
            BuiltModel::CmdStan(_) => BackendKind::CmdStanPy,
            BuiltModel::HttpStan(_) | BuiltModel::LegacyPyStan(_) => BackendKind::PyStan,
        }
    }

    /// One-line description for display.
    pub fn describe(&self) -> String {
        match self {
            BuiltModel::CmdStan(m) => format!("CmdStan model at {}", m.executable().display()),
            BuiltModel::HttpStan(m) => format!("httpstan model {} at {}", m.name(), m.url()),
            BuiltModel::LegacyPyStan(m) => format!("pystan model at {}", m.pickle().display()),
        }
    }
}

/// Result of a fit: an unsampled model or posterior draws.
#[derive(Debug)]
pub enum FitOutcome {
    Unsampled(BuiltModel),
    Sampled(Posterior),
}

impl FitOutcome {
    pub fn is_sampled(&self) -> bool {
        matches!(self, FitOutcome::Sampled(_))
    }

    pub fn posterior(&self) -> Option<&Posterior> {
        match self {
            FitOutcome::Sampled(p) => Some(p),
            FitOutcome::Unsampled(_) => None,
        }
    }

    pub fn model(&self) -> Option<&BuiltModel> {
        match self {
            FitOutcome::Unsampled(m) => Some(m),
            FitOutcome::Sampled(_) => None,
        }
    }

    pub fn into_posterior(self) -> Option<Posterior> {
        match self {
            FitOutcome::Sampled(p) => Some(p),
            FitOutcome::Unsampled(_) => None,
        }
    }
}
