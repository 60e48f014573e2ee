//! PyStan backend.
//!
//! Two interfaces share the `pystan` name: the modern one talks to an
//! `httpstan` server over REST, the legacy one drives `pystan` 2 through a
//! Python interpreter. [`PyStan::probe`] picks one, once, at construction.

mod http;
mod legacy;

pub use http::{parse_fit, HttpStan, HttpStanModel};
pub use legacy::{LegacyPyStan, LegacyPyStanModel};

use brmstan_core::StanData;

use crate::args::SampleArgs;
use crate::dispatch::SamplingBackend;
use crate::error::{BackendError, Result};
use crate::kind::BackendKind;
use crate::model::BuiltModel;
use crate::posterior::Posterior;

/// Default httpstan address.
pub const DEFAULT_HTTPSTAN_URL: &str = "http://127.0.0.1:8080";

/// Default interpreter for legacy pystan.
pub const DEFAULT_PYTHON: &str = "python3";

/// The PyStan interface in use.
#[derive(Debug)]
pub enum PyStan {
    Http(HttpStan),
    Legacy(LegacyPyStan),
}

impl PyStan {
    /// Prefer a live httpstan server at `url`; fall back to `pystan` 2
    /// importable from `python`.
    pub fn probe(url: &str, python: &str) -> Result<Self> {
        let http = HttpStan::new(url)?;
        match http.health() {
            Ok(()) => return Ok(PyStan::Http(http)),
            Err(e) => log::debug!("httpstan at {url} not reachable: {e}"),
        }

        let legacy = LegacyPyStan::new(python);
        if let Some(version) = legacy.version() {
            log::debug!("using legacy pystan {version}");
            return Ok(PyStan::Legacy(legacy));
        }

        Err(BackendError::Unavailable {
            backend: BackendKind::PyStan,
            detail: format!(
                "no httpstan server at {url} and `{python} -c \"import pystan\"` failed"
            ),
        })
    }

    fn backend(&self) -> &dyn SamplingBackend {
        match self {
            PyStan::Http(http) => http,
            PyStan::Legacy(legacy) => legacy,
        }
    }
}

impl SamplingBackend for PyStan {
    fn kind(&self) -> BackendKind {
        BackendKind::PyStan
    }

    fn describe(&self) -> String {
        self.backend().describe()
    }

    fn build(&self, program: &str, data: &StanData) -> Result<BuiltModel> {
        self.backend().build(program, data)
    }

    fn sample(&self, model: &BuiltModel, data: &StanData, args: &SampleArgs) -> Result<Posterior> {
        self.backend().sample(model, data, args)
    }
}

/// Error for a model the `interface` cannot sample.
fn wrong_model(model: &BuiltModel, interface: &str) -> BackendError {
    if model.backend() == BackendKind::PyStan {
        return BackendError::Sample {
            backend: BackendKind::PyStan,
            detail: format!("{} cannot be sampled by the {interface} interface", model.describe()),
        };
    }
    BackendError::WrongModel {
        expected: BackendKind::PyStan,
        found: model.backend(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_when_nothing_answers() {
        // Port 9 (discard) is not an httpstan server; the interpreter does
        // not exist.
        let err = PyStan::probe("http://127.0.0.1:9", "/nonexistent/python").unwrap_err();
        match err {
            BackendError::Unavailable { backend, detail } => {
                assert_eq!(backend, BackendKind::PyStan);
                assert!(detail.contains("/nonexistent/python"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
