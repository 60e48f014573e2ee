//! Backend strategy and dispatch.

use std::path::PathBuf;

use brmstan_core::StanData;

use crate::args::SampleArgs;
use crate::cmdstan::CmdStan;
use crate::error::{BackendError, Result};
use crate::kind::BackendKind;
use crate::model::{BuiltModel, FitOutcome};
use crate::posterior::Posterior;
use crate::pystan::{PyStan, DEFAULT_HTTPSTAN_URL, DEFAULT_PYTHON};

/// A sampling engine: builds a model from Stan source and samples it.
pub trait SamplingBackend {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Short description (version, location) for diagnostics.
    fn describe(&self) -> String;

    /// Compile `program`. `data` is given for backends that bind data at
    /// build time.
    fn build(&self, program: &str, data: &StanData) -> Result<BuiltModel>;

    /// Draw from a model this backend built.
    fn sample(&self, model: &BuiltModel, data: &StanData, args: &SampleArgs) -> Result<Posterior>;
}

/// Build `program` and, when `sample` is set, draw from it.
///
/// With `sample == false` the built model is returned and the sampling
/// entry point is never called.
pub fn dispatch(
    backend: &dyn SamplingBackend,
    program: &str,
    data: &StanData,
    sample: bool,
    args: &SampleArgs,
) -> Result<FitOutcome> {
    log::info!("building model with {}", backend.kind());
    let model = backend.build(program, data)?;
    if !sample {
        return Ok(FitOutcome::Unsampled(model));
    }

    log::info!("sampling with {}", backend.kind());
    let posterior = backend.sample(&model, data, args)?;
    log::info!(
        "collected {} draw(s) from {} chain(s)",
        posterior.num_draws(),
        posterior.num_chains()
    );
    Ok(FitOutcome::Sampled(posterior))
}

/// Where to find each backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// CmdStan installation; falls back to `$CMDSTAN`.
    pub cmdstan: Option<PathBuf>,
    /// `make` executable used to build CmdStan models.
    pub make: String,
    /// httpstan server base URL.
    pub httpstan_url: String,
    /// Python interpreter for legacy pystan.
    pub python: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            cmdstan: None,
            make: "make".to_string(),
            httpstan_url: DEFAULT_HTTPSTAN_URL.to_string(),
            python: DEFAULT_PYTHON.to_string(),
        }
    }
}

type Slot = std::result::Result<Box<dyn SamplingBackend>, String>;

/// The set of backends available to this process, probed once.
#[derive(Default)]
pub struct Backends {
    slots: Vec<(BackendKind, Slot)>,
}

impl Backends {
    /// An empty set; every backend reports "not configured".
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe every backend described by `config`.
    pub fn probe(config: &BackendConfig) -> Self {
        let mut backends = Self::new();

        match config.cmdstan.clone().or_else(CmdStan::home_from_env) {
            Some(home) => {
                let cmdstan = CmdStan::new(home).with_make(config.make.clone());
                match cmdstan.probe() {
                    Ok(()) => backends.register(Box::new(cmdstan)),
                    Err(e) => backends.mark_unavailable(BackendKind::CmdStanPy, e.to_string()),
                }
            }
            None => backends.mark_unavailable(
                BackendKind::CmdStanPy,
                "no CmdStan installation configured (set CMDSTAN or [cmdstan] path)".to_string(),
            ),
        }

        match PyStan::probe(&config.httpstan_url, &config.python) {
            Ok(pystan) => backends.register(Box::new(pystan)),
            Err(e) => backends.mark_unavailable(BackendKind::PyStan, e.to_string()),
        }

        backends
    }

    /// Register a ready backend, replacing any previous entry of its kind.
    pub fn register(&mut self, backend: Box<dyn SamplingBackend>) {
        let kind = backend.kind();
        log::debug!("{kind} backend ready: {}", backend.describe());
        self.set(kind, Ok(backend));
    }

    /// Record why a backend cannot be used.
    pub fn mark_unavailable(&mut self, kind: BackendKind, reason: String) {
        log::debug!("{kind} backend unavailable: {reason}");
        self.set(kind, Err(reason));
    }

    fn set(&mut self, kind: BackendKind, slot: Slot) {
        self.slots.retain(|(k, _)| *k != kind);
        self.slots.push((kind, slot));
    }

    /// The backend for `kind`, or why it is unavailable.
    pub fn get(&self, kind: BackendKind) -> Result<&dyn SamplingBackend> {
        match self.slots.iter().find(|(k, _)| *k == kind) {
            Some((_, Ok(backend))) => Ok(backend.as_ref()),
            Some((_, Err(reason))) => Err(BackendError::Unavailable {
                backend: kind,
                detail: reason.clone(),
            }),
            None => Err(BackendError::Unavailable {
                backend: kind,
                detail: "not configured".to_string(),
            }),
        }
    }

    /// Availability of every supported backend: description or reason.
    pub fn status(&self) -> Vec<(BackendKind, std::result::Result<String, String>)> {
        BackendKind::ALL
            .iter()
            .map(|kind| {
                let status = match self.get(*kind) {
                    Ok(backend) => Ok(backend.describe()),
                    Err(BackendError::Unavailable { detail, .. }) => Err(detail),
                    Err(other) => Err(other.to_string()),
                };
                (*kind, status)
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fake backend for dispatch tests.

    use std::cell::Cell;

    use super::*;
    use crate::cmdstan::CmdStanModel;
    use crate::pystan::HttpStanModel;

    /// Counts calls and returns canned results.
    pub struct FakeBackend {
        pub kind: BackendKind,
        pub builds: Cell<usize>,
        pub samples: Cell<usize>,
    }

    impl FakeBackend {
        pub fn new(kind: BackendKind) -> Self {
            Self {
                kind,
                builds: Cell::new(0),
                samples: Cell::new(0),
            }
        }
    }

    impl SamplingBackend for FakeBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn describe(&self) -> String {
            format!("fake {}", self.kind)
        }

        fn build(&self, _program: &str, data: &StanData) -> Result<BuiltModel> {
            self.builds.set(self.builds.get() + 1);
            Ok(match self.kind {
                BackendKind::CmdStanPy => {
                    BuiltModel::CmdStan(CmdStanModel::from_executable("/opt/models/fake"))
                }
                BackendKind::PyStan => BuiltModel::HttpStan(HttpStanModel::new(
                    DEFAULT_HTTPSTAN_URL,
                    "models/fake",
                    data.clone(),
                )),
            })
        }

        fn sample(
            &self,
            _model: &BuiltModel,
            _data: &StanData,
            _args: &SampleArgs,
        ) -> Result<Posterior> {
            self.samples.set(self.samples.get() + 1);
            let mut posterior = Posterior::new(vec!["lp__".into(), "mu".into()]);
            posterior.push_chain(vec![vec![-1.0, 0.5]])?;
            Ok(posterior)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeBackend;
    use super::*;

    #[test]
    fn no_sample_returns_model_for_both_backends() {
        for kind in BackendKind::ALL {
            let backend = FakeBackend::new(kind);
            let outcome = dispatch(&backend, "", &StanData::new(), false, &SampleArgs::new()).unwrap();
            assert!(!outcome.is_sampled());
            assert_eq!(outcome.model().unwrap().backend(), kind);
            assert_eq!(backend.builds.get(), 1);
            assert_eq!(backend.samples.get(), 0);
        }
    }

    #[test]
    fn sample_returns_posterior() {
        let backend = FakeBackend::new(BackendKind::CmdStanPy);
        let outcome = dispatch(&backend, "", &StanData::new(), true, &SampleArgs::new()).unwrap();
        assert_eq!(outcome.posterior().unwrap().mean("mu"), Some(0.5));
        assert_eq!(backend.samples.get(), 1);
    }

    #[test]
    fn registry_reports_unavailable() {
        let mut backends = Backends::new();
        backends.register(Box::new(FakeBackend::new(BackendKind::PyStan)));
        backends.mark_unavailable(BackendKind::CmdStanPy, "CmdStan not found".to_string());

        assert_eq!(backends.get(BackendKind::PyStan).unwrap().kind(), BackendKind::PyStan);
        let err = backends.get(BackendKind::CmdStanPy).err().unwrap();
        assert_eq!(
            err.to_string(),
            "cmdstanpy backend unavailable: CmdStan not found"
        );

        let status = backends.status();
        assert_eq!(status.len(), 2);
        assert_eq!(status[1].1, Ok("fake pystan".to_string()));
    }

    #[test]
    fn empty_registry_is_not_configured() {
        let err = Backends::new().get(BackendKind::PyStan).err().unwrap();
        assert!(err.to_string().contains("not configured"));
    }
}
