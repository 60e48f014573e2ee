//! The formula-to-posterior pipeline.

use std::path::PathBuf;

use brmstan_backends::{dispatch, BackendConfig, BackendKind, Backends, FitOutcome};
use brmstan_bridge::{from_foreign, table_from_foreign, to_foreign};
use brmstan_brms::install::DEFAULT_CRAN_MIRROR;
use brmstan_brms::{Brms, CranInstaller, NoInstall, PackageInstaller, PriorSpec, Rscript};
use brmstan_core::{ModelSpec, StanData, TabularInput, Table};

use crate::error::Result;
use crate::request::FitRequest;

/// How to reach R and the sampling backends.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// `Rscript` executable; `Rscript` on `PATH` when unset.
    pub rscript: Option<PathBuf>,
    /// CRAN mirror used to install missing R packages.
    pub cran_mirror: String,
    /// Install missing R packages instead of failing.
    pub auto_install: bool,
    pub backends: BackendConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rscript: None,
            cran_mirror: DEFAULT_CRAN_MIRROR.to_string(),
            auto_install: true,
            backends: BackendConfig::default(),
        }
    }
}

/// A Stan program with the data prepared for it.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedModel {
    pub program: String,
    pub data: StanData,
}

/// An initialised brms handle plus the available sampling backends.
pub struct Session {
    brms: Brms,
    backends: Backends,
}

impl Session {
    pub fn new(brms: Brms, backends: Backends) -> Self {
        Self { brms, backends }
    }

    /// Initialise brms through `Rscript` and probe every backend.
    pub fn open(config: &SessionConfig) -> Result<Self> {
        let rscript = match &config.rscript {
            Some(path) => Rscript::with_executable(path),
            None => Rscript::new(),
        };
        let installer: Box<dyn PackageInstaller> = if config.auto_install {
            Box::new(CranInstaller::new(config.cran_mirror.clone()))
        } else {
            Box::new(NoInstall)
        };
        let brms = Brms::initialize(Box::new(rscript), installer.as_ref())?;
        let backends = Backends::probe(&config.backends);
        Ok(Self::new(brms, backends))
    }

    pub fn brms(&self) -> &Brms {
        &self.brms
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    /// Load a dataset shipped with brms.
    pub fn get_brms_data(&self, name: &str) -> Result<Table> {
        let json = self.brms.fetch_dataset(name)?;
        Ok(table_from_foreign(&json)?)
    }

    /// Generate the Stan program for `spec` on `data`.
    pub fn get_stan_code(
        &self,
        spec: &ModelSpec,
        data: &TabularInput,
        priors: &[PriorSpec],
    ) -> Result<String> {
        let prior = PriorSpec::combine(priors)?;
        let foreign = to_foreign(data);
        Ok(self.brms.compile(spec, &foreign, prior.as_ref())?)
    }

    /// Generate the Stan program and the data for it, coerced to the types
    /// the program declares.
    pub fn prepare(
        &self,
        spec: &ModelSpec,
        data: &TabularInput,
        priors: &[PriorSpec],
    ) -> Result<PreparedModel> {
        let prior = PriorSpec::combine(priors)?;
        let foreign = to_foreign(data);
        log::debug!("bridged input to an R {}", foreign.kind());

        let program = self.brms.compile(spec, &foreign, prior.as_ref())?;
        let json = self.brms.preprocess(spec, &foreign)?;
        let data = brmstan_datablock::coerce(&program, from_foreign(&json)?);
        Ok(PreparedModel { program, data })
    }

    /// Generate, build and (unless disabled) sample a model.
    ///
    /// The backend is resolved first, so an unknown or unavailable backend
    /// fails before R is called.
    pub fn fit(&self, request: &FitRequest<'_>) -> Result<FitOutcome> {
        let kind: BackendKind = request.backend.parse()?;
        let backend = self.backends.get(kind)?;

        let prepared = self.prepare(&request.spec, request.data, request.priors)?;
        log::info!(
            "prepared {} data variable(s) for '{}'",
            prepared.data.len(),
            request.spec.formula
        );
        Ok(dispatch(
            backend,
            &prepared.program,
            &prepared.data,
            request.sample,
            &request.args,
        )?)
    }
}
