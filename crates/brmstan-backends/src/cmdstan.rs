//! CmdStan backend.
//!
//! Builds a model executable with CmdStan's makefile and samples by running
//! that executable once per chain, reading the Stan CSV it writes.

use std::env::consts::EXE_SUFFIX;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use brmstan_core::StanData;
use tempfile::TempDir;

use crate::args::{value_token, SampleArgs};
use crate::dispatch::SamplingBackend;
use crate::error::{BackendError, Result};
use crate::kind::BackendKind;
use crate::model::BuiltModel;
use crate::posterior::Posterior;
use crate::{process, stan_csv};

/// Environment variable naming the CmdStan installation.
pub const CMDSTAN_ENV: &str = "CMDSTAN";

const MODEL_NAME: &str = "stan_model";

/// A CmdStan installation.
#[derive(Debug, Clone)]
pub struct CmdStan {
    home: PathBuf,
    make: String,
}

impl CmdStan {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            make: "make".to_string(),
        }
    }

    /// Use a different `make` executable.
    pub fn with_make(mut self, make: impl Into<String>) -> Self {
        self.make = make.into();
        self
    }

    /// The installation named by `$CMDSTAN`, if set.
    pub fn home_from_env() -> Option<PathBuf> {
        std::env::var_os(CMDSTAN_ENV).map(PathBuf::from)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Check that `home` looks like a CmdStan installation.
    pub fn probe(&self) -> Result<()> {
        if !self.home.join("makefile").is_file() {
            return Err(BackendError::Unavailable {
                backend: BackendKind::CmdStanPy,
                detail: format!("no CmdStan makefile in {}", self.home.display()),
            });
        }
        Ok(())
    }

    /// `stanc --version`, when the compiler has been built.
    pub fn version(&self) -> Option<String> {
        let stanc = self.home.join("bin").join(format!("stanc{EXE_SUFFIX}"));
        process::first_line(Command::new(stanc).arg("--version"))
    }

    /// Command-line arguments for one chain.
    fn chain_args(
        args: &SampleArgs,
        id: usize,
        data_file: &Path,
        output_file: &Path,
    ) -> Result<Vec<String>> {
        let mut argv = vec!["sample".to_string()];
        if let Some(n) = args.num_samples()? {
            argv.push(format!("num_samples={n}"));
        }
        if let Some(n) = args.num_warmup()? {
            argv.push(format!("num_warmup={n}"));
        }

        let mut adapt = Vec::new();
        let mut nuts = Vec::new();
        for (key, value) in args.extra() {
            let token = value_token(value);
            match key {
                "adapt_delta" => adapt.push(format!("delta={token}")),
                "max_treedepth" => nuts.push(format!("max_depth={token}")),
                "metric" => nuts.push(format!("metric={token}")),
                // thin, save_warmup and other `sample` options
                other => argv.push(format!("{other}={token}")),
            }
        }
        if !adapt.is_empty() {
            argv.push("adapt".to_string());
            argv.extend(adapt);
        }
        if !nuts.is_empty() {
            argv.extend(["algorithm=hmc".to_string(), "engine=nuts".to_string()]);
            argv.extend(nuts);
        }

        argv.push(format!("id={id}"));
        argv.extend(["data".to_string(), format!("file={}", data_file.display())]);
        if let Some(seed) = args.seed()? {
            argv.extend(["random".to_string(), format!("seed={seed}")]);
        }
        argv.extend(["output".to_string(), format!("file={}", output_file.display())]);
        Ok(argv)
    }
}

impl SamplingBackend for CmdStan {
    fn kind(&self) -> BackendKind {
        BackendKind::CmdStanPy
    }

    fn describe(&self) -> String {
        match self.version() {
            Some(version) => format!("{version} at {}", self.home.display()),
            None => format!("CmdStan at {}", self.home.display()),
        }
    }

    fn build(&self, program: &str, _data: &StanData) -> Result<BuiltModel> {
        let workdir = tempfile::Builder::new().prefix("brmstan_").tempdir()?;
        fs::write(workdir.path().join(format!("{MODEL_NAME}.stan")), program)?;

        let target = workdir.path().join(format!("{MODEL_NAME}{EXE_SUFFIX}"));
        log::debug!("compiling {}", target.display());
        process::run(
            Command::new(&self.make)
                .arg("-C")
                .arg(&self.home)
                .arg(&target),
        )
        .map_err(|e| match e {
            BackendError::Process { stderr, .. } => BackendError::Build {
                backend: BackendKind::CmdStanPy,
                detail: stderr,
            },
            other => other,
        })?;

        let model_dir = tempfile::Builder::new().prefix("brmstan_model_").tempdir()?;
        let executable = model_dir.path().join(format!("{MODEL_NAME}{EXE_SUFFIX}"));
        fs::copy(&target, &executable)?;
        Ok(BuiltModel::CmdStan(CmdStanModel {
            executable,
            _dir: Some(model_dir),
        }))
    }

    fn sample(&self, model: &BuiltModel, data: &StanData, args: &SampleArgs) -> Result<Posterior> {
        let BuiltModel::CmdStan(model) = model else {
            return Err(BackendError::WrongModel {
                expected: BackendKind::CmdStanPy,
                found: model.backend(),
            });
        };
        model.sample(data, args)
    }
}

/// A compiled CmdStan model executable.
///
/// When built by [`CmdStan`], the executable lives in a temporary directory
/// owned by the handle and removed when it drops.
#[derive(Debug)]
pub struct CmdStanModel {
    executable: PathBuf,
    _dir: Option<TempDir>,
}

impl CmdStanModel {
    /// Wrap an existing executable; nothing is removed on drop.
    pub fn from_executable(path: impl Into<PathBuf>) -> Self {
        Self {
            executable: path.into(),
            _dir: None,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Run every chain in turn and merge the draws.
    pub fn sample(&self, data: &StanData, args: &SampleArgs) -> Result<Posterior> {
        let chains = args.chains()?;
        let rundir = tempfile::Builder::new().prefix("brmstan_run_").tempdir()?;
        let data_file = rundir.path().join("data.json");
        fs::write(&data_file, serde_json::to_string(data)?)?;

        let mut posterior = Posterior::default();
        for id in 1..=chains {
            let output_file = rundir.path().join(format!("{MODEL_NAME}-{id}.csv"));
            let argv = CmdStan::chain_args(args, id, &data_file, &output_file)?;
            log::debug!("chain {id}/{chains}");
            process::run(Command::new(&self.executable).args(&argv)).map_err(|e| match e {
                BackendError::Process { stderr, .. } => BackendError::Sample {
                    backend: BackendKind::CmdStanPy,
                    detail: stderr,
                },
                other => other,
            })?;
            posterior.extend(stan_csv::read(&output_file)?)?;
        }
        Ok(posterior)
    }
}
