//! Legacy `pystan` 2, driven through a Python interpreter.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use brmstan_core::StanData;
use serde::Deserialize;
use serde_json::{Map, Value};
use tempfile::TempDir;

use super::wrong_model;
use crate::args::SampleArgs;
use crate::dispatch::SamplingBackend;
use crate::error::{BackendError, Result};
use crate::kind::BackendKind;
use crate::model::BuiltModel;
use crate::posterior::Posterior;
use crate::process;

const BUILD_SCRIPT: &str = include_str!("legacy_build.py");
const SAMPLE_SCRIPT: &str = include_str!("legacy_sample.py");

/// pystan 2's default post-warmup draws per chain.
const DEFAULT_SAMPLES: u64 = 1000;

/// `pystan` 2 importable from `python`.
#[derive(Debug, Clone)]
pub struct LegacyPyStan {
    python: String,
}

impl LegacyPyStan {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    pub fn python(&self) -> &str {
        &self.python
    }

    /// `pystan.__version__`, or `None` when pystan cannot be imported.
    pub fn version(&self) -> Option<String> {
        process::first_line(
            Command::new(&self.python)
                .arg("-c")
                .arg("import pystan; print(pystan.__version__)"),
        )
    }
}

impl SamplingBackend for LegacyPyStan {
    fn kind(&self) -> BackendKind {
        BackendKind::PyStan
    }

    fn describe(&self) -> String {
        match self.version() {
            Some(version) => format!("pystan {version} ({})", self.python),
            None => format!("pystan ({})", self.python),
        }
    }

    fn build(&self, program: &str, _data: &StanData) -> Result<BuiltModel> {
        let dir = tempfile::Builder::new().prefix("brmstan_model_").tempdir()?;
        let source = dir.path().join("stan_model.stan");
        let pickle = dir.path().join("stan_model.pkl");
        fs::write(&source, program)?;

        process::run(
            Command::new(&self.python)
                .arg("-c")
                .arg(BUILD_SCRIPT)
                .arg(&source)
                .arg(&pickle),
        )
        .map_err(|e| match e {
            BackendError::Process { stderr, .. } => BackendError::Build {
                backend: BackendKind::PyStan,
                detail: stderr,
            },
            other => other,
        })?;

        Ok(BuiltModel::LegacyPyStan(LegacyPyStanModel {
            pickle,
            python: self.python.clone(),
            _dir: Some(dir),
        }))
    }

    fn sample(&self, model: &BuiltModel, data: &StanData, args: &SampleArgs) -> Result<Posterior> {
        let BuiltModel::LegacyPyStan(model) = model else {
            return Err(wrong_model(model, "legacy pystan"));
        };
        model.sample(data, args)
    }
}

/// A pickled pystan 2 `StanModel`.
#[derive(Debug)]
pub struct LegacyPyStanModel {
    pickle: PathBuf,
    python: String,
    _dir: Option<TempDir>,
}

impl LegacyPyStanModel {
    /// Wrap an existing pickle; nothing is removed on drop.
    pub fn from_pickle(pickle: impl Into<PathBuf>, python: impl Into<String>) -> Self {
        Self {
            pickle: pickle.into(),
            python: python.into(),
            _dir: None,
        }
    }

    pub fn pickle(&self) -> &Path {
        &self.pickle
    }

    /// Call `StanModel.sampling` and read back every chain.
    pub fn sample(&self, data: &StanData, args: &SampleArgs) -> Result<Posterior> {
        let rundir = tempfile::Builder::new().prefix("brmstan_run_").tempdir()?;
        let data_file = rundir.path().join("data.json");
        let kwargs_file = rundir.path().join("kwargs.json");
        let output_file = rundir.path().join("draws.json");
        fs::write(&data_file, serde_json::to_string(data)?)?;
        fs::write(&kwargs_file, serde_json::to_string(&sampling_kwargs(args)?)?)?;

        process::run(
            Command::new(&self.python)
                .arg("-c")
                .arg(SAMPLE_SCRIPT)
                .arg(&self.pickle)
                .arg(&data_file)
                .arg(&kwargs_file)
                .arg(&output_file),
        )
        .map_err(|e| match e {
            BackendError::Process { stderr, .. } => BackendError::Sample {
                backend: BackendKind::PyStan,
                detail: stderr,
            },
            other => other,
        })?;

        read_draws(&fs::read_to_string(&output_file)?)
    }
}

/// Draws as written by the sampling driver; non-finite values are `null`.
#[derive(Debug, Deserialize)]
struct Draws {
    columns: Vec<String>,
    chains: Vec<Vec<Vec<Option<f64>>>>,
}

fn read_draws(text: &str) -> Result<Posterior> {
    let draws: Draws = serde_json::from_str(text)?;
    let mut posterior = Posterior::new(draws.columns);
    for chain in draws.chains {
        let rows = chain
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            .collect();
        posterior.push_chain(rows)?;
    }
    Ok(posterior)
}

/// Keyword arguments for `StanModel.sampling`.
///
/// pystan 2 counts warmup inside `iter`, and takes adaptation settings in
/// a `control` dictionary.
fn sampling_kwargs(args: &SampleArgs) -> Result<Map<String, Value>> {
    let mut kwargs = Map::new();
    kwargs.insert("chains".into(), args.chains()?.into());

    match (args.num_warmup()?, args.num_samples()?) {
        (Some(warmup), Some(samples)) => {
            kwargs.insert("warmup".into(), warmup.into());
            kwargs.insert("iter".into(), (warmup + samples).into());
        }
        (Some(warmup), None) => {
            kwargs.insert("warmup".into(), warmup.into());
            kwargs.insert("iter".into(), (warmup + DEFAULT_SAMPLES).into());
        }
        // warmup defaults to iter // 2
        (None, Some(samples)) => {
            kwargs.insert("iter".into(), (2 * samples).into());
        }
        (None, None) => {}
    }
    if let Some(seed) = args.seed()? {
        kwargs.insert("seed".into(), seed.into());
    }

    let mut control = Map::new();
    for (key, value) in args.extra() {
        match key {
            "adapt_delta" | "max_treedepth" | "metric" | "stepsize" => {
                control.insert(key.to_string(), value.clone());
            }
            other => {
                kwargs.insert(other.to_string(), value.clone());
            }
        }
    }
    if !control.is_empty() {
        kwargs.insert("control".into(), Value::Object(control));
    }
    Ok(kwargs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kwargs_count_warmup_in_iter() {
        let args = SampleArgs::new()
            .with("chains", 2)
            .with("iter_warmup", 300)
            .with("iter_sampling", 700)
            .with("random_seed", 5)
            .with("adapt_delta", 0.99)
            .with("thin", 2);
        assert_eq!(
            Value::Object(sampling_kwargs(&args).unwrap()),
            json!({
                "chains": 2,
                "warmup": 300,
                "iter": 1000,
                "seed": 5,
                "thin": 2,
                "control": {"adapt_delta": 0.99},
            })
        );
    }

    #[test]
    fn samples_only_doubles_iter() {
        let args = SampleArgs::new().with("num_samples", 250);
        let kwargs = sampling_kwargs(&args).unwrap();
        assert_eq!(kwargs["iter"], json!(500));
        assert_eq!(kwargs["chains"], json!(4));
        assert!(!kwargs.contains_key("warmup"));
    }

    #[test]
    fn reads_driver_output() {
        let posterior = read_draws(
            r#"{"columns": ["mu", "lp__"], "chains": [[[1.0, -2.0], [3.0, null]], [[2.0, -1.0]]]}"#,
        )
        .unwrap();
        assert_eq!(posterior.num_chains(), 2);
        assert_eq!(posterior.mean("mu"), Some(2.0));
        assert!(posterior.column("lp__").unwrap()[1].is_nan());
    }

    #[cfg(unix)]
    fn fake_python(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let python = dir.join("fake_python");
        fs::write(&python, format!("#!/bin/sh\n{body}")).unwrap();
        fs::set_permissions(&python, fs::Permissions::from_mode(0o755)).unwrap();
        python
    }

    #[cfg(unix)]
    #[test]
    fn samples_existing_pickle() {
        // Arguments: -c <script> <pickle> <data> <kwargs> <output>
        let dir = tempfile::tempdir().unwrap();
        let python = fake_python(
            dir.path(),
            "grep -q '\"chains\": *2' \"$5\" || exit 3\n\
             printf '{\"columns\": [\"mu\"], \"chains\": [[[1.0], [3.0]], [[2.0]]]}' > \"$6\"\n",
        );
        let pickle = dir.path().join("model.pkl");

        let model = LegacyPyStanModel::from_pickle(&pickle, python.to_string_lossy());
        assert_eq!(model.pickle(), pickle.as_path());
        let posterior = model
            .sample(&StanData::new(), &SampleArgs::new().with("chains", 2))
            .unwrap();
        assert_eq!(posterior.num_chains(), 2);
        assert_eq!(posterior.mean("mu"), Some(2.0));
    }

    #[cfg(unix)]
    #[test]
    fn driver_failure_is_a_sample_error() {
        let dir = tempfile::tempdir().unwrap();
        let python = fake_python(dir.path(), "echo 'RuntimeError: Initialization failed.' >&2\nexit 1\n");

        let model = LegacyPyStanModel::from_pickle(dir.path().join("model.pkl"), python.to_string_lossy());
        let err = model
            .sample(&StanData::new(), &SampleArgs::new())
            .unwrap_err();
        match err {
            BackendError::Sample { detail, .. } => assert!(detail.contains("Initialization failed")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_interpreter_has_no_version() {
        assert_eq!(LegacyPyStan::new("/nonexistent/python").version(), None);
    }
}
