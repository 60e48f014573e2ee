//! CLI command implementations.

pub mod code;
pub mod data;
pub mod dataset;
pub mod doctor;
pub mod fit;
pub mod init;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use brmstan::{Family, ModelSpec, PriorSpec, SamplePrior, Session, TabularInput};
use clap::Args;

use crate::config::{BrmstanConfig, FitConfig};

/// Model and data options shared by `code`, `data` and `fit`.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// brms model formula, e.g. "count ~ zAge + (1 | patient)"
    #[arg(long)]
    pub formula: String,
    /// JSON data: an array of row objects, or an object of columns
    #[arg(long)]
    pub data: Option<PathBuf>,
    /// Use a dataset shipped with brms instead of --data
    #[arg(long, conflicts_with = "data")]
    pub dataset: Option<String>,
    /// Response distribution (default from brmstan.toml, else gaussian)
    #[arg(long)]
    pub family: Option<String>,
    /// Prior as ';'-separated prior_string arguments, e.g. "normal(0, 1);b" (repeatable)
    #[arg(long = "prior", value_name = "ARGS")]
    pub priors: Vec<String>,
    /// Sample from the prior: no, yes or only
    #[arg(long)]
    pub sample_prior: Option<String>,
}

impl ModelArgs {
    /// Formula, family and prior sampling, flags first then `[fit]`.
    pub fn spec(&self, defaults: &FitConfig) -> Result<ModelSpec> {
        let mut spec = ModelSpec::new(&self.formula);
        if let Some(family) = self.family.as_ref().or(defaults.family.as_ref()) {
            let family = family.parse::<Family>().context("reading the model family")?;
            spec = spec.with_family(family);
        }
        if let Some(mode) = self.sample_prior.as_ref().or(defaults.sample_prior.as_ref()) {
            let mode = mode.parse::<SamplePrior>().context("reading sample_prior")?;
            spec = spec.with_sample_prior(mode);
        }
        Ok(spec)
    }

    pub fn priors(&self) -> Result<Vec<PriorSpec>> {
        self.priors
            .iter()
            .map(|p| p.parse::<PriorSpec>().with_context(|| format!("reading prior '{p}'")))
            .collect()
    }

    /// The model data, from `--data` or `--dataset`.
    pub fn input(&self, session: &Session) -> Result<TabularInput> {
        match (&self.data, &self.dataset) {
            (Some(path), _) => read_input(path),
            (None, Some(name)) => Ok(TabularInput::Table(
                session
                    .get_brms_data(name)
                    .with_context(|| format!("fetching brms dataset '{name}'"))?,
            )),
            (None, None) => bail!("specify --data <file.json> or --dataset <name>"),
        }
    }
}

/// Read model data from a JSON file.
pub fn read_input(path: &Path) -> Result<TabularInput> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    TabularInput::from_json(value).with_context(|| format!("reading data from {}", path.display()))
}

/// Initialise R and brms and probe the backends.
pub fn open_session(config: &BrmstanConfig, config_dir: &Path) -> Result<Session> {
    Session::open(&config.session_config(config_dir)).context("initialising R and brms")
}

/// Write `text` to `output`, or print it.
pub fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brmstan::Column;

    pub(crate) fn model_args(formula: &str) -> ModelArgs {
        ModelArgs {
            formula: formula.to_string(),
            data: None,
            dataset: None,
            family: None,
            priors: Vec::new(),
            sample_prior: None,
        }
    }

    #[test]
    fn spec_prefers_flags_over_config() {
        let defaults = FitConfig {
            family: Some("poisson".to_string()),
            backend: None,
            sample_prior: Some("yes".to_string()),
        };
        let mut model = model_args("count ~ zAge");
        model.family = Some("negbinomial".to_string());

        let spec = model.spec(&defaults).unwrap();
        assert_eq!(spec.family.as_str(), "negbinomial");
        assert_eq!(spec.sample_prior, SamplePrior::Yes);
    }

    #[test]
    fn spec_defaults() {
        let spec = model_args("y ~ x").spec(&FitConfig::default()).unwrap();
        assert_eq!(spec.family, Family::gaussian());
        assert_eq!(spec.sample_prior, SamplePrior::No);
    }

    #[test]
    fn bad_sample_prior_is_reported() {
        let mut model = model_args("y ~ x");
        model.sample_prior = Some("sometimes".to_string());
        assert!(model.spec(&FitConfig::default()).is_err());
    }

    #[test]
    fn priors_parse_in_order() {
        let mut model = model_args("y ~ x");
        model.priors = vec!["normal(0, 1);b".to_string(), "cauchy(0, 2);sd".to_string()];
        let priors = model.priors().unwrap();
        assert_eq!(priors.len(), 2);
        assert_eq!(priors[0].args(), &["normal(0, 1)", "b"]);
        assert_eq!(priors[1].args(), &["cauchy(0, 2)", "sd"]);
    }

    #[test]
    fn reads_row_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, r#"[{"y": 1.5, "g": "a"}, {"y": 2.0, "g": "b"}]"#).unwrap();

        match read_input(&path).unwrap() {
            TabularInput::Table(table) => {
                assert_eq!(table.rows(), 2);
                assert_eq!(table.column("y"), Some(&Column::Real(vec![1.5, 2.0])));
            }
            other => panic!("expected a table, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bare_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        let err = read_input(&path).unwrap_err();
        assert!(format!("{err:#}").contains("reading data from"));
    }

    #[test]
    fn emit_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        emit("hello", Some(&path)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }
}
