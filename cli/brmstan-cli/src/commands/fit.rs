//! `brmstan fit`: build and sample a model.

use std::path::Path;

use anyhow::{Context, Result};
use brmstan::{BackendKind, FitOutcome, FitRequest, Posterior, SampleArgs};

use super::{emit, open_session, ModelArgs};
use crate::config::BrmstanConfig;

pub fn run(
    config: &BrmstanConfig,
    config_dir: &Path,
    model: &ModelArgs,
    backend: Option<&str>,
    sample: bool,
    args: &[String],
    output: Option<&Path>,
) -> Result<()> {
    let spec = model.spec(&config.fit)?;
    let priors = model.priors()?;
    let args = parse_args(args)?;
    let backend = backend_kind(backend, config.fit.backend.as_deref())?;

    let session = open_session(config, config_dir)?;
    let data = model.input(&session)?;

    let mut request = FitRequest::new(spec.formula.clone(), &data)
        .with_priors(&priors)
        .with_family(spec.family.clone())
        .with_sample_prior(spec.sample_prior)
        .with_backend(backend.as_str())
        .with_args(args);
    if !sample {
        request = request.without_sampling();
    }

    match session.fit(&request).context("fitting the model")? {
        FitOutcome::Unsampled(model) => {
            println!("Built {}", model.describe());
            Ok(())
        }
        FitOutcome::Sampled(posterior) => match output {
            Some(path) => emit(&serde_json::to_string(&posterior)?, Some(path)),
            None => {
                print!("{}", summary(&posterior));
                Ok(())
            }
        },
    }
}

/// The requested backend, checked before R or any backend is touched.
fn backend_kind(flag: Option<&str>, configured: Option<&str>) -> Result<BackendKind> {
    match flag.or(configured) {
        Some(name) => Ok(name.parse::<BackendKind>()?),
        None => Ok(BackendKind::default()),
    }
}

fn parse_args(pairs: &[String]) -> Result<SampleArgs> {
    pairs
        .iter()
        .map(|pair| {
            SampleArgs::parse_pair(pair).with_context(|| format!("reading --arg '{pair}'"))
        })
        .collect()
}

/// One line per column: name and posterior mean.
fn summary(posterior: &Posterior) -> String {
    let width = posterior
        .columns()
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max("column".len());
    let mut out = format!(
        "{} chain(s), {} draw(s)\n{:<width$}  {:>12}\n",
        posterior.num_chains(),
        posterior.num_draws(),
        "column",
        "mean"
    );
    for column in posterior.columns() {
        let mean = posterior.mean(column).unwrap_or(f64::NAN);
        out.push_str(&format!("{column:<width$}  {mean:>12.4}\n"));
    }
    out
}
