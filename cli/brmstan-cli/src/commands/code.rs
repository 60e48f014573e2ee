//! `brmstan code`: print the generated Stan program.

use std::path::Path;

use anyhow::{Context, Result};

use super::{open_session, ModelArgs};
use crate::config::BrmstanConfig;

pub fn run(config: &BrmstanConfig, config_dir: &Path, model: &ModelArgs) -> Result<()> {
    let spec = model.spec(&config.fit)?;
    let priors = model.priors()?;
    let session = open_session(config, config_dir)?;
    let data = model.input(&session)?;

    let code = session
        .get_stan_code(&spec, &data, &priors)
        .context("generating Stan code")?;
    print!("{code}");
    if !code.ends_with('\n') {
        println!();
    }
    Ok(())
}
