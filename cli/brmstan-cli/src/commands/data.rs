//! `brmstan data`: print the Stan data for a model.

use std::path::Path;

use anyhow::{Context, Result};

use super::{emit, open_session, ModelArgs};
use crate::config::BrmstanConfig;

pub fn run(
    config: &BrmstanConfig,
    config_dir: &Path,
    model: &ModelArgs,
    output: Option<&Path>,
) -> Result<()> {
    let spec = model.spec(&config.fit)?;
    let priors = model.priors()?;
    let session = open_session(config, config_dir)?;
    let data = model.input(&session)?;

    let prepared = session
        .prepare(&spec, &data, &priors)
        .context("preparing Stan data")?;
    let json = serde_json::to_string_pretty(&prepared.data)?;
    emit(&json, output)
}
