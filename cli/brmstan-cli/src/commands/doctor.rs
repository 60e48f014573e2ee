//! `brmstan doctor`: R, brms and backend diagnostics.

use std::path::Path;

use anyhow::Result;
use brmstan::{Backends, Brms, NoInstall, Rscript, SessionConfig};

use crate::config::BrmstanConfig;

/// Print what brmstan can reach from `start_dir`.
pub fn run(start_dir: &Path) -> Result<()> {
    println!("=== brmstan doctor ===");
    println!();
    println!("brmstan version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("--- Configuration ---");
    let (config, base_dir) = match BrmstanConfig::find_and_load(start_dir) {
        Ok(Some((config, dir))) => {
            println!("  brmstan.toml: found at {}", dir.display());
            (config, dir)
        }
        Ok(None) => {
            println!("  brmstan.toml: not found (using defaults)");
            (BrmstanConfig::default(), start_dir.to_path_buf())
        }
        Err(e) => {
            println!("  brmstan.toml: error: {e:#}");
            (BrmstanConfig::default(), start_dir.to_path_buf())
        }
    };
    println!();

    report(&config.session_config(&base_dir));
    Ok(())
}

fn report(config: &SessionConfig) {
    println!("--- R ---");
    let rscript = match &config.rscript {
        Some(path) => Rscript::with_executable(path),
        None => Rscript::new(),
    };
    match rscript.version() {
        Some(version) => {
            println!("  Rscript: {version}");
            // Probe only; never install from doctor.
            match Brms::initialize(Box::new(rscript), &NoInstall) {
                Ok(brms) => match brms.version() {
                    Ok(version) => println!("  brms:    {version}"),
                    Err(e) => println!("  brms:    error: {e}"),
                },
                Err(e) => println!("  brms:    {e}"),
            }
        }
        None => {
            println!("  Rscript: not found ({})", rscript.executable().display());
            println!("  brms:    unknown");
        }
    }
    println!();

    println!("--- Backends ---");
    for (kind, status) in Backends::probe(&config.backends).status() {
        match status {
            Ok(description) => println!("  {kind}: {description}"),
            Err(reason) => println!("  {kind}: unavailable ({reason})"),
        }
    }
}
