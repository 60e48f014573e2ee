//! `brmstan init`: write a default configuration.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::config::{BrmstanConfig, CONFIG_FILE};

/// Write `brmstan.toml` into `dir`.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    fs::write(&path, BrmstanConfig::template())
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), false).unwrap();

        let (config, found) = BrmstanConfig::find_and_load(dir.path()).unwrap().unwrap();
        assert_eq!(found, dir.path());
        assert_eq!(config.pystan.python.as_deref(), Some("python3"));
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[fit]\n").unwrap();
        assert!(run(dir.path(), false).is_err());
        assert_eq!(fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap(), "[fit]\n");

        run(dir.path(), true).unwrap();
        assert!(fs::read_to_string(dir.path().join(CONFIG_FILE))
            .unwrap()
            .contains("[cmdstan]"));
    }
}
