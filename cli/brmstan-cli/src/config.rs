//! `brmstan.toml` configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use brmstan::{BackendConfig, SessionConfig};
use serde::{Deserialize, Serialize};

/// File name searched for, upward from the working directory.
pub const CONFIG_FILE: &str = "brmstan.toml";

/// The whole configuration file. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrmstanConfig {
    #[serde(default)]
    pub r: RConfig,
    #[serde(default)]
    pub cmdstan: CmdStanConfig,
    #[serde(default)]
    pub pystan: PyStanConfig,
    #[serde(default)]
    pub fit: FitConfig,
}

/// `[r]`: the R interpreter and package installation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RConfig {
    /// `Rscript` executable.
    #[serde(default)]
    pub rscript: Option<PathBuf>,
    /// CRAN mirror for installing missing packages.
    #[serde(default)]
    pub cran_mirror: Option<String>,
    /// Install missing packages (default true).
    #[serde(default)]
    pub auto_install: Option<bool>,
}

/// `[cmdstan]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CmdStanConfig {
    /// CmdStan installation; relative paths are resolved against the
    /// directory holding `brmstan.toml`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub make: Option<String>,
}

/// `[pystan]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PyStanConfig {
    /// httpstan server URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Interpreter with legacy pystan installed.
    #[serde(default)]
    pub python: Option<String>,
}

/// `[fit]`: defaults for `code`, `data` and `fit`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub sample_prior: Option<String>,
}

impl BrmstanConfig {
    /// Search upward from `start_dir` for `brmstan.toml`, returning it with
    /// the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let config: BrmstanConfig = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                log::debug!("loaded {}", candidate.display());
                return Ok(Some((config, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing brmstan.toml")
    }

    /// Session settings, with relative paths taken from `base_dir`.
    pub fn session_config(&self, base_dir: &Path) -> SessionConfig {
        let defaults = SessionConfig::default();
        let backend_defaults = BackendConfig::default();
        SessionConfig {
            rscript: self.r.rscript.clone(),
            cran_mirror: self.r.cran_mirror.clone().unwrap_or(defaults.cran_mirror),
            auto_install: self.r.auto_install.unwrap_or(defaults.auto_install),
            backends: BackendConfig {
                cmdstan: self.cmdstan.path.as_ref().map(|p| base_dir.join(p)),
                make: self.cmdstan.make.clone().unwrap_or(backend_defaults.make),
                httpstan_url: self.pystan.url.clone().unwrap_or(backend_defaults.httpstan_url),
                python: self.pystan.python.clone().unwrap_or(backend_defaults.python),
            },
        }
    }

    /// Contents written by `brmstan init`.
    pub fn template() -> String {
        r#"# brmstan configuration

[r]
# rscript = "/usr/bin/Rscript"
cran_mirror = "https://cloud.r-project.org"
auto_install = true

[cmdstan]
# path = "/opt/cmdstan"
make = "make"

[pystan]
url = "http://127.0.0.1:8080"
python = "python3"

[fit]
family = "gaussian"
backend = "pystan"
sample_prior = "no"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = BrmstanConfig::from_str(
            r#"
[r]
rscript = "/usr/local/bin/Rscript"
auto_install = false

[cmdstan]
path = "tools/cmdstan"

[pystan]
url = "http://stan.internal:8080"

[fit]
family = "poisson"
backend = "cmdstanpy"
"#,
        )
        .unwrap();
        assert_eq!(config.r.rscript, Some(PathBuf::from("/usr/local/bin/Rscript")));
        assert_eq!(config.fit.backend.as_deref(), Some("cmdstanpy"));

        let session = config.session_config(Path::new("/work"));
        assert!(!session.auto_install);
        assert_eq!(session.cran_mirror, "https://cloud.r-project.org");
        assert_eq!(
            session.backends.cmdstan,
            Some(PathBuf::from("/work/tools/cmdstan"))
        );
        assert_eq!(session.backends.httpstan_url, "http://stan.internal:8080");
        assert_eq!(session.backends.python, "python3");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = BrmstanConfig::from_str("").unwrap();
        assert_eq!(config, BrmstanConfig::default());
        let session = config.session_config(Path::new("."));
        assert!(session.auto_install);
        assert!(session.backends.cmdstan.is_none());
    }

    #[test]
    fn reject_invalid_toml() {
        assert!(BrmstanConfig::from_str("[r\nrscript = ").is_err());
    }

    #[test]
    fn template_is_valid_toml() {
        let config = BrmstanConfig::from_str(&BrmstanConfig::template()).unwrap();
        assert_eq!(config.fit.family.as_deref(), Some("gaussian"));
        assert_eq!(config.fit.backend.as_deref(), Some("pystan"));
        assert_eq!(config.r.auto_install, Some(true));
    }

    #[test]
    fn find_and_load_in_current_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[fit]\nfamily = \"bernoulli\"\n").unwrap();

        let (config, found) = BrmstanConfig::find_and_load(dir.path()).unwrap().unwrap();
        assert_eq!(config.fit.family.as_deref(), Some("bernoulli"));
        assert_eq!(found, dir.path());
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "").unwrap();
        let nested = dir.path().join("analysis").join("models");
        std::fs::create_dir_all(&nested).unwrap();

        let (_, found) = BrmstanConfig::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(found, dir.path());
    }

    #[test]
    fn find_and_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[fit\n").unwrap();
        let err = BrmstanConfig::find_and_load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
