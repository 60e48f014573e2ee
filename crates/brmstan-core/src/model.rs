//! Model specification passed to brms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A brms response family, e.g. `gaussian`, `poisson`, `bernoulli`.
///
/// brms resolves the name itself; this only checks that it is a plain R
/// identifier so it can be spliced into a call safely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Family(String);

impl Family {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if !valid {
            return Err(CoreError::InvalidFamily { value: name });
        }
        Ok(Family(name))
    }

    pub fn gaussian() -> Self {
        Family("gaussian".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Family {
    fn default() -> Self {
        Family::gaussian()
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Family {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Family::new(s)
    }
}

impl TryFrom<String> for Family {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        Family::new(s)
    }
}

impl From<Family> for String {
    fn from(f: Family) -> Self {
        f.0
    }
}

/// Whether brms should also draw from the priors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplePrior {
    #[default]
    No,
    Yes,
    Only,
}

impl SamplePrior {
    pub fn as_str(self) -> &'static str {
        match self {
            SamplePrior::No => "no",
            SamplePrior::Yes => "yes",
            SamplePrior::Only => "only",
        }
    }
}

impl fmt::Display for SamplePrior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplePrior {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "no" => Ok(SamplePrior::No),
            "yes" => Ok(SamplePrior::Yes),
            "only" => Ok(SamplePrior::Only),
            other => Err(CoreError::InvalidSamplePrior {
                value: other.to_string(),
            }),
        }
    }
}

/// Formula, family and prior-sampling mode for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    /// brms formula, e.g. `count ~ zAge + zBase * Trt + (1|patient)`.
    pub formula: String,
    pub family: Family,
    pub sample_prior: SamplePrior,
}

impl ModelSpec {
    /// A gaussian model with `sample_prior = "no"`.
    pub fn new(formula: impl Into<String>) -> Self {
        Self {
            formula: formula.into(),
            family: Family::default(),
            sample_prior: SamplePrior::default(),
        }
    }

    pub fn with_family(mut self, family: Family) -> Self {
        self.family = family;
        self
    }

    pub fn with_sample_prior(mut self, sample_prior: SamplePrior) -> Self {
        self.sample_prior = sample_prior;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_validation() {
        assert_eq!(Family::new("poisson").unwrap().as_str(), "poisson");
        assert!(Family::new("zero_inflated_poisson").is_ok());
        assert!(Family::new("").is_err());
        assert!(Family::new("gaussian(); system('rm')").is_err());
    }

    #[test]
    fn sample_prior_parses() {
        assert_eq!("only".parse::<SamplePrior>().unwrap(), SamplePrior::Only);
        assert!("maybe".parse::<SamplePrior>().is_err());
    }

    #[test]
    fn spec_defaults() {
        let spec = ModelSpec::new("y ~ x");
        assert_eq!(spec.family, Family::gaussian());
        assert_eq!(spec.sample_prior, SamplePrior::No);
    }
}
