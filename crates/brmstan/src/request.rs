//! Fit requests.

use brmstan_backends::SampleArgs;
use brmstan_brms::PriorSpec;
use brmstan_core::{Family, ModelSpec, SamplePrior, TabularInput};
use serde_json::Value;

/// Everything `Session::fit` needs.
///
/// Defaults: no priors, `gaussian` family, `sample_prior = "no"`,
/// sampling on, backend `pystan`, no backend arguments.
#[derive(Debug, Clone)]
pub struct FitRequest<'a> {
    pub spec: ModelSpec,
    pub data: &'a TabularInput,
    pub priors: &'a [PriorSpec],
    pub sample: bool,
    /// Backend name; checked when the fit starts.
    pub backend: String,
    pub args: SampleArgs,
}

impl<'a> FitRequest<'a> {
    pub fn new(formula: impl Into<String>, data: &'a TabularInput) -> Self {
        Self {
            spec: ModelSpec::new(formula),
            data,
            priors: &[],
            sample: true,
            backend: "pystan".to_string(),
            args: SampleArgs::new(),
        }
    }

    pub fn with_priors(mut self, priors: &'a [PriorSpec]) -> Self {
        self.priors = priors;
        self
    }

    pub fn with_family(mut self, family: Family) -> Self {
        self.spec = self.spec.with_family(family);
        self
    }

    pub fn with_sample_prior(mut self, sample_prior: SamplePrior) -> Self {
        self.spec = self.spec.with_sample_prior(sample_prior);
        self
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    /// Build the model but do not sample.
    pub fn without_sampling(mut self) -> Self {
        self.sample = false;
        self
    }

    pub fn with_args(mut self, args: SampleArgs) -> Self {
        self.args = args;
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brmstan_core::Table;

    #[test]
    fn defaults() {
        let data = TabularInput::Table(Table::new());
        let request = FitRequest::new("y ~ x", &data);
        assert!(request.priors.is_empty());
        assert_eq!(request.spec.family, Family::gaussian());
        assert_eq!(request.spec.sample_prior, SamplePrior::No);
        assert!(request.sample);
        assert_eq!(request.backend, "pystan");
        assert!(request.args.is_empty());
    }

    #[test]
    fn builders() {
        let data = TabularInput::Table(Table::new());
        let priors = [PriorSpec::new("normal(0, 1)", "b")];
        let request = FitRequest::new("y ~ x", &data)
            .with_priors(&priors)
            .with_backend("cmdstanpy")
            .without_sampling()
            .with_arg("chains", 2);
        assert_eq!(request.priors.len(), 1);
        assert_eq!(request.backend, "cmdstanpy");
        assert!(!request.sample);
        assert_eq!(request.args.chains().unwrap(), 2);
    }
}
