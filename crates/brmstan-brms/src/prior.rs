//! Prior specifications.
//!
//! A [`PriorSpec`] holds the positional arguments of `brms::prior_string`
//! (`prior, class, coef, group, resp, dpar, nlpar, lb, ub, check`). An ordered
//! list of them folds into one [`CombinedPrior`] by `+`. An empty list folds
//! into `None`: brms treats "no prior argument" differently from an empty
//! prior object, so callers must omit the argument in that case.

use std::fmt;
use std::str::FromStr;

use brmstan_bridge::{r_string, ConversionScope};

use crate::call::RCall;
use crate::error::{BrmsError, Result};

/// Number of positional parameters of `brms::prior_string`.
const PRIOR_STRING_ARITY: usize = 10;

/// Positional arguments for one `brms::prior_string` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorSpec {
    args: Vec<String>,
}

impl PriorSpec {
    /// A prior from its positional arguments, e.g.
    /// `["normal(0, 5)", "b", "zAge"]`.
    pub fn positional<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if args.is_empty() {
            return Err(BrmsError::InvalidPrior {
                detail: "a prior needs at least a distribution".to_string(),
            });
        }
        if args.len() > PRIOR_STRING_ARITY {
            return Err(BrmsError::InvalidPrior {
                detail: format!(
                    "prior_string takes at most {PRIOR_STRING_ARITY} positional arguments, got {}",
                    args.len()
                ),
            });
        }
        Ok(Self { args })
    }

    /// A prior on a class of parameters, e.g. `("normal(0, 5)", "b")`.
    pub fn new(prior: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            args: vec![prior.into(), class.into()],
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The `brms::prior_string(...)` call for this prior.
    pub fn to_call(&self) -> RCall {
        self.args
            .iter()
            .fold(RCall::new("brms::prior_string"), |call, arg| {
                call.positional(r_string(arg))
            })
    }

    /// Fold priors left to right into one combined prior.
    ///
    /// Returns `None` for an empty list. Must not run while a conversion
    /// scope is active.
    pub fn combine(priors: &[PriorSpec]) -> Result<Option<CombinedPrior>> {
        ConversionScope::ensure_inactive("prior construction")?;

        let mut terms = priors.iter().map(|p| p.to_call().to_string());
        let Some(first) = terms.next() else {
            return Ok(None);
        };
        let expr = terms.fold(first, |acc, term| format!("{acc} + {term}"));
        log::debug!("combined {} prior(s)", priors.len());
        Ok(Some(CombinedPrior {
            expr,
            terms: priors.len(),
        }))
    }
}

impl fmt::Display for PriorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args.join(";"))
    }
}

/// Parses the command-line form `prior;class;coef;...`.
impl FromStr for PriorSpec {
    type Err = BrmsError;

    fn from_str(s: &str) -> Result<Self> {
        PriorSpec::positional(s.split(';').map(str::trim))
    }
}

/// Several priors joined with `+`, as one R expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedPrior {
    expr: String,
    terms: usize,
}

impl CombinedPrior {
    /// R source evaluating to a `brmsprior` object.
    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// Number of priors combined.
    pub fn len(&self) -> usize {
        self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms == 0
    }
}
