//! Posterior draws.

use serde::{Deserialize, Serialize};

use crate::error::{BackendError, Result};

/// Draws from one fit: column names plus, per chain, one row per draw.
///
/// Columns include sampler diagnostics (`lp__`, `accept_stat__`, ...) as
/// well as model parameters, in the order the backend reported them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Posterior {
    columns: Vec<String>,
    chains: Vec<Vec<Vec<f64>>>,
}

impl Posterior {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            chains: Vec::new(),
        }
    }

    /// Append a chain; every row must have one value per column.
    pub fn push_chain(&mut self, draws: Vec<Vec<f64>>) -> Result<()> {
        if let Some(row) = draws.iter().find(|r| r.len() != self.columns.len()) {
            return Err(BackendError::Output {
                detail: format!(
                    "draw has {} values, expected {}",
                    row.len(),
                    self.columns.len()
                ),
            });
        }
        self.chains.push(draws);
        Ok(())
    }

    /// Merge another posterior with identical columns, chain by chain.
    pub fn extend(&mut self, other: Posterior) -> Result<()> {
        if self.columns.is_empty() && self.chains.is_empty() {
            *self = other;
            return Ok(());
        }
        if other.columns != self.columns {
            return Err(BackendError::Output {
                detail: "chains report different columns".to_string(),
            });
        }
        self.chains.extend(other.chains);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    /// Total draws across chains.
    pub fn num_draws(&self) -> usize {
        self.chains.iter().map(Vec::len).sum()
    }

    /// Rows of one chain.
    pub fn chain(&self, index: usize) -> Option<&[Vec<f64>]> {
        self.chains.get(index).map(Vec::as_slice)
    }

    /// All draws of one column, chains concatenated.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(
            self.chains
                .iter()
                .flat_map(|chain| chain.iter().map(move |row| row[idx]))
                .collect(),
        )
    }

    /// Mean of one column over all draws.
    pub fn mean(&self, name: &str) -> Option<f64> {
        let values = self.column(name)?;
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Model quantities only: columns not ending in `__`.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|c| !c.ends_with("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_chains() -> Posterior {
        let mut p = Posterior::new(vec!["lp__".into(), "b_Intercept".into()]);
        p.push_chain(vec![vec![-3.0, 1.0], vec![-2.0, 3.0]]).unwrap();
        p.push_chain(vec![vec![-4.0, 2.0]]).unwrap();
        p
    }

    #[test]
    fn columns_concatenate_chains() {
        let p = two_chains();
        assert_eq!(p.num_chains(), 2);
        assert_eq!(p.num_draws(), 3);
        assert_eq!(p.column("b_Intercept"), Some(vec![1.0, 3.0, 2.0]));
        assert_eq!(p.mean("b_Intercept"), Some(2.0));
        assert_eq!(p.column("sigma"), None);
    }

    #[test]
    fn diagnostics_are_not_parameters() {
        let p = two_chains();
        assert_eq!(p.parameter_names().collect::<Vec<_>>(), vec!["b_Intercept"]);
    }

    #[test]
    fn row_width_is_checked() {
        let mut p = Posterior::new(vec!["a".into()]);
        assert!(p.push_chain(vec![vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn extend_requires_matching_columns() {
        let mut p = Posterior::default();
        p.extend(two_chains()).unwrap();
        p.extend(two_chains()).unwrap();
        assert_eq!(p.num_chains(), 4);
        assert!(p.extend(Posterior::new(vec!["other".into()])).is_err());
    }
}
