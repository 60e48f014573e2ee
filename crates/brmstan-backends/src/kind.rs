//! Backend names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// The supported sampling backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// CmdStan, as driven by `cmdstanpy`.
    #[serde(rename = "cmdstanpy")]
    CmdStanPy,
    /// PyStan (httpstan or legacy pystan 2).
    #[default]
    #[serde(rename = "pystan")]
    PyStan,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::CmdStanPy, BackendKind::PyStan];

    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::CmdStanPy => "cmdstanpy",
            BackendKind::PyStan => "pystan",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cmdstanpy" => Ok(BackendKind::CmdStanPy),
            "pystan" => Ok(BackendKind::PyStan),
            other => Err(BackendError::Unsupported {
                name: other.to_string(),
            }),
        }
    }
}
