//! Host → R conversion.

use std::fmt;

use brmstan_core::{Column, TabularInput, Table};
use indexmap::IndexMap;

use crate::literal::{r_name, r_vector};
use crate::scope::ConversionScope;

/// Which R structure a [`ForeignData`] builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKind {
    /// `data.frame`, built from a table.
    DataFrame,
    /// Named `list`, built from a mapping.
    List,
}

impl fmt::Display for ForeignKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForeignKind::DataFrame => write!(f, "data.frame"),
            ForeignKind::List => write!(f, "list"),
        }
    }
}

/// The R-side form of the caller's data: an R expression that evaluates to
/// a `data.frame` or a named `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignData {
    kind: ForeignKind,
    expr: String,
}

impl ForeignData {
    pub fn kind(&self) -> ForeignKind {
        self.kind
    }

    /// R source that evaluates to the data object.
    pub fn expr(&self) -> &str {
        &self.expr
    }
}

/// Convert caller data into its R representation.
///
/// Tables keep column names and row order; mappings keep keys and
/// per-key sequences.
pub fn to_foreign(input: &TabularInput) -> ForeignData {
    let _scope = ConversionScope::enter();
    let data = match input {
        TabularInput::Table(table) => data_frame(table),
        TabularInput::Mapping(map) => named_list(map),
    };
    log::debug!(
        "bridged {} variable(s) to R {}",
        input.names().len(),
        data.kind
    );
    data
}

fn data_frame(table: &Table) -> ForeignData {
    let mut args: Vec<String> = table
        .columns()
        .map(|(name, column)| format!("{} = {}", r_name(name), r_vector(column)))
        .collect();
    args.push("check.names = FALSE".to_string());
    args.push("stringsAsFactors = FALSE".to_string());
    ForeignData {
        kind: ForeignKind::DataFrame,
        expr: format!("data.frame({})", args.join(", ")),
    }
}

fn named_list(map: &IndexMap<String, Column>) -> ForeignData {
    let args: Vec<String> = map
        .iter()
        .map(|(name, column)| format!("{} = {}", r_name(name), r_vector(column)))
        .collect();
    ForeignData {
        kind: ForeignKind::List,
        expr: format!("list({})", args.join(", ")),
    }
}
