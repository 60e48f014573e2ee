//! Stan CSV output parsing.
//!
//! CmdStan writes configuration and adaptation details as `#` comment lines,
//! then one header row of column names, then one row per saved draw.

use std::path::Path;

use crate::error::{BackendError, Result};
use crate::posterior::Posterior;

/// Parse one chain's CSV text into a single-chain [`Posterior`].
pub fn parse(text: &str) -> Result<Posterior> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.starts_with('#') && !l.trim().is_empty());

    let (_, header) = lines.next().ok_or_else(|| BackendError::Output {
        detail: "CSV has no header row".to_string(),
    })?;
    let columns: Vec<String> = header.split(',').map(|c| c.trim().to_string()).collect();

    let mut draws = Vec::new();
    for (number, line) in lines {
        let row = line
            .split(',')
            .map(|cell| parse_cell(cell.trim()))
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| BackendError::Output {
                detail: format!("non-numeric value on line {}", number + 1),
            })?;
        draws.push(row);
    }

    let mut posterior = Posterior::new(columns);
    posterior.push_chain(draws)?;
    Ok(posterior)
}

/// Parse a CSV file.
pub fn read(path: &Path) -> Result<Posterior> {
    parse(&std::fs::read_to_string(path)?)
}

fn parse_cell(cell: &str) -> Option<f64> {
    match cell {
        "nan" | "NaN" => Some(f64::NAN),
        "inf" | "Inf" => Some(f64::INFINITY),
        "-inf" | "-Inf" => Some(f64::NEG_INFINITY),
        other => other.parse().ok(),
    }
}
