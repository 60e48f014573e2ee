//! `brmstan dataset`: fetch a brms dataset.

use std::path::Path;

use anyhow::{Context, Result};
use brmstan::Table;
use serde_json::Value;

use super::{emit, open_session};
use crate::config::BrmstanConfig;

pub fn run(
    config: &BrmstanConfig,
    config_dir: &Path,
    name: &str,
    output: Option<&Path>,
) -> Result<()> {
    let session = open_session(config, config_dir)?;
    let table = session
        .get_brms_data(name)
        .with_context(|| format!("fetching brms dataset '{name}'"))?;
    log::info!("'{name}': {} rows, {} columns", table.rows(), table.width());
    emit(&records_json(&table)?, output)
}

/// The table as a pretty-printed JSON array of row objects.
fn records_json(table: &Table) -> Result<String> {
    let records: Vec<Value> = table.to_records().into_iter().map(Value::Object).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brmstan::Column;

    #[test]
    fn records_keep_column_order() {
        let table = Table::new()
            .with_column("count", Column::Int(vec![5, 3]))
            .unwrap()
            .with_column("Trt", Column::factor(["0", "1"]))
            .unwrap();
        let json = records_json(&table).unwrap();
        let parsed: Vec<serde_json::Map<String, Value>> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].keys().collect::<Vec<_>>(), vec!["count", "Trt"]);
        assert_eq!(parsed[1]["Trt"], Value::from("1"));
    }
}
