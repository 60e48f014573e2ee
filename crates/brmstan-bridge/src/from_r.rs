//! R → host conversion.
//!
//! The R side serialises results with
//! `jsonlite::toJSON(x, digits = NA, matrix = "rowmajor")`. Under those
//! settings an atomic vector is a flat array, a matrix or array is nested
//! row-major, and missing or non-finite reals are the strings `"NA"`,
//! `"NaN"`, `"Inf"` and `"-Inf"`. Every number is read as a real: R's
//! integer storage is not preserved across the bridge.

use brmstan_core::{ArrayData, NumericArray, StanData, StanValue, Table};
use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};
use crate::scope::ConversionScope;

/// Convert the JSON form of an R named list into host numeric arrays.
///
/// Dimensionality is preserved; R scalars arrive as length-1 arrays.
pub fn from_foreign(json: &str) -> Result<StanData> {
    let _scope = ConversionScope::enter();

    let value: Value = serde_json::from_str(json)?;
    let Value::Object(entries) = value else {
        return Err(BridgeError::NotAList {
            found: describe(&value).to_string(),
        });
    };

    let mut data = StanData::with_capacity(entries.len());
    for (name, value) in entries {
        let array = to_array(&name, &value)?;
        log::trace!("bridged '{name}' with shape {:?}", array.shape());
        data.insert(name, StanValue::Array(array));
    }
    log::debug!("bridged {} variable(s) from R", data.len());
    Ok(data)
}

/// Convert an R data frame, serialised as row records, into a [`Table`].
pub fn table_from_foreign(json: &str) -> Result<Table> {
    let _scope = ConversionScope::enter();

    let value: Value = serde_json::from_str(json)?;
    let Value::Array(rows) = value else {
        return Err(BridgeError::NotAList {
            found: describe(&value).to_string(),
        });
    };
    let mut records: Vec<Map<String, Value>> = Vec::with_capacity(rows.len());
    for row in rows {
        match row {
            Value::Object(map) => records.push(map),
            other => {
                return Err(BridgeError::UnsupportedValue {
                    name: "<row>".to_string(),
                    detail: format!("expected a record, got {}", describe(&other)),
                })
            }
        }
    }
    Ok(Table::from_records(&records)?)
}

fn to_array(name: &str, value: &Value) -> Result<NumericArray> {
    let shape = infer_shape(value);
    let mut flat = Vec::with_capacity(shape.iter().product());
    flatten(name, value, &shape, &mut flat)?;
    let shape = if shape.is_empty() { vec![1] } else { shape };
    Ok(NumericArray::new(shape, ArrayData::Real(flat))?)
}

/// Shape implied by following the first element at each level.
fn infer_shape(value: &Value) -> Vec<usize> {
    let mut shape = Vec::new();
    let mut cursor = value;
    while let Value::Array(items) = cursor {
        shape.push(items.len());
        match items.first() {
            Some(first) => cursor = first,
            None => break,
        }
    }
    shape
}

fn flatten(name: &str, value: &Value, shape: &[usize], out: &mut Vec<f64>) -> Result<()> {
    match (value, shape) {
        (Value::Array(items), [len, rest @ ..]) => {
            if items.len() != *len {
                return Err(BridgeError::UnsupportedValue {
                    name: name.to_string(),
                    detail: format!("ragged array (expected {len} elements, got {})", items.len()),
                });
            }
            for item in items {
                flatten(name, item, rest, out)?;
            }
            Ok(())
        }
        (Value::Array(_), []) => Err(BridgeError::UnsupportedValue {
            name: name.to_string(),
            detail: "ragged array (unexpected nesting)".to_string(),
        }),
        (leaf, []) => {
            out.push(leaf_to_f64(name, leaf)?);
            Ok(())
        }
        (other, _) => Err(BridgeError::UnsupportedValue {
            name: name.to_string(),
            detail: format!("ragged array (expected an array, got {})", describe(other)),
        }),
    }
}

fn leaf_to_f64(name: &str, leaf: &Value) -> Result<f64> {
    match leaf {
        Value::Number(n) => n.as_f64().ok_or_else(|| BridgeError::UnsupportedValue {
            name: name.to_string(),
            detail: format!("number {n} out of range"),
        }),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Null => Ok(f64::NAN),
        Value::String(s) => match s.as_str() {
            "NA" | "NaN" => Ok(f64::NAN),
            "Inf" => Ok(f64::INFINITY),
            "-Inf" => Ok(f64::NEG_INFINITY),
            other => Err(BridgeError::UnsupportedValue {
                name: name.to_string(),
                detail: format!("non-numeric value \"{other}\""),
            }),
        },
        other => Err(BridgeError::UnsupportedValue {
            name: name.to_string(),
            detail: format!("nested {} is not supported", describe(other)),
        }),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "logical",
        Value::Number(_) => "number",
        Value::String(_) => "character",
        Value::Array(_) => "vector",
        Value::Object(_) => "list",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brmstan_core::{Column, TabularInput};

    #[test]
    fn vectors_and_scalars() {
        let data = from_foreign(r#"{"N": [3], "Y": [1.5, 2, 0.25]}"#).unwrap();
        let n = data["N"].as_array().unwrap();
        assert_eq!(n.shape(), &[1]);
        assert_eq!(n.data(), &ArrayData::Real(vec![3.0]));
        let y = data["Y"].as_array().unwrap();
        assert_eq!(y.data(), &ArrayData::Real(vec![1.5, 2.0, 0.25]));
    }

    #[test]
    fn matrices_keep_dimensions() {
        let data = from_foreign(r#"{"X": [[1, 0.5], [1, -0.5], [1, 2]]}"#).unwrap();
        let x = data["X"].as_array().unwrap();
        assert_eq!(x.shape(), &[3, 2]);
        assert_eq!(
            x.data(),
            &ArrayData::Real(vec![1.0, 0.5, 1.0, -0.5, 1.0, 2.0])
        );
    }

    #[test]
    fn empty_vector_has_zero_length() {
        let data = from_foreign(r#"{"Z": []}"#).unwrap();
        assert_eq!(data["Z"].as_array().unwrap().shape(), &[0]);
    }

    #[test]
    fn r_special_values() {
        let data = from_foreign(r#"{"v": ["NA", "Inf", "-Inf", 1]}"#).unwrap();
        let ArrayData::Real(v) = data["v"].as_array().unwrap().data().clone() else {
            panic!("expected reals");
        };
        assert!(v[0].is_nan());
        assert_eq!(v[1], f64::INFINITY);
        assert_eq!(v[2], f64::NEG_INFINITY);
        assert_eq!(v[3], 1.0);
    }

    #[test]
    fn ragged_arrays_are_rejected() {
        let err = from_foreign(r#"{"X": [[1, 2], [3]]}"#).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedValue { .. }));
    }

    #[test]
    fn character_values_are_rejected() {
        let err = from_foreign(r#"{"g": ["a", "b"]}"#).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedValue { .. }));
    }

    #[test]
    fn non_list_is_rejected() {
        let err = from_foreign("[1, 2]").unwrap_err();
        assert!(matches!(err, BridgeError::NotAList { .. }));
    }

    #[test]
    fn data_frame_round_trip() {
        let table = Table::new()
            .with_column("count", Column::Int(vec![5, 3, 0]))
            .unwrap()
            .with_column("zBase", Column::Real(vec![-0.75, 0.5, 1.25]))
            .unwrap()
            .with_column("Trt", Column::factor(["0", "1", "1"]))
            .unwrap();

        // What jsonlite writes for the data.frame built from this table.
        let records = serde_json::to_string(&table.to_records()).unwrap();
        let back = table_from_foreign(&records).unwrap();
        assert_eq!(back, table);

        let input = TabularInput::Table(back);
        assert_eq!(input.names(), vec!["count", "zBase", "Trt"]);
        assert!(!ConversionScope::is_active());
    }
}
