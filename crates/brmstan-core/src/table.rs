//! Tabular input accepted by the fitting pipeline.
//!
//! A caller supplies either a rectangular [`Table`] (named columns of equal
//! length) or a mapping from variable name to a [`Column`]. JSON input is
//! classified by shape: an array of row objects is a table, an object is a
//! mapping, and anything else is rejected.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// A homogeneous column of values.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Real-valued column.
    Real(Vec<f64>),
    /// Integer-valued column.
    Int(Vec<i64>),
    /// Categorical column, passed to R as a factor. `None` is a missing level.
    Factor(Vec<Option<String>>),
}

impl Column {
    /// A factor column with no missing values.
    pub fn factor<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Column::Factor(levels.into_iter().map(|s| Some(s.into())).collect())
    }

    /// Number of elements in the column.
    pub fn len(&self) -> usize {
        match self {
            Column::Real(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Factor(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the element kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Column::Real(_) => "real",
            Column::Int(_) => "int",
            Column::Factor(_) => "factor",
        }
    }

    /// Infer a column from a sequence of JSON scalars.
    ///
    /// Any string makes the column a factor, with `null` as a missing level.
    /// Otherwise all-integer (or boolean) values give an integer column, and
    /// everything else is real with `null` read as NaN.
    pub fn from_json_values(name: &str, values: &[Value]) -> Result<Self> {
        for v in values {
            if v.is_array() || v.is_object() {
                return Err(CoreError::UnsupportedValue {
                    name: name.to_string(),
                    detail: "nested arrays and objects are not supported".to_string(),
                });
            }
        }

        if values.iter().any(Value::is_string) {
            let levels = values
                .iter()
                .map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect();
            return Ok(Column::Factor(levels));
        }

        let all_int = values.iter().all(|v| match v {
            Value::Number(n) => n.is_i64(),
            Value::Bool(_) => true,
            _ => false,
        });
        if all_int {
            let ints = values
                .iter()
                .map(|v| match v {
                    Value::Bool(b) => i64::from(*b),
                    other => other.as_i64().unwrap_or_default(),
                })
                .collect();
            return Ok(Column::Int(ints));
        }

        let reals = values
            .iter()
            .map(|v| match v {
                Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
                Value::Bool(b) => f64::from(u8::from(*b)),
                _ => f64::NAN,
            })
            .collect();
        Ok(Column::Real(reals))
    }
}

/// A rectangular table: named columns of equal length, rows aligned by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: IndexMap<String, Column>,
    rows: usize,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, builder style.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self> {
        self.push_column(name, column)?;
        Ok(self)
    }

    /// Append a column. The first column fixes the row count.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(CoreError::DuplicateColumn { name });
        }
        if self.columns.is_empty() {
            self.rows = column.len();
        } else if column.len() != self.rows {
            return Err(CoreError::ColumnLengthMismatch {
                column: name,
                expected: self.rows,
                actual: column.len(),
            });
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Iterate `(name, column)` pairs in order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a table from row records. Column order follows first appearance;
    /// a key missing from a record is read as `null`.
    pub fn from_records(records: &[Map<String, Value>]) -> Result<Self> {
        let mut names: Vec<&str> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !names.contains(&key.as_str()) {
                    names.push(key);
                }
            }
        }

        let mut table = Table::new();
        for name in names {
            let values: Vec<Value> = records
                .iter()
                .map(|r| r.get(name).cloned().unwrap_or(Value::Null))
                .collect();
            table.push_column(name, Column::from_json_values(name, &values)?)?;
        }
        Ok(table)
    }

    /// Render the table as JSON records, one object per row.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        (0..self.rows)
            .map(|row| {
                self.columns
                    .iter()
                    .map(|(name, column)| {
                        let cell = match column {
                            Column::Real(v) => serde_json::Number::from_f64(v[row])
                                .map(Value::Number)
                                .unwrap_or(Value::Null),
                            Column::Int(v) => Value::from(v[row]),
                            Column::Factor(v) => v[row].clone().map_or(Value::Null, Value::String),
                        };
                        (name.clone(), cell)
                    })
                    .collect()
            })
            .collect()
    }
}

/// The caller's data: exactly one of a table or a name → column mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum TabularInput {
    Table(Table),
    Mapping(IndexMap<String, Column>),
}

impl TabularInput {
    /// Classify a JSON document as a table or a mapping.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => {
                let mut records = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(map) => records.push(map),
                        other => {
                            return Err(CoreError::UnsupportedInputShape {
                                found: format!("array containing {}", json_kind(&other)),
                            })
                        }
                    }
                }
                Ok(TabularInput::Table(Table::from_records(&records)?))
            }
            Value::Object(map) => {
                let mut mapping = IndexMap::with_capacity(map.len());
                for (name, value) in map {
                    let column = match value {
                        Value::Array(values) => Column::from_json_values(&name, &values)?,
                        scalar => Column::from_json_values(&name, std::slice::from_ref(&scalar))?,
                    };
                    mapping.insert(name, column);
                }
                Ok(TabularInput::Mapping(mapping))
            }
            other => Err(CoreError::UnsupportedInputShape {
                found: json_kind(&other).to_string(),
            }),
        }
    }

    /// Variable names, in order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            TabularInput::Table(t) => t.column_names().collect(),
            TabularInput::Mapping(m) => m.keys().map(String::as_str).collect(),
        }
    }
}

impl From<Table> for TabularInput {
    fn from(table: Table) -> Self {
        TabularInput::Table(table)
    }
}

impl From<IndexMap<String, Column>> for TabularInput {
    fn from(mapping: IndexMap<String, Column>) -> Self {
        TabularInput::Mapping(mapping)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
