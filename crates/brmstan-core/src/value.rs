//! Stan data values on the host side.
//!
//! Preprocessed data arrives from R as real-valued arrays of arbitrary rank.
//! [`StanValue`] distinguishes scalars from arrays so that single-element
//! arrays can be unwrapped, and [`ArrayData`] distinguishes integer from real
//! storage so that `int` declarations can be honoured. Serialisation follows
//! the Stan JSON data format: nested row-major arrays, with non-finite reals
//! written as strings.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{CoreError, Result};

/// Preprocessed data: variable name → value, in declaration order.
pub type StanData = IndexMap<String, StanValue>;

/// Flat element storage of a [`NumericArray`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Real(Vec<f64>),
    Int(Vec<i64>),
}

impl ArrayData {
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Real(v) => v.len(),
            ArrayData::Int(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A dense row-major array with an explicit shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl NumericArray {
    /// Create an array, checking that the shape covers every element.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(CoreError::ShapeMismatch {
                shape,
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// A rank-1 real array.
    pub fn real_vector(values: Vec<f64>) -> Self {
        Self {
            shape: vec![values.len()],
            data: ArrayData::Real(values),
        }
    }

    /// A rank-1 integer array.
    pub fn int_vector(values: Vec<i64>) -> Self {
        Self {
            shape: vec![values.len()],
            data: ArrayData::Int(values),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Total element count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_int(&self) -> bool {
        matches!(self.data, ArrayData::Int(_))
    }

    /// Reinterpret the elements as integers, keeping the shape.
    ///
    /// Reals are truncated toward zero. Values produced by brms for `int`
    /// declarations are integral, so nothing is lost in practice.
    pub fn to_int(&self) -> Self {
        let data = match &self.data {
            ArrayData::Int(v) => ArrayData::Int(v.clone()),
            ArrayData::Real(v) => ArrayData::Int(v.iter().map(|x| *x as i64).collect()),
        };
        Self {
            shape: self.shape.clone(),
            data,
        }
    }

    /// The only element as a scalar, if the array holds exactly one.
    pub fn single(&self) -> Option<StanValue> {
        match &self.data {
            ArrayData::Real(v) if v.len() == 1 => Some(StanValue::Real(v[0])),
            ArrayData::Int(v) if v.len() == 1 => Some(StanValue::Int(v[0])),
            _ => None,
        }
    }

    /// Nested JSON arrays in row-major order.
    pub fn to_json(&self) -> Value {
        let flat: Vec<Value> = match &self.data {
            ArrayData::Real(v) => v.iter().copied().map(real_to_json).collect(),
            ArrayData::Int(v) => v.iter().copied().map(Value::from).collect(),
        };
        if self.shape.is_empty() {
            return flat.into_iter().next().unwrap_or(Value::Null);
        }
        nest(&self.shape, &flat)
    }
}

fn nest(shape: &[usize], flat: &[Value]) -> Value {
    match shape {
        [] => flat.first().cloned().unwrap_or(Value::Null),
        [_] => Value::Array(flat.to_vec()),
        [outer, rest @ ..] => {
            let stride: usize = rest.iter().product();
            let items = (0..*outer)
                .map(|i| nest(rest, &flat[i * stride..(i + 1) * stride]))
                .collect();
            Value::Array(items)
        }
    }
}

/// Stan JSON writes non-finite reals as strings.
fn real_to_json(x: f64) -> Value {
    if x.is_nan() {
        Value::String("NaN".into())
    } else if x.is_infinite() {
        Value::String(if x > 0.0 { "inf" } else { "-inf" }.into())
    } else {
        serde_json::Number::from_f64(x)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// A single Stan data entry.
#[derive(Debug, Clone, PartialEq)]
pub enum StanValue {
    Real(f64),
    Int(i64),
    Array(NumericArray),
}

impl StanValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            StanValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&NumericArray> {
        match self {
            StanValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Element count; scalars count as one.
    pub fn len(&self) -> usize {
        match self {
            StanValue::Array(a) => a.len(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json(&self) -> Value {
        match self {
            StanValue::Real(x) => real_to_json(*x),
            StanValue::Int(i) => Value::from(*i),
            StanValue::Array(a) => a.to_json(),
        }
    }
}

impl Serialize for StanValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl Serialize for NumericArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
