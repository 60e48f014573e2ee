//! Repairing Stan data after the R bridge.

use brmstan_core::{StanData, StanValue};

use crate::types::{extract_types, VariableTypeMap};

/// Coerce `data` to the types declared in `program`'s data block.
///
/// See [`coerce_with`] for the rules.
pub fn coerce(program: &str, mut data: StanData) -> StanData {
    let types = extract_types(program);
    coerce_with(&types, &mut data);
    data
}

/// Coerce `data` in place:
///
/// 1. values of variables declared `int` are cast to integers;
/// 2. any value holding exactly one element becomes a scalar, whatever its
///    declared type.
///
/// Keys absent from `types` are left as they are, and no keys are added.
pub fn coerce_with(types: &VariableTypeMap, data: &mut StanData) {
    for (name, value) in data.iter_mut() {
        if types.is_int(name) {
            *value = match &*value {
                StanValue::Array(array) => StanValue::Array(array.to_int()),
                StanValue::Real(x) => StanValue::Int(*x as i64),
                StanValue::Int(i) => StanValue::Int(*i),
            };
        }
        if let StanValue::Array(array) = &*value {
            if let Some(scalar) = array.single() {
                log::trace!("unwrapping single-element '{name}'");
                *value = scalar;
            }
        }
    }
}
