//! Data-block type recovery.
//!
//! Numbers cross the R bridge as reals, so `int` data would reach the
//! sampler with the wrong type. This crate reads the generated Stan
//! program's `data { ... }` block to learn each variable's declared type and
//! repairs the data accordingly.
//!
//! - [`types`]: `extract_types` and `VariableTypeMap`
//! - [`coerce`]: `coerce` and `coerce_with`

pub mod coerce;
pub mod types;

pub use coerce::{coerce, coerce_with};
pub use types::{extract_types, VariableTypeMap};
