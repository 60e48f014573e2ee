//! Host-side data model for brmstan.
//!
//! Everything that crosses a crate boundary in the fitting pipeline is defined
//! here: the caller's tabular input, the Stan data produced by preprocessing,
//! and the model specification handed to brms.
//!
//! ## Modules
//!
//! - [`table`]: `Column`, `Table`, and the `TabularInput` accepted by `fit`
//! - [`value`]: `NumericArray`, `StanValue`, and the `StanData` mapping
//! - [`model`]: `ModelSpec`, `Family`, and `SamplePrior`
//! - [`error`]: `CoreError`

pub mod error;
pub mod model;
pub mod table;
pub mod value;

pub use error::CoreError;
pub use model::{Family, ModelSpec, SamplePrior};
pub use table::{Column, TabularInput, Table};
pub use value::{ArrayData, NumericArray, StanData, StanValue};
