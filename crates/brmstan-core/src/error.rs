//! Core error types.

/// Errors raised while building or validating host-side data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// Input is neither a table nor a mapping.
    #[error("unsupported input shape: expected a table (array of records) or a mapping (object), got {found}")]
    UnsupportedInputShape { found: String },

    /// A column's length differs from the table's row count.
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A column name was added twice.
    #[error("duplicate column '{name}'")]
    DuplicateColumn { name: String },

    /// A value cannot be represented as a column.
    #[error("unsupported value for '{name}': {detail}")]
    UnsupportedValue { name: String, detail: String },

    /// Array shape does not match its element count.
    #[error("shape {shape:?} does not match {len} elements")]
    ShapeMismatch { shape: Vec<usize>, len: usize },

    /// Unknown `sample_prior` option.
    #[error("invalid sample_prior '{value}' (expected one of: no, yes, only)")]
    InvalidSamplePrior { value: String },

    /// Family name is empty or not an R identifier.
    #[error("invalid family '{value}'")]
    InvalidFamily { value: String },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
