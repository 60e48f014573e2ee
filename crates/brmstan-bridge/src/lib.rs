//! Type bridge between host values and the R runtime.
//!
//! Host data travels to R as generated R source (a `data.frame(...)` or
//! `list(...)` expression) and comes back as the JSON that `jsonlite` writes
//! for an R named list. Every conversion runs inside a [`ConversionScope`],
//! which is never left active past the call that opened it.
//!
//! ## Modules
//!
//! - [`scope`]: RAII conversion scope and the "bridge inactive" check
//! - [`literal`]: R source literals for strings, names and vectors
//! - [`to_r`]: host → R (`to_foreign`)
//! - [`from_r`]: R → host (`from_foreign`, `table_from_foreign`)
//! - [`error`]: `BridgeError`

pub mod error;
pub mod from_r;
pub mod literal;
pub mod scope;
pub mod to_r;

pub use error::BridgeError;
pub use from_r::{from_foreign, table_from_foreign};
pub use literal::{r_name, r_string};
pub use scope::ConversionScope;
pub use to_r::{to_foreign, ForeignData, ForeignKind};
