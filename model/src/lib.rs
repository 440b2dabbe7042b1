//! FILENAME: model/src/lib.rs
//! PURPOSE: Main library entry point for the data-variable model.
//! CONTEXT: Re-exports the value, domain and field types used by the
//! query-engine and query-format crates.

pub mod domain;
pub mod field;
pub mod value;

// Re-export commonly used types at the crate root
pub use domain::{DiscreteDomain, Domain, NumericDomain};
pub use field::{DataType, Field, FieldIndex, Model};
pub use value::FieldValue;
