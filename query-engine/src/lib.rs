//! FILENAME: query-engine/src/lib.rs
//! Templated-query expansion subsystem.
//!
//! This crate turns one templated visualization query, whose row and column
//! axes may stand for a whole family of facets, into the matrix of atomic
//! queries that a rendering or execution layer consumes, one per cell.
//!
//! Layers:
//! - `usage`: field usages, filters and the usage store (what a query refers to)
//! - `definition`: serializable query configuration (what the query IS)
//! - `algebra`: layout-axis templates and their normalized set form
//! - `engine`: template expansion (HOW the table is calculated)
//! - `table`: the expanded output (WHAT we hand to rendering/execution)

pub mod algebra;
pub mod definition;
pub mod engine;
pub mod error;
pub mod table;
pub mod usage;

pub use algebra::{AxisExpr, Nsf, NsfCell};
pub use definition::{
    Aesthetics, AestheticDefaults, AxisSelector, Layer, Layout, MarkType, Query,
};
pub use engine::{build_query_table, expand_axis};
pub use error::{ExpandError, SampleError};
pub use table::QueryTable;
pub use usage::{
    unique_fields, AggregationMethod, FieldUsage, Filter, FilterMethod, Role,
    SplitMethod, UsageIndex, UsageStore,
};
