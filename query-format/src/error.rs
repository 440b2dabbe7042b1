//! FILENAME: query-format/src/error.rs

use thiserror::Error;

use model::FieldIndex;
use query_engine::UsageIndex;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Backend statements can only be generated from atomic queries.
    #[error("query is still templated; expand it before generating statements")]
    NotAtomic,

    #[error("query names no source model")]
    MissingSource,

    /// Two splits of one field with different methods cannot share a
    /// result column.
    #[error("conflicting splits of field {field}: methods differ")]
    ConflictingSplits { field: FieldIndex },

    #[error("usage index {0} does not resolve against the store")]
    DanglingUsage(UsageIndex),

    #[error("field index {0} does not resolve against the model")]
    UnknownField(FieldIndex),
}
