//! FILENAME: query-format/src/lib.rs
//! Query Format Module
//!
//! Handles saving and loading query documents as JSON, and converts atomic
//! queries into the JSON statement dialect of the modelling backend.

mod error;
mod reader;
mod statement;
mod writer;

pub use error::FormatError;
pub use reader::load_document;
pub use statement::{
    predict_statement, select_statement, AggregationTuple, DensityTuple, FilterTuple,
    PredictStatement, PredictTerm, SelectStatement, ShowStatement, SplitTuple,
};
pub use writer::save_document;

use serde::{Deserialize, Serialize};

use model::Model;
use query_engine::{Query, UsageStore};

/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

/// A self-contained query document: the model catalog, the usage store and
/// the (possibly templated) query referencing both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDocument {
    pub version: u32,
    pub model: Model,
    pub store: UsageStore,
    pub query: Query,
}

impl QueryDocument {
    pub fn new(model: Model, store: UsageStore, query: Query) -> Self {
        QueryDocument {
            version: DOCUMENT_VERSION,
            model,
            store,
            query,
        }
    }
}
