//! FILENAME: query-format/src/reader.rs
//! Reads query documents from JSON files and checks their integrity.
//!
//! A document is only handed out when every usage handle of its query
//! resolves against its store and every field index of its usages and
//! filters resolves against its model; a document failing these checks
//! would make the expansion engine fail later, far from the actual cause.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::FormatError;
use crate::{QueryDocument, DOCUMENT_VERSION};

/// Loads and validates a query document from the given path.
pub fn load_document(path: &Path) -> Result<QueryDocument, FormatError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let document: QueryDocument = serde_json::from_reader(reader)?;
    validate(&document)?;
    Ok(document)
}

fn validate(document: &QueryDocument) -> Result<(), FormatError> {
    if document.version > DOCUMENT_VERSION {
        return Err(FormatError::InvalidDocument(format!(
            "unsupported document version {}",
            document.version
        )));
    }

    let field_count = document.model.field_count();

    // every usage handle of the query must resolve against the store
    for handle in document.query.field_usages() {
        let usage = document.store.get(handle).ok_or_else(|| {
            FormatError::InvalidDocument(format!(
                "query references usage {} but the store holds {}",
                handle,
                document.store.len()
            ))
        })?;
        for field in usage.fields() {
            if field >= field_count {
                return Err(FormatError::InvalidDocument(format!(
                    "usage {} references field {} but model `{}` has {} fields",
                    handle, field, document.model.name, field_count
                )));
            }
        }
    }

    // filters reference fields directly
    for layer in &document.query.layers {
        for filter in &layer.filters {
            if filter.field >= field_count {
                return Err(FormatError::InvalidDocument(format!(
                    "filter references field {} but model `{}` has {} fields",
                    filter.field, document.model.name, field_count
                )));
            }
        }
    }

    Ok(())
}
