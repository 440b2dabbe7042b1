//! FILENAME: query-format/src/writer.rs
//! Writes query documents as pretty-printed JSON files.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::FormatError;
use crate::QueryDocument;

/// Saves a query document to the given path.
pub fn save_document(path: &Path, document: &QueryDocument) -> Result<(), FormatError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, document)?;
    Ok(())
}
