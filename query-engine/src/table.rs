//! FILENAME: query-engine/src/table.rs
//! Query table - the expanded output handed to rendering and execution.
//!
//! A query table is the row-major matrix of atomic queries derived from one
//! templated query, plus its size and the templated query it came from.
//! Rendering lays out one pane per cell; execution sends each cell's query
//! to the backend, keyed by cell position.

use serde::{Deserialize, Serialize};

use crate::definition::Query;

/// The rows x cols matrix of atomic queries derived from a templated query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTable {
    /// The templated query this table was derived from. Kept for
    /// provenance; never mutated by the engine.
    pub base: Query,

    /// The atomic queries, row-major: `at[row][col]`.
    pub at: Vec<Vec<Query>>,

    /// Number of rows of the matrix.
    pub rows: usize,

    /// Number of columns of the matrix.
    pub cols: usize,
}

impl QueryTable {
    pub fn size(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Query> {
        self.at.get(row).and_then(|r| r.get(col))
    }

    /// Mutable access for downstream consumers; cells share no containers,
    /// so mutating one is never observable in another.
    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Query> {
        self.at.get_mut(row).and_then(|r| r.get_mut(col))
    }

    /// The top-left cell.
    pub fn first(&self) -> Option<&Query> {
        self.cell(0, 0)
    }

    /// All cells with their positions, row-major.
    pub fn iter_cells(&self) -> impl Iterator<Item = ((usize, usize), &Query)> {
        self.at.iter().enumerate().flat_map(|(i, row)| {
            row.iter().enumerate().map(move |(j, cell)| ((i, j), cell))
        })
    }
}
