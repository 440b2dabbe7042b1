//! FILENAME: query-engine/src/engine.rs
//! Template expansion - the calculation core that turns a templated query
//! into the matrix of atomic queries.
//!
//! Algorithm:
//! 1. Normalize the row axis template and instantiate one row-resolved
//!    query per facet cell
//! 2. For each row instance, independently normalize and expand the column
//!    axis the same way
//! 3. Assemble the row-major matrix and its size
//!
//! Every instance is a structural shallow copy of its parent: fresh layout
//! and layer containers, with all field usages shared by handle through the
//! usage store. Mutating one cell of the result is never observable in any
//! other cell or in the input query.

use crate::algebra::AxisExpr;
use crate::definition::{AxisSelector, Query};
use crate::error::ExpandError;
use crate::table::QueryTable;
use crate::usage::{Role, UsageStore};

/// Expands the template on the selected axis of `query`, producing one
/// atomic-along-that-axis instance per facet cell, in cell order.
///
/// Per cell: the instance starts as a copy of `query` with the selected
/// axis cleared; dimension usages of the cell are folded into the details
/// set (two dimension usages of one field cannot be merged and fail), and
/// at most one measure usage takes the axis slot.
///
/// The input query is never mutated.
pub fn expand_axis(
    query: &Query,
    axis: AxisSelector,
    store: &UsageStore,
) -> Result<Vec<Query>, ExpandError> {
    if query.layers.len() != 1 {
        return Err(ExpandError::UnsupportedMultiLayer(query.layers.len()));
    }

    let nsf = query.layout.axis(axis).normalize();
    let mut expansion = Vec::with_capacity(nsf.len());

    for cell in &nsf {
        let mut instance = query.clone();
        // delete the templated part; this does not affect the base query
        *instance.layout.axis_mut(axis) = AxisExpr::Empty;

        for &handle in cell {
            let usage = store.get(handle).ok_or(ExpandError::UnknownUsage(handle))?;
            match usage.role() {
                Role::Dimension => {
                    let details = &instance.layers[0].aesthetics.details;
                    for &present in details {
                        let other = store
                            .get(present)
                            .ok_or(ExpandError::UnknownUsage(present))?;
                        if other.is_dimension()
                            && other.primary_field() == usage.primary_field()
                        {
                            // two domain restrictions on one field; merging
                            // them is not supported
                            return Err(ExpandError::UnsupportedMerge {
                                field: usage.primary_field(),
                            });
                        }
                    }
                    instance.layers[0].aesthetics.details.push(handle);
                }
                Role::Measure => {
                    let slot = instance.layout.axis_mut(axis);
                    if !slot.is_empty() {
                        return Err(ExpandError::AmbiguousAxis { axis });
                    }
                    *slot = AxisExpr::Usage(handle);
                }
            }
        }

        expansion.push(instance);
    }

    Ok(expansion)
}

/// Expands a templated query into its query table.
///
/// The row axis is expanded first; the column axis is then expanded once
/// per row instance. The per-row recomputation is deliberate: each row
/// instance is a distinct copy, and expanding it separately guarantees
/// that no two cells of the table share a mutable container.
///
/// An empty row expansion yields the valid 0x0 table.
pub fn build_query_table(query: &Query, store: &UsageStore) -> Result<QueryTable, ExpandError> {
    let row_instances = expand_axis(query, AxisSelector::Rows, store)?;

    let mut at = Vec::with_capacity(row_instances.len());
    for row_instance in &row_instances {
        at.push(expand_axis(row_instance, AxisSelector::Cols, store)?);
    }

    let rows = at.len();
    let cols = if rows > 0 { at[0].len() } else { 0 };

    Ok(QueryTable {
        base: query.clone(),
        at,
        rows,
        cols,
    })
}
