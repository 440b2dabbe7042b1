//! FILENAME: query-engine/src/error.rs

use thiserror::Error;

use model::FieldIndex;

use crate::definition::AxisSelector;
use crate::usage::UsageIndex;

/// Fatal conditions of template expansion. All of these are structural
/// input errors; none is recovered internally and no partial table is ever
/// returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandError {
    /// One facet cell carries two dimension usages of the same field.
    /// Merging their domain restrictions is not supported.
    #[error("cannot merge two dimension usages of field {field} into one facet")]
    UnsupportedMerge { field: FieldIndex },

    /// One facet cell resolves more than one measure usage to the same
    /// axis slot.
    #[error("more than one measure usage on the {axis} axis of a single facet")]
    AmbiguousAxis { axis: AxisSelector },

    /// Expansion supports queries with exactly one layer.
    #[error("expected exactly one layer, found {0}")]
    UnsupportedMultiLayer(usize),

    /// A usage handle does not resolve against the usage store.
    #[error("usage index {0} is out of bounds for the usage store")]
    UnknownUsage(UsageIndex),
}

/// Failures of applying a split to a field's domain.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    #[error("cannot sample a non-split field usage")]
    NotASplit,

    #[error("field index {0} is out of bounds for the model")]
    UnknownField(FieldIndex),

    #[error("split method needs a {expected} domain on field {field}")]
    DomainMismatch {
        field: FieldIndex,
        expected: &'static str,
    },

    /// Even after bounding by the field's extent the domain is unbounded,
    /// so there is nothing finite to enumerate or subdivide.
    #[error("extent of field {0} is unbounded")]
    UnboundedExtent(FieldIndex),

    /// The split method yields sub-domains, not point samples.
    #[error("split method has no point samples")]
    NotPointSampleable,
}
