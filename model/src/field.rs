//! FILENAME: model/src/field.rs
//! PURPOSE: Fields and the model (catalog of fields) they belong to.
//! CONTEXT: A `Field` describes one data variable of a (remote) model.
//! Fields are owned by a `Model` and referenced everywhere else by
//! `FieldIndex`; the query engine treats them as read-only.

use serde::{Deserialize, Serialize};

use crate::domain::Domain;

/// Index of a field within its model (0-based).
pub type FieldIndex = usize;

/// The value-domain kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// Discrete values; produces facets when used as a dimension.
    Categorical,
    /// Continuous values; produces an axis when used as a measure.
    Numerical,
}

/// A single data variable of a model.
///
/// The `domain` is the currently admissible value range and may be
/// unbounded; the `extent` is the bounded hull observed in the data and is
/// used to close the domain before sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Unique name within the owning model.
    pub name: String,

    /// Discrete or continuous.
    pub data_type: DataType,

    /// Current value domain; may be unbounded.
    pub domain: Domain,

    /// Bounded hull of the domain. Should never be unbounded.
    pub extent: Domain,
}

impl Field {
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
        domain: Domain,
        extent: Domain,
    ) -> Self {
        Field {
            name: name.into(),
            data_type,
            domain,
            extent,
        }
    }

    pub fn is_discrete(&self) -> bool {
        self.data_type == DataType::Categorical
    }

    /// The domain closed by the extent. Falls back to the raw domain when
    /// the extent kind does not match.
    pub fn bounded_domain(&self) -> Domain {
        self.domain.bounded(&self.extent).unwrap_or_else(|| self.domain.clone())
    }
}

/// A named catalog of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Name of the model, unique within the backend it came from.
    pub name: String,

    /// The fields of the model, addressed by `FieldIndex`.
    fields: Vec<Field>,
}

impl Model {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Model {
            name: name.into(),
            fields,
        }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, index: FieldIndex) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Resolves a field name to its index.
    pub fn field_index(&self, name: &str) -> Option<FieldIndex> {
        self.fields.iter().position(|f| f.name == name)
    }
}
