//! FILENAME: query-engine/src/definition.rs
//! Query definition - the serializable configuration.
//!
//! This module contains the types that DESCRIBE a (possibly templated)
//! visualization query: its sources, the row/column layout templates and
//! the single layer of filters, defaults and aesthetic mappings. These
//! structures are immutable snapshots of user intent; the expansion engine
//! only ever copies them.

use serde::{Deserialize, Serialize};

use model::FieldIndex;

use crate::algebra::AxisExpr;
use crate::usage::{unique_fields, Filter, UsageIndex, UsageStore};

// ============================================================================
// LAYOUT
// ============================================================================

/// Selects one of the two layout axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisSelector {
    Rows,
    Cols,
}

impl std::fmt::Display for AxisSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AxisSelector::Rows => write!(f, "rows"),
            AxisSelector::Cols => write!(f, "cols"),
        }
    }
}

/// The row and column axis templates of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub rows: AxisExpr,
    pub cols: AxisExpr,
}

impl Layout {
    pub fn new(rows: AxisExpr, cols: AxisExpr) -> Self {
        Layout { rows, cols }
    }

    pub fn axis(&self, selector: AxisSelector) -> &AxisExpr {
        match selector {
            AxisSelector::Rows => &self.rows,
            AxisSelector::Cols => &self.cols,
        }
    }

    pub fn axis_mut(&mut self, selector: AxisSelector) -> &mut AxisExpr {
        match selector {
            AxisSelector::Rows => &mut self.rows,
            AxisSelector::Cols => &mut self.cols,
        }
    }
}

// ============================================================================
// LAYER
// ============================================================================

/// The visual mark family a layer is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkType {
    /// Let the rendering layer decide from the query shape.
    Auto,
    Point,
    Line,
    Bar,
    Area,
}

impl Default for MarkType {
    fn default() -> Self {
        MarkType::Auto
    }
}

/// Constant fallbacks used when no usage is mapped to an aesthetic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AestheticDefaults {
    pub color: Option<String>,
    pub shape: Option<String>,
    pub size: Option<f64>,
}

/// The aesthetic mapping of a layer: which usages drive color, shape and
/// size, plus the details set of further usages each mark is grouped by.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aesthetics {
    pub mark: MarkType,

    // aesthetics that hold a single field usage
    pub color: Option<UsageIndex>,
    pub shape: Option<UsageIndex>,
    pub size: Option<UsageIndex>,

    /// Usages each mark is additionally grouped by. Template expansion
    /// folds the dimension usages of a facet cell into this set.
    pub details: Vec<UsageIndex>,
}

/// One layer of a query: filters, aesthetic defaults and mappings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub filters: Vec<Filter>,
    pub defaults: AestheticDefaults,
    pub aesthetics: Aesthetics,
}

impl Layer {
    pub fn new() -> Self {
        Layer::default()
    }
}

// ============================================================================
// QUERY
// ============================================================================

/// A (possibly templated) visualization query.
///
/// Field usages are referenced by `UsageIndex` into an external
/// [`UsageStore`]; cloning a query therefore copies containers and handles
/// but never the usages themselves. The expansion engine relies on exactly
/// that: every derived atomic query owns fresh containers while sharing all
/// usages read-only through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Names of the models this query draws from.
    pub sources: Vec<String>,

    /// Row and column axis templates.
    pub layout: Layout,

    /// The layers of the query. Expansion supports exactly one.
    pub layers: Vec<Layer>,
}

impl Query {
    /// A single-source, single-layer query.
    pub fn new(source: impl Into<String>, layout: Layout, layer: Layer) -> Self {
        Query {
            sources: vec![source.into()],
            layout,
            layers: vec![layer],
        }
    }

    /// Every usage handle referenced by this query, in deterministic order:
    /// rows, cols, color, shape, size, details.
    pub fn field_usages(&self) -> Vec<UsageIndex> {
        let mut usages = self.layout.rows.usages();
        usages.extend(self.layout.cols.usages());
        for layer in &self.layers {
            let aes = &layer.aesthetics;
            usages.extend(aes.color.iter().copied());
            usages.extend(aes.shape.iter().copied());
            usages.extend(aes.size.iter().copied());
            usages.extend(aes.details.iter().copied());
        }
        usages
    }

    /// The unique fields used anywhere in this query, in first-seen order.
    /// Handles that do not resolve against the store are skipped.
    pub fn fields(&self, store: &UsageStore) -> Vec<FieldIndex> {
        let resolved: Vec<_> = self
            .field_usages()
            .into_iter()
            .filter_map(|u| store.get(u).cloned())
            .collect();
        let mut fields = unique_fields(resolved.iter());
        for layer in &self.layers {
            for filter in &layer.filters {
                if !fields.contains(&filter.field) {
                    fields.push(filter.field);
                }
            }
        }
        fields
    }

    /// True when neither axis is templated any further: each axis is empty
    /// or a single resolved usage.
    pub fn is_atomic(&self) -> bool {
        self.layout.rows.is_atomic() && self.layout.cols.is_atomic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::FieldUsage;

    fn create_test_store() -> (UsageStore, UsageIndex, UsageIndex, UsageIndex) {
        let mut store = UsageStore::new();
        let sex = store.push(FieldUsage::elements_split(0));
        let age = store.push(FieldUsage::max_of(1));
        let income = store.push(FieldUsage::average_of(2));
        (store, sex, age, income)
    }

    #[test]
    fn test_field_usages_order_is_deterministic() {
        let (_, sex, age, income) = create_test_store();
        let mut layer = Layer::new();
        layer.aesthetics.color = Some(income);
        layer.aesthetics.details = vec![sex];
        let query = Query::new(
            "census",
            Layout::new(AxisExpr::Usage(age), AxisExpr::Empty),
            layer,
        );

        assert_eq!(query.field_usages(), vec![age, income, sex]);
    }

    #[test]
    fn test_fields_are_unique_and_include_filters() {
        let (store, sex, age, _) = create_test_store();
        let mut layer = Layer::new();
        layer.aesthetics.details = vec![sex];
        layer.filters.push(Filter::new(
            2,
            crate::usage::FilterMethod::In,
            model::Domain::numeric(0.0, 1.0),
        ));
        let query = Query::new(
            "census",
            Layout::new(AxisExpr::Usage(age), AxisExpr::Usage(age)),
            layer,
        );

        // age appears twice in the layout but only once here
        assert_eq!(query.fields(&store), vec![1, 0, 2]);
    }

    #[test]
    fn test_atomicity() {
        let (_, sex, age, _) = create_test_store();
        let layer = Layer::new();

        let atomic = Query::new(
            "census",
            Layout::new(AxisExpr::Usage(age), AxisExpr::Empty),
            layer.clone(),
        );
        assert!(atomic.is_atomic());

        let templated = Query::new(
            "census",
            Layout::new(
                AxisExpr::Concat(vec![AxisExpr::Usage(sex), AxisExpr::Usage(age)]),
                AxisExpr::Empty,
            ),
            layer,
        );
        assert!(!templated.is_atomic());
    }
}
