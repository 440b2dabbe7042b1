//! FILENAME: query-engine/src/algebra.rs
//! Layout-axis templates and their normalized set form (NSF).
//!
//! An axis template combines field usages into a family of facets: `Concat`
//! puts facets side by side, `Cross` nests them. Normalizing a template
//! yields its NSF, the ordered sequence of facet cells; the order fixes the
//! row/column order of the expanded query table and is stable for a given
//! template. Normalization never fails and never mutates anything.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use model::FieldIndex;

use crate::error::ExpandError;
use crate::usage::{unique_fields, Role, UsageIndex, UsageStore};

/// One facet cell: the set of usage handles that define one facet level.
pub type NsfCell = SmallVec<[UsageIndex; 4]>;

/// The normalized set form of an axis template: its facet cells in order.
pub type Nsf = Vec<NsfCell>;

/// A layout-axis template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AxisExpr {
    /// The axis is unused. Normalizes to a single cell with no usages.
    Empty,
    /// A single field usage, no templating.
    Usage(UsageIndex),
    /// Facets side by side; the sub-templates' cells follow one another.
    Concat(Vec<AxisExpr>),
    /// Nested facets; the cartesian product of the sub-templates' cells.
    Cross(Vec<AxisExpr>),
}

impl Default for AxisExpr {
    fn default() -> Self {
        AxisExpr::Empty
    }
}

impl AxisExpr {
    /// Normalizes this template into its NSF.
    ///
    /// `Empty` yields one cell with the empty set (an unused axis is still
    /// one facet). `Concat([])` yields no cells at all, `Cross([])` one
    /// empty cell (the product identity). Within a `Cross` cell, a handle
    /// occurring through several operands is kept once.
    pub fn normalize(&self) -> Nsf {
        match self {
            AxisExpr::Empty => vec![NsfCell::new()],
            AxisExpr::Usage(u) => {
                let mut cell = NsfCell::new();
                cell.push(*u);
                vec![cell]
            }
            AxisExpr::Concat(parts) => {
                parts.iter().flat_map(AxisExpr::normalize).collect()
            }
            AxisExpr::Cross(parts) => {
                let mut acc: Nsf = vec![NsfCell::new()];
                for part in parts {
                    let part_nsf = part.normalize();
                    let mut next = Vec::with_capacity(acc.len() * part_nsf.len());
                    for cell in &acc {
                        for part_cell in &part_nsf {
                            let mut merged = cell.clone();
                            for &u in part_cell {
                                if !merged.contains(&u) {
                                    merged.push(u);
                                }
                            }
                            next.push(merged);
                        }
                    }
                    acc = next;
                }
                acc
            }
        }
    }

    /// Builds a template from an ordered shelf of usages.
    ///
    /// Two adjacent measures are alternated (each gets its own facet); any
    /// other adjacency nests, and nesting binds tighter than alternation.
    pub fn from_shelf(usages: &[UsageIndex], store: &UsageStore) -> Result<Self, ExpandError> {
        if usages.is_empty() {
            return Ok(AxisExpr::Empty);
        }
        let roles = usages
            .iter()
            .map(|&u| store.role(u).ok_or(ExpandError::UnknownUsage(u)))
            .collect::<Result<Vec<_>, _>>()?;

        // split the shelf into runs; a run boundary sits between two
        // adjacent measures
        let mut runs: Vec<Vec<UsageIndex>> = vec![vec![usages[0]]];
        for i in 1..usages.len() {
            if roles[i - 1] == Role::Measure && roles[i] == Role::Measure {
                runs.push(vec![usages[i]]);
            } else {
                // a run is never empty, so last_mut always yields
                if let Some(run) = runs.last_mut() {
                    run.push(usages[i]);
                }
            }
        }

        let mut parts: Vec<AxisExpr> = runs
            .into_iter()
            .map(|run| {
                if run.len() == 1 {
                    AxisExpr::Usage(run[0])
                } else {
                    AxisExpr::Cross(run.into_iter().map(AxisExpr::Usage).collect())
                }
            })
            .collect();

        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(AxisExpr::Concat(parts))
        }
    }

    /// True when the axis is unused.
    pub fn is_empty(&self) -> bool {
        matches!(self, AxisExpr::Empty)
    }

    /// True when the template holds no further templating: it is either
    /// unused or a single resolved usage.
    pub fn is_atomic(&self) -> bool {
        matches!(self, AxisExpr::Empty | AxisExpr::Usage(_))
    }

    /// The single usage of an atomic, non-empty axis.
    pub fn as_usage(&self) -> Option<UsageIndex> {
        match self {
            AxisExpr::Usage(u) => Some(*u),
            _ => None,
        }
    }

    /// All usage handles of the template, in template order.
    pub fn usages(&self) -> Vec<UsageIndex> {
        fn collect(expr: &AxisExpr, out: &mut Vec<UsageIndex>) {
            match expr {
                AxisExpr::Empty => {}
                AxisExpr::Usage(u) => out.push(*u),
                AxisExpr::Concat(parts) | AxisExpr::Cross(parts) => {
                    for part in parts {
                        collect(part, out);
                    }
                }
            }
        }
        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }

    /// The unique fields referenced by the template, in first-seen order.
    /// Handles that do not resolve against the store are skipped.
    pub fn fields(&self, store: &UsageStore) -> Vec<FieldIndex> {
        let resolved: Vec<_> = self
            .usages()
            .into_iter()
            .filter_map(|u| store.get(u).cloned())
            .collect();
        unique_fields(resolved.iter())
    }
}
