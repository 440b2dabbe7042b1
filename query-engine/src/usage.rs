//! FILENAME: query-engine/src/usage.rs
//! Field usages - the ways a query applies a field of a model.
//!
//! A `FieldUsage` is a split of a field (a dimension, producing facets), an
//! aggregation over fields (a measure, producing an axis position), or a
//! density over fields (also a measure). Usages live in a `UsageStore` and
//! are referenced by `UsageIndex` everywhere else; queries and all queries
//! derived from them share usages through the store and never copy them.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use model::{DataType, Domain, FieldIndex, FieldValue, Model};

use crate::error::SampleError;

/// Index into a usage store (0-based).
pub type UsageIndex = usize;

// ============================================================================
// ROLES AND METHODS
// ============================================================================

/// The role a usage plays in a query layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Discrete; produces one facet per domain group.
    Dimension,
    /// Quantitative; occupies an axis slot.
    Measure,
}

/// How a split subdivides its field's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitMethod {
    /// One group per value of a discrete domain.
    Elements,
    /// The whole domain as a single group.
    Identity,
    /// `count` equidistant sample points over a numeric domain.
    EquiDist { count: usize },
    /// `count` equal-width subintervals of a numeric domain.
    EquiIntervals { count: usize },
}

/// Supported aggregation functions for measure usages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMethod {
    Maximum,
    Average,
}

impl Default for AggregationMethod {
    fn default() -> Self {
        AggregationMethod::Maximum
    }
}

// ============================================================================
// FIELD USAGE
// ============================================================================

/// Fields an aggregation or density ranges over; usually one or two.
pub type UsageFields = SmallVec<[FieldIndex; 2]>;

/// One application of model fields within a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldUsage {
    /// Subdivides a field's domain into facet groups. Role: dimension.
    Split {
        field: FieldIndex,
        method: SplitMethod,
    },
    /// Aggregates over fields, yielding the value of one of them.
    /// Role: measure.
    Aggregation {
        fields: UsageFields,
        method: AggregationMethod,
        /// The aggregated field whose value the usage yields.
        /// Must be one of `fields`.
        yields: FieldIndex,
    },
    /// The model density over fields. Role: measure.
    Density { fields: UsageFields },
}

impl FieldUsage {
    pub fn split(field: FieldIndex, method: SplitMethod) -> Self {
        FieldUsage::Split { field, method }
    }

    pub fn elements_split(field: FieldIndex) -> Self {
        FieldUsage::Split {
            field,
            method: SplitMethod::Elements,
        }
    }

    pub fn equi_dist_split(field: FieldIndex, count: usize) -> Self {
        FieldUsage::Split {
            field,
            method: SplitMethod::EquiDist { count },
        }
    }

    /// The canonical split for a field: elements for discrete fields, four
    /// equidistant samples for numeric ones. `None` if the field index is
    /// out of bounds.
    pub fn default_split(model: &Model, field: FieldIndex) -> Option<Self> {
        let method = match model.field(field)?.data_type {
            DataType::Categorical => SplitMethod::Elements,
            DataType::Numerical => SplitMethod::EquiDist { count: 4 },
        };
        Some(FieldUsage::Split { field, method })
    }

    pub fn aggregation(
        fields: impl IntoIterator<Item = FieldIndex>,
        method: AggregationMethod,
        yields: FieldIndex,
    ) -> Self {
        FieldUsage::Aggregation {
            fields: fields.into_iter().collect(),
            method,
            yields,
        }
    }

    /// Argmax aggregation yielding the first field.
    pub fn max_of(field: FieldIndex) -> Self {
        FieldUsage::Aggregation {
            fields: SmallVec::from_slice(&[field]),
            method: AggregationMethod::Maximum,
            yields: field,
        }
    }

    pub fn average_of(field: FieldIndex) -> Self {
        FieldUsage::Aggregation {
            fields: SmallVec::from_slice(&[field]),
            method: AggregationMethod::Average,
            yields: field,
        }
    }

    pub fn density(fields: impl IntoIterator<Item = FieldIndex>) -> Self {
        FieldUsage::Density {
            fields: fields.into_iter().collect(),
        }
    }

    /// The role of this usage; total over all variants.
    pub fn role(&self) -> Role {
        match self {
            FieldUsage::Split { .. } => Role::Dimension,
            FieldUsage::Aggregation { .. } | FieldUsage::Density { .. } => Role::Measure,
        }
    }

    pub fn is_dimension(&self) -> bool {
        self.role() == Role::Dimension
    }

    pub fn is_measure(&self) -> bool {
        self.role() == Role::Measure
    }

    /// All field indices this usage ranges over.
    pub fn fields(&self) -> UsageFields {
        match self {
            FieldUsage::Split { field, .. } => SmallVec::from_slice(&[*field]),
            FieldUsage::Aggregation { fields, .. } | FieldUsage::Density { fields } => {
                fields.clone()
            }
        }
    }

    /// The field this usage is identified with: the split field, or the
    /// first aggregated field.
    pub fn primary_field(&self) -> FieldIndex {
        match self {
            FieldUsage::Split { field, .. } => *field,
            FieldUsage::Aggregation { fields, .. } | FieldUsage::Density { fields } => {
                fields.first().copied().unwrap_or(0)
            }
        }
    }

    // ========================================================================
    // SPLIT APPLICATION
    // ========================================================================

    /// Applies a split to its field, returning the concrete facet values.
    ///
    /// `Elements` enumerates the (extent-bounded) discrete domain; `EquiDist`
    /// samples equidistant points of the bounded numeric domain, contracting
    /// a singular domain to its one value. Interval-producing methods have
    /// no point samples; use [`FieldUsage::split_to_domains`] for those.
    pub fn sample_values(&self, model: &Model) -> Result<Vec<FieldValue>, SampleError> {
        let (field_index, method) = self.split_parts()?;
        let field = model
            .field(field_index)
            .ok_or(SampleError::UnknownField(field_index))?;
        let domain = field.bounded_domain();
        if domain.is_unbounded() {
            return Err(SampleError::UnboundedExtent(field_index));
        }

        match method {
            SplitMethod::Elements => {
                let discrete = domain
                    .as_discrete()
                    .ok_or(SampleError::DomainMismatch {
                        field: field_index,
                        expected: "discrete",
                    })?;
                // bounded + not unbounded implies values are present
                Ok(discrete.values().unwrap_or(&[]).to_vec())
            }
            SplitMethod::EquiDist { count } => {
                let numeric = domain
                    .as_numeric()
                    .ok_or(SampleError::DomainMismatch {
                        field: field_index,
                        expected: "numeric",
                    })?;
                if numeric.is_singular() {
                    return Ok(vec![FieldValue::Number(numeric.low)]);
                }
                let step = numeric.width() / count as f64;
                Ok((0..count)
                    .map(|i| FieldValue::Number(numeric.low + step * i as f64))
                    .collect())
            }
            SplitMethod::EquiIntervals { .. } | SplitMethod::Identity => {
                Err(SampleError::NotPointSampleable)
            }
        }
    }

    /// Applies a split to its field, returning one sub-domain per facet
    /// group.
    pub fn split_to_domains(&self, model: &Model) -> Result<Vec<Domain>, SampleError> {
        let (field_index, method) = self.split_parts()?;
        let field = model
            .field(field_index)
            .ok_or(SampleError::UnknownField(field_index))?;
        let domain = field.bounded_domain();
        if domain.is_unbounded() {
            return Err(SampleError::UnboundedExtent(field_index));
        }

        match method {
            SplitMethod::Elements => {
                let discrete = domain
                    .as_discrete()
                    .ok_or(SampleError::DomainMismatch {
                        field: field_index,
                        expected: "discrete",
                    })?;
                Ok(discrete
                    .values()
                    .unwrap_or(&[])
                    .iter()
                    .map(|v| Domain::discrete([v.clone()]))
                    .collect())
            }
            SplitMethod::EquiDist { .. } => {
                let values = self.sample_values(model)?;
                Ok(values
                    .iter()
                    .filter_map(FieldValue::as_number)
                    .map(Domain::numeric_singular)
                    .collect())
            }
            SplitMethod::EquiIntervals { count } => {
                let numeric = domain
                    .as_numeric()
                    .ok_or(SampleError::DomainMismatch {
                        field: field_index,
                        expected: "numeric",
                    })?;
                let step = numeric.width() / count as f64;
                let mut low = numeric.low;
                Ok((0..count)
                    .map(|_| {
                        let high = low + step;
                        let interval = Domain::numeric(low, high);
                        low = high;
                        interval
                    })
                    .collect())
            }
            // the whole domain as a single facet group
            SplitMethod::Identity => Ok(vec![domain]),
        }
    }

    /// Applies a split to its field and returns one equality filter per
    /// facet group, restricting the field to that group's sub-domain.
    pub fn split_to_filters(&self, model: &Model) -> Result<Vec<Filter>, SampleError> {
        let (field_index, _) = self.split_parts()?;
        let domains = self.split_to_domains(model)?;
        Ok(domains
            .into_iter()
            .map(|d| Filter::new(field_index, FilterMethod::Equals, d))
            .collect())
    }

    fn split_parts(&self) -> Result<(FieldIndex, SplitMethod), SampleError> {
        match self {
            FieldUsage::Split { field, method } => Ok((*field, *method)),
            _ => Err(SampleError::NotASplit),
        }
    }
}

// ============================================================================
// FILTER
// ============================================================================

/// How a filter restricts its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMethod {
    Equals,
    In,
}

/// A restriction of one field's domain, attached to a query layer.
///
/// Filters are layer metadata, not field usages: they never occupy an axis
/// and carry their restriction domain by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: FieldIndex,
    pub method: FilterMethod,
    pub args: Domain,
}

impl Filter {
    pub fn new(field: FieldIndex, method: FilterMethod, args: Domain) -> Self {
        Filter { field, method, args }
    }

    /// The no-op filter: field in its full extent.
    pub fn default_filter(model: &Model, field: FieldIndex) -> Option<Self> {
        let extent = model.field(field)?.extent.clone();
        Some(Filter::new(field, FilterMethod::In, extent))
    }
}

// ============================================================================
// USAGE STORE
// ============================================================================

/// The append-only arena all field usages of a query live in.
///
/// Queries, and every atomic query derived from them, reference usages by
/// `UsageIndex`. Copying a query copies handles; the usages themselves stay
/// shared and read-only, which is what makes the expansion engine's shallow
/// copies safe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStore {
    usages: Vec<FieldUsage>,
}

impl UsageStore {
    pub fn new() -> Self {
        UsageStore { usages: Vec::new() }
    }

    /// Adds a usage and returns its handle.
    pub fn push(&mut self, usage: FieldUsage) -> UsageIndex {
        self.usages.push(usage);
        self.usages.len() - 1
    }

    pub fn get(&self, index: UsageIndex) -> Option<&FieldUsage> {
        self.usages.get(index)
    }

    pub fn role(&self, index: UsageIndex) -> Option<Role> {
        self.usages.get(index).map(FieldUsage::role)
    }

    pub fn len(&self) -> usize {
        self.usages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UsageIndex, &FieldUsage)> {
        self.usages.iter().enumerate()
    }
}

/// The unique fields referenced by the given usages, in first-seen order.
/// Uniqueness is decided on the level of fields, not usages.
pub fn unique_fields<'a>(
    usages: impl IntoIterator<Item = &'a FieldUsage>,
) -> Vec<FieldIndex> {
    let mut seen = rustc_hash::FxHashSet::default();
    let mut result = Vec::new();
    for usage in usages {
        for field in usage.fields() {
            if seen.insert(field) {
                result.push(field);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{DataType, Field};

    fn create_test_model() -> Model {
        Model::new(
            "census",
            vec![
                Field::new(
                    "sex",
                    DataType::Categorical,
                    Domain::discrete_unbounded(),
                    Domain::discrete(["female", "male"]),
                ),
                Field::new(
                    "age",
                    DataType::Numerical,
                    Domain::numeric_unbounded(),
                    Domain::numeric(0.0, 100.0),
                ),
                Field::new(
                    "income",
                    DataType::Numerical,
                    Domain::numeric_singular(1000.0),
                    Domain::numeric(0.0, 120_000.0),
                ),
            ],
        )
    }

    #[test]
    fn test_roles_are_total() {
        assert_eq!(FieldUsage::elements_split(0).role(), Role::Dimension);
        assert_eq!(FieldUsage::max_of(1).role(), Role::Measure);
        assert_eq!(FieldUsage::density([1, 2]).role(), Role::Measure);
    }

    #[test]
    fn test_elements_split_enumerates_domain() {
        let model = create_test_model();
        let split = FieldUsage::elements_split(0);
        let values = split.sample_values(&model).unwrap();
        assert_eq!(
            values,
            vec![FieldValue::text("female"), FieldValue::text("male")]
        );
    }

    #[test]
    fn test_equi_dist_split_samples_extent() {
        let model = create_test_model();
        let split = FieldUsage::equi_dist_split(1, 4);
        let values = split.sample_values(&model).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Number(0.0),
                FieldValue::Number(25.0),
                FieldValue::Number(50.0),
                FieldValue::Number(75.0),
            ]
        );
    }

    #[test]
    fn test_singular_domain_contracts_to_one_sample() {
        let model = create_test_model();
        let split = FieldUsage::equi_dist_split(2, 10);
        let values = split.sample_values(&model).unwrap();
        assert_eq!(values, vec![FieldValue::Number(1000.0)]);
    }

    #[test]
    fn test_equi_intervals_split_to_domains() {
        let model = create_test_model();
        let split = FieldUsage::split(1, SplitMethod::EquiIntervals { count: 4 });
        let domains = split.split_to_domains(&model).unwrap();
        assert_eq!(domains.len(), 4);
        assert_eq!(domains[0], Domain::numeric(0.0, 25.0));
        assert_eq!(domains[3], Domain::numeric(75.0, 100.0));

        // no point samples for interval methods
        assert_eq!(
            split.sample_values(&model),
            Err(SampleError::NotPointSampleable)
        );
    }

    #[test]
    fn test_identity_split_keeps_whole_domain() {
        let model = create_test_model();
        let split = FieldUsage::split(0, SplitMethod::Identity);
        let domains = split.split_to_domains(&model).unwrap();
        assert_eq!(domains, vec![Domain::discrete(["female", "male"])]);
    }

    #[test]
    fn test_split_to_filters() {
        let model = create_test_model();
        let split = FieldUsage::elements_split(0);
        let filters = split.split_to_filters(&model).unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].field, 0);
        assert_eq!(filters[0].method, FilterMethod::Equals);
        assert_eq!(filters[0].args, Domain::discrete(["female"]));
    }

    #[test]
    fn test_domain_kind_mismatch_is_rejected() {
        let model = create_test_model();
        let bad = FieldUsage::elements_split(1);
        assert_eq!(
            bad.sample_values(&model),
            Err(SampleError::DomainMismatch {
                field: 1,
                expected: "discrete"
            })
        );
        let bad = FieldUsage::equi_dist_split(0, 3);
        assert_eq!(
            bad.sample_values(&model),
            Err(SampleError::DomainMismatch {
                field: 0,
                expected: "numeric"
            })
        );
    }

    #[test]
    fn test_sampling_non_splits_is_rejected() {
        let model = create_test_model();
        assert_eq!(
            FieldUsage::max_of(1).sample_values(&model),
            Err(SampleError::NotASplit)
        );
    }

    #[test]
    fn test_default_split_picks_method_by_data_type() {
        let model = create_test_model();
        assert_eq!(
            FieldUsage::default_split(&model, 0),
            Some(FieldUsage::elements_split(0))
        );
        assert_eq!(
            FieldUsage::default_split(&model, 1),
            Some(FieldUsage::equi_dist_split(1, 4))
        );
        assert_eq!(FieldUsage::default_split(&model, 99), None);
    }

    #[test]
    fn test_unique_fields_dedupes_on_field_level() {
        let usages = vec![
            FieldUsage::elements_split(0),
            FieldUsage::max_of(1),
            FieldUsage::density([1, 2]),
            FieldUsage::elements_split(0),
        ];
        assert_eq!(unique_fields(usages.iter()), vec![0, 1, 2]);
    }

    #[test]
    fn test_store_hands_out_sequential_handles() {
        let mut store = UsageStore::new();
        let a = store.push(FieldUsage::elements_split(0));
        let b = store.push(FieldUsage::max_of(1));
        assert_eq!((a, b), (0, 1));
        assert_eq!(store.role(a), Some(Role::Dimension));
        assert_eq!(store.role(b), Some(Role::Measure));
        assert_eq!(store.role(2), None);
        assert_eq!(store.len(), 2);
    }
}
