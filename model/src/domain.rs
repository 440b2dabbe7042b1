//! FILENAME: model/src/domain.rs
//! PURPOSE: Value domains of data variables.
//! CONTEXT: A domain is either a discrete set of values or a closed numeric
//! interval. Domains may be unbounded; a field's extent is the bounded hull
//! used to close an unbounded domain before sampling or faceting.

use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

// ============================================================================
// DISCRETE DOMAIN
// ============================================================================

/// A discrete domain: an ordered set of values, or unbounded (all values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscreteDomain {
    /// The values of the domain. `None` means the domain is unbounded.
    values: Option<Vec<FieldValue>>,
}

impl DiscreteDomain {
    pub fn new(values: impl IntoIterator<Item = FieldValue>) -> Self {
        DiscreteDomain {
            values: Some(values.into_iter().collect()),
        }
    }

    pub fn unbounded() -> Self {
        DiscreteDomain { values: None }
    }

    pub fn is_unbounded(&self) -> bool {
        self.values.is_none()
    }

    /// A domain holding exactly one value.
    pub fn is_singular(&self) -> bool {
        matches!(&self.values, Some(v) if v.len() == 1)
    }

    /// The values of the domain, or `None` if unbounded.
    pub fn values(&self) -> Option<&[FieldValue]> {
        self.values.as_deref()
    }

    /// The single value of a singular domain.
    pub fn value(&self) -> Option<&FieldValue> {
        match &self.values {
            Some(v) if v.len() == 1 => v.first(),
            _ => None,
        }
    }

    /// Set union, keeping first-seen order. An unbounded operand absorbs
    /// the other.
    pub fn union(&self, other: &DiscreteDomain) -> DiscreteDomain {
        match (&self.values, &other.values) {
            (None, _) | (_, None) => DiscreteDomain::unbounded(),
            (Some(a), Some(b)) => {
                let mut merged = a.clone();
                for v in b {
                    if !merged.contains(v) {
                        merged.push(v.clone());
                    }
                }
                DiscreteDomain { values: Some(merged) }
            }
        }
    }

    /// Set intersection, keeping this domain's order. Returns `None` when
    /// the result would be empty.
    pub fn intersection(&self, other: &DiscreteDomain) -> Option<DiscreteDomain> {
        let result = match (&self.values, &other.values) {
            (None, None) => return Some(DiscreteDomain::unbounded()),
            (None, Some(b)) => b.clone(),
            (Some(a), None) => a.clone(),
            (Some(a), Some(b)) => a.iter().filter(|v| b.contains(v)).cloned().collect(),
        };
        if result.is_empty() {
            None
        } else {
            Some(DiscreteDomain { values: Some(result) })
        }
    }

    /// Closes an unbounded domain with the given extent; a bounded domain
    /// is returned unchanged.
    pub fn bounded(&self, extent: &DiscreteDomain) -> DiscreteDomain {
        if self.is_unbounded() {
            extent.clone()
        } else {
            self.clone()
        }
    }
}

// ============================================================================
// NUMERIC DOMAIN
// ============================================================================

/// A continuous numeric domain: a closed interval including its bounds.
/// Infinite endpoints mean the domain is unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericDomain {
    pub low: f64,
    pub high: f64,
}

impl NumericDomain {
    pub fn new(low: f64, high: f64) -> Self {
        NumericDomain { low, high }
    }

    /// A domain that contracts to a single value.
    pub fn singular(value: f64) -> Self {
        NumericDomain { low: value, high: value }
    }

    pub fn unbounded() -> Self {
        NumericDomain {
            low: f64::NEG_INFINITY,
            high: f64::INFINITY,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.low == f64::NEG_INFINITY || self.high == f64::INFINITY
    }

    pub fn is_singular(&self) -> bool {
        self.low != f64::NEG_INFINITY && self.low == self.high
    }

    pub fn is_bounded(&self) -> bool {
        !self.is_singular() && !self.is_unbounded()
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// The covering interval of two overlapping domains. Returns `None`
    /// when the domains are disjoint (the union would not be an interval).
    pub fn union(&self, other: &NumericDomain) -> Option<NumericDomain> {
        let low = self.low.min(other.low);
        let high = self.high.max(other.high);
        if self.low.max(other.low) > self.high.min(other.high) {
            None
        } else {
            Some(NumericDomain { low, high })
        }
    }

    /// The overlap of two domains. Returns `None` when it is empty.
    pub fn intersection(&self, other: &NumericDomain) -> Option<NumericDomain> {
        let low = self.low.max(other.low);
        let high = self.high.min(other.high);
        if low > high {
            None
        } else {
            Some(NumericDomain { low, high })
        }
    }

    /// Closes unbounded endpoints with those of the given extent.
    pub fn bounded(&self, extent: &NumericDomain) -> NumericDomain {
        NumericDomain {
            low: if self.low == f64::NEG_INFINITY { extent.low } else { self.low },
            high: if self.high == f64::INFINITY { extent.high } else { self.high },
        }
    }
}

// ============================================================================
// DOMAIN
// ============================================================================

/// The domain of a data variable: discrete value set or numeric interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Domain {
    Discrete(DiscreteDomain),
    Numeric(NumericDomain),
}

impl Domain {
    pub fn discrete<V: Into<FieldValue>>(values: impl IntoIterator<Item = V>) -> Self {
        Domain::Discrete(DiscreteDomain::new(values.into_iter().map(Into::into)))
    }

    pub fn discrete_unbounded() -> Self {
        Domain::Discrete(DiscreteDomain::unbounded())
    }

    pub fn numeric(low: f64, high: f64) -> Self {
        Domain::Numeric(NumericDomain::new(low, high))
    }

    pub fn numeric_singular(value: f64) -> Self {
        Domain::Numeric(NumericDomain::singular(value))
    }

    pub fn numeric_unbounded() -> Self {
        Domain::Numeric(NumericDomain::unbounded())
    }

    pub fn as_discrete(&self) -> Option<&DiscreteDomain> {
        match self {
            Domain::Discrete(d) => Some(d),
            Domain::Numeric(_) => None,
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericDomain> {
        match self {
            Domain::Numeric(d) => Some(d),
            Domain::Discrete(_) => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        match self {
            Domain::Discrete(d) => d.is_unbounded(),
            Domain::Numeric(d) => d.is_unbounded(),
        }
    }

    pub fn is_singular(&self) -> bool {
        match self {
            Domain::Discrete(d) => d.is_singular(),
            Domain::Numeric(d) => d.is_singular(),
        }
    }

    /// Closes an unbounded domain with the given extent. Returns `None`
    /// when the domain kinds do not match.
    pub fn bounded(&self, extent: &Domain) -> Option<Domain> {
        match (self, extent) {
            (Domain::Discrete(d), Domain::Discrete(e)) => {
                Some(Domain::Discrete(d.bounded(e)))
            }
            (Domain::Numeric(d), Domain::Numeric(e)) => {
                Some(Domain::Numeric(d.bounded(e)))
            }
            _ => None,
        }
    }

    /// Union of same-kind domains; `None` when undefined.
    pub fn union(&self, other: &Domain) -> Option<Domain> {
        match (self, other) {
            (Domain::Discrete(a), Domain::Discrete(b)) => {
                Some(Domain::Discrete(a.union(b)))
            }
            (Domain::Numeric(a), Domain::Numeric(b)) => {
                a.union(b).map(Domain::Numeric)
            }
            _ => None,
        }
    }

    /// Intersection of same-kind domains; `None` when empty or undefined.
    pub fn intersection(&self, other: &Domain) -> Option<Domain> {
        match (self, other) {
            (Domain::Discrete(a), Domain::Discrete(b)) => {
                a.intersection(b).map(Domain::Discrete)
            }
            (Domain::Numeric(a), Domain::Numeric(b)) => {
                a.intersection(b).map(Domain::Numeric)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discrete_union_and_intersection() {
        let a = DiscreteDomain::new([FieldValue::text("red"), FieldValue::text("green")]);
        let b = DiscreteDomain::new([FieldValue::text("green"), FieldValue::text("blue")]);

        let union = a.union(&b);
        assert_eq!(
            union.values().unwrap(),
            &[
                FieldValue::text("red"),
                FieldValue::text("green"),
                FieldValue::text("blue")
            ]
        );

        let inter = a.intersection(&b).unwrap();
        assert_eq!(inter.values().unwrap(), &[FieldValue::text("green")]);

        let disjoint = DiscreteDomain::new([FieldValue::text("yellow")]);
        assert!(a.intersection(&disjoint).is_none());
    }

    #[test]
    fn test_unbounded_discrete_bounding() {
        let open = DiscreteDomain::unbounded();
        let extent = DiscreteDomain::new([FieldValue::text("a"), FieldValue::text("b")]);
        assert!(open.is_unbounded());
        assert_eq!(open.bounded(&extent), extent);

        // intersecting with an unbounded domain keeps the other side
        let inter = open.intersection(&extent).unwrap();
        assert_eq!(inter, extent);
    }

    #[test]
    fn test_numeric_interval_algebra() {
        let a = NumericDomain::new(0.0, 10.0);
        let b = NumericDomain::new(5.0, 20.0);
        let c = NumericDomain::new(15.0, 30.0);

        assert_eq!(a.union(&b), Some(NumericDomain::new(0.0, 20.0)));
        assert_eq!(a.intersection(&b), Some(NumericDomain::new(5.0, 10.0)));
        // disjoint intervals have no interval union and no intersection
        assert_eq!(a.union(&c), None);
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn test_numeric_bounding_and_singularity() {
        let open = NumericDomain::unbounded();
        let extent = NumericDomain::new(-1.0, 1.0);
        assert_eq!(open.bounded(&extent), extent);

        let half = NumericDomain::new(0.0, f64::INFINITY);
        assert_eq!(half.bounded(&extent), NumericDomain::new(0.0, 1.0));

        assert!(NumericDomain::singular(3.0).is_singular());
        assert!(!extent.is_singular());
        assert!(extent.is_bounded());
    }

    #[test]
    fn test_kind_mismatch_is_undefined() {
        let d = Domain::discrete(["a"]);
        let n = Domain::numeric(0.0, 1.0);
        assert_eq!(d.union(&n), None);
        assert_eq!(d.intersection(&n), None);
        assert_eq!(d.bounded(&n), None);
    }
}
