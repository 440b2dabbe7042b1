//! FILENAME: query-format/src/statement.rs
//! Backend statements - the JSON query dialect of the modelling service.
//!
//! An atomic query is translated into either a predict statement (one
//! result column per split, then one per aggregation/density) or a select
//! statement over the raw data. Both builders also return which usage each
//! result column belongs to, so result tables can be keyed back onto the
//! query that produced them.

use serde::{Deserialize, Serialize};

use model::{Domain, FieldIndex, Model};
use query_engine::{
    AggregationMethod, FieldUsage, FilterMethod, Query, SplitMethod, UsageIndex,
    UsageStore,
};

use crate::error::FormatError;

// ============================================================================
// STATEMENT TERMS
// ============================================================================

/// One SPLIT BY term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitTuple {
    pub name: String,
    pub split: SplitMethod,
}

/// One aggregation PREDICT term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationTuple {
    pub name: Vec<String>,
    pub aggregation: AggregationMethod,
    pub yields: String,
}

/// One density PREDICT term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityTuple {
    pub name: Vec<String>,
    pub aggregation: String,
}

impl DensityTuple {
    fn new(name: Vec<String>) -> Self {
        DensityTuple {
            name,
            aggregation: "density".to_string(),
        }
    }
}

/// One WHERE term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterTuple {
    pub name: String,
    pub operator: FilterMethod,
    pub value: Domain,
}

/// A PREDICT clause entry: a plain field name (for splits) or a tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictTerm {
    Name(String),
    Aggregation(AggregationTuple),
    Density(DensityTuple),
}

// ============================================================================
// STATEMENTS
// ============================================================================

/// A prediction over a model: aggregations and densities per split group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictStatement {
    #[serde(rename = "PREDICT")]
    pub predict: Vec<PredictTerm>,

    #[serde(rename = "FROM")]
    pub from: String,

    #[serde(rename = "WHERE")]
    pub where_clause: Vec<FilterTuple>,

    #[serde(rename = "SPLIT BY")]
    pub split_by: Vec<SplitTuple>,
}

/// A selection of raw data rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectStatement {
    #[serde(rename = "SELECT")]
    pub select: Vec<String>,

    #[serde(rename = "FROM")]
    pub from: String,

    #[serde(rename = "WHERE")]
    pub where_clause: Vec<FilterTuple>,
}

/// A catalog statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowStatement {
    #[serde(rename = "SHOW")]
    pub show: String,

    #[serde(rename = "FROM", skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl ShowStatement {
    /// Asks the backend for the header (fields) of a model.
    pub fn header(from: impl Into<String>) -> Self {
        ShowStatement {
            show: "HEADER".to_string(),
            from: Some(from.into()),
        }
    }

    /// Asks the backend for the available models.
    pub fn models() -> Self {
        ShowStatement {
            show: "MODELS".to_string(),
            from: None,
        }
    }
}

// ============================================================================
// STATEMENT BUILDERS
// ============================================================================

struct ResolvedUsages {
    from: String,
    /// (handle, usage) pairs in query order.
    usages: Vec<(UsageIndex, FieldUsage)>,
}

fn resolve_usages(query: &Query, store: &UsageStore) -> Result<ResolvedUsages, FormatError> {
    if !query.is_atomic() {
        return Err(FormatError::NotAtomic);
    }
    let from = query
        .sources
        .first()
        .cloned()
        .ok_or(FormatError::MissingSource)?;

    let usages = query
        .field_usages()
        .into_iter()
        .map(|handle| {
            store
                .get(handle)
                .cloned()
                .map(|usage| (handle, usage))
                .ok_or(FormatError::DanglingUsage(handle))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResolvedUsages { from, usages })
}

fn field_name(model: &Model, field: FieldIndex) -> Result<String, FormatError> {
    model
        .field(field)
        .map(|f| f.name.clone())
        .ok_or(FormatError::UnknownField(field))
}

fn filter_tuples(query: &Query, model: &Model) -> Result<Vec<FilterTuple>, FormatError> {
    let mut tuples = Vec::new();
    for layer in &query.layers {
        for filter in &layer.filters {
            tuples.push(FilterTuple {
                name: field_name(model, filter.field)?,
                operator: filter.method,
                value: filter.args.clone(),
            });
        }
    }
    Ok(tuples)
}

/// Builds the predict statement of an atomic query.
///
/// Splits become SPLIT BY terms and name-entries of the PREDICT clause;
/// aggregations and densities become PREDICT tuples. Result columns are
/// dimensions first, then measures, and the returned vector maps each
/// column to the usage it represents.
///
/// Two splits of the same field collapse into one column when their methods
/// match; differing methods are rejected.
pub fn predict_statement(
    query: &Query,
    store: &UsageStore,
    model: &Model,
) -> Result<(PredictStatement, Vec<UsageIndex>), FormatError> {
    let resolved = resolve_usages(query, store)?;

    // one dimension column per split field
    let mut dimensions: Vec<(UsageIndex, FieldIndex, SplitMethod)> = Vec::new();
    for (handle, usage) in &resolved.usages {
        if let FieldUsage::Split { field, method } = usage {
            match dimensions.iter().find(|(_, f, _)| f == field) {
                Some((_, _, present)) if present == method => {} // same column
                Some(_) => {
                    return Err(FormatError::ConflictingSplits { field: *field });
                }
                None => dimensions.push((*handle, *field, *method)),
            }
        }
    }

    let mut predict = Vec::new();
    let mut split_by = Vec::new();
    let mut columns = Vec::new();

    for (handle, field, method) in &dimensions {
        let name = field_name(model, *field)?;
        predict.push(PredictTerm::Name(name.clone()));
        split_by.push(SplitTuple {
            name,
            split: *method,
        });
        columns.push(*handle);
    }

    for (handle, usage) in &resolved.usages {
        match usage {
            FieldUsage::Split { .. } => {}
            FieldUsage::Aggregation {
                fields,
                method,
                yields,
            } => {
                let names = fields
                    .iter()
                    .map(|&f| field_name(model, f))
                    .collect::<Result<Vec<_>, _>>()?;
                predict.push(PredictTerm::Aggregation(AggregationTuple {
                    name: names,
                    aggregation: *method,
                    yields: field_name(model, *yields)?,
                }));
                columns.push(*handle);
            }
            FieldUsage::Density { fields } => {
                let names = fields
                    .iter()
                    .map(|&f| field_name(model, f))
                    .collect::<Result<Vec<_>, _>>()?;
                predict.push(PredictTerm::Density(DensityTuple::new(names)));
                columns.push(*handle);
            }
        }
    }

    let statement = PredictStatement {
        predict,
        from: resolved.from,
        where_clause: filter_tuples(query, model)?,
        split_by,
    };
    Ok((statement, columns))
}

/// Builds the data-select statement of an atomic query.
///
/// Splits select the split field, aggregations select their yield field,
/// densities have no data counterpart and are skipped. Filters carry over
/// unchanged. Duplicate column names collapse; the returned vector maps
/// each selected column to the first usage that asked for it.
pub fn select_statement(
    query: &Query,
    store: &UsageStore,
    model: &Model,
) -> Result<(SelectStatement, Vec<UsageIndex>), FormatError> {
    let resolved = resolve_usages(query, store)?;

    let mut select = Vec::new();
    let mut columns = Vec::new();
    for (handle, usage) in &resolved.usages {
        let name = match usage {
            FieldUsage::Split { field, .. } => field_name(model, *field)?,
            FieldUsage::Aggregation { yields, .. } => field_name(model, *yields)?,
            FieldUsage::Density { .. } => continue,
        };
        if !select.contains(&name) {
            select.push(name);
            columns.push(*handle);
        }
    }

    let statement = SelectStatement {
        select,
        from: resolved.from,
        where_clause: filter_tuples(query, model)?,
    };
    Ok((statement, columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{DataType, Field};
    use query_engine::{AxisExpr, Filter, Layer, Layout};

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
                    Domain::numeric_unbounded(),
                    Domain::numeric(0.0, 120_000.0),
                ),
            ],
        )
    }

    fn create_atomic_query() -> (Model, UsageStore, Query) {
        let model = create_test_model();
        let mut store = UsageStore::new();
        let sex = store.push(FieldUsage::elements_split(0));
        let age = store.push(FieldUsage::max_of(1));

        let mut layer = Layer::new();
        layer.aesthetics.details.push(sex);
        layer.filters.push(Filter::new(
            2,
            FilterMethod::In,
            Domain::numeric(0.0, 50_000.0),
        ));

        let query = Query::new(
            "census",
            Layout::new(AxisExpr::Usage(age), AxisExpr::Empty),
            layer,
        );
        (model, store, query)
    }

    #[test]
    fn test_predict_statement_shape() {
        let (model, store, query) = create_atomic_query();
        let (statement, columns) = predict_statement(&query, &store, &model).unwrap();

        assert_eq!(statement.from, "census");
        assert_eq!(statement.split_by.len(), 1);
        assert_eq!(statement.split_by[0].name, "sex");
        assert_eq!(statement.predict.len(), 2);
        assert_eq!(statement.predict[0], PredictTerm::Name("sex".to_string()));
        match &statement.predict[1] {
            PredictTerm::Aggregation(agg) => {
                assert_eq!(agg.name, vec!["age".to_string()]);
                assert_eq!(agg.aggregation, AggregationMethod::Maximum);
                assert_eq!(agg.yields, "age");
            }
            other => panic!("expected an aggregation tuple, got {:?}", other),
        }
        assert_eq!(statement.where_clause.len(), 1);
        assert_eq!(statement.where_clause[0].name, "income");

        // dimensions first, then measures; sex sits on details (index 1 of
        // field_usages order), age on the row axis (index 0)
        assert_eq!(columns.len(), 2);
        assert_eq!(store.get(columns[0]), Some(&FieldUsage::elements_split(0)));
        assert_eq!(store.get(columns[1]), Some(&FieldUsage::max_of(1)));
    }

    #[test]
    fn test_predict_statement_json_keys() {
        let (model, store, query) = create_atomic_query();
        let (statement, _) = predict_statement(&query, &store, &model).unwrap();
        let json = serde_json::to_value(&statement).unwrap();

        let object = json.as_object().unwrap();
        assert!(object.contains_key("PREDICT"));
        assert!(object.contains_key("FROM"));
        assert!(object.contains_key("WHERE"));
        assert!(object.contains_key("SPLIT BY"));
        assert_eq!(json["FROM"], "census");
        assert_eq!(json["PREDICT"][0], "sex");
    }

    #[test]
    fn test_duplicate_identical_splits_share_a_column() {
        let model = create_test_model();
        let mut store = UsageStore::new();
        let sex_a = store.push(FieldUsage::elements_split(0));
        let sex_b = store.push(FieldUsage::elements_split(0));

        let mut layer = Layer::new();
        layer.aesthetics.color = Some(sex_a);
        layer.aesthetics.details.push(sex_b);
        let query = Query::new(
            "census",
            Layout::new(AxisExpr::Empty, AxisExpr::Empty),
            layer,
        );

        let (statement, columns) = predict_statement(&query, &store, &model).unwrap();
        assert_eq!(statement.split_by.len(), 1);
        assert_eq!(columns, vec![sex_a]);
    }

    #[test]
    fn test_conflicting_splits_are_rejected() {
        let model = create_test_model();
        let mut store = UsageStore::new();
        let a = store.push(FieldUsage::elements_split(0));
        let b = store.push(FieldUsage::split(0, SplitMethod::Identity));

        let mut layer = Layer::new();
        layer.aesthetics.color = Some(a);
        layer.aesthetics.details.push(b);
        let query = Query::new(
            "census",
            Layout::new(AxisExpr::Empty, AxisExpr::Empty),
            layer,
        );

        match predict_statement(&query, &store, &model) {
            Err(FormatError::ConflictingSplits { field: 0 }) => {}
            other => panic!("expected ConflictingSplits, got {:?}", other),
        }
    }

    #[test]
    fn test_templated_queries_are_rejected() {
        let (model, store, mut query) = create_atomic_query();
        query.layout.cols = AxisExpr::Concat(vec![AxisExpr::Usage(0), AxisExpr::Usage(1)]);

        match predict_statement(&query, &store, &model) {
            Err(FormatError::NotAtomic) => {}
            other => panic!("expected NotAtomic, got {:?}", other),
        }
    }

    #[test]
    fn test_select_statement_uses_yield_fields() {
        let (model, store, query) = create_atomic_query();
        let (statement, columns) = select_statement(&query, &store, &model).unwrap();

        assert_eq!(
            statement.select,
            vec!["age".to_string(), "sex".to_string()]
        );
        assert_eq!(statement.where_clause.len(), 1);
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn test_select_skips_densities() {
        let model = create_test_model();
        let mut store = UsageStore::new();
        let density = store.push(FieldUsage::density([1, 2]));
        let query = Query::new(
            "census",
            Layout::new(AxisExpr::Usage(density), AxisExpr::Empty),
            Layer::new(),
        );

        let (statement, columns) = select_statement(&query, &store, &model).unwrap();
        assert!(statement.select.is_empty());
        assert!(columns.is_empty());
    }

    #[test]
    fn test_show_statements() {
        let header = serde_json::to_value(ShowStatement::header("census")).unwrap();
        assert_eq!(header["SHOW"], "HEADER");
        assert_eq!(header["FROM"], "census");

        let models = serde_json::to_value(ShowStatement::models()).unwrap();
        assert_eq!(models["SHOW"], "MODELS");
        assert!(models.get("FROM").is_none());
    }
}
