//! Declarative filters and their translation into the search query DSL.
//!
//! Filters are written as JSON mappings:
//!
//! ```text
//! {"_id": {"$nin": ["a", "b"]}}
//! {"$and": {"year": {"$gte": 2020}, "$not": {"lang": "de"}}}
//! {"genre": ["fiction", "poetry"]}          // implicit $in
//! {"lang": "en"}                            // implicit $eq
//! ```
//!
//! A parsed [`Filter`] renders to Elasticsearch/OpenSearch query DSL via
//! [`Filter::to_query_dsl`] and can be evaluated against a [`SourceRecord`]
//! for sources that filter locally.

use std::cmp::Ordering;

use serde_json::{json, Map, Value};

use super::error::{SourceError, SourceResult};
use super::record::SourceRecord;

/// Largest value list placed in a single `terms` clause (cluster default
/// for `index.max_terms_count`).
pub const MAX_TERMS_PER_CLAUSE: usize = 65_536;

/// Comparison operator of a field predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    In,
    Nin,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn parse(op: &str) -> SourceResult<Self> {
        match op {
            "$eq" => Ok(Self::Eq),
            "$ne" => Ok(Self::Ne),
            "$in" => Ok(Self::In),
            "$nin" => Ok(Self::Nin),
            "$gt" => Ok(Self::Gt),
            "$gte" => Ok(Self::Gte),
            "$lt" => Ok(Self::Lt),
            "$lte" => Ok(Self::Lte),
            other => Err(SourceError::filter(format!("unknown operator '{}'", other))),
        }
    }

    fn range_key(&self) -> Option<&'static str> {
        match self {
            Self::Gt => Some("gt"),
            Self::Gte => Some("gte"),
            Self::Lt => Some("lt"),
            Self::Lte => Some("lte"),
            _ => None,
        }
    }
}

/// A parsed filter tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
}

impl Filter {
    /// `field` is not any of `values`.
    pub fn not_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Compare {
            field: field.into(),
            op: CompareOp::Nin,
            value: Value::Array(values.into_iter().map(Into::into).collect()),
        }
    }

    /// `field` equals `value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Compare {
            field: field.into(),
            op: CompareOp::Eq,
            value: value.into(),
        }
    }

    /// Parse a filter mapping.
    pub fn parse(filter: &Value) -> SourceResult<Self> {
        let map = filter
            .as_object()
            .ok_or_else(|| SourceError::filter("filter must be a JSON object"))?;
        let mut clauses = parse_mapping(map)?;
        if clauses.len() == 1 {
            Ok(clauses.remove(0))
        } else {
            Ok(Self::And(clauses))
        }
    }

    /// Render as query DSL suitable for a `bool.filter` clause.
    pub fn to_query_dsl(&self) -> Value {
        match self {
            Self::And(children) => json!({
                "bool": { "must": children.iter().map(Filter::to_query_dsl).collect::<Vec<_>>() }
            }),
            Self::Or(children) => json!({
                "bool": {
                    "should": children.iter().map(Filter::to_query_dsl).collect::<Vec<_>>(),
                    "minimum_should_match": 1
                }
            }),
            Self::Not(child) => json!({ "bool": { "must_not": [child.to_query_dsl()] } }),
            Self::Compare { field, op, value } => compare_dsl(field, *op, value),
        }
    }

    /// Evaluate the filter against a record.
    pub fn matches(&self, record: &SourceRecord) -> bool {
        match self {
            Self::And(children) => children.iter().all(|c| c.matches(record)),
            Self::Or(children) => children.iter().any(|c| c.matches(record)),
            Self::Not(child) => !child.matches(record),
            Self::Compare { field, op, value } => {
                let actual = record.field(field);
                compare_value(actual.as_ref(), *op, value)
            }
        }
    }
}

fn parse_mapping(map: &Map<String, Value>) -> SourceResult<Vec<Filter>> {
    map.iter().map(|(key, value)| parse_entry(key, value)).collect()
}

fn parse_entry(key: &str, value: &Value) -> SourceResult<Filter> {
    match key {
        "$and" => Ok(Filter::And(parse_children(value)?)),
        "$or" => Ok(Filter::Or(parse_children(value)?)),
        "$not" => {
            let mut children = parse_children(value)?;
            let child = if children.len() == 1 {
                children.remove(0)
            } else {
                Filter::And(children)
            };
            Ok(Filter::Not(Box::new(child)))
        }
        op if op.starts_with('$') => Err(SourceError::filter(format!(
            "operator '{}' needs a field name",
            op
        ))),
        field => parse_field(field, value),
    }
}

fn parse_children(value: &Value) -> SourceResult<Vec<Filter>> {
    match value {
        Value::Object(map) => parse_mapping(map),
        Value::Array(items) => items.iter().map(Filter::parse).collect(),
        _ => Err(SourceError::filter(
            "logical operators take an object or a list of objects",
        )),
    }
}

fn parse_field(field: &str, value: &Value) -> SourceResult<Filter> {
    match value {
        Value::Object(ops) => {
            let mut clauses = Vec::with_capacity(ops.len());
            for (op, operand) in ops {
                let op = CompareOp::parse(op)?;
                if matches!(op, CompareOp::In | CompareOp::Nin) && !operand.is_array() {
                    return Err(SourceError::filter(format!(
                        "'{}' expects a list of values",
                        field
                    )));
                }
                clauses.push(Filter::Compare {
                    field: field.to_string(),
                    op,
                    value: operand.clone(),
                });
            }
            match clauses.len() {
                0 => Err(SourceError::filter(format!("no operator given for '{}'", field))),
                1 => Ok(clauses.remove(0)),
                _ => Ok(Filter::And(clauses)),
            }
        }
        Value::Array(_) => Ok(Filter::Compare {
            field: field.to_string(),
            op: CompareOp::In,
            value: value.clone(),
        }),
        _ => Ok(Filter::eq(field, value.clone())),
    }
}

fn compare_dsl(field: &str, op: CompareOp, value: &Value) -> Value {
    match op {
        CompareOp::Eq => json!({ "term": { field: value } }),
        CompareOp::Ne => json!({ "bool": { "must_not": [{ "term": { field: value } }] } }),
        CompareOp::In => {
            let clauses = terms_clauses(field, value);
            if clauses.len() == 1 {
                clauses.into_iter().next().unwrap_or(Value::Null)
            } else {
                json!({ "bool": { "should": clauses, "minimum_should_match": 1 } })
            }
        }
        CompareOp::Nin => json!({ "bool": { "must_not": terms_clauses(field, value) } }),
        CompareOp::Gt | CompareOp::Gte | CompareOp::Lt | CompareOp::Lte => {
            let key = op.range_key().unwrap_or("gte");
            json!({ "range": { field: { key: value } } })
        }
    }
}

fn terms_clauses(field: &str, value: &Value) -> Vec<Value> {
    let values = value.as_array().cloned().unwrap_or_default();
    if values.is_empty() {
        return vec![json!({ "terms": { field: [] } })];
    }
    values
        .chunks(MAX_TERMS_PER_CLAUSE)
        .map(|chunk| json!({ "terms": { field: chunk } }))
        .collect()
}

fn compare_value(actual: Option<&Value>, op: CompareOp, expected: &Value) -> bool {
    match op {
        CompareOp::Eq => actual.is_some_and(|a| equals(a, expected)),
        CompareOp::Ne => !actual.is_some_and(|a| equals(a, expected)),
        CompareOp::In => actual.is_some_and(|a| contained_in(a, expected)),
        CompareOp::Nin => !actual.is_some_and(|a| contained_in(a, expected)),
        CompareOp::Gt => ordering(actual, expected).is_some_and(|o| o == Ordering::Greater),
        CompareOp::Gte => ordering(actual, expected).is_some_and(|o| o != Ordering::Less),
        CompareOp::Lt => ordering(actual, expected).is_some_and(|o| o == Ordering::Less),
        CompareOp::Lte => ordering(actual, expected).is_some_and(|o| o != Ordering::Greater),
    }
}

// Multi-valued fields match when any element matches, as in the search engines.
fn equals(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|item| scalar_eq(item, expected)),
        _ => scalar_eq(actual, expected),
    }
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn contained_in(actual: &Value, expected: &Value) -> bool {
    expected
        .as_array()
        .is_some_and(|candidates| candidates.iter().any(|c| equals(actual, c)))
}

fn ordering(actual: Option<&Value>, expected: &Value) -> Option<Ordering> {
    let actual = actual?;
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => match (actual.as_str(), expected.as_str()) {
            (Some(a), Some(b)) => Some(a.cmp(b)),
            _ => None,
        },
    }
}
