//! Structured query requests
//!
//! Requests are built from typed builders or from JSON descriptors shaped
//! like `{"published_year": {"$gt": 2010}, "in_stock": true}`. There is no
//! textual query language.

use std::collections::HashMap;

use crate::document::Value;
use crate::index::IndexSpec;

use super::errors::{QueryError, QueryResult};
use super::projection::Projection;

/// Filter operation types
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Equality: field = value (boolean-equals is `Eq(Bool)`)
    Eq(Value),
    /// Inequality: field != value, also true when the field is absent
    Ne(Value),
    /// Greater than: field > value
    Gt(Value),
    /// Greater than or equal: field >= value
    Gte(Value),
    /// Less than: field < value
    Lt(Value),
    /// Less than or equal: field <= value
    Lte(Value),
    /// Membership: field equals any of the values
    In(Vec<Value>),
}

impl FilterOp {
    /// Returns true if this is an equality operation
    pub fn is_equality(&self) -> bool {
        matches!(self, FilterOp::Eq(_))
    }

    /// Returns true if this is a range operation
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            FilterOp::Gte(_) | FilterOp::Gt(_) | FilterOp::Lte(_) | FilterOp::Lt(_)
        )
    }

    /// Returns the operation name for explain output
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "eq",
            FilterOp::Ne(_) => "ne",
            FilterOp::Gt(_) => "gt",
            FilterOp::Gte(_) => "gte",
            FilterOp::Lt(_) => "lt",
            FilterOp::Lte(_) => "lte",
            FilterOp::In(_) => "in",
        }
    }

    fn from_operator(op: &str, operand: &serde_json::Value) -> QueryResult<Self> {
        if op == "$in" {
            let serde_json::Value::Array(items) = operand else {
                return Err(QueryError::invalid_predicate("$in requires an array"));
            };
            let values = items
                .iter()
                .map(scalar_operand)
                .collect::<QueryResult<Vec<_>>>()?;
            return Ok(FilterOp::In(values));
        }

        let value = scalar_operand(operand)?;
        match op {
            "$eq" => Ok(FilterOp::Eq(value)),
            "$ne" => Ok(FilterOp::Ne(value)),
            "$gt" => Ok(FilterOp::Gt(value)),
            "$gte" => Ok(FilterOp::Gte(value)),
            "$lt" => Ok(FilterOp::Lt(value)),
            "$lte" => Ok(FilterOp::Lte(value)),
            other => Err(QueryError::invalid_predicate(format!(
                "unknown operator '{}'",
                other
            ))),
        }
    }
}

fn scalar_operand(raw: &serde_json::Value) -> QueryResult<Value> {
    Value::from_json(raw).ok_or_else(|| {
        QueryError::invalid_predicate(format!("operand {} is not a scalar", raw))
    })
}

/// A single predicate (field + operation)
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Field name
    pub field: String,
    /// Filter operation
    pub op: FilterOp,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: FilterOp) -> Self {
        Self {
            field: field.into(),
            op,
        }
    }

    /// Create an equality predicate
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq(value.into()))
    }

    /// Create an inequality predicate
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Ne(value.into()))
    }

    /// Create a range predicate (gt)
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Gt(value.into()))
    }

    /// Create a range predicate (gte)
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Gte(value.into()))
    }

    /// Create a range predicate (lt)
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Lt(value.into()))
    }

    /// Create a range predicate (lte)
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Lte(value.into()))
    }

    /// Create a membership predicate
    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, FilterOp::In(values))
    }

    /// Returns true if this is an equality predicate
    pub fn is_equality(&self) -> bool {
        self.op.is_equality()
    }

    /// Returns true if this is a range predicate
    pub fn is_range(&self) -> bool {
        self.op.is_range()
    }

    /// Rejects comparisons that have no defined ordering.
    ///
    /// Relational operands must be a number or a string; null, booleans and
    /// NaN are rejected.
    pub fn validate(&self) -> QueryResult<()> {
        if self.field.is_empty() {
            return Err(QueryError::invalid_predicate("field name must not be empty"));
        }

        let bound = match &self.op {
            FilterOp::Gt(v) | FilterOp::Gte(v) | FilterOp::Lt(v) | FilterOp::Lte(v) => v,
            _ => return Ok(()),
        };

        match bound {
            Value::Int(_) | Value::String(_) => Ok(()),
            Value::Float(f) if !f.is_nan() => Ok(()),
            other => Err(QueryError::invalid_predicate(format!(
                "cannot apply ${} to field '{}' with a {} operand",
                self.op.op_name(),
                self.field,
                if other.as_f64().is_some() { "NaN" } else { other.type_name() }
            ))),
        }
    }
}

/// A conjunction of predicates. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// Matches every document
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    /// Adds a predicate
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(Predicate::eq(field, value))
    }

    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(Predicate::ne(field, value))
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(Predicate::gt(field, value))
    }

    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(Predicate::gte(field, value))
    }

    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(Predicate::lt(field, value))
    }

    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(Predicate::lte(field, value))
    }

    /// Parses `{"field": value, "other": {"$gt": 1}}`.
    pub fn from_json(raw: &serde_json::Value) -> QueryResult<Self> {
        let serde_json::Value::Object(map) = raw else {
            return Err(QueryError::invalid_predicate(format!(
                "filter must be an object, got {}",
                raw
            )));
        };

        let mut filter = Filter::all();
        for (field, condition) in map {
            match condition {
                serde_json::Value::Object(ops) => {
                    if ops.is_empty() {
                        return Err(QueryError::invalid_predicate(format!(
                            "empty condition for field '{}'",
                            field
                        )));
                    }
                    for (op, operand) in ops {
                        if !op.starts_with('$') {
                            return Err(QueryError::invalid_predicate(format!(
                                "nested document conditions are not supported (field '{}')",
                                field
                            )));
                        }
                        let op = FilterOp::from_operator(op, operand)?;
                        filter.predicates.push(Predicate::new(field.clone(), op));
                    }
                }
                scalar => {
                    let value = scalar_operand(scalar)?;
                    filter.predicates.push(Predicate::eq(field.clone(), value));
                }
            }
        }

        filter.validate()?;
        Ok(filter)
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Validates every predicate
    pub fn validate(&self) -> QueryResult<()> {
        self.predicates.iter().try_for_each(Predicate::validate)
    }

    /// Returns predicates grouped by field
    pub fn predicates_by_field(&self) -> HashMap<&str, Vec<&Predicate>> {
        let mut map: HashMap<&str, Vec<&Predicate>> = HashMap::new();
        for pred in &self.predicates {
            map.entry(&pred.field).or_default().push(pred);
        }
        map
    }
}

/// Sort direction (also the direction of an index field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// `1` for ascending, `-1` for descending
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }

    /// Parses `1` / `-1`
    pub fn from_json(raw: &serde_json::Value) -> Option<Self> {
        match raw.as_i64() {
            Some(1) => Some(SortDirection::Asc),
            Some(-1) => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Sort specification for a single key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Field to sort by
    pub field: String,
    /// Sort direction
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parses `{"price": -1, "title": 1}` into keys in the given order.
    pub fn list_from_json(raw: &serde_json::Value) -> QueryResult<Vec<SortSpec>> {
        let serde_json::Value::Object(map) = raw else {
            return Err(QueryError::invalid_sort(format!(
                "sort must be an object, got {}",
                raw
            )));
        };
        if map.is_empty() {
            return Err(QueryError::invalid_sort("sort needs at least one key"));
        }

        map.iter()
            .map(|(field, dir)| {
                let direction = SortDirection::from_json(dir).ok_or_else(|| {
                    QueryError::invalid_sort(format!(
                        "direction for '{}' must be 1 or -1, got {}",
                        field, dir
                    ))
                })?;
                Ok(SortSpec {
                    field: field.clone(),
                    direction,
                })
            })
            .collect()
    }
}

/// A find request: filter, projection, sort and pagination
#[derive(Debug, Clone, Default)]
pub struct FindRequest {
    /// Filter predicates (all combined with AND)
    pub filter: Filter,
    /// Projection applied to every returned document
    pub projection: Option<Projection>,
    /// Sort keys, most significant first
    pub sort: Vec<SortSpec>,
    /// Documents to skip after sorting
    pub skip: Option<usize>,
    /// Maximum documents to return; 0 means no limit
    pub limit: Option<usize>,
    /// Force a specific index
    pub hint: Option<IndexSpec>,
}

impl FindRequest {
    /// Creates a request with the given filter
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Matches every document
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Appends a sort key
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_hint(mut self, spec: IndexSpec) -> Self {
        self.hint = Some(spec);
        self
    }

    /// Effective limit, treating 0 as unlimited
    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|&l| l > 0)
    }

    /// Validates the filter and sort keys.
    ///
    /// Projections are validated when they are constructed.
    pub fn validate(&self) -> QueryResult<()> {
        self.filter.validate()?;
        for spec in &self.sort {
            if spec.field.is_empty() {
                return Err(QueryError::invalid_sort("sort field must not be empty"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_builder() {
        let filter = Filter::all()
            .eq("in_stock", true)
            .gt("published_year", 2010);

        assert_eq!(filter.predicates().len(), 2);
        assert!(filter.predicates()[0].is_equality());
        assert!(filter.predicates()[1].is_range());
    }

    #[test]
    fn test_filter_from_json() {
        let filter = Filter::from_json(&json!({
            "in_stock": true,
            "published_year": {"$gt": 2010, "$lte": 2020}
        }))
        .unwrap();

        assert_eq!(
            filter.predicates(),
            &[
                Predicate::eq("in_stock", true),
                Predicate::gt("published_year", 2010),
                Predicate::lte("published_year", 2020),
            ]
        );
    }

    #[test]
    fn test_filter_from_json_rejects_unknown_operator() {
        let err = Filter::from_json(&json!({"price": {"$near": 3}})).unwrap_err();
        assert_eq!(err.code(), "FOLIO_INVALID_PREDICATE");
    }

    #[test]
    fn test_relational_operand_must_be_orderable() {
        assert!(Predicate::gt("price", 10).validate().is_ok());
        assert!(Predicate::lt("title", "M").validate().is_ok());
        assert!(Predicate::gt("price", Value::Null).validate().is_err());
        assert!(Predicate::lte("in_stock", true).validate().is_err());
        assert!(Predicate::gte("price", f64::NAN).validate().is_err());
        // Equality against null is well-defined
        assert!(Predicate::eq("price", Value::Null).validate().is_ok());
    }

    #[test]
    fn test_empty_field_rejected() {
        let err = Predicate::eq("", 1).validate().unwrap_err();
        assert!(matches!(err, QueryError::InvalidPredicate(_)));
    }

    #[test]
    fn test_sort_list_keeps_key_order() {
        let specs = SortSpec::list_from_json(&json!({"price": -1, "title": 1})).unwrap();
        assert_eq!(specs, vec![SortSpec::desc("price"), SortSpec::asc("title")]);

        assert!(SortSpec::list_from_json(&json!({"price": 2})).is_err());
    }

    #[test]
    fn test_zero_limit_means_unlimited() {
        assert_eq!(FindRequest::all().with_limit(0).effective_limit(), None);
        assert_eq!(FindRequest::all().with_limit(5).effective_limit(), Some(5));
    }
}
