//! Predicate filtering for query execution
//!
//! Comparison semantics:
//! - Relational operators never match an absent field
//! - Relational operators only compare within a type class (numbers with
//!   numbers, strings with strings); a mismatch is simply false
//! - Equality against an absent field matches only a `null` operand
//! - `ne` is the exact negation of `eq`

use std::cmp::Ordering;

use crate::document::{Document, Value};
use crate::planner::{Filter, FilterOp, Predicate};

/// Evaluates predicates against documents
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a document matches every predicate of the filter
    pub fn matches(document: &Document, filter: &Filter) -> bool {
        filter
            .predicates()
            .iter()
            .all(|pred| Self::evaluate(pred, document))
    }

    /// Checks if a document matches a single predicate
    pub fn evaluate(predicate: &Predicate, document: &Document) -> bool {
        let actual = document.get(&predicate.field);

        match &predicate.op {
            FilterOp::Eq(expected) => Self::eq_match(actual, expected),
            FilterOp::Ne(expected) => !Self::eq_match(actual, expected),
            FilterOp::In(options) => options.iter().any(|v| Self::eq_match(actual, v)),
            FilterOp::Gt(bound) => Self::compare(actual, bound, |o| o == Ordering::Greater),
            FilterOp::Gte(bound) => Self::compare(actual, bound, |o| o != Ordering::Less),
            FilterOp::Lt(bound) => Self::compare(actual, bound, |o| o == Ordering::Less),
            FilterOp::Lte(bound) => Self::compare(actual, bound, |o| o != Ordering::Greater),
        }
    }

    fn eq_match(actual: Option<&Value>, expected: &Value) -> bool {
        match actual {
            Some(value) => value.semantic_eq(expected),
            None => expected.is_null(),
        }
    }

    fn compare(actual: Option<&Value>, bound: &Value, accept: fn(Ordering) -> bool) -> bool {
        match actual {
            Some(value) if !value.is_null() && value.same_type_class(bound) => {
                if Self::is_nan(value) || Self::is_nan(bound) {
                    return false;
                }
                accept(value.canonical_cmp(bound))
            }
            _ => false,
        }
    }

    fn is_nan(value: &Value) -> bool {
        matches!(value, Value::Float(f) if f.is_nan())
    }
}
