//! Result sorting for query execution
//!
//! Multi-key, stable sort. Missing fields sort as null, so null and missing
//! come first in ascending order and last in descending order.

use std::borrow::Borrow;
use std::cmp::Ordering;

use crate::document::{Document, Value};
use crate::planner::{SortDirection, SortSpec};

/// Sorts result documents
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts documents according to the sort keys, most significant first.
    ///
    /// Ties on every key keep their input order.
    pub fn sort<D: Borrow<Document>>(documents: &mut [D], keys: &[SortSpec]) {
        if keys.is_empty() {
            return;
        }
        documents.sort_by(|a, b| Self::compare(a.borrow(), b.borrow(), keys));
    }

    /// Compares two documents under the sort keys
    pub fn compare(a: &Document, b: &Document, keys: &[SortSpec]) -> Ordering {
        for key in keys {
            let ordering = Self::compare_values(a.get(&key.field), b.get(&key.field));
            let ordering = match key.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        let null = Value::Null;
        a.unwrap_or(&null).canonical_cmp(b.unwrap_or(&null))
    }
}
