//! Index usability and key bounds
//!
//! A compound index is usable for a filter only through a contiguous
//! prefix of its fields carrying equality constraints, optionally followed
//! by one range constraint on the next field. Remaining fields are left
//! unbounded. The bounds may admit extra documents; the executor always
//! re-applies the full filter to index candidates.

use std::cmp::Ordering;

use crate::document::Value;
use crate::planner::{Filter, FilterOp, SortDirection};

use super::btree::{CompositeKey, KeyPart, KeySlot};
use super::spec::IndexSpec;

/// Key interval of an index that covers every document matching a filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBounds {
    /// Leading fields constrained by equality
    pub equality_len: usize,
    /// Whether the field after the equality prefix carries a range
    pub has_range: bool,
    /// Inclusive lower key
    pub lower: CompositeKey,
    /// Inclusive upper key
    pub upper: CompositeKey,
}

impl IndexBounds {
    /// Number of index fields the filter constrains
    pub fn prefix_len(&self) -> usize {
        self.equality_len + usize::from(self.has_range)
    }

    /// Computes bounds of `spec` for `filter`.
    ///
    /// Returns None if the index is not usable for the filter.
    pub fn analyze(spec: &IndexSpec, filter: &Filter) -> Option<Self> {
        let by_field = filter.predicates_by_field();

        let mut lower = Vec::with_capacity(spec.fields().len());
        let mut upper = Vec::with_capacity(spec.fields().len());
        let mut equality_len = 0;
        let mut has_range = false;

        for index_field in spec.fields() {
            let Some(preds) = by_field.get(index_field.field.as_str()) else {
                break;
            };
            let direction = index_field.direction;

            let equality = preds.iter().find_map(|p| match &p.op {
                FilterOp::Eq(v) => Some(v),
                _ => None,
            });
            if let Some(value) = equality {
                let part = KeyPart::from_value(value);
                lower.push(KeySlot::new(part.clone(), direction));
                upper.push(KeySlot::new(part, direction));
                equality_len += 1;
                continue;
            }

            let mut low: Option<&Value> = None;
            let mut high: Option<&Value> = None;
            for pred in preds {
                match &pred.op {
                    FilterOp::Gt(v) | FilterOp::Gte(v) => {
                        if low.map_or(true, |cur| v.canonical_cmp(cur) == Ordering::Greater) {
                            low = Some(v);
                        }
                    }
                    FilterOp::Lt(v) | FilterOp::Lte(v) => {
                        if high.map_or(true, |cur| v.canonical_cmp(cur) == Ordering::Less) {
                            high = Some(v);
                        }
                    }
                    _ => {}
                }
            }

            if low.is_some() || high.is_some() {
                let low = low.map(KeyPart::from_value).unwrap_or(KeyPart::MinKey);
                let high = high.map(KeyPart::from_value).unwrap_or(KeyPart::MaxKey);
                match direction {
                    SortDirection::Asc => {
                        lower.push(KeySlot::new(low, direction));
                        upper.push(KeySlot::new(high, direction));
                    }
                    SortDirection::Desc => {
                        lower.push(KeySlot::new(high, direction));
                        upper.push(KeySlot::new(low, direction));
                    }
                }
                has_range = true;
            }
            break;
        }

        let constrained = equality_len + usize::from(has_range);
        if constrained == 0 {
            return None;
        }

        for index_field in &spec.fields()[constrained..] {
            lower.push(KeySlot::lowest(index_field.direction));
            upper.push(KeySlot::highest(index_field.direction));
        }

        Some(Self {
            equality_len,
            has_range,
            lower: CompositeKey(lower),
            upper: CompositeKey(upper),
        })
    }
}
