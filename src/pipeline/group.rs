//! Group stage execution
//!
//! Accumulator state is built fresh for every run and discarded once the
//! groups are finalized. Averages keep a running sum and count and divide
//! only at finalize.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::document::{Document, Value, ID_FIELD};
use crate::index::KeyPart;

use super::stage::{Accumulator, GroupStage};

/// Running state of one accumulator in one group
#[derive(Debug, Clone)]
enum AccState {
    Count(i64),
    Sum {
        int: i64,
        float: f64,
        has_float: bool,
    },
    Avg {
        sum: f64,
        count: u64,
    },
    Min(Option<Value>),
    Max(Option<Value>),
}

impl AccState {
    fn new(acc: &Accumulator) -> Self {
        match acc {
            Accumulator::Count => AccState::Count(0),
            Accumulator::Sum(_) => AccState::Sum {
                int: 0,
                float: 0.0,
                has_float: false,
            },
            Accumulator::Avg(_) => AccState::Avg { sum: 0.0, count: 0 },
            Accumulator::Min(_) => AccState::Min(None),
            Accumulator::Max(_) => AccState::Max(None),
        }
    }

    fn update(&mut self, acc: &Accumulator, doc: &Document) {
        match (self, acc) {
            (AccState::Count(n), Accumulator::Count) => *n += 1,
            (
                AccState::Sum {
                    int,
                    float,
                    has_float,
                },
                Accumulator::Sum(expr),
            ) => match expr.eval(doc) {
                Value::Int(i) => match int.checked_add(i) {
                    Some(total) => *int = total,
                    None => {
                        *float += i as f64;
                        *has_float = true;
                    }
                },
                Value::Float(f) => {
                    *float += f;
                    *has_float = true;
                }
                _ => {}
            },
            (AccState::Avg { sum, count }, Accumulator::Avg(expr)) => {
                if let Some(v) = expr.eval(doc).as_f64() {
                    *sum += v;
                    *count += 1;
                }
            }
            (AccState::Min(current), Accumulator::Min(expr)) => {
                keep_extreme(current, expr.eval(doc), Ordering::Less)
            }
            (AccState::Max(current), Accumulator::Max(expr)) => {
                keep_extreme(current, expr.eval(doc), Ordering::Greater)
            }
            _ => {}
        }
    }

    fn finalize(self) -> Value {
        match self {
            AccState::Count(n) => Value::Int(n),
            AccState::Sum {
                int,
                float,
                has_float,
            } => {
                if has_float {
                    Value::Float(int as f64 + float)
                } else {
                    Value::Int(int)
                }
            }
            AccState::Avg { sum, count } => {
                if count == 0 {
                    Value::Null
                } else {
                    Value::Float(sum / count as f64)
                }
            }
            AccState::Min(v) | AccState::Max(v) => v.unwrap_or(Value::Null),
        }
    }
}

/// Nulls and missing values never win min/max
fn keep_extreme(current: &mut Option<Value>, candidate: Value, wanted: Ordering) {
    if candidate.is_null() {
        return;
    }
    let replace = match current {
        Some(existing) => candidate.canonical_cmp(existing) == wanted,
        None => true,
    };
    if replace {
        *current = Some(candidate);
    }
}

struct Group {
    key: Value,
    states: Vec<AccState>,
}

/// Groups documents and finalizes accumulators.
///
/// Output documents carry the key in `_id` followed by one field per
/// accumulator. Groups are emitted in the order their key was first seen.
pub(crate) fn run_group(stage: &GroupStage, docs: Vec<Document>) -> Vec<Document> {
    let mut slots: BTreeMap<KeyPart, usize> = BTreeMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for doc in &docs {
        let key = stage.key.eval(doc);
        let slot = *slots.entry(KeyPart::from_value(&key)).or_insert_with(|| {
            groups.push(Group {
                key,
                states: stage
                    .accumulators
                    .iter()
                    .map(|(_, acc)| AccState::new(acc))
                    .collect(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        for (state, (_, acc)) in group.states.iter_mut().zip(&stage.accumulators) {
            state.update(acc, doc);
        }
    }

    groups
        .into_iter()
        .map(|group| {
            let mut out = Document::new().with(ID_FIELD, group.key);
            for (state, (name, _)) in group.states.into_iter().zip(&stage.accumulators) {
                out.set(name.clone(), state.finalize());
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Expr;

    fn book(genre: &str, price: f64, year: i64) -> Document {
        Document::new()
            .with("genre", genre)
            .with("price", price)
            .with("published_year", year)
    }

    #[test]
    fn test_avg_divides_at_finalize() {
        let docs = vec![book("X", 10.0, 1950), book("X", 30.0, 1960), book("Y", 5.0, 1970)];
        let stage = GroupStage::by(Expr::field("genre")).avg("averagePrice", Expr::field("price"));

        let out = run_group(&stage, docs);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("_id"), Some(&Value::from("X")));
        assert_eq!(out[0].get("averagePrice"), Some(&Value::Float(20.0)));
        assert_eq!(out[1].get("averagePrice"), Some(&Value::Float(5.0)));
    }

    #[test]
    fn test_count_and_sum() {
        let docs = vec![book("X", 10.0, 1950), book("X", 2.5, 1960)];
        let stage = GroupStage::by(Expr::field("genre"))
            .count("count")
            .sum("ones", Expr::literal(1))
            .sum("total", Expr::field("price"));

        let out = run_group(&stage, docs);
        assert_eq!(out[0].get("count"), Some(&Value::Int(2)));
        assert_eq!(out[0].get("ones"), Some(&Value::Int(2)));
        assert_eq!(out[0].get("total"), Some(&Value::Float(12.5)));
    }

    #[test]
    fn test_avg_without_numbers_is_null() {
        let docs = vec![Document::new().with("genre", "X")];
        let stage = GroupStage::by(Expr::field("genre")).avg("avg", Expr::field("price"));
        let out = run_group(&stage, docs);
        assert_eq!(out[0].get("avg"), Some(&Value::Null));
    }

    #[test]
    fn test_min_max_ignore_nulls() {
        let docs = vec![
            book("X", 10.0, 1950),
            Document::new().with("genre", "X"),
            book("X", 3.0, 1960),
        ];
        let stage = GroupStage::by(Expr::field("genre"))
            .min("cheapest", Expr::field("price"))
            .max("newest", Expr::field("published_year"));

        let out = run_group(&stage, docs);
        assert_eq!(out[0].get("cheapest"), Some(&Value::Float(3.0)));
        assert_eq!(out[0].get("newest"), Some(&Value::Int(1960)));
    }

    #[test]
    fn test_numeric_keys_share_group() {
        let docs = vec![
            Document::new().with("k", 1),
            Document::new().with("k", 1.0),
            Document::new(),
        ];
        let stage = GroupStage::by(Expr::field("k")).count("n");
        let out = run_group(&stage, docs);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("n"), Some(&Value::Int(2)));
        assert_eq!(out[1].get("_id"), Some(&Value::Null));
    }

    #[test]
    fn test_large_integer_keys_stay_distinct() {
        let docs = vec![
            Document::new().with("k", 9_007_199_254_740_992_i64),
            Document::new().with("k", 9_007_199_254_740_993_i64),
        ];
        let stage = GroupStage::by(Expr::field("k")).count("n");
        let out = run_group(&stage, docs);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].get("_id"), Some(&Value::Int(9_007_199_254_740_993)));
        assert_eq!(out[1].get("n"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_first_seen_order() {
        let docs = vec![book("B", 1.0, 1), book("A", 1.0, 1), book("B", 1.0, 1)];
        let stage = GroupStage::by(Expr::field("genre")).count("n");
        let keys: Vec<_> = run_group(&stage, docs)
            .iter()
            .map(|d| d.get("_id").cloned())
            .collect();
        assert_eq!(keys, vec![Some(Value::from("B")), Some(Value::from("A"))]);
    }
}
