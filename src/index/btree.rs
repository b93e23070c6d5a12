//! BTreeMap-based index structures
//!
//! Indexes use BTreeMap<CompositeKey, BTreeSet<DocumentId>> for
//! deterministic ordering. A composite key holds one slot per indexed
//! field; descending fields store their part reversed so the tree order
//! matches the declared direction.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use crate::document::{cmp_floats, cmp_int_float, DocumentId, Value, I64_EDGE};
use crate::planner::SortDirection;

/// Exact numeric key.
///
/// Integral floats within the i64 range are stored as `Int`, so `1` and
/// `1.0` share a key while distinct large integers never collide. `Float`
/// holds the raw bits of a non-integral, infinite or NaN value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKey {
    Int(i64),
    Float(u64),
}

impl NumberKey {
    pub fn from_int(i: i64) -> Self {
        NumberKey::Int(i)
    }

    pub fn from_float(f: f64) -> Self {
        if f.is_nan() {
            NumberKey::Float(f64::NAN.to_bits())
        } else if f.fract() == 0.0 && (-I64_EDGE..I64_EDGE).contains(&f) {
            NumberKey::Int(f as i64)
        } else {
            NumberKey::Float(f.to_bits())
        }
    }
}

impl Ord for NumberKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (*self, *other) {
            (NumberKey::Int(a), NumberKey::Int(b)) => a.cmp(&b),
            (NumberKey::Int(a), NumberKey::Float(b)) => cmp_int_float(a, f64::from_bits(b)),
            (NumberKey::Float(a), NumberKey::Int(b)) => {
                cmp_int_float(b, f64::from_bits(a)).reverse()
            }
            (NumberKey::Float(a), NumberKey::Float(b)) => {
                cmp_floats(f64::from_bits(a), f64::from_bits(b))
            }
        }
    }
}

impl PartialOrd for NumberKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Key part representing a single field value.
///
/// Ordering is deterministic: MinKey < Null < Number < String < Bool < MaxKey.
/// MinKey and MaxKey never come from documents; they bound range scans.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyPart {
    /// Lower sentinel
    MinKey,
    /// Null or missing field
    Null,
    /// Number; Int and Float of equal value share a key
    Number(NumberKey),
    /// String value
    String(String),
    /// Boolean value (false < true)
    Bool(bool),
    /// Upper sentinel
    MaxKey,
}

impl KeyPart {
    /// Create a key part from a float
    pub fn from_float(v: f64) -> Self {
        KeyPart::Number(NumberKey::from_float(v))
    }

    /// Create a key part from an integer
    pub fn from_int(v: i64) -> Self {
        KeyPart::Number(NumberKey::from_int(v))
    }

    /// Create a key part from a field value
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => KeyPart::Null,
            Value::Bool(b) => KeyPart::Bool(*b),
            Value::Int(i) => KeyPart::from_int(*i),
            Value::Float(f) => KeyPart::from_float(*f),
            Value::String(s) => KeyPart::String(s.clone()),
        }
    }

    /// Key part for a possibly-missing field. Missing indexes as null.
    pub fn from_field(value: Option<&Value>) -> Self {
        value.map(Self::from_value).unwrap_or(KeyPart::Null)
    }
}

/// One field slot of a composite key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeySlot {
    Asc(KeyPart),
    Desc(Reverse<KeyPart>),
}

impl KeySlot {
    pub fn new(part: KeyPart, direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => KeySlot::Asc(part),
            SortDirection::Desc => KeySlot::Desc(Reverse(part)),
        }
    }

    /// Smallest slot in tree order for the direction
    pub fn lowest(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => KeySlot::Asc(KeyPart::MinKey),
            SortDirection::Desc => KeySlot::Desc(Reverse(KeyPart::MaxKey)),
        }
    }

    /// Largest slot in tree order for the direction
    pub fn highest(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => KeySlot::Asc(KeyPart::MaxKey),
            SortDirection::Desc => KeySlot::Desc(Reverse(KeyPart::MinKey)),
        }
    }

    pub fn part(&self) -> &KeyPart {
        match self {
            KeySlot::Asc(p) => p,
            KeySlot::Desc(Reverse(p)) => p,
        }
    }
}

/// Composite key: one slot per indexed field, in index field order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey(pub Vec<KeySlot>);

impl CompositeKey {
    pub fn slots(&self) -> &[KeySlot] {
        &self.0
    }
}

/// Outcome of a tree scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyScan {
    /// Matching document identifiers in key order
    pub ids: Vec<DocumentId>,
    /// Distinct keys visited
    pub keys_examined: usize,
}

/// An ordered index tree
#[derive(Debug, Default)]
pub struct IndexTree {
    /// Maps keys to the set of documents holding them
    tree: BTreeMap<CompositeKey, BTreeSet<DocumentId>>,
}

impl IndexTree {
    /// Creates a new empty index tree
    pub fn new() -> Self {
        Self {
            tree: BTreeMap::new(),
        }
    }

    /// Insert a document identifier for a key.
    pub fn insert(&mut self, key: CompositeKey, id: DocumentId) {
        self.tree.entry(key).or_default().insert(id);
    }

    /// Remove a document identifier for a key.
    ///
    /// If the key has no more documents, removes the key entirely.
    pub fn remove(&mut self, key: &CompositeKey, id: &DocumentId) {
        if let Some(ids) = self.tree.get_mut(key) {
            ids.remove(id);
            if ids.is_empty() {
                self.tree.remove(key);
            }
        }
    }

    /// Lookup all identifiers for an exact key match.
    pub fn lookup_eq(&self, key: &CompositeKey) -> Vec<DocumentId> {
        self.tree
            .get(key)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Lookup identifiers with keys in [lower, upper] (inclusive).
    pub fn lookup_range(&self, lower: &CompositeKey, upper: &CompositeKey) -> KeyScan {
        if lower > upper {
            return KeyScan::default();
        }

        let mut scan = KeyScan::default();
        for (_, ids) in self
            .tree
            .range((Bound::Included(lower), Bound::Included(upper)))
        {
            scan.keys_examined += 1;
            scan.ids.extend(ids.iter().cloned());
        }
        scan
    }

    /// Returns the number of distinct keys
    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    /// Returns the total number of (key, document) entries
    pub fn entry_count(&self) -> usize {
        self.tree.values().map(|v| v.len()).sum()
    }
}
