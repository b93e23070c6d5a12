//! Index Manager for foliodb
//!
//! Maintains secondary indexes over the document store. Indexes hold only
//! document identifiers; the store owns document content.
//!
//! # API
//!
//! - `create_index(spec, documents, policy)` - Build an index with one scan
//! - `apply_insert` / `apply_update` / `apply_remove` - Keep indexes in step
//!   with the store after every write
//! - `check_unique(id, doc)` - Verify unique indexes before a write
//! - `lookup(filter)` - Candidates from the best usable index
//! - `lookup_on(spec, filter)` - Candidates from a specific index

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::document::{Document, DocumentId};
use crate::observability::{log_event_with_fields, Event};
use crate::planner::{Filter, IndexAccess};

use super::bounds::IndexBounds;
use super::btree::IndexTree;
use super::errors::{IndexError, IndexResult};
use super::spec::IndexSpec;

/// What `create_index` does when the key pattern is already indexed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateIndexPolicy {
    /// Fail with `IndexExists`
    #[default]
    Reject,
    /// Return the existing index name without building anything
    Ignore,
}

impl DuplicateIndexPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateIndexPolicy::Reject => "reject",
            DuplicateIndexPolicy::Ignore => "ignore",
        }
    }
}

/// Candidates produced by an index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexScan {
    /// Name of the index used
    pub index: String,
    /// Candidate identifiers in index key order
    pub ids: Vec<DocumentId>,
    /// Distinct keys visited
    pub keys_examined: usize,
    /// Number of index fields the filter constrained
    pub prefix_len: usize,
}

/// Result of an index lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexLookup {
    /// An index was usable; the filter must still be applied to candidates
    Candidates(IndexScan),
    /// No usable index; the caller must scan the whole collection
    NoIndex,
}

impl IndexLookup {
    pub fn is_index_scan(&self) -> bool {
        matches!(self, IndexLookup::Candidates(_))
    }

    pub fn index_name(&self) -> Option<&str> {
        match self {
            IndexLookup::Candidates(scan) => Some(&scan.index),
            IndexLookup::NoIndex => None,
        }
    }
}

/// Description of an index for listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub name: String,
    pub spec: IndexSpec,
    /// Distinct keys
    pub keys: usize,
    /// (key, document) entries
    pub entries: usize,
    /// Lookups served so far
    pub usage: u64,
}

#[derive(Debug)]
struct SecondaryIndex {
    name: String,
    spec: IndexSpec,
    tree: IndexTree,
    usage: AtomicU64,
}

impl SecondaryIndex {
    fn scan(&self, bounds: &IndexBounds) -> IndexScan {
        let scan = self.tree.lookup_range(&bounds.lower, &bounds.upper);
        self.usage.fetch_add(1, Ordering::Relaxed);
        IndexScan {
            index: self.name.clone(),
            ids: scan.ids,
            keys_examined: scan.keys_examined,
            prefix_len: bounds.prefix_len(),
        }
    }
}

/// Index Manager that maintains in-memory secondary indexes.
///
/// Indexes are kept in creation order, which breaks selection ties.
#[derive(Debug, Default)]
pub struct IndexManager {
    indexes: Vec<SecondaryIndex>,
}

impl IndexManager {
    /// Creates a manager with no secondary indexes
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index by scanning `documents` once.
    ///
    /// Returns the index name. Nothing is registered if the build fails.
    pub fn create_index<'a, I>(
        &mut self,
        spec: IndexSpec,
        documents: I,
        policy: DuplicateIndexPolicy,
    ) -> IndexResult<String>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        spec.validate()?;

        if let Some(existing) = self
            .indexes
            .iter()
            .find(|idx| idx.spec.same_key_pattern(&spec))
        {
            return match policy {
                DuplicateIndexPolicy::Reject => Err(IndexError::index_exists(&existing.name)),
                DuplicateIndexPolicy::Ignore => Ok(existing.name.clone()),
            };
        }

        // Generated names can coincide for different key patterns
        let name = spec.name();
        if self.indexes.iter().any(|idx| idx.name == name) {
            return Err(IndexError::index_exists(&name));
        }
        log_event_with_fields(Event::IndexBuildStart, &[("index", &name)]);

        let mut tree = IndexTree::new();
        for doc in documents {
            let Some(id) = doc.id() else {
                continue;
            };
            let key = spec.key_for(doc);
            if spec.is_unique() && !tree.lookup_eq(&key).is_empty() {
                log_event_with_fields(
                    Event::IndexBuildFailed,
                    &[("index", &name), ("reason", "duplicate key")],
                );
                return Err(IndexError::duplicate_key(&name, describe_key(&spec, doc)));
            }
            tree.insert(key, DocumentId::from(id));
        }

        let entries = tree.entry_count().to_string();
        self.indexes.push(SecondaryIndex {
            name: name.clone(),
            spec,
            tree,
            usage: AtomicU64::new(0),
        });
        log_event_with_fields(
            Event::IndexBuildComplete,
            &[("entries", &entries), ("index", &name)],
        );

        Ok(name)
    }

    /// Drops an index by name, returning its spec
    pub fn drop_index(&mut self, name: &str) -> IndexResult<IndexSpec> {
        let pos = self
            .indexes
            .iter()
            .position(|idx| idx.name == name)
            .ok_or_else(|| IndexError::not_found(name))?;
        let removed = self.indexes.remove(pos);
        log_event_with_fields(Event::IndexDropped, &[("index", name)]);
        Ok(removed.spec)
    }

    /// Fails if `doc` would share a key with another document in any
    /// unique index. Must be called before the write is applied.
    pub fn check_unique(&self, id: &DocumentId, doc: &Document) -> IndexResult<()> {
        for idx in self.indexes.iter().filter(|idx| idx.spec.is_unique()) {
            let key = idx.spec.key_for(doc);
            if idx.tree.lookup_eq(&key).iter().any(|other| other != id) {
                return Err(IndexError::duplicate_key(
                    &idx.name,
                    describe_key(&idx.spec, doc),
                ));
            }
        }
        Ok(())
    }

    /// Adds a newly stored document to every index
    pub fn apply_insert(&mut self, id: &DocumentId, doc: &Document) {
        for idx in &mut self.indexes {
            let key = idx.spec.key_for(doc);
            idx.tree.insert(key, id.clone());
        }
    }

    /// Moves index entries of a replaced document.
    ///
    /// Indexes whose key did not change are left untouched.
    pub fn apply_update(&mut self, id: &DocumentId, old: &Document, new: &Document) {
        for idx in &mut self.indexes {
            let old_key = idx.spec.key_for(old);
            let new_key = idx.spec.key_for(new);
            if old_key != new_key {
                idx.tree.remove(&old_key, id);
                idx.tree.insert(new_key, id.clone());
            }
        }
    }

    /// Removes a deleted document from every index
    pub fn apply_remove(&mut self, id: &DocumentId, doc: &Document) {
        for idx in &mut self.indexes {
            let key = idx.spec.key_for(doc);
            idx.tree.remove(&key, id);
        }
    }

    /// Selects the best usable index for the filter.
    ///
    /// Longest matching prefix wins; ties go to the earliest created index.
    pub fn lookup(&self, filter: &Filter) -> IndexLookup {
        let mut best: Option<(&SecondaryIndex, IndexBounds)> = None;

        for idx in &self.indexes {
            let Some(bounds) = IndexBounds::analyze(&idx.spec, filter) else {
                continue;
            };
            let better = match &best {
                Some((_, current)) => bounds.prefix_len() > current.prefix_len(),
                None => true,
            };
            if better {
                best = Some((idx, bounds));
            }
        }

        match best {
            Some((idx, bounds)) => IndexLookup::Candidates(idx.scan(&bounds)),
            None => IndexLookup::NoIndex,
        }
    }

    /// Uses the index with the given key pattern, if it exists and the
    /// filter constrains its leading field.
    pub fn lookup_on(&self, spec: &IndexSpec, filter: &Filter) -> IndexLookup {
        let Some(idx) = self
            .indexes
            .iter()
            .find(|idx| idx.spec.same_key_pattern(spec))
        else {
            return IndexLookup::NoIndex;
        };

        match IndexBounds::analyze(&idx.spec, filter) {
            Some(bounds) => IndexLookup::Candidates(idx.scan(&bounds)),
            None => IndexLookup::NoIndex,
        }
    }

    /// Number of lookups served by the named index
    pub fn usage(&self, name: &str) -> Option<u64> {
        self.indexes
            .iter()
            .find(|idx| idx.name == name)
            .map(|idx| idx.usage.load(Ordering::Relaxed))
    }

    /// Lists indexes in creation order
    pub fn list(&self) -> Vec<IndexInfo> {
        self.indexes
            .iter()
            .map(|idx| IndexInfo {
                name: idx.name.clone(),
                spec: idx.spec.clone(),
                keys: idx.tree.key_count(),
                entries: idx.tree.entry_count(),
                usage: idx.usage.load(Ordering::Relaxed),
            })
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indexes.iter().any(|idx| idx.name == name)
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

impl IndexAccess for IndexManager {
    fn lookup(&self, filter: &Filter) -> IndexLookup {
        IndexManager::lookup(self, filter)
    }

    fn lookup_on(&self, spec: &IndexSpec, filter: &Filter) -> IndexLookup {
        IndexManager::lookup_on(self, spec, filter)
    }
}

/// Renders the indexed values of a document, e.g. `{ isbn: "123" }`
fn describe_key(spec: &IndexSpec, doc: &Document) -> String {
    let parts: Vec<String> = spec
        .fields()
        .iter()
        .map(|f| {
            let value = doc
                .get(&f.field)
                .map(|v| v.to_json().to_string())
                .unwrap_or_else(|| "null".to_string());
            format!("{}: {}", f.field, value)
        })
        .collect();
    format!("{{ {} }}", parts.join(", "))
}
