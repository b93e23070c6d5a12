//! In-memory record table
//!
//! Documents are kept in insertion order: each document gets a sequence
//! number when it is inserted and keeps it across updates. Iteration
//! follows sequence order, so "first match" is well defined.

use std::collections::{BTreeMap, HashMap};

use crate::document::{Document, DocumentId};
use crate::executor::DocumentSource;

/// Ordered, id-addressable document table.
#[derive(Debug, Default)]
pub struct RecordTable {
    /// Sequence number -> document
    records: BTreeMap<u64, Document>,
    /// Identifier -> sequence number
    positions: HashMap<DocumentId, u64>,
    next_seq: u64,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a document. The caller checks identifier uniqueness.
    pub fn insert(&mut self, id: DocumentId, doc: Document) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.records.insert(seq, doc);
        self.positions.insert(id, seq);
    }

    /// Replaces a stored document in place, keeping its position
    pub fn replace(&mut self, id: &DocumentId, doc: Document) -> Option<Document> {
        let seq = *self.positions.get(id)?;
        self.records.insert(seq, doc)
    }

    /// Removes a document
    pub fn remove(&mut self, id: &DocumentId) -> Option<Document> {
        let seq = self.positions.remove(id)?;
        self.records.remove(&seq)
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        let seq = self.positions.get(id)?;
        self.records.get(seq)
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.positions.contains_key(id)
    }

    /// Documents in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DocumentSource for RecordTable {
    fn fetch(&self, id: &DocumentId) -> Option<&Document> {
        self.get(id)
    }

    fn position(&self, id: &DocumentId) -> Option<u64> {
        self.positions.get(id).copied()
    }

    fn scan(&self) -> Box<dyn Iterator<Item = &Document> + '_> {
        Box::new(self.records.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, title: &str) -> (DocumentId, Document) {
        (
            DocumentId::from(id),
            Document::new().with("_id", id).with("title", title),
        )
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut table = RecordTable::new();
        for (id, d) in [doc("z", "Z"), doc("a", "A"), doc("m", "M")] {
            table.insert(id, d);
        }
        let ids: Vec<_> = table.iter().filter_map(Document::id).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut table = RecordTable::new();
        for (id, d) in [doc("a", "A"), doc("b", "B")] {
            table.insert(id, d);
        }

        let (id, updated) = doc("a", "A2");
        let old = table.replace(&id, updated).unwrap();
        assert_eq!(old.get("title").and_then(|v| v.as_str()), Some("A"));
        assert_eq!(table.position(&id), Some(0));
        assert_eq!(
            table.iter().next().and_then(|d| d.get("title")).and_then(|v| v.as_str()),
            Some("A2")
        );
    }

    #[test]
    fn test_remove() {
        let mut table = RecordTable::new();
        let (id, d) = doc("a", "A");
        table.insert(id.clone(), d);

        assert!(table.remove(&id).is_some());
        assert!(table.is_empty());
        assert!(table.get(&id).is_none());
        assert!(table.remove(&id).is_none());
    }

    #[test]
    fn test_replace_missing() {
        let mut table = RecordTable::new();
        let (id, d) = doc("a", "A");
        assert!(table.replace(&id, d).is_none());
        assert!(table.is_empty());
    }
}
