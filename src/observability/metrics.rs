//! Metrics registry for foliodb
//!
//! - Counters only (no gauges, no histograms)
//! - Monotonic increase
//! - Thread-safe but lock-minimal

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry containing all operational counters
///
/// All counters use atomic operations with Relaxed ordering, so a
/// registry can be read while the store is shared behind a lock.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Documents inserted
    inserts: AtomicU64,
    /// Documents modified by updates
    updates: AtomicU64,
    /// Documents deleted
    deletes: AtomicU64,
    /// Writes rejected by validation or unique indexes
    writes_rejected: AtomicU64,
    /// Find requests executed
    queries_executed: AtomicU64,
    /// Find requests rejected
    queries_rejected: AtomicU64,
    /// Queries answered through an index
    index_scans: AtomicU64,
    /// Queries answered by a full scan
    collection_scans: AtomicU64,
    /// Index keys visited
    keys_examined: AtomicU64,
    /// Documents tested against a filter
    docs_examined: AtomicU64,
    /// Pipelines run to completion
    pipelines_executed: AtomicU64,
    /// Indexes built
    indexes_built: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Write metrics

    pub fn increment_inserts(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_updates(&self, count: u64) {
        self.updates.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_deletes(&self, count: u64) {
        self.deletes.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_writes_rejected(&self) {
        self.writes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // Query metrics

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Records how candidates were produced for one query
    pub fn record_scan(&self, index_scan: bool, keys_examined: u64) {
        if index_scan {
            self.index_scans.fetch_add(1, Ordering::Relaxed);
        } else {
            self.collection_scans.fetch_add(1, Ordering::Relaxed);
        }
        self.keys_examined.fetch_add(keys_examined, Ordering::Relaxed);
    }

    pub fn add_docs_examined(&self, count: u64) {
        self.docs_examined.fetch_add(count, Ordering::Relaxed);
    }

    // Pipeline and index metrics

    pub fn increment_pipelines_executed(&self) {
        self.pipelines_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_indexes_built(&self) {
        self.indexes_built.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of all metrics as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            writes_rejected: self.writes_rejected.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            index_scans: self.index_scans.load(Ordering::Relaxed),
            collection_scans: self.collection_scans.load(Ordering::Relaxed),
            keys_examined: self.keys_examined.load(Ordering::Relaxed),
            docs_examined: self.docs_examined.load(Ordering::Relaxed),
            pipelines_executed: self.pipelines_executed.load(Ordering::Relaxed),
            indexes_built: self.indexes_built.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
    pub writes_rejected: u64,
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub index_scans: u64,
    pub collection_scans: u64,
    pub keys_examined: u64,
    pub docs_examined: u64,
    pub pipelines_executed: u64,
    pub indexes_built: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let registry = MetricsRegistry::new();
        assert_eq!(registry.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_increment_counters() {
        let registry = MetricsRegistry::new();

        registry.increment_inserts();
        registry.increment_inserts();
        registry.add_updates(3);
        registry.add_deletes(1);
        registry.increment_queries_executed();
        registry.increment_queries_rejected();
        registry.increment_pipelines_executed();
        registry.increment_indexes_built();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.inserts, 2);
        assert_eq!(snapshot.updates, 3);
        assert_eq!(snapshot.deletes, 1);
        assert_eq!(snapshot.queries_executed, 1);
        assert_eq!(snapshot.queries_rejected, 1);
        assert_eq!(snapshot.pipelines_executed, 1);
        assert_eq!(snapshot.indexes_built, 1);
    }

    #[test]
    fn test_record_scan() {
        let registry = MetricsRegistry::new();
        registry.record_scan(true, 4);
        registry.record_scan(false, 0);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.index_scans, 1);
        assert_eq!(snapshot.collection_scans, 1);
        assert_eq!(snapshot.keys_examined, 4);
    }

    #[test]
    fn test_to_json() {
        let registry = MetricsRegistry::new();
        registry.add_docs_examined(12);
        registry.increment_queries_executed();

        let parsed: serde_json::Value = serde_json::from_str(&registry.to_json()).unwrap();
        assert_eq!(parsed["docs_examined"], 12);
        assert_eq!(parsed["queries_executed"], 1);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let reg = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    reg.increment_inserts();
                    reg.increment_queries_executed();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.inserts, 1000);
        assert_eq!(snapshot.queries_executed, 1000);
    }
}
