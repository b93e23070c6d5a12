//! Document store
//!
//! The store is the only owner of document content. Every write validates
//! first and then updates records and indexes together, so a failed write
//! leaves both exactly as they were.

use crate::config::EngineConfig;
use crate::document::{Document, DocumentId, Value, ID_FIELD};
use crate::error::{FolioError, FolioResult};
use crate::executor::{Cursor, ExecutionResult, QueryExecutor};
use crate::index::{IndexInfo, IndexManager, IndexSpec};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::pipeline::Pipeline;
use crate::planner::{ExplainPlan, Filter, FindRequest, QueryPlan};

use super::errors::StorageError;
use super::mutation::Mutation;
use super::records::RecordTable;

/// In-memory document collection with secondary indexes
#[derive(Debug, Default)]
pub struct DocumentStore {
    records: RecordTable,
    indexes: IndexManager,
    metrics: MetricsRegistry,
    config: EngineConfig,
}

impl DocumentStore {
    /// Creates an empty store with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with the given configuration.
    ///
    /// The log level is process-wide and is not applied here; see
    /// [`EngineConfig::apply_log_level`].
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.records.get(id)
    }

    /// Documents in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.records.iter()
    }

    // ==================================================================
    // Writes
    // ==================================================================

    /// Stores a document and returns its identifier.
    ///
    /// A caller-supplied `_id` must be a non-empty string; otherwise a
    /// fresh identifier is generated.
    pub fn insert(&mut self, doc: Document) -> FolioResult<DocumentId> {
        let result = self.try_insert(doc);
        self.finish_write("insert", result)
    }

    /// Parses a JSON object and stores it
    pub fn insert_json(&mut self, raw: &serde_json::Value) -> FolioResult<DocumentId> {
        let doc = Document::from_json(raw).map_err(StorageError::from);
        let result = doc.map_err(FolioError::from).and_then(|doc| self.try_insert(doc));
        self.finish_write("insert", result)
    }

    /// Inserts documents in order, stopping at the first failure.
    ///
    /// Documents inserted before the failure stay in the store.
    pub fn insert_many<I>(&mut self, docs: I) -> FolioResult<Vec<DocumentId>>
    where
        I: IntoIterator<Item = Document>,
    {
        docs.into_iter().map(|doc| self.insert(doc)).collect()
    }

    /// Applies the mutation to the first matching document in store order.
    ///
    /// Returns the number of documents modified; a mutation that leaves the
    /// document unchanged counts 0.
    pub fn update_one(&mut self, filter: &Filter, mutation: &Mutation) -> FolioResult<usize> {
        let result = self.try_update(filter, mutation, false);
        self.finish_write("update", result)
    }

    /// Applies the mutation to every matching document, all or nothing
    pub fn update_many(&mut self, filter: &Filter, mutation: &Mutation) -> FolioResult<usize> {
        let result = self.try_update(filter, mutation, true);
        self.finish_write("update", result)
    }

    /// Removes the first matching document in store order
    pub fn delete_one(&mut self, filter: &Filter) -> FolioResult<usize> {
        let result = self.try_delete(filter, false);
        self.finish_write("delete", result)
    }

    /// Removes every matching document
    pub fn delete_many(&mut self, filter: &Filter) -> FolioResult<usize> {
        let result = self.try_delete(filter, true);
        self.finish_write("delete", result)
    }

    fn try_insert(&mut self, mut doc: Document) -> FolioResult<DocumentId> {
        let id = match doc.get(ID_FIELD).cloned() {
            None => {
                let id = DocumentId::generate(self.config.id_prefix.as_deref());
                doc.set(ID_FIELD, id.as_str());
                id
            }
            Some(Value::String(s)) if !s.is_empty() => DocumentId::new(s),
            Some(other) => {
                return Err(StorageError::invalid_document(format!(
                    "_id must be a non-empty string, got {}",
                    other.type_name()
                ))
                .into())
            }
        };

        if self.records.contains(&id) {
            return Err(StorageError::duplicate_key(id.as_str()).into());
        }
        self.indexes.check_unique(&id, &doc)?;

        self.indexes.apply_insert(&id, &doc);
        self.records.insert(id.clone(), doc);
        self.metrics.increment_inserts();
        Ok(id)
    }

    fn try_update(&mut self, filter: &Filter, mutation: &Mutation, multi: bool) -> FolioResult<usize> {
        mutation.validate()?;
        let mut ids = self.matching_ids(filter)?;
        if !multi {
            ids.truncate(1);
        }

        // Compute every new version before touching anything.
        let mut changes = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(current) = self.records.get(&id) else {
                continue;
            };
            let updated = mutation.apply(current)?;
            if &updated != current {
                changes.push((id, updated));
            }
        }

        let mut applied: Vec<(DocumentId, Document)> = Vec::with_capacity(changes.len());
        for (id, updated) in changes {
            if let Err(err) = self.indexes.check_unique(&id, &updated) {
                self.revert(applied);
                return Err(err.into());
            }
            if let Some(old) = self.records.replace(&id, updated.clone()) {
                self.indexes.apply_update(&id, &old, &updated);
                applied.push((id, old));
            }
        }

        let modified = applied.len();
        self.metrics.add_updates(modified as u64);
        Ok(modified)
    }

    /// Restores previous versions, newest change first
    fn revert(&mut self, applied: Vec<(DocumentId, Document)>) {
        for (id, old) in applied.into_iter().rev() {
            if let Some(newer) = self.records.replace(&id, old.clone()) {
                self.indexes.apply_update(&id, &newer, &old);
            }
        }
    }

    fn try_delete(&mut self, filter: &Filter, multi: bool) -> FolioResult<usize> {
        let mut ids = self.matching_ids(filter)?;
        if !multi {
            ids.truncate(1);
        }

        let mut deleted = 0;
        for id in ids {
            if let Some(doc) = self.records.remove(&id) {
                self.indexes.apply_remove(&id, &doc);
                deleted += 1;
            }
        }
        self.metrics.add_deletes(deleted as u64);
        Ok(deleted)
    }

    fn matching_ids(&self, filter: &Filter) -> FolioResult<Vec<DocumentId>> {
        let executor = QueryExecutor::new(&self.records, &self.indexes);
        Ok(executor.matching_ids(filter)?)
    }

    fn finish_write<T>(&self, op: &str, result: FolioResult<T>) -> FolioResult<T> {
        if let Err(err) = &result {
            self.metrics.increment_writes_rejected();
            let reason = err.to_string();
            log_event_with_fields(
                Event::WriteRejected,
                &[("code", err.code()), ("op", op), ("reason", &reason)],
            );
        }
        result
    }

    // ==================================================================
    // Reads
    // ==================================================================

    /// Restartable cursor over matching documents.
    ///
    /// Planning happens here; documents are read lazily.
    pub fn find(&self, request: FindRequest) -> FolioResult<Cursor<'_>> {
        let plan = self.plan(&request)?;
        Ok(Cursor::new(&self.records, plan, request))
    }

    /// Runs the request eagerly, with execution statistics
    pub fn execute(&self, request: &FindRequest) -> FolioResult<ExecutionResult> {
        let plan = self.plan(request)?;
        let result = QueryExecutor::new(&self.records, &self.indexes).execute_plan(&plan, request);
        self.metrics.add_docs_examined(result.docs_examined as u64);
        Ok(result)
    }

    /// First matching document in store order
    pub fn find_one(&self, filter: Filter) -> FolioResult<Option<Document>> {
        Ok(self.find(FindRequest::new(filter).with_limit(1))?.next())
    }

    pub fn count_documents(&self, filter: Filter) -> FolioResult<usize> {
        Ok(self.execute(&FindRequest::new(filter))?.len())
    }

    /// Runs the request and reports the winning scan and its statistics
    pub fn explain(&self, request: &FindRequest) -> FolioResult<ExplainPlan> {
        let plan = self.plan(request)?;
        let result = QueryExecutor::new(&self.records, &self.indexes).execute_plan(&plan, request);
        self.metrics.add_docs_examined(result.docs_examined as u64);
        Ok(ExplainPlan::from_plan(&plan, request)
            .with_execution(result.docs_examined, result.n_returned))
    }

    fn plan(&self, request: &FindRequest) -> FolioResult<QueryPlan> {
        match QueryExecutor::new(&self.records, &self.indexes).plan(request) {
            Ok(plan) => {
                self.metrics.increment_queries_executed();
                self.metrics
                    .record_scan(plan.is_index_scan(), plan.keys_examined as u64);
                log_event_with_fields(
                    Event::QueryPlanned,
                    &[
                        ("index", plan.index.as_deref().unwrap_or("none")),
                        ("scan", plan.scan_type.as_str()),
                    ],
                );
                Ok(plan)
            }
            Err(err) => {
                self.metrics.increment_queries_rejected();
                let reason = err.to_string();
                log_event_with_fields(
                    Event::QueryRejected,
                    &[("code", err.code()), ("reason", &reason)],
                );
                Err(err.into())
            }
        }
    }

    // ==================================================================
    // Aggregation
    // ==================================================================

    /// Runs a pipeline over the whole collection.
    ///
    /// A leading match stage is executed as a find, so it can use an index.
    pub fn aggregate(&self, pipeline: &Pipeline) -> FolioResult<Vec<Document>> {
        let output = match pipeline.leading_match() {
            Some(filter) => {
                let matched = self.execute(&FindRequest::new(filter.clone()))?;
                pipeline.run_after_leading_match(matched.into_documents())
            }
            None => pipeline.run(self.records.iter().cloned().collect()),
        };

        self.metrics.increment_pipelines_executed();
        let stages = pipeline.len().to_string();
        let returned = output.len().to_string();
        log_event_with_fields(
            Event::PipelineExecuted,
            &[("returned", &returned), ("stages", &stages)],
        );
        Ok(output)
    }

    /// Parses a JSON array of stages and runs it
    pub fn aggregate_json(&self, raw: &serde_json::Value) -> FolioResult<Vec<Document>> {
        let pipeline = Pipeline::from_json(raw).map_err(|err| {
            let reason = err.to_string();
            log_event_with_fields(
                Event::PipelineRejected,
                &[("code", err.code()), ("reason", &reason)],
            );
            err
        })?;
        self.aggregate(&pipeline)
    }

    // ==================================================================
    // Indexes
    // ==================================================================

    /// Builds a secondary index over the current documents.
    ///
    /// An already indexed key pattern is handled by the configured
    /// duplicate index policy.
    pub fn create_index(&mut self, spec: IndexSpec) -> FolioResult<String> {
        let before = self.indexes.len();
        let name = self
            .indexes
            .create_index(spec, self.records.iter(), self.config.duplicate_index)?;
        if self.indexes.len() > before {
            self.metrics.increment_indexes_built();
        }
        Ok(name)
    }

    pub fn drop_index(&mut self, name: &str) -> FolioResult<IndexSpec> {
        Ok(self.indexes.drop_index(name)?)
    }

    /// Indexes in creation order
    pub fn list_indexes(&self) -> Vec<IndexInfo> {
        self.indexes.list()
    }

    /// Number of lookups served by the named index
    pub fn index_usage(&self, name: &str) -> Option<u64> {
        self.indexes.usage(name)
    }
}
