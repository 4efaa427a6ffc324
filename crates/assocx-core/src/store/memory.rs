use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use super::{DocumentStore, RemovalAction};
use crate::associations::AssociationResolver;
use crate::catalog::Catalog;
use crate::errors::{AssocError, Result};
use crate::model::{Document, Record, RecordType};
use crate::{log_op_end, log_op_error, log_op_start};

/// Call counters kept by `MemoryStore`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// `find_by_id` calls
    pub finds: usize,
    /// `load_polymorphic` calls
    pub polymorphic_loads: usize,
    /// Documents removed by destroy (cascades ran first)
    pub destroys: usize,
    /// Documents removed by delete
    pub deletes: usize,
    /// Streamed removals started
    pub streamed_removals: usize,
}

impl StoreStats {
    /// Lookups of either kind
    pub fn lookups(&self) -> usize {
        self.finds + self.polymorphic_loads
    }
}

/// In-memory document store
///
/// A `HashMap` of documents keyed by id, plus the catalog needed to hydrate
/// them into records. Not thread-safe (interior mutability via `RefCell`);
/// designed for single-threaded use.
///
/// `destroy` is the destroy orchestration: it runs the record's cascades and
/// then removes its document, so a cascaded `Destroy` recurses into the
/// target's own cascades. `delete` removes the document only. A record
/// reached again while its own destroy is still running is skipped, so
/// `Destroy` cycles and self-references terminate.
#[derive(Debug)]
pub struct MemoryStore {
    catalog: Arc<Catalog>,
    documents: RefCell<HashMap<String, Document>>,
    destroying: RefCell<HashSet<String>>,
    streamed_removal: bool,
    stats: Cell<StoreStats>,
}

impl MemoryStore {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            documents: RefCell::new(HashMap::new()),
            destroying: RefCell::new(HashSet::new()),
            streamed_removal: false,
            stats: Cell::new(StoreStats::default()),
        }
    }

    /// Offer streamed removal to cascades
    ///
    /// A streamed removal snapshots the store and restores it if any step of
    /// the removal, including the target's own cascades, fails.
    pub fn with_streamed_removal(mut self, enabled: bool) -> Self {
        self.streamed_removal = enabled;
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Resolver bound to this store and its catalog
    pub fn resolver(&self) -> AssociationResolver<'_, Self> {
        AssociationResolver::new(&self.catalog, self)
    }

    /// Insert or replace the record's document
    pub fn save(&self, record: &Record) {
        self.documents
            .borrow_mut()
            .insert(record.id().to_string(), record.to_document());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.borrow().contains_key(id)
    }

    /// Stored document by id, bypassing type checks
    pub fn document(&self, id: &str) -> Option<Document> {
        self.documents.borrow().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.borrow().is_empty()
    }

    /// Load a record by type name and id, failing when it is missing
    ///
    /// # Errors
    /// * `UnknownType` - `type_name` is not in the catalog
    /// * `RecordNotFound` - no document of that type has this id
    pub fn find(&self, type_name: &str, id: &str) -> Result<Record> {
        let record_type = self.catalog.require(type_name)?;
        self.find_by_id(record_type, Some(id), false)?
            .ok_or_else(|| not_found(type_name, id))
    }

    /// Run `record`'s cascades, then remove its document
    ///
    /// # Errors
    /// * `RecordExists` - a restricted reference blocked the destroy; the
    ///   document is kept
    /// * `RecordNotFound` - the record has no stored document; no cascade
    ///   runs
    /// * any error raised by a cascade
    pub fn destroy(&self, record: &mut Record) -> Result<()> {
        if self.destroying.borrow().contains(record.id()) {
            tracing::debug!(
                record_type = record.type_name(),
                record_id = record.id(),
                "destroy already in progress, skipped"
            );
            return Ok(());
        }

        let start = Instant::now();
        log_op_start!(
            "destroy",
            record_type = record.type_name(),
            record_id = record.id()
        );

        self.destroying.borrow_mut().insert(record.id().to_string());
        let result = self
            .require_stored(record)
            .and_then(|()| self.resolver().destroy_associations(record))
            .and_then(|()| self.remove_document(record, RemovalAction::Destroy));
        self.destroying.borrow_mut().remove(record.id());

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => {
                log_op_end!("destroy", duration_ms = duration_ms, record_id = record.id());
            }
            Err(err) => {
                log_op_error!(
                    "destroy",
                    err.clone(),
                    duration_ms = duration_ms,
                    record_id = record.id()
                );
            }
        }
        result
    }

    /// Remove `record`'s document without running cascades
    ///
    /// # Errors
    /// * `RecordNotFound` - the record has no stored document
    pub fn delete(&self, record: &Record) -> Result<()> {
        self.remove_document(record, RemovalAction::Delete)
    }

    /// Re-read `record`'s fields from its stored document and drop every
    /// cached association target
    ///
    /// # Errors
    /// * `RecordNotFound` - the record has no stored document
    pub fn reload(&self, record: &mut Record) -> Result<()> {
        let document = self
            .document(record.id())
            .filter(|doc| doc.record_type == record.type_name())
            .ok_or_else(|| not_found(record.type_name(), record.id()))?;
        record.reload_from(document)
    }

    pub fn stats(&self) -> StoreStats {
        self.stats.get()
    }

    pub fn reset_stats(&self) {
        self.stats.set(StoreStats::default());
    }

    fn bump(&self, update: impl FnOnce(&mut StoreStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }

    fn require_stored(&self, record: &Record) -> Result<()> {
        match self.documents.borrow().get(record.id()) {
            Some(doc) if doc.record_type == record.type_name() => Ok(()),
            _ => Err(not_found(record.type_name(), record.id())),
        }
    }

    fn remove_document(&self, record: &Record, action: RemovalAction) -> Result<()> {
        let removed = {
            let mut documents = self.documents.borrow_mut();
            match documents.get(record.id()) {
                Some(doc) if doc.record_type == record.type_name() => {
                    documents.remove(record.id())
                }
                _ => None,
            }
        };
        if removed.is_none() {
            return Err(not_found(record.type_name(), record.id()));
        }

        self.bump(|stats| match action {
            RemovalAction::Destroy => stats.destroys += 1,
            RemovalAction::Delete => stats.deletes += 1,
        });
        tracing::debug!(
            record_type = record.type_name(),
            record_id = record.id(),
            action = action.as_str(),
            "removed document"
        );
        Ok(())
    }

    fn hydrate(&self, record_type: &Arc<RecordType>, document: Document) -> Result<Record> {
        Record::from_document(record_type, document)
    }
}

impl DocumentStore for MemoryStore {
    fn find_by_id(
        &self,
        record_type: &Arc<RecordType>,
        id: Option<&str>,
        quiet: bool,
    ) -> Result<Option<Record>> {
        self.bump(|stats| stats.finds += 1);

        let document = id
            .and_then(|id| self.document(id))
            .filter(|doc| doc.record_type == record_type.name());

        match document {
            Some(document) => self.hydrate(record_type, document).map(Some),
            None if quiet => Ok(None),
            None => Err(not_found(record_type.name(), id.unwrap_or_default())),
        }
    }

    fn load_polymorphic(&self, id: Option<&str>) -> Result<Option<Record>> {
        self.bump(|stats| stats.polymorphic_loads += 1);

        let Some(document) = id.and_then(|id| self.document(id)) else {
            return Ok(None);
        };
        let Some(record_type) = self.catalog.get(&document.record_type) else {
            tracing::debug!(
                record_id = %document.id,
                record_type = %document.record_type,
                "polymorphic load hit unregistered type"
            );
            return Ok(None);
        };
        self.hydrate(record_type, document).map(Some)
    }

    fn remove(&self, target: &Record, action: RemovalAction) -> Result<()> {
        match action {
            RemovalAction::Destroy => {
                let mut target = target.clone();
                self.destroy(&mut target)
            }
            RemovalAction::Delete => self.delete(target),
        }
    }

    fn try_stream_remove(&self, target: &Record, action: RemovalAction) -> Option<Result<()>> {
        if !self.streamed_removal {
            return None;
        }

        self.bump(|stats| stats.streamed_removals += 1);
        let snapshot = self.documents.borrow().clone();
        let result = self.remove(target, action);
        if result.is_err() {
            *self.documents.borrow_mut() = snapshot;
            tracing::debug!(
                record_id = target.id(),
                action = action.as_str(),
                "streamed removal failed, store restored"
            );
        }
        Some(result)
    }
}

fn not_found(type_name: &str, id: &str) -> AssocError {
    AssocError::RecordNotFound {
        type_name: type_name.to_string(),
        id: id.to_string(),
    }
}
