//! Collaborator store interface
//!
//! The association layer never talks to storage directly. Lookups and
//! removals go through `DocumentStore`; `MemoryStore` is the in-process
//! implementation used by tests and examples.

use std::sync::Arc;

use crate::errors::Result;
use crate::model::{Record, RecordType};

pub mod memory;

pub use memory::{MemoryStore, StoreStats};

/// Destructive operation applied to a cascade target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalAction {
    /// Remove the target after running its own cascades
    Destroy,
    /// Remove the target's document only
    Delete,
}

impl RemovalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalAction::Destroy => "destroy",
            RemovalAction::Delete => "delete",
        }
    }
}

/// Storage capabilities the association layer consumes
///
/// Every call is a single attempt; timeouts and retries, if any, belong to
/// the implementation.
pub trait DocumentStore {
    /// Load a record of `record_type` by id
    ///
    /// With `quiet` set, a `None` id or an id that does not resolve to a
    /// record of that type yields `Ok(None)`. Without it, the same cases fail
    /// with `RecordNotFound`.
    fn find_by_id(
        &self,
        record_type: &Arc<RecordType>,
        id: Option<&str>,
        quiet: bool,
    ) -> Result<Option<Record>>;

    /// Load a record whose type is read from the stored document
    ///
    /// `Ok(None)` when `id` is `None`, missing, or names an unknown type.
    fn load_polymorphic(&self, id: Option<&str>) -> Result<Option<Record>>;

    /// Remove `target` with a plain, single-step call
    fn remove(&self, target: &Record, action: RemovalAction) -> Result<()>;

    /// Remove `target` as one streamed, all-or-nothing unit
    ///
    /// `None` means the store has no streamed form for this target and the
    /// caller should fall back to `remove`.
    fn try_stream_remove(&self, _target: &Record, _action: RemovalAction) -> Option<Result<()>> {
        None
    }
}
