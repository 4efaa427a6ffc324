use std::collections::HashMap;
use std::sync::Arc;

use super::record::Record;

/// Outcome of resolving one reference: the target, or `None` when the
/// foreign key was empty or did not resolve.
pub type Resolved = Option<Arc<Record>>;

/// Per-instance cache of resolved references, keyed by association name
///
/// Each name is in one of three states: absent (never resolved, or
/// invalidated since), resolved to `None`, or resolved to a record. Holds
/// strong references with no eviction; its size is bounded by the number of
/// associations the record type declares.
#[derive(Debug, Clone, Default)]
pub struct AssociationCache {
    entries: HashMap<String, Resolved>,
}

impl AssociationCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Cached outcome for `name`, or `None` when absent
    ///
    /// A cached null comes back as `Some(&None)`.
    pub fn lookup(&self, name: &str) -> Option<&Resolved> {
        self.entries.get(name)
    }

    /// Whether `name` has a cached outcome (including a cached null)
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub(crate) fn store(&mut self, name: &str, value: Resolved) {
        self.entries.insert(name.to_string(), value);
    }

    /// Return `name` to the absent state
    ///
    /// Returns `true` if an entry was removed.
    pub(crate) fn invalidate(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
