//! Declared record fields and their write observers
//!
//! Every write through `Record::write_attribute` notifies the observers
//! attached to that field. Association declarations attach an
//! `InvalidateAssociation` observer to each foreign-key field so cached
//! targets never outlive the key they were resolved from.

use std::fmt;
use std::sync::Arc;

use super::cache::AssociationCache;

/// Callback fired after a declared field is written
pub trait FieldObserver: fmt::Debug + Send + Sync {
    fn field_written(&self, field: &str, cache: &mut AssociationCache);
}

/// Drops one association's cache entry whenever its foreign key is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidateAssociation {
    association: String,
}

impl InvalidateAssociation {
    pub fn new(association: impl Into<String>) -> Self {
        Self {
            association: association.into(),
        }
    }

    pub fn association(&self) -> &str {
        &self.association
    }
}

impl FieldObserver for InvalidateAssociation {
    fn field_written(&self, field: &str, cache: &mut AssociationCache) {
        if cache.invalidate(&self.association) {
            tracing::debug!(
                foreign_key = field,
                association = %self.association,
                "invalidated cached association"
            );
        }
    }
}

/// One declared field
#[derive(Debug, Clone)]
pub struct AttributeDef {
    name: String,
    observers: Vec<Arc<dyn FieldObserver>>,
}

impl AttributeDef {
    fn new(name: String) -> Self {
        Self {
            name,
            observers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach an observer; observers fire in attachment order
    pub fn observe(&mut self, observer: Arc<dyn FieldObserver>) -> &mut Self {
        self.observers.push(observer);
        self
    }

    pub fn observers(&self) -> &[Arc<dyn FieldObserver>] {
        &self.observers
    }

    pub(crate) fn notify(&self, cache: &mut AssociationCache) {
        for observer in &self.observers {
            observer.field_written(&self.name, cache);
        }
    }
}

/// Ordered set of declared fields for a record type
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    attributes: Vec<AttributeDef>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self {
            attributes: Vec::new(),
        }
    }

    /// Declare `name`, or return the existing declaration
    pub fn define(&mut self, name: impl Into<String>) -> &mut AttributeDef {
        let name = name.into();
        let index = match self.attributes.iter().position(|a| a.name == name) {
            Some(index) => index,
            None => {
                self.attributes.push(AttributeDef::new(name));
                self.attributes.len() - 1
            }
        };
        &mut self.attributes[index]
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
