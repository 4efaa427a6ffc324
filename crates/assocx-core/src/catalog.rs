use std::collections::BTreeMap;
use std::sync::Arc;

use crate::associations::{AssociationDescriptor, AssociationTarget};
use crate::errors::{AssocError, Result};
use crate::model::RecordType;

/// Registry of record types by name
///
/// Resolves declared target type names to their `RecordType` at runtime.
/// Types are added once and never replaced.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    types: BTreeMap<String, Arc<RecordType>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            types: BTreeMap::new(),
        }
    }

    /// Add a record type
    ///
    /// # Errors
    /// * `DuplicateType` - a type with the same name is already registered
    pub fn register(&mut self, record_type: Arc<RecordType>) -> Result<()> {
        let name = record_type.name().to_string();
        if self.types.contains_key(&name) {
            return Err(AssocError::DuplicateType { type_name: name });
        }
        self.types.insert(name, record_type);
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<RecordType>> {
        self.types.get(type_name)
    }

    /// Like `get`, failing with `UnknownType`
    pub fn require(&self, type_name: &str) -> Result<&Arc<RecordType>> {
        self.get(type_name).ok_or_else(|| AssocError::UnknownType {
            type_name: type_name.to_string(),
        })
    }

    /// Association descriptors of `type_name`, in declaration order
    ///
    /// Empty for a type with no associations and for an unknown type.
    pub fn descriptors_of(&self, type_name: &str) -> &[AssociationDescriptor] {
        self.get(type_name)
            .map(|ty| ty.associations().as_slice())
            .unwrap_or(&[])
    }

    /// Check that every direct association targets a registered type
    ///
    /// # Errors
    /// * `UnknownType` - first unregistered target, in name order
    pub fn validate(&self) -> Result<()> {
        for record_type in self.types.values() {
            for descriptor in record_type.associations() {
                if let AssociationTarget::Type(target) = descriptor.target() {
                    if !self.types.contains_key(target) {
                        tracing::debug!(
                            record_type = record_type.name(),
                            association = descriptor.name(),
                            target = %target,
                            "association targets unregistered type"
                        );
                        return Err(AssocError::UnknownType {
                            type_name: target.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Registered types in name order
    pub fn types(&self) -> impl Iterator<Item = &Arc<RecordType>> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
