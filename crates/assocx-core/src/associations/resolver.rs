//! Instance-level reference resolution
//!
//! `get` and `set` are the only two entry points; both are parameterized by
//! association name and driven by the owning type's descriptors.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use super::registry::{AssociationDescriptor, AssociationTarget};
use crate::catalog::Catalog;
use crate::errors::{AssocError, Result};
use crate::model::record::reference_key;
use crate::model::{Record, RecordType, Resolved};
use crate::store::DocumentStore;
use crate::{log_op_end, log_op_error, log_op_start};

/// Resolves, assigns and cascades the associations of individual records
///
/// Borrows the catalog (to map declared type names to record types) and the
/// collaborator store (for lookups and removals). Holds no state of its own;
/// all caching lives on the record.
pub struct AssociationResolver<'a, S: DocumentStore + ?Sized> {
    pub(crate) catalog: &'a Catalog,
    pub(crate) store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> AssociationResolver<'a, S> {
    pub fn new(catalog: &'a Catalog, store: &'a S) -> Self {
        Self { catalog, store }
    }

    /// Resolve the reference `name` on `record`
    ///
    /// A cached outcome, including a cached `None`, is returned without
    /// touching the store. Otherwise the foreign key is read and the target
    /// looked up: polymorphic references through `load_polymorphic`, direct
    /// ones through a quiet `find_by_id` on the declared type. The outcome is
    /// cached either way.
    ///
    /// # Errors
    /// * `UnknownAssociation` - `name` is not declared on the record's type
    /// * `UnknownType` - the declared target type is not in the catalog
    /// * any error the store returns
    pub fn get(&self, record: &mut Record, name: &str) -> Result<Resolved> {
        let record_type = Arc::clone(record.record_type());
        let descriptor = descriptor_for(&record_type, name)?;

        if let Some(cached) = record.associations().lookup(name) {
            tracing::debug!(
                record_id = record.id(),
                association = name,
                cache_hit = true,
                "resolved association"
            );
            return Ok(cached.clone());
        }

        let key = reference_key(record.read_attribute(descriptor.foreign_key())?);
        let resolved = match descriptor.target() {
            AssociationTarget::Polymorphic => self.store.load_polymorphic(key.as_deref())?,
            AssociationTarget::Type(type_name) => {
                let target_type = self.catalog.require(type_name)?;
                self.store.find_by_id(target_type, key.as_deref(), true)?
            }
        }
        .map(Arc::new);

        tracing::debug!(
            record_id = record.id(),
            association = name,
            cache_hit = false,
            resolved = resolved.is_some(),
            "resolved association"
        );

        record.associations_mut().store(name, resolved.clone());
        Ok(resolved)
    }

    /// Assign `value` to the reference `name` on `record`
    ///
    /// Direct references only accept records whose schema tag equals the
    /// declared target type's tag; polymorphic references accept any record.
    /// On success the foreign key holds the target's id (or `Null`) and the
    /// cache holds `value`. On failure neither is touched.
    ///
    /// # Errors
    /// * `TypeMismatch` - schema tags differ on a direct reference
    /// * `UnknownAssociation` - `name` is not declared on the record's type
    /// * `UnknownType` - the declared target type is not in the catalog
    pub fn set(&self, record: &mut Record, name: &str, value: Option<Arc<Record>>) -> Result<()> {
        let start = Instant::now();
        log_op_start!("set", record_id = record.id(), association = name);

        let result = self.try_set(record, name, value);
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => {
                log_op_end!("set", duration_ms = duration_ms, association = name);
            }
            Err(err) => {
                log_op_error!("set", err.clone(), duration_ms = duration_ms, association = name);
            }
        }
        result
    }

    fn try_set(&self, record: &mut Record, name: &str, value: Option<Arc<Record>>) -> Result<()> {
        let record_type = Arc::clone(record.record_type());
        let descriptor = descriptor_for(&record_type, name)?;

        let key = match &value {
            None => Value::Null,
            Some(target) => {
                if let AssociationTarget::Type(type_name) = descriptor.target() {
                    let expected = self.catalog.require(type_name)?.schema_tag();
                    if expected != target.schema_tag() {
                        return Err(AssocError::TypeMismatch {
                            association: name.to_string(),
                            expected: expected.to_string(),
                            actual: target.schema_tag().to_string(),
                        });
                    }
                }
                Value::String(target.id().to_string())
            }
        };

        // The foreign-key observer drops the old entry before we re-populate.
        record.write_attribute(descriptor.foreign_key(), key)?;
        record.associations_mut().store(name, value);
        Ok(())
    }

    /// Clear every cached target on `record`
    pub fn reset_associations(&self, record: &mut Record) {
        record.reset_associations();
    }
}

pub(crate) fn descriptor_for<'t>(
    record_type: &'t RecordType,
    name: &str,
) -> Result<&'t AssociationDescriptor> {
    record_type
        .associations()
        .get(name)
        .ok_or_else(|| AssocError::UnknownAssociation {
            type_name: record_type.name().to_string(),
            association: name.to_string(),
        })
}
