use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::cache::AssociationCache;
use super::record_type::{RecordType, SchemaTag};
use crate::errors::{AssocError, Result};

/// Stored form of a record
///
/// `record_type` carries the type name, which is what polymorphic loading
/// reads to pick the concrete type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

/// One record instance
///
/// Field values are JSON values; `Value::Null` is the empty value. The
/// association cache is owned by the instance and dies with it.
#[derive(Debug, Clone)]
pub struct Record {
    record_type: Arc<RecordType>,
    id: String,
    fields: BTreeMap<String, Value>,
    associations: AssociationCache,
}

impl Record {
    /// Create a new record with a fresh UUID v7 id and all fields empty
    pub fn new(record_type: &Arc<RecordType>) -> Self {
        Self::with_id(record_type, Uuid::now_v7().to_string())
    }

    pub fn with_id(record_type: &Arc<RecordType>, id: impl Into<String>) -> Self {
        let fields = record_type
            .attributes()
            .names()
            .map(|name| (name.to_string(), Value::Null))
            .collect();
        Self {
            record_type: Arc::clone(record_type),
            id: id.into(),
            fields,
            associations: AssociationCache::new(),
        }
    }

    /// Hydrate a record from its stored document
    ///
    /// Values are written through `write_attribute`, so field observers fire
    /// exactly as they do for any other write.
    ///
    /// # Errors
    /// * `Serialization` - the document belongs to another record type
    /// * `UnknownAttribute` - the document carries an undeclared field
    pub fn from_document(record_type: &Arc<RecordType>, document: Document) -> Result<Self> {
        if document.record_type != record_type.name() {
            return Err(AssocError::Serialization {
                message: format!(
                    "document {} has type {}, expected {}",
                    document.id,
                    document.record_type,
                    record_type.name()
                ),
            });
        }

        let mut record = Self::with_id(record_type, document.id);
        record.assign_attributes(document.fields)?;
        Ok(record)
    }

    pub fn to_document(&self) -> Document {
        Document {
            id: self.id.clone(),
            record_type: self.record_type.name().to_string(),
            fields: self.fields.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    pub fn type_name(&self) -> &str {
        self.record_type.name()
    }

    pub fn schema_tag(&self) -> &SchemaTag {
        self.record_type.schema_tag()
    }

    /// Generic field accessor
    ///
    /// # Errors
    /// * `UnknownAttribute` - `field` is not declared on the record type
    pub fn read_attribute(&self, field: &str) -> Result<&Value> {
        if !self.record_type.attributes().contains(field) {
            return Err(self.unknown_attribute(field));
        }
        Ok(self.fields.get(field).unwrap_or(&Value::Null))
    }

    /// Generic field setter
    ///
    /// Stores the value, then fires the field's observers. Observers fire on
    /// every write, including one that stores the current value again.
    ///
    /// # Errors
    /// * `UnknownAttribute` - `field` is not declared on the record type
    pub fn write_attribute(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let record_type = Arc::clone(&self.record_type);
        let def = record_type
            .attributes()
            .get(field)
            .ok_or_else(|| self.unknown_attribute(field))?;

        self.fields.insert(field.to_string(), value.into());
        def.notify(&mut self.associations);
        Ok(())
    }

    /// Write several fields, stopping at the first undeclared one
    pub fn assign_attributes<I, K>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        for (field, value) in values {
            self.write_attribute(field.as_ref(), value)?;
        }
        Ok(())
    }

    /// Read-only view of the association cache
    pub fn associations(&self) -> &AssociationCache {
        &self.associations
    }

    pub(crate) fn associations_mut(&mut self) -> &mut AssociationCache {
        &mut self.associations
    }

    /// Drop every cached association target
    ///
    /// Used after the record's data has been reloaded from the store.
    pub fn reset_associations(&mut self) {
        self.associations.clear();
    }

    /// Replace field values with a freshly loaded document, then reset the
    /// association cache
    pub(crate) fn reload_from(&mut self, document: Document) -> Result<()> {
        self.reset_associations();
        for value in self.fields.values_mut() {
            *value = Value::Null;
        }
        self.assign_attributes(document.fields)
    }

    fn unknown_attribute(&self, field: &str) -> AssocError {
        AssocError::UnknownAttribute {
            type_name: self.record_type.name().to_string(),
            field: field.to_string(),
        }
    }
}

/// Interpret a stored foreign-key value as a record id
///
/// Strings are taken as-is and numbers are rendered in decimal; `Null` and
/// every other shape mean "no reference".
pub(crate) fn reference_key(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
