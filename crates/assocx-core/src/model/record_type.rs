use std::fmt;
use std::sync::Arc;

use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};

use super::attribute::AttributeSet;
use crate::associations::{AssociationRegistry, BelongsTo};
use crate::errors::{AssocError, Result};

/// Identity of a record type's persisted layout
///
/// Two record types are assignment-compatible when their tags are equal,
/// even if their names differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaTag(String);

impl SchemaTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Default tag for a type name: its snake_case form
    pub fn derive_from(type_name: &str) -> Self {
        Self(type_name.to_snake_case())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SchemaTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// A record type: its declared fields and its associations
///
/// Immutable once built; shared between records and the catalog via `Arc`.
#[derive(Debug)]
pub struct RecordType {
    name: String,
    schema_tag: SchemaTag,
    attributes: AttributeSet,
    associations: AssociationRegistry,
}

impl RecordType {
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema_tag(&self) -> &SchemaTag {
        &self.schema_tag
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn associations(&self) -> &AssociationRegistry {
        &self.associations
    }
}

/// Builder for `RecordType`
///
/// Association declarations go through `belongs_to`, which also declares the
/// foreign-key attribute.
///
/// # Example
/// ```
/// use assocx_core::{BelongsTo, CascadePolicy, RecordType};
///
/// let post = RecordType::builder("Post")
///     .attribute("title")
///     .belongs_to(BelongsTo::new("author").class_name("User"))
///     .unwrap()
///     .build();
///
/// assert_eq!(post.schema_tag().as_str(), "post");
/// assert!(post.attributes().contains("author_id"));
/// ```
#[derive(Debug)]
pub struct RecordTypeBuilder {
    name: String,
    schema_tag: Option<SchemaTag>,
    attributes: AttributeSet,
    associations: AssociationRegistry,
}

impl RecordTypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_tag: None,
            attributes: AttributeSet::new(),
            associations: AssociationRegistry::new(),
        }
    }

    /// Override the default snake_case schema tag
    pub fn schema_tag(mut self, tag: impl Into<SchemaTag>) -> Self {
        self.schema_tag = Some(tag.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.define(name);
        self
    }

    /// Declare a reference to another record
    ///
    /// # Errors
    /// * `DuplicateAssociation` - the name is already declared on this type
    /// * `InvalidDeclaration` - the name or foreign key is empty
    pub fn belongs_to(mut self, declaration: BelongsTo) -> Result<Self> {
        self.associations
            .declare(&self.name, &mut self.attributes, declaration)?;
        Ok(self)
    }

    /// Finish the type
    pub fn build(self) -> Arc<RecordType> {
        let schema_tag = self
            .schema_tag
            .unwrap_or_else(|| SchemaTag::derive_from(&self.name));
        Arc::new(RecordType {
            name: self.name,
            schema_tag,
            attributes: self.attributes,
            associations: self.associations,
        })
    }

    /// Like `build`, rejecting an empty type name
    pub fn try_build(self) -> Result<Arc<RecordType>> {
        if self.name.trim().is_empty() {
            return Err(AssocError::InvalidDeclaration {
                type_name: self.name,
                reason: "Record type name cannot be empty".to_string(),
            });
        }
        Ok(self.build())
    }
}
