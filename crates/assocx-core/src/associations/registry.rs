//! Class-level association declarations
//!
//! A record type's `AssociationRegistry` is append-only while the type is
//! being built and frozen once `RecordTypeBuilder::build` wraps it in an
//! `Arc`. Declaration order is kept because cascades run in that order.

use std::fmt;
use std::sync::Arc;

use heck::ToUpperCamelCase;
use serde::{Deserialize, Serialize};

use crate::errors::{AssocError, Result};
use crate::model::{AttributeSet, InvalidateAssociation};
use crate::store::RemovalAction;

/// What happens to a referenced record when the owning record is destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePolicy {
    /// Leave the target alone
    #[default]
    None,
    /// Destroy the target, running its own cascades
    Destroy,
    /// Delete the target's document without running its cascades
    Delete,
    /// Refuse to destroy the owner while the target exists
    RestrictWithException,
    /// Declared but not acted on during cascade execution
    RestrictWithError,
}

impl CascadePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CascadePolicy::None => "none",
            CascadePolicy::Destroy => "destroy",
            CascadePolicy::Delete => "delete",
            CascadePolicy::RestrictWithException => "restrict_with_exception",
            CascadePolicy::RestrictWithError => "restrict_with_error",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, CascadePolicy::None)
    }

    /// Removal to apply to the target, for the destructive policies
    pub fn removal_action(&self) -> Option<RemovalAction> {
        match self {
            CascadePolicy::Destroy => Some(RemovalAction::Destroy),
            CascadePolicy::Delete => Some(RemovalAction::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for CascadePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared target of a reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociationTarget {
    /// Fixed target type, looked up by name in the catalog
    Type(String),
    /// Target type read from the stored document at resolution time
    Polymorphic,
}

/// One declared reference, immutable once registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationDescriptor {
    name: String,
    foreign_key: String,
    target: AssociationTarget,
    cascade: CascadePolicy,
}

impl AssociationDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    pub fn target(&self) -> &AssociationTarget {
        &self.target
    }

    /// Declared target type name; `None` for polymorphic references
    pub fn target_type(&self) -> Option<&str> {
        match &self.target {
            AssociationTarget::Type(name) => Some(name),
            AssociationTarget::Polymorphic => None,
        }
    }

    pub fn is_polymorphic(&self) -> bool {
        matches!(self.target, AssociationTarget::Polymorphic)
    }

    pub fn cascade(&self) -> CascadePolicy {
        self.cascade
    }
}

/// Declaration input for `AssociationRegistry::declare`
///
/// # Example
/// ```
/// use assocx_core::{BelongsTo, CascadePolicy};
///
/// let decl = BelongsTo::new("author")
///     .class_name("User")
///     .dependent(CascadePolicy::RestrictWithException);
/// assert_eq!(decl.name(), "author");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BelongsTo {
    name: String,
    foreign_key: Option<String>,
    class_name: Option<String>,
    polymorphic: bool,
    dependent: CascadePolicy,
}

impl BelongsTo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            foreign_key: None,
            class_name: None,
            polymorphic: false,
            dependent: CascadePolicy::None,
        }
    }

    /// Foreign-key field; defaults to `<name>_id`
    pub fn foreign_key(mut self, field: impl Into<String>) -> Self {
        self.foreign_key = Some(field.into());
        self
    }

    /// Target type name; defaults to the UpperCamelCase form of the name
    pub fn class_name(mut self, type_name: impl Into<String>) -> Self {
        self.class_name = Some(type_name.into());
        self
    }

    /// Resolve the target type from stored metadata; overrides `class_name`
    pub fn polymorphic(mut self) -> Self {
        self.polymorphic = true;
        self
    }

    pub fn dependent(mut self, policy: CascadePolicy) -> Self {
        self.dependent = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered, append-only set of association descriptors for one record type
#[derive(Debug, Clone, Default)]
pub struct AssociationRegistry {
    descriptors: Vec<AssociationDescriptor>,
}

impl AssociationRegistry {
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    /// Register a reference declared on `type_name`
    ///
    /// Also declares the foreign-key field in `attributes` and attaches the
    /// observer that drops this reference's cache entry whenever that field
    /// is written.
    ///
    /// # Errors
    /// * `DuplicateAssociation` - the name is already registered
    /// * `InvalidDeclaration` - the name, foreign key or class name is empty
    pub fn declare(
        &mut self,
        type_name: &str,
        attributes: &mut AttributeSet,
        declaration: BelongsTo,
    ) -> Result<&AssociationDescriptor> {
        let BelongsTo {
            name,
            foreign_key,
            class_name,
            polymorphic,
            dependent,
        } = declaration;

        if name.trim().is_empty() {
            return Err(invalid(type_name, "Association name cannot be empty"));
        }
        if self.get(&name).is_some() {
            return Err(AssocError::DuplicateAssociation {
                type_name: type_name.to_string(),
                association: name,
            });
        }

        let foreign_key = foreign_key.unwrap_or_else(|| format!("{}_id", name));
        if foreign_key.trim().is_empty() {
            return Err(invalid(type_name, "Foreign key cannot be empty"));
        }

        let target = if polymorphic {
            AssociationTarget::Polymorphic
        } else {
            let class_name = class_name.unwrap_or_else(|| name.to_upper_camel_case());
            if class_name.trim().is_empty() {
                return Err(invalid(type_name, "Class name cannot be empty"));
            }
            AssociationTarget::Type(class_name)
        };

        attributes
            .define(foreign_key.clone())
            .observe(Arc::new(InvalidateAssociation::new(name.clone())));

        tracing::debug!(
            record_type = type_name,
            association = %name,
            foreign_key = %foreign_key,
            cascade = dependent.as_str(),
            "declared association"
        );

        self.descriptors.push(AssociationDescriptor {
            name,
            foreign_key,
            target,
            cascade: dependent,
        });
        Ok(&self.descriptors[self.descriptors.len() - 1])
    }

    pub fn get(&self, name: &str) -> Option<&AssociationDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Descriptors whose foreign key is `field`
    pub fn by_foreign_key<'a>(
        &'a self,
        field: &'a str,
    ) -> impl Iterator<Item = &'a AssociationDescriptor> + 'a {
        self.descriptors
            .iter()
            .filter(move |d| d.foreign_key == field)
    }

    /// Descriptors in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, AssociationDescriptor> {
        self.descriptors.iter()
    }

    pub fn as_slice(&self) -> &[AssociationDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl<'a> IntoIterator for &'a AssociationRegistry {
    type Item = &'a AssociationDescriptor;
    type IntoIter = std::slice::Iter<'a, AssociationDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn invalid(type_name: &str, reason: &str) -> AssocError {
    AssocError::InvalidDeclaration {
        type_name: type_name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declare(
        registry: &mut AssociationRegistry,
        attributes: &mut AttributeSet,
        decl: BelongsTo,
    ) -> Result<AssociationDescriptor> {
        registry.declare("Post", attributes, decl).cloned()
    }

    #[test]
    fn test_defaults_derived_from_name() {
        let mut registry = AssociationRegistry::new();
        let mut attributes = AttributeSet::new();

        let d = declare(&mut registry, &mut attributes, BelongsTo::new("blog_author")).unwrap();

        assert_eq!(d.foreign_key(), "blog_author_id");
        assert_eq!(d.target_type(), Some("BlogAuthor"));
        assert_eq!(d.cascade(), CascadePolicy::None);
        assert!(attributes.contains("blog_author_id"));
    }

    #[test]
    fn test_explicit_options() {
        let mut registry = AssociationRegistry::new();
        let mut attributes = AttributeSet::new();

        let d = declare(
            &mut registry,
            &mut attributes,
            BelongsTo::new("writer")
                .class_name("User")
                .foreign_key("user_ref")
                .dependent(CascadePolicy::Delete),
        )
        .unwrap();

        assert_eq!(d.foreign_key(), "user_ref");
        assert_eq!(d.target(), &AssociationTarget::Type("User".to_string()));
        assert_eq!(d.cascade().removal_action(), Some(RemovalAction::Delete));
    }

    #[test]
    fn test_polymorphic_ignores_class_name() {
        let mut registry = AssociationRegistry::new();
        let mut attributes = AttributeSet::new();

        let d = declare(
            &mut registry,
            &mut attributes,
            BelongsTo::new("subject").class_name("User").polymorphic(),
        )
        .unwrap();

        assert!(d.is_polymorphic());
        assert_eq!(d.target_type(), None);
    }

    #[test]
    fn test_duplicate_name_rejected_and_registry_unchanged() {
        let mut registry = AssociationRegistry::new();
        let mut attributes = AttributeSet::new();
        declare(&mut registry, &mut attributes, BelongsTo::new("author")).unwrap();

        let result = declare(
            &mut registry,
            &mut attributes,
            BelongsTo::new("author").dependent(CascadePolicy::Destroy),
        );

        assert!(matches!(
            result,
            Err(AssocError::DuplicateAssociation { .. })
        ));
        assert_eq!(registry.len(), 1);
        assert_eq!(attributes.get("author_id").unwrap().observers().len(), 1);
    }

    #[test]
    fn test_empty_names_rejected() {
        let mut registry = AssociationRegistry::new();
        let mut attributes = AttributeSet::new();

        assert!(matches!(
            declare(&mut registry, &mut attributes, BelongsTo::new("")),
            Err(AssocError::InvalidDeclaration { .. })
        ));
        assert!(matches!(
            declare(
                &mut registry,
                &mut attributes,
                BelongsTo::new("author").foreign_key(" ")
            ),
            Err(AssocError::InvalidDeclaration { .. })
        ));
        assert!(registry.is_empty());
        assert!(attributes.is_empty());
    }

    #[test]
    fn test_shared_foreign_key_gets_two_observers() {
        let mut registry = AssociationRegistry::new();
        let mut attributes = AttributeSet::new();
        declare(
            &mut registry,
            &mut attributes,
            BelongsTo::new("author").class_name("User").foreign_key("user_id"),
        )
        .unwrap();
        declare(
            &mut registry,
            &mut attributes,
            BelongsTo::new("owner").class_name("User").foreign_key("user_id"),
        )
        .unwrap();

        assert_eq!(registry.by_foreign_key("user_id").count(), 2);
        assert_eq!(attributes.get("user_id").unwrap().observers().len(), 2);
    }

    #[test]
    fn test_iteration_preserves_declaration_order() {
        let mut registry = AssociationRegistry::new();
        let mut attributes = AttributeSet::new();
        for name in ["c", "a", "b"] {
            declare(&mut registry, &mut attributes, BelongsTo::new(name)).unwrap();
        }

        let names: Vec<_> = registry.iter().map(|d| d.name()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn test_policy_serde_names() {
        let policy: CascadePolicy = serde_json::from_str("\"restrict_with_exception\"").unwrap();
        assert_eq!(policy, CascadePolicy::RestrictWithException);
        assert_eq!(policy.to_string(), "restrict_with_exception");
    }
}
