//! assocx Core - lazy, type-checked references between stored documents
//!
//! This crate provides the association layer for document-oriented records,
//! including:
//! - Record types with declared attributes and `belongs_to` references
//! - Lazy resolution with a per-record cache, invalidated on foreign-key writes
//! - Type-checked assignment with polymorphic references
//! - Cascading destroy/delete/restrict when the owning record is destroyed
//! - YAML declaration manifests
//! - An in-memory reference store
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use assocx_core::{BelongsTo, Catalog, MemoryStore, Record, RecordType};
//!
//! let user = RecordType::builder("User").attribute("name").build();
//! let post = RecordType::builder("Post")
//!     .belongs_to(BelongsTo::new("author").class_name("User"))?
//!     .build();
//!
//! let mut catalog = Catalog::new();
//! catalog.register(Arc::clone(&user))?;
//! catalog.register(Arc::clone(&post))?;
//! let store = MemoryStore::new(Arc::new(catalog));
//!
//! let ada = Record::with_id(&user, "u1");
//! store.save(&ada);
//!
//! let mut draft = Record::new(&post);
//! draft.write_attribute("author_id", "u1")?;
//! let author = store.resolver().get(&mut draft, "author")?;
//! assert_eq!(author.map(|a| a.id().to_string()), Some("u1".to_string()));
//! # Ok::<(), assocx_core::AssocError>(())
//! ```

pub mod associations;
pub mod catalog;
pub mod errors;
pub mod logging_facility;
pub mod manifest;
pub mod model;
pub mod store;

pub use assocx_core_types::schema;

// Re-export commonly used types
pub use associations::{
    AssociationDescriptor, AssociationRegistry, AssociationResolver, AssociationTarget, BelongsTo,
    CascadePolicy,
};
pub use catalog::Catalog;
pub use errors::{AssocError, ExError, ExErrorKind, Result};
pub use manifest::{load_catalog_file, load_catalog_str, ManifestV0};
pub use model::{AssociationCache, Document, Record, RecordType, RecordTypeBuilder, SchemaTag};
pub use store::{DocumentStore, MemoryStore, RemovalAction, StoreStats};
