//! Reference declarations, resolution and cascades
//!
//! - `registry`: per-type descriptors (`AssociationRegistry`, `BelongsTo`)
//! - `resolver`: per-instance `get` / `set` against the collaborator store
//! - `cascade`: `destroy_associations`, run by destroy orchestration

mod cascade;
pub mod registry;
pub mod resolver;

pub use registry::{
    AssociationDescriptor, AssociationRegistry, AssociationTarget, BelongsTo, CascadePolicy,
};
pub use resolver::AssociationResolver;
