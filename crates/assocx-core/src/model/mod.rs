pub mod attribute;
pub mod cache;
pub mod record;
pub mod record_type;

pub use attribute::{AttributeDef, AttributeSet, FieldObserver, InvalidateAssociation};
pub use cache::{AssociationCache, Resolved};
pub use record::{Document, Record};
pub use record_type::{RecordType, RecordTypeBuilder, SchemaTag};
