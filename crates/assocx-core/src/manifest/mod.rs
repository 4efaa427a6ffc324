//! Declaration manifests
//!
//! Provides:
//! - Manifest format v0 schema
//! - YAML parser with validation
//! - Catalog loading (`Catalog::from_manifest`)

pub mod format_v0;
pub mod loader;
pub mod parser;

pub use format_v0::{ManifestBelongsTo, ManifestType, ManifestV0};
pub use loader::{load_catalog_file, load_catalog_str};
pub use parser::{parse_manifest_file, parse_manifest_str};
