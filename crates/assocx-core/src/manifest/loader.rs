//! Catalog construction from a parsed manifest

use std::path::Path;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::errors::{AssocError, Result};
use crate::manifest::format_v0::{ManifestType, ManifestV0};
use crate::manifest::parser::{parse_manifest_file, parse_manifest_str};
use crate::model::RecordType;

impl Catalog {
    /// Build and validate a catalog from a parsed manifest
    ///
    /// Types are registered in manifest order. Every failure, including a
    /// `belongs_to` that targets a type the manifest does not define, is
    /// reported as `InvalidManifest`.
    ///
    /// # Errors
    /// * `InvalidManifest` - a declaration was rejected or a target type is
    ///   missing
    pub fn from_manifest(manifest: &ManifestV0) -> Result<Self> {
        let mut catalog = Catalog::new();
        for entry in &manifest.types {
            let record_type = build_type(entry).map_err(into_manifest_error)?;
            catalog.register(record_type).map_err(into_manifest_error)?;
        }
        catalog.validate().map_err(into_manifest_error)?;

        tracing::debug!(types = catalog.len(), "catalog loaded from manifest");
        Ok(catalog)
    }
}

/// Parse a manifest string and build its catalog
///
/// # Errors
/// * `InvalidManifest` - see `parse_manifest_str` and `Catalog::from_manifest`
pub fn load_catalog_str(content: &str) -> Result<Catalog> {
    Catalog::from_manifest(&parse_manifest_str(content)?)
}

/// Parse a manifest file and build its catalog
///
/// # Errors
/// * `InvalidManifest` - see `parse_manifest_file` and `Catalog::from_manifest`
pub fn load_catalog_file(path: &Path) -> Result<Catalog> {
    Catalog::from_manifest(&parse_manifest_file(path)?)
}

fn build_type(entry: &ManifestType) -> Result<Arc<RecordType>> {
    let mut builder = RecordType::builder(entry.name.clone());
    if let Some(tag) = &entry.schema_tag {
        builder = builder.schema_tag(tag.as_str());
    }
    for attribute in &entry.attributes {
        builder = builder.attribute(attribute.clone());
    }
    for association in &entry.belongs_to {
        builder = builder.belongs_to(association.to_declaration())?;
    }
    builder.try_build()
}

fn into_manifest_error(err: AssocError) -> AssocError {
    match err {
        AssocError::InvalidManifest { .. } => err,
        other => AssocError::InvalidManifest {
            reason: other.to_string(),
        },
    }
}
