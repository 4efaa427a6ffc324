//! Manifest parser with validation
//!
//! Parses YAML and validates schema version and name uniqueness

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::errors::{AssocError, Result};
use crate::manifest::format_v0::ManifestV0;

/// Parse a manifest file from a path
///
/// # Errors
/// * `InvalidManifest` - unreadable file, malformed YAML or failed validation
pub fn parse_manifest_file(path: &Path) -> Result<ManifestV0> {
    let content = fs::read_to_string(path).map_err(|e| {
        invalid_manifest(format!(
            "Failed to read manifest {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_manifest_str(&content)
}

/// Parse a manifest from a string
///
/// # Errors
/// * `InvalidManifest` - malformed YAML or failed validation
pub fn parse_manifest_str(content: &str) -> Result<ManifestV0> {
    let manifest: ManifestV0 = serde_yaml::from_str(content)
        .map_err(|e| invalid_manifest(format!("YAML parse error: {}", e)))?;

    validate_manifest(&manifest)?;

    Ok(manifest)
}

fn validate_manifest(manifest: &ManifestV0) -> Result<()> {
    if manifest.schema_version != 0 {
        return Err(invalid_manifest(format!(
            "Unsupported schema_version: {}. Expected 0",
            manifest.schema_version
        )));
    }

    let mut type_names = HashSet::new();
    for ty in &manifest.types {
        if ty.name.trim().is_empty() {
            return Err(invalid_manifest("Type name cannot be empty".to_string()));
        }
        if !type_names.insert(ty.name.as_str()) {
            return Err(invalid_manifest(format!("Duplicate type {}", ty.name)));
        }

        let mut associations = HashSet::new();
        for entry in &ty.belongs_to {
            if !associations.insert(entry.name.as_str()) {
                return Err(invalid_manifest(format!(
                    "Duplicate association {} in type {}",
                    entry.name, ty.name
                )));
            }
            if entry.polymorphic && entry.class_name.is_some() {
                tracing::warn!(
                    record_type = %ty.name,
                    association = %entry.name,
                    "class_name is ignored on a polymorphic association"
                );
            }
        }
    }

    Ok(())
}

fn invalid_manifest(reason: String) -> AssocError {
    AssocError::InvalidManifest { reason }
}
