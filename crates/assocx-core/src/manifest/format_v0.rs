//! Declaration manifest format v0
//!
//! Defines the YAML structure for declaring record types and their
//! associations outside of code

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::associations::{BelongsTo, CascadePolicy};

/// Top-level manifest structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestV0 {
    /// Schema version (must be 0 for this format)
    pub schema_version: u32,

    /// Record types to register
    #[serde(default)]
    pub types: Vec<ManifestType>,
}

/// Record type definition in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestType {
    /// Type name, as used in `class_name` and stored documents
    pub name: String,

    /// Tag compared on assignment; derived from the name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_tag: Option<String>,

    /// Plain field names
    #[serde(default)]
    pub attributes: Vec<String>,

    /// Declared references, in cascade order
    #[serde(default)]
    pub belongs_to: Vec<ManifestBelongsTo>,
}

/// Reference declaration in a manifest
///
/// Accepts either a bare association name or a map:
///
/// ```yaml
/// belongs_to:
///   - blog
///   - name: author
///     class_name: User
///     dependent: restrict_with_exception
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestBelongsTo {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,

    pub polymorphic: bool,

    pub dependent: CascadePolicy,
}

impl ManifestBelongsTo {
    /// Builder input equivalent to this entry
    pub fn to_declaration(&self) -> BelongsTo {
        let mut declaration = BelongsTo::new(self.name.clone()).dependent(self.dependent);
        if let Some(foreign_key) = &self.foreign_key {
            declaration = declaration.foreign_key(foreign_key.clone());
        }
        if let Some(class_name) = &self.class_name {
            declaration = declaration.class_name(class_name.clone());
        }
        if self.polymorphic {
            declaration = declaration.polymorphic();
        }
        declaration
    }
}

/// Map form of a `belongs_to` entry
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BelongsToFields {
    name: String,
    #[serde(default)]
    class_name: Option<String>,
    #[serde(default)]
    foreign_key: Option<String>,
    #[serde(default)]
    polymorphic: bool,
    #[serde(default)]
    dependent: CascadePolicy,
}

impl From<BelongsToFields> for ManifestBelongsTo {
    fn from(fields: BelongsToFields) -> Self {
        Self {
            name: fields.name,
            class_name: fields.class_name,
            foreign_key: fields.foreign_key,
            polymorphic: fields.polymorphic,
            dependent: fields.dependent,
        }
    }
}

impl<'de> Deserialize<'de> for ManifestBelongsTo {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BelongsToVisitor;

        impl<'de> Visitor<'de> for BelongsToVisitor {
            type Value = ManifestBelongsTo;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an association name or a map with a 'name' field")
            }

            fn visit_str<E>(self, value: &str) -> Result<ManifestBelongsTo, E>
            where
                E: de::Error,
            {
                Ok(ManifestBelongsTo {
                    name: value.to_string(),
                    class_name: None,
                    foreign_key: None,
                    polymorphic: false,
                    dependent: CascadePolicy::None,
                })
            }

            fn visit_map<M>(self, map: M) -> Result<ManifestBelongsTo, M::Error>
            where
                M: MapAccess<'de>,
            {
                BelongsToFields::deserialize(de::value::MapAccessDeserializer::new(map))
                    .map(ManifestBelongsTo::from)
            }
        }

        deserializer.deserialize_any(BelongsToVisitor)
    }
}
