//! Declarative schema definitions, as read from YAML or JSON files.
//!
//! # Example YAML
//!
//! ```yaml
//! name: Order
//! format: xml
//! fields:
//!   - name: id
//!     placement: attribute
//!     optional: false
//!     category:
//!       scalar:
//!         type: int64
//!   - name: customer
//!     nullable: false
//!     category:
//!       scalar:
//!         type: string
//!         constraint:
//!           string: { min_length: 1, max_length: 80 }
//!   - name: line
//!     category:
//!       array:
//!         items:
//!           object: Line
//!         directive: { min_length: 1 }
//! ```
//!
//! Object and array fields that omit `directive` take their presence rule
//! from the field's `optional` flag; with neither, compilation fails.

use std::collections::BTreeSet;
use std::path::Path;

use docshape_core::{
    ArrayDirective, DocumentFormat, ObjectDirective, Placement, ScalarConstraint, ScalarType,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// One schema type, by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    #[serde(default)]
    pub format: DocumentFormat,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl SchemaDefinition {
    pub fn new(name: &str, format: DocumentFormat) -> Self {
        Self {
            name: name.to_string(),
            format,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Names of the schemas this definition refers to.
    pub fn references(&self) -> BTreeSet<&str> {
        self.fields
            .iter()
            .filter_map(|f| f.category.reference())
            .collect()
    }

    /// Reads one definition from a `.json`, `.yaml`, or `.yml` file.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnsupportedFile`] for other extensions, plus I/O and
    /// parse errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_document(path.as_ref())
    }
}

/// Reads a JSON or YAML document, chosen by file extension.
pub(crate) fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let extension = path.extension().and_then(|e| e.to_str());
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    match extension {
        Some("json") => Ok(serde_json::from_reader(reader)?),
        Some("yaml" | "yml") => Ok(serde_yaml::from_reader(reader)?),
        _ => Err(RegistryError::UnsupportedFile(path.to_path_buf())),
    }
}

/// One field of a [`SchemaDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    /// Name used in documents, when it differs from `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
    #[serde(default)]
    pub placement: Placement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    pub category: CategoryDefinition,
}

impl FieldDefinition {
    pub fn new(name: &str, category: CategoryDefinition) -> Self {
        Self {
            name: name.to_string(),
            rename: None,
            placement: Placement::Child,
            optional: None,
            nullable: None,
            category,
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn rename(mut self, external: &str) -> Self {
        self.rename = Some(external.to_string());
        self
    }

    pub fn attribute(mut self) -> Self {
        self.placement = Placement::Attribute;
        self
    }
}

/// Structural category of a field and its category-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryDefinition {
    Scalar(ScalarDefinition),
    Object(ObjectDefinition),
    /// A document of `schema` serialized as a string.
    Embedded(ObjectDefinition),
    Array(ArrayDefinition),
}

impl CategoryDefinition {
    pub fn scalar(target: ScalarType) -> Self {
        Self::Scalar(ScalarDefinition::new(target))
    }

    pub fn object(schema: &str) -> Self {
        Self::Object(ObjectDefinition::new(schema))
    }

    pub fn embedded(schema: &str) -> Self {
        Self::Embedded(ObjectDefinition::new(schema))
    }

    fn reference(&self) -> Option<&str> {
        match self {
            Self::Scalar(_) => None,
            Self::Object(o) | Self::Embedded(o) => Some(&o.schema),
            Self::Array(a) => match &a.items {
                ItemDefinition::Scalar(_) => None,
                ItemDefinition::Object(schema) => Some(schema),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarDefinition {
    #[serde(rename = "type")]
    pub target: ScalarType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<ScalarConstraint>,
    /// Name of a custom parser registered with the registry builder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
}

impl ScalarDefinition {
    pub fn new(target: ScalarType) -> Self {
        Self {
            target,
            constraint: None,
            parser: None,
        }
    }

    pub fn with_constraint(mut self, constraint: ScalarConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn with_parser(mut self, parser: &str) -> Self {
        self.parser = Some(parser.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDefinition {
    pub schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive: Option<ObjectDirective>,
}

impl ObjectDefinition {
    pub fn new(schema: &str) -> Self {
        Self {
            schema: schema.to_string(),
            directive: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayDefinition {
    pub items: ItemDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive: Option<ArrayDirective>,
}

/// Element shape of an array field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemDefinition {
    Scalar(ScalarDefinition),
    /// Name of the element schema.
    Object(String),
}

/// A file holding several definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub schemas: Vec<SchemaDefinition>,
}
