//! Error types for loading and compiling schema definitions.

use std::path::PathBuf;

use docshape_core::SchemaDefinitionError;
use thiserror::Error;

/// Errors that can occur while building a registry or reading configuration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A definition file has an extension other than json, yaml, or yml.
    #[error("unsupported definition file: {}", .0.display())]
    UnsupportedFile(PathBuf),

    /// A definition compiled into an invalid schema.
    #[error("schema '{schema}': {source}")]
    Definition {
        schema: String,
        source: SchemaDefinitionError,
    },

    /// A field refers to a schema that is not defined.
    #[error("schema '{schema}' references unknown schema '{reference}'")]
    UnknownSchema { schema: String, reference: String },

    /// Two definitions share a name.
    #[error("schema '{0}' is defined more than once")]
    DuplicateSchema(String),

    /// Definitions refer to each other in a loop.
    #[error("schemas reference each other in a cycle: {}", .0.join(" -> "))]
    CyclicReference(Vec<String>),

    /// A field names a custom parser that was never registered.
    #[error("schema '{schema}' field '{field}' uses unregistered parser '{parser}'")]
    UnknownParser {
        schema: String,
        field: String,
        parser: String,
    },

    /// The builder was given nothing to load.
    #[error("no schema sources available")]
    NoSources,
}

/// Convenience alias for results with [`RegistryError`].
pub type Result<T> = std::result::Result<T, RegistryError>;
