//! Validation and schema-definition errors.
//!
//! Two families of errors live here and they never mix:
//!
//! - [`ValidationError`] describes a defect in a *document*. The mapper
//!   collects these into an ordered list and keeps walking; a document with
//!   ten defects yields ten errors.
//! - [`SchemaDefinitionError`] describes a defect in a *schema*. It is
//!   returned from schema builders before any document is read and is never
//!   part of a validation error list.
//!
//! # Examples
//!
//! ```
//! use docshape_core::{ErrorKind, ValidationError};
//!
//! let err = ValidationError::new(ErrorKind::StringTooShort { min: 1 }, "name")
//!     .with_value("");
//! assert_eq!(err.id(), "StringTooShort");
//! assert_eq!(err.path(), "name");
//! assert_eq!(err.to_string(), "name: value is shorter than 1 character(s)");
//! ```

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::schema::DocumentFormat;

/// The failure kind of a [`ValidationError`], with its kind-specific bounds.
///
/// The `Display` impl is the human description carried by the error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind")]
pub enum ErrorKind {
    /// The raw text could not be tokenized as the schema's document format.
    #[error("input is not a well-formed {format} document: {reason}")]
    InvalidInputData {
        format: DocumentFormat,
        reason: String,
    },
    /// A required value is missing or null.
    #[error("a value is required")]
    OptionalityViolation,
    /// The value is present but is not an object.
    #[error("value is not an object")]
    NotAnObject,
    /// The value is present but is not an array.
    #[error("value is not an array")]
    NotAnArray,
    /// The value is present but is not a primitive.
    #[error("value is not a primitive")]
    NotPrimitive,
    #[error("array has {actual} item(s), at least {min} required")]
    ArrayTooShort { min: usize, actual: usize },
    #[error("array has {actual} item(s), at most {max} allowed")]
    ArrayTooLong { max: usize, actual: usize },
    #[error("value is shorter than {min} character(s)")]
    StringTooShort { min: usize },
    #[error("value is longer than {max} character(s)")]
    StringTooLong { max: usize },
    #[error("value is smaller than {min}")]
    NumericTooSmall { min: String },
    #[error("value is larger than {max}")]
    NumericTooLarge { max: String },
    #[error("value is not a valid 32-bit integer")]
    InvalidInt32,
    #[error("value is not a valid 64-bit integer")]
    InvalidInt64,
    #[error("value is not a valid decimal number")]
    InvalidDecimal,
    #[error("value is not a valid boolean")]
    InvalidBoolean,
    #[error("value is not one of: {}", .allowed.join(", "))]
    InvalidOption { allowed: Vec<String> },
    #[error("value is not a valid email address")]
    InvalidEmail,
    #[error("value is not a recognizable {target}")]
    InvalidLooseTimestamp { target: String },
    #[error("value does not match the {target} format '{format}'")]
    InvalidExactTimestamp { target: String, format: String },
    #[error("value is not a recognizable GUID")]
    InvalidLooseGuid,
    #[error("value does not match the GUID format '{format}'")]
    InvalidExactGuid { format: String },
    #[error("value has fewer than {min} decimal digit(s)")]
    TooFewDecimalDigits { min: u32 },
    #[error("value has more than {max} decimal digit(s)")]
    TooManyDecimalDigits { max: u32 },
    /// A token capability the document format does not provide.
    #[error("{operation} is not supported for {format} documents")]
    UnsupportedOperation {
        operation: String,
        format: DocumentFormat,
    },
    /// Raised by pluggable parsers for failure kinds outside this list.
    #[error("{message}")]
    Custom { id: String, message: String },
}

impl ErrorKind {
    /// Stable identifier of this kind, used for programmatic matching.
    pub fn id(&self) -> &str {
        match self {
            Self::InvalidInputData { .. } => "InvalidInputData",
            Self::OptionalityViolation => "OptionalityViolation",
            Self::NotAnObject => "NotAnObject",
            Self::NotAnArray => "NotAnArray",
            Self::NotPrimitive => "NotPrimitive",
            Self::ArrayTooShort { .. } => "ArrayTooShort",
            Self::ArrayTooLong { .. } => "ArrayTooLong",
            Self::StringTooShort { .. } => "StringTooShort",
            Self::StringTooLong { .. } => "StringTooLong",
            Self::NumericTooSmall { .. } => "NumericTooSmall",
            Self::NumericTooLarge { .. } => "NumericTooLarge",
            Self::InvalidInt32 => "InvalidInt32",
            Self::InvalidInt64 => "InvalidInt64",
            Self::InvalidDecimal => "InvalidDecimal",
            Self::InvalidBoolean => "InvalidBoolean",
            Self::InvalidOption { .. } => "InvalidOption",
            Self::InvalidEmail => "InvalidEmail",
            Self::InvalidLooseTimestamp { .. } => "InvalidLooseTimestamp",
            Self::InvalidExactTimestamp { .. } => "InvalidExactTimestamp",
            Self::InvalidLooseGuid => "InvalidLooseGuid",
            Self::InvalidExactGuid { .. } => "InvalidExactGuid",
            Self::TooFewDecimalDigits { .. } => "TooFewDecimalDigits",
            Self::TooManyDecimalDigits { .. } => "TooManyDecimalDigits",
            Self::UnsupportedOperation { .. } => "UnsupportedOperation",
            Self::Custom { id, .. } => id,
        }
    }
}

/// One path-qualified defect found in a document.
///
/// Errors are plain values: they hold no reference to the document or the
/// schema they were produced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    kind: ErrorKind,
    path: String,
    value: Option<String>,
}

impl ValidationError {
    /// Creates an error of `kind` located at `path`.
    pub fn new(kind: ErrorKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            value: None,
        }
    }

    /// Attaches the offending raw value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Re-roots this error under `prefix`.
    ///
    /// An error at the root (`""`) takes the prefix as its path, so a nested
    /// document that failed to tokenize reports at the embedding field.
    ///
    /// ```
    /// use docshape_core::{ErrorKind, ValidationError};
    ///
    /// let err = ValidationError::new(ErrorKind::InvalidBoolean, "flags[0]");
    /// assert_eq!(err.with_path_prefix("payload").path(), "payload.flags[0]");
    /// ```
    pub fn with_path_prefix(mut self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self;
        }
        self.path = if self.path.is_empty() {
            prefix.to_string()
        } else if self.path.starts_with('[') {
            format!("{prefix}{}", self.path)
        } else {
            format!("{prefix}.{}", self.path)
        };
        self
    }

    pub fn id(&self) -> &str {
        self.kind.id()
    }

    pub fn description(&self) -> String {
        self.kind.to_string()
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.path, self.kind)
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Serialize)]
struct ErrorData<'a> {
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
    context: &'a ErrorKind,
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationError", 3)?;
        state.serialize_field("id", self.id())?;
        state.serialize_field("description", &self.description())?;
        state.serialize_field(
            "data",
            &ErrorData {
                path: &self.path,
                value: self.value.as_deref(),
                context: &self.kind,
            },
        )?;
        state.end()
    }
}

/// Schema misconfiguration detected while building a schema type.
///
/// These are programming errors: a schema that fails to build must never be
/// used to read a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaDefinitionError {
    /// Schema or field name is empty or whitespace-only.
    #[error("schema '{schema}' declares a field with an empty name")]
    EmptyName { schema: String },
    /// Two fields resolve to the same external name.
    #[error("schema '{schema}' declares field '{field}' more than once")]
    DuplicateField { schema: String, field: String },
    /// An object, embedded, or array field has no directive.
    #[error("field '{field}' is missing its {directive} directive")]
    MissingDirective {
        field: String,
        directive: &'static str,
    },
    /// A scalar field has no constraint and its type has no default one.
    #[error("field '{field}' of type {target} has no constraint and no default")]
    NoDefaultConstraint { field: String, target: String },
    /// Neither explicit optionality nor nullability was declared.
    #[error("field '{field}' declares neither optionality nor nullability")]
    UnresolvedOptionality { field: String },
    /// The constraint does not apply to the field's target type.
    #[error("field '{field}': {constraint} constraint cannot apply to {target}")]
    ConstraintMismatch {
        field: String,
        constraint: &'static str,
        target: String,
    },
    /// A bound is unparsable or min exceeds max.
    #[error("field '{field}' has an invalid bound: {reason}")]
    InvalidBound { field: String, reason: String },
    /// An exact-format string is not recognized.
    #[error("field '{field}' has an invalid format '{format}'")]
    InvalidFormat { field: String, format: String },
    /// Attribute placement on a non-scalar field.
    #[error("field '{field}' cannot be placed as an attribute")]
    InvalidPlacement { field: String },
    /// An enum type with no selectable members.
    #[error("enum '{name}' has no members besides its sentinel")]
    EmptyEnum { name: String },
}

/// Failure of a document token capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("{operation} is not supported for {format} documents")]
    UnsupportedOperation {
        operation: &'static str,
        format: DocumentFormat,
    },
}

impl From<TokenError> for ErrorKind {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::UnsupportedOperation { operation, format } => {
                ErrorKind::UnsupportedOperation {
                    operation: operation.to_string(),
                    format,
                }
            }
        }
    }
}
