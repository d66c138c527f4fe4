//! Schema-driven mapping of JSON and XML documents.
//!
//! [`parse`] tokenizes a document in the schema's format, walks it against
//! the schema, and returns a [`ParseResult`]: the best-effort value tree and
//! every validation error found, in schema order. Nothing short of a
//! tokenization failure stops the walk.
//!
//! - Missing or null fields are absent; a required one is reported once.
//! - A field whose scalar fails to parse is reported and kept only when the
//!   parser salvaged a best attempt.
//! - An array with any error in it, including its length bounds, is
//!   discarded as a whole while each element's errors are still reported.
//! - An embedded field holds a whole document of another schema as a
//!   string; its errors are reported under the embedding field's path.
//!
//! # Example
//!
//! ```
//! use docshape_core::*;
//! use docshape_mapper::parse;
//!
//! let user = SchemaType::builder("User", DocumentFormat::Json)
//!     .field(
//!         FieldSpec::scalar("name", ScalarType::String)
//!             .required()
//!             .constraint(ScalarConstraint::string(Some(1), Some(50))),
//!     )
//!     .field(
//!         FieldSpec::scalar("age", ScalarType::Int32)
//!             .optional()
//!             .constraint(ScalarConstraint::integer(Some(0), Some(150))),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let result = parse(&user, r#"{"name": "", "age": 200}"#);
//! let ids: Vec<&str> = result.errors.iter().map(|e| e.id()).collect();
//! assert_eq!(ids, ["StringTooShort", "NumericTooLarge"]);
//!
//! let record = result.record().unwrap();
//! assert_eq!(record.get("name").as_str(), Some(""));
//! assert!(record.get("age").is_absent());
//! ```

mod cache;
mod engine;
pub mod json;
mod model;
pub mod xml;

use docshape_core::{
    DocumentFormat, DocumentToken, ErrorKind, Record, SchemaType, ValidationError, Value,
};
use serde::Serialize;
use tracing::debug;

pub use cache::schema_of;
pub use json::JsonToken;
pub use model::{Model, Parsed, parse_model};
pub use xml::{XmlDocument, XmlElement, XmlError, XmlToken};

use engine::Mapper;

/// The value tree and every error found while mapping one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    /// The root record, or [`Value::Absent`] when the document could not be
    /// tokenized or its root was not an object.
    pub value: Value,
    /// Errors in schema declaration order, array items in index order.
    pub errors: Vec<ValidationError>,
}

impl ParseResult {
    /// A result holding only an [`ErrorKind::InvalidInputData`] error at the
    /// root, for input that never reached the mapper.
    pub fn rejected(format: DocumentFormat, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        debug!(%format, %reason, "Input rejected");
        Self {
            value: Value::Absent,
            errors: vec![ValidationError::new(
                ErrorKind::InvalidInputData { format, reason },
                "",
            )],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The root record, if one was produced.
    pub fn record(&self) -> Option<&Record> {
        self.value.as_record()
    }
}

/// Parses `text` in the format declared by `schema`.
pub fn parse(schema: &SchemaType, text: &str) -> ParseResult {
    parse_as(schema, schema.format(), text)
}

/// Parses `text` as `format`, regardless of the format `schema` declares.
pub fn parse_as(schema: &SchemaType, format: DocumentFormat, text: &str) -> ParseResult {
    debug!(schema = schema.name(), %format, bytes = text.len(), "Parsing document");

    let result = match format {
        DocumentFormat::Json => match json::tokenize(text) {
            Ok(root) => map_root(schema, &JsonToken::new(&root)),
            Err(err) => ParseResult::rejected(format, err.to_string()),
        },
        DocumentFormat::Xml => match XmlDocument::parse(text) {
            Ok(document) => map_root(schema, &document.root_token()),
            Err(err) => ParseResult::rejected(format, err.to_string()),
        },
    };

    debug!(
        schema = schema.name(),
        errors = result.errors.len(),
        "Parsed document"
    );
    result
}

fn map_root<T: DocumentToken>(schema: &SchemaType, root: &T) -> ParseResult {
    let mut mapper = Mapper::new();
    let value = mapper.map_object(schema, root, "", false);
    ParseResult {
        value,
        errors: mapper.into_errors(),
    }
}
