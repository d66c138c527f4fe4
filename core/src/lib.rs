//! Schema declarations, scalar parsers, and the error model for structural
//! document validation.
//!
//! This crate holds everything the mapper consumes but does not traverse:
//!
//! - [`SchemaType`]: an immutable, named record shape built once with
//!   [`SchemaType::builder`] from [`FieldSpec`]s. Every field is resolved to
//!   a [`FieldDecl`] at build time; a schema that cannot be resolved fails
//!   with [`SchemaDefinitionError`] before any document is read.
//! - [`ScalarParser`]: the pluggable leaf validator contract, with built-in
//!   parsers compiled from declarative [`ScalarConstraint`]s.
//! - [`ValidationError`]: a path-qualified document defect with a stable
//!   id, a description, and structured context.
//! - [`Value`]: the parsed value tree, where [`Value::Absent`] marks
//!   missing or discarded data.
//! - [`DocumentToken`]: the read-only node view each document format
//!   implements.
//!
//! # Example
//!
//! ```
//! use docshape_core::*;
//!
//! let user = SchemaType::builder("User", DocumentFormat::Json)
//!     .field(
//!         FieldSpec::scalar("name", ScalarType::String)
//!             .required()
//!             .constraint(ScalarConstraint::string(Some(1), Some(50))),
//!     )
//!     .field(
//!         FieldSpec::scalar("age", ScalarType::Int32)
//!             .nullable()
//!             .constraint(ScalarConstraint::integer(Some(0), Some(150))),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(user.fields().len(), 2);
//! assert!(user.field("age").unwrap().is_optional());
//! ```

mod error;
pub mod scalar;
mod schema;
mod token;
mod value;

pub use error::{ErrorKind, SchemaDefinitionError, TokenError, ValidationError};
pub use scalar::{Mailbox, ParseOutcome, ScalarConstraint, ScalarParser};
pub use schema::*;
pub use token::DocumentToken;
pub use value::{DATE_TIME_FORMAT, Record, ScalarValue, Value};
