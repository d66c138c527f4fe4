//! Typed models on top of [`Record`].

use docshape_core::{Record, SchemaDefinitionError, SchemaType, ValidationError};

use crate::cache::schema_of;

/// A Rust type with a declared schema.
///
/// `schema` is resolved once per type and cached (see [`schema_of`]), so
/// it may do as much work as it needs. `from_record` receives a possibly
/// partial record: fields that failed validation are absent.
///
/// ```
/// use docshape_core::*;
/// use docshape_mapper::{Model, parse_model};
///
/// #[derive(Debug)]
/// struct Point {
///     x: Option<i32>,
///     y: Option<i32>,
/// }
///
/// impl Model for Point {
///     fn schema() -> Result<SchemaType, SchemaDefinitionError> {
///         SchemaType::builder("Point", DocumentFormat::Json)
///             .field(FieldSpec::scalar("x", ScalarType::Int32).required())
///             .field(FieldSpec::scalar("y", ScalarType::Int32).required())
///             .build()
///     }
///
///     fn from_record(record: &Record) -> Self {
///         Point {
///             x: record.get("x").as_i32(),
///             y: record.get("y").as_i32(),
///         }
///     }
/// }
///
/// let parsed = parse_model::<Point>(r#"{"x": 1, "y": "two"}"#).unwrap();
/// assert_eq!(parsed.errors.len(), 1);
/// let point = parsed.value.unwrap();
/// assert_eq!((point.x, point.y), (Some(1), None));
/// ```
pub trait Model: Sized + 'static {
    /// Declares the schema of this type.
    fn schema() -> Result<SchemaType, SchemaDefinitionError>;

    /// Builds a value from a mapped record.
    fn from_record(record: &Record) -> Self;
}

/// A typed parse result.
#[derive(Debug, Clone)]
pub struct Parsed<M> {
    /// `None` when the document produced no root record.
    pub value: Option<M>,
    pub errors: Vec<ValidationError>,
}

impl<M> Parsed<M> {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The value when the document was valid, the errors otherwise.
    pub fn into_result(self) -> Result<M, Vec<ValidationError>> {
        match self.value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }
}

/// Parses `text` against the cached schema of `M`.
///
/// # Errors
///
/// The schema's [`SchemaDefinitionError`] if `M` declares an invalid schema.
/// Document errors are never returned here; they are in
/// [`Parsed::errors`].
pub fn parse_model<M: Model>(text: &str) -> Result<Parsed<M>, SchemaDefinitionError> {
    let schema = schema_of::<M>()?;
    let result = crate::parse(&schema, text);
    Ok(Parsed {
        value: result.record().map(M::from_record),
        errors: result.errors,
    })
}
