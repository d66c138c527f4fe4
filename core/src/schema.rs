//! Schema declarations and directive resolution.
//!
//! A schema is declared with [`FieldSpec`]s and resolved once by
//! [`SchemaBuilder::build`] into an immutable [`SchemaType`]. Resolution is
//! where every schema-level decision is made: scalar constraints are compiled
//! into parsers (or inferred from the target type), optionality is fixed,
//! and directives are checked. The mapper only ever sees resolved
//! [`FieldDecl`]s.
//!
//! # Example
//!
//! ```
//! use docshape_core::*;
//!
//! let schema = SchemaType::builder("User", DocumentFormat::Json)
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
//! assert_eq!(schema.fields().len(), 2);
//! assert!(!schema.field("name").unwrap().is_optional());
//! assert!(schema.field("age").unwrap().is_optional());
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SchemaDefinitionError;
use crate::scalar::{ScalarConstraint, ScalarParser};

/// Default sentinel member of an [`EnumType`], meaning "no value chosen".
pub const DEFAULT_ENUM_SENTINEL: &str = "Undefined";

/// Source document format of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    #[default]
    Json,
    Xml,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Json => f.write_str("JSON"),
            DocumentFormat::Xml => f.write_str("XML"),
        }
    }
}

/// Where a field is read from in an XML element. JSON ignores placement
/// except that attribute reads are unsupported there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    #[default]
    Child,
    Attribute,
}

/// Closed set of named choices for an option field.
///
/// The sentinel member stands for "nothing selected" and is never accepted
/// as input.
///
/// ```
/// use docshape_core::EnumType;
///
/// let color = EnumType::new("Color", ["Undefined", "Red", "Green"]);
/// assert_eq!(color.allowed(), vec!["Red", "Green"]);
/// assert!(color.is_allowed("Red"));
/// assert!(!color.is_allowed("Undefined"));
/// assert!(!color.is_allowed("red"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    pub members: Vec<String>,
    #[serde(default = "default_sentinel")]
    pub sentinel: Option<String>,
}

fn default_sentinel() -> Option<String> {
    Some(DEFAULT_ENUM_SENTINEL.to_string())
}

impl EnumType {
    /// Creates an enum type with the default `"Undefined"` sentinel.
    pub fn new<I, S>(name: &str, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            members: members.into_iter().map(Into::into).collect(),
            sentinel: default_sentinel(),
        }
    }

    /// Replaces the sentinel member name.
    pub fn with_sentinel(mut self, sentinel: &str) -> Self {
        self.sentinel = Some(sentinel.to_string());
        self
    }

    /// Removes the sentinel so every member is selectable.
    pub fn without_sentinel(mut self) -> Self {
        self.sentinel = None;
        self
    }

    /// Selectable member names in declaration order.
    pub fn allowed(&self) -> Vec<&str> {
        self.members
            .iter()
            .map(String::as_str)
            .filter(|m| Some(*m) != self.sentinel.as_deref())
            .collect()
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        Some(name) != self.sentinel.as_deref() && self.members.iter().any(|m| m == name)
    }
}

/// Semantic type a scalar field parses into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Boolean,
    Int32,
    Int64,
    Decimal,
    String,
    Enum(EnumType),
    /// Structured email address (display name, local part, domain).
    Mailbox,
    DateTime,
    DateTimeOffset,
    Date,
    Time,
    Guid,
    /// Type handled only by a caller-supplied parser.
    Custom(String),
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Boolean => f.write_str("Boolean"),
            ScalarType::Int32 => f.write_str("Int32"),
            ScalarType::Int64 => f.write_str("Int64"),
            ScalarType::Decimal => f.write_str("Decimal"),
            ScalarType::String => f.write_str("String"),
            ScalarType::Enum(e) => write!(f, "Enum({})", e.name),
            ScalarType::Mailbox => f.write_str("Mailbox"),
            ScalarType::DateTime => f.write_str("DateTime"),
            ScalarType::DateTimeOffset => f.write_str("DateTimeOffset"),
            ScalarType::Date => f.write_str("Date"),
            ScalarType::Time => f.write_str("Time"),
            ScalarType::Guid => f.write_str("Guid"),
            ScalarType::Custom(name) => write!(f, "Custom({name})"),
        }
    }
}

/// Directive for object and embedded-document fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ObjectDirective {
    #[serde(default)]
    pub optional: bool,
}

impl ObjectDirective {
    pub fn required() -> Self {
        Self { optional: false }
    }

    pub fn optional() -> Self {
        Self { optional: true }
    }
}

/// Directive for array fields. Bounds are inclusive.
///
/// ```
/// use docshape_core::ArrayDirective;
///
/// let d = ArrayDirective::default();
/// assert_eq!(d.min_length, 0);
/// assert_eq!(d.max_length, None);
/// assert!(!d.optional);
///
/// let bounded = ArrayDirective::bounded(1, Some(3)).optional();
/// assert_eq!(bounded.min_length, 1);
/// assert!(bounded.optional);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ArrayDirective {
    #[serde(default)]
    pub min_length: usize,
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Whether the array itself may be absent.
    #[serde(default)]
    pub optional: bool,
    /// Whether individual items may be null.
    #[serde(default)]
    pub items_optional: bool,
}

impl ArrayDirective {
    pub fn bounded(min_length: usize, max_length: Option<usize>) -> Self {
        Self {
            min_length,
            max_length,
            ..Self::default()
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn items_optional(mut self) -> Self {
        self.items_optional = true;
        self
    }
}

/// Structural category of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCategory {
    Scalar,
    Object,
    Array,
}

/// A resolved scalar: its target type and the parser that produces it.
#[derive(Debug, Clone)]
pub struct ScalarField {
    target: ScalarType,
    parser: Arc<dyn ScalarParser>,
}

impl ScalarField {
    pub fn target(&self) -> &ScalarType {
        &self.target
    }

    pub fn parser(&self) -> &dyn ScalarParser {
        self.parser.as_ref()
    }
}

/// Element shape of an array field.
#[derive(Debug, Clone)]
pub enum ArrayItem {
    Scalar(ScalarField),
    Object(Arc<SchemaType>),
}

/// Resolved shape of a field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Scalar(ScalarField),
    Object(Arc<SchemaType>),
    /// A complete document of the nested schema, serialized as a string.
    Embedded(Arc<SchemaType>),
    Array {
        item: ArrayItem,
        directive: ArrayDirective,
    },
}

/// A resolved, immutable field declaration.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    name: String,
    external_name: Option<String>,
    optional: bool,
    placement: Placement,
    kind: FieldKind,
}

impl FieldDecl {
    /// Declared identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name used in documents and error paths (the override when present).
    pub fn external_name(&self) -> &str {
        self.external_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn category(&self) -> FieldCategory {
        match self.kind {
            FieldKind::Scalar(_) => FieldCategory::Scalar,
            FieldKind::Object(_) | FieldKind::Embedded(_) => FieldCategory::Object,
            FieldKind::Array { .. } => FieldCategory::Array,
        }
    }
}

/// A resolved record schema.
///
/// Built once through [`SchemaType::builder`], then shared read-only (it is
/// `Send + Sync`) by every parse that uses it.
#[derive(Debug, Clone)]
pub struct SchemaType {
    name: String,
    format: DocumentFormat,
    fields: Vec<FieldDecl>,
}

impl SchemaType {
    pub fn builder(name: &str, format: DocumentFormat) -> SchemaBuilder {
        SchemaBuilder {
            name: name.to_string(),
            format,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Looks up a field by declared or external name.
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields
            .iter()
            .find(|f| f.name == name || f.external_name() == name)
    }
}

/// Accumulates [`FieldSpec`]s for one schema type.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    format: DocumentFormat,
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn fields(mut self, specs: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(specs);
        self
    }

    /// Resolves every field declaration.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaDefinitionError`] found, in field order.
    pub fn build(self) -> Result<SchemaType, SchemaDefinitionError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());

        for spec in self.fields {
            let decl = spec.resolve(&self.name)?;
            if !seen.insert(decl.external_name().to_string()) {
                return Err(SchemaDefinitionError::DuplicateField {
                    schema: self.name,
                    field: decl.external_name().to_string(),
                });
            }
            fields.push(decl);
        }

        Ok(SchemaType {
            name: self.name,
            format: self.format,
            fields,
        })
    }
}

#[derive(Debug, Clone)]
struct ScalarSpec {
    target: ScalarType,
    constraint: Option<ScalarConstraint>,
    parser: Option<Arc<dyn ScalarParser>>,
}

impl ScalarSpec {
    fn resolve(self, field: &str) -> Result<ScalarField, SchemaDefinitionError> {
        let parser = match (self.parser, self.constraint) {
            (Some(parser), _) => parser,
            (None, Some(constraint)) => constraint.compile(field, &self.target)?,
            (None, None) => ScalarConstraint::default_for(&self.target)
                .ok_or_else(|| SchemaDefinitionError::NoDefaultConstraint {
                    field: field.to_string(),
                    target: self.target.to_string(),
                })?
                .compile(field, &self.target)?,
        };
        Ok(ScalarField {
            target: self.target,
            parser,
        })
    }
}

#[derive(Debug, Clone)]
enum SpecShape {
    Scalar(ScalarSpec),
    Object {
        schema: Arc<SchemaType>,
        directive: Option<ObjectDirective>,
        embedded: bool,
    },
    ScalarArray {
        item: ScalarSpec,
        directive: Option<ArrayDirective>,
    },
    ObjectArray {
        schema: Arc<SchemaType>,
        directive: Option<ArrayDirective>,
    },
}

/// Unresolved declaration of one field.
///
/// Scalar fields need their optionality settled: either explicitly with
/// [`optional`](FieldSpec::optional)/[`required`](FieldSpec::required), or
/// through declared nullability ([`nullable`](FieldSpec::nullable) /
/// [`non_null`](FieldSpec::non_null)). Object, embedded, and array fields
/// take optionality from their directive, which is mandatory.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    rename: Option<String>,
    optional: Option<bool>,
    nullable: Option<bool>,
    placement: Placement,
    shape: SpecShape,
}

impl FieldSpec {
    fn with_shape(name: &str, shape: SpecShape) -> Self {
        Self {
            name: name.to_string(),
            rename: None,
            optional: None,
            nullable: None,
            placement: Placement::Child,
            shape,
        }
    }

    pub fn scalar(name: &str, target: ScalarType) -> Self {
        Self::with_shape(
            name,
            SpecShape::Scalar(ScalarSpec {
                target,
                constraint: None,
                parser: None,
            }),
        )
    }

    pub fn object(name: &str, schema: Arc<SchemaType>) -> Self {
        Self::with_shape(
            name,
            SpecShape::Object {
                schema,
                directive: None,
                embedded: false,
            },
        )
    }

    /// A field whose value is a complete document of `schema`, serialized
    /// as a string inside the outer document.
    pub fn embedded(name: &str, schema: Arc<SchemaType>) -> Self {
        Self::with_shape(
            name,
            SpecShape::Object {
                schema,
                directive: None,
                embedded: true,
            },
        )
    }

    pub fn array_of_scalars(name: &str, target: ScalarType) -> Self {
        Self::with_shape(
            name,
            SpecShape::ScalarArray {
                item: ScalarSpec {
                    target,
                    constraint: None,
                    parser: None,
                },
                directive: None,
            },
        )
    }

    pub fn array_of_objects(name: &str, schema: Arc<SchemaType>) -> Self {
        Self::with_shape(
            name,
            SpecShape::ObjectArray {
                schema,
                directive: None,
            },
        )
    }

    /// Reads and reports the field under `external` instead of its name.
    pub fn rename(mut self, external: &str) -> Self {
        self.rename = Some(external.to_string());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = Some(true);
        self
    }

    pub fn required(mut self) -> Self {
        self.optional = Some(false);
        self
    }

    /// Declares the host type nullable; optional unless stated otherwise.
    pub fn nullable(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    pub fn non_null(mut self) -> Self {
        self.nullable = Some(false);
        self
    }

    /// Reads the field from an XML attribute of the parent element.
    pub fn attribute(mut self) -> Self {
        self.placement = Placement::Attribute;
        self
    }

    pub fn placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Sets the scalar constraint (the item constraint for scalar arrays).
    /// Ignored on object fields.
    pub fn constraint(mut self, constraint: ScalarConstraint) -> Self {
        match &mut self.shape {
            SpecShape::Scalar(spec) | SpecShape::ScalarArray { item: spec, .. } => {
                spec.constraint = Some(constraint);
            }
            SpecShape::Object { .. } | SpecShape::ObjectArray { .. } => {}
        }
        self
    }

    /// Uses a caller-supplied parser, bypassing constraint compilation.
    pub fn parser(mut self, parser: Arc<dyn ScalarParser>) -> Self {
        match &mut self.shape {
            SpecShape::Scalar(spec) | SpecShape::ScalarArray { item: spec, .. } => {
                spec.parser = Some(parser);
            }
            SpecShape::Object { .. } | SpecShape::ObjectArray { .. } => {}
        }
        self
    }

    /// Sets the object directive. Ignored on scalar and array fields.
    pub fn directive(mut self, value: ObjectDirective) -> Self {
        if let SpecShape::Object { directive, .. } = &mut self.shape {
            *directive = Some(value);
        }
        self
    }

    /// Sets the array directive. Ignored on scalar and object fields.
    pub fn array_directive(mut self, value: ArrayDirective) -> Self {
        match &mut self.shape {
            SpecShape::ScalarArray { directive, .. } | SpecShape::ObjectArray { directive, .. } => {
                *directive = Some(value);
            }
            SpecShape::Scalar(_) | SpecShape::Object { .. } => {}
        }
        self
    }

    fn resolve(self, schema: &str) -> Result<FieldDecl, SchemaDefinitionError> {
        let external = self.rename.as_deref().unwrap_or(&self.name);
        if self.name.trim().is_empty() || external.trim().is_empty() {
            return Err(SchemaDefinitionError::EmptyName {
                schema: schema.to_string(),
            });
        }
        let field = external.to_string();

        if self.placement == Placement::Attribute && !matches!(self.shape, SpecShape::Scalar(_)) {
            return Err(SchemaDefinitionError::InvalidPlacement { field });
        }

        let (optional, kind) = match self.shape {
            SpecShape::Scalar(spec) => {
                let optional = self.optional.or(self.nullable).ok_or_else(|| {
                    SchemaDefinitionError::UnresolvedOptionality {
                        field: field.clone(),
                    }
                })?;
                (optional, FieldKind::Scalar(spec.resolve(&field)?))
            }
            SpecShape::Object {
                schema,
                directive,
                embedded,
            } => {
                let directive = directive.ok_or_else(|| SchemaDefinitionError::MissingDirective {
                    field: field.clone(),
                    directive: "object",
                })?;
                let kind = if embedded {
                    FieldKind::Embedded(schema)
                } else {
                    FieldKind::Object(schema)
                };
                (directive.optional, kind)
            }
            SpecShape::ScalarArray { item, directive } => {
                let directive = resolve_array_directive(&field, directive)?;
                let item = ArrayItem::Scalar(item.resolve(&field)?);
                (directive.optional, FieldKind::Array { item, directive })
            }
            SpecShape::ObjectArray { schema, directive } => {
                let directive = resolve_array_directive(&field, directive)?;
                (
                    directive.optional,
                    FieldKind::Array {
                        item: ArrayItem::Object(schema),
                        directive,
                    },
                )
            }
        };

        Ok(FieldDecl {
            name: self.name,
            external_name: self.rename,
            optional,
            placement: self.placement,
            kind,
        })
    }
}

fn resolve_array_directive(
    field: &str,
    directive: Option<ArrayDirective>,
) -> Result<ArrayDirective, SchemaDefinitionError> {
    let directive = directive.ok_or_else(|| SchemaDefinitionError::MissingDirective {
        field: field.to_string(),
        directive: "array",
    })?;
    match directive.max_length {
        Some(max) if max < directive.min_length => Err(SchemaDefinitionError::InvalidBound {
            field: field.to_string(),
            reason: format!("min_length {} exceeds max_length {max}", directive.min_length),
        }),
        _ => Ok(directive),
    }
}
