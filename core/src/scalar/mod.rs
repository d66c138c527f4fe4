//! Scalar field parsers.
//!
//! Every scalar field is read by a [`ScalarParser`]: it receives the field's
//! target type, the raw primitive text, and the error path, and returns a
//! [`ParseOutcome`]. The mapper knows nothing about the parsers' internals,
//! so new scalar kinds plug in through [`FieldSpec::parser`] without
//! touching the traversal.
//!
//! Built-in parsers are produced from declarative [`ScalarConstraint`]s by
//! [`ScalarConstraint::compile`], which also checks that the constraint
//! applies to the target type.
//!
//! # Examples
//!
//! ```
//! use docshape_core::*;
//!
//! let parser = ScalarConstraint::integer(Some(0), Some(150))
//!     .compile("age", &ScalarType::Int32)
//!     .unwrap();
//!
//! let ok = parser.parse(&ScalarType::Int32, "42", "age");
//! assert_eq!(ok, ParseOutcome::Success(ScalarValue::Int32(42)));
//!
//! let too_large = parser.parse(&ScalarType::Int32, "200", "age");
//! assert_eq!(too_large.error().unwrap().id(), "NumericTooLarge");
//! ```
//!
//! [`FieldSpec::parser`]: crate::FieldSpec::parser

mod boolean;
mod decimal;
mod email;
mod guid;
mod integer;
mod option;
mod string;
mod temporal;

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, SchemaDefinitionError, ValidationError};
use crate::schema::ScalarType;
use crate::value::ScalarValue;

pub use boolean::BooleanParser;
pub use decimal::DecimalParser;
pub use email::{EmailParser, Mailbox, MailboxError};
pub use guid::{GuidFormat, GuidParser};
pub use integer::IntegerParser;
pub use option::OptionParser;
pub use string::StringParser;
pub use temporal::TemporalParser;

/// Result of parsing one scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The value matches the target type and every constraint.
    Success(ScalarValue),
    /// The value is unparsable or violates a constraint. `best_attempt` is a
    /// salvageable value when the parser has one.
    Failure {
        error: ValidationError,
        best_attempt: Option<ScalarValue>,
    },
}

impl ParseOutcome {
    /// Failure of `kind` at `path`, recording the raw text, with no best
    /// attempt.
    pub fn failure(kind: ErrorKind, path: &str, raw: &str) -> Self {
        ParseOutcome::Failure {
            error: ValidationError::new(kind, path).with_value(raw),
            best_attempt: None,
        }
    }

    /// Attaches a best attempt to a failure; successes are unchanged.
    pub fn with_best_attempt(self, value: ScalarValue) -> Self {
        match self {
            ParseOutcome::Failure { error, .. } => ParseOutcome::Failure {
                error,
                best_attempt: Some(value),
            },
            success => success,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseOutcome::Success(_))
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ParseOutcome::Failure { error, .. } => Some(error),
            ParseOutcome::Success(_) => None,
        }
    }

    /// The parsed value, or the best attempt of a failure.
    pub fn value(&self) -> Option<&ScalarValue> {
        match self {
            ParseOutcome::Success(v) => Some(v),
            ParseOutcome::Failure { best_attempt, .. } => best_attempt.as_ref(),
        }
    }
}

/// Uniform contract of a scalar leaf validator.
///
/// Implementations must be pure: the same `(target, raw)` always yields the
/// same outcome, and `path` is only used to locate errors.
pub trait ScalarParser: Debug + Send + Sync {
    fn parse(&self, target: &ScalarType, raw: &str, path: &str) -> ParseOutcome;
}

/// Declarative scalar constraint, compiled into a [`ScalarParser`].
///
/// Externally tagged: `"boolean"`, or `{ "integer": { "min": 0 } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarConstraint {
    Boolean,
    /// 32- or 64-bit integer, inclusive range.
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    /// Fixed-point decimal. Bounds are decimal strings so no precision is
    /// lost; digit bounds count digits after the point in the input text.
    Decimal {
        min: Option<String>,
        max: Option<String>,
        min_decimal_digits: Option<u32>,
        max_decimal_digits: Option<u32>,
    },
    /// Character-count bounds on the trimmed string.
    String {
        min_length: Option<usize>,
        max_length: Option<usize>,
    },
    /// Member of the target enum type.
    Option,
    Email,
    /// Date/time family; `format` is a chrono `strftime` pattern for exact
    /// parsing, loose parsing otherwise.
    Temporal { format: Option<String> },
    /// GUID; `format` is one of `N`, `D`, `B`, `P` for exact parsing.
    Guid { format: Option<String> },
}

impl ScalarConstraint {
    pub fn boolean() -> Self {
        Self::Boolean
    }

    pub fn integer(min: Option<i64>, max: Option<i64>) -> Self {
        Self::Integer { min, max }
    }

    pub fn decimal(min: Option<&str>, max: Option<&str>) -> Self {
        Self::Decimal {
            min: min.map(String::from),
            max: max.map(String::from),
            min_decimal_digits: None,
            max_decimal_digits: None,
        }
    }

    /// Sets the decimal-digit bounds of a decimal constraint.
    pub fn with_decimal_digits(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        if let Self::Decimal {
            min_decimal_digits,
            max_decimal_digits,
            ..
        } = &mut self
        {
            *min_decimal_digits = min;
            *max_decimal_digits = max;
        }
        self
    }

    pub fn string(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Self::String {
            min_length,
            max_length,
        }
    }

    pub fn option() -> Self {
        Self::Option
    }

    pub fn email() -> Self {
        Self::Email
    }

    pub fn temporal(format: Option<&str>) -> Self {
        Self::Temporal {
            format: format.map(String::from),
        }
    }

    pub fn guid(format: Option<&str>) -> Self {
        Self::Guid {
            format: format.map(String::from),
        }
    }

    /// Short name used in schema errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer { .. } => "integer",
            Self::Decimal { .. } => "decimal",
            Self::String { .. } => "string",
            Self::Option => "option",
            Self::Email => "email",
            Self::Temporal { .. } => "temporal",
            Self::Guid { .. } => "guid",
        }
    }

    /// Constraint used for a scalar field that declares none.
    ///
    /// ```
    /// use docshape_core::{ScalarConstraint, ScalarType};
    ///
    /// assert_eq!(
    ///     ScalarConstraint::default_for(&ScalarType::Boolean),
    ///     Some(ScalarConstraint::Boolean)
    /// );
    /// assert_eq!(ScalarConstraint::default_for(&ScalarType::Custom("Iban".into())), None);
    /// ```
    pub fn default_for(target: &ScalarType) -> Option<Self> {
        match target {
            ScalarType::Boolean => Some(Self::Boolean),
            ScalarType::Int32 | ScalarType::Int64 => Some(Self::integer(None, None)),
            ScalarType::Decimal => Some(Self::decimal(None, None)),
            ScalarType::String => Some(Self::string(None, None)),
            ScalarType::Enum(_) => Some(Self::Option),
            ScalarType::Mailbox => Some(Self::Email),
            ScalarType::DateTime
            | ScalarType::DateTimeOffset
            | ScalarType::Date
            | ScalarType::Time => Some(Self::temporal(None)),
            ScalarType::Guid => Some(Self::guid(None)),
            ScalarType::Custom(_) => None,
        }
    }

    /// Compiles this constraint for a field of type `target`.
    ///
    /// # Errors
    ///
    /// [`SchemaDefinitionError::ConstraintMismatch`] when the constraint does
    /// not apply to `target`, and bound/format errors from the individual
    /// parsers.
    pub fn compile(
        &self,
        field: &str,
        target: &ScalarType,
    ) -> Result<Arc<dyn ScalarParser>, SchemaDefinitionError> {
        let parser: Arc<dyn ScalarParser> = match (self, target) {
            (Self::Boolean, ScalarType::Boolean) => Arc::new(BooleanParser),
            (Self::Integer { min, max }, ScalarType::Int32 | ScalarType::Int64) => {
                Arc::new(IntegerParser::new(field, *min, *max)?)
            }
            (
                Self::Decimal {
                    min,
                    max,
                    min_decimal_digits,
                    max_decimal_digits,
                },
                ScalarType::Decimal,
            ) => Arc::new(DecimalParser::new(
                field,
                min.as_deref(),
                max.as_deref(),
                *min_decimal_digits,
                *max_decimal_digits,
            )?),
            (
                Self::String {
                    min_length,
                    max_length,
                },
                ScalarType::String,
            ) => Arc::new(StringParser::new(field, *min_length, *max_length)?),
            (Self::Option, ScalarType::Enum(enum_type)) => {
                if enum_type.allowed().is_empty() {
                    return Err(SchemaDefinitionError::EmptyEnum {
                        name: enum_type.name.clone(),
                    });
                }
                Arc::new(OptionParser)
            }
            (Self::Email, ScalarType::String | ScalarType::Mailbox) => Arc::new(EmailParser),
            (
                Self::Temporal { format },
                ScalarType::DateTime
                | ScalarType::DateTimeOffset
                | ScalarType::Date
                | ScalarType::Time,
            ) => Arc::new(TemporalParser::new(field, target, format.as_deref())?),
            (Self::Guid { format }, ScalarType::Guid) => {
                Arc::new(GuidParser::new(field, format.as_deref())?)
            }
            _ => {
                return Err(SchemaDefinitionError::ConstraintMismatch {
                    field: field.to_string(),
                    constraint: self.name(),
                    target: target.to_string(),
                });
            }
        };
        Ok(parser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EnumType;

    #[test]
    fn test_compile_rejects_mismatched_target() {
        let err = ScalarConstraint::integer(None, None)
            .compile("name", &ScalarType::String)
            .unwrap_err();
        assert_eq!(
            err,
            SchemaDefinitionError::ConstraintMismatch {
                field: "name".into(),
                constraint: "integer",
                target: "String".into(),
            }
        );
    }

    #[test]
    fn test_compile_rejects_enum_with_only_sentinel() {
        let target = ScalarType::Enum(EnumType::new("Empty", ["Undefined"]));
        let err = ScalarConstraint::option().compile("e", &target).unwrap_err();
        assert_eq!(
            err,
            SchemaDefinitionError::EmptyEnum {
                name: "Empty".into()
            }
        );
    }

    #[test]
    fn test_every_builtin_type_has_a_compilable_default() {
        let targets = [
            ScalarType::Boolean,
            ScalarType::Int32,
            ScalarType::Int64,
            ScalarType::Decimal,
            ScalarType::String,
            ScalarType::Enum(EnumType::new("Color", ["Red"])),
            ScalarType::Mailbox,
            ScalarType::DateTime,
            ScalarType::DateTimeOffset,
            ScalarType::Date,
            ScalarType::Time,
            ScalarType::Guid,
        ];
        for target in &targets {
            let constraint = ScalarConstraint::default_for(target).unwrap();
            assert!(constraint.compile("f", target).is_ok(), "{target}");
        }
    }

    #[test]
    fn test_constraint_deserializes_from_json() {
        let c: ScalarConstraint =
            serde_json::from_str(r#"{"decimal":{"min":"0.00","max_decimal_digits":2}}"#)
                .unwrap();
        assert_eq!(
            c,
            ScalarConstraint::decimal(Some("0.00"), None).with_decimal_digits(None, Some(2))
        );

        let c: ScalarConstraint = serde_json::from_str(r#""boolean""#).unwrap();
        assert_eq!(c, ScalarConstraint::Boolean);
    }

    #[test]
    fn test_outcome_helpers() {
        let failed = ParseOutcome::failure(ErrorKind::StringTooLong { max: 2 }, "s", "abc")
            .with_best_attempt(ScalarValue::String("abc".into()));
        assert!(!failed.is_success());
        assert_eq!(failed.error().unwrap().value(), Some("abc"));
        assert_eq!(failed.value(), Some(&ScalarValue::String("abc".into())));

        let ok = ParseOutcome::Success(ScalarValue::Bool(true))
            .with_best_attempt(ScalarValue::Bool(false));
        assert_eq!(ok.value(), Some(&ScalarValue::Bool(true)));
    }
}
