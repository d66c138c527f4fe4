use rust_decimal::prelude::ToPrimitive;

use crate::error::{ErrorKind, SchemaDefinitionError};
use crate::schema::ScalarType;
use crate::value::ScalarValue;

use super::decimal::parse_decimal;
use super::{ParseOutcome, ScalarParser};

/// Integer parser for `Int32` and `Int64` targets with an inclusive range.
///
/// Integral values written with a fraction or exponent (`1000.0`, `1e3`)
/// are accepted. Range violations carry no best attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerParser {
    min: Option<i64>,
    max: Option<i64>,
}

impl IntegerParser {
    pub fn new(
        field: &str,
        min: Option<i64>,
        max: Option<i64>,
    ) -> Result<Self, SchemaDefinitionError> {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(SchemaDefinitionError::InvalidBound {
                    field: field.to_string(),
                    reason: format!("min {lo} exceeds max {hi}"),
                });
            }
        }
        Ok(Self { min, max })
    }

    fn check(&self, n: i64, value: ScalarValue, raw: &str, path: &str) -> ParseOutcome {
        if let Some(min) = self.min.filter(|min| n < *min) {
            return ParseOutcome::failure(
                ErrorKind::NumericTooSmall {
                    min: min.to_string(),
                },
                path,
                raw,
            );
        }
        if let Some(max) = self.max.filter(|max| n > *max) {
            return ParseOutcome::failure(
                ErrorKind::NumericTooLarge {
                    max: max.to_string(),
                },
                path,
                raw,
            );
        }
        ParseOutcome::Success(value)
    }
}

impl ScalarParser for IntegerParser {
    fn parse(&self, target: &ScalarType, raw: &str, path: &str) -> ParseOutcome {
        let text = raw.trim();
        match target {
            ScalarType::Int32 => match parse_integer(text).and_then(|n| i32::try_from(n).ok()) {
                Some(n) => self.check(i64::from(n), ScalarValue::Int32(n), raw, path),
                None => ParseOutcome::failure(ErrorKind::InvalidInt32, path, raw),
            },
            _ => match parse_integer(text) {
                Some(n) => self.check(n, ScalarValue::Int64(n), raw, path),
                None => ParseOutcome::failure(ErrorKind::InvalidInt64, path, raw),
            },
        }
    }
}

/// Plain integers, or decimal and scientific forms with no fractional part.
fn parse_integer(text: &str) -> Option<i64> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(n);
    }
    if !text.contains(['.', 'e', 'E']) {
        return None;
    }
    parse_decimal(text)
        .filter(|d| d.fract().is_zero())
        .and_then(|d| d.to_i64())
}
