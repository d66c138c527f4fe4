use rust_decimal::Decimal;

use crate::error::{ErrorKind, SchemaDefinitionError};
use crate::schema::ScalarType;
use crate::value::ScalarValue;

use super::{ParseOutcome, ScalarParser};

#[derive(Debug, Clone)]
struct Bound {
    text: String,
    value: Decimal,
}

/// Fixed-point decimal parser.
///
/// Digit bounds count the digits after the point in the trimmed input, not
/// in the parsed value: `10` has zero decimal digits and `10.0` has one.
#[derive(Debug, Clone, Default)]
pub struct DecimalParser {
    min: Option<Bound>,
    max: Option<Bound>,
    min_digits: Option<u32>,
    max_digits: Option<u32>,
}

impl DecimalParser {
    pub fn new(
        field: &str,
        min: Option<&str>,
        max: Option<&str>,
        min_digits: Option<u32>,
        max_digits: Option<u32>,
    ) -> Result<Self, SchemaDefinitionError> {
        let bound = |label: &str, text: &str| {
            parse_decimal(text.trim())
                .map(|value| Bound {
                    text: text.trim().to_string(),
                    value,
                })
                .ok_or_else(|| SchemaDefinitionError::InvalidBound {
                    field: field.to_string(),
                    reason: format!("{label} '{text}' is not a decimal number"),
                })
        };
        let min = min.map(|text| bound("min", text)).transpose()?;
        let max = max.map(|text| bound("max", text)).transpose()?;

        if let (Some(lo), Some(hi)) = (&min, &max) {
            if lo.value > hi.value {
                return Err(SchemaDefinitionError::InvalidBound {
                    field: field.to_string(),
                    reason: format!("min {} exceeds max {}", lo.text, hi.text),
                });
            }
        }
        if let (Some(lo), Some(hi)) = (min_digits, max_digits) {
            if lo > hi {
                return Err(SchemaDefinitionError::InvalidBound {
                    field: field.to_string(),
                    reason: format!("min_decimal_digits {lo} exceeds max_decimal_digits {hi}"),
                });
            }
        }

        Ok(Self {
            min,
            max,
            min_digits,
            max_digits,
        })
    }
}

impl ScalarParser for DecimalParser {
    fn parse(&self, _target: &ScalarType, raw: &str, path: &str) -> ParseOutcome {
        let text = raw.trim();
        let Some(value) = parse_decimal(text) else {
            return ParseOutcome::failure(ErrorKind::InvalidDecimal, path, raw);
        };

        if let Some(min) = self.min.as_ref().filter(|b| value < b.value) {
            return ParseOutcome::failure(
                ErrorKind::NumericTooSmall {
                    min: min.text.clone(),
                },
                path,
                raw,
            );
        }
        if let Some(max) = self.max.as_ref().filter(|b| value > b.value) {
            return ParseOutcome::failure(
                ErrorKind::NumericTooLarge {
                    max: max.text.clone(),
                },
                path,
                raw,
            );
        }

        let digits = decimal_digits(text);
        if let Some(min) = self.min_digits.filter(|min| digits < *min) {
            return ParseOutcome::failure(ErrorKind::TooFewDecimalDigits { min }, path, raw);
        }
        if let Some(max) = self.max_digits.filter(|max| digits > *max) {
            return ParseOutcome::failure(ErrorKind::TooManyDecimalDigits { max }, path, raw);
        }

        ParseOutcome::Success(ScalarValue::Decimal(value))
    }
}

/// Parses plain or scientific notation without rounding. Grouping
/// separators are rejected.
pub(super) fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.is_empty() || text.contains(['_', ',']) {
        return None;
    }
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(text).ok()
    } else {
        Decimal::from_str_exact(text).ok()
    }
}

/// Digits after the decimal point of the mantissa, as written.
fn decimal_digits(text: &str) -> u32 {
    let mantissa = text.split(['e', 'E']).next().unwrap_or_default();
    mantissa
        .split_once('.')
        .map_or(0, |(_, frac)| frac.chars().filter(char::is_ascii_digit).count() as u32)
}
