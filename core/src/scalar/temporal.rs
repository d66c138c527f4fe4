use chrono::format::{Fixed, Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::error::{ErrorKind, SchemaDefinitionError};
use crate::schema::ScalarType;
use crate::value::ScalarValue;

use super::{ParseOutcome, ScalarParser};

const LOOSE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];
const LOOSE_OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];
const LOOSE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
const LOOSE_TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Parses the date/time family.
///
/// Without a format, input is read loosely: RFC 3339, ISO-8601 with a `T`
/// or space separator and optional fraction, date-only, and US-invariant
/// `MM/DD/YYYY`. A naive date-time read for a `DateTimeOffset` target is
/// taken as UTC; an offset read for a `DateTime` target is converted to UTC.
///
/// With a format, input must match the chrono `strftime` pattern exactly.
#[derive(Debug, Clone, Default)]
pub struct TemporalParser {
    format: Option<String>,
}

impl TemporalParser {
    /// # Errors
    ///
    /// [`SchemaDefinitionError::InvalidFormat`] when `format` is empty, not
    /// a valid `strftime` pattern, or has no offset for a `DateTimeOffset`
    /// target.
    pub fn new(
        field: &str,
        target: &ScalarType,
        format: Option<&str>,
    ) -> Result<Self, SchemaDefinitionError> {
        if let Some(fmt) = format {
            let malformed =
                fmt.is_empty() || StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error));
            let missing_offset =
                matches!(target, ScalarType::DateTimeOffset) && !has_offset(fmt);
            if malformed || missing_offset {
                return Err(SchemaDefinitionError::InvalidFormat {
                    field: field.to_string(),
                    format: fmt.to_string(),
                });
            }
        }
        Ok(Self {
            format: format.map(String::from),
        })
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }
}

impl ScalarParser for TemporalParser {
    fn parse(&self, target: &ScalarType, raw: &str, path: &str) -> ParseOutcome {
        let text = raw.trim();
        let parsed = match &self.format {
            Some(fmt) => parse_exact(target, text, fmt),
            None => parse_loose(target, text),
        };
        match (parsed, &self.format) {
            (Some(value), _) => ParseOutcome::Success(value),
            (None, Some(fmt)) => ParseOutcome::failure(
                ErrorKind::InvalidExactTimestamp {
                    target: target.to_string(),
                    format: fmt.clone(),
                },
                path,
                raw,
            ),
            (None, None) => ParseOutcome::failure(
                ErrorKind::InvalidLooseTimestamp {
                    target: target.to_string(),
                },
                path,
                raw,
            ),
        }
    }
}

/// Whether `fmt` reads a UTC offset.
fn has_offset(fmt: &str) -> bool {
    // `%#z` parses into a private item, so it is matched textually.
    fmt.contains("%#z")
        || StrftimeItems::new(fmt).any(|item| {
            matches!(
                item,
                Item::Fixed(
                    Fixed::TimezoneOffset
                        | Fixed::TimezoneOffsetColon
                        | Fixed::TimezoneOffsetDoubleColon
                        | Fixed::TimezoneOffsetTripleColon
                        | Fixed::TimezoneOffsetColonZ
                        | Fixed::TimezoneOffsetZ
                        | Fixed::RFC2822
                        | Fixed::RFC3339
                )
            )
        })
}

fn parse_exact(target: &ScalarType, text: &str, fmt: &str) -> Option<ScalarValue> {
    match target {
        ScalarType::DateTime => NaiveDateTime::parse_from_str(text, fmt)
            .ok()
            .map(ScalarValue::DateTime),
        ScalarType::DateTimeOffset => DateTime::parse_from_str(text, fmt)
            .ok()
            .map(ScalarValue::DateTimeOffset),
        ScalarType::Date => NaiveDate::parse_from_str(text, fmt)
            .ok()
            .map(ScalarValue::Date),
        ScalarType::Time => NaiveTime::parse_from_str(text, fmt)
            .ok()
            .map(ScalarValue::Time),
        _ => None,
    }
}

fn parse_loose(target: &ScalarType, text: &str) -> Option<ScalarValue> {
    match target {
        ScalarType::DateTime => match loose_offset(text) {
            Some(dt) => Some(ScalarValue::DateTime(dt.naive_utc())),
            None => loose_naive(text).map(ScalarValue::DateTime),
        },
        ScalarType::DateTimeOffset => loose_offset(text)
            .or_else(|| {
                let utc = FixedOffset::east_opt(0)?;
                Some(utc.from_utc_datetime(&loose_naive(text)?))
            })
            .map(ScalarValue::DateTimeOffset),
        ScalarType::Date => LOOSE_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
            .or_else(|| loose_naive(text).map(|dt| dt.date()))
            .map(ScalarValue::Date),
        ScalarType::Time => LOOSE_TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
            .map(ScalarValue::Time),
        _ => None,
    }
}

fn loose_offset(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text).ok().or_else(|| {
        LOOSE_OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
    })
}

fn loose_naive(text: &str) -> Option<NaiveDateTime> {
    LOOSE_DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            LOOSE_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
