use crate::error::{ErrorKind, SchemaDefinitionError};
use crate::schema::ScalarType;
use crate::value::ScalarValue;

use super::{ParseOutcome, ScalarParser};

/// Length-bounded string parser. Lengths count characters of the trimmed
/// text, and the trimmed text is the value.
///
/// A length violation keeps the trimmed string as the best attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringParser {
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl StringParser {
    pub fn new(
        field: &str,
        min_length: Option<usize>,
        max_length: Option<usize>,
    ) -> Result<Self, SchemaDefinitionError> {
        if let (Some(lo), Some(hi)) = (min_length, max_length) {
            if lo > hi {
                return Err(SchemaDefinitionError::InvalidBound {
                    field: field.to_string(),
                    reason: format!("min_length {lo} exceeds max_length {hi}"),
                });
            }
        }
        Ok(Self {
            min_length,
            max_length,
        })
    }
}

impl ScalarParser for StringParser {
    fn parse(&self, _target: &ScalarType, raw: &str, path: &str) -> ParseOutcome {
        let text = raw.trim();
        let len = text.chars().count();
        let value = ScalarValue::String(text.to_string());

        if let Some(min) = self.min_length.filter(|min| len < *min) {
            return ParseOutcome::failure(ErrorKind::StringTooShort { min }, path, raw)
                .with_best_attempt(value);
        }
        if let Some(max) = self.max_length.filter(|max| len > *max) {
            return ParseOutcome::failure(ErrorKind::StringTooLong { max }, path, raw)
                .with_best_attempt(value);
        }
        ParseOutcome::Success(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_apply_to_trimmed_characters() {
        let parser = StringParser::new("code", Some(2), Some(3)).unwrap();
        assert_eq!(
            parser.parse(&ScalarType::String, "  ab  ", "code"),
            ParseOutcome::Success(ScalarValue::String("ab".into()))
        );
        // Three characters, six bytes.
        assert!(parser.parse(&ScalarType::String, "äöü", "code").is_success());
    }

    #[test]
    fn test_violation_keeps_best_attempt() {
        let parser = StringParser::new("name", Some(1), Some(3)).unwrap();

        let short = parser.parse(&ScalarType::String, "   ", "name");
        assert_eq!(
            short.error().unwrap().kind(),
            &ErrorKind::StringTooShort { min: 1 }
        );
        assert_eq!(short.value(), Some(&ScalarValue::String(String::new())));

        let long = parser.parse(&ScalarType::String, "abcd", "name");
        assert_eq!(long.error().unwrap().id(), "StringTooLong");
        assert_eq!(long.value(), Some(&ScalarValue::String("abcd".into())));
    }
}
