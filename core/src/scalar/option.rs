use crate::error::ErrorKind;
use crate::schema::ScalarType;
use crate::value::ScalarValue;

use super::{ParseOutcome, ScalarParser};

/// Exact, case-sensitive match against the target enum's member names,
/// never accepting the sentinel member.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionParser;

impl ScalarParser for OptionParser {
    fn parse(&self, target: &ScalarType, raw: &str, path: &str) -> ParseOutcome {
        let ScalarType::Enum(enum_type) = target else {
            return ParseOutcome::failure(
                ErrorKind::InvalidOption {
                    allowed: Vec::new(),
                },
                path,
                raw,
            );
        };

        if enum_type.is_allowed(raw) {
            return ParseOutcome::Success(ScalarValue::Option(raw.to_string()));
        }
        let allowed = enum_type.allowed().into_iter().map(String::from).collect();
        ParseOutcome::failure(ErrorKind::InvalidOption { allowed }, path, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EnumType;

    fn color() -> ScalarType {
        ScalarType::Enum(EnumType::new("Color", ["Undefined", "Red", "Green"]))
    }

    #[test]
    fn test_matches_member_names_exactly() {
        assert_eq!(
            OptionParser.parse(&color(), "Green", "c"),
            ParseOutcome::Success(ScalarValue::Option("Green".into()))
        );
        assert!(!OptionParser.parse(&color(), "green", "c").is_success());
        assert!(!OptionParser.parse(&color(), " Red", "c").is_success());
        assert!(!OptionParser.parse(&color(), "Red ", "c").is_success());
    }

    #[test]
    fn test_sentinel_is_rejected_with_allowed_list() {
        let outcome = OptionParser.parse(&color(), "Undefined", "c");
        assert_eq!(
            outcome.error().unwrap().kind(),
            &ErrorKind::InvalidOption {
                allowed: vec!["Red".into(), "Green".into()]
            }
        );
    }

    #[test]
    fn test_non_enum_target_fails() {
        let outcome = OptionParser.parse(&ScalarType::String, "Red", "c");
        assert_eq!(outcome.error().unwrap().id(), "InvalidOption");
    }
}
