use crate::error::ErrorKind;
use crate::schema::ScalarType;
use crate::value::ScalarValue;

use super::{ParseOutcome, ScalarParser};

/// Accepts `true`/`false`/`1`/`0`, trimmed and case-insensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanParser;

impl ScalarParser for BooleanParser {
    fn parse(&self, _target: &ScalarType, raw: &str, path: &str) -> ParseOutcome {
        let text = raw.trim();
        if text.eq_ignore_ascii_case("true") || text == "1" {
            ParseOutcome::Success(ScalarValue::Bool(true))
        } else if text.eq_ignore_ascii_case("false") || text == "0" {
            ParseOutcome::Success(ScalarValue::Bool(false))
        } else {
            ParseOutcome::failure(ErrorKind::InvalidBoolean, path, raw)
        }
    }
}
