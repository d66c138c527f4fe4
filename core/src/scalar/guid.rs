use std::fmt;

use uuid::Uuid;

use crate::error::{ErrorKind, SchemaDefinitionError};
use crate::schema::ScalarType;
use crate::value::ScalarValue;

use super::{ParseOutcome, ScalarParser};

const HYPHENATED_LEN: usize = 36;
const SIMPLE_LEN: usize = 32;

/// Exact GUID layouts, named by their conventional specifier letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuidFormat {
    /// 32 hex digits: `00000000000000000000000000000000`
    N,
    /// Hyphenated: `00000000-0000-0000-0000-000000000000`
    D,
    /// Braced: `{00000000-0000-0000-0000-000000000000}`
    B,
    /// Parenthesized: `(00000000-0000-0000-0000-000000000000)`
    P,
}

impl GuidFormat {
    /// Reads a specifier letter, case-insensitively.
    pub fn from_specifier(spec: &str) -> Option<Self> {
        match spec {
            "N" | "n" => Some(Self::N),
            "D" | "d" => Some(Self::D),
            "B" | "b" => Some(Self::B),
            "P" | "p" => Some(Self::P),
            _ => None,
        }
    }

    fn parse(self, text: &str) -> Option<Uuid> {
        let hyphenated = match self {
            Self::N => {
                return (text.len() == SIMPLE_LEN)
                    .then(|| Uuid::parse_str(text).ok())
                    .flatten();
            }
            Self::D => text,
            Self::B => text.strip_prefix('{')?.strip_suffix('}')?,
            Self::P => text.strip_prefix('(')?.strip_suffix(')')?,
        };
        if hyphenated.len() != HYPHENATED_LEN {
            return None;
        }
        Uuid::parse_str(hyphenated).ok()
    }
}

impl fmt::Display for GuidFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::N => "N",
            Self::D => "D",
            Self::B => "B",
            Self::P => "P",
        };
        f.write_str(letter)
    }
}

/// Parses GUIDs. Loose parsing accepts every [`GuidFormat`] layout plus a
/// `urn:uuid:` prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuidParser {
    format: Option<GuidFormat>,
}

impl GuidParser {
    /// # Errors
    ///
    /// [`SchemaDefinitionError::InvalidFormat`] for an unknown specifier.
    pub fn new(field: &str, format: Option<&str>) -> Result<Self, SchemaDefinitionError> {
        let format = match format {
            None => None,
            Some(spec) => Some(GuidFormat::from_specifier(spec).ok_or_else(|| {
                SchemaDefinitionError::InvalidFormat {
                    field: field.to_string(),
                    format: spec.to_string(),
                }
            })?),
        };
        Ok(Self { format })
    }

    pub fn format(&self) -> Option<GuidFormat> {
        self.format
    }
}

fn parse_loose(text: &str) -> Option<Uuid> {
    if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        return GuidFormat::D.parse(inner);
    }
    Uuid::parse_str(text).ok()
}

impl ScalarParser for GuidParser {
    fn parse(&self, _target: &ScalarType, raw: &str, path: &str) -> ParseOutcome {
        let text = raw.trim();
        match self.format {
            Some(format) => match format.parse(text) {
                Some(guid) => ParseOutcome::Success(ScalarValue::Guid(guid)),
                None => ParseOutcome::failure(
                    ErrorKind::InvalidExactGuid {
                        format: format.to_string(),
                    },
                    path,
                    raw,
                ),
            },
            None => match parse_loose(text) {
                Some(guid) => ParseOutcome::Success(ScalarValue::Guid(guid)),
                None => ParseOutcome::failure(ErrorKind::InvalidLooseGuid, path, raw),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HYPHENATED: &str = "6f9619ff-8b86-d011-b42d-00c04fc964ff";

    fn expected() -> ParseOutcome {
        ParseOutcome::Success(ScalarValue::Guid(Uuid::parse_str(HYPHENATED).unwrap()))
    }

    #[test]
    fn test_loose_accepts_every_layout() {
        let parser = GuidParser::new("id", None).unwrap();
        for input in [
            "6f9619ff8b86d011b42d00c04fc964ff",
            HYPHENATED,
            "{6F9619FF-8B86-D011-B42D-00C04FC964FF}",
            "(6f9619ff-8b86-d011-b42d-00c04fc964ff)",
            "urn:uuid:6f9619ff-8b86-d011-b42d-00c04fc964ff",
        ] {
            assert_eq!(parser.parse(&ScalarType::Guid, input, "id"), expected(), "{input}");
        }
        let failed = parser.parse(&ScalarType::Guid, "not-a-guid", "id");
        assert_eq!(failed.error().unwrap().id(), "InvalidLooseGuid");
    }

    #[test]
    fn test_exact_format_only_accepts_its_layout() {
        let braced = GuidParser::new("id", Some("B")).unwrap();
        assert_eq!(
            braced.parse(&ScalarType::Guid, "{6f9619ff-8b86-d011-b42d-00c04fc964ff}", "id"),
            expected()
        );
        let failed = braced.parse(&ScalarType::Guid, HYPHENATED, "id");
        assert_eq!(
            failed.error().unwrap().kind(),
            &ErrorKind::InvalidExactGuid { format: "B".into() }
        );

        let simple = GuidParser::new("id", Some("n")).unwrap();
        assert_eq!(simple.format(), Some(GuidFormat::N));
        assert!(!simple.parse(&ScalarType::Guid, HYPHENATED, "id").is_success());
    }

    #[test]
    fn test_unknown_specifier_fails_construction() {
        assert_eq!(
            GuidParser::new("id", Some("X")).unwrap_err(),
            SchemaDefinitionError::InvalidFormat {
                field: "id".into(),
                format: "X".into()
            }
        );
    }
}
