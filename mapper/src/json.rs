//! JSON document adapter over `serde_json`.

use docshape_core::{DocumentFormat, DocumentToken, TokenError};
use serde_json::Value as JsonValue;

/// Tokenizes JSON text. Numbers keep their exact source digits.
pub fn tokenize(text: &str) -> Result<JsonValue, serde_json::Error> {
    serde_json::from_str(text)
}

/// A node of a parsed JSON tree, or an absent node.
#[derive(Debug, Clone, Copy)]
pub struct JsonToken<'a> {
    node: Option<&'a JsonValue>,
}

impl<'a> JsonToken<'a> {
    pub fn new(node: &'a JsonValue) -> Self {
        Self { node: Some(node) }
    }

    fn absent() -> Self {
        Self { node: None }
    }
}

impl DocumentToken for JsonToken<'_> {
    fn is_absent(&self) -> bool {
        matches!(self.node, None | Some(JsonValue::Null))
    }

    fn is_primitive(&self) -> bool {
        matches!(
            self.node,
            Some(JsonValue::String(_) | JsonValue::Number(_) | JsonValue::Bool(_))
        )
    }

    fn is_object(&self) -> bool {
        matches!(self.node, Some(JsonValue::Object(_)))
    }

    fn is_array_like(&self, name: &str) -> bool {
        matches!(self.child(name).node, Some(JsonValue::Array(_)))
    }

    fn child(&self, name: &str) -> Self {
        match self.node {
            Some(JsonValue::Object(map)) => map.get(name).map_or_else(Self::absent, Self::new),
            _ => Self::absent(),
        }
    }

    fn children(&self, name: &str) -> Vec<Self> {
        match self.child(name).node {
            Some(JsonValue::Array(items)) => items.iter().map(Self::new).collect(),
            _ => Vec::new(),
        }
    }

    fn attribute(&self, _name: &str) -> Result<Self, TokenError> {
        Err(TokenError::UnsupportedOperation {
            operation: "attribute access",
            format: DocumentFormat::Json,
        })
    }

    fn as_text(&self) -> Option<String> {
        match self.node? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
