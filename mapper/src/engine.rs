//! The recursive mapper.
//!
//! One traversal walks a [`SchemaType`] and a [`DocumentToken`] tree in
//! lockstep. Content problems never abort it: each is recorded as a
//! [`ValidationError`] and the walk moves on to the next field.

use docshape_core::{
    ArrayDirective, ArrayItem, DocumentToken, ErrorKind, FieldDecl, FieldKind, ParseOutcome,
    Placement, Record, ScalarField, SchemaType, ValidationError, Value,
};
use tracing::{debug, trace};

/// Path of `name` under `parent`; the root path is empty.
pub(crate) fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// Error sink threaded through one traversal.
#[derive(Debug, Default)]
pub(crate) struct Mapper {
    errors: Vec<ValidationError>,
}

impl Mapper {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    fn report(&mut self, kind: ErrorKind, path: &str) {
        self.errors.push(ValidationError::new(kind, path));
    }

    /// Absent token: a violation unless optional. Always yields `Absent`.
    fn absent(&mut self, optional: bool, path: &str) -> Value {
        if !optional {
            self.report(ErrorKind::OptionalityViolation, path);
        }
        Value::Absent
    }

    pub(crate) fn map_object<T: DocumentToken>(
        &mut self,
        schema: &SchemaType,
        token: &T,
        path: &str,
        optional: bool,
    ) -> Value {
        if token.is_absent() {
            return self.absent(optional, path);
        }
        if !token.is_object() {
            self.report(ErrorKind::NotAnObject, path);
            return Value::Absent;
        }

        let mut record = Record::new(schema.name());
        for field in schema.fields() {
            let name = field.external_name();
            let field_path = child_path(path, name);
            trace!(path = %field_path, category = ?field.category(), "Mapping field");

            let value = match field.kind() {
                FieldKind::Scalar(scalar) => match self.field_token(token, field, &field_path) {
                    Some(child) => {
                        self.map_scalar(scalar, &child, &field_path, field.is_optional())
                    }
                    None => Value::Absent,
                },
                FieldKind::Object(nested) => {
                    self.map_object(nested, &token.child(name), &field_path, field.is_optional())
                }
                FieldKind::Embedded(nested) => {
                    self.map_embedded(nested, &token.child(name), &field_path, field.is_optional())
                }
                FieldKind::Array { item, directive } => {
                    self.map_array(item, directive, token, name, &field_path)
                }
            };
            record.set(name, value);
        }
        Value::Object(record)
    }

    /// Token for a scalar field, honoring its placement. A format that
    /// cannot provide the placement records an error and yields `None`.
    fn field_token<T: DocumentToken>(
        &mut self,
        parent: &T,
        field: &FieldDecl,
        path: &str,
    ) -> Option<T> {
        let name = field.external_name();
        match field.placement() {
            Placement::Child => Some(parent.child(name)),
            Placement::Attribute => match parent.attribute(name) {
                Ok(token) => Some(token),
                Err(err) => {
                    self.report(err.into(), path);
                    None
                }
            },
        }
    }

    fn map_array<T: DocumentToken>(
        &mut self,
        item: &ArrayItem,
        directive: &ArrayDirective,
        parent: &T,
        name: &str,
        path: &str,
    ) -> Value {
        let errors_before = self.errors.len();

        if !parent.is_array_like(name) {
            if parent.child(name).is_absent() {
                return self.absent(directive.optional, path);
            }
            self.report(ErrorKind::NotAnArray, path);
            return Value::Absent;
        }

        let tokens = parent.children(name);
        if tokens.len() < directive.min_length {
            self.report(
                ErrorKind::ArrayTooShort {
                    min: directive.min_length,
                    actual: tokens.len(),
                },
                path,
            );
        }
        if let Some(max) = directive.max_length.filter(|max| tokens.len() > *max) {
            self.report(
                ErrorKind::ArrayTooLong {
                    max,
                    actual: tokens.len(),
                },
                path,
            );
        }

        let items: Vec<Value> = tokens
            .iter()
            .enumerate()
            .map(|(index, token)| {
                let item_path = format!("{path}[{index}]");
                match item {
                    ArrayItem::Scalar(scalar) => {
                        self.map_scalar(scalar, token, &item_path, directive.items_optional)
                    }
                    ArrayItem::Object(schema) => {
                        self.map_object(schema, token, &item_path, directive.items_optional)
                    }
                }
            })
            .collect();

        let array_errors = self.errors.len() - errors_before;
        if array_errors > 0 {
            debug!(path, errors = array_errors, items = items.len(), "Discarding invalid array");
            return Value::Absent;
        }
        Value::Array(items)
    }

    fn map_scalar<T: DocumentToken>(
        &mut self,
        scalar: &ScalarField,
        token: &T,
        path: &str,
        optional: bool,
    ) -> Value {
        if token.is_absent() {
            return self.absent(optional, path);
        }
        let Some(raw) = token.as_text().filter(|_| token.is_primitive()) else {
            self.report(ErrorKind::NotPrimitive, path);
            return Value::Absent;
        };

        match scalar.parser().parse(scalar.target(), &raw, path) {
            ParseOutcome::Success(value) => Value::Scalar(value),
            ParseOutcome::Failure {
                error,
                best_attempt,
            } => {
                self.errors.push(error);
                best_attempt.map_or(Value::Absent, Value::Scalar)
            }
        }
    }

    /// A field holding a complete document of `schema` as a string. The
    /// nested document is parsed on its own and its errors are re-rooted
    /// under `path`. The result keeps the source text for serialization.
    fn map_embedded<T: DocumentToken>(
        &mut self,
        schema: &SchemaType,
        token: &T,
        path: &str,
        optional: bool,
    ) -> Value {
        if token.is_absent() {
            return self.absent(optional, path);
        }
        let Some(text) = token.as_text().filter(|_| token.is_primitive()) else {
            self.report(ErrorKind::NotPrimitive, path);
            return Value::Absent;
        };

        trace!(path, schema = schema.name(), "Parsing embedded document");
        let nested = crate::parse(schema, &text);
        self.errors.extend(
            nested
                .errors
                .into_iter()
                .map(|error| error.with_path_prefix(path)),
        );
        if nested.value.is_absent() {
            return Value::Absent;
        }
        Value::Embedded {
            source: text,
            value: Box::new(nested.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("", "name"), "name");
        assert_eq!(child_path("user", "name"), "user.name");
        assert_eq!(child_path("lines[2]", "sku"), "lines[2].sku");
    }
}
