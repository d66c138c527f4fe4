//! Parsed value tree produced by the mapper.
//!
//! [`Value`] is the tagged union threaded through the mapper: a scalar, an
//! object ([`Record`]), an array, an embedded document, or [`Value::Absent`]
//! where the document had nothing usable. Results are partial by design, so every accessor returns
//! an `Option`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::scalar::Mailbox;

/// Text format used when a [`ScalarValue::DateTime`] is written out.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A successfully parsed scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarValue {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Decimal(Decimal),
    String(String),
    /// Selected member name of an enum type.
    Option(String),
    Mailbox(Mailbox),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    Guid(Uuid),
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScalarValue::Bool(b) => serializer.serialize_bool(*b),
            ScalarValue::Int32(n) => serializer.serialize_i32(*n),
            ScalarValue::Int64(n) => serializer.serialize_i64(*n),
            ScalarValue::Decimal(d) => serializer.collect_str(d),
            ScalarValue::String(s) | ScalarValue::Option(s) => serializer.serialize_str(s),
            ScalarValue::Mailbox(m) => serializer.collect_str(m),
            ScalarValue::DateTime(dt) => serializer.collect_str(&dt.format(DATE_TIME_FORMAT)),
            ScalarValue::DateTimeOffset(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            ScalarValue::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            ScalarValue::Time(t) => serializer.collect_str(&t.format("%H:%M:%S%.f")),
            ScalarValue::Guid(g) => serializer.collect_str(&g.hyphenated()),
        }
    }
}

/// An object value: the schema type name plus fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    schema: String,
    fields: Vec<(String, Value)>,
}

static ABSENT: Value = Value::Absent;

impl Record {
    pub fn new(schema: &str) -> Self {
        Self {
            schema: schema.to_string(),
            fields: Vec::new(),
        }
    }

    /// Name of the schema type this record was built from.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Sets `name`, replacing an earlier value for the same name.
    pub fn set(&mut self, name: &str, value: Value) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Field value, or [`Value::Absent`] when the name is unknown.
    pub fn get(&self, name: &str) -> &Value {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .unwrap_or(&ABSENT)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A node of the parsed value tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// Missing, null, or discarded because it did not validate.
    #[default]
    Absent,
    Scalar(ScalarValue),
    Object(Record),
    Array(Vec<Value>),
    /// A document parsed out of a string field. Serializes as `source` so
    /// the field stays a string when written back out.
    Embedded { source: String, value: Box<Value> },
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_scalar()? {
            ScalarValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Reads an `Int32`, or an `Int64` that fits.
    pub fn as_i32(&self) -> Option<i32> {
        match self.as_scalar()? {
            ScalarValue::Int32(n) => Some(*n),
            ScalarValue::Int64(n) => i32::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.as_scalar()? {
            ScalarValue::Int32(n) => Some(i64::from(*n)),
            ScalarValue::Int64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self.as_scalar()? {
            ScalarValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Reads a `String` value (not an option name).
    pub fn as_str(&self) -> Option<&str> {
        match self.as_scalar()? {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Reads the selected member name of an option field.
    pub fn as_option(&self) -> Option<&str> {
        match self.as_scalar()? {
            ScalarValue::Option(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mailbox(&self) -> Option<&Mailbox> {
        match self.as_scalar()? {
            ScalarValue::Mailbox(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<NaiveDateTime> {
        match self.as_scalar()? {
            ScalarValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_date_time_offset(&self) -> Option<DateTime<FixedOffset>> {
        match self.as_scalar()? {
            ScalarValue::DateTimeOffset(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self.as_scalar()? {
            ScalarValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self.as_scalar()? {
            ScalarValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_guid(&self) -> Option<Uuid> {
        match self.as_scalar()? {
            ScalarValue::Guid(g) => Some(*g),
            _ => None,
        }
    }

    /// Reads an object, looking through an embedded document.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Object(r) => Some(r),
            Value::Embedded { value, .. } => value.as_record(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            Value::Embedded { value, .. } => value.as_array(),
            _ => None,
        }
    }

    /// Text an embedded document was parsed from.
    pub fn embedded_source(&self) -> Option<&str> {
        match self {
            Value::Embedded { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ScalarValue> for Value {
    fn from(value: ScalarValue) -> Self {
        Value::Scalar(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Object(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Absent => serializer.serialize_none(),
            Value::Scalar(s) => s.serialize(serializer),
            Value::Object(r) => r.serialize(serializer),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Embedded { source, .. } => serializer.serialize_str(source),
        }
    }
}
