//! Runtime value types shared by both execution paths.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::object_id::ObjectId;

/// A runtime value that can appear anywhere in a query: as a filter
/// operand, an update argument, a bind parameter, or a result field.
///
/// This enum is the single representation every layer operates over;
/// native driver types are converted at the connection boundary, never
/// passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit unsigned integer.
    UInt(u64),
    /// 64-bit floating point.
    Float(f64),
    /// Arbitrary-precision decimal.
    Decimal(Decimal),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Timestamp with UTC offset.
    Timestamp(DateTime<Utc>),
    /// Calendar date without a time component.
    Date(NaiveDate),
    /// UUID.
    Uuid(Uuid),
    /// 12-byte document id.
    ObjectId(ObjectId),
    /// Ordered list of values.
    Array(Vec<Value>),
    /// Key-ordered map of values (insertion order preserved, keys unique).
    Map(Map),
}

/// Discriminant tag for a [`Value`], used in error messages and lowering
/// decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    Decimal,
    String,
    Bytes,
    Timestamp,
    Date,
    Uuid,
    ObjectId,
    Array,
    Map,
}

impl ValueKind {
    /// Lowercase name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Float => "float",
            ValueKind::Decimal => "decimal",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Date => "date",
            ValueKind::Uuid => "uuid",
            ValueKind::ObjectId => "object id",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
        }
    }
}

impl Value {
    /// Get the kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Float(_) => ValueKind::Float,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Date(_) => ValueKind::Date,
            Value::Uuid(_) => ValueKind::Uuid,
            Value::ObjectId(_) => ValueKind::ObjectId,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a numeric kind (int, uint, float, decimal).
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::UInt(_) | Value::Float(_) | Value::Decimal(_)
        )
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as bytes reference.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get as array slice.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Try to get as map reference.
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert to a signed 64-bit integer.
    ///
    /// Fails with [`Error::UnsupportedType`] when the value is not an
    /// integer kind or when an unsigned value has no exact signed
    /// equivalent; precision is never silently lost.
    pub fn try_as_i64(&self) -> Result<i64, Error> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::UInt(u) => i64::try_from(*u).map_err(|_| {
                Error::unsupported_type(format!("unsigned value {u} exceeds the signed range"))
            }),
            other => Err(Error::unsupported_type(format!(
                "cannot read {} as a signed integer",
                other.kind().name()
            ))),
        }
    }

    /// Convert to an unsigned 64-bit integer, failing on negative or
    /// non-integer values.
    pub fn try_as_u64(&self) -> Result<u64, Error> {
        match self {
            Value::UInt(u) => Ok(*u),
            Value::Int(i) => u64::try_from(*i).map_err(|_| {
                Error::unsupported_type(format!("negative value {i} has no unsigned equivalent"))
            }),
            other => Err(Error::unsupported_type(format!(
                "cannot read {} as an unsigned integer",
                other.kind().name()
            ))),
        }
    }

    /// Convert to a 64-bit float.
    ///
    /// Integer values convert only when they are exactly representable
    /// as a double; decimals convert only when the round-trip is exact.
    pub fn try_as_f64(&self) -> Result<f64, Error> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => {
                let f = *i as f64;
                if f as i64 == *i {
                    Ok(f)
                } else {
                    Err(Error::unsupported_type(format!(
                        "integer {i} is not exactly representable as a double"
                    )))
                }
            }
            Value::UInt(u) => {
                let f = *u as f64;
                if f as u64 == *u {
                    Ok(f)
                } else {
                    Err(Error::unsupported_type(format!(
                        "integer {u} is not exactly representable as a double"
                    )))
                }
            }
            Value::Decimal(d) => {
                use rust_decimal::prelude::ToPrimitive;
                let f = d.to_f64().ok_or_else(|| {
                    Error::unsupported_type(format!("decimal {d} cannot be read as a double"))
                })?;
                match Decimal::from_f64_retain(f) {
                    Some(back) if back == *d => Ok(f),
                    _ => Err(Error::unsupported_type(format!(
                        "decimal {d} is not exactly representable as a double"
                    ))),
                }
            }
            other => Err(Error::unsupported_type(format!(
                "cannot read {} as a double",
                other.kind().name()
            ))),
        }
    }
}

/// An insertion-ordered map with unique string keys.
///
/// Backed by a plain entry vector; inserting an existing key replaces
/// the value in place, keeping the key's original position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Map {
    entries: Vec<(String, Value)>,
}

impl Map {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any existing entry for the same key in
    /// place. Returns the replaced value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => Some(std::mem::replace(&mut entry.1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Get a mutable value by key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Remove a value by key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Consume the map into its entry vector.
    pub fn into_entries(self) -> Vec<(String, Value)> {
        self.entries
    }
}

impl From<Vec<(String, Value)>> for Map {
    fn from(entries: Vec<(String, Value)>) -> Self {
        entries.into_iter().collect()
    }
}

impl FromIterator<(String, Value)> for Map {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut map = Map::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// Conversion implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::ObjectId(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(value) => value.into(),
            None => Value::Null,
        }
    }
}
