//! Extended-JSON conversion for document-store native values.
//!
//! JSON covers only part of the value model, so the kinds it lacks are
//! encoded as single-key tagged objects (`{"$uuid": "..."}` and
//! friends). Round-tripping `Value → JSON → Value` is identity for
//! every finite scalar kind and for arrays/maps composed of such kinds.
//!
//! Single-key maps whose key starts with `$` are reserved for these
//! tags; user data must not use them as ordinary field names.
//!
//! JSON numbers carry no signedness, so an unsigned value within the
//! signed 64-bit range normalizes to `Int` on the way back; values
//! above `i64::MAX` stay `UInt`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use crate::error::Error;
use crate::object_id::ObjectId;
use crate::value::{Map, Value};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Encode a value as extended JSON.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => json!(i),
        Value::UInt(u) => json!(u),
        Value::Float(f) if f.is_finite() => json!(f),
        // JSON has no non-finite numbers; tag them so nothing downstream
        // ever sees a bare NaN/Infinity literal
        Value::Float(f) => json!({ "$double": non_finite_name(*f) }),
        Value::Decimal(d) => json!({ "$decimal": d.to_string() }),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(b) => json!({ "$bytes": hex::encode(b) }),
        Value::Timestamp(t) => json!({ "$datetime": t.to_rfc3339() }),
        Value::Date(d) => json!({ "$date": d.format(DATE_FORMAT).to_string() }),
        Value::Uuid(u) => json!({ "$uuid": u.to_string() }),
        Value::ObjectId(id) => json!({ "$oid": id.to_hex() }),
        Value::Array(values) => serde_json::Value::Array(values.iter().map(to_json).collect()),
        Value::Map(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (key, value) in map.iter() {
                object.insert(key.to_string(), to_json(value));
            }
            serde_json::Value::Object(object)
        }
    }
}

/// Decode an extended-JSON value.
///
/// Fails with [`Error::UnsupportedType`] on unrecognized `$`-tags or
/// malformed tag payloads.
pub fn from_json(json: serde_json::Value) -> Result<Value, Error> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::UInt(u))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(Error::unsupported_type(format!(
                    "JSON number {n} fits no numeric kind"
                )))
            }
        }
        serde_json::Value::String(s) => Ok(Value::String(s)),
        serde_json::Value::Array(values) => Ok(Value::Array(
            values.into_iter().map(from_json).collect::<Result<_, _>>()?,
        )),
        serde_json::Value::Object(object) => {
            if object.len() == 1 {
                if let Some((key, payload)) = object.iter().next() {
                    if let Some(tag) = key.strip_prefix('$') {
                        return from_tagged(tag, payload);
                    }
                }
            }
            let mut map = Map::new();
            for (key, value) in object {
                map.insert(key, from_json(value)?);
            }
            Ok(Value::Map(map))
        }
    }
}

fn from_tagged(tag: &str, payload: &serde_json::Value) -> Result<Value, Error> {
    let text = payload.as_str().ok_or_else(|| {
        Error::unsupported_type(format!("${tag} payload must be a string, got {payload}"))
    })?;
    match tag {
        "double" => match text {
            "NaN" => Ok(Value::Float(f64::NAN)),
            "Infinity" => Ok(Value::Float(f64::INFINITY)),
            "-Infinity" => Ok(Value::Float(f64::NEG_INFINITY)),
            other => Err(Error::unsupported_type(format!(
                "unknown $double payload {other:?}"
            ))),
        },
        "decimal" => Decimal::from_str(text)
            .map(Value::Decimal)
            .map_err(|e| Error::unsupported_type(format!("bad $decimal payload {text:?}: {e}"))),
        "bytes" => hex::decode(text)
            .map(Value::Bytes)
            .map_err(|e| Error::unsupported_type(format!("bad $bytes payload {text:?}: {e}"))),
        "datetime" => DateTime::parse_from_rfc3339(text)
            .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
            .map_err(|e| Error::unsupported_type(format!("bad $datetime payload {text:?}: {e}"))),
        "date" => NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|e| Error::unsupported_type(format!("bad $date payload {text:?}: {e}"))),
        "uuid" => uuid::Uuid::parse_str(text)
            .map(Value::Uuid)
            .map_err(|e| Error::unsupported_type(format!("bad $uuid payload {text:?}: {e}"))),
        "oid" => ObjectId::parse(text).map(Value::ObjectId),
        other => Err(Error::unsupported_type(format!(
            "unrecognized extended-JSON tag ${other}"
        ))),
    }
}

fn non_finite_name(f: f64) -> &'static str {
    if f.is_nan() {
        "NaN"
    } else if f.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}
