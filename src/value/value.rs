use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::{invalid_argument, StoreResult};
use crate::model::Timestamp;

/// Field mapping of a single document.
pub type FieldMap = BTreeMap<String, Value>;

/// Dynamically typed field value.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    kind: ValueKind,
}

/// Write-time placeholder markers.
///
/// Sentinels are only meaningful inside a pending write batch; committed
/// collection state never contains them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SentinelValue {
    /// Removes the targeted field from an existing document.
    DeleteField,
    /// Resolves to the commit timestamp captured when the write group is
    /// applied.
    ServerTimestamp,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueKind {
    Null,
    Integer(i64),
    Double(f64),
    Boolean(bool),
    String(String),
    Timestamp(Timestamp),
    Sentinel(SentinelValue),
}

impl Value {
    pub fn null() -> Self {
        Self {
            kind: ValueKind::Null,
        }
    }

    pub fn from_integer(value: i64) -> Self {
        Self {
            kind: ValueKind::Integer(value),
        }
    }

    pub fn from_double(value: f64) -> Self {
        Self {
            kind: ValueKind::Double(value),
        }
    }

    pub fn from_bool(value: bool) -> Self {
        Self {
            kind: ValueKind::Boolean(value),
        }
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::String(value.into()),
        }
    }

    pub fn from_timestamp(value: Timestamp) -> Self {
        Self {
            kind: ValueKind::Timestamp(value),
        }
    }

    /// Returns the sentinel that deletes the targeted field during an update.
    pub fn delete_field() -> Self {
        Self {
            kind: ValueKind::Sentinel(SentinelValue::DeleteField),
        }
    }

    /// Returns the sentinel that resolves to the apply-time timestamp.
    pub fn server_timestamp() -> Self {
        Self {
            kind: ValueKind::Sentinel(SentinelValue::ServerTimestamp),
        }
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self.kind, ValueKind::Sentinel(_))
    }

    /// Total order across heterogeneous values.
    ///
    /// Values are ranked by type first, then by natural order within the
    /// type: null < integer < timestamp < boolean < string < double.
    /// Sentinels rank below every committed kind and compare equal only
    /// among themselves. Both filtering and sorting use this order, so a
    /// field whose type varies across documents still sorts deterministically.
    pub fn compare(&self, other: &Value) -> Ordering {
        let left_rank = type_rank(&self.kind);
        let right_rank = type_rank(&other.kind);
        if left_rank != right_rank {
            return left_rank.cmp(&right_rank);
        }

        match (&self.kind, &other.kind) {
            (ValueKind::Null, ValueKind::Null) => Ordering::Equal,
            (ValueKind::Integer(a), ValueKind::Integer(b)) => a.cmp(b),
            (ValueKind::Timestamp(a), ValueKind::Timestamp(b)) => a.cmp(b),
            (ValueKind::Boolean(a), ValueKind::Boolean(b)) => a.cmp(b),
            (ValueKind::String(a), ValueKind::String(b)) => a.cmp(b),
            (ValueKind::Double(a), ValueKind::Double(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (ValueKind::Sentinel(_), ValueKind::Sentinel(_)) => Ordering::Equal,
            _ => unreachable!("equal type ranks imply equal kinds"),
        }
    }

    /// Converts a JSON value into a field value.
    ///
    /// Integral numbers map to integers, other numbers to doubles.
    /// Timestamps are written as `{"seconds": .., "nanos": ..}` objects.
    pub fn from_json(json: &serde_json::Value) -> StoreResult<Self> {
        match json {
            serde_json::Value::Null => Ok(Value::null()),
            serde_json::Value::Bool(value) => Ok(Value::from_bool(*value)),
            serde_json::Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    Ok(Value::from_integer(value))
                } else if let Some(value) = number.as_f64() {
                    Ok(Value::from_double(value))
                } else {
                    Err(invalid_argument(format!(
                        "Unsupported JSON number: {number}"
                    )))
                }
            }
            serde_json::Value::String(value) => Ok(Value::from_string(value.clone())),
            serde_json::Value::Object(map) => {
                let (seconds, nanos) = match (map.get("seconds"), map.get("nanos")) {
                    (Some(seconds), Some(nanos)) if map.len() == 2 => (seconds, nanos),
                    _ => {
                        return Err(invalid_argument(
                            "JSON objects are only supported as {\"seconds\", \"nanos\"} timestamps",
                        ))
                    }
                };
                let seconds = seconds
                    .as_i64()
                    .ok_or_else(|| invalid_argument("Timestamp seconds must be an integer"))?;
                let nanos = nanos
                    .as_i64()
                    .ok_or_else(|| invalid_argument("Timestamp nanos must be an integer"))?;
                Ok(Value::from_timestamp(Timestamp::new(seconds, nanos as i32)))
            }
            serde_json::Value::Array(_) => {
                Err(invalid_argument("JSON arrays are not supported field values"))
            }
        }
    }

    /// Renders this value as JSON. Sentinels have no committed representation
    /// and are rejected.
    pub fn to_json(&self) -> StoreResult<serde_json::Value> {
        match &self.kind {
            ValueKind::Null => Ok(serde_json::Value::Null),
            ValueKind::Integer(value) => Ok(serde_json::json!(value)),
            ValueKind::Double(value) => Ok(serde_json::json!(value)),
            ValueKind::Boolean(value) => Ok(serde_json::json!(value)),
            ValueKind::String(value) => Ok(serde_json::json!(value)),
            ValueKind::Timestamp(value) => Ok(serde_json::json!({
                "seconds": value.seconds,
                "nanos": value.nanos,
            })),
            ValueKind::Sentinel(_) => Err(invalid_argument(
                "Sentinel values cannot be serialized",
            )),
        }
    }
}

fn type_rank(kind: &ValueKind) -> i8 {
    match kind {
        ValueKind::Sentinel(_) => -1,
        ValueKind::Null => 0,
        ValueKind::Integer(_) => 1,
        ValueKind::Timestamp(_) => 2,
        ValueKind::Boolean(_) => 3,
        ValueKind::String(_) => 4,
        ValueKind::Double(_) => 5,
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::from_integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::from_double(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::from_bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::from_string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::from_string(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::from_timestamp(value)
    }
}

/// Builds a field map from a JSON object literal.
pub fn fields_from_json(json: serde_json::Value) -> StoreResult<FieldMap> {
    let map = match json {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(invalid_argument(format!(
                "Document fields must be a JSON object, got {other}"
            )))
        }
    };
    let mut fields = FieldMap::new();
    for (key, value) in map {
        fields.insert(key, Value::from_json(&value)?);
    }
    Ok(fields)
}
