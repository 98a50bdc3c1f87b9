mod value;

pub use value::{fields_from_json, FieldMap, SentinelValue, Value, ValueKind};
