//! Record <-> flat-mapping projection.
//!
//! "Safe" fields ride through the text format as native YAML scalars and
//! keep their type; everything else is stringified on the way out and
//! re-parsed through the record's own coercion on the way back.

use crate::codec::{scalar_to_string, FlatRecord};
use medit_core::fields::{FieldType, FieldValue};
use medit_core::record::Record;
use serde_yaml::Value;
use std::collections::BTreeSet;

/// Requested field subset; `None` edits every field.
pub type FieldFilter = Option<BTreeSet<String>>;

/// Whether `value` can be trusted as-is for the field `key`: the declared
/// type must be one of the safe set and the YAML runtime type must match
/// it exactly. An integer-shaped number in a float field is not safe; its
/// type would silently change.
pub fn is_safe(record: &dyn Record, key: &str, value: &Value) -> bool {
    match record.declared_type(key) {
        Some(FieldType::Int) => matches!(value, Value::Number(n) if n.is_i64() || n.is_u64()),
        Some(FieldType::Float) => matches!(value, Value::Number(n) if n.is_f64()),
        Some(FieldType::Bool) => matches!(value, Value::Bool(_)),
        _ => false,
    }
}

/// Project a record to a flat string-keyed mapping ready for the codec.
/// `fields`, when given, filters the keys; the caller is responsible for
/// keeping the reference field in the filter.
pub fn flatten(record: &dyn Record, fields: &FieldFilter) -> FlatRecord {
    let mut flat = FlatRecord::new();
    for key in record.keys() {
        if let Some(filter) = fields {
            if !filter.contains(key) {
                continue;
            }
        }
        let Some(value) = record.get(key) else {
            continue;
        };
        let native = to_yaml(&value);
        let entry = if is_safe(record, key, &native) {
            native
        } else {
            Value::String(record.formatted(key))
        };
        flat.insert(Value::String(key.to_owned()), entry);
    }
    flat
}

/// Inverse of `flatten`: write a parsed mapping back onto the record.
/// Values that stayed safe are assigned directly; anything else goes
/// through the field's string coercion. No-op assignments leave the dirty
/// flag untouched.
pub fn apply(record: &mut dyn Record, data: &FlatRecord) {
    for (key, value) in data {
        let Some(key) = key.as_str() else {
            continue;
        };
        if record.declared_type(key).is_none() {
            tracing::warn!(field = key, "ignoring unknown field");
            continue;
        }
        if is_safe(record, key, value) {
            record.set(key, from_yaml(value));
        } else {
            record.set_parsed(key, &scalar_to_string(value));
        }
    }
}

fn to_yaml(value: &FieldValue) -> Value {
    match value {
        FieldValue::Int(i) => Value::Number((*i).into()),
        FieldValue::Float(f) => Value::Number((*f).into()),
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Text(s) => Value::String(s.clone()),
    }
}

// Only called on values that passed `is_safe`.
fn from_yaml(value: &Value) -> FieldValue {
    match value {
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::Number(n) if n.is_i64() => FieldValue::Int(n.as_i64().unwrap_or_default()),
        Value::Number(n) if n.is_u64() => {
            FieldValue::Int(n.as_u64().unwrap_or_default() as i64)
        }
        Value::Number(n) => FieldValue::Float(n.as_f64().unwrap_or_default()),
        other => FieldValue::Text(scalar_to_string(other)),
    }
}
