use serde::{Deserialize, Serialize};

/// Declared semantic type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Float,
    Bool,
    Text,
}

impl FieldType {
    /// Whether values of this type round-trip through the editable text
    /// format without string coercion.
    pub fn is_safe(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Float | FieldType::Bool)
    }

    /// Coerce a raw string into a value of this type.
    ///
    /// Unparseable numeric or boolean input falls back to the type's null
    /// value; assignment is lenient, never an error.
    pub fn parse(&self, raw: &str) -> FieldValue {
        match self {
            FieldType::Int => FieldValue::Int(raw.trim().parse().unwrap_or(0)),
            FieldType::Float => FieldValue::Float(raw.trim().parse().unwrap_or(0.0)),
            FieldType::Bool => FieldValue::Bool(parse_bool(raw)),
            FieldType::Text => FieldValue::Text(raw.to_owned()),
        }
    }

    pub fn null_value(&self) -> FieldValue {
        match self {
            FieldType::Int => FieldValue::Int(0),
            FieldType::Float => FieldValue::Float(0.0),
            FieldType::Bool => FieldValue::Bool(false),
            FieldType::Text => FieldValue::Text(String::new()),
        }
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "on" | "1"
    )
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Bool(_) => FieldType::Bool,
            FieldValue::Int(_) => FieldType::Int,
            FieldValue::Float(_) => FieldType::Float,
            FieldValue::Text(_) => FieldType::Text,
        }
    }

    /// Always-string projection used for display and unsafe round-trips.
    pub fn formatted(&self) -> String {
        match self {
            FieldValue::Bool(value) => value.to_string(),
            FieldValue::Int(value) => value.to_string(),
            FieldValue::Float(value) => value.to_string(),
            FieldValue::Text(value) => value.clone(),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// One entry in a record variant's field descriptor table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}
