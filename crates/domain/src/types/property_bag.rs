use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Live key -> value data of an entity, as stored under its `props`.
pub type PropertyBag = BTreeMap<String, PropertyValue>;

/// A JSON-compatible value held in an entity's property bag.
///
/// Serialized untagged so that a property bag reads and writes as a plain
/// JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum PropertyValue {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
    Object(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(value) => Some(*value),
            PropertyValue::Float(value) => Some(*value as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Numeric view used by arithmetic: null is 0, booleans are 0/1 and
    /// numeric strings are parsed. Anything else has no numeric value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Null => Some(0.0),
            PropertyValue::Boolean(value) => Some(if *value { 1.0 } else { 0.0 }),
            PropertyValue::Integer(value) => Some(*value as f64),
            PropertyValue::Float(value) => Some(*value),
            PropertyValue::String(value) => value.trim().parse::<f64>().ok(),
            PropertyValue::List(_) | PropertyValue::Object(_) => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            PropertyValue::Null => false,
            PropertyValue::Boolean(value) => *value,
            PropertyValue::Integer(value) => *value != 0,
            PropertyValue::Float(value) => *value != 0.0 && !value.is_nan(),
            PropertyValue::String(value) => !value.is_empty(),
            PropertyValue::List(values) => !values.is_empty(),
            PropertyValue::Object(_) => true,
        }
    }

    /// Builds a number, collapsing integral floats to integers.
    pub fn from_number(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            PropertyValue::Integer(value as i64)
        } else {
            PropertyValue::Float(value)
        }
    }

    /// Follows a dotted path (`stats.str`) into nested objects.
    pub fn lookup<'a>(bag: &'a PropertyBag, path: &str) -> Option<&'a PropertyValue> {
        let mut segments = path.split('.');
        let mut current = bag.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                PropertyValue::Object(map) => map.get(segment)?,
                PropertyValue::List(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => Ok(()),
            PropertyValue::Boolean(value) => write!(f, "{}", value),
            PropertyValue::Integer(value) => write!(f, "{}", value),
            PropertyValue::Float(value) => write!(f, "{}", value),
            PropertyValue::String(value) => f.write_str(value),
            PropertyValue::List(values) => {
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                Ok(())
            }
            PropertyValue::Object(_) => f.write_str("[object]"),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}
