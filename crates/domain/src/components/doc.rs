//! Persisted layout document.
//!
//! Every node of a sheet layout is stored as one JSON object:
//!
//! ```json
//! { "type": "table", "key": "stats", "tooltip": null, "cssClass": null,
//!   "role": 0, "permission": 0, "visibilityFormula": null,
//!   "rows": 1, "cols": 2, "layout": "lc", "contents": [[null, {...}]] }
//! ```
//!
//! Shared fields are typed; variant-specific fields stay in `fields` until
//! the matching component type reads them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ComponentError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDoc {
    /// Technical name of the component type.
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub css_class: Option<String>,
    #[serde(default)]
    pub role: u32,
    #[serde(default)]
    pub permission: u32,
    #[serde(default)]
    pub visibility_formula: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ComponentDoc {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            key: None,
            tooltip: None,
            css_class: None,
            role: 0,
            permission: 0,
            visibility_formula: None,
            fields: Map::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn from_value(value: Value) -> Result<Self, ComponentError> {
        serde_json::from_value(value).map_err(ComponentError::deserialization)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ComponentError> {
        serde_json::from_str(json).map_err(ComponentError::deserialization)
    }

    pub fn to_value(&self) -> Value {
        // Serializing a map of JSON values cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Reads the variant-specific fields into a typed struct.
    pub(crate) fn parse_fields<T: DeserializeOwned>(&self) -> Result<T, ComponentError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|err| {
            ComponentError::deserialization(format!(
                "{} '{}': {}",
                self.component_type,
                self.key.as_deref().unwrap_or("<no key>"),
                err
            ))
        })
    }
}
