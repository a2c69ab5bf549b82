//! Editor form model.
//!
//! A `ConfigForm` is what the sheet editor shows when a component is created
//! or edited: an ordered list of typed inputs pre-filled from the existing
//! document. The editor hands the submitted form back to
//! `ComponentType::extract_config`, which turns it into a `ComponentDoc`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ComponentDoc;
use crate::error::{ComponentError, ConfigValidationKind};

pub const KEY: &str = "componentKey";
pub const TOOLTIP: &str = "componentTooltip";
pub const CSS_CLASS: &str = "componentCssClass";
pub const ROLE: &str = "componentRole";
pub const PERMISSION: &str = "componentPermission";
pub const VISIBILITY_FORMULA: &str = "componentVisibilityFormula";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FormInput {
    Text,
    Number,
    Checkbox,
    /// Free text interpreted as a computed phrase.
    Formula,
    Select { options: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    pub input: FormInput,
    pub value: Option<String>,
}

impl FormField {
    pub fn new(id: &str, label: &str, input: FormInput, value: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            input,
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigForm {
    pub component_type: String,
    pub fields: Vec<FormField>,
}

impl ConfigForm {
    /// A form pre-filled with the shared component fields.
    pub fn with_base_fields(component_type: &str, existing: Option<&ComponentDoc>) -> Self {
        let text = |f: fn(&ComponentDoc) -> Option<&String>| existing.and_then(f).cloned();
        let number = |f: fn(&ComponentDoc) -> u32| Some(existing.map(f).unwrap_or(0).to_string());

        Self {
            component_type: component_type.to_string(),
            fields: vec![
                FormField::new(KEY, "Component key", FormInput::Text, text(|d| d.key.as_ref())),
                FormField::new(
                    TOOLTIP,
                    "Tooltip",
                    FormInput::Text,
                    text(|d| d.tooltip.as_ref()),
                ),
                FormField::new(
                    CSS_CLASS,
                    "CSS class",
                    FormInput::Text,
                    text(|d| d.css_class.as_ref()),
                ),
                FormField::new(ROLE, "Minimum role", FormInput::Number, number(|d| d.role)),
                FormField::new(
                    PERMISSION,
                    "Minimum permission",
                    FormInput::Number,
                    number(|d| d.permission),
                ),
                FormField::new(
                    VISIBILITY_FORMULA,
                    "Visibility formula",
                    FormInput::Formula,
                    text(|d| d.visibility_formula.as_ref()),
                ),
            ],
        }
    }

    pub fn push(&mut self, field: FormField) {
        self.fields.push(field);
    }

    /// Submitted value of a field; blank input counts as absent.
    pub fn value(&self, id: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.id == id)
            .and_then(|f| f.value.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Sets a field's value, returning false if the form has no such field.
    pub fn set(&mut self, id: &str, value: impl Into<String>) -> bool {
        match self.fields.iter_mut().find(|f| f.id == id) {
            Some(field) => {
                field.value = Some(value.into());
                true
            }
            None => false,
        }
    }

    pub fn checked(&self, id: &str) -> bool {
        matches!(self.value(id), Some("true" | "on" | "1"))
    }

    /// Parses a numeric field. Blank is `None`; garbage is a validation error.
    pub fn number<T: FromStr>(
        &self,
        id: &str,
        label: &str,
        doc: &ComponentDoc,
    ) -> Result<Option<T>, ComponentError> {
        self.value(id)
            .map(|raw| {
                raw.parse::<T>().map_err(|_| {
                    ComponentError::config(
                        ConfigValidationKind::NotANumber {
                            field: label.to_string(),
                            value: raw.to_string(),
                        },
                        doc,
                    )
                })
            })
            .transpose()
    }

    /// Builds the document for the shared fields of this form.
    pub fn extract_base(&self) -> Result<ComponentDoc, ComponentError> {
        let mut doc = ComponentDoc::new(self.component_type.clone());
        doc.key = self.value(KEY).map(str::to_string);
        doc.tooltip = self.value(TOOLTIP).map(str::to_string);
        doc.css_class = self.value(CSS_CLASS).map(str::to_string);
        doc.visibility_formula = self.value(VISIBILITY_FORMULA).map(str::to_string);
        doc.role = self.number(ROLE, "minimum role", &doc)?.unwrap_or(0);
        doc.permission = self.number(PERMISSION, "minimum permission", &doc)?.unwrap_or(0);
        Ok(doc)
    }
}

/// Shared validation: a key, when given, must be a usable property path segment.
pub fn validate_base(doc: &ComponentDoc) -> Result<(), ComponentError> {
    if let Some(key) = &doc.key {
        let valid = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(ComponentError::config(
                ConfigValidationKind::InvalidKey { key: key.clone() },
                doc,
            ));
        }
    }
    Ok(())
}
