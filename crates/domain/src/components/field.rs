//! Input fields bound to one property of the entity.

use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::factory::{ComponentType, TreeBuilder};
use super::form::{ConfigForm, FormField, FormInput};
use super::{ComponentDoc, ComponentKind};
use crate::entity::SheetEntity;
use crate::error::{ComponentError, ConfigValidationKind};
use crate::ids::NodeId;

const DEFAULT_VALUE: &str = "fieldDefaultValue";
const MIN: &str = "fieldMin";
const MAX: &str = "fieldMax";
const MAX_LENGTH: &str = "fieldMaxLength";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InputKind {
    #[default]
    #[serde(rename = "textField")]
    Text,
    #[serde(rename = "numberField")]
    Number,
    #[serde(rename = "checkbox")]
    Checkbox,
}

impl InputKind {
    pub fn technical_name(&self) -> &'static str {
        match self {
            InputKind::Text => "textField",
            InputKind::Number => "numberField",
            InputKind::Checkbox => "checkbox",
        }
    }

    pub fn pretty_name(&self) -> &'static str {
        match self {
            InputKind::Text => "Text field",
            InputKind::Number => "Number field",
            InputKind::Checkbox => "Checkbox",
        }
    }
}

/// Variant fields of an input as stored in the layout document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldProps {
    #[serde(skip)]
    pub input: InputKind,
    /// Formula for the value used when the entity has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Bounds keep their JSON number form so `0` is not saved back as `0.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl FieldProps {
    pub fn new(input: InputKind) -> Self {
        Self {
            input,
            ..Default::default()
        }
    }

    pub(crate) fn from_doc(input: InputKind, doc: &ComponentDoc) -> Result<Self, ComponentError> {
        let mut props: FieldProps = doc.parse_fields()?;
        props.input = input;
        Ok(props)
    }

    pub(crate) fn check_range(&self, doc: &ComponentDoc) -> Result<(), ComponentError> {
        let min = self.min.as_ref().and_then(Number::as_f64);
        let max = self.max.as_ref().and_then(Number::as_f64);
        match (min, max) {
            (Some(min), Some(max)) if min > max => Err(ComponentError::config(
                ConfigValidationKind::InvalidRange { min, max },
                doc,
            )),
            _ => Ok(()),
        }
    }
}

/// One registered input type. The three inputs share this implementation.
#[derive(Debug, Clone, Copy)]
pub struct FieldType {
    input: InputKind,
}

impl FieldType {
    pub fn new(input: InputKind) -> Self {
        Self { input }
    }
}

impl ComponentType for FieldType {
    fn technical_name(&self) -> &'static str {
        self.input.technical_name()
    }

    fn pretty_name(&self) -> &'static str {
        self.input.pretty_name()
    }

    fn variant_fields(&self) -> &'static [&'static str] {
        &["defaultValue", "min", "max", "maxLength"]
    }

    fn build(
        &self,
        doc: &ComponentDoc,
        _id: NodeId,
        _builder: &mut TreeBuilder<'_>,
    ) -> Result<ComponentKind, ComponentError> {
        let props = FieldProps::from_doc(self.input, doc)?;
        props.check_range(doc)?;
        Ok(ComponentKind::Field(props))
    }

    fn validate_config(&self, doc: &ComponentDoc) -> Result<(), ComponentError> {
        FieldProps::from_doc(self.input, doc)?.check_range(doc)
    }

    fn config_form(&self, existing: Option<&ComponentDoc>, _entity: &SheetEntity) -> ConfigForm {
        let props = existing
            .and_then(|doc| FieldProps::from_doc(self.input, doc).ok())
            .unwrap_or_else(|| FieldProps::new(self.input));

        let mut form = ConfigForm::with_base_fields(self.technical_name(), existing);
        form.push(FormField::new(
            DEFAULT_VALUE,
            "Default value",
            FormInput::Formula,
            props.default_value.clone(),
        ));
        match self.input {
            InputKind::Number => {
                form.push(FormField::new(
                    MIN,
                    "Minimum",
                    FormInput::Number,
                    props.min.as_ref().map(Number::to_string),
                ));
                form.push(FormField::new(
                    MAX,
                    "Maximum",
                    FormInput::Number,
                    props.max.as_ref().map(Number::to_string),
                ));
            }
            InputKind::Text => form.push(FormField::new(
                MAX_LENGTH,
                "Maximum length",
                FormInput::Number,
                props.max_length.map(|v| v.to_string()),
            )),
            InputKind::Checkbox => {}
        }
        form
    }

    fn extract_config(&self, form: &ConfigForm) -> Result<ComponentDoc, ComponentError> {
        let mut doc = form.extract_base()?;
        if let Some(default_value) = form.value(DEFAULT_VALUE) {
            doc = doc.with_field("defaultValue", default_value);
        }
        match self.input {
            InputKind::Number => {
                if let Some(min) = form.number::<Number>(MIN, "minimum", &doc)? {
                    doc = doc.with_field("min", min);
                }
                if let Some(max) = form.number::<Number>(MAX, "maximum", &doc)? {
                    doc = doc.with_field("max", max);
                }
            }
            InputKind::Text => {
                if let Some(max_length) = form.number::<u32>(MAX_LENGTH, "maximum length", &doc)? {
                    doc = doc.with_field("maxLength", max_length);
                }
            }
            InputKind::Checkbox => {}
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::form::KEY;
    use serde_json::json;

    #[test]
    fn parses_number_field_bounds() {
        let doc = ComponentDoc::from_value(json!({
            "type": "numberField", "key": "hp", "defaultValue": "${con * 2}$", "min": 0, "max": 99
        }))
        .expect("valid doc");

        let props = FieldProps::from_doc(InputKind::Number, &doc).expect("valid props");
        assert_eq!(props.input, InputKind::Number);
        assert_eq!(props.default_value.as_deref(), Some("${con * 2}$"));
        assert_eq!(props.min, Some(Number::from(0)));
        assert_eq!(props.max, Some(Number::from(99)));
    }

    #[test]
    fn inverted_range_is_a_config_error() {
        let doc = ComponentDoc::new("numberField")
            .with_key("hp")
            .with_field("min", 10)
            .with_field("max", 1);

        let err = FieldType::new(InputKind::Number)
            .validate_config(&doc)
            .expect_err("min > max");
        assert!(matches!(
            err,
            ComponentError::ConfigValidation {
                kind: ConfigValidationKind::InvalidRange { .. },
                ..
            }
        ));
    }

    #[test]
    fn wrongly_typed_field_is_a_deserialization_error() {
        let doc = ComponentDoc::new("textField").with_field("maxLength", "long");
        let err = FieldType::new(InputKind::Text)
            .validate_config(&doc)
            .expect_err("maxLength must be numeric");
        assert!(matches!(err, ComponentError::Deserialization(_)));
    }

    #[test]
    fn form_round_trips_through_extract() {
        let field = FieldType::new(InputKind::Number);
        let entity = SheetEntity::template("Hero");
        let existing = ComponentDoc::new("numberField")
            .with_key("level")
            .with_field("defaultValue", "1")
            .with_field("max", 20.0);

        let mut form = field.config_form(Some(&existing), &entity);
        form.set(KEY, "lvl");
        form.set(MIN, "1");
        let doc = field.extract_config(&form).expect("valid form");

        assert_eq!(doc.key.as_deref(), Some("lvl"));
        assert_eq!(doc.field("defaultValue"), Some(&json!("1")));
        assert_eq!(doc.field("min"), Some(&json!(1)));
        assert_eq!(doc.field("max"), Some(&json!(20.0)));
    }

    #[test]
    fn integer_and_float_bounds_keep_their_form() {
        let doc = ComponentDoc::from_value(json!({
            "type": "numberField", "key": "speed", "min": 0, "max": 7.5
        }))
        .expect("valid doc");

        let props = FieldProps::from_doc(InputKind::Number, &doc).expect("valid props");
        let written = serde_json::to_value(&props).expect("serializes");

        assert_eq!(written, json!({"min": 0, "max": 7.5}));
    }

    #[test]
    fn mixed_integer_and_float_bounds_are_range_checked() {
        let doc = ComponentDoc::new("numberField")
            .with_field("min", 2)
            .with_field("max", 1.5);
        assert!(FieldType::new(InputKind::Number).validate_config(&doc).is_err());
    }

    #[test]
    fn checkbox_form_has_no_numeric_extras() {
        let form = FieldType::new(InputKind::Checkbox)
            .config_form(None, &SheetEntity::template("Hero"));
        assert!(form.fields.iter().all(|f| f.id != MIN && f.id != MAX_LENGTH));
    }
}
