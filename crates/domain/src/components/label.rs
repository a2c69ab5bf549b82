use serde::{Deserialize, Serialize};

use super::factory::{ComponentType, TreeBuilder};
use super::form::{ConfigForm, FormField, FormInput};
use super::{ComponentDoc, ComponentKind};
use crate::entity::SheetEntity;
use crate::error::ComponentError;
use crate::ids::NodeId;

const VALUE: &str = "labelValue";
const SIZE: &str = "labelSize";

/// Size hint that stretches a label over its whole slot.
pub const FULL_SIZE: &str = "full-size";

const SIZES: [&str; 4] = ["", "small", "large", FULL_SIZE];

/// Static or computed text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelProps {
    /// Phrase rendered as the label text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LabelType;

impl ComponentType for LabelType {
    fn technical_name(&self) -> &'static str {
        "label"
    }

    fn pretty_name(&self) -> &'static str {
        "Label"
    }

    fn variant_fields(&self) -> &'static [&'static str] {
        &["value", "size"]
    }

    fn build(
        &self,
        doc: &ComponentDoc,
        _id: NodeId,
        _builder: &mut TreeBuilder<'_>,
    ) -> Result<ComponentKind, ComponentError> {
        Ok(ComponentKind::Label(doc.parse_fields()?))
    }

    fn validate_config(&self, doc: &ComponentDoc) -> Result<(), ComponentError> {
        doc.parse_fields::<LabelProps>().map(|_| ())
    }

    fn config_form(&self, existing: Option<&ComponentDoc>, _entity: &SheetEntity) -> ConfigForm {
        let props: LabelProps = existing
            .and_then(|doc| doc.parse_fields().ok())
            .unwrap_or_default();

        let mut form = ConfigForm::with_base_fields(self.technical_name(), existing);
        form.push(FormField::new(VALUE, "Text", FormInput::Formula, props.value));
        form.push(FormField::new(
            SIZE,
            "Size",
            FormInput::Select {
                options: SIZES.iter().map(|s| s.to_string()).collect(),
            },
            props.size,
        ));
        form
    }

    fn extract_config(&self, form: &ConfigForm) -> Result<ComponentDoc, ComponentError> {
        let mut doc = form.extract_base()?;
        if let Some(value) = form.value(VALUE) {
            doc = doc.with_field("value", value);
        }
        if let Some(size) = form.value(SIZE) {
            doc = doc.with_field("size", size);
        }
        Ok(doc)
    }
}
