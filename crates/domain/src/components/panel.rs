//! Linear container.

use serde_json::Value;

use super::factory::{ComponentType, TreeBuilder};
use super::{ComponentDoc, ComponentKind};
use crate::error::ComponentError;
use crate::ids::NodeId;

/// Children of a panel, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelProps {
    pub contents: Vec<NodeId>,
}

impl PanelProps {
    pub fn position(&self, child: NodeId) -> Option<usize> {
        self.contents.iter().position(|id| *id == child)
    }
}

/// Wraps `docs` into one keyless panel document.
pub fn wrap_in_panel(docs: Vec<ComponentDoc>) -> ComponentDoc {
    let contents = docs.iter().map(ComponentDoc::to_value).collect::<Vec<_>>();
    ComponentDoc::new(PanelType.technical_name()).with_field("contents", Value::Array(contents))
}

/// Panels splice on delete, so a `null` entry is never written and cannot be
/// saved back in place.
fn check_no_holes(items: &[Value]) -> Result<(), ComponentError> {
    match items.iter().position(Value::is_null) {
        Some(index) => Err(ComponentError::deserialization(format!(
            "panel contents must not contain null (entry {})",
            index
        ))),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PanelType;

impl ComponentType for PanelType {
    fn technical_name(&self) -> &'static str {
        "panel"
    }

    fn pretty_name(&self) -> &'static str {
        "Panel"
    }

    fn variant_fields(&self) -> &'static [&'static str] {
        &["contents"]
    }

    fn build(
        &self,
        doc: &ComponentDoc,
        id: NodeId,
        builder: &mut TreeBuilder<'_>,
    ) -> Result<ComponentKind, ComponentError> {
        let items = match doc.field("contents") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                return Err(ComponentError::deserialization(format!(
                    "panel contents must be a list, got {}",
                    other
                )))
            }
        };

        check_no_holes(&items)?;
        let mut contents = Vec::with_capacity(items.len());
        for item in items {
            let child = ComponentDoc::from_value(item)?;
            contents.push(builder.create_one_component(&child, Some(id))?);
        }
        Ok(ComponentKind::Panel(PanelProps { contents }))
    }

    fn validate_config(&self, doc: &ComponentDoc) -> Result<(), ComponentError> {
        match doc.field("contents") {
            None | Some(Value::Null) => Ok(()),
            Some(Value::Array(items)) => check_no_holes(items),
            Some(_) => Err(ComponentError::deserialization(
                "panel contents must be a list",
            )),
        }
    }
}
