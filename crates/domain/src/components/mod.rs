//! Sheet layout components.
//!
//! A layout is a tree of components stored in a [`ComponentTree`] arena.
//! Each node has the shared [`ComponentBase`] fields and one
//! [`ComponentKind`] variant; the [`ComponentFactory`] maps a document's
//! `type` to the variant that builds it.

mod doc;
pub mod factory;
pub mod field;
pub mod form;
pub mod keys;
pub mod label;
pub mod panel;
pub mod render;
mod renderer;
pub mod table;
mod tree;
mod tree_edit;

pub use doc::ComponentDoc;
pub use factory::{ComponentFactory, ComponentType, TreeBuilder, UnknownComponentPolicy};
pub use field::{FieldProps, InputKind};
pub use label::LabelProps;
pub use panel::PanelProps;
pub use render::{RenderContext, RenderOutput, Viewer};
pub use table::TableProps;
pub use tree::{ComponentTree, DEFAULT_ROOT_ADDRESS};
pub use tree_edit::PositionHint;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::NodeId;

/// Fields every component carries, whatever its kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComponentBase {
    /// Property-bag path segment; unique within one layout.
    pub key: Option<String>,
    pub tooltip: Option<String>,
    pub css_class: Option<String>,
    /// Minimum viewer role to see the node.
    pub role: u32,
    /// Minimum viewer permission to edit the node.
    pub permission: u32,
    pub visibility_formula: Option<String>,
    /// Document fields the component's type does not read. Written back
    /// unchanged so a save never drops them.
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl ComponentBase {
    pub fn from_doc(doc: &ComponentDoc) -> Self {
        Self {
            key: doc.key.clone(),
            tooltip: doc.tooltip.clone(),
            css_class: doc.css_class.clone(),
            role: doc.role,
            permission: doc.permission,
            visibility_formula: doc.visibility_formula.clone(),
            extra: Map::new(),
        }
    }

    /// Like `from_doc`, keeping every variant field not named in `known`.
    pub(crate) fn from_doc_keeping_extra(doc: &ComponentDoc, known: &[&str]) -> Self {
        let extra = doc
            .fields
            .iter()
            .filter(|(name, _)| !known.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Self {
            extra,
            ..Self::from_doc(doc)
        }
    }

    pub(crate) fn write_doc(&self, doc: &mut ComponentDoc) {
        doc.key = self.key.clone();
        doc.tooltip = self.tooltip.clone();
        doc.css_class = self.css_class.clone();
        doc.role = self.role;
        doc.permission = self.permission;
        doc.visibility_formula = self.visibility_formula.clone();
        doc.fields
            .extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

/// Raw document of a component whose type is not registered.
#[derive(Debug, Clone, PartialEq)]
pub struct InertProps {
    pub doc: ComponentDoc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComponentKind {
    Label(LabelProps),
    Field(FieldProps),
    Panel(PanelProps),
    Table(TableProps),
    Inert(InertProps),
}

impl ComponentKind {
    pub fn technical_name(&self) -> &str {
        match self {
            ComponentKind::Label(_) => "label",
            ComponentKind::Field(props) => props.input.technical_name(),
            ComponentKind::Panel(_) => "panel",
            ComponentKind::Table(_) => "table",
            ComponentKind::Inert(props) => &props.doc.component_type,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, ComponentKind::Panel(_) | ComponentKind::Table(_))
    }

    /// Direct children, row-major for tables.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            ComponentKind::Panel(panel) => panel.contents.clone(),
            ComponentKind::Table(table) => table.occupied().map(|(_, _, id)| id).collect(),
            _ => Vec::new(),
        }
    }
}

/// One node of the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Owning container; `None` only for the root.
    pub parent: Option<NodeId>,
    pub base: ComponentBase,
    pub kind: ComponentKind,
}

impl Node {
    pub fn key(&self) -> Option<&str> {
        self.base.key.as_deref()
    }

    pub fn technical_name(&self) -> &str {
        self.kind.technical_name()
    }
}
