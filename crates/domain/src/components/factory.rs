//! Component type registry.
//!
//! The factory is the single place that knows which technical names exist.
//! Deserialization, validation and the editor forms all dispatch through it,
//! so adding a component kind means registering one more `ComponentType`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::field::{FieldType, InputKind};
use super::form::{validate_base, ConfigForm};
use super::label::LabelType;
use super::panel::PanelType;
use super::table::TableType;
use super::{ComponentBase, ComponentDoc, ComponentKind, InertProps, Node};
use crate::entity::SheetEntity;
use crate::error::ComponentError;
use crate::ids::NodeId;

/// One registered component kind: construction, validation and editor form.
pub trait ComponentType: Send + Sync {
    /// Stable discriminator stored in the document's `type` field.
    fn technical_name(&self) -> &'static str;

    /// Display name for the editor.
    fn pretty_name(&self) -> &'static str;

    /// Variant fields this type reads from its document. Any other field is
    /// carried through untouched.
    fn variant_fields(&self) -> &'static [&'static str];

    /// Builds the variant-specific part of node `id` from `doc`. Containers
    /// create their children through `builder` with `id` as parent.
    fn build(
        &self,
        doc: &ComponentDoc,
        id: NodeId,
        builder: &mut TreeBuilder<'_>,
    ) -> Result<ComponentKind, ComponentError>;

    /// Variant-specific validation of an authored configuration.
    fn validate_config(&self, _doc: &ComponentDoc) -> Result<(), ComponentError> {
        Ok(())
    }

    fn config_form(&self, existing: Option<&ComponentDoc>, _entity: &SheetEntity) -> ConfigForm {
        ConfigForm::with_base_fields(self.technical_name(), existing)
    }

    fn extract_config(&self, form: &ConfigForm) -> Result<ComponentDoc, ComponentError> {
        form.extract_base()
    }
}

/// What to do with a document whose type is not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownComponentPolicy {
    /// Fail the whole load with `UnknownComponentType`.
    #[default]
    Reject,
    /// Keep the raw document in an inert node that renders nothing and
    /// serializes back unchanged.
    Preserve,
}

impl fmt::Display for UnknownComponentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownComponentPolicy::Reject => write!(f, "reject"),
            UnknownComponentPolicy::Preserve => write!(f, "preserve"),
        }
    }
}

impl FromStr for UnknownComponentPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" | "abort" | "fail" => Ok(UnknownComponentPolicy::Reject),
            "preserve" | "keep" | "placeholder" => Ok(UnknownComponentPolicy::Preserve),
            _ => Err(()),
        }
    }
}

/// Staging area for a subtree under construction.
///
/// Nodes are collected here and only merged into a tree once the whole
/// subtree built successfully, so a failed build leaves the tree untouched.
pub struct TreeBuilder<'a> {
    factory: &'a ComponentFactory,
    nodes: HashMap<NodeId, Node>,
}

impl<'a> TreeBuilder<'a> {
    pub(crate) fn new(factory: &'a ComponentFactory) -> Self {
        Self {
            factory,
            nodes: HashMap::new(),
        }
    }

    /// Creates one node (and its subtree) from `doc` under `parent`.
    pub fn create_one_component(
        &mut self,
        doc: &ComponentDoc,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ComponentError> {
        let id = NodeId::new();
        let (base, kind) = match self.factory.get(&doc.component_type) {
            Some(component_type) => (
                ComponentBase::from_doc_keeping_extra(doc, component_type.variant_fields()),
                component_type.build(doc, id, self)?,
            ),
            None => match self.factory.unknown_policy {
                UnknownComponentPolicy::Reject => {
                    return Err(ComponentError::UnknownComponentType(
                        doc.component_type.clone(),
                    ))
                }
                UnknownComponentPolicy::Preserve => (
                    ComponentBase::from_doc(doc),
                    ComponentKind::Inert(InertProps { doc: doc.clone() }),
                ),
            },
        };

        self.nodes.insert(
            id,
            Node {
                id,
                parent,
                base,
                kind,
            },
        );
        Ok(id)
    }

    pub(crate) fn into_nodes(self) -> HashMap<NodeId, Node> {
        self.nodes
    }
}

/// Registry of component types keyed by technical name.
#[derive(Clone)]
pub struct ComponentFactory {
    types: Vec<Arc<dyn ComponentType>>,
    unknown_policy: UnknownComponentPolicy,
}

impl Default for ComponentFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("types", &self.technical_names())
            .field("unknown_policy", &self.unknown_policy)
            .finish()
    }
}

impl ComponentFactory {
    /// Create a factory with all built-in component types.
    pub fn new() -> Self {
        let mut factory = Self::empty();
        factory.register(Arc::new(LabelType));
        factory.register(Arc::new(FieldType::new(InputKind::Text)));
        factory.register(Arc::new(FieldType::new(InputKind::Number)));
        factory.register(Arc::new(FieldType::new(InputKind::Checkbox)));
        factory.register(Arc::new(PanelType));
        factory.register(Arc::new(TableType));
        factory
    }

    /// Create a factory without any registered types.
    pub fn empty() -> Self {
        Self {
            types: Vec::new(),
            unknown_policy: UnknownComponentPolicy::default(),
        }
    }

    pub fn with_unknown_policy(mut self, policy: UnknownComponentPolicy) -> Self {
        self.unknown_policy = policy;
        self
    }

    pub fn unknown_policy(&self) -> UnknownComponentPolicy {
        self.unknown_policy
    }

    /// Register a component type, replacing any type with the same name.
    pub fn register(&mut self, component_type: Arc<dyn ComponentType>) {
        self.types
            .retain(|t| t.technical_name() != component_type.technical_name());
        self.types.push(component_type);
    }

    pub fn get(&self, technical_name: &str) -> Option<Arc<dyn ComponentType>> {
        self.types
            .iter()
            .find(|t| t.technical_name() == technical_name)
            .cloned()
    }

    fn require(&self, technical_name: &str) -> Result<Arc<dyn ComponentType>, ComponentError> {
        self.get(technical_name)
            .ok_or_else(|| ComponentError::UnknownComponentType(technical_name.to_string()))
    }

    pub fn technical_names(&self) -> Vec<&'static str> {
        self.types.iter().map(|t| t.technical_name()).collect()
    }

    /// Technical and display names, for the editor's type picker.
    pub fn list_with_pretty_names(&self) -> Vec<(&'static str, &'static str)> {
        self.types
            .iter()
            .map(|t| (t.technical_name(), t.pretty_name()))
            .collect()
    }

    pub fn pretty_name(&self, technical_name: &str) -> Result<&'static str, ComponentError> {
        Ok(self.require(technical_name)?.pretty_name())
    }

    /// Gate for configurations coming out of the editor.
    pub fn validate_config(&self, doc: &ComponentDoc) -> Result<(), ComponentError> {
        let component_type = self.require(&doc.component_type)?;
        validate_base(doc)?;
        component_type.validate_config(doc)
    }

    pub fn config_form(
        &self,
        technical_name: &str,
        existing: Option<&ComponentDoc>,
        entity: &SheetEntity,
    ) -> Result<ConfigForm, ComponentError> {
        Ok(self.require(technical_name)?.config_form(existing, entity))
    }

    pub fn extract_config(&self, form: &ConfigForm) -> Result<ComponentDoc, ComponentError> {
        self.require(&form.component_type)?.extract_config(form)
    }

    pub(crate) fn builder(&self) -> TreeBuilder<'_> {
        TreeBuilder::new(self)
    }
}
