//! Arena-backed component tree.
//!
//! Nodes live in a flat map keyed by `NodeId`; containers hold child ids and
//! every node holds its parent id. Template addresses are not stored: they
//! are derived from the parent chain whenever asked for, so they cannot go
//! stale after a structural change.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use super::factory::ComponentFactory;
use super::{ComponentDoc, ComponentKind, Node};
use crate::entity::SheetEntity;
use crate::error::ComponentError;
use crate::ids::NodeId;
use crate::phrase::{EvaluationContext, FormulaEvaluator};
use crate::types::PropertyValue;

/// Template address of the root node unless configured otherwise.
pub const DEFAULT_ROOT_ADDRESS: &str = "body";

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTree {
    root: NodeId,
    root_address: String,
    nodes: HashMap<NodeId, Node>,
}

fn write_fields<T: Serialize>(doc: &mut ComponentDoc, props: &T) -> Result<(), ComponentError> {
    match serde_json::to_value(props).map_err(ComponentError::deserialization)? {
        Value::Object(fields) => {
            doc.fields.extend(fields);
            Ok(())
        }
        other => Err(ComponentError::deserialization(format!(
            "{} fields must serialize to an object, got {}",
            doc.component_type, other
        ))),
    }
}

impl ComponentTree {
    /// Builds a live tree from a persisted root document.
    pub fn from_doc(doc: &ComponentDoc, factory: &ComponentFactory) -> Result<Self, ComponentError> {
        let mut builder = factory.builder();
        let root = builder.create_one_component(doc, None)?;
        Ok(Self {
            root,
            root_address: DEFAULT_ROOT_ADDRESS.to_string(),
            nodes: builder.into_nodes(),
        })
    }

    pub fn from_value(value: Value, factory: &ComponentFactory) -> Result<Self, ComponentError> {
        Self::from_doc(&ComponentDoc::from_value(value)?, factory)
    }

    pub fn from_json_str(json: &str, factory: &ComponentFactory) -> Result<Self, ComponentError> {
        Self::from_doc(&ComponentDoc::from_json_str(json)?, factory)
    }

    pub fn with_root_address(mut self, address: impl Into<String>) -> Self {
        self.root_address = address.into();
        self
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = id;
    }

    pub fn root_address(&self) -> &str {
        &self.root_address
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, ComponentError> {
        self.nodes
            .get(&id)
            .ok_or_else(|| ComponentError::not_found(format!("component {}", id)))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, ComponentError> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| ComponentError::not_found(format!("component {}", id)))
    }

    /// Direct children of `id`, row-major for tables.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id).map(|n| n.kind.children()).unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Whether `id` is `ancestor` or lies somewhere below it.
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// `id` and all its descendants, parents before children.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if !self.nodes.contains_key(&next) {
                continue;
            }
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    /// Path from the entity's root property bag to this node, derived from
    /// the slot the node occupies in each ancestor.
    pub fn template_address(&self, id: NodeId) -> Result<String, ComponentError> {
        let node = self.node(id)?;
        let Some(parent_id) = node.parent else {
            return Ok(self.root_address.clone());
        };
        let parent_address = self.template_address(parent_id)?;
        let slot = match &self.node(parent_id)?.kind {
            ComponentKind::Panel(panel) => panel.position(id).map(|i| i.to_string()),
            ComponentKind::Table(table) => table.position(id).map(|(r, c)| format!("{}-{}", r, c)),
            _ => None,
        }
        .ok_or_else(|| {
            ComponentError::not_found(format!("slot of component {} in its parent", id))
        })?;
        Ok(format!("{}-contents-{}", parent_address, slot))
    }

    /// Serializes the subtree rooted at `id` back to its layout document.
    pub fn to_doc(&self, id: NodeId) -> Result<ComponentDoc, ComponentError> {
        let node = self.node(id)?;
        let mut doc = match &node.kind {
            ComponentKind::Inert(inert) => return Ok(inert.doc.clone()),
            kind => ComponentDoc::new(kind.technical_name()),
        };
        node.base.write_doc(&mut doc);

        match &node.kind {
            ComponentKind::Label(label) => write_fields(&mut doc, label)?,
            ComponentKind::Field(field) => write_fields(&mut doc, field)?,
            ComponentKind::Panel(panel) => {
                let contents = panel
                    .contents
                    .iter()
                    .map(|child| self.to_doc(*child).map(|d| d.to_value()))
                    .collect::<Result<Vec<_>, _>>()?;
                doc.fields.insert("contents".to_string(), Value::Array(contents));
            }
            ComponentKind::Table(table) => {
                let mut grid = Vec::with_capacity(table.rows);
                for r in 0..table.rows {
                    let mut row = Vec::with_capacity(table.cols);
                    for c in 0..table.cols {
                        row.push(match table.cell(r, c) {
                            Some(child) => self.to_doc(child)?.to_value(),
                            None => Value::Null,
                        });
                    }
                    grid.push(Value::Array(row));
                }
                doc.fields.insert("rows".to_string(), Value::from(table.rows));
                doc.fields.insert("cols".to_string(), Value::from(table.cols));
                // Always present, `null` when unset.
                doc.fields.insert(
                    "layout".to_string(),
                    table.layout.clone().map_or(Value::Null, Value::String),
                );
                doc.fields.insert("contents".to_string(), Value::Array(grid));
            }
            ComponentKind::Inert(_) => {}
        }
        Ok(doc)
    }

    pub fn to_value(&self) -> Result<Value, ComponentError> {
        Ok(self.to_doc(self.root)?.to_value())
    }

    pub fn to_json_string(&self) -> Result<String, ComponentError> {
        serde_json::to_string_pretty(&self.to_value()?).map_err(ComponentError::deserialization)
    }

    /// Keys of the subtree: own key first, then children depth-first in
    /// contents order. Keyless nodes contribute nothing.
    pub fn get_all_keys(&self, id: NodeId) -> Result<Vec<String>, ComponentError> {
        self.node(id)?;
        Ok(self
            .subtree(id)
            .into_iter()
            .filter_map(|n| self.nodes.get(&n).and_then(|node| node.base.key.clone()))
            .collect())
    }

    /// Keys of the whole layout.
    pub fn all_keys(&self) -> Vec<String> {
        self.get_all_keys(self.root).unwrap_or_default()
    }

    /// Default value of every keyed node in the subtree.
    ///
    /// Inputs contribute their evaluated `defaultValue` (`None` when they
    /// have none or it fails to evaluate); every other node contributes its
    /// key with no value.
    pub fn get_all_properties(
        &self,
        id: NodeId,
        entity: &SheetEntity,
        evaluator: &dyn FormulaEvaluator,
    ) -> Result<BTreeMap<String, Option<PropertyValue>>, ComponentError> {
        self.node(id)?;
        let mut properties = BTreeMap::new();
        for node_id in self.subtree(id) {
            let node = self.node(node_id)?;
            let Some(key) = &node.base.key else {
                continue;
            };
            let value = match &node.kind {
                ComponentKind::Field(field) => match &field.default_value {
                    Some(formula) => {
                        let context = EvaluationContext::new(format!(
                            "{}.defaultValue",
                            self.template_address(node_id)?
                        ));
                        evaluator
                            .evaluate(formula, entity.props(), &context)
                            .ok()
                            .map(|r| r.result)
                    }
                    None => None,
                },
                _ => None,
            };
            properties.insert(key.clone(), value);
        }
        Ok(properties)
    }

    /// Flat index of every keyed node in the subtree. Later nodes win on
    /// key collision.
    pub fn get_component_map(&self, id: NodeId) -> Result<BTreeMap<String, &Node>, ComponentError> {
        self.node(id)?;
        let mut map = BTreeMap::new();
        for node_id in self.subtree(id) {
            if let Some(node) = self.nodes.get(&node_id) {
                if let Some(key) = &node.base.key {
                    map.insert(key.clone(), node);
                }
            }
        }
        Ok(map)
    }

    pub fn find_by_key(&self, key: &str) -> Option<NodeId> {
        self.subtree(self.root)
            .into_iter()
            .find(|id| self.nodes.get(id).and_then(|n| n.key()) == Some(key))
    }

    pub(crate) fn merge(&mut self, nodes: HashMap<NodeId, Node>) {
        self.nodes.extend(nodes);
    }

    /// Drops `id` and its descendants from the arena. The caller is
    /// responsible for clearing the slot in the parent.
    pub(crate) fn remove_subtree(&mut self, id: NodeId) {
        for node_id in self.subtree(id) {
            self.nodes.remove(&node_id);
        }
    }
}
