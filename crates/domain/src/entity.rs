//! Entity snapshot a component tree renders against.

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;
use crate::types::{PropertyBag, PropertyValue};

/// What kind of record owns a sheet layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Authoring record; its sheet is rendered in edit mode.
    Template,
    Actor,
    Item,
}

/// Read-only view of an entity: identity plus its current property bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetEntity {
    id: EntityId,
    kind: EntityKind,
    name: String,
    #[serde(default)]
    props: PropertyBag,
}

impl SheetEntity {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            kind,
            name: name.into(),
            props: PropertyBag::new(),
        }
    }

    pub fn template(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Template, name)
    }

    pub fn actor(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Actor, name)
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }

    pub fn with_props(mut self, props: PropertyBag) -> Self {
        self.props = props;
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn props(&self) -> &PropertyBag {
        &self.props
    }

    pub fn is_template(&self) -> bool {
        self.kind == EntityKind::Template
    }

    pub fn set_prop(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.props.insert(key.into(), value);
    }
}
