//! Template editing use cases.
//!
//! Structural edits of a sheet layout: add, delete, replace, move and
//! reconfigure components. Every successful edit ends in exactly one awaited
//! save of the whole layout followed by a `LayoutEvent`. A failed save rolls
//! the in-memory tree back to its state before the edit.

mod error;

pub use error::TemplateEditError;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use sheetwright_domain::components::form::ConfigForm;
use sheetwright_domain::{
    ComponentDoc, ComponentFactory, ComponentTree, EntityId, FormulaEvaluator, NodeId,
    PositionHint, PropertyValue, RenderContext, RenderOutput, SheetEntity, Viewer,
};

use crate::infrastructure::ports::LayoutRepo;

// =============================================================================
// Result Types
// =============================================================================

/// A layout loaded for editing or display, bound to its entity.
#[derive(Debug, Clone)]
pub struct LoadedSheet {
    pub entity: SheetEntity,
    pub tree: ComponentTree,
    /// When the layout was last persisted; `None` for a fresh default layout.
    pub saved_at: Option<DateTime<Utc>>,
}

/// What a completed edit did.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutChange {
    Added { ids: Vec<NodeId> },
    Deleted { key: Option<String> },
    Replaced { old: NodeId, new: NodeId },
    Moved { id: NodeId, target: NodeId },
    Reconfigured { id: NodeId },
    Reset,
}

/// Published after an edit has been saved. Views re-render on receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEvent {
    pub entity_id: EntityId,
    pub change: LayoutChange,
    pub saved_at: DateTime<Utc>,
}

/// Layout of an entity that has never been edited: one keyless panel.
pub fn default_layout() -> ComponentDoc {
    ComponentDoc::new("panel")
}

// =============================================================================
// Use Cases
// =============================================================================

/// Container for template editing use cases.
pub struct TemplateEditor {
    layouts: Arc<dyn LayoutRepo>,
    factory: Arc<ComponentFactory>,
    evaluator: Arc<dyn FormulaEvaluator>,
    root_address: String,
    events: broadcast::Sender<LayoutEvent>,
}

impl TemplateEditor {
    pub fn new(
        layouts: Arc<dyn LayoutRepo>,
        factory: Arc<ComponentFactory>,
        evaluator: Arc<dyn FormulaEvaluator>,
        root_address: impl Into<String>,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            layouts,
            factory,
            evaluator,
            root_address: root_address.into(),
            events,
        }
    }

    /// Receive a `LayoutEvent` for every saved edit from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LayoutEvent> {
        self.events.subscribe()
    }

    pub fn factory(&self) -> &ComponentFactory {
        &self.factory
    }

    /// Load the layout of `entity`, or the default layout if it has none.
    pub async fn load(&self, entity: SheetEntity) -> Result<LoadedSheet, TemplateEditError> {
        let stored = self.layouts.load(entity.id()).await?;
        let (tree, saved_at) = match stored {
            Some(stored) => (
                ComponentTree::from_value(stored.layout, &self.factory)?,
                Some(stored.saved_at),
            ),
            None => (ComponentTree::from_doc(&default_layout(), &self.factory)?, None),
        };

        tracing::debug!(
            entity_id = %entity.id(),
            nodes = tree.node_count(),
            stored = saved_at.is_some(),
            "Loaded sheet layout"
        );

        Ok(LoadedSheet {
            entity,
            tree: tree.with_root_address(self.root_address.clone()),
            saved_at,
        })
    }

    /// Render the sheet for `viewer`. Formula failures are logged, not fatal.
    pub fn render(&self, sheet: &LoadedSheet, viewer: Viewer, is_editable: bool) -> RenderOutput {
        let mut ctx = RenderContext::new(&sheet.entity, viewer, self.evaluator.as_ref());
        if !is_editable {
            ctx = ctx.read_only();
        }
        let output = sheet.tree.render(&ctx);

        for warning in &output.warnings {
            tracing::warn!(
                entity_id = %sheet.entity.id(),
                node = %warning.node,
                source = %warning.source,
                error = %warning.error,
                "Formula failed during render, using fallback"
            );
        }
        tracing::debug!(
            entity_id = %sheet.entity.id(),
            visible = output.element.is_some(),
            warnings = output.warnings.len(),
            "Rendered sheet"
        );
        output
    }

    /// Default value of every keyed component in the layout.
    pub fn default_values(
        &self,
        sheet: &LoadedSheet,
    ) -> Result<BTreeMap<String, Option<PropertyValue>>, TemplateEditError> {
        Ok(sheet.tree.get_all_properties(
            sheet.tree.root(),
            &sheet.entity,
            self.evaluator.as_ref(),
        )?)
    }

    /// Editor form for a new component of `technical_name`, or for the
    /// existing component `existing`.
    pub fn config_form(
        &self,
        sheet: &LoadedSheet,
        technical_name: &str,
        existing: Option<NodeId>,
    ) -> Result<ConfigForm, TemplateEditError> {
        let doc = match existing {
            Some(id) => {
                self.require_node(sheet, id)?;
                Some(sheet.tree.to_doc(id)?)
            }
            None => None,
        };
        Ok(self
            .factory
            .config_form(technical_name, doc.as_ref(), &sheet.entity)?)
    }

    /// Insert components into `container`.
    ///
    /// With `is_movement` unset, colliding keys are rewritten so the layout
    /// keeps one node per key.
    pub async fn add_component(
        &self,
        sheet: &mut LoadedSheet,
        container: NodeId,
        docs: Vec<ComponentDoc>,
        hint: PositionHint,
        is_movement: bool,
    ) -> Result<Vec<NodeId>, TemplateEditError> {
        self.require_node(sheet, container)?;
        for doc in &docs {
            self.factory.validate_config(doc)?;
        }

        let before = sheet.tree.clone();
        let ids = sheet
            .tree
            .add_new_component(container, docs, hint, is_movement, &self.factory)?;

        tracing::info!(
            entity_id = %sheet.entity.id(),
            container = %container,
            added = ids.len(),
            "Added components to layout"
        );
        self.commit(sheet, before, LayoutChange::Added { ids: ids.clone() })
            .await?;
        Ok(ids)
    }

    /// Create one component from a submitted editor form.
    pub async fn create_from_form(
        &self,
        sheet: &mut LoadedSheet,
        container: NodeId,
        form: &ConfigForm,
        hint: PositionHint,
    ) -> Result<NodeId, TemplateEditError> {
        let doc = self.factory.extract_config(form)?;
        let ids = self
            .add_component(sheet, container, vec![doc], hint, false)
            .await?;
        ids.first()
            .copied()
            .ok_or(TemplateEditError::ComponentNotFound(container))
    }

    pub async fn delete_component(
        &self,
        sheet: &mut LoadedSheet,
        id: NodeId,
    ) -> Result<ComponentDoc, TemplateEditError> {
        self.require_node(sheet, id)?;

        let before = sheet.tree.clone();
        let removed = sheet.tree.delete_component(id)?;

        tracing::info!(
            entity_id = %sheet.entity.id(),
            component = %id,
            key = ?removed.key,
            "Deleted component from layout"
        );
        self.commit(
            sheet,
            before,
            LayoutChange::Deleted {
                key: removed.key.clone(),
            },
        )
        .await?;
        Ok(removed)
    }

    pub async fn replace_component(
        &self,
        sheet: &mut LoadedSheet,
        old: NodeId,
        doc: &ComponentDoc,
    ) -> Result<NodeId, TemplateEditError> {
        self.require_node(sheet, old)?;
        self.factory.validate_config(doc)?;

        let before = sheet.tree.clone();
        let new = sheet.tree.replace_component(old, doc, &self.factory)?;

        tracing::info!(
            entity_id = %sheet.entity.id(),
            old = %old,
            new = %new,
            component_type = %doc.component_type,
            "Replaced component in layout"
        );
        self.commit(sheet, before, LayoutChange::Replaced { old, new })
            .await?;
        Ok(new)
    }

    /// Move a component to another slot, keeping its keys.
    pub async fn move_component(
        &self,
        sheet: &mut LoadedSheet,
        id: NodeId,
        target: NodeId,
        hint: PositionHint,
    ) -> Result<(), TemplateEditError> {
        self.require_node(sheet, id)?;
        self.require_node(sheet, target)?;

        let before = sheet.tree.clone();
        sheet.tree.move_component(id, target, hint)?;

        tracing::info!(
            entity_id = %sheet.entity.id(),
            component = %id,
            target = %target,
            "Moved component in layout"
        );
        self.commit(sheet, before, LayoutChange::Moved { id, target })
            .await
    }

    /// Apply a submitted editor form to an existing component.
    pub async fn edit_component(
        &self,
        sheet: &mut LoadedSheet,
        id: NodeId,
        form: &ConfigForm,
    ) -> Result<(), TemplateEditError> {
        self.require_node(sheet, id)?;
        let doc = self.factory.extract_config(form)?;
        self.factory.validate_config(&doc)?;

        let before = sheet.tree.clone();
        sheet.tree.reconfigure(id, &doc, &self.factory)?;

        tracing::info!(
            entity_id = %sheet.entity.id(),
            component = %id,
            component_type = %doc.component_type,
            "Reconfigured component"
        );
        self.commit(sheet, before, LayoutChange::Reconfigured { id })
            .await
    }

    /// Discard the whole layout and start over from the default.
    pub async fn reset_layout(&self, sheet: &mut LoadedSheet) -> Result<(), TemplateEditError> {
        let before = sheet.tree.clone();
        sheet.tree = ComponentTree::from_doc(&default_layout(), &self.factory)?
            .with_root_address(self.root_address.clone());

        tracing::info!(entity_id = %sheet.entity.id(), "Reset sheet layout");
        self.commit(sheet, before, LayoutChange::Reset).await
    }

    fn require_node(&self, sheet: &LoadedSheet, id: NodeId) -> Result<(), TemplateEditError> {
        match sheet.tree.get(id) {
            Some(_) => Ok(()),
            None => Err(TemplateEditError::ComponentNotFound(id)),
        }
    }

    /// Persist the edited tree. On failure the tree is restored to `before`.
    async fn commit(
        &self,
        sheet: &mut LoadedSheet,
        before: ComponentTree,
        change: LayoutChange,
    ) -> Result<(), TemplateEditError> {
        let entity_id = sheet.entity.id();
        let layout = match sheet.tree.to_value() {
            Ok(layout) => layout,
            Err(e) => {
                sheet.tree = before;
                return Err(e.into());
            }
        };

        let stored = match self.layouts.save(entity_id, &layout).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(
                    entity_id = %entity_id,
                    error = %e,
                    "Failed to save layout, edit rolled back"
                );
                sheet.tree = before;
                return Err(e.into());
            }
        };
        sheet.saved_at = Some(stored.saved_at);

        // No subscribers is fine; nobody is looking at the sheet.
        let _ = self.events.send(LayoutEvent {
            entity_id,
            change,
            saved_at: stored.saved_at,
        });
        Ok(())
    }
}
