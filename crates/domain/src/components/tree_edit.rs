//! Structural mutations of a component tree.
//!
//! Every operation checks its arguments and builds any new nodes before it
//! touches the arena, so a failed call leaves the tree as it was. Saving the
//! result is the caller's job.

use super::factory::ComponentFactory;
use super::keys::update_keys_on_copy;
use super::panel::PanelProps;
use super::table::{read_dimension, COLUMN_COUNT, MAX_DIMENSION, ROW_COUNT};
use super::{ComponentBase, ComponentDoc, ComponentKind, ComponentTree, Node};
use crate::error::{ComponentError, ConfigValidationKind};
use crate::ids::NodeId;

/// Where to put new content inside a container.
///
/// Tables take either a `(row_num, col_num)` cell or, with neither given,
/// the cell currently holding `insert_before`. Panels insert before
/// `insert_before`, or append when it is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionHint {
    pub row_num: Option<usize>,
    pub col_num: Option<usize>,
    pub insert_before: Option<NodeId>,
}

impl PositionHint {
    pub fn end() -> Self {
        Self::default()
    }

    pub fn cell(row_num: usize, col_num: usize) -> Self {
        Self {
            row_num: Some(row_num),
            col_num: Some(col_num),
            insert_before: None,
        }
    }

    pub fn before(target: NodeId) -> Self {
        Self {
            insert_before: Some(target),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Cell(usize, usize),
    Index(usize),
}

impl ComponentTree {
    fn resolve_slot(&self, container: NodeId, hint: &PositionHint) -> Result<Slot, ComponentError> {
        match &self.node(container)?.kind {
            ComponentKind::Table(table) => match (hint.row_num, hint.col_num) {
                (Some(row), Some(col)) => {
                    if !table.in_bounds(row, col) {
                        return Err(ComponentError::invalid_argument(format!(
                            "cell ({}, {}) is outside the {}x{} grid",
                            row, col, table.rows, table.cols
                        )));
                    }
                    Ok(Slot::Cell(row, col))
                }
                (None, None) => hint
                    .insert_before
                    .and_then(|target| table.position(target))
                    .map(|(row, col)| Slot::Cell(row, col))
                    .ok_or_else(|| {
                        ComponentError::not_found("could not find position to add element")
                    }),
                _ => Err(ComponentError::invalid_argument(
                    "rowNum and colNum must be given together or not at all",
                )),
            },
            ComponentKind::Panel(panel) => {
                if hint.row_num.is_some() || hint.col_num.is_some() {
                    return Err(ComponentError::invalid_argument(
                        "panels do not take a row or column position",
                    ));
                }
                match hint.insert_before {
                    Some(target) => panel.position(target).map(Slot::Index).ok_or_else(|| {
                        ComponentError::not_found("could not find position to add element")
                    }),
                    None => Ok(Slot::Index(panel.contents.len())),
                }
            }
            other => Err(ComponentError::invalid_argument(format!(
                "{} is not a container",
                other.technical_name()
            ))),
        }
    }

    fn set_parent(&mut self, id: NodeId, parent: NodeId) {
        if let Ok(node) = self.node_mut(id) {
            node.parent = Some(parent);
        }
    }

    /// Puts already-built nodes into `slot`. An occupied cell, or several
    /// nodes for one cell, are wrapped in a keyless panel with the new nodes
    /// first and the previous occupant last.
    fn attach(&mut self, container: NodeId, slot: Slot, ids: &[NodeId]) -> Result<(), ComponentError> {
        match slot {
            Slot::Cell(row, col) => {
                let occupant = match &self.node(container)?.kind {
                    ComponentKind::Table(table) => table.cell(row, col),
                    _ => None,
                };
                let placed = match (ids, occupant) {
                    ([single], None) => *single,
                    _ => {
                        let wrapper = NodeId::new();
                        let contents: Vec<NodeId> = ids.iter().copied().chain(occupant).collect();
                        for child in &contents {
                            self.set_parent(*child, wrapper);
                        }
                        self.merge(
                            [(
                                wrapper,
                                Node {
                                    id: wrapper,
                                    parent: Some(container),
                                    base: ComponentBase::default(),
                                    kind: ComponentKind::Panel(PanelProps { contents }),
                                },
                            )]
                            .into(),
                        );
                        wrapper
                    }
                };
                self.set_parent(placed, container);
                if let ComponentKind::Table(table) = &mut self.node_mut(container)?.kind {
                    table.set_cell(row, col, Some(placed));
                }
            }
            Slot::Index(index) => {
                for id in ids {
                    self.set_parent(*id, container);
                }
                if let ComponentKind::Panel(panel) = &mut self.node_mut(container)?.kind {
                    let at = index.min(panel.contents.len());
                    panel.contents.splice(at..at, ids.iter().copied());
                }
            }
        }
        Ok(())
    }

    /// Clears the slot holding `id` in its parent. The node stays in the arena.
    fn detach(&mut self, id: NodeId) -> Result<NodeId, ComponentError> {
        let parent = self
            .node(id)?
            .parent
            .ok_or_else(|| ComponentError::invalid_argument("the root component has no parent"))?;
        match &mut self.node_mut(parent)?.kind {
            ComponentKind::Panel(panel) => panel.contents.retain(|child| *child != id),
            ComponentKind::Table(table) => {
                if let Some((row, col)) = table.position(id) {
                    table.set_cell(row, col, None);
                }
            }
            _ => {}
        }
        Ok(parent)
    }

    /// Inserts components built from `docs` into `container`.
    ///
    /// Unless `is_movement` is set, keys colliding with keys already in the
    /// layout are rewritten (`hp` becomes `hp_copy`). Returns the ids of the
    /// inserted nodes in input order.
    pub fn add_new_component(
        &mut self,
        container: NodeId,
        docs: Vec<ComponentDoc>,
        hint: PositionHint,
        is_movement: bool,
        factory: &ComponentFactory,
    ) -> Result<Vec<NodeId>, ComponentError> {
        if docs.is_empty() {
            return Err(ComponentError::invalid_argument("no components to add"));
        }
        let slot = self.resolve_slot(container, &hint)?;

        let docs = if is_movement {
            docs
        } else {
            let existing = self.all_keys();
            update_keys_on_copy(docs, existing.iter().map(String::as_str))
        };

        let mut builder = factory.builder();
        let ids = docs
            .iter()
            .map(|doc| builder.create_one_component(doc, Some(container)))
            .collect::<Result<Vec<_>, _>>()?;

        self.merge(builder.into_nodes());
        self.attach(container, slot, &ids)?;
        Ok(ids)
    }

    /// Removes `id` and its subtree. A table leaves an empty cell behind; a
    /// panel closes the gap. Returns the removed subtree as a document.
    pub fn delete_component(&mut self, id: NodeId) -> Result<ComponentDoc, ComponentError> {
        if id == self.root() {
            return Err(ComponentError::invalid_argument(
                "the root component cannot be deleted",
            ));
        }
        let doc = self.to_doc(id)?;
        self.detach(id)?;
        self.remove_subtree(id);
        Ok(doc)
    }

    /// Swaps `old` for a node built from `doc`, in the same slot.
    pub fn replace_component(
        &mut self,
        old: NodeId,
        doc: &ComponentDoc,
        factory: &ComponentFactory,
    ) -> Result<NodeId, ComponentError> {
        let parent = self.node(old)?.parent;

        let mut builder = factory.builder();
        let new_id = builder.create_one_component(doc, parent)?;
        let nodes = builder.into_nodes();

        match parent {
            None => {
                self.remove_subtree(old);
                self.merge(nodes);
                self.set_root(new_id);
            }
            Some(parent) => {
                self.merge(nodes);
                match &mut self.node_mut(parent)?.kind {
                    ComponentKind::Panel(panel) => {
                        if let Some(index) = panel.position(old) {
                            panel.contents[index] = new_id;
                        }
                    }
                    ComponentKind::Table(table) => {
                        if let Some((row, col)) = table.position(old) {
                            table.set_cell(row, col, Some(new_id));
                        }
                    }
                    _ => {}
                }
                self.remove_subtree(old);
            }
        }
        Ok(new_id)
    }

    /// Moves `id` into `target` at `hint`, keeping its keys and node ids.
    pub fn move_component(
        &mut self,
        id: NodeId,
        target: NodeId,
        hint: PositionHint,
    ) -> Result<(), ComponentError> {
        if id == self.root() {
            return Err(ComponentError::invalid_argument(
                "the root component cannot be moved",
            ));
        }
        self.node(id)?;
        if self.is_within(target, id) {
            return Err(ComponentError::invalid_argument(
                "cannot move a component into its own subtree",
            ));
        }
        if hint.insert_before == Some(id) {
            return Err(ComponentError::invalid_argument(
                "cannot move a component before itself",
            ));
        }
        self.resolve_slot(target, &hint)?;

        self.detach(id)?;
        // Detaching may shift panel indices, so resolve again.
        let slot = self.resolve_slot(target, &hint)?;
        self.attach(target, slot, &[id])
    }

    /// Applies an edited configuration to an existing node.
    ///
    /// The node keeps its id, its slot and (for containers) its contents.
    /// A table is resized to the new dimensions.
    pub fn reconfigure(
        &mut self,
        id: NodeId,
        doc: &ComponentDoc,
        factory: &ComponentFactory,
    ) -> Result<(), ComponentError> {
        let node = self.node(id)?;
        if node.technical_name() != doc.component_type {
            return Err(ComponentError::invalid_argument(format!(
                "cannot change a {} into a {}",
                node.technical_name(),
                doc.component_type
            )));
        }
        factory.validate_config(doc)?;
        if let Some(key) = &doc.key {
            let taken = self
                .find_by_key(key)
                .is_some_and(|holder| holder != id);
            if taken {
                return Err(ComponentError::config(
                    ConfigValidationKind::DuplicateKey { key: key.clone() },
                    doc,
                ));
            }
        }

        // Fields the edit form cannot express survive the edit.
        let known = factory
            .get(&doc.component_type)
            .map(|component_type| component_type.variant_fields())
            .unwrap_or(&[]);
        let mut base = ComponentBase::from_doc_keeping_extra(doc, known);
        for (name, value) in &node.base.extra {
            base.extra
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }

        let rebuilt = match &node.kind {
            ComponentKind::Label(_) | ComponentKind::Field(_) => {
                let component_type = factory
                    .get(&doc.component_type)
                    .ok_or_else(|| ComponentError::UnknownComponentType(doc.component_type.clone()))?;
                Some(component_type.build(doc, id, &mut factory.builder())?)
            }
            ComponentKind::Panel(_) | ComponentKind::Table(_) => None,
            ComponentKind::Inert(_) => {
                return Err(ComponentError::invalid_argument(
                    "components of an unknown type cannot be edited",
                ))
            }
        };
        let dimensions = match &node.kind {
            ComponentKind::Table(_) => Some((
                read_dimension(doc, "rows", ROW_COUNT)?.unwrap_or(1),
                read_dimension(doc, "cols", COLUMN_COUNT)?.unwrap_or(1),
            )),
            _ => None,
        };

        let node = self.node_mut(id)?;
        node.base = base;
        if let Some(kind) = rebuilt {
            node.kind = kind;
        }
        if let ComponentKind::Table(table) = &mut node.kind {
            table.layout = doc
                .field("layout")
                .and_then(|v| v.as_str())
                .map(str::to_string);
        }
        if let Some((rows, cols)) = dimensions {
            self.resize_table(id, rows, cols)?;
        }
        Ok(())
    }

    /// Changes a table's grid dimensions. Cells keep their index; components
    /// in cells outside the new bounds are removed.
    pub fn resize_table(&mut self, id: NodeId, rows: usize, cols: usize) -> Result<(), ComponentError> {
        if rows == 0 || cols == 0 {
            let doc = self.to_doc(id)?;
            let field = if rows == 0 { ROW_COUNT } else { COLUMN_COUNT };
            return Err(ComponentError::not_greater_than_zero(field, &doc));
        }
        if rows > MAX_DIMENSION || cols > MAX_DIMENSION {
            let doc = self.to_doc(id)?;
            let (field, value) = if rows > MAX_DIMENSION {
                (ROW_COUNT, rows)
            } else {
                (COLUMN_COUNT, cols)
            };
            return Err(ComponentError::config(
                ConfigValidationKind::TooLarge {
                    field: field.to_string(),
                    value: value.to_string(),
                    max: MAX_DIMENSION,
                },
                &doc,
            ));
        }
        let dropped = match &mut self.node_mut(id)?.kind {
            ComponentKind::Table(table) => table.resize(rows, cols),
            other => {
                return Err(ComponentError::invalid_argument(format!(
                    "{} is not a table",
                    other.technical_name()
                )))
            }
        };
        for child in dropped {
            self.remove_subtree(child);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tree::tests::{id_of, sheet};
    use super::*;
    use serde_json::json;

    fn factory() -> ComponentFactory {
        ComponentFactory::new()
    }

    fn label(key: &str) -> ComponentDoc {
        ComponentDoc::new("label").with_key(key)
    }

    fn empty_grid() -> ComponentTree {
        ComponentTree::from_value(
            json!({"type": "table", "key": "grid", "rows": 2, "cols": 2}),
            &factory(),
        )
        .expect("valid table")
    }

    mod table_insert {
        use super::*;

        #[test]
        fn fills_empty_cell() {
            let mut tree = empty_grid();
            let root = tree.root();

            let ids = tree
                .add_new_component(root, vec![label("a")], PositionHint::cell(1, 0), false, &factory())
                .expect("empty cell");

            let value = tree.to_value().expect("serializes");
            assert_eq!(value["contents"][1][0]["key"], json!("a"));
            assert_eq!(tree.parent(ids[0]), Some(root));
            assert_eq!(
                tree.template_address(ids[0]),
                Ok("body-contents-1-0".to_string())
            );
        }

        #[test]
        fn occupied_cell_is_wrapped_new_content_first() {
            let mut tree = empty_grid();
            let root = tree.root();
            tree.add_new_component(root, vec![label("a")], PositionHint::cell(0, 1), false, &factory())
                .expect("empty cell");

            tree.add_new_component(root, vec![label("b")], PositionHint::cell(0, 1), false, &factory())
                .expect("occupied cell");

            let value = tree.to_value().expect("serializes");
            let cell = &value["contents"][0][1];
            assert_eq!(cell["type"], json!("panel"));
            assert_eq!(cell["key"], json!(null));
            assert_eq!(cell["contents"][0]["key"], json!("b"));
            assert_eq!(cell["contents"][1]["key"], json!("a"));
            assert_eq!(tree.all_keys(), vec!["grid", "b", "a"]);
        }

        #[test]
        fn several_components_for_one_cell_are_wrapped() {
            let mut tree = empty_grid();
            let root = tree.root();

            tree.add_new_component(
                root,
                vec![label("a"), label("b")],
                PositionHint::cell(0, 0),
                false,
                &factory(),
            )
            .expect("empty cell");

            let value = tree.to_value().expect("serializes");
            assert_eq!(value["contents"][0][0]["type"], json!("panel"));
            assert_eq!(tree.all_keys(), vec!["grid", "a", "b"]);
        }

        #[test]
        fn insert_before_locates_the_cell() {
            let mut tree = sheet();
            let stats = id_of(&tree, "stats");
            let hp = id_of(&tree, "hp");

            tree.add_new_component(
                stats,
                vec![label("hpNote")],
                PositionHint::before(hp),
                false,
                &factory(),
            )
            .expect("target found");

            let value = tree.to_value().expect("serializes");
            let cell = &value["contents"][1]["contents"][1][1];
            assert_eq!(cell["contents"][0]["key"], json!("hpNote"));
            assert_eq!(cell["contents"][1]["key"], json!("hp"));
        }

        #[test]
        fn colliding_keys_are_rewritten() {
            let mut tree = sheet();
            let stats = id_of(&tree, "stats");

            let ids = tree
                .add_new_component(
                    stats,
                    vec![ComponentDoc::new("numberField").with_key("hp")],
                    PositionHint::cell(1, 0),
                    false,
                    &factory(),
                )
                .expect("empty cell");

            assert_eq!(tree.node(ids[0]).map(|n| n.key()), Ok(Some("hp_copy")));
        }

        #[test]
        fn movement_keeps_keys() {
            let mut tree = sheet();
            let stats = id_of(&tree, "stats");

            let ids = tree
                .add_new_component(
                    stats,
                    vec![ComponentDoc::new("numberField").with_key("hp")],
                    PositionHint::cell(1, 0),
                    true,
                    &factory(),
                )
                .expect("empty cell");

            assert_eq!(tree.node(ids[0]).map(|n| n.key()), Ok(Some("hp")));
        }
    }

    mod argument_contract {
        use super::*;

        #[test]
        fn row_without_column_is_invalid() {
            let mut tree = empty_grid();
            let before = tree.clone();
            let root = tree.root();
            let hint = PositionHint {
                row_num: Some(0),
                ..PositionHint::default()
            };

            let err = tree
                .add_new_component(root, vec![label("a")], hint, false, &factory())
                .expect_err("row without col");
            assert!(matches!(err, ComponentError::InvalidArgument(_)));
            assert_eq!(tree, before);
        }

        #[test]
        fn missing_insert_before_target_is_not_found() {
            let mut tree = empty_grid();
            let before = tree.clone();
            let root = tree.root();

            let err = tree
                .add_new_component(
                    root,
                    vec![label("a")],
                    PositionHint::before(NodeId::new()),
                    false,
                    &factory(),
                )
                .expect_err("unknown target");
            assert_eq!(
                err,
                ComponentError::NotFound("could not find position to add element".to_string())
            );
            assert_eq!(tree, before);
        }

        #[test]
        fn cell_outside_grid_is_invalid() {
            let mut tree = empty_grid();
            let root = tree.root();
            let err = tree
                .add_new_component(root, vec![label("a")], PositionHint::cell(2, 0), false, &factory())
                .expect_err("out of bounds");
            assert!(matches!(err, ComponentError::InvalidArgument(_)));
        }

        #[test]
        fn failed_build_leaves_tree_unchanged() {
            let mut tree = empty_grid();
            let before = tree.clone();
            let root = tree.root();

            let err = tree
                .add_new_component(
                    root,
                    vec![label("ok"), ComponentDoc::new("diceRoller")],
                    PositionHint::cell(0, 0),
                    false,
                    &factory(),
                )
                .expect_err("unknown type");
            assert!(matches!(err, ComponentError::UnknownComponentType(_)));
            assert_eq!(tree, before);
        }

        #[test]
        fn leaves_are_not_containers() {
            let mut tree = sheet();
            let title = id_of(&tree, "title");
            let err = tree
                .add_new_component(title, vec![label("a")], PositionHint::end(), false, &factory())
                .expect_err("label is a leaf");
            assert!(matches!(err, ComponentError::InvalidArgument(_)));
        }
    }

    mod panel_insert {
        use super::*;

        #[test]
        fn appends_without_hint() {
            let mut tree = sheet();
            let root = tree.root();
            tree.add_new_component(root, vec![label("footer")], PositionHint::end(), false, &factory())
                .expect("append");
            assert_eq!(tree.all_keys().last().map(String::as_str), Some("footer"));
        }

        #[test]
        fn inserts_before_target() {
            let mut tree = sheet();
            let root = tree.root();
            let stats = id_of(&tree, "stats");
            tree.add_new_component(root, vec![label("sub")], PositionHint::before(stats), false, &factory())
                .expect("insert");
            assert_eq!(&tree.all_keys()[..4], ["sheet", "title", "sub", "stats"]);
            assert_eq!(
                tree.template_address(stats),
                Ok("body-contents-2".to_string())
            );
        }

        #[test]
        fn rejects_cell_position() {
            let mut tree = sheet();
            let root = tree.root();
            let err = tree
                .add_new_component(root, vec![label("x")], PositionHint::cell(0, 0), false, &factory())
                .expect_err("panels have no cells");
            assert!(matches!(err, ComponentError::InvalidArgument(_)));
        }
    }

    mod deletion {
        use super::*;

        #[test]
        fn table_deletion_leaves_a_hole() {
            let mut tree = sheet();
            let str_id = id_of(&tree, "str");

            let removed = tree.delete_component(str_id).expect("deleted");

            assert_eq!(removed.key.as_deref(), Some("str"));
            let value = tree.to_value().expect("serializes");
            let grid = &value["contents"][1]["contents"];
            assert_eq!(grid[0][1], json!(null));
            assert_eq!(grid[0].as_array().map(Vec::len), Some(2));
            assert!(tree.get(str_id).is_none());
        }

        #[test]
        fn panel_deletion_closes_the_gap() {
            let mut tree = sheet();
            let stats = id_of(&tree, "stats");
            let hp = id_of(&tree, "hp");
            let nodes_before = tree.node_count();

            tree.delete_component(id_of(&tree, "title")).expect("deleted");

            assert_eq!(tree.children(tree.root()), vec![stats]);
            assert_eq!(tree.node_count(), nodes_before - 1);
            assert_eq!(
                tree.template_address(hp),
                Ok("body-contents-0-contents-1-1".to_string())
            );
        }

        #[test]
        fn deleting_a_container_drops_its_subtree() {
            let mut tree = sheet();
            let hp = id_of(&tree, "hp");
            tree.delete_component(id_of(&tree, "stats")).expect("deleted");
            assert!(tree.get(hp).is_none());
            assert_eq!(tree.all_keys(), vec!["sheet", "title"]);
        }

        #[test]
        fn root_cannot_be_deleted() {
            let mut tree = sheet();
            let root = tree.root();
            assert!(matches!(
                tree.delete_component(root),
                Err(ComponentError::InvalidArgument(_))
            ));
        }
    }

    mod replace_and_move {
        use super::*;

        #[test]
        fn replace_keeps_position() {
            let mut tree = sheet();
            let new_id = tree
                .replace_component(
                    id_of(&tree, "str"),
                    &ComponentDoc::new("textField").with_key("strength"),
                    &factory(),
                )
                .expect("replaced");

            let value = tree.to_value().expect("serializes");
            assert_eq!(value["contents"][1]["contents"][0][1]["key"], json!("strength"));
            assert_eq!(
                tree.template_address(new_id),
                Ok("body-contents-1-contents-0-1".to_string())
            );
            assert!(tree.find_by_key("str").is_none());
        }

        #[test]
        fn move_preserves_keys_and_ids() {
            let mut tree = sheet();
            let hp = id_of(&tree, "hp");
            let root = tree.root();

            tree.move_component(hp, root, PositionHint::end()).expect("moved");

            assert_eq!(tree.parent(hp), Some(root));
            assert_eq!(tree.node(hp).map(|n| n.key()), Ok(Some("hp")));
            let value = tree.to_value().expect("serializes");
            assert_eq!(value["contents"][1]["contents"][1][1], json!(null));
            assert_eq!(value["contents"][2]["key"], json!("hp"));
        }

        #[test]
        fn move_within_panel_reorders() {
            let mut tree = sheet();
            let root = tree.root();
            let title = id_of(&tree, "title");
            let stats = id_of(&tree, "stats");

            tree.move_component(stats, root, PositionHint::before(title))
                .expect("moved");
            assert_eq!(tree.children(root), vec![stats, title]);
        }

        #[test]
        fn move_into_own_subtree_is_invalid() {
            let mut tree = sheet();
            let before = tree.clone();
            let stats = id_of(&tree, "stats");

            let err = tree
                .move_component(stats, stats, PositionHint::cell(1, 0))
                .expect_err("own subtree");
            assert!(matches!(err, ComponentError::InvalidArgument(_)));
            assert_eq!(tree, before);
        }

        #[test]
        fn move_before_itself_is_invalid() {
            let mut tree = sheet();
            let title = id_of(&tree, "title");
            let root = tree.root();
            assert!(matches!(
                tree.move_component(title, root, PositionHint::before(title)),
                Err(ComponentError::InvalidArgument(_))
            ));
        }
    }

    mod reconfiguration {
        use super::*;

        fn table_doc(rows: i64, cols: i64) -> ComponentDoc {
            ComponentDoc::new("table")
                .with_key("stats")
                .with_field("rows", rows)
                .with_field("cols", cols)
                .with_field("layout", "rc")
        }

        #[test]
        fn table_resize_keeps_cells_by_index() {
            let mut tree = sheet();
            let stats = id_of(&tree, "stats");
            let hp = id_of(&tree, "hp");

            tree.reconfigure(stats, &table_doc(3, 1), &factory())
                .expect("valid config");

            let value = tree.to_value().expect("serializes");
            let table = &value["contents"][1];
            assert_eq!(table["rows"], json!(3));
            assert_eq!(table["cols"], json!(1));
            assert_eq!(table["layout"], json!("rc"));
            assert_eq!(table["contents"][0][0]["key"], json!("strLabel"));
            assert_eq!(table["contents"][1], json!([null]));
            assert_eq!(table["contents"][2], json!([null]));
            assert!(tree.get(hp).is_none());
        }

        #[test]
        fn zero_columns_is_rejected_without_change() {
            let mut tree = sheet();
            let before = tree.clone();
            let stats = id_of(&tree, "stats");

            let err = tree
                .reconfigure(stats, &table_doc(2, 0), &factory())
                .expect_err("cols must be > 0");
            assert!(err.to_string().contains("column count"));
            assert_eq!(tree, before);
        }

        #[test]
        fn oversized_table_is_rejected_without_change() {
            let mut tree = sheet();
            let before = tree.clone();
            let stats = id_of(&tree, "stats");

            let doc = ComponentDoc::new("table")
                .with_key("stats")
                .with_field("rows", 1e13)
                .with_field("cols", 1);
            let err = tree
                .reconfigure(stats, &doc, &factory())
                .expect_err("rows over the limit");
            assert!(matches!(
                err,
                ComponentError::ConfigValidation {
                    kind: ConfigValidationKind::TooLarge { .. },
                    ..
                }
            ));
            assert!(tree.resize_table(stats, MAX_DIMENSION + 1, 1).is_err());
            assert_eq!(tree, before);
        }

        #[test]
        fn fields_the_form_does_not_know_survive_reconfiguration() {
            let mut tree = ComponentTree::from_value(
                json!({"type": "label", "key": "title", "value": "Name", "fontWeight": "bold"}),
                &factory(),
            )
            .expect("valid label");
            let root = tree.root();

            tree.reconfigure(
                root,
                &ComponentDoc::new("label").with_key("title").with_field("value", "Hero"),
                &factory(),
            )
            .expect("valid");

            let value = tree.to_value().expect("serializes");
            assert_eq!(value["value"], json!("Hero"));
            assert_eq!(value["fontWeight"], json!("bold"));
        }

        #[test]
        fn leaf_reconfiguration_keeps_node_id() {
            let mut tree = sheet();
            let str_id = id_of(&tree, "str");
            let doc = ComponentDoc::new("numberField")
                .with_key("strength")
                .with_field("max", 30);

            tree.reconfigure(str_id, &doc, &factory()).expect("valid");

            assert_eq!(tree.find_by_key("strength"), Some(str_id));
            let value = tree.to_doc(str_id).expect("serializes").to_value();
            assert_eq!(value["max"], json!(30));
            assert!(value.get("defaultValue").is_none());
        }

        #[test]
        fn duplicate_key_is_rejected() {
            let mut tree = sheet();
            let str_id = id_of(&tree, "str");
            let err = tree
                .reconfigure(str_id, &ComponentDoc::new("numberField").with_key("hp"), &factory())
                .expect_err("hp is taken");
            assert!(matches!(
                err,
                ComponentError::ConfigValidation {
                    kind: ConfigValidationKind::DuplicateKey { .. },
                    ..
                }
            ));
        }

        #[test]
        fn type_change_is_invalid() {
            let mut tree = sheet();
            let title = id_of(&tree, "title");
            assert!(matches!(
                tree.reconfigure(title, &ComponentDoc::new("textField"), &factory()),
                Err(ComponentError::InvalidArgument(_))
            ));
        }
    }
}
