use super::field::InputKind;
use super::label::FULL_SIZE;
use super::render::{
    CellAlignment, ElementBody, RenderContext, RenderOutput, RenderWarning, RenderedCell,
    RenderedElement,
};
use super::{ComponentKind, ComponentTree, Node};
use crate::error::ComponentError;
use crate::ids::NodeId;
use crate::phrase::EvaluationContext;
use crate::types::PropertyValue;

struct Renderer<'t, 'c> {
    tree: &'t ComponentTree,
    ctx: &'t RenderContext<'c>,
    warnings: Vec<RenderWarning>,
}

impl<'t, 'c> Renderer<'t, 'c> {
    fn evaluate(&mut self, node: NodeId, source: String, formula: &str) -> Option<PropertyValue> {
        let context = EvaluationContext::new(source.clone());
        match self
            .ctx
            .evaluator
            .evaluate(formula, self.ctx.entity.props(), &context)
        {
            Ok(result) => Some(result.result),
            Err(error) => {
                self.warnings.push(RenderWarning {
                    node,
                    source,
                    error,
                });
                None
            }
        }
    }

    fn is_visible(&mut self, node: &Node, address: &str) -> bool {
        if self.ctx.viewer.role < node.base.role {
            return false;
        }
        match &node.base.visibility_formula {
            // A formula that cannot be evaluated does not hide anything.
            Some(formula) => {
                match self.evaluate(node.id, format!("{}.visibilityFormula", address), formula) {
                    Some(value) => value.is_truthy(),
                    None => true,
                }
            }
            None => true,
        }
    }

    fn add_control(container: NodeId, row_num: Option<usize>, col_num: Option<usize>) -> RenderedElement {
        RenderedElement::synthetic(ElementBody::AddComponent {
            container,
            row_num,
            col_num,
        })
    }

    fn render(&mut self, id: NodeId) -> Option<RenderedElement> {
        let tree = self.tree;
        let node = tree.get(id)?;
        let address = tree
            .template_address(id)
            .unwrap_or_else(|_| tree.root_address().to_string());
        if !self.is_visible(node, &address) {
            return None;
        }
        let editable = self.ctx.is_editable && self.ctx.viewer.permission >= node.base.permission;
        let in_template = self.ctx.entity.is_template();

        let body = match &node.kind {
            ComponentKind::Label(label) => {
                let text = match &label.value {
                    Some(phrase) => self
                        .evaluate(id, format!("{}.value", address), phrase)
                        .map(|value| value.to_string())
                        .unwrap_or_else(|| phrase.clone()),
                    None => String::new(),
                };
                ElementBody::Label {
                    text,
                    size: label.size.clone(),
                }
            }
            ComponentKind::Field(field) => {
                let stored = node
                    .key()
                    .and_then(|key| PropertyValue::lookup(self.ctx.entity.props(), key))
                    .filter(|value| !value.is_null())
                    .cloned();
                let value = match (stored, &field.default_value) {
                    (Some(value), _) => value,
                    (None, Some(formula)) => self
                        .evaluate(id, format!("{}.defaultValue", address), formula)
                        .unwrap_or_default(),
                    (None, None) if field.input == InputKind::Checkbox => {
                        PropertyValue::Boolean(false)
                    }
                    (None, None) => PropertyValue::Null,
                };
                ElementBody::Field {
                    input: field.input,
                    value,
                    editable,
                }
            }
            ComponentKind::Panel(panel) => {
                let mut children: Vec<_> = panel
                    .contents
                    .iter()
                    .filter_map(|child| self.render(*child))
                    .collect();
                if in_template {
                    children.push(Self::add_control(id, None, None));
                }
                ElementBody::Panel { children }
            }
            ComponentKind::Table(table) => {
                let mut rows = Vec::with_capacity(table.rows);
                for r in 0..table.rows {
                    let mut cells = Vec::with_capacity(table.cols);
                    for c in 0..table.cols {
                        let content = match table.cell(r, c) {
                            Some(child) => self.render(child),
                            None if in_template => Some(Self::add_control(id, Some(r), Some(c))),
                            None => Some(RenderedElement::synthetic(ElementBody::Label {
                                text: String::new(),
                                size: Some(FULL_SIZE.to_string()),
                            })),
                        };
                        cells.push(RenderedCell {
                            alignment: CellAlignment::for_column(table.layout.as_deref(), c),
                            content,
                        });
                    }
                    rows.push(cells);
                }
                ElementBody::Table { rows }
            }
            ComponentKind::Inert(_) => return None,
        };

        Some(RenderedElement {
            node: Some(id),
            key: node.base.key.clone(),
            template_address: Some(address),
            css_class: node.base.css_class.clone(),
            tooltip: node.base.tooltip.clone(),
            body,
        })
    }
}

impl ComponentTree {
    /// Renders the whole layout for one viewer.
    pub fn render(&self, ctx: &RenderContext<'_>) -> RenderOutput {
        let mut renderer = Renderer {
            tree: self,
            ctx,
            warnings: Vec::new(),
        };
        let element = renderer.render(self.root());
        RenderOutput {
            element,
            warnings: renderer.warnings,
        }
    }

    /// Renders the subtree rooted at `id`.
    pub fn render_node(&self, id: NodeId, ctx: &RenderContext<'_>) -> Result<RenderOutput, ComponentError> {
        self.node(id)?;
        let mut renderer = Renderer {
            tree: self,
            ctx,
            warnings: Vec::new(),
        };
        let element = renderer.render(id);
        Ok(RenderOutput {
            element,
            warnings: renderer.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tree::tests::{id_of, sheet};
    use super::super::{ComponentDoc, ComponentFactory, Viewer};
    use super::*;
    use crate::entity::SheetEntity;
    use crate::error::FormulaError;
    use crate::phrase::{MockFormulaEvaluator, PhraseEvaluator};
    use serde_json::json;

    fn grid_with_layout(layout: &str) -> ComponentTree {
        ComponentTree::from_value(
            json!({
                "type": "table", "key": "grid", "rows": 1, "cols": 3, "layout": layout,
                "contents": [[{"type": "label", "key": "a", "value": "A"}, null, null]]
            }),
            &ComponentFactory::new(),
        )
        .expect("valid table")
    }

    fn table_rows(element: &RenderedElement) -> &Vec<Vec<RenderedCell>> {
        match &element.body {
            ElementBody::Table { rows } => rows,
            other => panic!("expected table, got {other:?}"),
        }
    }

    fn panel_children(element: &RenderedElement) -> &Vec<RenderedElement> {
        match &element.body {
            ElementBody::Panel { children } => children,
            other => panic!("expected panel, got {other:?}"),
        }
    }

    mod tables {
        use super::*;

        #[test]
        fn columns_follow_layout_alignment() {
            let tree = grid_with_layout("lcr");
            let entity = SheetEntity::actor("Brom");
            let output = tree.render(&RenderContext::new(&entity, Viewer::default(), &PhraseEvaluator));

            let element = output.element.expect("visible");
            let row = &table_rows(&element)[0];
            let alignments: Vec<_> = row.iter().map(|cell| cell.alignment).collect();
            assert_eq!(
                alignments,
                vec![CellAlignment::Left, CellAlignment::Center, CellAlignment::Right]
            );
        }

        #[test]
        fn empty_cells_of_an_actor_render_full_size_labels() {
            let tree = grid_with_layout("");
            let entity = SheetEntity::actor("Brom");
            let output = tree.render(&RenderContext::new(&entity, Viewer::default(), &PhraseEvaluator));

            let element = output.element.expect("visible");
            let empty = table_rows(&element)[0][1].content.as_ref().expect("placeholder");
            assert_eq!(
                empty.body,
                ElementBody::Label {
                    text: String::new(),
                    size: Some("full-size".to_string())
                }
            );
        }

        #[test]
        fn empty_cells_of_a_template_offer_add_controls() {
            let tree = grid_with_layout("");
            let root = tree.root();
            let entity = SheetEntity::template("Hero");
            let output = tree.render(&RenderContext::new(&entity, Viewer::default(), &PhraseEvaluator));

            let element = output.element.expect("visible");
            let control = table_rows(&element)[0][2].content.as_ref().expect("control");
            assert_eq!(
                control.body,
                ElementBody::AddComponent {
                    container: root,
                    row_num: Some(0),
                    col_num: Some(2)
                }
            );
        }
    }

    mod visibility {
        use super::*;

        #[test]
        fn role_below_threshold_hides_node() {
            let mut tree = sheet();
            let title = id_of(&tree, "title");
            let doc = ComponentDoc::from_value(json!({"type": "label", "key": "title", "role": 2}))
                .expect("valid doc");
            tree.reconfigure(title, &doc, &ComponentFactory::new()).expect("valid");
            let entity = SheetEntity::actor("Brom");

            let player = tree.render(&RenderContext::new(&entity, Viewer::new(1, 0), &PhraseEvaluator));
            let gm = tree.render(&RenderContext::new(&entity, Viewer::new(2, 0), &PhraseEvaluator));

            let player_root = player.element.expect("visible");
            let gm_root = gm.element.expect("visible");
            assert_eq!(panel_children(&player_root).len(), 1);
            assert_eq!(panel_children(&gm_root).len(), 2);
        }

        #[test]
        fn falsy_visibility_formula_hides_node() {
            let tree = ComponentTree::from_value(
                json!({"type": "label", "key": "secret", "visibilityFormula": "${level > 3}$"}),
                &ComponentFactory::new(),
            )
            .expect("valid");
            let low = SheetEntity::actor("Brom").with_prop("level", 2i64);
            let high = SheetEntity::actor("Brom").with_prop("level", 5i64);

            assert!(tree
                .render(&RenderContext::new(&low, Viewer::default(), &PhraseEvaluator))
                .element
                .is_none());
            assert!(tree
                .render(&RenderContext::new(&high, Viewer::default(), &PhraseEvaluator))
                .element
                .is_some());
        }

        #[test]
        fn failing_visibility_formula_shows_node_and_warns() {
            let tree = ComponentTree::from_value(
                json!({"type": "label", "key": "note", "value": "Note", "visibilityFormula": "${1 / 0}$"}),
                &ComponentFactory::new(),
            )
            .expect("valid");
            let mut evaluator = MockFormulaEvaluator::new();
            evaluator
                .expect_evaluate()
                .withf(|_, _, context| context.source == "body.visibilityFormula")
                .times(1)
                .returning(|_, _, _| Err(FormulaError::DivisionByZero));
            evaluator
                .expect_evaluate()
                .withf(|formula, _, _| formula == "Note")
                .returning(|formula, _, _| {
                    Ok(crate::phrase::PhraseResult {
                        result: PropertyValue::from(formula),
                        values: Default::default(),
                    })
                });
            let entity = SheetEntity::actor("Brom");

            let output = tree.render(&RenderContext::new(&entity, Viewer::default(), &evaluator));

            assert!(output.element.is_some());
            assert_eq!(output.warnings.len(), 1);
            assert_eq!(output.warnings[0].error, FormulaError::DivisionByZero);
        }
    }

    mod values {
        use super::*;

        fn field_body(output: &RenderOutput, key: &str) -> ElementBody {
            fn find<'a>(element: &'a RenderedElement, key: &str) -> Option<&'a RenderedElement> {
                if element.key.as_deref() == Some(key) {
                    return Some(element);
                }
                match &element.body {
                    ElementBody::Panel { children } => children.iter().find_map(|c| find(c, key)),
                    ElementBody::Table { rows } => rows
                        .iter()
                        .flatten()
                        .filter_map(|cell| cell.content.as_ref())
                        .find_map(|c| find(c, key)),
                    _ => None,
                }
            }
            let root = output.element.as_ref().expect("visible");
            find(root, key).expect("rendered").body.clone()
        }

        #[test]
        fn stored_value_wins_over_default() {
            let tree = sheet();
            let entity = SheetEntity::actor("Brom").with_prop("str", 14i64);
            let output = tree.render(&RenderContext::new(&entity, Viewer::new(0, 1), &PhraseEvaluator));

            assert_eq!(
                field_body(&output, "str"),
                ElementBody::Field {
                    input: InputKind::Number,
                    value: PropertyValue::Integer(14),
                    editable: true
                }
            );
            assert_eq!(
                field_body(&output, "hp"),
                ElementBody::Field {
                    input: InputKind::Number,
                    value: PropertyValue::Integer(28),
                    editable: true
                }
            );
        }

        #[test]
        fn editing_needs_permission_and_editable_context() {
            let tree = sheet();
            let entity = SheetEntity::actor("Brom");

            let low = tree.render(&RenderContext::new(&entity, Viewer::new(0, 0), &PhraseEvaluator));
            let locked = tree.render(
                &RenderContext::new(&entity, Viewer::new(0, 5), &PhraseEvaluator).read_only(),
            );

            assert!(matches!(
                field_body(&low, "str"),
                ElementBody::Field { editable: false, .. }
            ));
            assert!(matches!(
                field_body(&locked, "str"),
                ElementBody::Field { editable: false, .. }
            ));
        }

        #[test]
        fn label_text_is_evaluated() {
            let tree = sheet();
            let entity = SheetEntity::actor("Brom").with_prop("name", "Brom the Bold");
            let output = tree.render(&RenderContext::new(&entity, Viewer::default(), &PhraseEvaluator));

            assert!(matches!(
                field_body(&output, "title"),
                ElementBody::Label { text, .. } if text == "Brom the Bold"
            ));
        }

        #[test]
        fn template_panels_end_with_add_control() {
            let tree = sheet();
            let entity = SheetEntity::template("Hero");
            let output = tree.render(&RenderContext::new(&entity, Viewer::default(), &PhraseEvaluator));

            let root = output.element.expect("visible");
            let last = panel_children(&root).last().expect("children");
            assert!(matches!(last.body, ElementBody::AddComponent { row_num: None, .. }));
        }
    }

    #[test]
    fn inert_nodes_render_nothing() {
        let factory = ComponentFactory::new().with_unknown_policy(super::super::UnknownComponentPolicy::Preserve);
        let tree = ComponentTree::from_value(json!({"type": "diceRoller"}), &factory).expect("kept");
        let entity = SheetEntity::actor("Brom");
        let output = tree.render(&RenderContext::new(&entity, Viewer::default(), &PhraseEvaluator));
        assert!(output.element.is_none());
    }

    #[test]
    fn render_node_of_unknown_id_is_not_found() {
        let tree = sheet();
        let entity = SheetEntity::actor("Brom");
        let ctx = RenderContext::new(&entity, Viewer::default(), &PhraseEvaluator);
        assert!(matches!(
            tree.render_node(NodeId::new(), &ctx),
            Err(ComponentError::NotFound(_))
        ));
    }
}
