//! Abstract render output.
//!
//! Rendering produces a tree of `RenderedElement`s that a front end turns
//! into its own widgets. Nothing here knows about markup or styling beyond
//! the CSS hint carried through from the layout.

use serde::{Deserialize, Serialize};

use crate::entity::SheetEntity;
use crate::error::FormulaError;
use crate::ids::NodeId;
use crate::phrase::FormulaEvaluator;
use crate::types::PropertyValue;

use super::field::InputKind;

/// Who is looking at the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewer {
    pub role: u32,
    pub permission: u32,
}

impl Viewer {
    pub fn new(role: u32, permission: u32) -> Self {
        Self { role, permission }
    }
}

/// Everything a render pass reads.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub entity: &'a SheetEntity,
    pub viewer: Viewer,
    pub evaluator: &'a dyn FormulaEvaluator,
    pub is_editable: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(entity: &'a SheetEntity, viewer: Viewer, evaluator: &'a dyn FormulaEvaluator) -> Self {
        Self {
            entity,
            viewer,
            evaluator,
            is_editable: true,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.is_editable = false;
        self
    }
}

/// Horizontal alignment of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellAlignment {
    Left,
    Center,
    Right,
}

impl CellAlignment {
    /// Alignment of column `col` from a layout string such as `"lcr"`.
    /// Missing or unknown characters align left.
    pub fn for_column(layout: Option<&str>, col: usize) -> Self {
        match layout.and_then(|l| l.chars().nth(col)) {
            Some('c') => CellAlignment::Center,
            Some('r') => CellAlignment::Right,
            _ => CellAlignment::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedCell {
    pub alignment: CellAlignment,
    /// `None` when the cell's component is hidden from this viewer.
    pub content: Option<RenderedElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum ElementBody {
    Label {
        text: String,
        size: Option<String>,
    },
    Field {
        input: InputKind,
        value: PropertyValue,
        editable: bool,
    },
    Panel {
        children: Vec<RenderedElement>,
    },
    Table {
        rows: Vec<Vec<RenderedCell>>,
    },
    /// Editing affordance: "add a component here".
    AddComponent {
        container: NodeId,
        row_num: Option<usize>,
        col_num: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedElement {
    /// Source node; `None` for synthetic elements like empty-cell labels.
    pub node: Option<NodeId>,
    pub key: Option<String>,
    pub template_address: Option<String>,
    pub css_class: Option<String>,
    pub tooltip: Option<String>,
    pub body: ElementBody,
}

impl RenderedElement {
    pub(crate) fn synthetic(body: ElementBody) -> Self {
        Self {
            node: None,
            key: None,
            template_address: None,
            css_class: None,
            tooltip: None,
            body,
        }
    }
}

/// A formula that failed during render. The render continues with a
/// fallback value; callers decide how loudly to report these.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderWarning {
    pub node: NodeId,
    pub source: String,
    pub error: FormulaError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    /// `None` when the rendered node is hidden.
    pub element: Option<RenderedElement>,
    pub warnings: Vec<RenderWarning>,
}
