//! Fixed-size grid container.
//!
//! A table holds `rows x cols` cells, each empty or holding one component.
//! The grid shape always matches the declared dimensions: deserialization
//! pads short rows and drops cells beyond the bounds, and a resize keeps
//! cells by index.

use serde_json::Value;

use super::factory::{ComponentType, TreeBuilder};
use super::form::{ConfigForm, FormField, FormInput};
use super::{ComponentDoc, ComponentKind};
use crate::entity::SheetEntity;
use crate::error::{ComponentError, ConfigValidationKind};
use crate::ids::NodeId;

const ROWS: &str = "tableRows";
const COLS: &str = "tableCols";
const LAYOUT: &str = "tableLayout";

pub(crate) const ROW_COUNT: &str = "row count";
pub(crate) const COLUMN_COUNT: &str = "column count";

/// Upper bound of both grid dimensions. The grid is allocated up front, so
/// a stored layout must not be able to ask for an unbounded one.
pub const MAX_DIMENSION: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableProps {
    pub rows: usize,
    pub cols: usize,
    /// One alignment character per column (`l`, `c`, `r`).
    pub layout: Option<String>,
    pub contents: Vec<Vec<Option<NodeId>>>,
}

impl TableProps {
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            layout: None,
            contents: vec![vec![None; cols]; rows],
        }
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<NodeId> {
        self.contents.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    pub(crate) fn set_cell(&mut self, row: usize, col: usize, value: Option<NodeId>) {
        if let Some(slot) = self.contents.get_mut(row).and_then(|r| r.get_mut(col)) {
            *slot = value;
        }
    }

    /// Grid position of `child`, by identity.
    pub fn position(&self, child: NodeId) -> Option<(usize, usize)> {
        self.contents.iter().enumerate().find_map(|(r, row)| {
            row.iter()
                .position(|cell| *cell == Some(child))
                .map(|c| (r, c))
        })
    }

    /// Occupied cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, NodeId)> + '_ {
        self.contents.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(c, cell)| cell.map(|id| (r, c, id)))
        })
    }

    /// Changes the grid dimensions. Cells keep their index; the children of
    /// cells falling outside the new bounds are returned to the caller.
    pub(crate) fn resize(&mut self, rows: usize, cols: usize) -> Vec<NodeId> {
        let dropped = self
            .occupied()
            .filter(|(r, c, _)| *r >= rows || *c >= cols)
            .map(|(_, _, id)| id)
            .collect();

        self.contents.truncate(rows);
        for row in &mut self.contents {
            row.resize(cols, None);
        }
        self.contents.resize_with(rows, || vec![None; cols]);
        self.rows = rows;
        self.cols = cols;
        dropped
    }
}

/// Reads a grid dimension. Absent is `None`; anything but a positive
/// integer is a validation error naming `label`.
pub(crate) fn read_dimension(
    doc: &ComponentDoc,
    field: &str,
    label: &str,
) -> Result<Option<usize>, ComponentError> {
    let not_a_number = |value: &Value| {
        ComponentError::config(
            ConfigValidationKind::NotANumber {
                field: label.to_string(),
                value: value.to_string(),
            },
            doc,
        )
    };

    let value = match doc.field(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
    .ok_or_else(|| not_a_number(value))?;

    if number <= 0.0 {
        return Err(ComponentError::not_greater_than_zero(label, doc));
    }
    if number.fract() != 0.0 {
        return Err(not_a_number(value));
    }
    if number > MAX_DIMENSION as f64 {
        return Err(ComponentError::config(
            ConfigValidationKind::TooLarge {
                field: label.to_string(),
                value: value.to_string(),
                max: MAX_DIMENSION,
            },
            doc,
        ));
    }
    Ok(Some(number as usize))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableType;

impl ComponentType for TableType {
    fn technical_name(&self) -> &'static str {
        "table"
    }

    fn pretty_name(&self) -> &'static str {
        "Table"
    }

    fn variant_fields(&self) -> &'static [&'static str] {
        &["rows", "cols", "layout", "contents"]
    }

    fn build(
        &self,
        doc: &ComponentDoc,
        id: NodeId,
        builder: &mut TreeBuilder<'_>,
    ) -> Result<ComponentKind, ComponentError> {
        let rows = read_dimension(doc, "rows", ROW_COUNT)?.unwrap_or(1);
        let cols = read_dimension(doc, "cols", COLUMN_COUNT)?.unwrap_or(1);
        let mut table = TableProps::empty(rows, cols);
        table.layout = doc
            .field("layout")
            .and_then(Value::as_str)
            .map(str::to_string);

        let grid = match doc.field("contents") {
            Some(Value::Array(grid)) => grid.as_slice(),
            _ => &[],
        };
        for (r, row) in grid.iter().take(rows).enumerate() {
            let Some(cells) = row.as_array() else {
                continue;
            };
            for (c, cell) in cells.iter().take(cols).enumerate() {
                if cell.is_null() {
                    continue;
                }
                let child = ComponentDoc::from_value(cell.clone())?;
                let child_id = builder.create_one_component(&child, Some(id))?;
                table.set_cell(r, c, Some(child_id));
            }
        }

        Ok(ComponentKind::Table(table))
    }

    fn validate_config(&self, doc: &ComponentDoc) -> Result<(), ComponentError> {
        if read_dimension(doc, "rows", ROW_COUNT)?.is_none() {
            return Err(ComponentError::missing_field("rows", doc));
        }
        if read_dimension(doc, "cols", COLUMN_COUNT)?.is_none() {
            return Err(ComponentError::missing_field("cols", doc));
        }
        Ok(())
    }

    fn config_form(&self, existing: Option<&ComponentDoc>, _entity: &SheetEntity) -> ConfigForm {
        let read = |name: &str| {
            existing
                .and_then(|doc| doc.field(name))
                .and_then(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
        };

        let mut form = ConfigForm::with_base_fields(self.technical_name(), existing);
        form.push(FormField::new(ROWS, "Rows", FormInput::Number, read("rows")));
        form.push(FormField::new(COLS, "Columns", FormInput::Number, read("cols")));
        form.push(FormField::new(
            LAYOUT,
            "Column alignment (l, c, r)",
            FormInput::Text,
            read("layout"),
        ));
        form
    }

    fn extract_config(&self, form: &ConfigForm) -> Result<ComponentDoc, ComponentError> {
        let mut doc = form.extract_base()?;
        if let Some(rows) = form.number::<i64>(ROWS, ROW_COUNT, &doc)? {
            doc = doc.with_field("rows", rows);
        }
        if let Some(cols) = form.number::<i64>(COLS, COLUMN_COUNT, &doc)? {
            doc = doc.with_field("cols", cols);
        }
        if let Some(layout) = form.value(LAYOUT) {
            doc = doc.with_field("layout", layout);
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kind_of(err: ComponentError) -> ConfigValidationKind {
        match err {
            ComponentError::ConfigValidation { kind, .. } => kind,
            other => panic!("expected config validation error, got {other:?}"),
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn zero_rows_names_row_count() {
            let doc = ComponentDoc::new("table").with_field("rows", 0).with_field("cols", 2);
            let err = TableType.validate_config(&doc).expect_err("rows must be > 0");
            assert_eq!(
                kind_of(err),
                ConfigValidationKind::NotGreaterThanZero {
                    field: "row count".to_string()
                }
            );
        }

        #[test]
        fn negative_cols_names_column_count() {
            let doc = ComponentDoc::new("table").with_field("rows", 1).with_field("cols", -3);
            let err = TableType.validate_config(&doc).expect_err("cols must be > 0");
            assert_eq!(
                kind_of(err),
                ConfigValidationKind::NotGreaterThanZero {
                    field: "column count".to_string()
                }
            );
        }

        #[test]
        fn dimensions_are_required() {
            let doc = ComponentDoc::new("table").with_field("rows", 2);
            let err = TableType.validate_config(&doc).expect_err("cols missing");
            assert_eq!(
                kind_of(err),
                ConfigValidationKind::MissingField {
                    field: "cols".to_string()
                }
            );
        }

        #[test]
        fn non_numeric_dimension_is_rejected() {
            let doc = ComponentDoc::new("table")
                .with_field("rows", "many")
                .with_field("cols", 1);
            let err = TableType.validate_config(&doc).expect_err("rows not numeric");
            assert!(matches!(kind_of(err), ConfigValidationKind::NotANumber { .. }));
        }

        #[test]
        fn oversized_dimension_is_rejected_before_allocating() {
            let doc = ComponentDoc::from_value(json!({"type": "table", "rows": 1e13, "cols": 1}))
                .expect("valid document");
            let err = TableType.validate_config(&doc).expect_err("too many rows");
            assert_eq!(
                kind_of(err),
                ConfigValidationKind::TooLarge {
                    field: "row count".to_string(),
                    value: "10000000000000.0".to_string(),
                    max: MAX_DIMENSION,
                }
            );
        }

        #[test]
        fn largest_allowed_dimension_passes() {
            let doc = ComponentDoc::new("table")
                .with_field("rows", 1)
                .with_field("cols", MAX_DIMENSION);
            assert!(TableType.validate_config(&doc).is_ok());

            let doc = doc.with_field("cols", MAX_DIMENSION + 1);
            assert!(matches!(
                kind_of(TableType.validate_config(&doc).expect_err("one past the limit")),
                ConfigValidationKind::TooLarge { .. }
            ));
        }

        #[test]
        fn valid_dimensions_pass() {
            let doc = ComponentDoc::new("table").with_field("rows", 3).with_field("cols", "2");
            assert!(TableType.validate_config(&doc).is_ok());
        }
    }

    mod grid {
        use super::*;

        #[test]
        fn resize_keeps_cells_by_index() {
            let a = NodeId::new();
            let b = NodeId::new();
            let c = NodeId::new();
            let mut table = TableProps::empty(2, 2);
            table.set_cell(0, 0, Some(a));
            table.set_cell(0, 1, Some(b));
            table.set_cell(1, 0, Some(c));

            let dropped = table.resize(3, 1);

            assert_eq!(dropped, vec![b]);
            assert_eq!(table.contents, vec![vec![Some(a)], vec![Some(c)], vec![None]]);
            assert_eq!((table.rows, table.cols), (3, 1));
        }

        #[test]
        fn position_is_found_by_identity() {
            let target = NodeId::new();
            let mut table = TableProps::empty(2, 3);
            table.set_cell(1, 2, Some(target));

            assert_eq!(table.position(target), Some((1, 2)));
            assert_eq!(table.position(NodeId::new()), None);
        }

        #[test]
        fn occupied_cells_are_row_major() {
            let ids: Vec<_> = (0..3).map(|_| NodeId::new()).collect();
            let mut table = TableProps::empty(2, 2);
            table.set_cell(1, 0, Some(ids[2]));
            table.set_cell(0, 1, Some(ids[1]));
            table.set_cell(0, 0, Some(ids[0]));

            let order: Vec<_> = table.occupied().map(|(_, _, id)| id).collect();
            assert_eq!(order, ids);
        }
    }

    #[test]
    fn form_submission_keeps_invalid_numbers_for_validation() {
        let mut form = TableType.config_form(None, &SheetEntity::template("Hero"));
        form.set(ROWS, "0");
        form.set(COLS, "4");
        form.set(LAYOUT, "lcr");

        let doc = TableType.extract_config(&form).expect("numeric input");
        assert_eq!(doc.field("rows"), Some(&json!(0)));
        assert_eq!(doc.field("layout"), Some(&json!("lcr")));
        assert!(TableType.validate_config(&doc).is_err());
    }
}
