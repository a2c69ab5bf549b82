extern crate self as sheetwright_domain;

// Value types shared by entities and formulas
pub mod types;

pub mod components;
pub mod entity;
pub mod error;
pub mod ids;
pub mod phrase;

// Re-export the component tree and its collaborators
pub use components::{
    ComponentBase, ComponentDoc, ComponentFactory, ComponentKind, ComponentTree, ComponentType,
    FieldProps, InputKind, LabelProps, Node, PanelProps, PositionHint, RenderContext,
    RenderOutput, TableProps, TreeBuilder, UnknownComponentPolicy, Viewer, DEFAULT_ROOT_ADDRESS,
};

pub use entity::{EntityKind, SheetEntity};
pub use error::{ComponentError, ConfigValidationKind, FormulaError};

// Re-export ID types
pub use ids::{EntityId, NodeId};

pub use phrase::{EvaluationContext, FormulaEvaluator, PhraseEvaluator, PhraseResult};
pub use types::{PropertyBag, PropertyValue};
