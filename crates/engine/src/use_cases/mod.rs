//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific area of sheet authoring.

pub mod template_editor;

// Re-export main types
pub use template_editor::{
    LayoutChange, LayoutEvent, LoadedSheet, TemplateEditError, TemplateEditor,
};
