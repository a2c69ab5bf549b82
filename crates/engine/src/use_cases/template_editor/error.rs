//! Template editing errors.

use crate::infrastructure::ports::RepoError;
use sheetwright_domain::{ComponentError, NodeId};

/// Errors that can occur while editing a sheet layout.
#[derive(Debug, thiserror::Error)]
pub enum TemplateEditError {
    #[error("Component not found: {0}")]
    ComponentNotFound(NodeId),

    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl TemplateEditError {
    /// Whether the editing user should see this as a form validation message.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Component(e) if e.is_config_validation())
    }
}
