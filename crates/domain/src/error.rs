//! Error types for the component tree.
//!
//! Every tree operation returns `ComponentError`. The variants map onto how a
//! caller is expected to react:
//! - `ConfigValidation`: bad authored configuration, shown to the editing user
//! - `InvalidArgument`: contract violation by the calling code
//! - `NotFound`: the mutation target does not exist
//! - `UnknownComponentType`: a document names a kind the factory does not know
//! - `Deserialization`: the document is not a component document at all

use thiserror::Error;

use crate::components::ComponentDoc;

/// Why an authored component configuration was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigValidationKind {
    #[error("{field} is not greater than zero")]
    NotGreaterThanZero { field: String },

    #[error("{field} {value} is larger than the maximum of {max}")]
    TooLarge { field: String, value: String, max: usize },

    #[error("missing required field '{field}'")]
    MissingField { field: String },

    #[error("invalid key '{key}': only letters, digits and underscores are allowed")]
    InvalidKey { key: String },

    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: String, value: String },

    #[error("key '{key}' is already used by another component")]
    DuplicateKey { key: String },

    #[error("minimum {min} is greater than maximum {max}")]
    InvalidRange { min: f64, max: f64 },
}

/// Unified error type for component tree operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComponentError {
    /// Authored configuration is structurally wrong. Carries the offending
    /// document for diagnostics.
    #[error("Invalid component configuration: {kind}")]
    ConfigValidation {
        kind: ConfigValidationKind,
        doc: Box<ComponentDoc>,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown component type: {0}")]
    UnknownComponentType(String),

    #[error("Malformed component document: {0}")]
    Deserialization(String),
}

impl ComponentError {
    pub fn config(kind: ConfigValidationKind, doc: &ComponentDoc) -> Self {
        Self::ConfigValidation {
            kind,
            doc: Box::new(doc.clone()),
        }
    }

    /// Creates a "not greater than zero" validation error naming the field.
    pub fn not_greater_than_zero(field: impl Into<String>, doc: &ComponentDoc) -> Self {
        Self::config(
            ConfigValidationKind::NotGreaterThanZero {
                field: field.into(),
            },
            doc,
        )
    }

    pub fn missing_field(field: impl Into<String>, doc: &ComponentDoc) -> Self {
        Self::config(
            ConfigValidationKind::MissingField {
                field: field.into(),
            },
            doc,
        )
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn deserialization(msg: impl ToString) -> Self {
        Self::Deserialization(msg.to_string())
    }

    pub fn is_config_validation(&self) -> bool {
        matches!(self, Self::ConfigValidation { .. })
    }
}

/// Failure to evaluate a computed phrase.
///
/// Missing property references are never an error; they resolve to null.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("Unterminated formula block starting at offset {0}")]
    UnterminatedBlock(usize),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Function '{name}' expects {expected} arguments, got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Cannot use {0} in arithmetic")]
    NotNumeric(String),
}
