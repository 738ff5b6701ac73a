//! Error types for template construction and rendering.

use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while building or rendering a template.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Duplicate logical id: {0}")]
    DuplicateLogicalId(String),

    #[error("Invalid logical id '{id}': {message}")]
    InvalidLogicalId { id: String, message: String },

    #[error("Dangling reference in {from}: '{target}' is not declared in this template")]
    DanglingReference { from: String, target: String },

    #[error("Invalid property {property}: {message}")]
    InvalidProperty { property: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    pub(crate) fn invalid_property(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidProperty {
            property: property.into(),
            message: message.into(),
        }
    }
}
