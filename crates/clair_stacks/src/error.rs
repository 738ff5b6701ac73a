//! Error types for stack generation.

use thiserror::Error;

/// Result type alias for stack operations.
pub type StackResult<T> = Result<T, StackError>;

/// Errors that can occur while generating a stack.
#[derive(Error, Debug)]
pub enum StackError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Template error: {0}")]
    Template(#[from] clair_cfn::TemplateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
