//! Elastic Container Registry.

use serde::Serialize;

use super::ResourceProperties;

/// `AWS::ECR::Repository`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Repository {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_name: Option<String>,
}

impl Repository {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            repository_name: Some(name.into()),
        }
    }
}

impl ResourceProperties for Repository {
    const TYPE: &'static str = "AWS::ECR::Repository";
}
