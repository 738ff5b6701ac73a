//! CodeBuild projects.

use serde::{Deserialize, Serialize};

use super::{is_false, ResourceProperties};
use crate::intrinsic::Expr;
use crate::template::ResourceRef;

use super::iam::Role;
use super::s3::Bucket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactsType {
    S3,
    NoArtifacts,
    Codepipeline,
}

/// Where build output goes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Artifacts {
    #[serde(rename = "Type")]
    pub artifacts_type: ArtifactsType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Expr>,
}

impl Artifacts {
    /// Upload artifacts named `name` into `bucket`.
    pub fn s3(name: impl Into<String>, bucket: &ResourceRef<Bucket>) -> Self {
        Self {
            artifacts_type: ArtifactsType::S3,
            name: Some(name.into()),
            location: Some(bucket.reference()),
        }
    }

    pub fn none() -> Self {
        Self {
            artifacts_type: ArtifactsType::NoArtifacts,
            name: None,
            location: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputeType {
    #[serde(rename = "BUILD_GENERAL1_SMALL")]
    Small,
    #[serde(rename = "BUILD_GENERAL1_MEDIUM")]
    Medium,
    #[serde(rename = "BUILD_GENERAL1_LARGE")]
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvironmentType {
    LinuxContainer,
    ArmContainer,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: Expr,
}

/// The build container.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
    pub compute_type: ComputeType,
    pub image: String,
    #[serde(rename = "Type")]
    pub environment_type: EnvironmentType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub environment_variables: Vec<EnvironmentVariable>,
    #[serde(skip_serializing_if = "is_false")]
    pub privileged_mode: bool,
}

impl Environment {
    pub fn linux(compute_type: ComputeType, image: impl Into<String>) -> Self {
        Self {
            compute_type,
            image: image.into(),
            environment_type: EnvironmentType::LinuxContainer,
            environment_variables: Vec::new(),
            privileged_mode: false,
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.environment_variables.push(EnvironmentVariable {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Needed to run the Docker daemon inside the build.
    pub fn privileged(mut self) -> Self {
        self.privileged_mode = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Github,
    Codecommit,
    S3,
    NoSource,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Source {
    #[serde(rename = "Type")]
    pub source_type: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Source {
    pub fn github(location: impl Into<String>) -> Self {
        Self {
            source_type: SourceType::Github,
            location: Some(location.into()),
        }
    }
}

/// `AWS::CodeBuild::Project`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub name: String,
    pub artifacts: Artifacts,
    pub environment: Environment,
    pub service_role: Expr,
    pub source: Source,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        service_role: &ResourceRef<Role>,
        source: Source,
        environment: Environment,
        artifacts: Artifacts,
    ) -> Self {
        Self {
            name: name.into(),
            artifacts,
            environment,
            service_role: service_role.reference(),
            source,
        }
    }
}

impl ResourceProperties for Project {
    const TYPE: &'static str = "AWS::CodeBuild::Project";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_environment_serialization() {
        let env = Environment::linux(ComputeType::Small, "aws/codebuild/docker:17.09.0")
            .with_variable("IMAGE_TAG", "latest")
            .privileged();

        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({
                "ComputeType": "BUILD_GENERAL1_SMALL",
                "Image": "aws/codebuild/docker:17.09.0",
                "Type": "LINUX_CONTAINER",
                "EnvironmentVariables": [{"Name": "IMAGE_TAG", "Value": "latest"}],
                "PrivilegedMode": true
            })
        );
    }

    #[test]
    fn test_source_type_names() {
        let value = serde_json::to_value(Source::github("https://example.com/repo")).unwrap();
        assert_eq!(value["Type"], json!("GITHUB"));
        assert_eq!(serde_json::to_value(Artifacts::none()).unwrap(), json!({"Type": "NO_ARTIFACTS"}));
    }
}
