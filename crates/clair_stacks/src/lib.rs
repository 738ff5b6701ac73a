//! # clair_stacks
//!
//! CloudFormation generators for running Clair on AWS.
//!
//! - [`build`]: ECR repository plus a CodeBuild project that builds the image
//! - [`deploy`]: Fargate service behind an ALB with a Postgres RDS backend
//!
//! Each generator is one pass over an explicit [`clair_cfn::Template`]; the
//! settings default to the values the stacks have always shipped with and
//! can be overridden from YAML.
//!
//! ## Example
//!
//! ```rust
//! use clair_stacks::{StackKind, deploy::DeploySettings};
//!
//! let template = clair_stacks::deploy::generate(&DeploySettings::default()).unwrap();
//! assert!(template.resource("ClairService").is_some());
//!
//! let build = StackKind::Build.generate(None).unwrap();
//! assert!(build.output("RepositoryURL").is_some());
//! ```

pub mod build;
pub mod deploy;
pub mod error;
pub mod settings;

use std::path::Path;

use clair_cfn::Template;

pub use build::BuildSettings;
pub use deploy::{DatabaseSettings, DeploySettings, HealthCheckSettings};
pub use error::{StackError, StackResult};
pub use settings::StackSettings;

/// The generators this crate provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackKind {
    Build,
    Deploy,
}

impl StackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackKind::Build => "build",
            StackKind::Deploy => "deploy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "build" => Some(StackKind::Build),
            "deploy" | "deploy-fargate" => Some(StackKind::Deploy),
            _ => None,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![StackKind::Build, StackKind::Deploy]
    }

    /// Load settings (from `config` if given) and generate the template.
    pub fn generate(&self, config: Option<&Path>) -> StackResult<Template> {
        match self {
            StackKind::Build => build::generate(&BuildSettings::load(config)?),
            StackKind::Deploy => deploy::generate(&DeploySettings::load(config)?),
        }
    }

    /// The default settings of this generator as YAML.
    pub fn default_settings_yaml(&self) -> StackResult<String> {
        let yaml = match self {
            StackKind::Build => serde_yaml::to_string(&BuildSettings::default())?,
            StackKind::Deploy => serde_yaml::to_string(&DeploySettings::default())?,
        };
        Ok(yaml)
    }
}

impl std::fmt::Display for StackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
