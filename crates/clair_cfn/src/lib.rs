//! # clair_cfn
//!
//! Typed CloudFormation template model for the Clair stacks.
//!
//! Resources are declared through closed, typed property structs and
//! registered into an explicit [`Template`] builder. Each registration
//! returns a typed handle that later declarations use to reference it, so a
//! template can only point at things it already contains.
//!
//! ## Example
//!
//! ```rust
//! use clair_cfn::resources::ecr::Repository;
//! use clair_cfn::{Expr, Output, OutputFormat, Pseudo, Resource, Template, TemplateRenderer};
//!
//! let mut template = Template::new().with_description("Registry only");
//! let repo = template
//!     .add_resource(Resource::new("Repository", Repository::named("clair")))
//!     .unwrap();
//!
//! template
//!     .add_output(
//!         "RepositoryURL",
//!         Output::new(Expr::concat(vec![
//!             Pseudo::AccountId.into(),
//!             ".dkr.ecr.".into(),
//!             Pseudo::Region.into(),
//!             ".amazonaws.com/".into(),
//!             repo.reference(),
//!         ])),
//!     )
//!     .unwrap();
//!
//! let json = TemplateRenderer::new(OutputFormat::Json).render(&template).unwrap();
//! assert!(json.contains("AWS::ECR::Repository"));
//! ```

pub mod error;
pub mod intrinsic;
pub mod logical_id;
pub mod render;
pub mod resources;
pub mod template;
pub mod validator;

pub use error::{TemplateError, TemplateResult};
pub use intrinsic::{Expr, Pseudo};
pub use logical_id::LogicalId;
pub use render::{OutputFormat, TemplateRenderer};
pub use resources::ResourceProperties;
pub use template::{
    Output, Parameter, ParameterRef, ParameterType, Resource, ResourceDeclaration, ResourceRef,
    Template, FORMAT_VERSION,
};
pub use validator::{TemplateValidator, ValidationResult};
