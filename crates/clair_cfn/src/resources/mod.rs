//! Typed resource kinds.
//!
//! Each kind is a closed struct whose serialized form is the `Properties`
//! object of the declaration. Required properties are constructor arguments;
//! optional ones are `with_*` setters.

use serde::{Serialize, Serializer};

pub mod codebuild;
pub mod ec2;
pub mod ecr;
pub mod ecs;
pub mod elbv2;
pub mod iam;
pub mod logs;
pub mod rds;
pub mod s3;

/// Properties of one CloudFormation resource type.
pub trait ResourceProperties: Serialize {
    /// The CloudFormation type name, e.g. `AWS::ECS::Service`.
    const TYPE: &'static str;
}

/// Serialize a number the way string-typed CloudFormation properties expect it.
pub(crate) fn as_string<T: std::fmt::Display, S: Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
