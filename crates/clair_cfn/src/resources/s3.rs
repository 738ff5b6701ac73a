//! S3 buckets.

use serde::Serialize;

use super::ResourceProperties;

/// `AWS::S3::Bucket`. With no name set the engine generates one.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bucket {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
}

impl ResourceProperties for Bucket {
    const TYPE: &'static str = "AWS::S3::Bucket";
}
