//! The template document and its builder operations.
//!
//! A [`Template`] is filled in a single pass. Each `add_*` call validates the
//! logical id, checks that every reference inside the new entry points at
//! something already declared, and appends it in call order. Entries cannot
//! be changed or removed afterwards.

use std::fmt;
use std::marker::PhantomData;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};
use crate::intrinsic::{collect_references, Expr, Pseudo};
use crate::logical_id::LogicalId;
use crate::resources::ResourceProperties;

/// The template format version CloudFormation currently understands.
pub const FORMAT_VERSION: &str = "2010-09-09";

/// Types a template parameter can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParameterType {
    String,
    #[serde(rename = "AWS::EC2::VPC::Id")]
    VpcId,
    #[serde(rename = "AWS::EC2::Subnet::Id")]
    SubnetId,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "String",
            ParameterType::VpcId => "AWS::EC2::VPC::Id",
            ParameterType::SubnetId => "AWS::EC2::Subnet::Id",
        }
    }
}

/// A value supplied by whoever applies the template.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub param_type: ParameterType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_echo: bool,
}

impl Parameter {
    pub fn new(param_type: ParameterType) -> Self {
        Self {
            param_type,
            description: None,
            default: None,
            no_echo: false,
        }
    }

    pub fn string() -> Self {
        Self::new(ParameterType::String)
    }

    pub fn vpc_id() -> Self {
        Self::new(ParameterType::VpcId)
    }

    pub fn subnet_id() -> Self {
        Self::new(ParameterType::SubnetId)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Mask the value in console and API output.
    pub fn no_echo(mut self) -> Self {
        self.no_echo = true;
        self
    }
}

/// A value the stack exposes once created.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: Expr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<OutputExport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutputExport {
    pub name: Expr,
}

impl Output {
    pub fn new(value: Expr) -> Self {
        Self {
            description: None,
            value,
            export: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_export_name(mut self, name: impl Into<Expr>) -> Self {
        self.export = Some(OutputExport { name: name.into() });
        self
    }
}

/// A resource waiting to be added to a template.
pub struct Resource<K> {
    logical_id: String,
    properties: K,
    depends_on: Vec<LogicalId>,
}

impl<K: ResourceProperties> Resource<K> {
    pub fn new(logical_id: impl Into<String>, properties: K) -> Self {
        Self {
            logical_id: logical_id.into(),
            properties,
            depends_on: Vec::new(),
        }
    }

    /// Create this resource only after `dependency` exists.
    pub fn depends_on<D>(mut self, dependency: &ResourceRef<D>) -> Self {
        self.depends_on.push(dependency.logical_id().clone());
        self
    }
}

/// Handle to a declared resource of kind `K`.
///
/// Only [`Template::add_resource`] hands these out, so a handle always names
/// a resource that was declared before the code holding it runs.
pub struct ResourceRef<K> {
    logical_id: LogicalId,
    _kind: PhantomData<fn() -> K>,
}

impl<K> ResourceRef<K> {
    fn new(logical_id: LogicalId) -> Self {
        Self {
            logical_id,
            _kind: PhantomData,
        }
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    /// `{"Ref": id}`. What it resolves to depends on the resource kind.
    pub fn reference(&self) -> Expr {
        Expr::Ref(self.logical_id.to_string())
    }

    pub(crate) fn get_att(&self, attribute: &str) -> Expr {
        Expr::GetAtt(self.logical_id.to_string(), attribute.to_string())
    }
}

impl<K> Clone for ResourceRef<K> {
    fn clone(&self) -> Self {
        Self::new(self.logical_id.clone())
    }
}

impl<K> fmt::Debug for ResourceRef<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceRef").field(&self.logical_id).finish()
    }
}

/// Handle to a declared parameter.
#[derive(Debug, Clone)]
pub struct ParameterRef {
    logical_id: LogicalId,
}

impl ParameterRef {
    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn reference(&self) -> Expr {
        Expr::Ref(self.logical_id.to_string())
    }
}

/// A resource as stored in the template.
#[derive(Debug, Clone)]
pub struct ResourceDeclaration {
    kind: &'static str,
    properties: Value,
    depends_on: Vec<LogicalId>,
}

impl ResourceDeclaration {
    /// The CloudFormation type, e.g. `AWS::S3::Bucket`.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn properties(&self) -> &Value {
        &self.properties
    }

    pub fn depends_on(&self) -> &[LogicalId] {
        &self.depends_on
    }

    fn has_properties(&self) -> bool {
        match &self.properties {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        }
    }
}

impl Serialize for ResourceDeclaration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("Type", self.kind)?;
        if self.has_properties() {
            map.serialize_entry("Properties", &self.properties)?;
        }
        match self.depends_on.as_slice() {
            [] => {}
            [single] => map.serialize_entry("DependsOn", single)?,
            many => map.serialize_entry("DependsOn", many)?,
        }
        map.end()
    }
}

/// An ordered list of named entries rendered as a JSON object.
struct Section<'a, T>(&'a [(LogicalId, T)]);

impl<T: Serialize> Serialize for Section<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, entry) in self.0 {
            map.serialize_entry(id, entry)?;
        }
        map.end()
    }
}

/// A CloudFormation template under construction.
#[derive(Debug, Clone, Default)]
pub struct Template {
    format_version: Option<String>,
    description: Option<String>,
    parameters: Vec<(LogicalId, Parameter)>,
    resources: Vec<(LogicalId, ResourceDeclaration)>,
    outputs: Vec<(LogicalId, Output)>,
}

impl Template {
    /// Create an empty template.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Stamp `AWSTemplateFormatVersion` with [`FORMAT_VERSION`].
    pub fn with_format_version(mut self) -> Self {
        self.format_version = Some(FORMAT_VERSION.to_string());
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn format_version(&self) -> Option<&str> {
        self.format_version.as_deref()
    }

    /// Declare a parameter.
    pub fn add_parameter(
        &mut self,
        logical_id: impl Into<String>,
        parameter: Parameter,
    ) -> TemplateResult<ParameterRef> {
        let id = LogicalId::new(logical_id)?;
        self.ensure_unreferenced_name(&id)?;

        debug!("Declaring parameter {} ({})", id, parameter.param_type.as_str());
        self.parameters.push((id.clone(), parameter));
        Ok(ParameterRef { logical_id: id })
    }

    /// Declare a resource and get a typed handle to it.
    pub fn add_resource<K: ResourceProperties>(
        &mut self,
        resource: Resource<K>,
    ) -> TemplateResult<ResourceRef<K>> {
        let id = LogicalId::new(resource.logical_id)?;
        self.ensure_unreferenced_name(&id)?;

        let properties = serde_json::to_value(&resource.properties)?;
        let mut targets = Vec::new();
        collect_references(&properties, &mut targets);
        for target in &targets {
            self.ensure_declared(&id, target)?;
        }

        for dependency in &resource.depends_on {
            if self.resource(dependency.as_str()).is_none() {
                return Err(TemplateError::DanglingReference {
                    from: id.to_string(),
                    target: dependency.to_string(),
                });
            }
        }

        debug!("Declaring resource {} ({})", id, K::TYPE);
        self.resources.push((
            id.clone(),
            ResourceDeclaration {
                kind: K::TYPE,
                properties,
                depends_on: resource.depends_on,
            },
        ));
        Ok(ResourceRef::new(id))
    }

    /// Declare a stack output.
    pub fn add_output(&mut self, logical_id: impl Into<String>, output: Output) -> TemplateResult<()> {
        let id = LogicalId::new(logical_id)?;
        if self.output(id.as_str()).is_some() {
            return Err(TemplateError::DuplicateLogicalId(id.to_string()));
        }

        let value = serde_json::to_value(&output)?;
        let mut targets = Vec::new();
        collect_references(&value, &mut targets);
        for target in &targets {
            self.ensure_declared(&id, target)?;
        }

        debug!("Declaring output {}", id);
        self.outputs.push((id, output));
        Ok(())
    }

    pub fn parameter(&self, logical_id: &str) -> Option<&Parameter> {
        find(&self.parameters, logical_id)
    }

    pub fn resource(&self, logical_id: &str) -> Option<&ResourceDeclaration> {
        find(&self.resources, logical_id)
    }

    pub fn output(&self, logical_id: &str) -> Option<&Output> {
        find(&self.outputs, logical_id)
    }

    pub fn parameters(&self) -> impl Iterator<Item = (&LogicalId, &Parameter)> {
        self.parameters.iter().map(|(id, p)| (id, p))
    }

    pub fn resources(&self) -> impl Iterator<Item = (&LogicalId, &ResourceDeclaration)> {
        self.resources.iter().map(|(id, r)| (id, r))
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&LogicalId, &Output)> {
        self.outputs.iter().map(|(id, o)| (id, o))
    }

    /// Number of resources of the given CloudFormation type.
    pub fn count_of_type(&self, kind: &str) -> usize {
        self.resources.iter().filter(|(_, r)| r.kind == kind).count()
    }

    /// Whether `name` can be the target of a `Ref` in this template.
    pub fn is_declared(&self, name: &str) -> bool {
        Pseudo::from_str(name).is_some()
            || self.parameter(name).is_some()
            || self.resource(name).is_some()
    }

    /// Render to a JSON value.
    pub fn to_value(&self) -> TemplateResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    // Parameters and resources share the `Ref` namespace.
    fn ensure_unreferenced_name(&self, id: &LogicalId) -> TemplateResult<()> {
        if self.parameter(id.as_str()).is_some() || self.resource(id.as_str()).is_some() {
            return Err(TemplateError::DuplicateLogicalId(id.to_string()));
        }
        Ok(())
    }

    fn ensure_declared(&self, from: &LogicalId, target: &str) -> TemplateResult<()> {
        if self.is_declared(target) {
            Ok(())
        } else {
            Err(TemplateError::DanglingReference {
                from: from.to_string(),
                target: target.to_string(),
            })
        }
    }
}

fn find<'a, T>(entries: &'a [(LogicalId, T)], logical_id: &str) -> Option<&'a T> {
    entries
        .iter()
        .find(|(id, _)| id.as_str() == logical_id)
        .map(|(_, entry)| entry)
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(version) = &self.format_version {
            map.serialize_entry("AWSTemplateFormatVersion", version)?;
        }
        if let Some(description) = &self.description {
            map.serialize_entry("Description", description)?;
        }
        if !self.parameters.is_empty() {
            map.serialize_entry("Parameters", &Section(&self.parameters))?;
        }
        map.serialize_entry("Resources", &Section(&self.resources))?;
        if !self.outputs.is_empty() {
            map.serialize_entry("Outputs", &Section(&self.outputs))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ecr::Repository;
    use crate::resources::logs::LogGroup;
    use crate::resources::s3::Bucket;
    use serde_json::json;

    #[test]
    fn test_add_resource_returns_handle() {
        let mut template = Template::new();
        let repo = template
            .add_resource(Resource::new("Repository", Repository::named("clair")))
            .unwrap();

        assert_eq!(repo.logical_id().as_str(), "Repository");
        assert_eq!(repo.reference(), Expr::Ref("Repository".to_string()));
        assert_eq!(template.count_of_type("AWS::ECR::Repository"), 1);
    }

    #[test]
    fn test_duplicate_ids_rejected_across_parameters_and_resources() {
        let mut template = Template::new();
        template.add_parameter("Cluster", Parameter::string()).unwrap();

        let err = template
            .add_resource(Resource::new("Cluster", Bucket::default()))
            .unwrap_err();
        assert!(matches!(err, TemplateError::DuplicateLogicalId(id) if id == "Cluster"));
    }

    #[test]
    fn test_outputs_have_their_own_namespace() {
        let mut template = Template::new();
        let bucket = template
            .add_resource(Resource::new("Bucket", Bucket::default()))
            .unwrap();

        template.add_output("Bucket", Output::new(bucket.reference())).unwrap();
        assert!(template
            .add_output("Bucket", Output::new(bucket.reference()))
            .is_err());
    }

    #[test]
    fn test_foreign_handle_is_dangling() {
        let mut other = Template::new();
        let foreign = other
            .add_resource(Resource::new("Elsewhere", Bucket::default()))
            .unwrap();

        let mut template = Template::new();
        let err = template
            .add_output("Url", Output::new(foreign.reference()))
            .unwrap_err();
        assert!(matches!(err, TemplateError::DanglingReference { target, .. } if target == "Elsewhere"));

        let err = template
            .add_resource(Resource::new("Logs", LogGroup::default()).depends_on(&foreign))
            .unwrap_err();
        assert!(matches!(err, TemplateError::DanglingReference { .. }));
    }

    #[test]
    fn test_pseudo_parameters_are_always_declared() {
        let mut template = Template::new();
        template
            .add_output("Region", Output::new(Pseudo::Region.reference()))
            .unwrap();
        assert!(template.is_declared("AWS::AccountId"));
        assert!(!template.is_declared("Missing"));
    }

    #[test]
    fn test_serialized_layout() {
        let mut template = Template::new()
            .with_format_version()
            .with_description("Example");
        let image = template
            .add_parameter(
                "Image",
                Parameter::string().with_default("nginx").with_description("Image"),
            )
            .unwrap();
        let secret = template
            .add_parameter("Secret", Parameter::string().no_echo())
            .unwrap();
        let bucket = template
            .add_resource(Resource::new("Bucket", Bucket::default()))
            .unwrap();
        template
            .add_resource(Resource::new("Logs", LogGroup::default()).depends_on(&bucket))
            .unwrap();
        template
            .add_output("ImageName", Output::new(image.reference()).with_description("Image"))
            .unwrap();
        let _ = secret;

        let value = template.to_value().unwrap();
        assert_eq!(value["AWSTemplateFormatVersion"], json!("2010-09-09"));
        assert_eq!(value["Description"], json!("Example"));
        assert_eq!(
            value["Parameters"]["Image"],
            json!({"Type": "String", "Description": "Image", "Default": "nginx"})
        );
        assert_eq!(value["Parameters"]["Secret"]["NoEcho"], json!(true));
        assert_eq!(value["Resources"]["Bucket"], json!({"Type": "AWS::S3::Bucket"}));
        assert_eq!(value["Resources"]["Logs"]["DependsOn"], json!("Bucket"));
        assert_eq!(
            value["Outputs"]["ImageName"],
            json!({"Description": "Image", "Value": {"Ref": "Image"}})
        );
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let value = Template::new().to_value().unwrap();
        assert_eq!(value, json!({"Resources": {}}));
    }
}
