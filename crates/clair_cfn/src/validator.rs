//! Audit of rendered templates.
//!
//! Generation never consults this module. It inspects a rendered document
//! the way the provisioning engine's pre-flight would and reports what it
//! finds without rewriting anything.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::TemplateResult;
use crate::intrinsic::{collect_references, Pseudo};
use crate::logical_id::is_valid_logical_id;

/// Top-level sections CloudFormation understands.
pub const KNOWN_SECTIONS: &[&str] = &[
    "AWSTemplateFormatVersion",
    "Description",
    "Metadata",
    "Parameters",
    "Rules",
    "Mappings",
    "Conditions",
    "Transform",
    "Resources",
    "Outputs",
];

/// Validation result with details.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validator for rendered templates.
pub struct TemplateValidator;

impl TemplateValidator {
    /// Read a JSON or YAML template from disk and validate it.
    pub fn validate_file(path: &Path) -> TemplateResult<ValidationResult> {
        debug!("Validating template file {:?}", path);
        let content = fs::read_to_string(path)?;
        let value: Value = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };
        Ok(Self::validate(&value))
    }

    /// Validate an already-parsed template.
    pub fn validate(document: &Value) -> ValidationResult {
        let mut result = ValidationResult::new();

        let Some(root) = document.as_object() else {
            result.add_error("Template must be a JSON object");
            return result;
        };

        for key in root.keys() {
            if !KNOWN_SECTIONS.contains(&key.as_str()) {
                result.add_warning(format!("Unknown top-level section: {}", key));
            }
        }

        let parameters = section(root, "Parameters", &mut result);
        let resources = section(root, "Resources", &mut result);
        let outputs = section(root, "Outputs", &mut result);

        match resources {
            None if !root.contains_key("Resources") => {
                result.add_error("Template has no Resources section")
            }
            Some(map) if map.is_empty() => result.add_error("Resources section is empty"),
            _ => {}
        }

        if let Some(params) = parameters {
            result.merge(Self::validate_parameters(params));
        }
        if let Some(res) = resources {
            result.merge(Self::validate_resources(res));
        }

        result.merge(Self::validate_references(parameters, resources, outputs));
        result
    }

    fn validate_parameters(parameters: &Map<String, Value>) -> ValidationResult {
        let mut result = ValidationResult::new();

        for (id, parameter) in parameters {
            check_logical_id("Parameter", id, &mut result);

            if parameter.get("Type").and_then(Value::as_str).is_none() {
                result.add_error(format!("Parameter {} has no Type", id));
            }
            if parameter.get("Description").is_none() {
                result.add_warning(format!("Parameter {} has no Description", id));
            }
        }

        result
    }

    fn validate_resources(resources: &Map<String, Value>) -> ValidationResult {
        let mut result = ValidationResult::new();

        for (id, resource) in resources {
            check_logical_id("Resource", id, &mut result);

            match resource.get("Type").and_then(Value::as_str) {
                Some(kind) if kind.contains("::") => {}
                Some(kind) => result.add_error(format!("Resource {} has malformed Type '{}'", id, kind)),
                None => result.add_error(format!("Resource {} has no Type", id)),
            }

            if let Some(props) = resource.get("Properties") {
                if !props.is_object() {
                    result.add_error(format!("Resource {} Properties must be an object", id));
                }
            }
        }

        result
    }

    /// Every `Ref`, `Fn::GetAtt` and `DependsOn` must name something declared.
    fn validate_references(
        parameters: Option<&Map<String, Value>>,
        resources: Option<&Map<String, Value>>,
        outputs: Option<&Map<String, Value>>,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();

        let resource_ids: HashSet<&str> = resources
            .map(|r| r.keys().map(String::as_str).collect())
            .unwrap_or_default();
        let mut ref_targets = resource_ids.clone();
        if let Some(params) = parameters {
            for id in params.keys() {
                if resource_ids.contains(id.as_str()) {
                    result.add_error(format!(
                        "Logical id '{}' is declared as both a parameter and a resource",
                        id
                    ));
                }
            }
            ref_targets.extend(params.keys().map(String::as_str));
        }

        let is_target = |name: &str| ref_targets.contains(name) || Pseudo::from_str(name).is_some();

        for (id, resource) in resources.into_iter().flatten() {
            let mut refs = Vec::new();
            if let Some(props) = resource.get("Properties") {
                collect_references(props, &mut refs);
            }
            for target in refs {
                if !is_target(&target) {
                    result.add_error(format!("Resource {} references undeclared '{}'", id, target));
                }
            }

            for dependency in depends_on(resource) {
                if !resource_ids.contains(dependency) {
                    result.add_error(format!(
                        "Resource {} depends on undeclared resource '{}'",
                        id, dependency
                    ));
                }
            }
        }

        for (id, output) in outputs.into_iter().flatten() {
            if output.get("Value").is_none() {
                result.add_error(format!("Output {} has no Value", id));
            }
            let mut refs = Vec::new();
            collect_references(output, &mut refs);
            for target in refs {
                if !is_target(&target) {
                    result.add_error(format!("Output {} references undeclared '{}'", id, target));
                }
            }
        }

        result
    }
}

fn section<'a>(
    root: &'a Map<String, Value>,
    name: &str,
    result: &mut ValidationResult,
) -> Option<&'a Map<String, Value>> {
    let value = root.get(name)?;
    let map = value.as_object();
    if map.is_none() {
        result.add_error(format!("{} section must be an object", name));
    }
    map
}

fn depends_on(resource: &Value) -> Vec<&str> {
    match resource.get("DependsOn") {
        Some(Value::String(single)) => vec![single.as_str()],
        Some(Value::Array(many)) => many.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn check_logical_id(kind: &str, id: &str, result: &mut ValidationResult) {
    if !is_valid_logical_id(id) {
        result.add_error(format!("{} logical id '{}' must be alphanumeric", kind, id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_minimal_template() {
        let doc = json!({
            "Parameters": {"Vpc": {"Type": "AWS::EC2::VPC::Id", "Description": "VPC"}},
            "Resources": {
                "Group": {"Type": "AWS::EC2::SecurityGroup", "Properties": {"VpcId": {"Ref": "Vpc"}}}
            },
            "Outputs": {"GroupId": {"Value": {"Fn::GetAtt": ["Group", "GroupId"]}}}
        });
        let result = TemplateValidator::validate(&doc);
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_dangling_references_are_reported() {
        let doc = json!({
            "Resources": {
                "Service": {
                    "Type": "AWS::ECS::Service",
                    "Properties": {"TaskDefinition": {"Ref": "Missing"}},
                    "DependsOn": ["Ghost"]
                }
            },
            "Outputs": {"Url": {"Value": {"Fn::GetAtt": ["Nowhere", "DNSName"]}}}
        });
        let result = TemplateValidator::validate(&doc);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 3);
        assert!(result.errors.iter().any(|e| e.contains("Missing")));
        assert!(result.errors.iter().any(|e| e.contains("Ghost")));
        assert!(result.errors.iter().any(|e| e.contains("Nowhere")));
    }

    #[test]
    fn test_structure_problems() {
        let result = TemplateValidator::validate(&json!([]));
        assert!(!result.valid);

        let result = TemplateValidator::validate(&json!({"Resources": {}, "Extras": 1}));
        assert!(!result.valid);
        assert_eq!(result.warnings, vec!["Unknown top-level section: Extras".to_string()]);

        let result = TemplateValidator::validate(&json!({
            "Resources": {"bad-id": {"Type": "Bucket"}}
        }));
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_parameter_and_resource_share_namespace() {
        let doc = json!({
            "Parameters": {"Bucket": {"Type": "String", "Description": "Name"}},
            "Resources": {"Bucket": {"Type": "AWS::S3::Bucket"}}
        });
        let result = TemplateValidator::validate(&doc);
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec!["Logical id 'Bucket' is declared as both a parameter and a resource".to_string()]
        );
    }

    #[test]
    fn test_pseudo_parameters_resolve() {
        let doc = json!({
            "Resources": {"Logs": {"Type": "AWS::Logs::LogGroup"}},
            "Outputs": {"Region": {"Value": {"Ref": "AWS::Region"}}}
        });
        assert!(TemplateValidator::validate(&doc).valid);
    }
}
