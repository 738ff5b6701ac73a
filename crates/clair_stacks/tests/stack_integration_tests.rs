//! Integration tests for the Clair stack generators.

use std::collections::BTreeMap;
use std::fs;

use clair_cfn::{OutputFormat, Template, TemplateRenderer, TemplateValidator};
use clair_stacks::{build, deploy, BuildSettings, DeploySettings, StackError, StackKind, StackSettings};
use serde_json::{json, Value};
use tempfile::tempdir;

fn render(template: &Template) -> String {
    TemplateRenderer::new(OutputFormat::Json).render(template).unwrap()
}

fn type_counts(template: &Template) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for (_, resource) in template.resources() {
        *counts.entry(resource.kind()).or_insert(0) += 1;
    }
    counts
}

/// Every Ref/GetAtt/DependsOn in the rendered document must resolve.
fn assert_referentially_closed(template: &Template) {
    let value: Value = serde_json::from_str(&render(template)).unwrap();
    let result = TemplateValidator::validate(&value);
    assert!(result.valid, "dangling references: {:?}", result.errors);
}

#[test]
fn test_build_stack_contents() {
    let template = build::generate(&BuildSettings::default()).unwrap();

    let counts = type_counts(&template);
    let expected: BTreeMap<&str, usize> = [
        ("AWS::ECR::Repository", 1),
        ("AWS::S3::Bucket", 1),
        ("AWS::IAM::Role", 1),
        ("AWS::IAM::Policy", 1),
        ("AWS::CodeBuild::Project", 1),
    ]
    .into_iter()
    .collect();
    assert_eq!(counts, expected);

    assert_eq!(template.outputs().count(), 1);
    assert_eq!(template.parameters().count(), 0);
    assert!(template.format_version().is_none());

    let value = template.to_value().unwrap();
    assert_eq!(
        value["Outputs"]["RepositoryURL"],
        json!({
            "Description": "The docker repository URL",
            "Value": {"Fn::Join": ["", [
                {"Ref": "AWS::AccountId"}, ".dkr.ecr.", {"Ref": "AWS::Region"},
                ".amazonaws.com/", {"Ref": "Repository"}
            ]]}
        })
    );
}

#[test]
fn test_build_project_properties() {
    let template = build::generate(&BuildSettings::default()).unwrap();
    let project = template.resource("ImageBuildProject").unwrap().properties();

    assert_eq!(project["Name"], json!("clair-build"));
    assert_eq!(
        project["Artifacts"],
        json!({"Type": "S3", "Name": "artifacts", "Location": {"Ref": "ClairBuildOutput"}})
    );
    assert_eq!(
        project["Source"],
        json!({"Type": "GITHUB", "Location": "https://github.com/jasonumiker/clair-ecs-fargate"})
    );
    assert_eq!(
        project["Environment"]["EnvironmentVariables"],
        json!([
            {"Name": "AWS_ACCOUNT_ID", "Value": {"Ref": "AWS::AccountId"}},
            {"Name": "IMAGE_REPO_NAME", "Value": {"Ref": "Repository"}},
            {"Name": "IMAGE_TAG", "Value": "latest"}
        ])
    );
    assert_eq!(project["Environment"]["PrivilegedMode"], json!(true));
}

#[test]
fn test_deploy_stack_contents() {
    let template = deploy::generate(&DeploySettings::default()).unwrap();
    let counts = type_counts(&template);

    assert_eq!(counts["AWS::ElasticLoadBalancingV2::LoadBalancer"], 1);
    assert_eq!(counts["AWS::ElasticLoadBalancingV2::TargetGroup"], 1);
    assert_eq!(counts["AWS::ElasticLoadBalancingV2::Listener"], 1);
    assert_eq!(counts["AWS::RDS::DBInstance"], 1);
    assert_eq!(counts["AWS::RDS::DBSubnetGroup"], 1);
    assert_eq!(counts["AWS::ECS::Service"], 1);
    assert_eq!(counts["AWS::ECS::TaskDefinition"], 1);
    assert_eq!(counts["AWS::EC2::SecurityGroup"], 3);
    assert_eq!(counts["AWS::IAM::Role"], 2);
    assert_eq!(counts["AWS::IAM::Policy"], 1);
    assert_eq!(counts["AWS::Logs::LogGroup"], 1);
    assert_eq!(template.resources().count(), 14);

    let task = template.resource("ClairTaskDefinition").unwrap().properties();
    let ports = task["ContainerDefinitions"][0]["PortMappings"].as_array().unwrap();
    assert_eq!(ports, &vec![json!({"ContainerPort": 6060}), json!({"ContainerPort": 6061})]);

    assert_eq!(template.outputs().count(), 1);
    assert_eq!(
        template.to_value().unwrap()["Outputs"]["ClairURL"]["Value"],
        json!({"Fn::Join": ["", ["http://", {"Fn::GetAtt": ["ClairALB", "DNSName"]}]]})
    );
    assert_eq!(template.format_version(), Some("2010-09-09"));
}

#[test]
fn test_deploy_parameters_match_declaration() {
    let template = deploy::generate(&DeploySettings::default()).unwrap();
    let value = template.to_value().unwrap();
    let params = value["Parameters"].as_object().unwrap();

    let declared: Vec<(&str, &str)> = template
        .parameters()
        .map(|(id, p)| (id.as_str(), p.param_type.as_str()))
        .collect();
    assert_eq!(params.len(), declared.len());
    assert_eq!(
        declared,
        vec![
            ("Cluster", "String"),
            ("ClairImage", "String"),
            ("ClairVPC", "AWS::EC2::VPC::Id"),
            ("ClairSubnet", "AWS::EC2::Subnet::Id"),
            ("ClairSubnet2", "AWS::EC2::Subnet::Id"),
            ("ClairDBPassword", "String"),
        ]
    );

    assert_eq!(params["ClairDBPassword"]["NoEcho"], json!(true));
    for (id, param) in params {
        if id != "ClairDBPassword" {
            assert!(param.get("NoEcho").is_none(), "{} should echo", id);
        }
    }
    assert_eq!(params["ClairImage"]["Default"], json!("jasonumiker/clair:latest"));
    assert!(params["Cluster"].get("Default").is_none());
}

#[test]
fn test_both_stacks_are_referentially_closed() {
    for kind in StackKind::all() {
        let template = kind.generate(None).unwrap();
        assert_referentially_closed(&template);
    }
}

#[test]
fn test_generation_is_deterministic() {
    for kind in StackKind::all() {
        let first = render(&kind.generate(None).unwrap());
        let second = render(&kind.generate(None).unwrap());
        assert_eq!(first, second, "{} stack rendered differently", kind);
    }
}

#[test]
fn test_yaml_overrides_flow_into_template() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("deploy.yaml");
    fs::write(
        &config,
        "default_image: registry.example.com/clair:v4\n\
         desired_count: 3\n\
         database:\n  multi_az: true\n  allocated_storage_gb: 50\n",
    )
    .unwrap();

    let template = StackKind::Deploy.generate(Some(&config)).unwrap();
    let value = template.to_value().unwrap();

    assert_eq!(
        value["Parameters"]["ClairImage"]["Default"],
        json!("registry.example.com/clair:v4")
    );
    assert_eq!(value["Resources"]["ClairService"]["Properties"]["DesiredCount"], json!(3));
    let db = &value["Resources"]["ClairDB"]["Properties"];
    assert_eq!(db["MultiAZ"], json!(true));
    assert_eq!(db["AllocatedStorage"], json!("50"));
    // untouched nested defaults survive
    assert_eq!(db["EngineVersion"], json!("10.3"));
}

#[test]
fn test_invalid_yaml_settings_rejected() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("build.yaml");
    fs::write(&config, "repository_name: \"\"\n").unwrap();

    let err = StackKind::Build.generate(Some(&config)).unwrap_err();
    assert!(matches!(err, StackError::InvalidSettings(_)));

    fs::write(&config, "compute_type: [not, a, type]\n").unwrap();
    let err = BuildSettings::from_file(&config).unwrap_err();
    assert!(matches!(err, StackError::Yaml(_)));

    let err = BuildSettings::from_file(&dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(err, StackError::Io(_)));
}

#[test]
fn test_settings_round_trip_through_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.yaml");

    let mut settings = DeploySettings::default();
    settings.container_name = "scanner".to_string();
    settings.to_file(&path).unwrap();

    let loaded = DeploySettings::from_file(&path).unwrap();
    assert_eq!(loaded.container_name, "scanner");
    assert_eq!(loaded.api_port, 6060);
}

#[test]
fn test_default_settings_yaml_parses() {
    let yaml = StackKind::Build.default_settings_yaml().unwrap();
    assert!(yaml.contains("repository_name: clair"));
    assert!(yaml.contains("BUILD_GENERAL1_SMALL"));

    let yaml = StackKind::Deploy.default_settings_yaml().unwrap();
    let parsed: DeploySettings = serde_yaml_from(&yaml);
    assert_eq!(parsed.database.instance_class, "db.t2.micro");
}

fn serde_yaml_from(yaml: &str) -> DeploySettings {
    let dir = tempdir().unwrap();
    let path = dir.path().join("defaults.yaml");
    fs::write(&path, yaml).unwrap();
    DeploySettings::from_file(&path).unwrap()
}

#[test]
fn test_stack_kind_names() {
    assert_eq!(StackKind::from_str("Deploy-Fargate"), Some(StackKind::Deploy));
    assert_eq!(StackKind::from_str("build"), Some(StackKind::Build));
    assert_eq!(StackKind::from_str("destroy"), None);
}
