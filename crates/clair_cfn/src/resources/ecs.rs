//! ECS task definitions and services.

use std::collections::BTreeMap;

use serde::Serialize;

use super::ResourceProperties;
use crate::intrinsic::{Expr, Pseudo};
use crate::template::ResourceRef;

use super::ec2::SecurityGroup;
use super::elbv2::TargetGroup;
use super::iam::Role;
use super::logs::LogGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LaunchType {
    Fargate,
    Ec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    Awsvpc,
    Bridge,
    Host,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortMapping {
    pub container_port: u16,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValuePair {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogConfiguration {
    pub log_driver: String,
    pub options: BTreeMap<String, Expr>,
}

impl LogConfiguration {
    /// Ship container output to `group` in the stack's region.
    pub fn awslogs(group: &ResourceRef<LogGroup>, stream_prefix: impl Into<String>) -> Self {
        let mut options = BTreeMap::new();
        options.insert("awslogs-group".to_string(), group.reference());
        options.insert("awslogs-region".to_string(), Pseudo::Region.reference());
        options.insert(
            "awslogs-stream-prefix".to_string(),
            Expr::literal(stream_prefix),
        );
        Self {
            log_driver: "awslogs".to_string(),
            options,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerDefinition {
    pub name: String,
    pub image: Expr,
    pub essential: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub port_mappings: Vec<PortMapping>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<KeyValuePair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_configuration: Option<LogConfiguration>,
}

impl ContainerDefinition {
    /// An essential container running `image`.
    pub fn essential(name: impl Into<String>, image: Expr) -> Self {
        Self {
            name: name.into(),
            image,
            essential: true,
            port_mappings: Vec::new(),
            environment: Vec::new(),
            log_configuration: None,
        }
    }

    pub fn with_port(mut self, container_port: u16) -> Self {
        self.port_mappings.push(PortMapping { container_port });
        self
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.environment.push(KeyValuePair {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_logging(mut self, config: LogConfiguration) -> Self {
        self.log_configuration = Some(config);
        self
    }
}

/// `AWS::ECS::TaskDefinition`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskDefinition {
    pub requires_compatibilities: Vec<LaunchType>,
    pub cpu: String,
    pub memory: String,
    pub network_mode: NetworkMode,
    pub task_role_arn: Expr,
    pub execution_role_arn: Expr,
    pub container_definitions: Vec<ContainerDefinition>,
}

impl TaskDefinition {
    /// A Fargate task. `cpu` is in CPU units (`"512"`), `memory` in MiB or
    /// with a unit suffix (`"1GB"`).
    pub fn fargate(
        cpu: impl Into<String>,
        memory: impl Into<String>,
        task_role: &ResourceRef<Role>,
        execution_role: &ResourceRef<Role>,
    ) -> Self {
        Self {
            requires_compatibilities: vec![LaunchType::Fargate],
            cpu: cpu.into(),
            memory: memory.into(),
            network_mode: NetworkMode::Awsvpc,
            task_role_arn: task_role.reference(),
            execution_role_arn: execution_role.reference(),
            container_definitions: Vec::new(),
        }
    }

    pub fn with_container(mut self, container: ContainerDefinition) -> Self {
        self.container_definitions.push(container);
        self
    }
}

impl ResourceProperties for TaskDefinition {
    const TYPE: &'static str = "AWS::ECS::TaskDefinition";
}

/// Binds a container port to a load balancer target group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceLoadBalancer {
    pub container_name: String,
    pub container_port: u16,
    pub target_group_arn: Expr,
}

impl ServiceLoadBalancer {
    pub fn new(container_name: impl Into<String>, container_port: u16, target_group: &ResourceRef<TargetGroup>) -> Self {
        Self {
            container_name: container_name.into(),
            container_port,
            target_group_arn: target_group.reference(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AwsvpcConfiguration {
    pub subnets: Vec<Expr>,
    pub security_groups: Vec<Expr>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkConfiguration {
    pub awsvpc_configuration: AwsvpcConfiguration,
}

impl NetworkConfiguration {
    pub fn awsvpc(subnets: Vec<Expr>, security_groups: &[&ResourceRef<SecurityGroup>]) -> Self {
        Self {
            awsvpc_configuration: AwsvpcConfiguration {
                subnets,
                security_groups: security_groups.iter().map(|g| g.reference()).collect(),
            },
        }
    }
}

/// `AWS::ECS::Service`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Service {
    pub cluster: Expr,
    pub desired_count: u32,
    pub task_definition: Expr,
    pub launch_type: LaunchType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub load_balancers: Vec<ServiceLoadBalancer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_configuration: Option<NetworkConfiguration>,
}

impl Service {
    pub fn fargate(cluster: Expr, task_definition: &ResourceRef<TaskDefinition>, desired_count: u32) -> Self {
        Self {
            cluster,
            desired_count,
            task_definition: task_definition.reference(),
            launch_type: LaunchType::Fargate,
            load_balancers: Vec::new(),
            network_configuration: None,
        }
    }

    pub fn with_load_balancer(mut self, binding: ServiceLoadBalancer) -> Self {
        self.load_balancers.push(binding);
        self
    }

    pub fn with_network(mut self, network: NetworkConfiguration) -> Self {
        self.network_configuration = Some(network);
        self
    }
}

impl ResourceProperties for Service {
    const TYPE: &'static str = "AWS::ECS::Service";
}
