//! Application load balancers, target groups and listeners.

use serde::{Deserialize, Serialize, Serializer};

use super::ResourceProperties;
use crate::intrinsic::Expr;
use crate::template::ResourceRef;

use super::ec2::SecurityGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
    Internal,
    InternetFacing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Http,
    Https,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Ip,
    Instance,
    Lambda,
}

/// `AWS::ElasticLoadBalancingV2::LoadBalancer`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadBalancer {
    pub scheme: Scheme,
    pub subnets: Vec<Expr>,
    pub security_groups: Vec<Expr>,
}

impl LoadBalancer {
    pub fn new(scheme: Scheme, subnets: Vec<Expr>, security_groups: &[&ResourceRef<SecurityGroup>]) -> Self {
        Self {
            scheme,
            subnets,
            security_groups: security_groups.iter().map(|g| g.reference()).collect(),
        }
    }
}

impl ResourceProperties for LoadBalancer {
    const TYPE: &'static str = "AWS::ElasticLoadBalancingV2::LoadBalancer";
}

impl ResourceRef<LoadBalancer> {
    pub fn dns_name(&self) -> Expr {
        self.get_att("DNSName")
    }
}

/// Port the health checker probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCheckPort {
    /// The port each target receives traffic on.
    TrafficPort,
    Port(u16),
}

impl Serialize for HealthCheckPort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HealthCheckPort::TrafficPort => serializer.serialize_str("traffic-port"),
            HealthCheckPort::Port(port) => serializer.collect_str(port),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthCheck {
    pub health_check_interval_seconds: u32,
    pub health_check_timeout_seconds: u32,
    pub health_check_protocol: Protocol,
    pub health_check_port: HealthCheckPort,
    pub health_check_path: String,
    pub healthy_threshold_count: u32,
    pub unhealthy_threshold_count: u32,
    pub matcher: Matcher,
}

impl HealthCheck {
    /// An HTTP check of `path`, expecting `200`.
    pub fn http(path: impl Into<String>, port: HealthCheckPort) -> Self {
        Self {
            health_check_interval_seconds: 30,
            health_check_timeout_seconds: 5,
            health_check_protocol: Protocol::Http,
            health_check_port: port,
            health_check_path: path.into(),
            healthy_threshold_count: 5,
            unhealthy_threshold_count: 2,
            matcher: Matcher::http_code("200"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Matcher {
    pub http_code: String,
}

impl Matcher {
    pub fn http_code(code: impl Into<String>) -> Self {
        Self { http_code: code.into() }
    }
}

/// `AWS::ElasticLoadBalancingV2::TargetGroup`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetGroup {
    #[serde(flatten)]
    pub health_check: HealthCheck,
    pub port: u16,
    pub protocol: Protocol,
    pub target_type: TargetType,
    pub vpc_id: Expr,
}

impl TargetGroup {
    pub fn new(port: u16, protocol: Protocol, target_type: TargetType, vpc_id: Expr, health_check: HealthCheck) -> Self {
        Self {
            health_check,
            port,
            protocol,
            target_type,
            vpc_id,
        }
    }
}

impl ResourceProperties for TargetGroup {
    const TYPE: &'static str = "AWS::ElasticLoadBalancingV2::TargetGroup";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    Forward,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Action {
    #[serde(rename = "Type")]
    pub action_type: ActionType,
    pub target_group_arn: Expr,
}

impl Action {
    pub fn forward(target_group: &ResourceRef<TargetGroup>) -> Self {
        Self {
            action_type: ActionType::Forward,
            target_group_arn: target_group.reference(),
        }
    }
}

/// `AWS::ElasticLoadBalancingV2::Listener`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Listener {
    pub port: u16,
    pub protocol: Protocol,
    pub load_balancer_arn: Expr,
    pub default_actions: Vec<Action>,
}

impl Listener {
    /// Listen on `port` of `load_balancer` and forward everything to `target_group`.
    pub fn forwarding(
        port: u16,
        protocol: Protocol,
        load_balancer: &ResourceRef<LoadBalancer>,
        target_group: &ResourceRef<TargetGroup>,
    ) -> Self {
        Self {
            port,
            protocol,
            load_balancer_arn: load_balancer.reference(),
            default_actions: vec![Action::forward(target_group)],
        }
    }
}

impl ResourceProperties for Listener {
    const TYPE: &'static str = "AWS::ElasticLoadBalancingV2::Listener";
}
