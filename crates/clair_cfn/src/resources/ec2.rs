//! EC2 security groups.

use serde::Serialize;

use super::ResourceProperties;
use crate::error::{TemplateError, TemplateResult};
use crate::intrinsic::Expr;
use crate::template::ResourceRef;

/// An inclusive port range with `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    from: u16,
    to: u16,
}

impl PortRange {
    pub fn new(from: u16, to: u16) -> TemplateResult<Self> {
        if from > to {
            return Err(TemplateError::invalid_property(
                "PortRange",
                format!("from port {} is above to port {}", from, to),
            ));
        }
        Ok(Self { from, to })
    }

    pub fn single(port: u16) -> Self {
        Self { from: port, to: port }
    }

    pub fn from_port(&self) -> u16 {
        self.from
    }

    pub fn to_port(&self) -> u16 {
        self.to
    }
}

/// One inbound rule. A rule admits traffic from a CIDR block or from
/// members of another security group, never both.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IngressRule {
    ip_protocol: String,
    from_port: u16,
    to_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    cidr_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_security_group_id: Option<Expr>,
}

impl IngressRule {
    /// TCP from an IPv4 CIDR block.
    pub fn tcp_from_cidr(ports: PortRange, cidr: impl Into<String>) -> Self {
        Self {
            ip_protocol: "tcp".to_string(),
            from_port: ports.from_port(),
            to_port: ports.to_port(),
            cidr_ip: Some(cidr.into()),
            source_security_group_id: None,
        }
    }

    /// TCP from instances in `source`.
    pub fn tcp_from_group(ports: PortRange, source: &ResourceRef<SecurityGroup>) -> Self {
        Self {
            ip_protocol: "tcp".to_string(),
            from_port: ports.from_port(),
            to_port: ports.to_port(),
            cidr_ip: None,
            source_security_group_id: Some(source.group_id()),
        }
    }
}

/// `AWS::EC2::SecurityGroup`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroup {
    pub group_description: String,
    pub vpc_id: Expr,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_ingress: Vec<IngressRule>,
}

impl SecurityGroup {
    pub fn new(group_description: impl Into<String>, vpc_id: Expr) -> Self {
        Self {
            group_description: group_description.into(),
            vpc_id,
            security_group_ingress: Vec::new(),
        }
    }

    pub fn with_ingress(mut self, rule: IngressRule) -> Self {
        self.security_group_ingress.push(rule);
        self
    }
}

impl ResourceProperties for SecurityGroup {
    const TYPE: &'static str = "AWS::EC2::SecurityGroup";
}

impl ResourceRef<SecurityGroup> {
    pub fn group_id(&self) -> Expr {
        self.get_att("GroupId")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_port_range_ordering() {
        assert!(PortRange::new(6060, 6061).is_ok());
        assert!(matches!(
            PortRange::new(6061, 6060),
            Err(TemplateError::InvalidProperty { .. })
        ));
        assert_eq!(PortRange::single(5432).from_port(), 5432);
    }

    #[test]
    fn test_cidr_rule_serialization() {
        let group = SecurityGroup::new("ALB", Expr::Ref("Vpc".into()))
            .with_ingress(IngressRule::tcp_from_cidr(PortRange::new(6060, 6061).unwrap(), "0.0.0.0/0"));

        assert_eq!(
            serde_json::to_value(&group).unwrap(),
            json!({
                "GroupDescription": "ALB",
                "VpcId": {"Ref": "Vpc"},
                "SecurityGroupIngress": [{
                    "IpProtocol": "tcp",
                    "FromPort": 6060,
                    "ToPort": 6061,
                    "CidrIp": "0.0.0.0/0"
                }]
            })
        );
    }
}
