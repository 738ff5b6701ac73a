//! IAM roles, inline policies and policy documents.

use serde::Serialize;

use super::ResourceProperties;
use crate::intrinsic::Expr;
use crate::template::ResourceRef;

/// The policy language version every document here declares.
pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Who may assume a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    pub service: Vec<String>,
}

/// One statement of a policy document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub effect: Effect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub action: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<Expr>,
}

impl Statement {
    /// An `Allow` statement over `actions`, with no resources yet.
    pub fn allow<I, A>(actions: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            sid: None,
            effect: Effect::Allow,
            principal: None,
            action: actions.into_iter().map(Into::into).collect(),
            resource: Vec::new(),
        }
    }

    /// `sts:AssumeRole` for the given service principal.
    pub fn assume_role_by(service: impl Into<String>) -> Self {
        Self {
            principal: Some(Principal {
                service: vec![service.into()],
            }),
            ..Self::allow(["sts:AssumeRole"])
        }
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn on_resource(mut self, resource: impl Into<Expr>) -> Self {
        self.resource.push(resource.into());
        self
    }

    /// Apply to every resource (`"*"`).
    pub fn on_any_resource(self) -> Self {
        self.on_resource("*")
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    /// A versioned document.
    pub fn new(statement: Vec<Statement>) -> Self {
        Self {
            version: Some(POLICY_VERSION.to_string()),
            statement,
        }
    }

    /// A trust policy, which by convention omits the version.
    pub fn trust(statement: Statement) -> Self {
        Self {
            version: None,
            statement: vec![statement],
        }
    }
}

/// `AWS::IAM::Role`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    pub assume_role_policy_document: PolicyDocument,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub managed_policy_arns: Vec<String>,
}

impl Role {
    /// A role that `service` (e.g. `ecs-tasks.amazonaws.com`) may assume.
    pub fn assumable_by(service: impl Into<String>) -> Self {
        Self {
            assume_role_policy_document: PolicyDocument::trust(Statement::assume_role_by(service)),
            managed_policy_arns: Vec::new(),
        }
    }
}

impl ResourceProperties for Role {
    const TYPE: &'static str = "AWS::IAM::Role";
}

/// `AWS::IAM::Policy`, an inline policy attached to roles.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Policy {
    pub policy_name: String,
    pub policy_document: PolicyDocument,
    pub roles: Vec<Expr>,
}

impl Policy {
    pub fn new(
        policy_name: impl Into<String>,
        policy_document: PolicyDocument,
        roles: &[&ResourceRef<Role>],
    ) -> Self {
        Self {
            policy_name: policy_name.into(),
            policy_document,
            roles: roles.iter().map(|role| role.reference()).collect(),
        }
    }
}

impl ResourceProperties for Policy {
    const TYPE: &'static str = "AWS::IAM::Policy";
}
