//! RDS subnet groups and database instances.

use serde::{Deserialize, Serialize};

use super::{as_string, ResourceProperties};
use crate::intrinsic::Expr;
use crate::template::ResourceRef;

use super::ec2::SecurityGroup;

/// `AWS::RDS::DBSubnetGroup`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DbSubnetGroup {
    #[serde(rename = "DBSubnetGroupDescription")]
    pub description: String,
    pub subnet_ids: Vec<Expr>,
}

impl DbSubnetGroup {
    pub fn new(description: impl Into<String>, subnet_ids: Vec<Expr>) -> Self {
        Self {
            description: description.into(),
            subnet_ids,
        }
    }
}

impl ResourceProperties for DbSubnetGroup {
    const TYPE: &'static str = "AWS::RDS::DBSubnetGroup";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Postgres,
    Mysql,
    Mariadb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Standard,
    Gp2,
    Gp3,
    Io1,
}

/// `AWS::RDS::DBInstance`
#[derive(Debug, Clone, Serialize)]
pub struct DbInstance {
    #[serde(rename = "DBName")]
    pub db_name: String,
    /// Gibibytes; the property is string-typed in CloudFormation.
    #[serde(rename = "AllocatedStorage", serialize_with = "as_string")]
    pub allocated_storage: u32,
    #[serde(rename = "DBInstanceClass")]
    pub instance_class: String,
    #[serde(rename = "Engine")]
    pub engine: Engine,
    #[serde(rename = "EngineVersion")]
    pub engine_version: String,
    #[serde(rename = "MasterUsername")]
    pub master_username: String,
    #[serde(rename = "MasterUserPassword")]
    pub master_user_password: Expr,
    #[serde(rename = "DBSubnetGroupName")]
    pub subnet_group_name: Expr,
    #[serde(rename = "VPCSecurityGroups")]
    pub vpc_security_groups: Vec<Expr>,
    #[serde(rename = "MultiAZ")]
    pub multi_az: bool,
    #[serde(rename = "StorageType")]
    pub storage_type: StorageType,
}

/// Fields of a [`DbInstance`] that are not wiring to other resources.
#[derive(Debug, Clone)]
pub struct DbInstanceSpec {
    pub db_name: String,
    pub allocated_storage: u32,
    pub instance_class: String,
    pub engine: Engine,
    pub engine_version: String,
    pub master_username: String,
    pub multi_az: bool,
    pub storage_type: StorageType,
}

impl DbInstance {
    pub fn new(
        spec: DbInstanceSpec,
        master_user_password: Expr,
        subnet_group: &ResourceRef<DbSubnetGroup>,
        security_groups: &[&ResourceRef<SecurityGroup>],
    ) -> Self {
        Self {
            db_name: spec.db_name,
            allocated_storage: spec.allocated_storage,
            instance_class: spec.instance_class,
            engine: spec.engine,
            engine_version: spec.engine_version,
            master_username: spec.master_username,
            master_user_password,
            subnet_group_name: subnet_group.reference(),
            vpc_security_groups: security_groups.iter().map(|g| g.reference()).collect(),
            multi_az: spec.multi_az,
            storage_type: spec.storage_type,
        }
    }
}

impl ResourceProperties for DbInstance {
    const TYPE: &'static str = "AWS::RDS::DBInstance";
}

impl ResourceRef<DbInstance> {
    pub fn endpoint_address(&self) -> Expr {
        self.get_att("Endpoint.Address")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Resource, Template};
    use serde_json::json;

    #[test]
    fn test_instance_wiring_and_string_storage() {
        let mut template = Template::new();
        let subnets = template
            .add_resource(Resource::new(
                "DBSubnetGroup",
                DbSubnetGroup::new("Subnets", vec![Expr::literal("subnet-1")]),
            ))
            .unwrap();
        let group = template
            .add_resource(Resource::new(
                "DBSecurityGroup",
                SecurityGroup::new("DB", Expr::literal("vpc-1")),
            ))
            .unwrap();

        let spec = DbInstanceSpec {
            db_name: "postgres".into(),
            allocated_storage: 20,
            instance_class: "db.t2.micro".into(),
            engine: Engine::Postgres,
            engine_version: "10.3".into(),
            master_username: "postgres".into(),
            multi_az: false,
            storage_type: StorageType::Gp2,
        };
        let db = DbInstance::new(spec, Expr::literal("secret"), &subnets, &[&group]);

        let value = serde_json::to_value(&db).unwrap();
        assert_eq!(value["AllocatedStorage"], json!("20"));
        assert_eq!(value["DBSubnetGroupName"], json!({"Ref": "DBSubnetGroup"}));
        assert_eq!(value["VPCSecurityGroups"], json!([{"Ref": "DBSecurityGroup"}]));
        assert_eq!(value["MultiAZ"], json!(false));
        assert_eq!(value["StorageType"], json!("gp2"));

        let handle = template.add_resource(Resource::new("ClairDB", db)).unwrap();
        assert_eq!(
            handle.endpoint_address(),
            Expr::GetAtt("ClairDB".into(), "Endpoint.Address".into())
        );
    }
}
