//! The Fargate runtime stack: Clair behind an internal application load
//! balancer, backed by a Postgres RDS instance, logging to CloudWatch.

use serde::{Deserialize, Serialize};
use tracing::info;

use clair_cfn::resources::ec2::{IngressRule, PortRange, SecurityGroup};
use clair_cfn::resources::ecs::{
    ContainerDefinition, LogConfiguration, NetworkConfiguration, Service, ServiceLoadBalancer,
    TaskDefinition,
};
use clair_cfn::resources::elbv2::{
    HealthCheck, HealthCheckPort, Listener, LoadBalancer, Matcher, Protocol, Scheme, TargetGroup,
    TargetType,
};
use clair_cfn::resources::iam::{Policy, PolicyDocument, Role, Statement};
use clair_cfn::resources::logs::LogGroup;
use clair_cfn::resources::rds::{DbInstance, DbInstanceSpec, DbSubnetGroup, Engine, StorageType};
use clair_cfn::{Expr, Output, Parameter, Resource, Template};

use crate::error::{StackError, StackResult};
use crate::settings::{require_non_empty, require_positive, StackSettings};

const ECS_TASKS_PRINCIPAL: &str = "ecs-tasks.amazonaws.com";
const POSTGRES_PORT: u16 = 5432;

/// Health check tuning for the target group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckSettings {
    pub path: String,
    pub interval_seconds: u32,
    pub timeout_seconds: u32,
    pub healthy_threshold: u32,
    pub unhealthy_threshold: u32,
    pub success_codes: String,
}

impl Default for HealthCheckSettings {
    fn default() -> Self {
        Self {
            path: "/health".to_string(),
            interval_seconds: 30,
            timeout_seconds: 10,
            healthy_threshold: 4,
            unhealthy_threshold: 3,
            success_codes: "200".to_string(),
        }
    }
}

/// The Postgres instance Clair stores vulnerability data in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub name: String,
    pub instance_class: String,
    pub engine_version: String,
    pub allocated_storage_gb: u32,
    pub storage_type: StorageType,
    pub username: String,
    pub multi_az: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            name: "postgres".to_string(),
            instance_class: "db.t2.micro".to_string(),
            engine_version: "10.3".to_string(),
            allocated_storage_gb: 20,
            storage_type: StorageType::Gp2,
            username: "postgres".to_string(),
            multi_az: false,
        }
    }
}

/// Settings for the Fargate deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploySettings {
    pub description: Option<String>,
    pub default_image: String,
    pub container_name: String,
    /// Port Clair serves its API on.
    pub api_port: u16,
    /// Port Clair serves its health endpoint on.
    pub health_port: u16,
    pub alb_scheme: Scheme,
    pub alb_ingress_cidr: String,
    pub health_check: HealthCheckSettings,
    pub database: DatabaseSettings,
    pub task_cpu: String,
    pub task_memory: String,
    pub desired_count: u32,
    pub log_stream_prefix: String,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            description: Some("Template to deploy Clair on Fargate behind an ALB".to_string()),
            default_image: "jasonumiker/clair:latest".to_string(),
            container_name: "clair".to_string(),
            api_port: 6060,
            health_port: 6061,
            alb_scheme: Scheme::Internal,
            alb_ingress_cidr: "0.0.0.0/0".to_string(),
            health_check: HealthCheckSettings::default(),
            database: DatabaseSettings::default(),
            task_cpu: "512".to_string(),
            task_memory: "1GB".to_string(),
            desired_count: 1,
            log_stream_prefix: "clair".to_string(),
        }
    }
}

impl DeploySettings {
    /// Ranges admitting exactly the two service ports: one range when the
    /// ports are adjacent, one per port otherwise.
    fn service_port_ranges(&self) -> StackResult<Vec<PortRange>> {
        let low = self.api_port.min(self.health_port);
        let high = self.api_port.max(self.health_port);
        if high - low == 1 {
            Ok(vec![PortRange::new(low, high)?])
        } else {
            Ok(vec![PortRange::single(low), PortRange::single(high)])
        }
    }
}

impl StackSettings for DeploySettings {
    fn validate(&self) -> StackResult<()> {
        require_non_empty("default_image", &self.default_image)?;
        require_non_empty("container_name", &self.container_name)?;
        require_non_empty("alb_ingress_cidr", &self.alb_ingress_cidr)?;
        require_non_empty("task_cpu", &self.task_cpu)?;
        require_non_empty("task_memory", &self.task_memory)?;
        require_non_empty("log_stream_prefix", &self.log_stream_prefix)?;
        require_non_empty("health_check.path", &self.health_check.path)?;
        require_non_empty("database.name", &self.database.name)?;
        require_non_empty("database.instance_class", &self.database.instance_class)?;
        require_non_empty("database.engine_version", &self.database.engine_version)?;
        require_non_empty("database.username", &self.database.username)?;

        if self.api_port == 0 || self.health_port == 0 {
            return Err(StackError::InvalidSettings("ports must be non-zero".to_string()));
        }
        if self.api_port == self.health_port {
            return Err(StackError::InvalidSettings(
                "api_port and health_port must differ".to_string(),
            ));
        }

        require_positive("desired_count", self.desired_count)?;
        require_positive("database.allocated_storage_gb", self.database.allocated_storage_gb)?;
        require_positive("health_check.healthy_threshold", self.health_check.healthy_threshold)?;
        require_positive("health_check.unhealthy_threshold", self.health_check.unhealthy_threshold)?;
        require_positive("health_check.timeout_seconds", self.health_check.timeout_seconds)?;
        if self.health_check.timeout_seconds >= self.health_check.interval_seconds {
            return Err(StackError::InvalidSettings(
                "health_check.timeout_seconds must be below interval_seconds".to_string(),
            ));
        }

        Ok(())
    }
}

/// Build the deployment template.
pub fn generate(settings: &DeploySettings) -> StackResult<Template> {
    settings.validate()?;
    info!(
        "Generating deploy stack for container {} (ports {}/{})",
        settings.container_name, settings.api_port, settings.health_port
    );

    let mut template = Template::new().with_format_version();
    if let Some(description) = &settings.description {
        template = template.with_description(description);
    }

    // Parameters

    let cluster = template.add_parameter(
        "Cluster",
        Parameter::string().with_description("The ECS Cluster to deploy to."),
    )?;
    let image = template.add_parameter(
        "ClairImage",
        Parameter::string()
            .with_default(&settings.default_image)
            .with_description("The Clair container image to deploy."),
    )?;
    let vpc = template.add_parameter(
        "ClairVPC",
        Parameter::vpc_id().with_description("A VPC ID for the container."),
    )?;
    let subnet = template.add_parameter(
        "ClairSubnet",
        Parameter::subnet_id().with_description("A VPC subnet ID for the container."),
    )?;
    let subnet2 = template.add_parameter(
        "ClairSubnet2",
        Parameter::subnet_id().with_description("A 2nd VPC subnet ID for the container."),
    )?;
    let db_password = template.add_parameter(
        "ClairDBPassword",
        Parameter::string()
            .no_echo()
            .with_description("The initial Clair RDS Password."),
    )?;

    let subnets = || vec![subnet.reference(), subnet2.reference()];

    // Logging and network access

    let log_group = template.add_resource(Resource::new("ClairLogGroup", LogGroup::default()))?;

    let service_ports = settings.service_port_ranges()?;

    let alb_group = template.add_resource(Resource::new(
        "ALBSecurityGroup",
        service_ports.iter().fold(
            SecurityGroup::new("Clair ALB Security Group", vpc.reference()),
            |group, ports| {
                group.with_ingress(IngressRule::tcp_from_cidr(*ports, &settings.alb_ingress_cidr))
            },
        ),
    ))?;

    let host_group = template.add_resource(Resource::new(
        "ClairHostSecurityGroup",
        service_ports.iter().fold(
            SecurityGroup::new("Clair ECS Security Group.", vpc.reference()),
            |group, ports| group.with_ingress(IngressRule::tcp_from_group(*ports, &alb_group)),
        ),
    ))?;

    // Roles

    let task_role = template.add_resource(Resource::new(
        "TaskRole",
        Role::assumable_by(ECS_TASKS_PRINCIPAL),
    ))?;
    let execution_role = template.add_resource(Resource::new(
        "TaskExecutionRole",
        Role::assumable_by(ECS_TASKS_PRINCIPAL),
    ))?;

    template.add_resource(Resource::new(
        "FargateExecutionPolicy",
        Policy::new(
            "fargate-execution",
            PolicyDocument::new(vec![Statement::allow([
                "ecr:GetAuthorizationToken",
                "ecr:BatchCheckLayerAvailability",
                "ecr:GetDownloadUrlForLayer",
                "ecr:BatchGetImage",
                "logs:CreateLogStream",
                "logs:PutLogEvents",
            ])
            .on_any_resource()]),
            &[&execution_role],
        ),
    ))?;

    // Load balancing

    let alb = template.add_resource(Resource::new(
        "ClairALB",
        LoadBalancer::new(settings.alb_scheme, subnets(), &[&alb_group]),
    ))?;

    let hc = &settings.health_check;
    let target_group = template.add_resource(Resource::new(
        "ClairTargetGroup",
        TargetGroup::new(
            settings.api_port,
            Protocol::Http,
            TargetType::Ip,
            vpc.reference(),
            HealthCheck {
                health_check_interval_seconds: hc.interval_seconds,
                health_check_timeout_seconds: hc.timeout_seconds,
                health_check_protocol: Protocol::Http,
                health_check_port: HealthCheckPort::Port(settings.health_port),
                health_check_path: hc.path.clone(),
                healthy_threshold_count: hc.healthy_threshold,
                unhealthy_threshold_count: hc.unhealthy_threshold,
                matcher: Matcher::http_code(&hc.success_codes),
            },
        ),
    ))?;

    template.add_resource(Resource::new(
        "Listener",
        Listener::forwarding(settings.api_port, Protocol::Http, &alb, &target_group),
    ))?;

    // Database

    let db_subnet_group = template.add_resource(Resource::new(
        "DBSubnetGroup",
        DbSubnetGroup::new("Subnets available for the RDS DB Instance", subnets()),
    ))?;

    let db_group = template.add_resource(Resource::new(
        "DBSecurityGroup",
        SecurityGroup::new("Security group for RDS DB Instance.", vpc.reference()).with_ingress(
            IngressRule::tcp_from_group(PortRange::single(POSTGRES_PORT), &host_group),
        ),
    ))?;

    let db = &settings.database;
    let database = template.add_resource(Resource::new(
        "ClairDB",
        DbInstance::new(
            DbInstanceSpec {
                db_name: db.name.clone(),
                allocated_storage: db.allocated_storage_gb,
                instance_class: db.instance_class.clone(),
                engine: Engine::Postgres,
                engine_version: db.engine_version.clone(),
                master_username: db.username.clone(),
                multi_az: db.multi_az,
                storage_type: db.storage_type,
            },
            db_password.reference(),
            &db_subnet_group,
            &[&db_group],
        ),
    ))?;

    // Compute

    let container = ContainerDefinition::essential(&settings.container_name, image.reference())
        .with_port(settings.api_port)
        .with_port(settings.health_port)
        .with_env("DB_HOST", database.endpoint_address())
        .with_env("DB_PASSWORD", db_password.reference())
        .with_logging(LogConfiguration::awslogs(&log_group, &settings.log_stream_prefix));

    let task_definition = template.add_resource(Resource::new(
        "ClairTaskDefinition",
        TaskDefinition::fargate(&settings.task_cpu, &settings.task_memory, &task_role, &execution_role)
            .with_container(container),
    ))?;

    template.add_resource(
        Resource::new(
            "ClairService",
            Service::fargate(cluster.reference(), &task_definition, settings.desired_count)
                .with_load_balancer(ServiceLoadBalancer::new(
                    &settings.container_name,
                    settings.api_port,
                    &target_group,
                ))
                .with_network(NetworkConfiguration::awsvpc(subnets(), &[&host_group])),
        )
        .depends_on(&alb),
    )?;

    template.add_output(
        "ClairURL",
        Output::new(Expr::concat(vec!["http://".into(), alb.dns_name()]))
            .with_description("URL of the ALB"),
    )?;

    Ok(template)
}
