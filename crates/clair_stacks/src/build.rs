//! The image build pipeline: an ECR repository, an artifact bucket and a
//! CodeBuild project that builds the Clair image from source and pushes it.

use serde::{Deserialize, Serialize};
use tracing::info;

use clair_cfn::resources::codebuild::{Artifacts, ComputeType, Environment, Project, Source};
use clair_cfn::resources::ecr::Repository;
use clair_cfn::resources::iam::{Policy, PolicyDocument, Role, Statement};
use clair_cfn::resources::s3::Bucket;
use clair_cfn::{Expr, Output, Pseudo, Resource, ResourceRef, Template};

use crate::error::StackResult;
use crate::settings::{require_non_empty, StackSettings};

const CODEBUILD_PRINCIPAL: &str = "codebuild.amazonaws.com";

/// Settings for the build pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub description: String,
    pub repository_name: String,
    pub project_name: String,
    pub source_location: String,
    pub build_image: String,
    pub compute_type: ComputeType,
    pub image_tag: String,
    pub artifacts_name: String,
    pub privileged_mode: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            description: "Template to set up a CodeBuild for the Clair container".to_string(),
            repository_name: "clair".to_string(),
            project_name: "clair-build".to_string(),
            source_location: "https://github.com/jasonumiker/clair-ecs-fargate".to_string(),
            build_image: "aws/codebuild/docker:17.09.0".to_string(),
            compute_type: ComputeType::Small,
            image_tag: "latest".to_string(),
            artifacts_name: "artifacts".to_string(),
            privileged_mode: true,
        }
    }
}

impl StackSettings for BuildSettings {
    fn validate(&self) -> StackResult<()> {
        require_non_empty("repository_name", &self.repository_name)?;
        require_non_empty("project_name", &self.project_name)?;
        require_non_empty("source_location", &self.source_location)?;
        require_non_empty("build_image", &self.build_image)?;
        require_non_empty("image_tag", &self.image_tag)?;
        require_non_empty("artifacts_name", &self.artifacts_name)?;
        Ok(())
    }
}

/// Build the pipeline template.
pub fn generate(settings: &BuildSettings) -> StackResult<Template> {
    settings.validate()?;
    info!(
        "Generating build stack for repository {} (project {})",
        settings.repository_name, settings.project_name
    );

    let mut template = Template::new().with_description(&settings.description);

    let repository = template.add_resource(Resource::new(
        "Repository",
        Repository::named(&settings.repository_name),
    ))?;

    let output_bucket = template.add_resource(Resource::new("ClairBuildOutput", Bucket::default()))?;

    let service_role = template.add_resource(Resource::new(
        "InstanceRole",
        Role::assumable_by(CODEBUILD_PRINCIPAL),
    ))?;

    let service_policy = template.add_resource(Resource::new(
        "CodeBuildServiceRolePolicy",
        Policy::new(
            "CodeBuildServiceRolePolicy",
            service_policy_document(&repository),
            &[&service_role],
        ),
    ))?;

    let mut environment = Environment::linux(settings.compute_type, &settings.build_image)
        .with_variable("AWS_ACCOUNT_ID", Pseudo::AccountId)
        .with_variable("IMAGE_REPO_NAME", repository.reference())
        .with_variable("IMAGE_TAG", settings.image_tag.as_str());
    if settings.privileged_mode {
        environment = environment.privileged();
    }

    template.add_resource(
        Resource::new(
            "ImageBuildProject",
            Project::new(
                &settings.project_name,
                &service_role,
                Source::github(&settings.source_location),
                environment,
                Artifacts::s3(&settings.artifacts_name, &output_bucket),
            ),
        )
        .depends_on(&service_policy),
    )?;

    template.add_output(
        "RepositoryURL",
        Output::new(repository_url(&repository)).with_description("The docker repository URL"),
    )?;

    Ok(template)
}

/// What the build needs: logs, source pull, artifact read/write and full
/// access to its own repository.
fn service_policy_document(repository: &ResourceRef<Repository>) -> PolicyDocument {
    PolicyDocument::new(vec![
        Statement::allow(["logs:CreateLogGroup", "logs:CreateLogStream", "logs:PutLogEvents"])
            .with_sid("CloudWatchLogsPolicy")
            .on_any_resource(),
        Statement::allow(["codecommit:GitPull"])
            .with_sid("CodeCommitPolicy")
            .on_any_resource(),
        Statement::allow(["s3:GetObject", "s3:GetObjectVersion"])
            .with_sid("S3GetObjectPolicy")
            .on_any_resource(),
        Statement::allow(["s3:PutObject"])
            .with_sid("S3PutObjectPolicy")
            .on_any_resource(),
        Statement::allow(["ecr:GetAuthorizationToken"]).on_any_resource(),
        Statement::allow(["ecr:*"]).on_resource(repository_arn(repository)),
    ])
}

/// `arn:aws:ecr:<region>:<account>:repository/<name>`
fn repository_arn(repository: &ResourceRef<Repository>) -> Expr {
    Expr::concat(vec![
        "arn:aws:ecr:".into(),
        Pseudo::Region.into(),
        ":".into(),
        Pseudo::AccountId.into(),
        ":repository/".into(),
        repository.reference(),
    ])
}

/// `<account>.dkr.ecr.<region>.amazonaws.com/<name>`
fn repository_url(repository: &ResourceRef<Repository>) -> Expr {
    Expr::concat(vec![
        Pseudo::AccountId.into(),
        ".dkr.ecr.".into(),
        Pseudo::Region.into(),
        ".amazonaws.com/".into(),
        repository.reference(),
    ])
}
