//! CLI command definitions.
//!
//! Each subcommand maps to one generator or to an audit of a rendered file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use clair_cfn::OutputFormat;
use clair_stacks::StackKind;

pub mod generate;
pub mod settings;
pub mod validate;

/// clair-cfn - CloudFormation templates for running Clair on AWS
#[derive(Parser)]
#[command(name = "clair-cfn")]
#[command(version, about = "CloudFormation templates for running Clair on AWS")]
#[command(long_about = r#"
Prints the CloudFormation templates that build the Clair image and run it
on ECS Fargate. Templates go to standard output, logs to standard error.

COMMANDS:
  build     → ECR repository and CodeBuild project for the Clair image
  deploy    → Fargate service, ALB and Postgres RDS instance
  validate  → Audit a rendered template for dangling references
  settings  → Print the default settings of a generator as YAML

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Template error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the image build template
    Build(GenerateArgs),

    /// Print the Fargate deployment template
    Deploy(GenerateArgs),

    /// Validate a rendered template file
    Validate(validate::ValidateArgs),

    /// Print the default settings of a generator
    Settings(settings::SettingsArgs),
}

/// Arguments shared by the generator subcommands.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// YAML file overriding the default settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Json)]
    pub format: FormatArg,

    /// Write the template to this file instead of standard output
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Json,
    #[value(alias = "yml")]
    Yaml,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Yaml => OutputFormat::Yaml,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackArg {
    Build,
    #[value(alias = "deploy-fargate")]
    Deploy,
}

impl From<StackArg> for StackKind {
    fn from(arg: StackArg) -> Self {
        match arg {
            StackArg::Build => StackKind::Build,
            StackArg::Deploy => StackKind::Deploy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_defaults() {
        let cli = Cli::try_parse_from(["clair-cfn", "deploy"]).unwrap();
        assert!(!cli.verbose);
        match cli.command {
            Commands::Deploy(args) => {
                assert_eq!(args.format, FormatArg::Json);
                assert!(args.config.is_none());
                assert!(args.output.is_none());
            }
            _ => panic!("expected deploy"),
        }
    }

    #[test]
    fn test_parse_generate_options() {
        let cli = Cli::try_parse_from([
            "clair-cfn", "build", "--format", "yml", "--config", "build.yaml", "-o", "out.yaml", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.format, FormatArg::Yaml);
                assert_eq!(args.config, Some(PathBuf::from("build.yaml")));
                assert_eq!(args.output, Some(PathBuf::from("out.yaml")));
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["clair-cfn", "build", "--format", "xml"]).is_err());
        assert!(Cli::try_parse_from(["clair-cfn", "validate"]).is_err());
    }

    #[test]
    fn test_parse_settings_alias() {
        let cli = Cli::try_parse_from(["clair-cfn", "settings", "deploy-fargate"]).unwrap();
        match cli.command {
            Commands::Settings(args) => assert_eq!(StackKind::from(args.stack), StackKind::Deploy),
            _ => panic!("expected settings"),
        }
    }
}
