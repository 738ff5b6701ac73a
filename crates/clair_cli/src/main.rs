//! clair-cfn - prints the Clair CloudFormation templates.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Template error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use clair_cfn::TemplateError;
use clair_stacks::StackError;
use commands::validate::ValidationFailed;
use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Build(args) => commands::generate::execute(clair_stacks::StackKind::Build, args),
        Commands::Deploy(args) => commands::generate::execute(clair_stacks::StackKind::Deploy, args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Settings(args) => commands::settings::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Logs go to stderr; stdout carries the template.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("clair={},warn", level)));

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<ValidationFailed>().is_some() {
        return ExitCodes::VALIDATION_FAILURE;
    }

    for cause in e.chain() {
        if let Some(stack_error) = cause.downcast_ref::<StackError>() {
            return match stack_error {
                StackError::InvalidSettings(_) => ExitCodes::VALIDATION_FAILURE,
                StackError::Template(_) => ExitCodes::TEMPLATE_ERROR,
                StackError::Io(_) | StackError::Yaml(_) => ExitCodes::INVALID_ARGS,
            };
        }
        if let Some(template_error) = cause.downcast_ref::<TemplateError>() {
            return match template_error {
                TemplateError::Io(_) | TemplateError::Json(_) | TemplateError::Yaml(_) => {
                    ExitCodes::INVALID_ARGS
                }
                _ => ExitCodes::TEMPLATE_ERROR,
            };
        }
    }

    ExitCodes::GENERAL_ERROR
}
