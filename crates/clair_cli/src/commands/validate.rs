//! Validate command - audit a rendered template file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use thiserror::Error;
use tracing::info;

use clair_cfn::TemplateValidator;

#[derive(Args)]
pub struct ValidateArgs {
    /// Template file to validate (.json, .yaml or .yml)
    file: PathBuf,

    /// Treat warnings as errors
    #[arg(long)]
    strict: bool,
}

/// Returned when a template fails validation.
#[derive(Error, Debug)]
#[error("Template validation failed with {errors} error(s)")]
pub struct ValidationFailed {
    pub errors: usize,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("Validating template: {:?}", args.file);

    let result = TemplateValidator::validate_file(&args.file)
        .with_context(|| format!("Failed to read template {:?}", args.file))?;

    for error in &result.errors {
        println!("   ❌ {}", error);
    }
    for warning in &result.warnings {
        println!("   ⚠️  {}", warning);
    }

    let failures = if args.strict {
        result.errors.len() + result.warnings.len()
    } else {
        result.errors.len()
    };

    if failures > 0 {
        return Err(ValidationFailed { errors: failures }.into());
    }

    println!("✅ {} is valid", args.file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args(file: PathBuf, strict: bool) -> ValidateArgs {
        ValidateArgs { file, strict }
    }

    #[test]
    fn test_valid_template_passes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ok.yaml");
        fs::write(
            &path,
            "Resources:\n  Bucket:\n    Type: AWS::S3::Bucket\nOutputs:\n  Name:\n    Value:\n      Ref: Bucket\n",
        )
        .unwrap();

        execute(args(path, false)).unwrap();
    }

    #[test]
    fn test_dangling_reference_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(
            &path,
            r#"{"Resources": {"Bucket": {"Type": "AWS::S3::Bucket"}},
                "Outputs": {"Name": {"Value": {"Ref": "Missing"}}}}"#,
        )
        .unwrap();

        let err = execute(args(path, false)).unwrap_err();
        assert!(err.downcast_ref::<ValidationFailed>().is_some());
    }

    #[test]
    fn test_strict_promotes_warnings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("warn.json");
        fs::write(
            &path,
            r#"{"Parameters": {"Name": {"Type": "String"}},
                "Resources": {"Bucket": {"Type": "AWS::S3::Bucket",
                    "Properties": {"BucketName": {"Ref": "Name"}}}}}"#,
        )
        .unwrap();

        execute(args(path.clone(), false)).unwrap();
        let err = execute(args(path, true)).unwrap_err();
        assert_eq!(err.downcast_ref::<ValidationFailed>().unwrap().errors, 1);
    }

    #[test]
    fn test_missing_file_is_not_a_validation_failure() {
        let dir = tempdir().unwrap();
        let err = execute(args(dir.path().join("none.json"), false)).unwrap_err();
        assert!(err.downcast_ref::<ValidationFailed>().is_none());
    }
}
