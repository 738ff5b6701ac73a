//! Settings command - print a generator's default settings.

use anyhow::Result;
use clap::Args;

use clair_stacks::StackKind;

use super::StackArg;

#[derive(Args)]
pub struct SettingsArgs {
    /// Generator whose defaults to print
    #[arg(value_enum)]
    pub stack: StackArg,
}

/// The printed YAML is a valid `--config` file for the same generator.
pub fn execute(args: SettingsArgs) -> Result<()> {
    let kind = StackKind::from(args.stack);
    print!("{}", kind.default_settings_yaml()?);
    Ok(())
}
