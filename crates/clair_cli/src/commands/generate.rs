//! Build and deploy commands - render a generator's template.

use std::fs;
use std::io;

use anyhow::{Context, Result};
use tracing::{debug, info};

use clair_cfn::TemplateRenderer;
use clair_stacks::StackKind;

use super::GenerateArgs;

pub fn execute(kind: StackKind, args: GenerateArgs) -> Result<()> {
    if let Some(config) = &args.config {
        info!("Loading {} settings from {:?}", kind, config);
    }

    let template = kind
        .generate(args.config.as_deref())
        .with_context(|| format!("Failed to generate {} stack", kind))?;

    debug!(
        "{} stack: {} parameters, {} resources, {} outputs",
        kind,
        template.parameters().count(),
        template.resources().count(),
        template.outputs().count()
    );

    let renderer = TemplateRenderer::new(args.format.into());

    match &args.output {
        Some(path) => {
            // render fully before touching the file
            let mut rendered = renderer.render(&template)?;
            if !rendered.ends_with('\n') {
                rendered.push('\n');
            }
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write template to {:?}", path))?;
            info!("Wrote {} template to {:?}", kind, path);
        }
        None => {
            let stdout = io::stdout();
            renderer.write_to(&template, stdout.lock())?;
        }
    }

    Ok(())
}
