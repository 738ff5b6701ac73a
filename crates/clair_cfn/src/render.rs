//! Template rendering.

use std::io::Write;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::info;

use crate::error::TemplateResult;
use crate::template::Template;

/// Indentation used for JSON output.
const JSON_INDENT: &[u8] = b"    ";

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Renders a [`Template`] to text.
///
/// Output is deterministic: sections and entries keep declaration order and
/// free-form maps are key-sorted, so the same build renders the same bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer {
    format: OutputFormat,
}

impl TemplateRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render the whole template. Nothing is written on failure.
    pub fn render(&self, template: &Template) -> TemplateResult<String> {
        let rendered = match self.format {
            OutputFormat::Json => {
                let mut buf = Vec::new();
                let formatter = PrettyFormatter::with_indent(JSON_INDENT);
                let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
                template.serialize(&mut serializer)?;
                // serde_json only emits valid UTF-8
                String::from_utf8_lossy(&buf).into_owned()
            }
            OutputFormat::Yaml => serde_yaml::to_string(template)?,
        };

        info!(
            "Rendered template as {} ({} resources, {} bytes)",
            self.format,
            template.resources().count(),
            rendered.len()
        );
        Ok(rendered)
    }

    /// Render and write to `writer`, followed by a newline for JSON.
    pub fn write_to<W: Write>(&self, template: &Template, mut writer: W) -> TemplateResult<()> {
        let rendered = self.render(template)?;
        writer.write_all(rendered.as_bytes())?;
        if !rendered.ends_with('\n') {
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}
