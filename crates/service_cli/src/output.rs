//! Result rendering.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Indented JSON
    #[default]
    Pretty,
    /// Single-line JSON
    Json,
}

/// Serialises `value` in `format`.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        OutputFormat::Json => serde_json::to_string(value)?,
    };
    Ok(text)
}

/// Writes `value` to `path`, or to stdout when no path is given.
pub fn emit<T: Serialize>(value: &T, format: OutputFormat, path: Option<&Path>) -> Result<()> {
    let mut text = render(value, format)?;
    text.push('\n');
    match path {
        Some(path) => {
            std::fs::write(path, text)?;
            tracing::info!(path = %path.display(), "result written");
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(text.as_bytes())?;
            handle.flush()?;
        }
    }
    Ok(())
}
