//! CLI command implementations
//!
//! Each submodule implements a specific CLI command. Commands return their
//! result value; rendering is left to the caller.

pub mod bond;
pub mod option;
pub mod risk;
pub mod strategy;

use serde::de::DeserializeOwned;
use std::path::Path;

use crate::config::CurveSettings;
use crate::error::{CliError, Result};
use pricer_core::market_data::LogDiscountCurve;

/// Reads a request file, as JSON for a `.json` extension and TOML otherwise.
pub fn load_input<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let parsed = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        toml::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| CliError::Parse {
        path: path.display().to_string(),
        message,
    })
}

/// Picks the discount curve: `--rate`, then the input file, then the config.
pub fn resolve_curve(
    rate: Option<f64>,
    input: Option<&CurveSettings>,
    configured: &CurveSettings,
) -> Result<LogDiscountCurve> {
    if let Some(rate) = rate {
        return CurveSettings::flat(rate).build();
    }
    match input {
        Some(curve) if !curve.is_empty() => curve.build(),
        _ => configured.build(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    /// Writes `content` to a unique file under the system temp directory.
    pub fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pricer-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }
}
