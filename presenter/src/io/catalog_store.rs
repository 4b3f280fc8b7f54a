//! JSON loaders for the rule catalog and validation reports.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::invariants::validate_config;
use crate::core::types::{SchematronConfig, ValidationReport};

/// Load a rule catalog and check its invariants.
pub fn load_config(path: &Path) -> Result<SchematronConfig> {
    let config: SchematronConfig = read_json(path, "config")?;
    let errors = validate_config(&config);
    if !errors.is_empty() {
        bail!(
            "config invariants failed for {}: {}",
            path.display(),
            errors.join("; ")
        );
    }
    Ok(config)
}

/// Load the output of one validation run.
pub fn load_validation_report(path: &Path) -> Result<ValidationReport> {
    read_json(path, "validation report")
}

/// Serialize `value` to pretty-printed JSON with trailing newline.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut payload = serde_json::to_string_pretty(value).context("serialize json")?;
    payload.push('\n');
    fs::write(path, payload).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {} {}", what, path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {} {}", what, path.display()))
}
