//! Presenter settings stored in `presenter.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::report::ReportLabels;

/// Presenter settings (TOML).
///
/// Missing fields take their defaults, so an empty file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PresenterSettings {
    pub report: ReportSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportSettings {
    /// Top-level report title.
    pub title: String,

    /// Appended to the title until a validation run completes.
    pub unprocessed_suffix: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        let labels = ReportLabels::default();
        Self {
            title: labels.title,
            unprocessed_suffix: labels.unprocessed_suffix,
        }
    }
}

impl PresenterSettings {
    pub fn validate(&self) -> Result<()> {
        if self.report.title.trim().is_empty() {
            return Err(anyhow!("report.title must not be empty"));
        }
        Ok(())
    }

    pub fn labels(&self) -> ReportLabels {
        ReportLabels {
            title: self.report.title.clone(),
            unprocessed_suffix: self.report.unprocessed_suffix.clone(),
        }
    }
}

/// Load settings from a TOML file.
///
/// If the file is missing, returns `PresenterSettings::default()`.
pub fn load_settings(path: &Path) -> Result<PresenterSettings> {
    if !path.exists() {
        return Ok(PresenterSettings::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let settings: PresenterSettings =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    settings
        .validate()
        .with_context(|| format!("invalid settings {}", path.display()))?;
    Ok(settings)
}

/// Atomically write settings to disk (temp file + rename).
pub fn write_settings(path: &Path, settings: &PresenterSettings) -> Result<()> {
    settings.validate()?;
    let mut buf = toml::to_string_pretty(settings).context("serialize settings toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("settings path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp settings {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace settings {}", path.display()))?;
    Ok(())
}
