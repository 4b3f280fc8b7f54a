//! Orchestration for `presenter` CLI commands.
//!
//! Each command loads its inputs through [`crate::io`], feeds them to a
//! [`Presenter`] as events and renders the resulting snapshot.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::core::machine::PresenterEvent;
use crate::core::report::{CheckStatus, ReportLabels, fired_assertions};
use crate::core::types::{AssertionViewId, FilterOptions};
use crate::core::validator::{ValidatorEvent, ValidatorMachine, ValidatorSnapshot};
use crate::exit_codes;
use crate::io::assertion_views::parse_assertion_views;
use crate::io::catalog_store::{load_config, load_validation_report};
use crate::io::settings::{PresenterSettings, write_settings};
use crate::presenter::{Presenter, Snapshot};

/// Inputs of `presenter report`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportRequest {
    pub config: PathBuf,
    /// Validation output to attach; without it the report stays unprocessed.
    pub results: Option<PathBuf>,
    pub role: Option<String>,
    pub text: Option<String>,
    /// Defaults to the first view when the catalog has any.
    pub view: Option<AssertionViewId>,
}

/// Result of preparing a report: the snapshot plus the run-wide fired count.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedReport {
    pub snapshot: Snapshot,
    /// Catalog assertions that fired in a completed run, whatever the filter
    /// or view hides.
    pub fired_assertions: usize,
}

impl PreparedReport {
    /// `TRIGGERED` once any catalog assertion fired, `OK` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.fired_assertions > 0 {
            exit_codes::TRIGGERED
        } else {
            exit_codes::OK
        }
    }
}

/// Load inputs, replay them as presenter events and capture the result.
pub fn prepare_report(request: &ReportRequest, labels: ReportLabels) -> Result<PreparedReport> {
    let config = load_config(&request.config)?;
    let has_views = !config.assertion_views.is_empty();
    let mut presenter = Presenter::new(ValidatorMachine::new(), labels)
        .context("build presenter dependency graph")?;

    presenter
        .dispatch(PresenterEvent::ConfigLoaded { config })
        .context("load config into presenter")?;
    if let Some(role) = &request.role {
        presenter
            .dispatch(PresenterEvent::FilterRoleChanged { role: role.clone() })
            .context("apply role filter")?;
    }
    if let Some(text) = &request.text {
        presenter
            .dispatch(PresenterEvent::FilterTextChanged { text: text.clone() })
            .context("apply text filter")?;
    }
    let view = request.view.unwrap_or(if has_views { 1 } else { 0 });
    presenter
        .dispatch(PresenterEvent::FilterAssertionViewChanged {
            assertion_view_id: view,
        })
        .context("select assertion view")?;

    if let Some(results) = &request.results {
        let report = load_validation_report(results)?;
        info!(
            results = %results.display(),
            failed = report.failed_asserts.len(),
            "attaching validation results"
        );
        let file_name = results.display().to_string();
        presenter
            .drive_validator(|validator| {
                validator.dispatch(ValidatorEvent::ProcessFile { file_name })?;
                validator.dispatch(ValidatorEvent::Completed { report })
            })
            .context("drive validator")?;
    }

    let fired = fired_assertions(
        &presenter.state().base().config.schematron_asserts,
        &ValidatorSnapshot::capture(presenter.validator()),
    );
    Ok(PreparedReport {
        snapshot: presenter.snapshot().clone(),
        fired_assertions: fired,
    })
}

/// Run `presenter report`, printing to stdout. Returns the exit code.
pub fn run_report(request: &ReportRequest, labels: ReportLabels, json: bool) -> Result<i32> {
    let prepared = prepare_report(request, labels)?;
    if json {
        let payload =
            serde_json::to_string_pretty(&prepared.snapshot).context("serialize snapshot")?;
        println!("{}", payload);
    } else {
        print!("{}", render_text(&prepared.snapshot));
    }

    info!(
        fired = prepared.fired_assertions,
        shown = prepared.snapshot.schematron_report.fired_checks(),
        "report rendered"
    );
    Ok(prepared.exit_code())
}

/// Plain-text rendering of a snapshot, one line per check.
pub fn render_text(snapshot: &Snapshot) -> String {
    let report = &snapshot.schematron_report;
    let mut lines = vec![
        report.summary.title.clone(),
        format!(
            "{} assertions, {} reports",
            report.summary.counts.assertions, report.summary.counts.reports
        ),
    ];
    if !snapshot.assertion_view.title.is_empty() {
        lines.push(format!("view: {}", snapshot.assertion_view.title));
    }
    for group in &report.groups {
        lines.push(format!("== {} ({}) ==", group.title, group.checks.summary));
        for check in &group.checks.checks {
            let marker = match check.status {
                CheckStatus::Pending => "....",
                CheckStatus::Pass => "PASS",
                CheckStatus::Fail => "FAIL",
            };
            let mut line = format!(
                "  [{}] {}: {}",
                marker, check.assertion.id, check.assertion.message
            );
            if !check.fired.is_empty() {
                line.push_str(&format!(" ({} fired)", check.fired.len()));
            }
            lines.push(line);
        }
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Filter options of a catalog.
pub fn options_for(config: &Path) -> Result<FilterOptions> {
    let config = load_config(config)?;
    let mut presenter = Presenter::new(ValidatorMachine::new(), ReportLabels::default())
        .context("build presenter dependency graph")?;
    let snapshot = presenter
        .dispatch(PresenterEvent::ConfigLoaded { config })
        .context("load config into presenter")?;
    Ok(snapshot.filter_options.as_ref().clone())
}

/// Run `presenter options`.
pub fn run_options(config: &Path, json: bool) -> Result<()> {
    let options = options_for(config)?;
    if json {
        let payload = serde_json::to_string_pretty(&options).context("serialize options")?;
        println!("{}", payload);
        return Ok(());
    }
    println!("roles: {}", options.roles.join(", "));
    for view in &options.assertion_views {
        println!("view {}: {}", view.id, view.title);
    }
    Ok(())
}

/// Run `presenter init-settings`. Returns false if an existing file was kept.
pub fn run_init_settings(path: &Path, force: bool) -> Result<bool> {
    if !force && path.exists() {
        println!("Kept {}", path.display());
        return Ok(false);
    }
    write_settings(path, &PresenterSettings::default())?;
    info!(path = %path.display(), "settings written");
    println!("Wrote {}", path.display());
    Ok(true)
}

/// Run `presenter parse-assertion-view`.
pub fn run_parse_assertion_view(input: &Path, output: &Path) -> Result<()> {
    let views = parse_assertion_views(input, output)?;
    info!(views = views.len(), output = %output.display(), "assertion views written");
    println!("Wrote {}", output.display());
    Ok(())
}
