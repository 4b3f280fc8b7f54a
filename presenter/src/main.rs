//! Schematron report presenter CLI.
//!
//! Loads a rule catalog, applies filters, optionally attaches the output of a
//! validation run and prints the grouped report.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use presenter::commands::{self, ReportRequest};
use presenter::core::types::AssertionViewId;
use presenter::exit_codes;
use presenter::io::settings::load_settings;
use presenter::logging;

#[derive(Parser)]
#[command(
    name = "presenter",
    version,
    about = "Filter and group Schematron assertions into a compliance report"
)]
struct Cli {
    /// Settings file; missing means defaults.
    #[arg(long, global = true, default_value = "presenter.toml")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the grouped report for a rule catalog.
    Report {
        /// Rule catalog JSON (`assertionViews` + `schematronAsserts`).
        #[arg(long)]
        config: PathBuf,
        /// Validation report JSON (`failedAsserts`).
        #[arg(long)]
        results: Option<PathBuf>,
        /// Only show assertions with this role ("all" disables the filter).
        #[arg(long)]
        role: Option<String>,
        /// Case-insensitive substring to match against assertion messages.
        #[arg(long)]
        text: Option<String>,
        /// Assertion view id, counted from 1; 0 shows no groups.
        #[arg(long)]
        view: Option<AssertionViewId>,
        /// Print the full snapshot as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the roles and assertion views offered by a rule catalog.
    Options {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Validate an assertion view file and write its canonical form.
    ParseAssertionView { input: PathBuf, output: PathBuf },
    /// Write default settings to the `--settings` path if missing.
    InitSettings {
        /// Overwrite an existing settings file.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Report {
            config,
            results,
            role,
            text,
            view,
            json,
        } => {
            let settings = load_settings(&cli.settings)?;
            let request = ReportRequest {
                config,
                results,
                role,
                text,
                view,
            };
            commands::run_report(&request, settings.labels(), json)
        }
        Command::Options { config, json } => {
            commands::run_options(&config, json)?;
            Ok(exit_codes::OK)
        }
        Command::ParseAssertionView { input, output } => {
            commands::run_parse_assertion_view(&input, &output)?;
            Ok(exit_codes::OK)
        }
        Command::InitSettings { force } => {
            commands::run_init_settings(&cli.settings, force)?;
            Ok(exit_codes::OK)
        }
    }
}
