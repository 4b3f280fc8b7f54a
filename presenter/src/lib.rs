//! Reactive presenter core for Schematron compliance reports.
//!
//! A loaded rule catalog, a user filter and the output of a document validator
//! are turned into a grouped report. The crate keeps a strict split:
//!
//! - **[`core`]**: Pure, deterministic logic (state machine, filtering, derived
//!   value graph, report aggregation). No I/O.
//! - **[`io`]**: Filesystem adapters for settings, catalogs and validation
//!   reports.
//!
//! [`presenter::Presenter`] is the single dispatch point tying the core
//! together; [`commands`] drives it for the CLI.

pub mod commands;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod presenter;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
