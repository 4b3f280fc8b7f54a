//! Deterministic, pure logic of the presenter.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod filter;
pub mod graph;
pub mod invariants;
pub mod machine;
pub mod report;
pub mod types;
pub mod validator;
