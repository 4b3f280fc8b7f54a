//! I/O helpers for presenter commands.

pub mod assertion_views;
pub mod catalog_store;
pub mod settings;
