//! Stable exit codes for presenter CLI commands.

/// Command succeeded; for `report`, nothing fired or validation did not run.
pub const OK: i32 = 0;
/// Command failed due to invalid input files, settings or rejected events.
pub const INVALID: i32 = 1;
/// `presenter report` validated the results and at least one assertion fired.
pub const TRIGGERED: i32 = 2;
