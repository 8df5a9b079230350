//! Stable exit codes for checklist CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid config, usage, or I/O errors.
pub const INVALID: i32 = 1;
/// A snapshot failed validation; no report was written.
pub const MALFORMED: i32 = 2;
