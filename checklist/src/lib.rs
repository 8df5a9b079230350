//! Start-list change report for O Checklist snapshot exports.
//!
//! O Checklist publishes a snapshot of the start list every few minutes. This
//! crate folds an ordered series of those snapshots into four change buckets
//! (card changes, did-not-start, late starts, comments) plus cumulative
//! statistics per snapshot. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (parsing, classification,
//!   aggregation). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config file, drop folder, report
//!   files, publishing).
//!
//! [`pipeline`] coordinates the two to implement the CLI commands.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
