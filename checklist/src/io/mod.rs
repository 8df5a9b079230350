//! I/O helpers: configuration, snapshot retrieval and report output.

pub mod config;
pub mod provider;
pub mod publish;
pub mod report;
