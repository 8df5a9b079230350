//! Deterministic, pure logic: snapshot parsing, classification, aggregation.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod aggregator;
pub mod classifier;
pub mod error;
pub mod parser;
pub mod statistics;
pub mod timestamp;
pub mod types;
