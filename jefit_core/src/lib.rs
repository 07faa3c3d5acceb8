#![forbid(unsafe_code)]

//! Parser and domain model for JEFIT CSV exports.
//!
//! This crate provides:
//! - Domain types (settings, routines, workout sessions, exercise and cardio logs, notes)
//! - A row reader that keeps the blank rows terminating each section
//! - The section state machine and its marker table
//! - The section-demultiplexing parser that links records into one graph
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod clock;
pub mod config;
pub mod logging;
pub mod reader;
pub mod section;
pub mod parser;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use clock::{format_epoch, Zone};
pub use config::{Config, DanglingPolicy};
pub use section::Section;
pub use parser::{split_logs, ExportParser, ParserOptions};
