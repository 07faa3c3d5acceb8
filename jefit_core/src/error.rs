//! Error types for the jefit_core library.

use crate::section::Section;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for jefit_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A row is too short for a column its section reads
    #[error("{section} section, line {line}: row has {len} fields, column {column} required")]
    MalformedRow {
        section: Section,
        line: usize,
        column: usize,
        len: usize,
    },

    /// A non-blank row outside any section carries no marker (strict mode only)
    #[error("line {line}: row does not start a known section")]
    UnknownSection { line: usize },

    /// A record links to an identifier that was never registered
    #[error("{section} section, line {line}: {kind} '{id}' does not exist")]
    DanglingReference {
        section: Section,
        line: usize,
        kind: &'static str,
        id: String,
    },

    /// Input ended before the section's blank terminator row
    #[error("{section} section, line {line}: input ended before the section was terminated")]
    TruncatedSection { section: Section, line: usize },

    /// A single-row section's header is followed by a blank row
    #[error("{section} section, line {line}: blank row where a data row was expected")]
    MissingDataRow { section: Section, line: usize },

    /// The start-epoch column is not a usable Unix timestamp
    #[error("{section} section, line {line}: invalid epoch timestamp '{value}'")]
    InvalidTimestamp {
        section: Section,
        line: usize,
        value: String,
    },
}

impl Error {
    /// Line the error was raised on, for parse errors that carry one
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::MalformedRow { line, .. }
            | Error::UnknownSection { line }
            | Error::DanglingReference { line, .. }
            | Error::TruncatedSection { line, .. }
            | Error::MissingDataRow { line, .. }
            | Error::InvalidTimestamp { line, .. } => Some(*line),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_section_and_line() {
        let err = Error::TruncatedSection {
            section: Section::CardioLogs,
            line: 42,
        };
        let msg = err.to_string();
        assert!(msg.contains("cardio logs"));
        assert!(msg.contains("42"));
        assert_eq!(err.line(), Some(42));
    }

    #[test]
    fn test_missing_data_row_message() {
        let err = Error::MissingDataRow {
            section: Section::Settings,
            line: 3,
        };
        assert_eq!(
            err.to_string(),
            "settings section, line 3: blank row where a data row was expected"
        );
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_io_error_has_no_line() {
        let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.line(), None);
    }
}
