//! Error types for layout loading, record decoding, and file conversion.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a layout or decoding a single record.
///
/// Every variant carries enough context (field name, expected vs. actual)
/// to localize the fault; line numbers are attached by [`LineError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The layout description is structurally invalid.
    #[error("malformed layout: {reason}")]
    MalformedLayout {
        /// What is wrong with the layout.
        reason: String,
    },

    /// The line is not exactly `record_length` characters wide.
    #[error("record length mismatch: expected {expected}, got {actual}")]
    RecordLengthMismatch {
        /// Width declared by the layout.
        expected: usize,
        /// Width of the offending line.
        actual: usize,
    },

    /// A field's column range extends past the end of the line.
    #[error(
        "field '{field}' at {start_pos},{length} is out of range for a line of {line_length} characters"
    )]
    FieldOutOfRange {
        field: String,
        start_pos: usize,
        length: usize,
        line_length: usize,
    },

    /// A `Numeric` field holds something other than digits.
    #[error("field '{field}' is not a valid numeric value '{value}': {reason}")]
    InvalidNumericField {
        field: String,
        value: String,
        reason: String,
    },

    /// A `SignedNumeric` field holds an unrecognized sign or non-digit.
    #[error("field '{field}' is not a valid signed numeric value '{value}': {reason}")]
    InvalidSignedField {
        field: String,
        value: String,
        reason: String,
    },

    /// A post-decode processor rejected the record.
    #[error("field '{field}' rejected: {reason}")]
    RuleViolation { field: String, reason: String },
}

impl DecodeError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedLayout {
            reason: reason.into(),
        }
    }
}

/// A decode failure attached to the 1-based line it came from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_number}: {error}")]
pub struct LineError {
    pub line_number: usize,
    /// The offending line with its terminator removed.
    pub raw_line: String,
    #[source]
    pub error: DecodeError,
}

/// Errors raised by whole-file conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The layout could not be loaded.
    #[error("{0}")]
    Layout(DecodeError),

    /// A line failed under the `abort` policy.
    #[error(transparent)]
    Line(#[from] LineError),

    /// Reading the layout or the input failed.
    #[error("I/O error on {}: {}", describe_path(.path), .source)]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// Rendering output as JSON failed.
    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    pub(crate) fn io(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }

    pub(crate) fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }
}

fn describe_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!("'{}'", p.display()),
        None => "input".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch_message() {
        let err = DecodeError::RecordLengthMismatch {
            expected: 42,
            actual: 41,
        };
        assert_eq!(
            err.to_string(),
            "record length mismatch: expected 42, got 41"
        );
    }

    #[test]
    fn test_line_error_prefixes_line_number() {
        let err = LineError {
            line_number: 7,
            raw_line: "ABC".to_string(),
            error: DecodeError::malformed("x"),
        };
        assert_eq!(err.to_string(), "line 7: malformed layout: x");
    }

    #[test]
    fn test_io_error_names_path() {
        let err = ConvertError::io_at(
            "missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("'missing.json'"));
    }
}
