//! JSON rendering of conversion results.
//!
//! Records are written as one JSON array of objects. Collected line errors
//! go to a separate report: `[{ "line_number", "error", "raw_line" }]`.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::driver::Conversion;
use crate::error::{ConvertError, LineError};

/// One entry of the error report file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReportEntry {
    pub line_number: usize,
    pub error: String,
    pub raw_line: String,
}

impl From<&LineError> for ErrorReportEntry {
    fn from(e: &LineError) -> Self {
        Self {
            line_number: e.line_number,
            error: e.error.to_string(),
            raw_line: e.raw_line.clone(),
        }
    }
}

impl Conversion {
    /// Render the records as a JSON array.
    pub fn records_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(&self.records)
        } else {
            serde_json::to_string(&self.records)
        }
    }

    /// Render collected line errors as a JSON array.
    pub fn error_report_json(&self) -> Result<String, serde_json::Error> {
        let entries: Vec<ErrorReportEntry> = self.errors.iter().map(Into::into).collect();
        serde_json::to_string_pretty(&entries)
    }

    /// Write collected line errors to the report at `path`, or log each of
    /// them when no report was requested. Does nothing without errors.
    pub fn report_errors(&self, path: Option<&Path>) -> Result<(), ConvertError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        match path {
            Some(path) => {
                write_text(Some(path), &self.error_report_json()?)?;
                tracing::warn!(
                    count = self.errors.len(),
                    report = %path.display(),
                    "lines with errors"
                );
            }
            None => {
                for error in &self.errors {
                    tracing::warn!("{error}");
                }
            }
        }
        Ok(())
    }
}

/// Write `text` plus a trailing newline to `path`, or to stdout when no
/// path is given. Missing parent directories are created.
pub fn write_text(path: Option<&Path>, text: &str) -> Result<(), ConvertError> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).map_err(|e| ConvertError::io_at(parent, e))?;
            }
            let mut contents = String::with_capacity(text.len() + 1);
            contents.push_str(text);
            contents.push('\n');
            fs::write(path, contents).map_err(|e| ConvertError::io_at(path, e))
        }
        None => write_stdout(text).map_err(ConvertError::io),
    }
}

fn write_stdout(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.write_all(b"\n")?;
    stdout.flush()
}
