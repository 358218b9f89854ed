//! File-level conversion driver.
//!
//! Applies the record decoder to every line of an input source, in order,
//! as a single forward pass:
//!
//! - Line terminators are removed before decoding.
//! - Blank or whitespace-only lines at the end of the input are skipped.
//!   Blank lines followed by data are decoded like any other line.
//! - A failing line is reported with its 1-based line number and handled
//!   according to [`OnError`].
//!
//! [`Records`] is the lazy form; [`convert`] and [`convert_reader`] drain it
//! into a [`Conversion`].

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::iter::FusedIterator;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::decode::decode_line;
use crate::error::{ConvertError, DecodeError, LineError};
use crate::layout::RecordLayout;
use crate::processor::{RecordProcessor, apply_processors};
use crate::value::DecodedRecord;

/// What to do when a line fails to decode.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Report the error and stop.
    #[default]
    Abort,
    /// Log the error and continue with the next line.
    Skip,
    /// Keep the error for the caller and continue.
    Collect,
}

/// Caller-owned decoding configuration.
#[derive(Clone, Default)]
pub struct DecodeOptions {
    pub on_error: OnError,
    pub processors: Vec<Arc<dyn RecordProcessor>>,
}

impl DecodeOptions {
    pub fn new(on_error: OnError) -> Self {
        Self {
            on_error,
            processors: Vec::new(),
        }
    }

    pub fn with_processor(mut self, processor: impl RecordProcessor + 'static) -> Self {
        self.processors.push(Arc::new(processor));
        self
    }
}

/// Decode one line and run it through the configured processors.
pub fn process_line(
    layout: &RecordLayout,
    line: &str,
    options: &DecodeOptions,
) -> Result<DecodedRecord, DecodeError> {
    let record = decode_line(layout, line)?;
    apply_processors(&options.processors, record)
}

/// Counters for one pass over the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Lines read from the source, including skipped trailing blanks.
    pub lines_read: usize,
    /// Lines decoded into records.
    pub records: usize,
    /// Lines that failed, whether skipped or collected.
    pub failed: usize,
    /// Blank lines dropped from the end of the input.
    pub trailing_blank: usize,
}

/// Iterator over the lines of a `&str`, shaped like `BufRead::lines`.
pub type TextLines<'t> = std::iter::Map<std::str::Lines<'t>, fn(&'t str) -> io::Result<String>>;

/// Lazy, single-pass sequence of decoded records.
///
/// Yields `Ok(record)` per decoded line. Under [`OnError::Abort`] the first
/// failing line is yielded as `Err` and iteration ends; under `Skip` and
/// `Collect` failing lines are passed over. An I/O error from the source
/// always ends iteration.
pub struct Records<'a, I> {
    layout: &'a RecordLayout,
    options: &'a DecodeOptions,
    lines: I,
    line_number: usize,
    /// Blank lines not yet known to be trailing.
    blanks: Vec<(usize, String)>,
    ready: VecDeque<(usize, String)>,
    errors: Vec<LineError>,
    stats: ConversionStats,
    done: bool,
}

impl<'a, I> Records<'a, I>
where
    I: Iterator<Item = io::Result<String>>,
{
    pub fn new(layout: &'a RecordLayout, lines: I, options: &'a DecodeOptions) -> Self {
        Self {
            layout,
            options,
            lines,
            line_number: 0,
            blanks: Vec::new(),
            ready: VecDeque::new(),
            errors: Vec::new(),
            stats: ConversionStats::default(),
            done: false,
        }
    }

    /// Errors gathered under [`OnError::Collect`], in line order.
    pub fn errors(&self) -> &[LineError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<LineError> {
        std::mem::take(&mut self.errors)
    }

    pub fn stats(&self) -> ConversionStats {
        self.stats
    }

    /// Pull the next non-trailing line from the source.
    fn next_line(&mut self) -> Option<io::Result<(usize, String)>> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Some(Ok(item));
            }
            match self.lines.next() {
                None => {
                    if !self.blanks.is_empty() {
                        tracing::debug!(count = self.blanks.len(), "skipping trailing blank lines");
                        self.stats.trailing_blank = self.blanks.len();
                        self.blanks.clear();
                    }
                    return None;
                }
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok(line)) => {
                    self.line_number += 1;
                    self.stats.lines_read += 1;
                    if line.trim().is_empty() {
                        self.blanks.push((self.line_number, line));
                    } else {
                        self.ready.extend(self.blanks.drain(..));
                        self.ready.push_back((self.line_number, line));
                    }
                }
            }
        }
    }
}

impl<I> Iterator for Records<'_, I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = Result<DecodedRecord, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let (line_number, line) = match self.next_line() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(ConvertError::io(e)));
                }
                Some(Ok(item)) => item,
            };

            let result = tracing::info_span!("line", number = line_number)
                .in_scope(|| process_line(self.layout, &line, self.options));
            match result {
                Ok(record) => {
                    self.stats.records += 1;
                    return Some(Ok(record));
                }
                Err(error) => {
                    let error = LineError {
                        line_number,
                        raw_line: line,
                        error,
                    };
                    match self.options.on_error {
                        OnError::Abort => {
                            self.done = true;
                            return Some(Err(ConvertError::Line(error)));
                        }
                        OnError::Skip => {
                            self.stats.failed += 1;
                            tracing::warn!(line = line_number, error = %error.error, "skipping line");
                        }
                        OnError::Collect => {
                            self.stats.failed += 1;
                            tracing::debug!(line = line_number, error = %error.error, "collected line error");
                            self.errors.push(error);
                        }
                    }
                }
            }
        }
        None
    }
}

impl<I> FusedIterator for Records<'_, I> where I: Iterator<Item = io::Result<String>> {}

/// Decode lines from a buffered reader.
pub fn decode_reader<'a, R: BufRead>(
    layout: &'a RecordLayout,
    reader: R,
    options: &'a DecodeOptions,
) -> Records<'a, io::Lines<R>> {
    Records::new(layout, reader.lines(), options)
}

/// Decode lines from in-memory text.
pub fn decode_str<'a, 't>(
    layout: &'a RecordLayout,
    text: &'t str,
    options: &'a DecodeOptions,
) -> Records<'a, TextLines<'t>> {
    let owned: fn(&'t str) -> io::Result<String> = |line| Ok(line.to_string());
    Records::new(layout, text.lines().map(owned), options)
}

/// The outcome of a complete conversion.
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub records: Vec<DecodedRecord>,
    /// Line errors gathered under [`OnError::Collect`].
    pub errors: Vec<LineError>,
    pub stats: ConversionStats,
}

/// Decode all of `text`.
pub fn convert(
    layout: &RecordLayout,
    text: &str,
    options: &DecodeOptions,
) -> Result<Conversion, ConvertError> {
    drain(decode_str(layout, text, options))
}

/// Decode every line of `reader`.
pub fn convert_reader<R: BufRead>(
    layout: &RecordLayout,
    reader: R,
    options: &DecodeOptions,
) -> Result<Conversion, ConvertError> {
    drain(decode_reader(layout, reader, options))
}

fn drain<I>(mut records: Records<'_, I>) -> Result<Conversion, ConvertError>
where
    I: Iterator<Item = io::Result<String>>,
{
    let mut decoded = Vec::new();
    for record in records.by_ref() {
        decoded.push(record?);
    }

    let stats = records.stats();
    tracing::info!(
        lines = stats.lines_read,
        records = stats.records,
        failed = stats.failed,
        "finished conversion"
    );

    Ok(Conversion {
        records: decoded,
        errors: records.take_errors(),
        stats,
    })
}
