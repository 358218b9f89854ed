//! Parallel conversion executor.
//!
//! Decodes each chunk on a scoped worker thread, then walks the per-line
//! outcomes in input order to apply the error policy. Because the walk is
//! ordered, `abort` reports the lowest failing line, exactly as the
//! sequential driver does.

use std::thread;

use copybook_rs::{
    Conversion, ConversionStats, ConvertError, DecodeError, DecodeOptions, DecodedRecord,
    LineError, OnError, RecordLayout, process_line,
};

use crate::chunk::{Chunk, NumberedLine, split_chunks};

type Outcome<'t> = (NumberedLine<'t>, Result<DecodedRecord, DecodeError>);

fn decode_chunk<'t>(
    layout: &RecordLayout,
    chunk: &Chunk<'t>,
    options: &DecodeOptions,
) -> Vec<Outcome<'t>> {
    chunk
        .lines
        .iter()
        .map(|line| {
            let result = tracing::info_span!("line", number = line.line_number)
                .in_scope(|| process_line(layout, line.text, options));
            (*line, result)
        })
        .collect()
}

/// Decode all of `text` on up to `workers` threads.
///
/// Returns the same [`Conversion`] as `copybook_rs::convert` would.
pub fn decode_parallel(
    layout: &RecordLayout,
    text: &str,
    options: &DecodeOptions,
    workers: usize,
) -> Result<Conversion, ConvertError> {
    let split = split_chunks(text, workers);
    tracing::debug!(
        chunks = split.chunks.len(),
        lines = split.lines_read,
        "decoding in parallel"
    );

    let outcomes: Vec<Vec<Outcome<'_>>> = thread::scope(|scope| {
        let handles: Vec<_> = split
            .chunks
            .iter()
            .map(|chunk| scope.spawn(move || decode_chunk(layout, chunk, options)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    let mut conversion = Conversion {
        stats: ConversionStats {
            lines_read: split.lines_read,
            trailing_blank: split.trailing_blank,
            ..ConversionStats::default()
        },
        ..Conversion::default()
    };

    for (line, result) in outcomes.into_iter().flatten() {
        match result {
            Ok(record) => {
                conversion.stats.records += 1;
                conversion.records.push(record);
            }
            Err(error) => {
                let error = LineError {
                    line_number: line.line_number,
                    raw_line: line.text.to_string(),
                    error,
                };
                match options.on_error {
                    OnError::Abort => return Err(ConvertError::Line(error)),
                    OnError::Skip => {
                        conversion.stats.failed += 1;
                        tracing::warn!(line = line.line_number, error = %error.error, "skipping line");
                    }
                    OnError::Collect => {
                        conversion.stats.failed += 1;
                        conversion.errors.push(error);
                    }
                }
            }
        }
    }

    tracing::info!(
        lines = conversion.stats.lines_read,
        records = conversion.stats.records,
        failed = conversion.stats.failed,
        "finished parallel conversion"
    );
    Ok(conversion)
}
