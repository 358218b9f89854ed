//! Post-decode record processors.
//!
//! A `RecordProcessor` sees each successfully decoded record before the
//! driver accepts it, and may rewrite it or reject it. Rejections count as
//! a failure of that line and go through the driver's `on_error` policy.
//!
//! Processors take `&self` so one set can be shared by every worker of a
//! parallel decode.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rust_decimal::Decimal;

use crate::error::DecodeError;
use crate::value::{DecodedRecord, FieldValue};

/// A validation or transformation step applied to each decoded record.
pub trait RecordProcessor: Send + Sync {
    /// Inspect one record, returning it (possibly rewritten) or an error.
    fn process(&self, record: DecodedRecord) -> Result<DecodedRecord, DecodeError>;

    /// The display name of this processor.
    fn name(&self) -> &str;
}

/// Run `record` through `processors` in order, stopping at the first
/// rejection.
pub fn apply_processors(
    processors: &[Arc<dyn RecordProcessor>],
    record: DecodedRecord,
) -> Result<DecodedRecord, DecodeError> {
    processors
        .iter()
        .try_fold(record, |record, p| p.process(record))
}

// ---------------------------------------------------------------------------
// Processor implementations
// ---------------------------------------------------------------------------

/// Rejects records whose field value is not in an allowed set.
pub struct OneOf {
    field: String,
    allowed: Vec<String>,
}

impl OneOf {
    pub fn new<I, S>(field: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl RecordProcessor for OneOf {
    fn process(&self, record: DecodedRecord) -> Result<DecodedRecord, DecodeError> {
        let Some(value) = record.get(&self.field) else {
            return Err(DecodeError::RuleViolation {
                field: self.field.clone(),
                reason: "field is missing".to_string(),
            });
        };
        let text = value.to_string();
        if self.allowed.iter().any(|a| *a == text) {
            Ok(record)
        } else {
            Err(DecodeError::RuleViolation {
                field: self.field.clone(),
                reason: format!(
                    "value '{text}' is not one of [{}]",
                    self.allowed.join(", ")
                ),
            })
        }
    }

    fn name(&self) -> &str {
        "ONE-OF"
    }
}

/// Upper-cases a text field. Records without the field pass unchanged.
pub struct Uppercase {
    field: String,
}

impl Uppercase {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl RecordProcessor for Uppercase {
    fn process(&self, mut record: DecodedRecord) -> Result<DecodedRecord, DecodeError> {
        if let Some(FieldValue::Text(text)) = record.get(&self.field) {
            let upper = text.to_uppercase();
            record.set(self.field.clone(), FieldValue::Text(upper));
        }
        Ok(record)
    }

    fn name(&self) -> &str {
        "UPPERCASE"
    }
}

/// Appends a boolean field that is true when `field` equals `equals`.
pub struct DerivedFlag {
    name: String,
    field: String,
    equals: String,
}

impl DerivedFlag {
    pub fn new(
        name: impl Into<String>,
        field: impl Into<String>,
        equals: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            equals: equals.into(),
        }
    }
}

impl RecordProcessor for DerivedFlag {
    fn process(&self, mut record: DecodedRecord) -> Result<DecodedRecord, DecodeError> {
        let flag = record
            .get(&self.field)
            .is_some_and(|v| v.to_string() == self.equals);
        record.set(self.name.clone(), FieldValue::Flag(flag));
        Ok(record)
    }

    fn name(&self) -> &str {
        "DERIVED-FLAG"
    }
}

/// Logs a warning for records whose numeric `field` is below `threshold`.
/// Never rejects; the record passes through unchanged.
pub struct WarnBelow {
    field: String,
    threshold: Decimal,
    key: Option<String>,
    flagged: AtomicUsize,
}

impl WarnBelow {
    pub fn new(field: impl Into<String>, threshold: Decimal) -> Self {
        Self {
            field: field.into(),
            threshold,
            key: None,
            flagged: AtomicUsize::new(0),
        }
    }

    /// Include this field's value (e.g. a customer id) in each warning.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Number of records warned about so far.
    pub fn flagged(&self) -> usize {
        self.flagged.load(Ordering::Relaxed)
    }
}

impl RecordProcessor for WarnBelow {
    fn process(&self, record: DecodedRecord) -> Result<DecodedRecord, DecodeError> {
        let Some(value) = record.get(&self.field).and_then(FieldValue::as_decimal) else {
            return Ok(record);
        };
        if value < self.threshold {
            self.flagged.fetch_add(1, Ordering::Relaxed);
            let key = self
                .key
                .as_deref()
                .and_then(|k| record.get(k))
                .map(ToString::to_string);
            tracing::warn!(
                field = %self.field,
                key = key.as_deref().unwrap_or("-"),
                %value,
                threshold = %self.threshold,
                "value below threshold"
            );
        }
        Ok(record)
    }

    fn name(&self) -> &str {
        "WARN-BELOW"
    }
}

/// Wraps a closure as a processor.
pub struct FnProcessor<F> {
    name: String,
    f: F,
}

impl<F> FnProcessor<F>
where
    F: Fn(DecodedRecord) -> Result<DecodedRecord, DecodeError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> RecordProcessor for FnProcessor<F>
where
    F: Fn(DecodedRecord) -> Result<DecodedRecord, DecodeError> + Send + Sync,
{
    fn process(&self, record: DecodedRecord) -> Result<DecodedRecord, DecodeError> {
        (self.f)(record)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
