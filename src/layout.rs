//! Record layouts: the declarative description of a fixed-width record.
//!
//! Layout files are JSON documents of the form used by `cobol_to_json`:
//!
//! ```text
//! {
//!   "description": "Customer master",
//!   "record_length": 41,
//!   "fields": [
//!     { "name": "customer_id",     "start_pos": 1,  "length": 5,  "kind": "Numeric" },
//!     { "name": "customer_name",   "start_pos": 6,  "length": 25, "kind": "Text", "strip": true },
//!     { "name": "account_balance", "start_pos": 31, "length": 10, "kind": "SignedNumeric",
//!       "decimals": 2, "signed": true },
//!     { "name": "status_code",     "start_pos": 41, "length": 1,  "kind": "PIC X" }
//!   ]
//! }
//! ```
//!
//! Positions are 1-based columns, as on a coding form. `kind` accepts the
//! names `Numeric`, `Text`, `SignedNumeric` or the picture clauses `PIC 9`,
//! `PIC X`, `PIC S9`; `type` is accepted in place of `kind`.
//!
//! A layout is validated once when it is built and never changes afterwards.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ConvertError, DecodeError};

/// Largest number of implied fractional digits a fixed-point value can hold.
pub const MAX_DECIMALS: u32 = 28;

/// Interpretation of a field's characters (its picture clause).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// `PIC 9` - unsigned digits.
    Numeric,
    /// `PIC X` - character data.
    Text,
    /// `PIC S9` - digits with a trailing sign.
    SignedNumeric,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Numeric => "Numeric",
            FieldKind::Text => "Text",
            FieldKind::SignedNumeric => "SignedNumeric",
        }
    }

    pub fn picture(&self) -> &'static str {
        match self {
            FieldKind::Numeric => "PIC 9",
            FieldKind::Text => "PIC X",
            FieldKind::SignedNumeric => "PIC S9",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldKind {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let bare = upper
            .strip_prefix("PIC")
            .map(str::trim_start)
            .unwrap_or(upper.as_str());

        match bare {
            "NUMERIC" | "9" => Ok(FieldKind::Numeric),
            "TEXT" | "X" => Ok(FieldKind::Text),
            "SIGNEDNUMERIC" | "SIGNED_NUMERIC" | "S9" => Ok(FieldKind::SignedNumeric),
            _ => Err(DecodeError::malformed(format!(
                "unrecognized field kind '{s}' (expected one of: {})",
                [FieldKind::Numeric, FieldKind::Text, FieldKind::SignedNumeric]
                    .iter()
                    .map(|k| format!("{k} / {}", k.picture()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// One output field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Output key; non-empty and unique within a layout.
    pub name: String,
    /// 1-based starting column.
    pub start_pos: usize,
    /// Width in characters.
    pub length: usize,
    pub kind: FieldKind,
    /// Trim surrounding whitespace before conversion.
    pub strip: bool,
    /// Implied fractional digits for numeric kinds.
    pub decimals: u32,
    /// Whether a `SignedNumeric` field may carry a sign indicator.
    pub signed: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, start_pos: usize, length: usize, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            start_pos,
            length,
            kind,
            strip: false,
            decimals: 0,
            signed: true,
        }
    }

    pub fn with_strip(mut self, strip: bool) -> Self {
        self.strip = strip;
        self
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    /// Last column (1-based, inclusive) occupied by this field, or `None`
    /// when the field is empty or its end is not addressable.
    pub fn end_pos(&self) -> Option<usize> {
        self.start_pos.checked_add(self.length.checked_sub(1)?)
    }
}

/// An ordered, validated set of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    description: Option<String>,
    record_length: Option<usize>,
    fields: Vec<FieldSpec>,
}

impl RecordLayout {
    /// Build a layout from field descriptors, validating it.
    pub fn new(fields: Vec<FieldSpec>, record_length: Option<usize>) -> Result<Self, DecodeError> {
        validate(&fields, record_length)?;
        Ok(Self {
            description: None,
            record_length,
            fields,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parse a JSON layout description.
    pub fn from_json_str(text: &str) -> Result<Self, DecodeError> {
        let raw: RawLayout = serde_json::from_str(text)
            .map_err(|e| DecodeError::malformed(format!("invalid layout JSON: {e}")))?;
        raw.into_layout()
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, ConvertError> {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(ConvertError::io)?;
        Self::from_json_str(&text).map_err(ConvertError::Layout)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConvertError::io_at(path, e))?;
        let layout = Self::from_json_str(&text).map_err(ConvertError::Layout)?;
        tracing::debug!(
            path = %path.display(),
            fields = layout.fields.len(),
            "loaded record layout"
        );
        Ok(layout)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn record_length(&self) -> Option<usize> {
        self.record_length
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn validate(fields: &[FieldSpec], record_length: Option<usize>) -> Result<(), DecodeError> {
    if fields.is_empty() {
        return Err(DecodeError::malformed("layout has no fields"));
    }
    if record_length == Some(0) {
        return Err(DecodeError::malformed("record_length must be positive"));
    }

    let mut seen = HashSet::new();
    for field in fields {
        if field.name.is_empty() {
            return Err(DecodeError::malformed("field name must not be empty"));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(DecodeError::malformed(format!(
                "duplicate field name '{}'",
                field.name
            )));
        }
        if field.start_pos == 0 {
            return Err(DecodeError::malformed(format!(
                "field '{}': start_pos must be positive",
                field.name
            )));
        }
        if field.length == 0 {
            return Err(DecodeError::malformed(format!(
                "field '{}': length must be positive",
                field.name
            )));
        }
        if field.decimals > 0 && field.kind == FieldKind::Text {
            return Err(DecodeError::malformed(format!(
                "field '{}': decimals apply only to numeric kinds",
                field.name
            )));
        }
        if field.decimals > MAX_DECIMALS {
            return Err(DecodeError::malformed(format!(
                "field '{}': decimals {} exceeds maximum {MAX_DECIMALS}",
                field.name, field.decimals
            )));
        }
        let Some(end_pos) = field.end_pos() else {
            return Err(DecodeError::malformed(format!(
                "field '{}': start_pos {} + length {} overflows the column range",
                field.name, field.start_pos, field.length
            )));
        };
        if let Some(record_length) = record_length
            && end_pos > record_length
        {
            return Err(DecodeError::malformed(format!(
                "field '{}' ends at column {end_pos} beyond record_length {record_length}",
                field.name
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// JSON form
// ---------------------------------------------------------------------------

/// Layout document as written on disk. Attributes are optional here so
/// that missing ones are reported by name rather than as serde errors.
#[derive(Deserialize)]
struct RawLayout {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    record_length: Option<i64>,
    #[serde(default)]
    fields: Option<Vec<RawField>>,
}

#[derive(Deserialize)]
struct RawField {
    name: Option<String>,
    start_pos: Option<i64>,
    length: Option<i64>,
    #[serde(alias = "type")]
    kind: Option<String>,
    #[serde(default)]
    strip: bool,
    #[serde(default)]
    decimals: Option<i64>,
    #[serde(default)]
    signed: Option<bool>,
}

impl RawLayout {
    fn into_layout(self) -> Result<RecordLayout, DecodeError> {
        let record_length = match self.record_length {
            Some(n) if n <= 0 => {
                return Err(DecodeError::malformed(format!(
                    "record_length must be positive, got {n}"
                )));
            }
            Some(n) => Some(n as usize),
            None => None,
        };

        let raw_fields = self
            .fields
            .ok_or_else(|| DecodeError::malformed("missing required attribute 'fields'"))?;

        let fields = raw_fields
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| raw.into_field(idx + 1))
            .collect::<Result<Vec<_>, _>>()?;

        let layout = RecordLayout::new(fields, record_length)?;
        Ok(match self.description {
            Some(description) => layout.with_description(description),
            None => layout,
        })
    }
}

impl RawField {
    fn into_field(self, index: usize) -> Result<FieldSpec, DecodeError> {
        let label = match &self.name {
            Some(name) => format!("field '{name}'"),
            None => format!("field #{index}"),
        };
        let missing =
            |attr: &str| DecodeError::malformed(format!("{label}: missing required attribute '{attr}'"));

        let name = self.name.clone().ok_or_else(|| missing("name"))?;
        let start_pos = self.start_pos.ok_or_else(|| missing("start_pos"))?;
        let length = self.length.ok_or_else(|| missing("length"))?;
        let kind = self.kind.as_deref().ok_or_else(|| missing("kind"))?;

        if start_pos <= 0 {
            return Err(DecodeError::malformed(format!(
                "{label}: start_pos must be positive, got {start_pos}"
            )));
        }
        if length <= 0 {
            return Err(DecodeError::malformed(format!(
                "{label}: length must be positive, got {length}"
            )));
        }
        let kind = kind
            .parse::<FieldKind>()
            .map_err(|e| DecodeError::malformed(format!("{label}: {e}")))?;

        let decimals = match self.decimals {
            None => 0,
            Some(d) if d < 0 => {
                return Err(DecodeError::malformed(format!(
                    "{label}: decimals must not be negative, got {d}"
                )));
            }
            Some(d) => u32::try_from(d).unwrap_or(u32::MAX),
        };

        Ok(FieldSpec::new(name, start_pos as usize, length as usize, kind)
            .with_strip(self.strip)
            .with_decimals(decimals)
            .with_signed(self.signed.unwrap_or(true)))
    }
}
