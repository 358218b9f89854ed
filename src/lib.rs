//! # copybook-rs
//!
//! Layout-driven decoding of mainframe-style fixed-width records.
//!
//! Legacy batch systems exchange data as files of fixed-width text records
//! whose columns are described by a copybook: each field has a starting
//! column, a width, and a picture clause (`PIC 9`, `PIC X`, `PIC S9`). This
//! library reads such a description from a JSON layout file and turns each
//! line of a data file into an ordered, typed record ready to be written out
//! as JSON.
//!
//! ## Overview
//!
//! - **Layouts** ([`RecordLayout`]): loaded and validated once, then shared
//!   read-only by every decode call
//! - **Decoding** ([`decode_line`]): one line in, one [`DecodedRecord`] out;
//!   implied decimals become exact fixed-point values
//! - **Driving** ([`decode_str`], [`convert`]): a single forward pass over a
//!   file with an `abort`, `skip`, or `collect` error policy
//! - **Processors** ([`RecordProcessor`]): validation and transformation
//!   steps applied to each decoded record
//!
//! ## Example
//!
//! ```
//! use copybook_rs::{FieldKind, FieldSpec, FieldValue, RecordLayout, decode_line};
//!
//! // Record layout: Id(5) Name(25) Balance(10, S9 with 2 decimals)
//! let layout = RecordLayout::new(
//!     vec![
//!         FieldSpec::new("customer_id", 1, 5, FieldKind::Numeric),
//!         FieldSpec::new("customer_name", 6, 25, FieldKind::Text).with_strip(true),
//!         FieldSpec::new("account_balance", 31, 10, FieldKind::SignedNumeric)
//!             .with_decimals(2),
//!     ],
//!     Some(40),
//! )
//! .unwrap();
//!
//! let record = decode_line(&layout, "00101Alice Smith              000015075-").unwrap();
//!
//! assert_eq!(record.get("customer_id"), Some(&FieldValue::Integer(101)));
//! assert_eq!(record.get("customer_name").unwrap().as_text(), Some("Alice Smith"));
//! assert_eq!(record.get("account_balance").unwrap().to_string(), "-150.75");
//! ```

pub mod decode;
pub mod driver;
pub mod error;
pub mod layout;
pub mod output;
pub mod processor;
pub mod record;
pub mod sign;
pub mod value;

pub use decode::{decode_field, decode_line};
pub use driver::{
    Conversion, ConversionStats, DecodeOptions, OnError, Records, TextLines, convert,
    convert_reader, decode_reader, decode_str, process_line,
};
pub use error::{ConvertError, DecodeError, LineError};
pub use layout::{FieldKind, FieldSpec, MAX_DECIMALS, RecordLayout};
pub use output::{ErrorReportEntry, write_text};
pub use processor::{
    DerivedFlag, FnProcessor, OneOf, RecordProcessor, Uppercase, WarnBelow, apply_processors,
};
pub use record::RawRecord;
pub use value::{DecodedRecord, FieldValue};
