//! Record decoder: one fixed-width line in, one typed record out.
//!
//! Decoding is pure. The layout is borrowed, never mutated, so a single
//! [`RecordLayout`] can serve any number of threads at once. A line either
//! decodes completely or fails as a whole on the first bad field.

use rust_decimal::Decimal;

use crate::error::DecodeError;
use crate::layout::{FieldKind, FieldSpec, RecordLayout};
use crate::record::RawRecord;
use crate::sign::{self, Trailing};
use crate::value::{DecodedRecord, FieldValue};

/// Decode one line (terminator already removed) according to `layout`.
pub fn decode_line(layout: &RecordLayout, line: &str) -> Result<DecodedRecord, DecodeError> {
    let record = RawRecord::new(line);

    if let Some(expected) = layout.record_length()
        && record.len() != expected
    {
        return Err(DecodeError::RecordLengthMismatch {
            expected,
            actual: record.len(),
        });
    }

    let mut decoded = DecodedRecord::with_capacity(layout.fields().len());
    for field in layout.fields() {
        let raw = record
            .field(field.start_pos, field.length)
            .ok_or_else(|| DecodeError::FieldOutOfRange {
                field: field.name.clone(),
                start_pos: field.start_pos,
                length: field.length,
                line_length: record.len(),
            })?;
        decoded.set(field.name.clone(), decode_field(field, raw)?);
    }

    Ok(decoded)
}

/// Convert the extracted text of one field according to its kind.
pub fn decode_field(field: &FieldSpec, raw: &str) -> Result<FieldValue, DecodeError> {
    let text = if field.strip { raw.trim() } else { raw };

    match field.kind {
        FieldKind::Text => Ok(FieldValue::Text(text.to_string())),
        FieldKind::Numeric => decode_numeric(field, text),
        FieldKind::SignedNumeric => decode_signed(field, text),
    }
}

fn decode_numeric(field: &FieldSpec, text: &str) -> Result<FieldValue, DecodeError> {
    let invalid = |reason: String| DecodeError::InvalidNumericField {
        field: field.name.clone(),
        value: text.to_string(),
        reason,
    };

    if text.is_empty() {
        return Err(invalid("no digits".to_string()));
    }
    if let Some((offset, c)) = text.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        return Err(invalid(format!(
            "non-digit character {c:?} at offset {offset}"
        )));
    }

    let digits = text.bytes().map(|b| b - b'0');
    let mantissa = accumulate(digits).ok_or_else(|| invalid("value out of range".to_string()))?;
    scaled(mantissa, field.decimals).map_err(invalid)
}

fn decode_signed(field: &FieldSpec, text: &str) -> Result<FieldValue, DecodeError> {
    let invalid = |reason: String| DecodeError::InvalidSignedField {
        field: field.name.clone(),
        value: text.to_string(),
        reason,
    };

    let Some(last) = text.chars().next_back() else {
        return Err(invalid("no digits".to_string()));
    };
    let body = &text[..text.len() - last.len_utf8()];

    if let Some((offset, c)) = body.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        return Err(invalid(format!(
            "non-digit character {c:?} at offset {offset}"
        )));
    }
    let body_digits = body.bytes().map(|b| b - b'0');

    let trailing = sign::classify(last);
    if !field.signed && !matches!(trailing, Trailing::Digit(_)) {
        return Err(invalid(format!(
            "sign indicator {last:?} on a field declared unsigned"
        )));
    }

    let mantissa = match trailing {
        Trailing::Digit(d) | Trailing::Overpunch { digit: d, .. } => {
            accumulate(body_digits.chain(std::iter::once(d)))
        }
        Trailing::Explicit { .. } => {
            if body.is_empty() {
                return Err(invalid("sign without digits".to_string()));
            }
            accumulate(body_digits)
        }
        Trailing::Unrecognized => {
            return Err(invalid(format!("unrecognized sign character {last:?}")));
        }
    }
    .ok_or_else(|| invalid("value out of range".to_string()))?;

    let mantissa = if trailing.is_negative() {
        -mantissa
    } else {
        mantissa
    };
    scaled(mantissa, field.decimals).map_err(invalid)
}

/// Fold decimal digits into an integer, `None` on overflow.
fn accumulate(digits: impl Iterator<Item = u8>) -> Option<i128> {
    digits.fold(Some(0i128), |acc, d| {
        acc?.checked_mul(10)?.checked_add(i128::from(d))
    })
}

/// Apply the implied decimal point: integers stay integers, anything with
/// decimals becomes an exact fixed-point value.
fn scaled(mantissa: i128, decimals: u32) -> Result<FieldValue, String> {
    if decimals == 0 {
        return i64::try_from(mantissa)
            .map(FieldValue::Integer)
            .map_err(|_| "value out of range".to_string());
    }
    Decimal::try_from_i128_with_scale(mantissa, decimals)
        .map(FieldValue::Decimal)
        .map_err(|e| format!("value out of range: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(fields: Vec<FieldSpec>, record_length: Option<usize>) -> RecordLayout {
        RecordLayout::new(fields, record_length).unwrap()
    }

    fn dec(text: &str) -> FieldValue {
        FieldValue::Decimal(text.parse().unwrap())
    }

    fn balance() -> FieldSpec {
        FieldSpec::new("account_balance", 1, 10, FieldKind::SignedNumeric).with_decimals(2)
    }

    #[test]
    fn test_numeric_drops_leading_zeros() {
        let l = layout(vec![FieldSpec::new("id", 1, 5, FieldKind::Numeric)], None);
        let record = decode_line(&l, "00101").unwrap();
        assert_eq!(record.get("id"), Some(&FieldValue::Integer(101)));
    }

    #[test]
    fn test_text_strip() {
        let name = FieldSpec::new("name", 6, 25, FieldKind::Text).with_strip(true);
        let l = layout(vec![name], None);
        let line = format!("00101{:<25}", "Alice Smith");
        let record = decode_line(&l, &line).unwrap();
        assert_eq!(
            record.get("name"),
            Some(&FieldValue::Text("Alice Smith".to_string()))
        );
    }

    #[test]
    fn test_text_unstripped_keeps_width() {
        let name = FieldSpec::new("name", 1, 8, FieldKind::Text);
        let l = layout(vec![name], None);
        let record = decode_line(&l, "  Bob   ").unwrap();
        let text = record.get("name").unwrap().as_text().unwrap();
        assert_eq!(text, "  Bob   ");
        assert_eq!(text.chars().count(), 8);
    }

    #[test]
    fn test_signed_explicit_plus() {
        let l = layout(vec![balance()], None);
        let record = decode_line(&l, "000015075+").unwrap();
        assert_eq!(record.get("account_balance"), Some(&dec("150.75")));

        let record = decode_line(&l, "000009900+").unwrap();
        let value = record.get("account_balance").unwrap();
        assert_eq!(value, &dec("99.00"));
        assert_eq!(value.to_string(), "99.00");
    }

    #[test]
    fn test_signed_explicit_minus() {
        let l = layout(vec![balance()], None);
        let record = decode_line(&l, "000015075-").unwrap();
        assert_eq!(record.get("account_balance"), Some(&dec("-150.75")));
    }

    #[test]
    fn test_signed_overpunch() {
        let l = layout(vec![balance()], None);
        // '}' is negative zero digit, 'E' is positive five, 'N' is negative five.
        assert_eq!(
            decode_line(&l, "000001234}").unwrap().get("account_balance"),
            Some(&dec("-123.40"))
        );
        assert_eq!(
            decode_line(&l, "000001507E").unwrap().get("account_balance"),
            Some(&dec("150.75"))
        );
        assert_eq!(
            decode_line(&l, "000001507N").unwrap().get("account_balance"),
            Some(&dec("-150.75"))
        );
    }

    #[test]
    fn test_signed_without_sign_is_non_negative() {
        let l = layout(vec![balance()], None);
        let record = decode_line(&l, "0000150750").unwrap();
        assert_eq!(record.get("account_balance"), Some(&dec("1507.50")));
    }

    #[test]
    fn test_signed_integer() {
        let field = FieldSpec::new("delta", 1, 4, FieldKind::SignedNumeric);
        let l = layout(vec![field], None);
        assert_eq!(
            decode_line(&l, "042-").unwrap().get("delta"),
            Some(&FieldValue::Integer(-42))
        );
    }

    #[test]
    fn test_signed_unrecognized_trailing() {
        let l = layout(vec![balance()], None);
        let err = decode_line(&l, "000015075S").unwrap_err();
        assert!(
            matches!(&err, DecodeError::InvalidSignedField { field, .. } if field == "account_balance"),
            "{err:?}"
        );
    }

    #[test]
    fn test_signed_non_digit_body() {
        let l = layout(vec![balance()], None);
        let err = decode_line(&l, "0000 5075+").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidSignedField { .. }));
    }

    #[test]
    fn test_signed_false_rejects_sign() {
        let field = balance().with_signed(false);
        let l = layout(vec![field], None);
        assert!(decode_line(&l, "000015075-").is_err());
        assert_eq!(
            decode_line(&l, "0000150750").unwrap().get("account_balance"),
            Some(&dec("1507.50"))
        );
    }

    #[test]
    fn test_numeric_rejects_non_digits() {
        let l = layout(vec![FieldSpec::new("id", 1, 5, FieldKind::Numeric)], None);
        let err = decode_line(&l, "00A01").unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidNumericField {
                field: "id".to_string(),
                value: "00A01".to_string(),
                reason: "non-digit character 'A' at offset 2".to_string(),
            }
        );
        assert!(decode_line(&l, "  101").is_err());
    }

    #[test]
    fn test_numeric_strip_allows_padding() {
        let id = FieldSpec::new("id", 1, 5, FieldKind::Numeric).with_strip(true);
        let l = layout(vec![id], None);
        assert_eq!(
            decode_line(&l, "  101").unwrap().get("id"),
            Some(&FieldValue::Integer(101))
        );
        assert!(matches!(
            decode_line(&l, "     ").unwrap_err(),
            DecodeError::InvalidNumericField { .. }
        ));
    }

    #[test]
    fn test_numeric_with_decimals() {
        let rate = FieldSpec::new("rate", 1, 6, FieldKind::Numeric).with_decimals(3);
        let l = layout(vec![rate], None);
        assert_eq!(decode_line(&l, "012500").unwrap().get("rate"), Some(&dec("12.500")));
    }

    #[test]
    fn test_numeric_reformat_round_trip() {
        let field = FieldSpec::new("amount", 1, 8, FieldKind::Numeric).with_decimals(2);
        let l = layout(vec![field], None);
        for original in ["00000000", "00000001", "12345678", "00990000", "99999999"] {
            let value = decode_line(&l, original).unwrap();
            let decimal = value.get("amount").unwrap().as_decimal().unwrap();
            let rescaled = decimal.mantissa();
            assert_eq!(format!("{rescaled:08}"), original);
        }
    }

    #[test]
    fn test_numeric_overflow() {
        let id = FieldSpec::new("id", 1, 20, FieldKind::Numeric);
        let l = layout(vec![id], None);
        let err = decode_line(&l, "99999999999999999999").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidNumericField { .. }));
    }

    #[test]
    fn test_record_length_mismatch() {
        let l = layout(vec![FieldSpec::new("a", 1, 5, FieldKind::Text)], Some(42));
        let line = "x".repeat(41);
        assert_eq!(
            decode_line(&l, &line).unwrap_err(),
            DecodeError::RecordLengthMismatch {
                expected: 42,
                actual: 41
            }
        );
    }

    #[test]
    fn test_field_out_of_range_never_truncates() {
        let l = layout(vec![FieldSpec::new("tail", 4, 5, FieldKind::Text)], None);
        let err = decode_line(&l, "ABCDEFG").unwrap_err();
        assert_eq!(
            err,
            DecodeError::FieldOutOfRange {
                field: "tail".to_string(),
                start_pos: 4,
                length: 5,
                line_length: 7,
            }
        );
    }

    #[test]
    fn test_atomic_failure() {
        let l = layout(
            vec![
                FieldSpec::new("ok", 1, 2, FieldKind::Numeric),
                FieldSpec::new("bad", 3, 2, FieldKind::Numeric),
            ],
            None,
        );
        assert!(decode_line(&l, "12XY").is_err());
    }

    #[test]
    fn test_output_follows_layout_order() {
        let l = layout(
            vec![
                FieldSpec::new("zeta", 3, 2, FieldKind::Text),
                FieldSpec::new("alpha", 1, 2, FieldKind::Text),
            ],
            Some(4),
        );
        let record = decode_line(&l, "ABCD").unwrap();
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let l = layout(vec![balance()], Some(10));
        let first = decode_line(&l, "000015075-").unwrap();
        for _ in 0..10 {
            assert_eq!(decode_line(&l, "000015075-").unwrap(), first);
        }
    }
}
