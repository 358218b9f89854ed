//! Trailing sign conventions for `PIC S9` fields.
//!
//! The last character of a signed field is read as one of:
//!
//! | Character       | Meaning                         |
//! |-----------------|---------------------------------|
//! | `0`-`9`         | no sign; value is non-negative  |
//! | `+` / `-`       | explicit sign in its own column |
//! | `{` `A`-`I`     | overpunch: positive 0-9         |
//! | `}` `J`-`R`     | overpunch: negative 0-9         |
//!
//! Any other character is unrecognized and rejected by the decoder.

/// Classification of the last character of a signed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trailing {
    /// A plain digit; the field carries no sign.
    Digit(u8),
    /// An explicit `+` or `-` occupying the column.
    Explicit { negative: bool },
    /// A digit with the sign punched over it.
    Overpunch { digit: u8, negative: bool },
    /// Not a digit or recognized sign.
    Unrecognized,
}

impl Trailing {
    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            Trailing::Explicit { negative: true } | Trailing::Overpunch { negative: true, .. }
        )
    }
}

pub fn classify(c: char) -> Trailing {
    match c {
        '0'..='9' => Trailing::Digit(c as u8 - b'0'),
        '+' => Trailing::Explicit { negative: false },
        '-' => Trailing::Explicit { negative: true },
        '{' => Trailing::Overpunch {
            digit: 0,
            negative: false,
        },
        'A'..='I' => Trailing::Overpunch {
            digit: c as u8 - b'A' + 1,
            negative: false,
        },
        '}' => Trailing::Overpunch {
            digit: 0,
            negative: true,
        },
        'J'..='R' => Trailing::Overpunch {
            digit: c as u8 - b'J' + 1,
            negative: true,
        },
        _ => Trailing::Unrecognized,
    }
}
