//! Column access on a single fixed-width line.
//!
//! Columns are counted in characters and numbered from 1, so a field at
//! `start_pos = 6, length = 25` covers characters 6 through 30.

/// A borrowed line of fixed-width text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    text: &'a str,
    char_len: usize,
    ascii: bool,
}

impl<'a> RawRecord<'a> {
    pub fn new(text: &'a str) -> Self {
        let ascii = text.is_ascii();
        let char_len = if ascii {
            text.len()
        } else {
            text.chars().count()
        };
        Self {
            text,
            char_len,
            ascii,
        }
    }

    /// Width of the line in characters.
    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    /// Extract `length` characters starting at 1-based column `start_pos`.
    ///
    /// Returns `None` when the range does not fit inside the line; the
    /// field is never truncated.
    pub fn field(&self, start_pos: usize, length: usize) -> Option<&'a str> {
        if start_pos == 0 {
            return None;
        }
        let start = start_pos - 1;
        let end = start.checked_add(length)?;
        if end > self.char_len {
            return None;
        }

        if self.ascii {
            return Some(&self.text[start..end]);
        }

        let from = self.byte_offset(start)?;
        let to = self.byte_offset(end)?;
        Some(&self.text[from..to])
    }

    /// Byte offset of the character at `index`; `index == len()` maps to
    /// the end of the text.
    fn byte_offset(&self, index: usize) -> Option<usize> {
        if index == self.char_len {
            return Some(self.text.len());
        }
        self.text.char_indices().nth(index).map(|(offset, _)| offset)
    }
}
