//! # Rune Streams
//!
//! Incremental character decoding and tab expansion over byte readers.
//! `Runes` turns any `Read` into a stream of `char`s (invalid UTF-8
//! becomes U+FFFD); `TabExpander` rewrites tabs into the spaces needed to
//! reach the next multiple of eight columns, lazily, without ever
//! materialising an expanded string.

use std::io::{self, Read};

use unicode_width::UnicodeWidthChar;

/// Columns per tab stop.
const TAB_WIDTH: i32 = 8;

/// A pull-based stream of characters.
pub trait RuneSource {
    /// Next character, or `None` at end of input.
    fn read_rune(&mut self) -> io::Result<Option<char>>;
}

/// Incremental UTF-8 decoder over any byte reader. Invalid or truncated
/// sequences decode to U+FFFD one byte at a time, matching lossy string
/// conversion.
pub struct Runes<R: Read> {
    inner: R,
    pending: [u8; 4],
    len: usize,
}

impl<R: Read> Runes<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: [0; 4],
            len: 0,
        }
    }

    /// Pull one more byte into the staging buffer; false at EOF.
    fn fill_one(&mut self) -> io::Result<bool> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(false),
                Ok(_) => {
                    self.pending[self.len] = byte[0];
                    self.len += 1;
                    return Ok(true);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn shift(&mut self, consumed: usize) {
        self.pending.copy_within(consumed..self.len, 0);
        self.len -= consumed;
    }
}

/// Expected sequence length from a UTF-8 lead byte.
fn sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7f => Some(1),
        0xc0..=0xdf => Some(2),
        0xe0..=0xef => Some(3),
        0xf0..=0xf7 => Some(4),
        _ => None,
    }
}

impl<R: Read> RuneSource for Runes<R> {
    fn read_rune(&mut self) -> io::Result<Option<char>> {
        if self.len == 0 && !self.fill_one()? {
            return Ok(None);
        }

        let Some(need) = sequence_len(self.pending[0]) else {
            self.shift(1);
            return Ok(Some(char::REPLACEMENT_CHARACTER));
        };
        while self.len < need {
            if !self.fill_one()? {
                break;
            }
        }

        if self.len >= need {
            if let Ok(decoded) = std::str::from_utf8(&self.pending[..need]) {
                if let Some(ch) = decoded.chars().next() {
                    self.shift(need);
                    return Ok(Some(ch));
                }
            }
        }
        self.shift(1);
        Ok(Some(char::REPLACEMENT_CHARACTER))
    }
}

/// Lazy tab-to-space rewriter. Tracks the display column modulo the tab
/// width; a tab turns the column negative by the number of spaces still
/// owed, and those spaces are emitted one per call before decoding
/// continues. Newlines and carriage returns reset the column.
pub struct TabExpander<S: RuneSource> {
    src: S,
    x: i32,
}

impl<S: RuneSource> TabExpander<S> {
    pub fn new(src: S) -> Self {
        Self { src, x: 0 }
    }
}

impl<S: RuneSource> RuneSource for TabExpander<S> {
    fn read_rune(&mut self) -> io::Result<Option<char>> {
        loop {
            if self.x < 0 {
                self.x += 1;
                return Ok(Some(' '));
            }

            let Some(ch) = self.src.read_rune()? else {
                return Ok(None);
            };
            match ch {
                '\n' | '\r' => {
                    self.x = 0;
                    return Ok(Some(ch));
                }
                '\t' => {
                    self.x -= TAB_WIDTH;
                    // Loop: the owed spaces drain on subsequent calls.
                }
                _ => {
                    let w = UnicodeWidthChar::width(ch).unwrap_or(0) as i32;
                    self.x = (self.x + w) % TAB_WIDTH;
                    return Ok(Some(ch));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn expand(input: &str) -> String {
        let mut src = TabExpander::new(Runes::new(Cursor::new(input.as_bytes().to_vec())));
        let mut out = String::new();
        while let Some(ch) = src.read_rune().unwrap() {
            out.push(ch);
        }
        out
    }

    fn decode(bytes: &[u8]) -> String {
        let mut src = Runes::new(Cursor::new(bytes.to_vec()));
        let mut out = String::new();
        while let Some(ch) = src.read_rune().unwrap() {
            out.push(ch);
        }
        out
    }

    #[test]
    fn runes_decode_multibyte_sequences() {
        assert_eq!(decode("a☃吃😀".as_bytes()), "a☃吃😀");
    }

    #[test]
    fn runes_replace_invalid_bytes() {
        assert_eq!(decode(b"a\xffb"), "a\u{fffd}b");
        // Truncated trailing sequence.
        assert_eq!(decode(b"ok\xe5\x90"), "ok\u{fffd}\u{fffd}");
    }

    #[test]
    fn tab_free_input_passes_through() {
        for input in ["abc", "abc\ndef", "abc\ndef\n", "吃饭\n喝茶"] {
            assert_eq!(expand(input), input);
        }
    }

    #[test]
    fn tabs_advance_to_next_multiple_of_eight() {
        let cases = [
            ("\ta\tb\n\tc", "        a       b\n        c"),
            ("\t\ta\tb", "                a       b"),
            ("1234567\tC", "1234567 C"),
            ("12345678\tX", "12345678        X"),
        ];
        for (input, want) in cases {
            assert_eq!(expand(input), want, "input {input:?}");
        }
    }

    #[test]
    fn wide_runes_count_two_columns_before_a_tab() {
        // 喝 occupies columns 0-1, so the tab owes six spaces.
        assert_eq!(expand("喝\tD"), "喝      D");
    }

    #[test]
    fn carriage_return_resets_the_column() {
        assert_eq!(expand("12345\r\ta"), "12345\r        a");
    }
}
