//! Text decoding for matching.
//!
//! Matching operates on units: raw bytes when Unicode mode is off, `char`s
//! when it is on. Every unit remembers the byte offset of its first byte in the
//! source string, so matched positions are always reported as byte offsets no
//! matter which mode produced them.

/// One decoded unit of a string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    /// The unit as written (a byte is widened to the `char` with the same value)
    pub ch: char,
    /// The unit after case folding
    pub folded: char,
    /// Byte offset of the unit's first byte in the source string
    pub offset: usize,
    /// Length of the unit in bytes
    pub len: usize,
}

/// How strings are split into units and how units are case folded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// Byte-wise comparison with ASCII-only case folding
    #[default]
    Bytes,
    /// `char`-wise comparison with Unicode lowercase folding
    Unicode,
}

impl TextMode {
    pub fn from_unicode_flag(unicode: bool) -> Self {
        if unicode {
            TextMode::Unicode
        } else {
            TextMode::Bytes
        }
    }

    /// Fold a unit for case-insensitive comparison
    #[inline]
    pub fn fold(self, ch: char) -> char {
        match self {
            TextMode::Bytes => ch.to_ascii_lowercase(),
            TextMode::Unicode => fold_unicode(ch),
        }
    }

    #[inline]
    pub fn is_uppercase(self, ch: char) -> bool {
        match self {
            TextMode::Bytes => ch.is_ascii_uppercase(),
            TextMode::Unicode => ch.is_uppercase(),
        }
    }

    #[inline]
    pub fn is_lowercase(self, ch: char) -> bool {
        match self {
            TextMode::Bytes => ch.is_ascii_lowercase(),
            TextMode::Unicode => ch.is_lowercase(),
        }
    }

    #[inline]
    pub fn is_alphanumeric(self, ch: char) -> bool {
        match self {
            TextMode::Bytes => ch.is_ascii_alphanumeric(),
            TextMode::Unicode => ch.is_alphanumeric(),
        }
    }

    #[inline]
    pub fn is_digit(self, ch: char) -> bool {
        match self {
            TextMode::Bytes => ch.is_ascii_digit(),
            TextMode::Unicode => ch.is_numeric(),
        }
    }

    /// Decode `text` into `out`, replacing its contents.
    ///
    /// `base` is added to every unit offset, so callers decoding a slice of a
    /// larger string get offsets relative to the larger string.
    pub fn decode_into(self, text: &str, base: usize, out: &mut Vec<Unit>) {
        out.clear();
        match self {
            TextMode::Bytes => {
                out.reserve(text.len());
                for (i, &byte) in text.as_bytes().iter().enumerate() {
                    let ch = byte as char;
                    out.push(Unit {
                        ch,
                        folded: ch.to_ascii_lowercase(),
                        offset: base + i,
                        len: 1,
                    });
                }
            }
            TextMode::Unicode => {
                for (i, ch) in text.char_indices() {
                    out.push(Unit {
                        ch,
                        folded: fold_unicode(ch),
                        offset: base + i,
                        len: ch.len_utf8(),
                    });
                }
            }
        }
    }

    /// Decode `text` into a fresh vector
    pub fn decode(self, text: &str) -> Vec<Unit> {
        let mut units = Vec::new();
        self.decode_into(text, 0, &mut units);
        units
    }
}

/// Lowercase a char when its lowercase form is a single char.
///
/// Multi-char expansions (e.g. 'İ') keep the original char so that one query
/// unit always lines up with one candidate unit.
fn fold_unicode(ch: char) -> char {
    if ch.is_ascii() {
        return ch.to_ascii_lowercase();
    }
    let mut lower = ch.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(folded), None) => folded,
        _ => ch,
    }
}

/// Round `offset` down to the nearest char boundary of `text`
pub fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Round `offset` up to the nearest char boundary of `text`
pub fn ceil_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset += 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_mode_offsets() {
        let units = TextMode::Bytes.decode("aB/");
        assert_eq!(units.len(), 3);
        assert_eq!(units[1].ch, 'B');
        assert_eq!(units[1].folded, 'b');
        assert_eq!(units[2].offset, 2);
    }

    #[test]
    fn test_bytes_mode_splits_multibyte() {
        // 'é' is two bytes in UTF-8
        let units = TextMode::Bytes.decode("é");
        assert_eq!(units.len(), 2);
        assert!(units.iter().all(|u| u.len == 1));
    }

    #[test]
    fn test_unicode_mode_offsets() {
        let units = TextMode::Unicode.decode("aÉ/b");
        let offsets: Vec<usize> = units.iter().map(|u| u.offset).collect();
        assert_eq!(offsets, vec![0, 1, 3, 4]);
        assert_eq!(units[1].folded, 'é');
        assert_eq!(units[1].offset + units[1].len, 3);
    }

    #[test]
    fn test_decode_with_base() {
        let mut units = Vec::new();
        TextMode::Unicode.decode_into("xy", 10, &mut units);
        assert_eq!(units[0].offset, 10);
        assert_eq!(units[1].offset, 11);
    }

    #[test]
    fn test_fold_keeps_multichar_expansions() {
        // U+0130 lowercases to two chars
        assert_eq!(TextMode::Unicode.fold('\u{130}'), '\u{130}');
        assert_eq!(TextMode::Unicode.fold('Ж'), 'ж');
        assert_eq!(TextMode::Bytes.fold('Q'), 'q');
    }

    #[test]
    fn test_char_boundaries() {
        let text = "aéb";
        assert_eq!(floor_char_boundary(text, 2), 1);
        assert_eq!(ceil_char_boundary(text, 2), 3);
        assert_eq!(ceil_char_boundary(text, 99), text.len());
    }
}
