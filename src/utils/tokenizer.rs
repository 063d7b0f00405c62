use crate::utils::encoding::TextMode;

/// Path separator set for the platform a candidate list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSyntax {
    separators: &'static [u8],
}

impl PathSyntax {
    pub const UNIX: PathSyntax = PathSyntax { separators: b"/" };
    /// Windows accepts both separators since tools mix them freely
    pub const WINDOWS: PathSyntax = PathSyntax { separators: b"\\/" };

    /// Separator set for the platform this binary was built for
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::WINDOWS
        } else {
            Self::UNIX
        }
    }

    #[inline]
    pub fn is_separator_byte(&self, byte: u8) -> bool {
        self.separators.contains(&byte)
    }

    #[inline]
    pub fn is_separator(&self, ch: char) -> bool {
        ch.is_ascii() && self.is_separator_byte(ch as u8)
    }
}

impl Default for PathSyntax {
    fn default() -> Self {
        Self::native()
    }
}

/// Byte range into a string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    #[inline]
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// The text this span covers. Spans produced by this module always lie on
    /// char boundaries, so slicing cannot panic for them.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.start..self.end).unwrap_or("")
    }

    /// Same span moved right by `by` bytes
    pub fn shifted(self, by: usize) -> Span {
        Span::new(self.start + by, self.end + by)
    }
}

/// Components of a path, as byte spans into the tokenized string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTokens {
    components: Vec<Span>,
}

impl PathTokens {
    /// All non-empty components in order
    pub fn components(&self) -> &[Span] {
        &self.components
    }

    /// Components before the filename
    pub fn directories(&self) -> &[Span] {
        match self.components.split_last() {
            Some((_, dirs)) => dirs,
            None => &[],
        }
    }

    /// The last non-empty component. A trailing separator is skipped, so
    /// `a/b/` has filename `b`.
    pub fn filename(&self) -> Option<Span> {
        self.components.last().copied()
    }
}

/// Split `path` into its components.
///
/// Empty components (leading, trailing or doubled separators) are dropped.
/// Separators are ASCII, so splitting on bytes keeps every span on a char
/// boundary.
pub fn tokenize_path(path: &str, syntax: PathSyntax) -> PathTokens {
    let bytes = path.as_bytes();
    let mut components = Vec::with_capacity(bytes.len() / 8 + 1);
    let mut start = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        if syntax.is_separator_byte(byte) {
            if i > start {
                components.push(Span::new(start, i));
            }
            start = i + 1;
        }
    }
    if start < bytes.len() {
        components.push(Span::new(start, bytes.len()));
    }

    PathTokens { components }
}

/// Steps between two directory chains: everything after their common prefix.
///
/// Files in the same directory are at distance 0, a file in a sibling
/// directory is at distance 2.
pub fn directory_distance<'a, 'b, A, B>(a: A, b: B) -> usize
where
    A: IntoIterator<Item = &'a str>,
    B: IntoIterator<Item = &'b str>,
{
    let mut a = a.into_iter();
    let mut b = b.into_iter();
    loop {
        match (a.next(), b.next()) {
            (Some(x), Some(y)) if x == y => continue,
            (x, y) => {
                return usize::from(x.is_some()) + a.count() + usize::from(y.is_some()) + b.count();
            }
        }
    }
}

/// Character class used for boundary detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Upper,
    Lower,
    Digit,
    /// Path separator (only in path-aware matching)
    Separator,
    /// Anything else: `_`, `-`, `.`, spaces, symbols
    Punct,
}

impl CharClass {
    #[inline]
    pub fn is_word(self) -> bool {
        matches!(self, CharClass::Upper | CharClass::Lower | CharClass::Digit)
    }
}

/// Classify a character. Separators are only recognized when `syntax` is set;
/// in non-path matching they are ordinary punctuation.
#[inline]
pub fn classify_char(ch: char, mode: TextMode, syntax: Option<PathSyntax>) -> CharClass {
    if syntax.is_some_and(|s| s.is_separator(ch)) {
        CharClass::Separator
    } else if mode.is_uppercase(ch) {
        CharClass::Upper
    } else if mode.is_digit(ch) {
        CharClass::Digit
    } else if mode.is_lowercase(ch) || mode.is_alphanumeric(ch) {
        // Letters without case (CJK etc.) behave like lowercase
        CharClass::Lower
    } else {
        CharClass::Punct
    }
}

/// Kind of boundary a character sits on, ordered by strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Boundary {
    None,
    /// `fooBar` at `B`, or the first digit after letters
    CamelHump,
    /// After punctuation such as `_`, `-` or `.`
    Word,
    /// First character of the key or after a path separator
    Component,
}

/// Boundary kind of `cur` given the class of the character before it
#[inline]
pub fn boundary(prev: Option<CharClass>, cur: CharClass) -> Boundary {
    use CharClass::*;

    if !cur.is_word() {
        return Boundary::None;
    }
    match prev {
        None | Some(Separator) => Boundary::Component,
        Some(Punct) => Boundary::Word,
        Some(Lower) if cur == Upper => Boundary::CamelHump,
        Some(Lower | Upper) if cur == Digit => Boundary::CamelHump,
        Some(Digit) if cur != Digit => Boundary::CamelHump,
        _ => Boundary::None,
    }
}
