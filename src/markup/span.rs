//! Byte spans into the original text.

/// Half-open byte range `start..end` into the text an element was parsed from.
///
/// Spans always fall on UTF-8 boundaries: the scanner only cuts at ASCII
/// delimiters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must be <= end");
        Self { start, end }
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}
