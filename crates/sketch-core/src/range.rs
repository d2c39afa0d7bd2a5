//! Character ranges.
//!
//! A [`Range`] is `{offset, length}` over the document's character stream. Its last index is
//! `offset + length - 1`; a zero-length range denotes a caret location and is used as a repaint
//! hint.

/// A contiguous region of the document, in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    /// First character of the range.
    pub offset: usize,
    /// Number of characters covered.
    pub length: usize,
}

impl Range {
    /// Create a range of `length` characters starting at `offset`.
    pub const fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// A zero-length range at `offset`.
    pub const fn point(offset: usize) -> Self {
        Self { offset, length: 0 }
    }

    /// The range covering `start..=last`.
    pub fn inclusive(start: usize, last: usize) -> Self {
        Self {
            offset: start,
            length: last.saturating_sub(start) + 1,
        }
    }

    /// The range covering `start..end`.
    pub fn between(start: usize, end: usize) -> Self {
        Self {
            offset: start,
            length: end.saturating_sub(start),
        }
    }

    /// Returns `true` for a caret-only range.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Index of the last covered character, or `None` for an empty range.
    pub fn last(&self) -> Option<usize> {
        (self.length > 0).then(|| self.offset + self.length - 1)
    }

    /// One past the last covered character.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// `offset <= index <= last`.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.offset && index < self.end()
    }

    /// Like [`Range::contains`] but excluding the last index, i.e. the span's closer.
    pub fn contains_ignore_end(&self, index: usize) -> bool {
        index >= self.offset && index + 1 < self.end()
    }

    /// Full containment of `other`. An empty `other` is contained when its offset is.
    pub fn contains_range(&self, other: &Range) -> bool {
        match other.last() {
            Some(last) => self.contains(other.offset) && self.contains(last),
            None => self.contains(other.offset),
        }
    }

    /// Returns `true` if the two ranges share at least one index.
    ///
    /// An empty range behaves as the single index at its offset.
    pub fn overlaps(&self, other: &Range) -> bool {
        let (a_start, a_end) = self.point_bounds();
        let (b_start, b_end) = other.point_bounds();
        a_start < b_end && b_start < a_end
    }

    /// The same range moved by `delta` characters, saturating at zero.
    pub fn shifted(&self, delta: isize) -> Self {
        Self {
            offset: self.offset.saturating_add_signed(delta),
            length: self.length,
        }
    }

    /// The smallest range covering both.
    pub fn union(&self, other: &Range) -> Self {
        let start = self.offset.min(other.offset);
        let end = self.end().max(other.end());
        Self::between(start, end)
    }

    /// The indices covered by both, or an empty range at the later offset.
    pub fn intersection(&self, other: &Range) -> Self {
        let start = self.offset.max(other.offset);
        Self::between(start, self.end().min(other.end()))
    }

    /// Clip to `0..len`.
    pub fn clamp_to(&self, len: usize) -> Self {
        let start = self.offset.min(len);
        Self::between(start, self.end().min(len))
    }

    fn point_bounds(&self) -> (usize, usize) {
        (self.offset, self.end().max(self.offset + 1))
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::between(r.start, r.end)
    }
}
