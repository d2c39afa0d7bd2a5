//! Rope-backed text buffer.
//!
//! All offsets are character offsets (Unicode scalar values). Mutations validate their bounds
//! before touching the rope, so a rejected call leaves the buffer unchanged.

use crate::error::EditError;
use ropey::Rope;
use ropey::iter::Chars;

/// The document text.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
}

impl TextBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Build a buffer from text.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Number of characters.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns `true` if the buffer holds no text.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// The character at `offset`, if any.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.rope.get_char(offset)
    }

    /// Iterate characters starting at `offset` (clamped to the end).
    pub fn chars_at(&self, offset: usize) -> Chars<'_> {
        self.rope.chars_at(offset.min(self.rope.len_chars()))
    }

    /// The whole text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Copy `length` characters starting at `offset`.
    pub fn slice(&self, offset: usize, length: usize) -> Result<String, EditError> {
        self.check("slice", offset, length)?;
        Ok(self.rope.slice(offset..offset + length).to_string())
    }

    /// Returns `true` if `needle` occurs inside `offset..end` (clamped).
    pub fn range_contains(&self, offset: usize, end: usize, needle: &str) -> bool {
        let end = end.min(self.len_chars());
        let start = offset.min(end);
        self.rope.slice(start..end).to_string().contains(needle)
    }

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<(), EditError> {
        self.check("insert", offset, 0)?;
        self.rope.insert(offset, text);
        Ok(())
    }

    /// Remove `length` characters at `offset`, returning the removed text.
    pub fn remove(&mut self, offset: usize, length: usize) -> Result<String, EditError> {
        self.check("remove", offset, length)?;
        let removed = self.rope.slice(offset..offset + length).to_string();
        self.rope.remove(offset..offset + length);
        Ok(removed)
    }

    /// Replace the whole text.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    /// Number of `\n`-separated lines (an empty buffer has one).
    pub fn line_count(&self) -> usize {
        self.rope.chars().filter(|&c| c == '\n').count() + 1
    }

    /// Offset of the first character of the 1-based `line`, if the line exists.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        if line == 0 {
            return None;
        }
        if line == 1 {
            return Some(0);
        }
        let mut current = 1;
        for (i, c) in self.rope.chars().enumerate() {
            if c == '\n' {
                current += 1;
                if current == line {
                    return Some(i + 1);
                }
            }
        }
        None
    }

    /// The 1-based line number containing `offset` (clamped to the end).
    pub fn line_of(&self, offset: usize) -> usize {
        let offset = offset.min(self.len_chars());
        self.rope.slice(..offset).chars().filter(|&c| c == '\n').count() + 1
    }

    /// Offset of the first character of the line containing `offset`.
    pub fn line_start_of(&self, offset: usize) -> usize {
        let mut i = offset.min(self.len_chars());
        let mut chars = self.chars_at(i);
        while let Some(c) = chars.prev() {
            if c == '\n' {
                break;
            }
            i -= 1;
        }
        i
    }

    /// Offset of the `\n` ending the line containing `offset`, or the buffer length.
    pub fn line_end_of(&self, offset: usize) -> usize {
        let mut i = offset.min(self.len_chars());
        for c in self.chars_at(i) {
            if c == '\n' {
                return i;
            }
            i += 1;
        }
        i
    }

    /// The text between the start of the line containing `offset` and `offset`.
    pub fn line_prefix(&self, offset: usize) -> String {
        let offset = offset.min(self.len_chars());
        let start = self.line_start_of(offset);
        self.rope.slice(start..offset).to_string()
    }

    /// 0-based display column of `offset`, with tab stops every `tab_width` columns.
    pub fn display_column(&self, offset: usize, tab_width: usize) -> usize {
        let offset = offset.min(self.len_chars());
        let tab_width = tab_width.max(1);
        let start = self.line_start_of(offset);
        self.chars_at(start)
            .take(offset - start)
            .fold(0, |column, c| match c {
                '\t' => (column / tab_width + 1) * tab_width,
                _ => column + 1,
            })
    }

    fn check(&self, operation: &'static str, offset: usize, length: usize) -> Result<(), EditError> {
        let buffer_len = self.len_chars();
        match offset.checked_add(length) {
            Some(end) if end <= buffer_len => Ok(()),
            _ => Err(EditError::OutOfBounds {
                operation,
                offset,
                length,
                buffer_len,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let mut buf = TextBuffer::from_text("hello world");
        buf.insert(5, ",").unwrap();
        assert_eq!(buf.text(), "hello, world");
        assert_eq!(buf.remove(0, 7).unwrap(), "hello, ");
        assert_eq!(buf.text(), "world");
    }

    #[test]
    fn test_out_of_bounds_leaves_buffer_untouched() {
        let mut buf = TextBuffer::from_text("abc");
        let err = buf.remove(2, 5).unwrap_err();
        assert_eq!(
            err,
            EditError::OutOfBounds {
                operation: "remove",
                offset: 2,
                length: 5,
                buffer_len: 3,
            }
        );
        assert!(buf.insert(4, "x").is_err());
        assert_eq!(buf.text(), "abc");
    }

    #[test]
    fn test_line_lookup() {
        let buf = TextBuffer::from_text("one\ntwo\n\nfour");
        assert_eq!(buf.line_count(), 4);
        assert_eq!(buf.line_start(1), Some(0));
        assert_eq!(buf.line_start(2), Some(4));
        assert_eq!(buf.line_start(4), Some(9));
        assert_eq!(buf.line_start(5), None);
        assert_eq!(buf.line_start(0), None);
        assert_eq!(buf.line_start_of(6), 4);
        assert_eq!(buf.line_end_of(5), 7);
        assert_eq!(buf.line_end_of(10), 13);
        assert_eq!(buf.line_prefix(6), "tw");
        assert_eq!(buf.line_of(0), 1);
        assert_eq!(buf.line_of(4), 2);
        assert_eq!(buf.line_of(3), 1);
        assert_eq!(buf.line_of(100), 4);
    }

    #[test]
    fn test_display_column_expands_tabs() {
        let buf = TextBuffer::from_text("\tab\tc\nx\ty");
        assert_eq!(buf.display_column(0, 8), 0);
        assert_eq!(buf.display_column(1, 8), 8);
        assert_eq!(buf.display_column(3, 8), 10);
        assert_eq!(buf.display_column(4, 8), 16);
        assert_eq!(buf.display_column(4, 4), 8);
        assert_eq!(buf.display_column(9, 4), 5);
        // A zero width is treated as one.
        assert_eq!(buf.display_column(1, 0), 1);
    }

    #[test]
    fn test_multibyte_offsets_are_chars() {
        let mut buf = TextBuffer::from_text("héllo");
        assert_eq!(buf.char_at(1), Some('é'));
        buf.remove(1, 1).unwrap();
        assert_eq!(buf.text(), "hllo");
    }
}
