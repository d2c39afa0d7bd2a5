//! Undo/redo history with keystroke coalescing.
//!
//! Edits are recorded as [`EditRecord`]s on an undo stack. While a record is *open*, adjacent
//! edits of the same kind extend it (typing a word is one undo step); [`EditLog::crack`] closes
//! it so the next edit starts a fresh record. Recording any edit discards the redo stack.
//!
//! The log never touches the document directly: [`EditLog::undo`] and [`EditLog::redo`] apply
//! records through an [`EditTarget`].

use crate::error::EditError;

/// What undo/redo needs from the document owner.
pub trait EditTarget {
    /// Copy `length` characters at `offset`.
    fn slice(&self, offset: usize, length: usize) -> Result<String, EditError>;
    /// Insert `text` at `offset`.
    fn insert(&mut self, offset: usize, text: &str) -> Result<(), EditError>;
    /// Remove `length` characters at `offset`.
    fn remove(&mut self, offset: usize, length: usize) -> Result<(), EditError>;
    /// Current caret offset.
    fn caret(&self) -> usize;
    /// Move the caret.
    fn set_caret(&mut self, caret: usize);
}

/// One logical, reversible edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditRecord {
    /// `text` was inserted at `offset`.
    Add {
        /// Inserted text.
        text: String,
        /// Insertion point.
        offset: usize,
        /// Caret after redo, if not the end of `text`.
        caret: Option<usize>,
    },
    /// `text` was removed from `offset`.
    Remove {
        /// Removed text.
        text: String,
        /// Start of the removed text.
        offset: usize,
        /// Removed by backspace (the caret sat after the text).
        backward: bool,
    },
    /// `old` at `offset` was replaced by `new`.
    Replace {
        /// Replaced text.
        old: String,
        /// Replacement text.
        new: String,
        /// Start of the replacement.
        offset: usize,
        /// Caret after redo, if not the end of `new`.
        caret: Option<usize>,
    },
    /// Every `olds[i]` at `offsets[i]` (ascending, in the text before the replacement) was
    /// replaced by `new`.
    ReplaceAll {
        /// Match offsets before the replacement.
        offsets: Vec<usize>,
        /// The matched texts.
        olds: Vec<String>,
        /// Replacement text.
        new: String,
    },
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn expect_text(
    target: &dyn EditTarget,
    operation: &'static str,
    offset: usize,
    expected: &str,
) -> Result<(), EditError> {
    let found = target.slice(offset, char_len(expected))?;
    if found == expected {
        Ok(())
    } else {
        Err(EditError::TextMismatch {
            operation,
            offset,
            expected: expected.to_string(),
            found,
        })
    }
}

// Caret after one `old_len` -> `new_len` replacement at `offset`.
pub(crate) fn map_caret(caret: usize, offset: usize, old_len: usize, new_len: usize) -> usize {
    if caret >= offset + old_len {
        caret - old_len + new_len
    } else if caret > offset {
        offset + new_len
    } else {
        caret
    }
}

impl EditRecord {
    fn revert(&self, target: &mut dyn EditTarget) -> Result<(), EditError> {
        match self {
            EditRecord::Add { text, offset, .. } => {
                expect_text(target, "undo", *offset, text)?;
                target.remove(*offset, char_len(text))?;
                target.set_caret(*offset);
            }
            EditRecord::Remove {
                text,
                offset,
                backward,
            } => {
                target.insert(*offset, text)?;
                let caret = if *backward {
                    offset + char_len(text)
                } else {
                    *offset
                };
                target.set_caret(caret);
            }
            EditRecord::Replace {
                old, new, offset, ..
            } => {
                expect_text(target, "undo", *offset, new)?;
                target.remove(*offset, char_len(new))?;
                target.insert(*offset, old)?;
                target.set_caret(offset + char_len(old));
            }
            EditRecord::ReplaceAll { offsets, olds, new } => {
                let new_len = char_len(new);
                // Check every occurrence before touching anything.
                let mut shift = 0isize;
                for (offset, old) in offsets.iter().zip(olds) {
                    let at = offset.saturating_add_signed(shift);
                    expect_text(target, "undo", at, new)?;
                    shift += new_len as isize - char_len(old) as isize;
                }

                // Forward: everything before `offsets[i]` is already restored.
                let mut caret = target.caret();
                for (&offset, old) in offsets.iter().zip(olds) {
                    target.remove(offset, new_len)?;
                    target.insert(offset, old)?;
                    caret = map_caret(caret, offset, new_len, char_len(old));
                }
                target.set_caret(caret);
            }
        }
        Ok(())
    }

    fn apply(&self, target: &mut dyn EditTarget) -> Result<(), EditError> {
        match self {
            EditRecord::Add {
                text,
                offset,
                caret,
            } => {
                target.insert(*offset, text)?;
                target.set_caret(caret.unwrap_or(offset + char_len(text)));
            }
            EditRecord::Remove { text, offset, .. } => {
                expect_text(target, "redo", *offset, text)?;
                target.remove(*offset, char_len(text))?;
                target.set_caret(*offset);
            }
            EditRecord::Replace {
                old,
                new,
                offset,
                caret,
            } => {
                expect_text(target, "redo", *offset, old)?;
                target.remove(*offset, char_len(old))?;
                target.insert(*offset, new)?;
                target.set_caret(caret.unwrap_or(offset + char_len(new)));
            }
            EditRecord::ReplaceAll { offsets, olds, new } => {
                for (&offset, old) in offsets.iter().zip(olds) {
                    expect_text(target, "redo", offset, old)?;
                }

                // Backward: nothing before `offsets[i]` has moved yet.
                let new_len = char_len(new);
                let mut caret = target.caret();
                for (&offset, old) in offsets.iter().zip(olds).rev() {
                    let old_len = char_len(old);
                    target.remove(offset, old_len)?;
                    target.insert(offset, new)?;
                    caret = map_caret(caret, offset, old_len, new_len);
                }
                target.set_caret(caret);
            }
        }
        Ok(())
    }
}

/// The undo/redo history of one document.
#[derive(Debug, Default)]
pub struct EditLog {
    undo_stack: Vec<EditRecord>,
    redo_stack: Vec<EditRecord>,
    /// Whether the top of `undo_stack` may still be extended.
    open: bool,
    /// `undo_stack.len()` at the last save. `None` once that point is unreachable.
    clean_index: Option<usize>,
}

impl EditLog {
    /// An empty log whose initial state is clean.
    pub fn new() -> Self {
        Self {
            clean_index: Some(0),
            ..Self::default()
        }
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undoable records.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redoable records.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Returns `true` while the newest record may still absorb edits.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The undoable records, oldest first.
    pub fn records(&self) -> &[EditRecord] {
        &self.undo_stack
    }

    /// Returns `true` if the history sits at the last [`EditLog::mark_clean`] point.
    pub fn is_clean(&self) -> bool {
        self.clean_index == Some(self.undo_stack.len())
    }

    /// Remember the current point as saved.
    pub fn mark_clean(&mut self) {
        self.clean_index = Some(self.undo_stack.len());
        self.crack();
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Close the open record.
    pub fn crack(&mut self) {
        self.open = false;
    }

    /// Record an insertion of `text` at `offset`.
    ///
    /// Extends the open `Add` or `Replace` when `offset` is where its inserted text ends.
    pub fn add(&mut self, text: &str, offset: usize, caret: Option<usize>) {
        if text.is_empty() {
            return;
        }
        self.truncate_redo();

        if self.open && self.clean_index != Some(self.undo_stack.len()) {
            match self.undo_stack.last_mut() {
                Some(EditRecord::Add {
                    text: open_text,
                    offset: open_offset,
                    caret: open_caret,
                }) if *open_offset + char_len(open_text) == offset => {
                    open_text.push_str(text);
                    *open_caret = caret;
                    return;
                }
                Some(EditRecord::Replace {
                    new,
                    offset: open_offset,
                    caret: open_caret,
                    ..
                }) if *open_offset + char_len(new) == offset => {
                    new.push_str(text);
                    *open_caret = caret;
                    return;
                }
                _ => {}
            }
        }

        self.push(
            EditRecord::Add {
                text: text.to_string(),
                offset,
                caret,
            },
            true,
        );
    }

    /// Record a removal of `text` from `offset`.
    ///
    /// A backward removal (backspace) extends the open backward `Remove` it ends at, prepending;
    /// a forward removal (delete) extends the open forward `Remove` at the same offset,
    /// appending.
    pub fn remove(&mut self, text: &str, offset: usize, backward: bool) {
        if text.is_empty() {
            return;
        }
        self.truncate_redo();

        if self.open
            && self.clean_index != Some(self.undo_stack.len())
            && let Some(EditRecord::Remove {
                text: open_text,
                offset: open_offset,
                backward: open_backward,
            }) = self.undo_stack.last_mut()
            && *open_backward == backward
        {
            if backward && offset + char_len(text) == *open_offset {
                open_text.insert_str(0, text);
                *open_offset = offset;
                return;
            }
            if !backward && offset == *open_offset {
                open_text.push_str(text);
                return;
            }
        }

        self.push(
            EditRecord::Remove {
                text: text.to_string(),
                offset,
                backward,
            },
            true,
        );
    }

    /// Record a replacement as its own record. Following insertions may extend it.
    pub fn replace(&mut self, old: &str, new: &str, offset: usize, caret: Option<usize>) {
        if old.is_empty() && new.is_empty() {
            return;
        }
        self.truncate_redo();
        self.crack();
        self.push(
            EditRecord::Replace {
                old: old.to_string(),
                new: new.to_string(),
                offset,
                caret,
            },
            true,
        );
    }

    /// Record a bulk replacement as one closed record.
    pub fn replace_all(&mut self, offsets: Vec<usize>, olds: Vec<String>, new: &str) {
        if offsets.is_empty() {
            return;
        }
        self.truncate_redo();
        self.crack();
        self.push(
            EditRecord::ReplaceAll {
                offsets,
                olds,
                new: new.to_string(),
            },
            false,
        );
    }

    /// Revert the newest record. `Ok(false)` when there is nothing to undo.
    ///
    /// On error the history is left as it was.
    pub fn undo(&mut self, target: &mut dyn EditTarget) -> Result<bool, EditError> {
        let Some(record) = self.undo_stack.last() else {
            return Ok(false);
        };
        record.revert(target)?;

        tracing::debug!(depth = self.undo_stack.len(), "undo");
        if let Some(record) = self.undo_stack.pop() {
            self.redo_stack.push(record);
        }
        self.open = false;
        Ok(true)
    }

    /// Re-apply the most recently undone record. `Ok(false)` when there is nothing to redo.
    ///
    /// On error the history is left as it was.
    pub fn redo(&mut self, target: &mut dyn EditTarget) -> Result<bool, EditError> {
        let Some(record) = self.redo_stack.last() else {
            return Ok(false);
        };
        record.apply(target)?;

        tracing::debug!(depth = self.redo_stack.len(), "redo");
        if let Some(record) = self.redo_stack.pop() {
            self.undo_stack.push(record);
        }
        self.open = false;
        Ok(true)
    }

    fn push(&mut self, record: EditRecord, open: bool) {
        self.undo_stack.push(record);
        self.open = open;
    }

    fn truncate_redo(&mut self) {
        if self.redo_stack.is_empty() {
            return;
        }

        // A clean point in the redo area becomes unreachable.
        if let Some(clean_index) = self.clean_index
            && clean_index > self.undo_stack.len()
        {
            self.clean_index = None;
        }
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;
    use pretty_assertions::assert_eq;

    struct Doc {
        buffer: TextBuffer,
        caret: usize,
    }

    impl Doc {
        fn new(text: &str) -> Self {
            Self {
                buffer: TextBuffer::from_text(text),
                caret: 0,
            }
        }
    }

    impl EditTarget for Doc {
        fn slice(&self, offset: usize, length: usize) -> Result<String, EditError> {
            self.buffer.slice(offset, length)
        }

        fn insert(&mut self, offset: usize, text: &str) -> Result<(), EditError> {
            self.buffer.insert(offset, text)
        }

        fn remove(&mut self, offset: usize, length: usize) -> Result<(), EditError> {
            self.buffer.remove(offset, length).map(|_| ())
        }

        fn caret(&self) -> usize {
            self.caret
        }

        fn set_caret(&mut self, caret: usize) {
            self.caret = caret;
        }
    }

    #[test]
    fn test_adjacent_adds_coalesce() {
        let mut log = EditLog::new();
        log.add("a", 0, None);
        log.add("b", 1, None);
        log.add("c", 2, None);
        assert_eq!(log.undo_depth(), 1);

        // Not adjacent: new record.
        log.add("x", 0, None);
        assert_eq!(log.undo_depth(), 2);

        log.crack();
        log.add("y", 1, None);
        assert_eq!(log.undo_depth(), 3);
    }

    #[test]
    fn test_backspace_and_delete_coalesce() {
        let mut log = EditLog::new();
        // "abcd", caret at 4, backspace twice.
        log.remove("d", 3, true);
        log.remove("c", 2, true);
        assert_eq!(
            log.records(),
            &[EditRecord::Remove {
                text: "cd".to_string(),
                offset: 2,
                backward: true,
            }]
        );

        log.crack();
        // Delete twice at offset 0.
        log.remove("a", 0, false);
        log.remove("b", 0, false);
        assert_eq!(log.undo_depth(), 2);
        assert_eq!(
            log.records()[1],
            EditRecord::Remove {
                text: "ab".to_string(),
                offset: 0,
                backward: false,
            }
        );
    }

    #[test]
    fn test_replace_then_typing_extends_it() {
        let mut log = EditLog::new();
        log.add("a", 0, None);
        log.replace("old", "n", 5, None);
        log.add("e", 6, None);
        log.add("w", 7, None);
        assert_eq!(log.undo_depth(), 2);
        assert_eq!(
            log.records()[1],
            EditRecord::Replace {
                old: "old".to_string(),
                new: "new".to_string(),
                offset: 5,
                caret: None,
            }
        );
    }

    #[test]
    fn test_undo_redo_restore_text_and_caret() {
        let mut doc = Doc::new("");
        let mut log = EditLog::new();

        doc.insert(0, "hello").unwrap();
        log.add("hello", 0, None);
        log.crack();
        doc.remove(1, 3).unwrap();
        log.remove("ell", 1, false);
        doc.set_caret(1);

        assert!(log.undo(&mut doc).unwrap());
        assert_eq!(doc.buffer.text(), "hello");
        assert_eq!(doc.caret, 1);

        assert!(log.undo(&mut doc).unwrap());
        assert_eq!(doc.buffer.text(), "");
        assert_eq!(doc.caret, 0);
        assert!(!log.undo(&mut doc).unwrap());

        assert!(log.redo(&mut doc).unwrap());
        assert_eq!(doc.buffer.text(), "hello");
        assert_eq!(doc.caret, 5);
        assert!(log.redo(&mut doc).unwrap());
        assert_eq!(doc.buffer.text(), "ho");
        assert!(!log.redo(&mut doc).unwrap());
    }

    #[test]
    fn test_new_edit_discards_redo() {
        let mut doc = Doc::new("ab");
        let mut log = EditLog::new();
        doc.remove(1, 1).unwrap();
        log.remove("b", 1, true);
        log.undo(&mut doc).unwrap();
        assert!(log.can_redo());

        doc.insert(2, "c").unwrap();
        log.add("c", 2, None);
        assert!(!log.can_redo());
        assert!(!log.redo(&mut doc).unwrap());
    }

    #[test]
    fn test_replace_all_roundtrip() {
        let original = "x  foo  foo\n foo!";
        let mut doc = Doc::new(original);
        let mut log = EditLog::new();
        let offsets = vec![3, 8, 13];

        for &offset in offsets.iter().rev() {
            doc.remove(offset, 3).unwrap();
            doc.insert(offset, "quux").unwrap();
        }
        log.replace_all(offsets, vec!["foo".to_string(); 3], "quux");
        let replaced = doc.buffer.text();
        assert_eq!(replaced, "x  quux  quux\n quux!");

        log.undo(&mut doc).unwrap();
        assert_eq!(doc.buffer.text(), original);
        log.redo(&mut doc).unwrap();
        assert_eq!(doc.buffer.text(), replaced);
    }

    #[test]
    fn test_failed_undo_keeps_history() {
        let mut doc = Doc::new("abc");
        let mut log = EditLog::new();
        log.add("xyz", 0, None);

        let err = log.undo(&mut doc).unwrap_err();
        assert!(matches!(err, EditError::TextMismatch { .. }));
        assert_eq!(log.undo_depth(), 1);
        assert_eq!(doc.buffer.text(), "abc");
    }

    #[test]
    fn test_clean_point() {
        let mut log = EditLog::new();
        assert!(log.is_clean());
        log.add("a", 0, None);
        assert!(!log.is_clean());
        log.mark_clean();
        assert!(log.is_clean());
        log.add("b", 1, None);
        assert!(!log.is_clean());
        assert_eq!(log.undo_depth(), 2);
    }
}
