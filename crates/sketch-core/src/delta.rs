//! Structured text change deltas.
//!
//! Incremental consumers (the lexical classifier, the style map, change subscribers) need to know
//! *where* the text changed without diffing old and new text. A [`TextDelta`] describes one
//! contiguous replacement in **character offsets**.

/// One contiguous replacement: `removed` characters at `offset` were replaced by `inserted`
/// characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextDelta {
    /// Start character offset of the edit.
    pub offset: usize,
    /// Number of characters removed.
    pub removed: usize,
    /// Number of characters inserted.
    pub inserted: usize,
}

impl TextDelta {
    /// An insertion of `len` characters.
    pub const fn insert(offset: usize, len: usize) -> Self {
        Self {
            offset,
            removed: 0,
            inserted: len,
        }
    }

    /// A removal of `len` characters.
    pub const fn remove(offset: usize, len: usize) -> Self {
        Self {
            offset,
            removed: len,
            inserted: 0,
        }
    }

    /// Exclusive end of the edit in the pre-edit document.
    pub fn old_end(&self) -> usize {
        self.offset + self.removed
    }

    /// Exclusive end of the edit in the post-edit document.
    pub fn new_end(&self) -> usize {
        self.offset + self.inserted
    }

    /// Change in document length.
    pub fn len_delta(&self) -> isize {
        self.inserted as isize - self.removed as isize
    }

    /// Returns `true` if the edit changes nothing.
    pub fn is_empty(&self) -> bool {
        self.removed == 0 && self.inserted == 0
    }

    /// Merge with a `later` delta applied on top of this one.
    pub fn compose(&self, later: &TextDelta) -> TextDelta {
        let start = self.offset.min(later.offset);
        // Extent of both edits in the intermediate document.
        let mid_end = self.new_end().max(later.old_end());
        let old_end = (mid_end as isize - self.len_delta()) as usize;
        let new_end = (mid_end as isize + later.len_delta()) as usize;
        TextDelta {
            offset: start,
            removed: old_end - start,
            inserted: new_end - start,
        }
    }
}
