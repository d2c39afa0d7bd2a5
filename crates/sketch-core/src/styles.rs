//! Per-character styling.
//!
//! The classifier paints into a [`StyleMap`]: one [`StyleId`] per document character. Renderers
//! read it back as run-length [`Interval`]s and resolve ids to colors through the configuration.

use crate::delta::TextDelta;
use crate::range::Range;
use sketch_lang::{EditorConfig, KeywordCategory, TextStyle};

/// Style ID type
pub type StyleId = u32;

/// Ordinary code.
pub const PLAIN_STYLE_ID: StyleId = 0;
/// String literal.
pub const STRING_STYLE_ID: StyleId = 0x0100_0001;
/// Single-line or multi-line comment.
pub const COMMENT_STYLE_ID: StyleId = 0x0100_0002;
/// Character literal.
pub const CHAR_STYLE_ID: StyleId = 0x0100_0003;
/// Numeric literal or `#rrggbb` color.
pub const NUMBER_STYLE_ID: StyleId = 0x0100_0004;
/// Escape sequence inside a string or char literal.
pub const ESCAPE_STYLE_ID: StyleId = 0x0100_0005;
/// Overlay for the currently matched bracket pair. Never stored in a [`StyleMap`].
pub const BRACKET_MATCH_STYLE_ID: StyleId = 0x0300_0001;

const KEYWORD_STYLE_BASE: StyleId = 0x0200_0000;

/// Style id painted for matches of a keyword category.
pub fn keyword_style_id(category: KeywordCategory) -> StyleId {
    KEYWORD_STYLE_BASE + category.index() as StyleId
}

/// The keyword category behind a style id, if it is a keyword style.
pub fn keyword_category(style_id: StyleId) -> Option<KeywordCategory> {
    let index = style_id.checked_sub(KEYWORD_STYLE_BASE)? as usize;
    KeywordCategory::ALL.get(index).copied()
}

/// Resolve a style id to the color and weight configured for it.
pub fn resolve_style(config: &EditorConfig, style_id: StyleId) -> TextStyle {
    let theme = &config.theme;
    match style_id {
        STRING_STYLE_ID => theme.string,
        COMMENT_STYLE_ID => theme.comment,
        CHAR_STYLE_ID => theme.char,
        NUMBER_STYLE_ID => theme.number,
        ESCAPE_STYLE_ID => theme.escape,
        BRACKET_MATCH_STYLE_ID => theme.bracket_match,
        other => keyword_category(other)
            .and_then(|category| config.keyword_class(category))
            .map(|class| class.style)
            .unwrap_or(theme.plain),
    }
}

/// A `[start, end)` run of one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    /// Start character offset
    pub start: usize,
    /// End character offset (exclusive)
    pub end: usize,
    /// Style ID
    pub style_id: StyleId,
}

impl Interval {
    /// Create a new interval with `[start, end)` offsets and a style id.
    pub fn new(start: usize, end: usize, style_id: StyleId) -> Self {
        Self {
            start,
            end,
            style_id,
        }
    }

    /// Check if interval contains a specific position
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }
}

/// One style id per document character.
///
/// The map is kept the same length as the document: edits shift it through
/// [`StyleMap::apply_delta`] (new characters start plain) before the classifier repaints the
/// affected window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    cells: Vec<StyleId>,
}

impl StyleMap {
    /// A map of `len` plain characters.
    pub fn new(len: usize) -> Self {
        Self {
            cells: vec![PLAIN_STYLE_ID; len],
        }
    }

    /// Number of characters covered.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` for an empty document.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Style of the character at `offset`.
    pub fn get(&self, offset: usize) -> Option<StyleId> {
        self.cells.get(offset).copied()
    }

    /// All cells.
    pub fn as_slice(&self) -> &[StyleId] {
        &self.cells
    }

    /// Paint `range` (clipped to the document) with `style_id`.
    pub fn paint(&mut self, range: Range, style_id: StyleId) {
        let range = range.clamp_to(self.cells.len());
        self.cells[range.offset..range.end()].fill(style_id);
    }

    /// Resize to `len` plain characters.
    pub fn reset(&mut self, len: usize) {
        self.cells.clear();
        self.cells.resize(len, PLAIN_STYLE_ID);
    }

    /// Shift the cells to follow a text edit.
    pub fn apply_delta(&mut self, delta: &TextDelta) {
        let start = delta.offset.min(self.cells.len());
        let end = delta.old_end().min(self.cells.len());
        self.cells.splice(
            start..end,
            std::iter::repeat_n(PLAIN_STYLE_ID, delta.inserted),
        );
    }

    /// Run-length encoding of every non-plain run.
    pub fn runs(&self) -> Vec<Interval> {
        let mut runs: Vec<Interval> = Vec::new();
        let mut start = 0;
        while start < self.cells.len() {
            let style_id = self.cells[start];
            let mut end = start + 1;
            while end < self.cells.len() && self.cells[end] == style_id {
                end += 1;
            }
            if style_id != PLAIN_STYLE_ID {
                runs.push(Interval::new(start, end, style_id));
            }
            start = end;
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_and_runs() {
        let mut map = StyleMap::new(10);
        map.paint(Range::new(2, 3), STRING_STYLE_ID);
        map.paint(Range::new(8, 5), COMMENT_STYLE_ID);
        assert_eq!(
            map.runs(),
            vec![
                Interval::new(2, 5, STRING_STYLE_ID),
                Interval::new(8, 10, COMMENT_STYLE_ID),
            ]
        );
    }

    #[test]
    fn test_apply_delta_shifts_cells() {
        let mut map = StyleMap::new(6);
        map.paint(Range::new(4, 2), NUMBER_STYLE_ID);
        map.apply_delta(&TextDelta::insert(1, 3));
        assert_eq!(map.len(), 9);
        assert_eq!(map.runs(), vec![Interval::new(7, 9, NUMBER_STYLE_ID)]);

        map.apply_delta(&TextDelta::remove(0, 2));
        assert_eq!(map.runs(), vec![Interval::new(5, 7, NUMBER_STYLE_ID)]);
    }

    #[test]
    fn test_keyword_ids_roundtrip() {
        for category in KeywordCategory::ALL {
            assert_eq!(keyword_category(keyword_style_id(category)), Some(category));
        }
        assert_eq!(keyword_category(STRING_STYLE_ID), None);
    }

    #[test]
    fn test_resolve_style_uses_config() {
        let config = EditorConfig::default();
        assert_eq!(resolve_style(&config, STRING_STYLE_ID), config.theme.string);
        let flow = keyword_style_id(KeywordCategory::Flow);
        assert_eq!(
            resolve_style(&config, flow),
            KeywordCategory::Flow.default_style()
        );
        assert_eq!(resolve_style(&config, PLAIN_STYLE_ID), config.theme.plain);
    }
}
