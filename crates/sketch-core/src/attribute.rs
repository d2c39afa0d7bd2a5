//! Keyword category matching.
//!
//! An [`Attribute`] paints every occurrence of one [`KeywordClass`]'s words. Candidate tokens
//! start at a "delimiter-bounded pair": a word character preceded by a delimiter (or the start
//! of the document).

use crate::buffer::TextBuffer;
use crate::range::Range;
use crate::styles::{StyleId, StyleMap, keyword_style_id};
use sketch_lang::KeywordClass;

/// `A-Z a-z 0-9 _ -` are word characters; everything else delimits tokens.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// The complement of [`is_word_char`].
pub fn is_delimiter(c: char) -> bool {
    !is_word_char(c)
}

/// A keyword class ready to paint.
#[derive(Debug, Clone)]
pub struct Attribute {
    class: KeywordClass,
    style_id: StyleId,
}

impl Attribute {
    /// Bind a keyword class.
    pub fn new(class: KeywordClass) -> Self {
        let style_id = keyword_style_id(class.category);
        Self { class, style_id }
    }

    /// The style painted on matches.
    pub fn style_id(&self) -> StyleId {
        self.style_id
    }

    /// The bound class.
    pub fn class(&self) -> &KeywordClass {
        &self.class
    }

    /// Paint every match whose first character lies in `window`.
    ///
    /// Declaration lookahead may read past the window; painting never leaves it.
    pub fn highlight(&self, buffer: &TextBuffer, window: Range, styles: &mut StyleMap) {
        let window = window.clamp_to(buffer.len_chars());
        let mut prev = window.offset.checked_sub(1).and_then(|i| buffer.char_at(i));

        for (pos, c) in (window.offset..window.end()).zip(buffer.chars_at(window.offset)) {
            let pair_start = is_word_char(c) && prev.is_none_or(|p| self.is_boundary(p));
            prev = Some(c);
            if !pair_start {
                continue;
            }

            if let Some(len) = self.match_at(buffer, pos) {
                let hit = Range::new(pos, len);
                styles.paint(
                    Range::between(hit.offset, hit.end().min(window.end())),
                    self.style_id,
                );
            }
        }
    }

    /// Length of the match starting at `pos`, if the token there is one of the class's words.
    pub fn match_at(&self, buffer: &TextBuffer, pos: usize) -> Option<usize> {
        if self.class.declarations_only {
            self.match_declaration(buffer, pos)
        } else {
            self.match_token(buffer, pos)
        }
    }

    fn is_boundary(&self, c: char) -> bool {
        is_delimiter(c) && (self.class.period_delimiter || c != '.')
    }

    fn match_token(&self, buffer: &TextBuffer, pos: usize) -> Option<usize> {
        let token: String = buffer
            .chars_at(pos)
            .take_while(|&c| !self.is_boundary(c))
            .collect();
        self.class
            .contains(&token)
            .then(|| token.chars().count())
    }

    // Word, optional whitespace (newlines included), then `(`.
    fn match_declaration(&self, buffer: &TextBuffer, pos: usize) -> Option<usize> {
        let mut word = String::new();
        let mut passed_whitespace = false;

        for c in buffer.chars_at(pos) {
            if is_word_char(c) {
                if passed_whitespace {
                    return None;
                }
                word.push(c);
            } else if c == '(' {
                return self.class.contains(&word).then(|| word.chars().count());
            } else if c.is_whitespace() {
                passed_whitespace = true;
            } else {
                return None;
            }
        }
        None
    }
}
