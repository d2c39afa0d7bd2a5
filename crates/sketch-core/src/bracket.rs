//! Matching bracket overlay.

use crate::buffer::TextBuffer;
use crate::highlight::Highlighter;

const OPEN: [char; 3] = ['{', '(', '['];
const CLOSE: [char; 3] = ['}', ')', ']'];

/// Offsets of a matched opening and closing bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketPair {
    /// The opening bracket.
    pub open: usize,
    /// The closing bracket.
    pub close: usize,
}

// The bracket kind `c` belongs to, as `(open, close)`.
fn kind_of(c: char) -> Option<(char, char)> {
    OPEN.iter()
        .position(|&o| o == c)
        .or_else(|| CLOSE.iter().position(|&e| e == c))
        .map(|i| (OPEN[i], CLOSE[i]))
}

/// Every matched pair of one bracket kind, by opener. Brackets inside literals and comments
/// are ignored; a closer pairs with the nearest unclosed opener before it.
fn pairs_of(
    buffer: &TextBuffer,
    highlighter: &Highlighter,
    (open, close): (char, char),
) -> Vec<BracketPair> {
    let mut openers: Vec<(usize, Option<usize>)> = Vec::new();
    for (i, c) in buffer.chars_at(0).enumerate() {
        if (c != open && c != close) || !highlighter.should_insert(i) {
            continue;
        }
        if c == open {
            openers.push((i, None));
        } else if let Some(slot) = openers.iter_mut().rev().find(|(_, closed)| closed.is_none()) {
            slot.1 = Some(i);
        }
    }

    openers
        .into_iter()
        .filter_map(|(open, close)| close.map(|close| BracketPair { open, close }))
        .collect()
}

/// The pair the bracket after `caret` (or, failing that, before it) belongs to.
pub fn find_match(
    buffer: &TextBuffer,
    highlighter: &Highlighter,
    caret: usize,
) -> Option<BracketPair> {
    let next = buffer.char_at(caret).and_then(|c| kind_of(c).map(|k| (caret, k)));
    let last = caret
        .checked_sub(1)
        .and_then(|i| buffer.char_at(i).and_then(|c| kind_of(c).map(|k| (i, k))));
    let (at, kind) = next.or(last)?;

    pairs_of(buffer, highlighter, kind)
        .into_iter()
        .find(|pair| pair.open == at || pair.close == at)
}

/// Tracks the bracket pair currently shown around the caret.
#[derive(Debug, Clone, Default)]
pub struct BracketMatcher {
    active: Option<BracketPair>,
}

impl BracketMatcher {
    /// No active match.
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-evaluate for `caret`. Nothing is matched while highlighting is disabled.
    pub fn highlight(&mut self, buffer: &TextBuffer, highlighter: &Highlighter, caret: usize) {
        self.active = if highlighter.is_enabled() {
            find_match(buffer, highlighter, caret)
        } else {
            None
        };
    }

    /// Drop the active match.
    pub fn clear(&mut self) {
        self.active = None;
    }

    /// The active match.
    pub fn active(&self) -> Option<BracketPair> {
        self.active
    }
}
