//! Delimiter pairing, word units and indentation rules.
//!
//! Everything here is a decision over the current text and classification: the
//! [`DocumentSurface`](crate::DocumentSurface) applies the result and records it in the edit
//! log. The only state is [`PairingEngine`]'s pair-tracking flags.

use crate::attribute::is_delimiter;
use crate::buffer::TextBuffer;
use crate::highlight::Highlighter;
use sketch_lang::EditorOptions;

/// Characters that open an auto-paired group, index-aligned with [`CLOSERS`].
pub const OPENERS: [char; 6] = ['{', '[', '(', '<', '"', '\''];
/// Characters that close an auto-paired group.
pub const CLOSERS: [char; 6] = ['}', ']', ')', '>', '"', '\''];

/// The closer paired with `opener`.
pub fn closing_char(opener: char) -> Option<char> {
    OPENERS
        .iter()
        .position(|&c| c == opener)
        .map(|i| CLOSERS[i])
}

/// Returns `true` for any of [`CLOSERS`].
pub fn is_closer(c: char) -> bool {
    CLOSERS.contains(&c)
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// What typing one character should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedAction {
    /// Insert the character.
    Insert,
    /// Insert the character followed by this closer, caret between them.
    InsertPair(char),
    /// Move the caret over the identical character already there.
    SkipOver,
    /// Replace the tab before the caret with the character.
    ReplaceTab,
}

/// Keystroke-to-keystroke pairing state.
#[derive(Debug, Clone, Default)]
pub struct PairingEngine {
    /// A pair was inserted and the caret has not been moved away since.
    unbroken_opening: bool,
    /// The previous keystroke was an auto-indenting Enter.
    after_enter: bool,
}

impl PairingEngine {
    /// Fresh state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the caret is still inside the pair inserted last.
    pub fn is_unbroken(&self) -> bool {
        self.unbroken_opening
    }

    /// Forget the open pair (the caret was moved explicitly).
    pub fn break_opening(&mut self) {
        self.unbroken_opening = false;
    }

    /// Remember that Enter was just pressed.
    pub fn note_enter(&mut self) {
        self.after_enter = true;
    }

    /// Decide what typing `c` at `caret` (no selection) does.
    pub fn decide(
        &mut self,
        c: char,
        caret: usize,
        buffer: &TextBuffer,
        highlighter: &Highlighter,
        options: &EditorOptions,
    ) -> TypedAction {
        let after_enter = std::mem::take(&mut self.after_enter);
        let at = |back: usize| caret.checked_sub(back).and_then(|i| buffer.char_at(i));
        let prev = at(1);
        let prev2 = at(2);
        let next = buffer.char_at(caret);

        if options.auto_tab && c == '}' && prev == Some('\t') && after_enter {
            return TypedAction::ReplaceTab;
        }
        if !options.insert_end_chars {
            return TypedAction::Insert;
        }

        // `caret - 1` is code (or there is nothing before the caret).
        let code_before = caret == 0 || highlighter.should_insert_ignore_end(caret - 1);
        let unescaped = prev != Some('\\') || prev2 == Some('\\');

        match c {
            '"' if !code_before => {
                return if next == Some('"') && unescaped {
                    TypedAction::SkipOver
                } else {
                    TypedAction::Insert
                };
            }
            '\'' => {
                if !highlighter.should_insert(caret) && next == Some('\'') && unescaped {
                    return TypedAction::SkipOver;
                }
            }
            '"' => {}
            c if is_closer(c) && next == Some(c) && self.unbroken_opening => {
                return TypedAction::SkipOver;
            }
            _ => {}
        }

        let Some(closer) = closing_char(c) else {
            return TypedAction::Insert;
        };

        let closes_char_literal = c == '\''
            && next == Some('\'')
            && (prev == Some('\'') || (prev == Some('\\') && prev2 == Some('\'')));
        let repeats_quote = is_quote(c) && prev == Some(c) && prev2 != Some('\\');
        let comparison = c == '<' && !prev.is_some_and(|p| p.is_ascii_alphabetic());
        let between_quotes = prev == Some('\'') && next == Some('\'');

        if closes_char_literal || repeats_quote || !code_before || comparison || between_quotes {
            return TypedAction::Insert;
        }

        self.unbroken_opening = true;
        TypedAction::InsertPair(closer)
    }

    /// Where Tab at `caret` should jump: past the closer following the whitespace after the
    /// caret, while the pair that closer belongs to is still open.
    pub fn tab_skip(
        &self,
        buffer: &TextBuffer,
        caret: usize,
        options: &EditorOptions,
    ) -> Option<usize> {
        if !options.insert_end_chars || !self.unbroken_opening {
            return None;
        }
        let (index, c) = buffer
            .chars_at(caret)
            .enumerate()
            .map(|(i, c)| (caret + i, c))
            .find(|(_, c)| !c.is_whitespace())?;
        is_closer(c).then_some(index + 1)
    }
}

/// How many auto-inserted closers after `end` go along with removing `start..end`.
///
/// Closers directly after `end` are matched, innermost first, against the openers inside the
/// removed text; an escaped quote never counts as an opener.
pub fn cascade_len(buffer: &TextBuffer, start: usize, end: usize) -> usize {
    let closers: Vec<char> = buffer.chars_at(end).take_while(|&c| is_closer(c)).collect();
    if closers.is_empty() || end <= start {
        return 0;
    }

    let removed: Vec<char> = buffer.chars_at(start).take(end - start).collect();
    // Characters before the removed text stand in for negative indices.
    let char_at = |i: isize| -> Option<char> {
        if i >= 0 {
            removed.get(i as usize).copied()
        } else {
            start
                .checked_add_signed(i)
                .and_then(|offset| buffer.char_at(offset))
        }
    };

    let mut matched = 0;
    for i in (0..removed.len() as isize).rev() {
        if matched == closers.len() {
            break;
        }
        let Some(c) = char_at(i) else {
            continue;
        };
        let escaped = is_quote(c) && char_at(i - 1) == Some('\\') && char_at(i - 2) != Some('\\');
        if !escaped && closing_char(c) == Some(closers[matched]) {
            matched += 1;
        }
    }
    matched
}

// Last delimiter in `0..before`.
fn last_delimiter(buffer: &TextBuffer, before: usize) -> Option<usize> {
    let mut chars = buffer.chars_at(before);
    let mut i = before.min(buffer.len_chars());
    while let Some(c) = chars.prev() {
        i -= 1;
        if is_delimiter(c) {
            return Some(i);
        }
    }
    None
}

// First character at or after `from` satisfying `f`, or the buffer length.
fn next_where(buffer: &TextBuffer, from: usize, f: impl Fn(char) -> bool) -> usize {
    let from = from.min(buffer.len_chars());
    buffer
        .chars_at(from)
        .position(f)
        .map_or(buffer.len_chars(), |i| from + i)
}

/// Caret after a word-left move.
pub fn word_left(buffer: &TextBuffer, caret: usize) -> usize {
    caret
        .checked_sub(1)
        .and_then(|before| last_delimiter(buffer, before))
        .map_or(0, |i| i + 1)
}

/// Caret after a word-right move.
pub fn word_right(buffer: &TextBuffer, caret: usize) -> usize {
    next_where(buffer, caret + 1, is_delimiter)
}

/// Start of the text a word-backspace at `caret` removes.
///
/// A run of one repeated delimiter goes as a whole; a word directly after a delimiter loses
/// only its last character.
pub fn backspace_word_start(buffer: &TextBuffer, caret: usize) -> usize {
    if caret < 2 {
        return 0;
    }
    let (Some(second_last), Some(last)) = (buffer.char_at(caret - 2), buffer.char_at(caret - 1))
    else {
        return caret;
    };

    if is_delimiter(last) && second_last == last {
        let mut start = caret - 2;
        let mut chars = buffer.chars_at(start);
        while chars.prev() == Some(last) {
            start -= 1;
        }
        start
    } else if is_delimiter(second_last) && !is_delimiter(last) {
        caret - 1
    } else {
        word_left(buffer, caret)
    }
}

/// Start of the text a line-backspace at `caret` removes. Directly after a newline, the
/// previous line goes along with it.
pub fn backspace_line_start(buffer: &TextBuffer, caret: usize) -> usize {
    let from = if caret > 0 && buffer.char_at(caret - 1) == Some('\n') {
        caret - 1
    } else {
        caret
    };
    buffer.line_start_of(from)
}

/// End of the text a word-delete at `caret` removes.
pub fn delete_word_end(buffer: &TextBuffer, caret: usize) -> usize {
    let (Some(next), Some(second_next)) = (buffer.char_at(caret), buffer.char_at(caret + 1))
    else {
        return (caret + 1).min(buffer.len_chars());
    };

    if !is_delimiter(next) && is_delimiter(second_next) {
        caret + 1
    } else if is_delimiter(next) && next == second_next {
        next_where(buffer, caret, |c| c != next)
    } else {
        next_where(buffer, caret + 1, is_delimiter)
    }
}

/// End of the text a line-delete at `caret` removes. Directly before a newline, the next
/// line goes along with it.
pub fn delete_line_end(buffer: &TextBuffer, caret: usize) -> usize {
    let from = if buffer.char_at(caret) == Some('\n') {
        caret + 1
    } else {
        caret
    };
    next_where(buffer, from, |c| c == '\n')
}

/// Text inserted by Enter and where the caret ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterInsertion {
    /// Inserted at the caret.
    pub text: String,
    /// Caret afterwards.
    pub caret: usize,
}

/// What Enter at `caret` inserts.
///
/// The new line copies the current line's leading tabs, plus one when the line opens a block
/// (`{` or a braceless `if`/`for`/`while`/`else`/`do` header). A `}` right after the caret is
/// pushed to a line of its own.
pub fn enter_insertion(buffer: &TextBuffer, caret: usize, options: &EditorOptions) -> EnterInsertion {
    let line = buffer.line_prefix(caret);
    let mut text = String::from("\n");
    let mut new_caret = caret + 1;

    if !line.is_empty() {
        let tabs: String = line.chars().take_while(|&c| c == '\t').collect();
        if options.auto_tab {
            text.push_str(&tabs);
            if line.ends_with('{') || is_control_header(&line) {
                text.push('\t');
            }
            new_caret = caret + text.chars().count();
        }
        if options.insert_end_chars && buffer.char_at(caret) == Some('}') {
            text.push('\n');
            text.push_str(&tabs);
        }
    }

    EnterInsertion {
        text,
        caret: new_caret,
    }
}

// `if (...)`, `for (...)`, `while (...)`, `else`, `do`, optionally after `}` or `else`.
fn is_control_header(line: &str) -> bool {
    let mut line = line.trim();
    if let Some(rest) = line.strip_prefix('}') {
        line = rest.trim_start();
    }
    if line == "else" || line == "do" {
        return true;
    }
    if let Some(rest) = line.strip_prefix("else")
        && rest.starts_with(is_delimiter)
    {
        line = rest.trim_start();
    }

    let Some(rest) = ["if", "for", "while"]
        .iter()
        .find_map(|keyword| line.strip_prefix(keyword))
    else {
        return false;
    };
    let rest = rest.trim_start();
    if !rest.starts_with('(') {
        return false;
    }

    let mut depth = 0usize;
    for (i, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1 == rest.len();
                }
            }
            _ => {}
        }
    }
    false
}

/// Indent every non-empty line of `selection` by one tab.
pub fn indent(selection: &str) -> String {
    let mut out = String::with_capacity(selection.len() + 8);
    out.push('\t');
    let mut chars = selection.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '\n' && chars.peek().is_some_and(|&next| next != '\n') {
            out.push('\t');
        }
    }
    out
}

/// Remove one leading tab from every line of the selection starting at `start`.
///
/// Returns where the replacement begins (one before `start` when the tab of the first line
/// sits outside the selection) and the replacement text.
pub fn unindent(buffer: &TextBuffer, start: usize, selection: &str) -> (usize, String) {
    let text = selection.replace("\n\t", "\n");
    if let Some(rest) = text.strip_prefix('\t') {
        (start, rest.to_string())
    } else if start > 0 && buffer.char_at(start - 1) == Some('\t') {
        (start - 1, text)
    } else {
        (start, text)
    }
}

/// The document re-indented by bracket depth.
///
/// Only brackets at code positions count. A line starting with a closer is dedented with it.
pub fn format_indentation(buffer: &TextBuffer, highlighter: &Highlighter) -> String {
    let input: Vec<char> = buffer.chars_at(0).collect();
    let mut out = String::with_capacity(input.len());
    let mut depth = 0isize;

    let mut i = input.iter().take_while(|&&c| c == '\t').count();
    while i < input.len() {
        let c = input[i];
        if !highlighter.should_insert(i) {
            out.push(c);
            i += 1;
            continue;
        }

        match c {
            '\n' => {
                let mut j = i + 1;
                while input.get(j) == Some(&'\t') {
                    j += 1;
                }
                let closer = input
                    .get(j)
                    .copied()
                    .filter(|c| matches!(c, '}' | ')' | ']'));
                if closer.is_some() {
                    depth -= 1;
                    j += 1;
                }

                out.push('\n');
                out.extend(std::iter::repeat_n('\t', depth.max(0) as usize));
                out.extend(closer);
                i = j;
                continue;
            }
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => depth -= 1,
            _ => {}
        }
        out.push(c);
        i += 1;
    }
    out
}
