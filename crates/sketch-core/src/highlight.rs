//! Lexical classification and painting.
//!
//! The [`Highlighter`] scans the document for string literals, character literals, single-line
//! comments and multi-line comments. Everything outside those spans is code: keyword categories
//! and numbers are painted there, and the pairing engine consults the span lists to decide
//! whether a character is typed "in code".
//!
//! # Spans and the line terminator
//!
//! A span's last index is its closing character. Spans that run to the end of a line (line
//! comments, unterminated string literals) own the terminating `\n`, and spans that run to the
//! end of the document own the virtual slot one past the last character. That way a caret parked
//! at the end of an open literal still counts as "inside" it. Painting is clipped to the
//! document.
//!
//! # Incremental updates
//!
//! [`Highlighter::recalculate_edit`] re-scans from just before an edit and stops as soon as the
//! scanner reaches, past the edit, a position the previous scan also visited in code state. From
//! there the previous tokens are reused, shifted. [`Highlighter::repaint`] then repaints a window
//! that [`Highlighter::expand`] grows until the result is identical to a full repaint.

use std::sync::LazyLock;

use regex::Regex;
use ropey::iter::Chars;
use sketch_lang::EditorConfig;

use crate::attribute::{Attribute, is_delimiter, is_word_char};
use crate::buffer::TextBuffer;
use crate::delta::TextDelta;
use crate::range::Range;
use crate::styles::{
    CHAR_STYLE_ID, COMMENT_STYLE_ID, ESCAPE_STYLE_ID, NUMBER_STYLE_ID, PLAIN_STYLE_ID,
    STRING_STYLE_ID, StyleId, StyleMap,
};

/// The kinds of non-code span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// `"..."`, possibly unterminated.
    String,
    /// `// ...` up to and including the line break.
    LineComment,
    /// `/* ... */`, possibly unterminated.
    BlockComment,
    /// A well-formed character literal.
    Char,
}

impl SpanKind {
    /// All kinds, in paint order.
    pub const ALL: [SpanKind; 4] = [
        SpanKind::String,
        SpanKind::LineComment,
        SpanKind::BlockComment,
        SpanKind::Char,
    ];

    /// The style painted over spans of this kind.
    pub fn style_id(self) -> StyleId {
        match self {
            SpanKind::String => STRING_STYLE_ID,
            SpanKind::LineComment | SpanKind::BlockComment => COMMENT_STYLE_ID,
            SpanKind::Char => CHAR_STYLE_ID,
        }
    }

    fn has_escapes(self) -> bool {
        matches!(self, SpanKind::String | SpanKind::Char)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Span(SpanKind),
    // A quoted run that is not a valid character literal. Consumed, never reported.
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    range: Range,
}

impl Token {
    fn new(kind: TokenKind, range: Range) -> Self {
        Self { kind, range }
    }

    fn span(&self) -> Option<SpanKind> {
        match self.kind {
            TokenKind::Span(kind) => Some(kind),
            TokenKind::Rejected => None,
        }
    }

    fn shifted(self, delta: isize) -> Self {
        Self {
            range: self.range.shifted(delta),
            ..self
        }
    }
}

/// Index of the first token ending after `pos`.
fn first_ending_after(tokens: &[Token], pos: usize) -> usize {
    tokens.partition_point(|t| t.range.end() <= pos)
}

/// Returns `true` if `pos` lies inside a token without being its first character, i.e. the
/// scanner never stood at `pos` in code state.
fn inside_token(tokens: &[Token], pos: usize) -> bool {
    tokens
        .get(first_ending_after(tokens, pos))
        .is_some_and(|t| t.range.offset < pos)
}

struct Scanner<'a> {
    chars: Chars<'a>,
    pos: usize,
    cur: Option<char>,
    next: Option<char>,
}

impl<'a> Scanner<'a> {
    fn new(buffer: &'a TextBuffer, pos: usize) -> Self {
        let mut chars = buffer.chars_at(pos);
        let cur = chars.next();
        let next = chars.next();
        Self {
            chars,
            pos: pos.min(buffer.len_chars()),
            cur,
            next,
        }
    }

    fn bump(&mut self) {
        if self.cur.is_some() {
            self.pos += 1;
            self.cur = self.next;
            self.next = self.chars.next();
        }
    }

    /// Advance one step in code state, returning the token that starts here, if any.
    fn step(&mut self) -> Option<Token> {
        let start = self.pos;
        let kind = match (self.cur?, self.next) {
            ('"', _) => {
                self.bump();
                self.quoted('"', None);
                TokenKind::Span(SpanKind::String)
            }
            ('\'', _) => {
                let mut literal = vec!['\''];
                self.bump();
                let terminated = self.quoted('\'', Some(&mut literal));
                if terminated && is_char_literal(&literal) {
                    TokenKind::Span(SpanKind::Char)
                } else {
                    TokenKind::Rejected
                }
            }
            ('/', Some('/')) => {
                self.bump();
                self.bump();
                while self.cur.is_some_and(|c| c != '\n') {
                    self.bump();
                }
                TokenKind::Span(SpanKind::LineComment)
            }
            ('/', Some('*')) => {
                self.bump();
                self.bump();
                loop {
                    match (self.cur, self.next) {
                        (Some('*'), Some('/')) => {
                            self.bump();
                            break;
                        }
                        (None, _) => break,
                        _ => self.bump(),
                    }
                }
                TokenKind::Span(SpanKind::BlockComment)
            }
            _ => {
                self.bump();
                return None;
            }
        };

        // The current character is the token's last; resume after it.
        let range = Range::inclusive(start, self.pos);
        self.bump();
        Some(Token::new(kind, range))
    }

    // Stops on the closing quote (returns true), the line break, or the end of the document.
    fn quoted(&mut self, quote: char, mut literal: Option<&mut Vec<char>>) -> bool {
        let mut escaped = false;
        while let Some(c) = self.cur {
            if c == '\n' {
                return false;
            }
            if let Some(literal) = literal.as_deref_mut() {
                literal.push(c);
            }
            if c == quote && !escaped {
                return true;
            }
            escaped = c == '\\' && !escaped;
            self.bump();
        }
        false
    }
}

/// `'x'`, `'\x'` or `'\uXXXX'`, quotes included.
fn is_char_literal(literal: &[char]) -> bool {
    match literal.len() {
        3 => true,
        4 => literal[1] == '\\',
        8 => literal[1] == '\\' && literal[2] == 'u' && literal[3..7].iter().all(char::is_ascii_hexdigit),
        _ => false,
    }
}

/// Escape sequences inside a literal span, in document offsets.
fn escapes(buffer: &TextBuffer, span: Range) -> Vec<Range> {
    let span = span.clamp_to(buffer.len_chars());
    let chars: Vec<char> = buffer.chars_at(span.offset).take(span.length).collect();
    let mut found = Vec::new();

    // Index 0 is the opening quote.
    let mut i = 1;
    while i < chars.len() {
        if chars[i] != '\\' {
            i += 1;
            continue;
        }
        let width = match chars.get(i + 1) {
            Some('t' | 'r' | '\\' | 'n' | '\'' | '"' | 'b' | 'f' | '0') => 2,
            Some('u')
                if chars.len() >= i + 6
                    && chars[i + 2..i + 6].iter().all(char::is_ascii_hexdigit) =>
            {
                6
            }
            _ => 1,
        };
        if width > 1 {
            found.push(Range::new(span.offset + i, width));
        }
        i += width;
    }
    found
}

const DECIMAL_PATTERN: &str = r"^[+-]?(?:NaN|Infinity|(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?[fFdD]?|0[xX](?:[0-9a-fA-F]+\.?[0-9a-fA-F]*|\.[0-9a-fA-F]+)[pP][+-]?[0-9]+[fFdD]?)$";

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DECIMAL_PATTERN).expect("DECIMAL_PATTERN compiles"));

/// Decimal and hexadecimal floating point, integers, `l`/`L` longs and `#rrggbb`-style colors.
pub fn is_number(token: &str) -> bool {
    if DECIMAL.is_match(token) {
        return true;
    }
    if let Some(digits) = token.strip_suffix(['l', 'L']) {
        return digits.parse::<i64>().is_ok();
    }
    token
        .strip_prefix('#')
        .is_some_and(|hex| !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

// Numbers may contain `.` and `#`.
fn is_number_delimiter(c: char) -> bool {
    is_delimiter(c) && c != '.' && c != '#'
}

/// Classifies the document and paints it.
#[derive(Debug, Clone)]
pub struct Highlighter {
    attributes: Vec<Attribute>,
    enabled: bool,
    tokens: Vec<Token>,
    len: usize,
    // Snapshot from before the latest recalculation.
    previous: Vec<Token>,
    previous_len: usize,
}

impl Highlighter {
    /// A highlighter for an empty document.
    pub fn new(config: &EditorConfig) -> Self {
        let mut highlighter = Self {
            attributes: Vec::new(),
            enabled: true,
            tokens: Vec::new(),
            len: 0,
            previous: Vec::new(),
            previous_len: 0,
        };
        highlighter.configure(config);
        highlighter
    }

    /// Rebind keyword classes and the highlight toggle. Callers repaint afterwards.
    pub fn configure(&mut self, config: &EditorConfig) {
        self.attributes = config.keywords.iter().cloned().map(Attribute::new).collect();
        self.enabled = config.options.highlight;
    }

    /// Whether painting is enabled. Classification runs either way.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Re-scan the whole document.
    pub fn recalculate(&mut self, buffer: &TextBuffer) {
        let mut tokens = Vec::new();
        Self::scan(buffer, 0, &mut tokens, |_| false);

        self.previous = std::mem::replace(&mut self.tokens, tokens);
        self.previous_len = std::mem::replace(&mut self.len, buffer.len_chars());
        tracing::debug!(len = self.len, tokens = self.tokens.len(), "full recalculation");
    }

    /// Re-scan after `delta` was applied to `buffer`.
    ///
    /// The result is identical to [`Highlighter::recalculate`]. Falls back to it when `delta`
    /// does not match the previously classified length.
    pub fn recalculate_edit(&mut self, buffer: &TextBuffer, delta: &TextDelta) {
        let new_len = buffer.len_chars();
        if delta.old_end() > self.len || self.len.checked_add_signed(delta.len_delta()) != Some(new_len)
        {
            tracing::debug!(
                classified = self.len,
                len = new_len,
                "edit does not match classified text"
            );
            self.recalculate(buffer);
            return;
        }

        let previous = std::mem::take(&mut self.tokens);
        let previous_len = self.len;
        let shift = delta.len_delta();
        let new_end = delta.new_end();

        // Restart at a position the scanner is known to visit in code state.
        let floor = delta.offset.saturating_sub(1);
        let kept = first_ending_after(&previous, floor);
        let restart = previous
            .get(kept)
            .map_or(floor, |t| t.range.offset.min(floor));

        let mut tokens = previous[..kept].to_vec();
        let old_position = |pos: usize| {
            pos.checked_add_signed(-shift)
                .filter(|&old| old <= previous_len)
        };
        let rejoined = Self::scan(buffer, restart, &mut tokens, |pos| {
            pos >= new_end && old_position(pos).is_some_and(|old| !inside_token(&previous, old))
        });

        if let Some(old) = rejoined.and_then(old_position) {
            let from = previous.partition_point(|t| t.range.offset < old);
            tokens.extend(previous[from..].iter().map(|t| t.shifted(shift)));
        }

        tracing::trace!(
            restart,
            rejoined = ?rejoined,
            tokens = tokens.len(),
            "incremental recalculation"
        );
        self.tokens = tokens;
        self.len = new_len;
        self.previous = previous;
        self.previous_len = previous_len;
    }

    fn scan(
        buffer: &TextBuffer,
        from: usize,
        tokens: &mut Vec<Token>,
        mut rejoin: impl FnMut(usize) -> bool,
    ) -> Option<usize> {
        let mut scanner = Scanner::new(buffer, from);
        while scanner.cur.is_some() {
            if rejoin(scanner.pos) {
                return Some(scanner.pos);
            }
            if let Some(token) = scanner.step() {
                tokens.push(token);
            }
        }
        None
    }

    /// Spans of one kind, in offset order.
    pub fn spans(&self, kind: SpanKind) -> Vec<Range> {
        self.tokens
            .iter()
            .filter(|t| t.span() == Some(kind))
            .map(|t| t.range)
            .collect()
    }

    /// String literal spans.
    pub fn strings(&self) -> Vec<Range> {
        self.spans(SpanKind::String)
    }

    /// Single-line comment spans.
    pub fn line_comments(&self) -> Vec<Range> {
        self.spans(SpanKind::LineComment)
    }

    /// Multi-line comment spans.
    pub fn block_comments(&self) -> Vec<Range> {
        self.spans(SpanKind::BlockComment)
    }

    /// Character literal spans.
    pub fn chars(&self) -> Vec<Range> {
        self.spans(SpanKind::Char)
    }

    /// The span containing `offset`, if any.
    pub fn span_at(&self, offset: usize) -> Option<(SpanKind, Range)> {
        let token = self.tokens.get(first_ending_after(&self.tokens, offset))?;
        match token.span() {
            Some(kind) if token.range.contains(offset) => Some((kind, token.range)),
            _ => None,
        }
    }

    /// `true` if `offset` is code: no span contains it.
    pub fn should_insert(&self, offset: usize) -> bool {
        self.span_at(offset).is_none()
    }

    /// Like [`Highlighter::should_insert`], but a span's closing character counts as code.
    pub fn should_insert_ignore_end(&self, offset: usize) -> bool {
        !self
            .span_at(offset)
            .is_some_and(|(_, span)| span.contains_ignore_end(offset))
    }

    /// Whether removing `start..start + length` may also take out auto-inserted closers.
    ///
    /// Spans are visited in offset order: one starting inside the removal allows it, one merely
    /// overlapping it forbids it.
    pub fn should_remove(&self, start: usize, length: usize) -> bool {
        let removed = Range::new(start, length);
        let first = first_ending_after(&self.tokens, start);
        for token in &self.tokens[first..] {
            if token.span().is_none() {
                continue;
            }
            if removed.contains(token.range.offset) {
                return true;
            }
            if token.range.overlaps(&removed) {
                return false;
            }
            if token.range.offset >= start + length.max(1) {
                break;
            }
        }
        true
    }

    /// Grow `range` to the window a repaint has to cover.
    ///
    /// The window is widened to whole lines, back to the line of a declaration keyword whose
    /// lookahead reaches the window, and over any multi-line comment touching it (old or new).
    /// In the last case the end is brought back to the first token shared with the previous
    /// classification, see [`Highlighter::find_rejoin`].
    pub fn expand(&self, buffer: &TextBuffer, range: Range) -> Range {
        let len = buffer.len_chars();
        let range = range.clamp_to(len);

        let mut start = range.offset.saturating_sub(1);
        while start > 0 && buffer.char_at(start) != Some('\n') {
            start -= 1;
        }
        let end = buffer.line_end_of(range.end());
        let mut window = Range::between(start, (end + 1).min(len));

        let mut before = buffer.chars_at(window.offset);
        let mut at = window.offset;
        while let Some(c) = before.prev() {
            at -= 1;
            if c.is_whitespace() {
                continue;
            }
            if is_word_char(c) {
                let line = buffer.line_start_of(at).saturating_sub(1);
                window = Range::between(line.min(window.offset), window.end());
            }
            break;
        }

        let lines_end = window.end();
        if let Some(comment) = self.check_for_multiline_comments(window) {
            window = window.union(&comment);
            let delimited = buffer.range_contains(window.offset, window.end(), "/*")
                || buffer.range_contains(window.offset, window.end(), "*/");
            if delimited && let Some(rejoin) = self.find_rejoin(lines_end) {
                window = Range::between(window.offset, rejoin.max(lines_end));
            }
        }
        window
    }

    /// If a multi-line comment overlaps `window` now, or overlapped it before the latest edit,
    /// the range from that comment's start to the end of the document.
    pub fn check_for_multiline_comments(&self, window: Range) -> Option<Range> {
        let shift = self.len as isize - self.previous_len as isize;
        let old_end = window.end().saturating_add_signed(-shift).max(window.offset);
        let old_window = Range::between(window.offset, old_end);

        let block = |t: &&Token| t.span() == Some(SpanKind::BlockComment);
        let start = self
            .previous
            .iter()
            .filter(block)
            .filter(|t| t.range.overlaps(&old_window))
            .chain(
                self.tokens
                    .iter()
                    .filter(block)
                    .filter(|t| t.range.overlaps(&window)),
            )
            .map(|t| t.range.offset)
            .min()?;
        Some(Range::between(start, self.len))
    }

    /// First offset at or after `from` where the current classification provably continues
    /// the previous one: the start of the earliest token in the common suffix of both token
    /// lists. `None` when nothing is shared past `from`.
    pub fn find_rejoin(&self, from: usize) -> Option<usize> {
        let shift = self.len as isize - self.previous_len as isize;
        let shared = self
            .tokens
            .iter()
            .rev()
            .zip(self.previous.iter().rev())
            .take_while(|(now, before)| **now == before.shifted(shift))
            .count();

        self.tokens[self.tokens.len() - shared..]
            .iter()
            .map(|t| t.range.offset)
            .find(|&offset| offset >= from)
    }

    /// Repaint the window around `range` (an edited region) and return the window painted.
    ///
    /// `styles` must already follow the edit (see [`StyleMap::apply_delta`]).
    pub fn repaint(&self, buffer: &TextBuffer, range: Range, styles: &mut StyleMap) -> Range {
        let len = buffer.len_chars();
        if styles.len() != len || self.len != len {
            self.repaint_all(buffer, styles);
            return Range::new(0, len);
        }
        if !self.enabled {
            return Range::point(range.offset.min(len));
        }

        let window = self.expand(buffer, range);
        tracing::trace!(offset = window.offset, length = window.length, "repaint");
        self.paint(buffer, window, styles);
        window
    }

    /// Paint the whole document from scratch.
    pub fn repaint_all(&self, buffer: &TextBuffer, styles: &mut StyleMap) {
        let len = buffer.len_chars();
        styles.reset(len);
        if self.enabled {
            self.paint(buffer, Range::new(0, len), styles);
        }
    }

    fn paint(&self, buffer: &TextBuffer, window: Range, styles: &mut StyleMap) {
        styles.paint(window, PLAIN_STYLE_ID);
        for attribute in &self.attributes {
            attribute.highlight(buffer, window, styles);
        }
        paint_numbers(buffer, window, styles);

        let first = first_ending_after(&self.tokens, window.offset);
        for token in self.tokens[first..]
            .iter()
            .take_while(|t| t.range.offset < window.end())
        {
            let Some(kind) = token.span() else {
                continue;
            };
            styles.paint(token.range.intersection(&window), kind.style_id());
            if kind.has_escapes() {
                for escape in escapes(buffer, token.range) {
                    styles.paint(escape.intersection(&window), ESCAPE_STYLE_ID);
                }
            }
        }
    }
}

// A run that began before the window is left alone; one that crosses its end is read to
// completion but painted only inside the window.
fn paint_numbers(buffer: &TextBuffer, window: Range, styles: &mut StyleMap) {
    let mut inside_run = window
        .offset
        .checked_sub(1)
        .and_then(|i| buffer.char_at(i))
        .is_some_and(|c| !is_number_delimiter(c));
    let mut token = String::new();
    let mut start = None;

    let mut flush = |start: usize, end: usize, token: &mut String| {
        if is_number(token) {
            styles.paint(Range::between(start, end).intersection(&window), NUMBER_STYLE_ID);
        }
        token.clear();
    };

    let mut pos = window.offset;
    for c in buffer.chars_at(window.offset) {
        if is_number_delimiter(c) {
            if let Some(s) = start.take() {
                flush(s, pos, &mut token);
            }
            inside_run = false;
            if pos >= window.end() {
                return;
            }
        } else if start.is_some() {
            token.push(c);
        } else if !inside_run {
            if pos >= window.end() {
                return;
            }
            start = Some(pos);
            token.push(c);
        }
        pos += 1;
    }
    if let Some(s) = start {
        flush(s, pos, &mut token);
    }
}
