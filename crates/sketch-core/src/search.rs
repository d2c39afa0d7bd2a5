//! Find and replace-all support.
//!
//! Queries are plain text (escaped into a regex) unless [`SearchOptions::regex`] is set. All
//! inputs and outputs are **character offsets**; matches are half-open and never overlap.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::attribute::is_word_char;

/// Options that control how search is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// If `true`, letter case must match.
    pub case_sensitive: bool,
    /// If `true`, matches must not touch a word character on either side.
    pub whole_word: bool,
    /// If `true`, the query is a regex pattern.
    pub regex: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            whole_word: false,
            regex: false,
        }
    }
}

impl SearchOptions {
    /// Plain-text options, case-insensitive when `ignore_case` is set.
    pub fn plain(ignore_case: bool) -> Self {
        Self {
            case_sensitive: !ignore_case,
            ..Self::default()
        }
    }
}

/// A half-open character range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// First matched character.
    pub start: usize,
    /// One past the last matched character.
    pub end: usize,
}

impl SearchMatch {
    /// Number of matched characters.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if nothing was matched.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Debug, Error)]
/// Search errors.
pub enum SearchError {
    #[error("invalid search pattern: {0}")]
    /// The query failed to compile.
    InvalidPattern(#[from] regex::Error),
}

// Byte offset of every character, plus the text length.
struct CharIndex {
    starts: Vec<usize>,
}

impl CharIndex {
    fn new(text: &str) -> Self {
        let mut starts: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        starts.push(text.len());
        Self { starts }
    }

    fn byte_to_char(&self, byte: usize) -> usize {
        self.starts
            .binary_search(&byte)
            .unwrap_or_else(|insert_at| insert_at)
    }
}

fn compile(query: &str, options: SearchOptions) -> Result<Regex, SearchError> {
    let pattern = if options.regex {
        query.to_string()
    } else {
        regex::escape(query)
    };
    Ok(RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .multi_line(true)
        .build()?)
}

fn is_whole_word(text: &[char], m: SearchMatch) -> bool {
    let before = m.start.checked_sub(1).and_then(|i| text.get(i));
    let after = text.get(m.end);
    !before.is_some_and(|&c| is_word_char(c)) && !after.is_some_and(|&c| is_word_char(c))
}

/// All non-overlapping, non-empty matches in `text`, in order. An empty query matches nothing.
pub fn find_all(
    text: &str,
    query: &str,
    options: SearchOptions,
) -> Result<Vec<SearchMatch>, SearchError> {
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let re = compile(query, options)?;
    let index = CharIndex::new(text);
    let chars: Vec<char> = if options.whole_word {
        text.chars().collect()
    } else {
        Vec::new()
    };

    Ok(re
        .find_iter(text)
        .map(|m| SearchMatch {
            start: index.byte_to_char(m.start()),
            end: index.byte_to_char(m.end()),
        })
        .filter(|m| !m.is_empty())
        .filter(|&m| !options.whole_word || is_whole_word(&chars, m))
        .collect())
}

/// The first match starting at or after `from`, wrapping around to the start of the text.
pub fn find_next(
    text: &str,
    query: &str,
    options: SearchOptions,
    from: usize,
) -> Result<Option<SearchMatch>, SearchError> {
    let matches = find_all(text, query, options)?;
    Ok(matches
        .iter()
        .find(|m| m.start >= from)
        .or_else(|| matches.first())
        .copied())
}

/// The last match ending at or before `before`, wrapping around to the end of the text.
pub fn find_prev(
    text: &str,
    query: &str,
    options: SearchOptions,
    before: usize,
) -> Result<Option<SearchMatch>, SearchError> {
    let matches = find_all(text, query, options)?;
    Ok(matches
        .iter()
        .rev()
        .find(|m| m.end <= before)
        .or_else(|| matches.last())
        .copied())
}

/// Expand `\t` and `\n` in a replacement string. `\\` yields a single backslash; any other
/// escape is kept as written.
pub fn expand_escapes(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spans(matches: Vec<SearchMatch>) -> Vec<(usize, usize)> {
        matches.into_iter().map(|m| (m.start, m.end)).collect()
    }

    #[test]
    fn test_find_all_is_non_overlapping() {
        let found = find_all("aaaa", "aa", SearchOptions::default()).unwrap();
        assert_eq!(spans(found), vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn test_find_all_uses_char_offsets() {
        let found = find_all("héllo héllo", "llo", SearchOptions::default()).unwrap();
        assert_eq!(spans(found), vec![(2, 5), (8, 11)]);

        // Matches on multi-byte characters, including one ending the text.
        let found = find_all("añb ñ", "ñ", SearchOptions::default()).unwrap();
        assert_eq!(spans(found), vec![(1, 2), (4, 5)]);
    }

    #[test]
    fn test_plain_query_is_escaped() {
        let found = find_all("a.b axb", "a.b", SearchOptions::default()).unwrap();
        assert_eq!(spans(found), vec![(0, 3)]);
    }

    #[test]
    fn test_ignore_case_and_whole_word() {
        let found = find_all("Foo foo food", "foo", SearchOptions::plain(true)).unwrap();
        assert_eq!(found.len(), 3);

        let options = SearchOptions {
            whole_word: true,
            ..SearchOptions::plain(true)
        };
        let found = find_all("Foo foo food", "foo", options).unwrap();
        assert_eq!(spans(found), vec![(0, 3), (4, 7)]);
    }

    #[test]
    fn test_find_next_and_prev_wrap() {
        let text = "x foo y foo";
        let options = SearchOptions::default();
        assert_eq!(
            find_next(text, "foo", options, 3).unwrap(),
            Some(SearchMatch { start: 8, end: 11 })
        );
        assert_eq!(
            find_next(text, "foo", options, 9).unwrap(),
            Some(SearchMatch { start: 2, end: 5 })
        );
        assert_eq!(
            find_prev(text, "foo", options, 8).unwrap(),
            Some(SearchMatch { start: 2, end: 5 })
        );
        assert_eq!(
            find_prev(text, "foo", options, 1).unwrap(),
            Some(SearchMatch { start: 8, end: 11 })
        );
    }

    #[test]
    fn test_invalid_regex() {
        let options = SearchOptions {
            regex: true,
            ..SearchOptions::default()
        };
        assert!(matches!(
            find_all("abc", "(", options),
            Err(SearchError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_expand_escapes() {
        assert_eq!(expand_escapes(r"a\tb\nc"), "a\tb\nc");
        assert_eq!(expand_escapes(r"\\t"), "\\t");
        assert_eq!(expand_escapes(r"\q\"), "\\q\\");
    }
}
