//! Command Interface Layer
//!
//! [`DocumentSurface`] owns the text, caret, selection, classification and edit log of one
//! document, and is the only thing allowed to mutate them. Every edit runs the same pipeline:
//! mutate the buffer, reclassify (incrementally), record the edit, repaint the affected window,
//! then re-match brackets and notify subscribers.
//!
//! Operations are available as direct methods and as [`Command`] values for
//! [`DocumentSurface::execute`].
//!
//! # Example
//!
//! ```rust
//! use sketch_core::{Command, DocumentSurface, EditCommand};
//!
//! let mut surface = DocumentSurface::default();
//! for c in "if(".chars() {
//!     surface.execute(Command::Edit(EditCommand::TypeChar(c))).unwrap();
//! }
//! assert_eq!(surface.text(), "if()");
//! assert_eq!(surface.caret(), 3);
//!
//! surface.execute(Command::Edit(EditCommand::Undo)).unwrap();
//! assert_eq!(surface.text(), "");
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sketch_lang::EditorConfig;
use thiserror::Error;

use crate::bracket::{BracketMatcher, BracketPair};
use crate::buffer::TextBuffer;
use crate::clipboard::{Clipboard, MemoryClipboard};
use crate::delta::TextDelta;
use crate::edit_log::{EditLog, EditTarget, map_caret};
use crate::error::{EditError, PersistenceError};
use crate::highlight::Highlighter;
use crate::launcher::{ErrorLocation, RunLog};
use crate::pairing::{self, PairingEngine, TypedAction};
use crate::persistence;
use crate::range::Range;
use crate::search::{
    SearchError, SearchMatch, SearchOptions, expand_escapes, find_all, find_next, find_prev,
};
use crate::state::{DocumentState, StateChange, StateChangeType, StateTracker};
use crate::styles::{BRACKET_MATCH_STYLE_ID, Interval, StyleId, StyleMap};

/// How much Backspace or Delete removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteUnit {
    /// One character.
    #[default]
    Char,
    /// A word, or a run of one repeated delimiter.
    Word,
    /// To the start (Backspace) or end (Delete) of the line.
    Line,
}

/// Text editing commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Type one character, with auto-pairing.
    TypeChar(char),
    /// Insert a line break with auto-indentation.
    Enter,
    /// Tab: skip over a closer, insert a tab, or indent the selection.
    Tab,
    /// Shift+Tab: unindent the selection, or insert a tab.
    ShiftTab,
    /// Remove before the caret (or the selection).
    Backspace(DeleteUnit),
    /// Remove after the caret (or the selection).
    Delete(DeleteUnit),
    /// Copy the selection to the clipboard.
    Copy,
    /// Copy the selection to the clipboard and remove it.
    Cut,
    /// Insert the clipboard text.
    Paste,
    /// Replace the selection (or insert at the caret).
    ReplaceSelection {
        /// Replacement text.
        text: String,
    },
    /// Replace every occurrence of `query`.
    ReplaceAll {
        /// Plain-text query.
        query: String,
        /// Replacement text; `\t` and `\n` are expanded.
        replacement: String,
        /// Match case-insensitively; `None` uses the configured default.
        ignore_case: Option<bool>,
    },
    /// Re-indent the document by bracket depth.
    FormatIndentation,
    /// Undo the last edit.
    Undo,
    /// Redo the last undone edit.
    Redo,
    /// Replace the whole document and forget its history.
    SetText {
        /// New text.
        text: String,
    },
}

/// Caret & selection commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaretCommand {
    /// Place the caret.
    MoveTo(usize),
    /// Select `anchor..head`; the caret goes to `head`.
    Select {
        /// Fixed end.
        anchor: usize,
        /// Moving end, where the caret goes.
        head: usize,
    },
    /// Select the whole document.
    SelectAll,
    /// One character left, or to the start of the selection.
    Left,
    /// One character right, or to the end of the selection.
    Right,
    /// To the start of the previous word.
    WordLeft,
    /// To the end of the next word.
    WordRight,
    /// Extend the selection one word left.
    SelectWordLeft,
    /// Extend the selection one word right.
    SelectWordRight,
    /// To the start of a 1-based line.
    GotoLine(usize),
    /// Select the next (or previous) match of a query.
    Find {
        /// Search query.
        query: String,
        /// Search options; `None` uses [`DocumentSurface::search_options`].
        options: Option<SearchOptions>,
        /// Search forward from the caret.
        forward: bool,
    },
}

/// File commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCommand {
    /// Load a file, replacing the document.
    Open(PathBuf),
    /// Write the document to its file.
    Save,
    /// Write the document to a new file and adopt it.
    SaveAs(PathBuf),
}

/// Unified command enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Text editing commands
    Edit(EditCommand),
    /// Caret and selection commands
    Caret(CaretCommand),
    /// File commands
    File(FileCommand),
}

/// Command execution result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Success, no return value
    Success,
    /// Success, returns text
    Text(String),
    /// Undo/redo: whether anything was applied.
    Applied(bool),
    /// Find result: a match in char offsets (half-open).
    SearchMatch {
        /// Inclusive start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
    },
    /// Find result: no match found.
    SearchNotFound,
    /// Replace result: how many occurrences were replaced.
    ReplaceResult {
        /// Number of occurrences replaced.
        replaced: usize,
    },
}

#[derive(Debug, Error)]
/// Command error type
pub enum CommandError {
    #[error(transparent)]
    /// A buffer mutation was rejected.
    Edit(#[from] EditError),

    #[error(transparent)]
    /// Opening or saving failed.
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    /// The search query is invalid.
    Search(#[from] SearchError),

    #[error("line {0} does not exist")]
    /// A line number past the end of the document.
    InvalidLine(usize),
}

/// Text, styles, classification and caret. The edit log applies undo/redo through this.
#[derive(Debug, Clone)]
struct Document {
    buffer: TextBuffer,
    styles: StyleMap,
    highlighter: Highlighter,
    caret: usize,
    /// Fixed end of the selection; the caret is the moving end.
    anchor: Option<usize>,
    bracket: BracketMatcher,
    /// Text change since the last notification.
    pending: Option<TextDelta>,
}

impl Document {
    fn new(config: &EditorConfig) -> Self {
        Self {
            buffer: TextBuffer::new(),
            styles: StyleMap::new(0),
            highlighter: Highlighter::new(config),
            caret: 0,
            anchor: None,
            bracket: BracketMatcher::new(),
            pending: None,
        }
    }

    fn reset(&mut self, text: &str) {
        let old_len = self.buffer.len_chars();
        self.buffer.set_text(text);
        self.highlighter.recalculate(&self.buffer);
        self.highlighter.repaint_all(&self.buffer, &mut self.styles);
        self.caret = 0;
        self.anchor = None;
        self.note(TextDelta {
            offset: 0,
            removed: old_len,
            inserted: self.buffer.len_chars(),
        });
    }

    /// Replace `removed` characters at `offset` by `text`, then reclassify and repaint.
    fn splice(&mut self, offset: usize, removed: usize, text: &str) -> Result<(), EditError> {
        if removed > 0 {
            self.buffer.remove(offset, removed)?;
        }
        if !text.is_empty() {
            self.buffer.insert(offset, text)?;
        }

        let delta = TextDelta {
            offset,
            removed,
            inserted: text.chars().count(),
        };
        if delta.is_empty() {
            return Ok(());
        }
        self.styles.apply_delta(&delta);
        self.highlighter.recalculate_edit(&self.buffer, &delta);
        self.highlighter.repaint(
            &self.buffer,
            Range::new(offset, delta.inserted),
            &mut self.styles,
        );
        self.note(delta);
        Ok(())
    }

    fn note(&mut self, delta: TextDelta) {
        self.pending = Some(match self.pending.take() {
            Some(earlier) => earlier.compose(&delta),
            None => delta,
        });
    }

    fn selection(&self) -> Option<Range> {
        let anchor = self.anchor?;
        (anchor != self.caret)
            .then(|| Range::between(anchor.min(self.caret), anchor.max(self.caret)))
    }

    fn select(&mut self, anchor: usize, head: usize) {
        let len = self.buffer.len_chars();
        self.anchor = Some(anchor.min(len));
        self.caret = head.min(len);
    }

    fn rematch(&mut self) {
        self.bracket
            .highlight(&self.buffer, &self.highlighter, self.caret);
    }
}

impl EditTarget for Document {
    fn slice(&self, offset: usize, length: usize) -> Result<String, EditError> {
        self.buffer.slice(offset, length)
    }

    fn insert(&mut self, offset: usize, text: &str) -> Result<(), EditError> {
        self.splice(offset, 0, text)
    }

    fn remove(&mut self, offset: usize, length: usize) -> Result<(), EditError> {
        self.splice(offset, length, "")
    }

    fn caret(&self) -> usize {
        self.caret
    }

    fn set_caret(&mut self, caret: usize) {
        self.caret = caret.min(self.buffer.len_chars());
        self.anchor = None;
    }
}

/// The editing surface of one document.
pub struct DocumentSurface {
    config: Arc<EditorConfig>,
    doc: Document,
    log: EditLog,
    pairing: PairingEngine,
    clipboard: Box<dyn Clipboard + Send>,
    path: Option<PathBuf>,
    state: StateTracker,
    run_log: RunLog,
}

impl std::fmt::Debug for DocumentSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSurface")
            .field("len", &self.doc.buffer.len_chars())
            .field("caret", &self.doc.caret)
            .field("selection", &self.doc.selection())
            .field("path", &self.path)
            .field("version", &self.state.version())
            .finish_non_exhaustive()
    }
}

impl Default for DocumentSurface {
    fn default() -> Self {
        Self::new(Arc::new(EditorConfig::default()))
    }
}

impl DocumentSurface {
    /// An empty, untitled document.
    pub fn new(config: Arc<EditorConfig>) -> Self {
        let doc = Document::new(&config);
        Self {
            config,
            doc,
            log: EditLog::new(),
            pairing: PairingEngine::new(),
            clipboard: Box::new(MemoryClipboard::new()),
            path: None,
            state: StateTracker::new(),
            run_log: RunLog::new(),
        }
    }

    /// An untitled document holding `text`, with empty history.
    pub fn with_text(config: Arc<EditorConfig>, text: &str) -> Self {
        let mut surface = Self::new(config);
        surface.doc.reset(text);
        surface.doc.pending = None;
        surface.doc.rematch();
        surface
    }

    /// Use `clipboard` for cut, copy and paste.
    pub fn with_clipboard(mut self, clipboard: impl Clipboard + Send + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    /// Execute command
    pub fn execute(&mut self, command: Command) -> Result<CommandResult, CommandError> {
        match command {
            Command::Edit(command) => self.execute_edit(command),
            Command::Caret(command) => self.execute_caret(command),
            Command::File(command) => self.execute_file(command),
        }
    }

    fn execute_edit(&mut self, command: EditCommand) -> Result<CommandResult, CommandError> {
        match command {
            EditCommand::TypeChar(c) => self.type_char(c)?,
            EditCommand::Enter => self.enter()?,
            EditCommand::Tab => self.tab()?,
            EditCommand::ShiftTab => self.shift_tab()?,
            EditCommand::Backspace(unit) => self.backspace(unit)?,
            EditCommand::Delete(unit) => self.delete(unit)?,
            EditCommand::Copy => {
                return Ok(self
                    .copy()
                    .map_or(CommandResult::Success, CommandResult::Text));
            }
            EditCommand::Cut => {
                return Ok(self
                    .cut()?
                    .map_or(CommandResult::Success, CommandResult::Text));
            }
            EditCommand::Paste => self.paste()?,
            EditCommand::ReplaceSelection { text } => self.replace_selection(&text)?,
            EditCommand::ReplaceAll {
                query,
                replacement,
                ignore_case,
            } => {
                let ignore_case = ignore_case.unwrap_or(self.config.options.ignore_case);
                let replaced = self.replace_all(&query, &replacement, ignore_case)?;
                return Ok(CommandResult::ReplaceResult { replaced });
            }
            EditCommand::FormatIndentation => self.format_indentation()?,
            EditCommand::Undo => return Ok(CommandResult::Applied(self.undo()?)),
            EditCommand::Redo => return Ok(CommandResult::Applied(self.redo()?)),
            EditCommand::SetText { text } => self.set_text(&text),
        }
        Ok(CommandResult::Success)
    }

    fn execute_caret(&mut self, command: CaretCommand) -> Result<CommandResult, CommandError> {
        match command {
            CaretCommand::MoveTo(offset) => self.move_to(offset),
            CaretCommand::Select { anchor, head } => self.select(anchor, head),
            CaretCommand::SelectAll => self.select_all(),
            CaretCommand::Left => self.left(),
            CaretCommand::Right => self.right(),
            CaretCommand::WordLeft => self.word_left(),
            CaretCommand::WordRight => self.word_right(),
            CaretCommand::SelectWordLeft => self.select_word_left(),
            CaretCommand::SelectWordRight => self.select_word_right(),
            CaretCommand::GotoLine(line) => self.goto_line(line)?,
            CaretCommand::Find {
                query,
                options,
                forward,
            } => {
                let options = options.unwrap_or_else(|| self.search_options());
                return Ok(match self.find(&query, options, forward)? {
                    Some(m) => CommandResult::SearchMatch {
                        start: m.start,
                        end: m.end,
                    },
                    None => CommandResult::SearchNotFound,
                });
            }
        }
        Ok(CommandResult::Success)
    }

    fn execute_file(&mut self, command: FileCommand) -> Result<CommandResult, CommandError> {
        match command {
            FileCommand::Open(path) => self.open(path)?,
            FileCommand::Save => self.save()?,
            FileCommand::SaveAs(path) => self.save_as(path)?,
        }
        Ok(CommandResult::Success)
    }

    // ---- queries ----

    /// The configuration snapshot in use.
    pub fn config(&self) -> &Arc<EditorConfig> {
        &self.config
    }

    /// The whole text.
    pub fn text(&self) -> String {
        self.doc.buffer.text()
    }

    /// Number of characters.
    pub fn len_chars(&self) -> usize {
        self.doc.buffer.len_chars()
    }

    /// The text buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.doc.buffer
    }

    /// The classifier, for span queries.
    pub fn highlighter(&self) -> &Highlighter {
        &self.doc.highlighter
    }

    /// The undo history.
    pub fn edit_log(&self) -> &EditLog {
        &self.log
    }

    /// Caret offset.
    pub fn caret(&self) -> usize {
        self.doc.caret
    }

    /// 1-based line and 0-based display column of the caret, tabs expanded to the configured
    /// width.
    pub fn caret_position(&self) -> (usize, usize) {
        let caret = self.doc.caret;
        let buffer = &self.doc.buffer;
        (
            buffer.line_of(caret),
            buffer.display_column(caret, self.config.options.tab_width),
        )
    }

    /// The selected range, if any.
    pub fn selection(&self) -> Option<Range> {
        self.doc.selection()
    }

    /// The selected text, if any.
    pub fn selected_text(&self) -> Option<String> {
        let selection = self.doc.selection()?;
        self.doc
            .buffer
            .slice(selection.offset, selection.length)
            .ok()
    }

    /// Style of the character at `offset`, with the bracket-match overlay applied.
    pub fn style_at(&self, offset: usize) -> Option<StyleId> {
        if self
            .doc
            .bracket
            .active()
            .is_some_and(|pair| pair.open == offset || pair.close == offset)
        {
            return Some(BRACKET_MATCH_STYLE_ID);
        }
        self.doc.styles.get(offset)
    }

    /// Non-plain style runs of the stored classification (no bracket overlay).
    pub fn style_runs(&self) -> Vec<Interval> {
        self.doc.styles.runs()
    }

    /// Per-character styles of the stored classification.
    pub fn styles(&self) -> &StyleMap {
        &self.doc.styles
    }

    /// The bracket pair currently matched around the caret.
    pub fn matched_brackets(&self) -> Option<BracketPair> {
        self.doc.bracket.active()
    }

    /// Current state version.
    pub fn version(&self) -> u64 {
        self.state.version()
    }

    /// Subscribe to state change notifications
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&StateChange) + Send + 'static,
    {
        self.state.subscribe(callback);
    }

    /// A snapshot of document-level state.
    pub fn document_state(&self) -> DocumentState {
        DocumentState {
            char_count: self.doc.buffer.len_chars(),
            line_count: self.doc.buffer.line_count(),
            is_saved: self.is_saved(),
            version: self.state.version(),
            caret: self.doc.caret,
            selection: self.doc.selection(),
            can_undo: self.log.can_undo(),
            can_redo: self.log.can_redo(),
        }
    }

    // ---- configuration ----

    /// Adopt a new configuration snapshot: keyword classes and toggles are re-read and the whole
    /// document is repainted.
    pub fn update_config(&mut self, config: Arc<EditorConfig>) {
        self.config = config;
        self.doc.highlighter.configure(&self.config);
        self.doc
            .highlighter
            .repaint_all(&self.doc.buffer, &mut self.doc.styles);
        self.doc.rematch();
        tracing::debug!(highlight = self.config.options.highlight, "configuration updated");
        self.state.mark(StateChangeType::StyleChanged);
    }

    // ---- editing ----

    /// Replace the whole document, forgetting its history. The caret goes to the start.
    pub fn set_text(&mut self, text: &str) {
        self.doc.bracket.clear();
        self.doc.reset(text);
        self.log.clear();
        self.pairing = PairingEngine::new();
        self.after_edit();
    }

    /// Type `c` at the caret.
    ///
    /// With a selection, `c` replaces it. Otherwise the pairing rules decide between inserting
    /// `c`, inserting `c` with its closer, stepping over an identical closer, and replacing the
    /// auto-indent tab before a `}`.
    pub fn type_char(&mut self, c: char) -> Result<(), CommandError> {
        self.edit("type_char", |s| {
            let text = c.to_string();
            if let Some(selection) = s.doc.selection() {
                return s.record_replace(selection.offset, selection.length, &text, None);
            }

            let caret = s.doc.caret;
            let action = s.pairing.decide(
                c,
                caret,
                &s.doc.buffer,
                &s.doc.highlighter,
                &s.config.options,
            );
            match action {
                TypedAction::Insert => s.record_add(caret, &text, None)?,
                TypedAction::InsertPair(closer) => {
                    s.record_add(caret, &format!("{c}{closer}"), Some(caret + 1))?;
                    s.log.crack();
                }
                TypedAction::SkipOver => {
                    s.log.crack();
                    s.doc.set_caret(caret + 1);
                    s.state.mark(StateChangeType::CaretMoved);
                }
                TypedAction::ReplaceTab => s.record_replace(caret - 1, 1, &text, None)?,
            }
            Ok(())
        })
    }

    /// Insert a line break, indented like the current line.
    pub fn enter(&mut self) -> Result<(), CommandError> {
        self.edit("enter", |s| {
            s.log.crack();
            if let Some(selection) = s.doc.selection() {
                s.record_replace(selection.offset, selection.length, "\n", None)?;
            } else {
                let caret = s.doc.caret;
                let insertion = pairing::enter_insertion(&s.doc.buffer, caret, &s.config.options);
                s.record_add(caret, &insertion.text, Some(insertion.caret))?;
                if s.config.options.auto_tab {
                    s.pairing.note_enter();
                }
            }
            s.log.crack();
            Ok(())
        })
    }

    /// Tab: indent the selection, step over a pending closer, or insert a tab.
    pub fn tab(&mut self) -> Result<(), CommandError> {
        self.edit("tab", |s| {
            if let Some(selection) = s.doc.selection() {
                let old = s.doc.buffer.slice(selection.offset, selection.length)?;
                let indented = pairing::indent(&old);
                s.record_replace(selection.offset, selection.length, &indented, None)?;
                let end = selection.offset + indented.chars().count();
                s.doc.select(selection.offset, end);
                return Ok(());
            }

            let caret = s.doc.caret;
            match s.pairing.tab_skip(&s.doc.buffer, caret, &s.config.options) {
                Some(target) => {
                    s.log.crack();
                    s.doc.set_caret(target);
                    s.state.mark(StateChangeType::CaretMoved);
                }
                None => s.record_add(caret, "\t", None)?,
            }
            Ok(())
        })
    }

    /// Shift+Tab: unindent the selection by one tab per line, or insert a tab.
    pub fn shift_tab(&mut self) -> Result<(), CommandError> {
        self.edit("shift_tab", |s| {
            let Some(selection) = s.doc.selection() else {
                let caret = s.doc.caret;
                return s.record_add(caret, "\t", None);
            };

            let old = s.doc.buffer.slice(selection.offset, selection.length)?;
            let (start, unindented) = pairing::unindent(&s.doc.buffer, selection.offset, &old);
            s.record_replace(start, selection.end() - start, &unindented, None)?;
            s.doc.select(start, start + unindented.chars().count());
            Ok(())
        })
    }

    /// Remove the selection, or `unit` before the caret. Auto-inserted closers right after the
    /// caret go along with their removed openers.
    pub fn backspace(&mut self, unit: DeleteUnit) -> Result<(), CommandError> {
        self.edit("backspace", |s| {
            if let Some(selection) = s.doc.selection() {
                return s.record_remove(selection.offset, selection.length, false);
            }

            let caret = s.doc.caret;
            if caret == 0 {
                return Ok(());
            }
            let start = match unit {
                DeleteUnit::Char => caret - 1,
                DeleteUnit::Word => pairing::backspace_word_start(&s.doc.buffer, caret),
                DeleteUnit::Line => pairing::backspace_line_start(&s.doc.buffer, caret),
            };
            s.remove_closing_back(start, caret)
        })
    }

    /// Remove the selection, or `unit` after the caret.
    pub fn delete(&mut self, unit: DeleteUnit) -> Result<(), CommandError> {
        self.edit("delete", |s| {
            if let Some(selection) = s.doc.selection() {
                return s.record_remove(selection.offset, selection.length, false);
            }

            let caret = s.doc.caret;
            let len = s.doc.buffer.len_chars();
            if caret >= len {
                return Ok(());
            }
            let end = match unit {
                DeleteUnit::Word if caret + 1 < len => {
                    pairing::delete_word_end(&s.doc.buffer, caret)
                }
                DeleteUnit::Line if caret + 1 < len => {
                    pairing::delete_line_end(&s.doc.buffer, caret)
                }
                _ => caret + 1,
            };
            s.record_remove(caret, end - caret, false)
        })
    }

    /// Copy the selection to the clipboard. Returns the copied text.
    pub fn copy(&mut self) -> Option<String> {
        let text = self.selected_text()?;
        self.clipboard.set_text(&text);
        Some(text)
    }

    /// Copy the selection to the clipboard and remove it. Returns the cut text.
    pub fn cut(&mut self) -> Result<Option<String>, CommandError> {
        let Some(text) = self.copy() else {
            return Ok(None);
        };
        self.edit("cut", |s| {
            let Some(selection) = s.doc.selection() else {
                return Ok(());
            };
            s.log.crack();
            s.record_remove(selection.offset, selection.length, false)?;
            s.log.crack();
            Ok(())
        })?;
        Ok(Some(text))
    }

    /// Insert the clipboard text, replacing the selection. Nothing happens when the clipboard
    /// holds no text.
    pub fn paste(&mut self) -> Result<(), CommandError> {
        let Some(text) = self.clipboard.get_text() else {
            return Ok(());
        };
        self.replace_selection(&text)
    }

    /// Replace the selection with `text` (or insert it at the caret) as one undo step.
    pub fn replace_selection(&mut self, text: &str) -> Result<(), CommandError> {
        self.edit("replace_selection", |s| {
            s.log.crack();
            match s.doc.selection() {
                Some(selection) => {
                    s.record_replace(selection.offset, selection.length, text, None)?
                }
                None => {
                    let caret = s.doc.caret;
                    s.record_add(caret, text, None)?;
                }
            }
            s.log.crack();
            Ok(())
        })
    }

    /// Replace every non-overlapping occurrence of `query` with `replacement` (`\t` and `\n`
    /// expanded) as one undo step. Returns the number of replacements.
    pub fn replace_all(
        &mut self,
        query: &str,
        replacement: &str,
        ignore_case: bool,
    ) -> Result<usize, CommandError> {
        self.edit("replace_all", |s| {
            let text = s.doc.buffer.text();
            let matches = find_all(&text, query, SearchOptions::plain(ignore_case))?;
            if matches.is_empty() {
                return Ok(0);
            }

            let replacement = expand_escapes(replacement);
            let new_len = replacement.chars().count();
            let olds = matches
                .iter()
                .map(|m| s.doc.buffer.slice(m.start, m.len()))
                .collect::<Result<Vec<_>, _>>()?;

            // Back to front, so earlier offsets stay valid.
            let mut caret = s.doc.caret;
            for m in matches.iter().rev() {
                s.doc.splice(m.start, m.len(), &replacement)?;
                caret = map_caret(caret, m.start, m.len(), new_len);
            }
            s.doc.set_caret(caret);
            s.log
                .replace_all(matches.iter().map(|m| m.start).collect(), olds, &replacement);

            tracing::debug!(replaced = matches.len(), "replace all");
            Ok(matches.len())
        })
    }

    /// Re-indent the document by bracket depth as one undo step.
    pub fn format_indentation(&mut self) -> Result<(), CommandError> {
        self.edit("format_indentation", |s| {
            let formatted = pairing::format_indentation(&s.doc.buffer, &s.doc.highlighter);
            if formatted == s.doc.buffer.text() {
                return Ok(());
            }

            let caret = s.doc.caret.min(formatted.chars().count());
            let len = s.doc.buffer.len_chars();
            s.record_replace(0, len, &formatted, Some(caret))?;
            s.log.crack();
            Ok(())
        })
    }

    /// Undo the newest edit. `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, CommandError> {
        self.edit("undo", |s| {
            s.pairing.break_opening();
            Ok(s.log.undo(&mut s.doc)?)
        })
    }

    /// Redo the most recently undone edit. `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, CommandError> {
        self.edit("redo", |s| {
            s.pairing.break_opening();
            Ok(s.log.redo(&mut s.doc)?)
        })
    }

    // ---- caret ----

    /// Place the caret at `offset` (clamped), clearing the selection.
    pub fn move_to(&mut self, offset: usize) {
        self.doc.set_caret(offset);
        self.caret_moved(StateChangeType::CaretMoved);
    }

    /// Select `anchor..head`; the caret goes to `head`.
    pub fn select(&mut self, anchor: usize, head: usize) {
        self.doc.select(anchor, head);
        self.caret_moved(StateChangeType::SelectionChanged);
    }

    /// Select the whole document.
    pub fn select_all(&mut self) {
        let len = self.doc.buffer.len_chars();
        self.select(0, len);
    }

    /// One character left, or to the start of the selection.
    pub fn left(&mut self) {
        let target = match self.doc.selection() {
            Some(selection) => selection.offset,
            None => self.doc.caret.saturating_sub(1),
        };
        self.move_to(target);
    }

    /// One character right, or to the end of the selection.
    pub fn right(&mut self) {
        let target = match self.doc.selection() {
            Some(selection) => selection.end(),
            None => self.doc.caret + 1,
        };
        self.move_to(target);
    }

    /// To the start of the previous word.
    pub fn word_left(&mut self) {
        let target = pairing::word_left(&self.doc.buffer, self.doc.caret);
        self.move_to(target);
    }

    /// To the next delimiter after the current word.
    pub fn word_right(&mut self) {
        let target = pairing::word_right(&self.doc.buffer, self.doc.caret);
        self.move_to(target);
    }

    /// Move the selection's moving end one word left.
    pub fn select_word_left(&mut self) {
        let anchor = self.doc.anchor.unwrap_or(self.doc.caret);
        let head = pairing::word_left(&self.doc.buffer, self.doc.caret);
        self.select(anchor, head);
    }

    /// Move the selection's moving end one word right.
    pub fn select_word_right(&mut self) {
        let anchor = self.doc.anchor.unwrap_or(self.doc.caret);
        let head = pairing::word_right(&self.doc.buffer, self.doc.caret);
        self.select(anchor, head);
    }

    /// Move the caret to the start of 1-based `line`.
    pub fn goto_line(&mut self, line: usize) -> Result<(), CommandError> {
        let offset = self
            .doc
            .buffer
            .line_start(line)
            .ok_or(CommandError::InvalidLine(line))?;
        self.move_to(offset);
        Ok(())
    }

    /// Default options for a new search: plain text, honoring the configured `ignore_case`.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions::plain(self.config.options.ignore_case)
    }

    /// Select the next match of `query` after the caret (or the previous one before it),
    /// wrapping around the document.
    pub fn find(
        &mut self,
        query: &str,
        options: SearchOptions,
        forward: bool,
    ) -> Result<Option<SearchMatch>, CommandError> {
        let text = self.doc.buffer.text();
        let selection = self.doc.selection();
        let found = if forward {
            let from = selection.map_or(self.doc.caret, |s| s.end());
            find_next(&text, query, options, from)?
        } else {
            let before = selection.map_or(self.doc.caret, |s| s.offset);
            find_prev(&text, query, options, before)?
        };

        if let Some(m) = found {
            self.select(m.start, m.end);
        }
        Ok(found)
    }

    // ---- files ----

    /// The file backing the document.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the text matches the last open or save.
    pub fn is_saved(&self) -> bool {
        self.log.is_clean()
    }

    /// Whether the document has a file or any text.
    pub fn in_use(&self) -> bool {
        self.path.is_some() || !self.doc.buffer.is_empty()
    }

    /// Load `path` (UTF-8, one trailing newline dropped) and adopt it as the document's file.
    /// On failure the document is unchanged.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), CommandError> {
        let path = path.as_ref();
        let text = persistence::read_document(path)?;
        self.set_text(&text);
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Write the document to its file. A failed save leaves the document unsaved.
    pub fn save(&mut self) -> Result<(), CommandError> {
        let path = self.path.clone().ok_or(PersistenceError::NoPath)?;
        self.write_to(&path)
    }

    /// Write the document to `path` and adopt it as the document's file.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), CommandError> {
        let path = path.as_ref();
        self.write_to(path)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn write_to(&mut self, path: &Path) -> Result<(), CommandError> {
        persistence::write_document(path, &self.doc.buffer.text())?;
        self.log.mark_clean();
        self.state.mark(StateChangeType::Saved);
        Ok(())
    }

    // ---- launcher ----

    /// The text the launcher should compile: the document as it would be saved.
    pub fn text_for_launch(&self) -> String {
        persistence::normalize_for_save(&self.doc.buffer.text()).into_owned()
    }

    /// Output of the last run.
    pub fn run_log(&self) -> &RunLog {
        &self.run_log
    }

    /// Output of the last run, for the launcher to append to.
    pub fn run_log_mut(&mut self) -> &mut RunLog {
        &mut self.run_log
    }

    /// Move the caret to the start of the line a compiler error points at. Returns whether the
    /// caret moved: error jumping must be enabled, the error must be about this document and
    /// the line must exist.
    pub fn goto_error(&mut self, location: &ErrorLocation) -> bool {
        if !self.config.options.find_error_line || !location.refers_to(self.path.as_deref()) {
            return false;
        }
        match self.doc.buffer.line_start(location.line) {
            Some(offset) => {
                self.move_to(offset);
                true
            }
            None => {
                tracing::debug!(line = location.line, "error line is past the document");
                false
            }
        }
    }

    // ---- plumbing ----

    /// Run one edit: clear the bracket overlay, apply, then re-match and notify. Failures are
    /// logged and leave the document as it was.
    fn edit<T>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T, CommandError>,
    ) -> Result<T, CommandError> {
        self.doc.bracket.clear();
        let result = f(self);
        if let Err(err) = &result {
            tracing::warn!(
                operation,
                len = self.doc.buffer.len_chars(),
                caret = self.doc.caret,
                selection = ?self.doc.selection(),
                error = %err,
                "edit failed"
            );
        }
        self.after_edit();
        result
    }

    fn after_edit(&mut self) {
        self.doc.rematch();
        if let Some(delta) = self.doc.pending.take() {
            self.state
                .mark_with(StateChangeType::TextChanged, |change| {
                    change
                        .with_region(Range::new(delta.offset, delta.inserted))
                        .with_text_delta(delta)
                });
        }
    }

    fn caret_moved(&mut self, change_type: StateChangeType) {
        self.log.crack();
        self.pairing.break_opening();
        self.doc.rematch();
        self.state.mark(change_type);
    }

    fn record_add(
        &mut self,
        offset: usize,
        text: &str,
        caret: Option<usize>,
    ) -> Result<(), CommandError> {
        self.doc.splice(offset, 0, text)?;
        self.log.add(text, offset, caret);
        self.doc
            .set_caret(caret.unwrap_or(offset + text.chars().count()));
        Ok(())
    }

    fn record_remove(
        &mut self,
        offset: usize,
        length: usize,
        backward: bool,
    ) -> Result<(), CommandError> {
        if length == 0 {
            return Ok(());
        }
        let text = self.doc.buffer.slice(offset, length)?;
        self.doc.splice(offset, length, "")?;
        self.log.remove(&text, offset, backward);
        self.doc.set_caret(offset);
        Ok(())
    }

    fn record_replace(
        &mut self,
        offset: usize,
        length: usize,
        text: &str,
        caret: Option<usize>,
    ) -> Result<(), CommandError> {
        let old = self.doc.buffer.slice(offset, length)?;
        self.doc.splice(offset, length, text)?;
        self.log.replace(&old, text, offset, caret);
        self.doc
            .set_caret(caret.unwrap_or(offset + text.chars().count()));
        Ok(())
    }

    /// Backward removal of `start..end`, extended over the auto-inserted closers that belong
    /// to removed openers when no literal would be cut in half.
    fn remove_closing_back(&mut self, start: usize, end: usize) -> Result<(), CommandError> {
        let length = end - start;
        let extra = if self.config.options.insert_end_chars
            && self.doc.highlighter.should_remove(start, length)
        {
            pairing::cascade_len(&self.doc.buffer, start, end)
        } else {
            0
        };
        self.record_remove(start, length + extra, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::styles::{COMMENT_STYLE_ID, PLAIN_STYLE_ID, STRING_STYLE_ID};
    use pretty_assertions::assert_eq;

    fn surface(text: &str) -> DocumentSurface {
        DocumentSurface::with_text(Arc::new(EditorConfig::default()), text)
    }

    fn type_str(surface: &mut DocumentSurface, text: &str) {
        for c in text.chars() {
            surface.type_char(c).unwrap();
        }
    }

    #[test]
    fn test_typing_coalesces() {
        let mut s = surface("");
        type_str(&mut s, "int x;");
        assert_eq!(s.text(), "int x;");
        assert_eq!(s.edit_log().undo_depth(), 1);
        assert!(s.undo().unwrap());
        assert_eq!(s.text(), "");
    }

    #[test]
    fn test_pair_and_skip_over() {
        let mut s = surface("foo");
        s.move_to(3);
        s.type_char('(').unwrap();
        assert_eq!((s.text().as_str(), s.caret()), ("foo()", 4));
        s.type_char(')').unwrap();
        assert_eq!((s.text().as_str(), s.caret()), ("foo()", 5));
    }

    #[test]
    fn test_moving_the_caret_breaks_the_pair() {
        let mut s = surface("");
        s.type_char('(').unwrap();
        s.move_to(1);
        s.type_char(')').unwrap();
        assert_eq!(s.text(), "())");
    }

    #[test]
    fn test_typing_replaces_selection() {
        let mut s = surface("hello world");
        s.select(0, 5);
        s.type_char('J').unwrap();
        assert_eq!(s.text(), "J world");
        assert_eq!(s.caret(), 1);
        s.undo().unwrap();
        assert_eq!(s.text(), "hello world");
    }

    #[test]
    fn test_backspace_removes_auto_closer() {
        let mut s = surface("");
        type_str(&mut s, "f(");
        assert_eq!(s.text(), "f()");
        s.backspace(DeleteUnit::Char).unwrap();
        assert_eq!(s.text(), "f");

        // Not from inside a string literal.
        let mut s = surface("\"()");
        s.move_to(2);
        s.backspace(DeleteUnit::Char).unwrap();
        assert_eq!(s.text(), "\")");
    }

    #[test]
    fn test_backspace_and_delete_units() {
        let mut s = surface("foo bar baz");
        s.move_to(11);
        s.backspace(DeleteUnit::Word).unwrap();
        assert_eq!(s.text(), "foo bar ");
        s.move_to(0);
        s.delete(DeleteUnit::Word).unwrap();
        assert_eq!(s.text(), " bar ");

        let mut s = surface("one\ntwo");
        s.move_to(7);
        s.backspace(DeleteUnit::Line).unwrap();
        assert_eq!(s.text(), "one\n");

        let mut s = surface("one\ntwo");
        s.move_to(0);
        s.delete(DeleteUnit::Line).unwrap();
        assert_eq!(s.text(), "\ntwo");
    }

    #[test]
    fn test_delete_coalesces_forward() {
        let mut s = surface("abcdef");
        s.move_to(1);
        s.delete(DeleteUnit::Char).unwrap();
        s.delete(DeleteUnit::Char).unwrap();
        assert_eq!(s.text(), "adef");
        assert_eq!(s.edit_log().undo_depth(), 1);
        s.undo().unwrap();
        assert_eq!((s.text().as_str(), s.caret()), ("abcdef", 1));
    }

    #[test]
    fn test_enter_between_braces() {
        let mut s = surface("void f() ");
        s.move_to(9);
        s.type_char('{').unwrap();
        s.enter().unwrap();
        assert_eq!(s.text(), "void f() {\n\t\n}");
        assert_eq!(s.caret(), 12);
    }

    #[test]
    fn test_closing_brace_replaces_auto_tab() {
        let mut s = surface("if (x) {");
        s.move_to(8);
        s.enter().unwrap();
        assert_eq!(s.text(), "if (x) {\n\t");
        s.type_char('}').unwrap();
        assert_eq!(s.text(), "if (x) {\n}");
    }

    #[test]
    fn test_tab_and_shift_tab_selection() {
        let mut s = surface("a\nb\n");
        s.select(0, 3);
        s.tab().unwrap();
        assert_eq!(s.text(), "\ta\n\tb\n");
        assert_eq!(s.selection(), Some(Range::new(0, 5)));

        s.shift_tab().unwrap();
        assert_eq!(s.text(), "a\nb\n");
        assert_eq!(s.selection(), Some(Range::new(0, 3)));

        s.undo().unwrap();
        assert_eq!(s.text(), "\ta\n\tb\n");
    }

    #[test]
    fn test_caret_position_uses_tab_width() {
        let mut s = surface("void f() {\n\tx = 1;\n}");
        s.move_to(13);
        assert_eq!(s.caret_position(), (2, 9));

        let mut narrow = EditorConfig::default();
        narrow.options.tab_width = 4;
        s.update_config(Arc::new(narrow));
        assert_eq!(s.caret_position(), (2, 5));
    }

    #[test]
    fn test_tab_skips_closer() {
        let mut s = surface("");
        type_str(&mut s, "f(x");
        s.tab().unwrap();
        assert_eq!((s.text().as_str(), s.caret()), ("f(x)", 4));
        s.tab().unwrap();
        assert_eq!(s.text(), "f(x)\t");
    }

    #[test]
    fn test_clipboard() {
        let mut s = surface("abc def").with_clipboard(MemoryClipboard::new());
        assert_eq!(s.copy(), None);
        s.paste().unwrap();
        assert_eq!(s.text(), "abc def");

        s.select(0, 4);
        assert_eq!(s.cut().unwrap().as_deref(), Some("abc "));
        assert_eq!(s.text(), "def");
        s.move_to(3);
        s.paste().unwrap();
        assert_eq!(s.text(), "defabc ");
        s.undo().unwrap();
        s.undo().unwrap();
        assert_eq!(s.text(), "abc def");
    }

    #[test]
    fn test_replace_all_and_caret() {
        let mut s = surface("a.b a.b");
        s.move_to(7);
        assert_eq!(s.replace_all("A.B", "x\\ty", true).unwrap(), 2);
        assert_eq!(s.text(), "x\ty x\ty");
        assert_eq!(s.caret(), 7);
        assert_eq!(s.replace_all("zzz", "y", false).unwrap(), 0);
        s.undo().unwrap();
        assert_eq!(s.text(), "a.b a.b");
    }

    #[test]
    fn test_find_selects_and_wraps() {
        let mut s = surface("foo bar foo");
        let options = SearchOptions::default();
        assert_eq!(
            s.find("foo", options, true).unwrap(),
            Some(SearchMatch { start: 0, end: 3 })
        );
        assert_eq!(
            s.find("foo", options, true).unwrap(),
            Some(SearchMatch { start: 8, end: 11 })
        );
        assert_eq!(s.selection(), Some(Range::new(8, 3)));
        assert_eq!(
            s.find("foo", options, true).unwrap(),
            Some(SearchMatch { start: 0, end: 3 })
        );
        assert_eq!(s.find("nope", options, false).unwrap(), None);
    }

    #[test]
    fn test_styles_follow_edits() {
        let mut s = surface("x");
        s.move_to(1);
        type_str(&mut s, " // note");
        assert_eq!(s.style_at(0), Some(PLAIN_STYLE_ID));
        assert_eq!(s.style_at(2), Some(COMMENT_STYLE_ID));

        s.move_to(0);
        s.type_char('"').unwrap();
        assert_eq!(s.text(), "\"\"x // note");
        assert_eq!(s.style_at(0), Some(STRING_STYLE_ID));
    }

    #[test]
    fn test_bracket_overlay() {
        let mut s = surface("f(a)");
        s.move_to(1);
        assert_eq!(s.matched_brackets(), Some(BracketPair { open: 1, close: 3 }));
        assert_eq!(s.style_at(3), Some(BRACKET_MATCH_STYLE_ID));
        assert!(s.style_runs().iter().all(|r| r.style_id != BRACKET_MATCH_STYLE_ID));
        s.move_to(0);
        assert_eq!(s.matched_brackets(), None);
    }

    #[test]
    fn test_update_config_disables_highlighting() {
        let mut s = surface("\"s\" (x)");
        s.move_to(4);
        assert!(!s.style_runs().is_empty());

        let mut config = EditorConfig::default();
        config.options.highlight = false;
        s.update_config(Arc::new(config));
        assert!(s.style_runs().is_empty());
        assert_eq!(s.matched_brackets(), None);
        assert_eq!(s.highlighter().strings(), vec![Range::new(0, 3)]);
    }

    #[test]
    fn test_goto_line_and_error() {
        let mut s = surface("a\nb\nc");
        s.goto_line(3).unwrap();
        assert_eq!(s.caret(), 4);
        assert!(matches!(s.goto_line(9), Err(CommandError::InvalidLine(9))));

        let location = ErrorLocation::parse("sketch.pde:2:1: error").unwrap();
        assert!(s.goto_error(&location));
        assert_eq!(s.caret(), 2);
        let past = ErrorLocation::parse("sketch.pde:7:1: error").unwrap();
        assert!(!s.goto_error(&past));
    }

    #[test]
    fn test_format_indentation_is_one_step() {
        let mut s = surface("void f() {\nx();\n}");
        s.move_to(100);
        s.format_indentation().unwrap();
        assert_eq!(s.text(), "void f() {\n\tx();\n}");
        assert_eq!(s.caret(), 17);
        s.undo().unwrap();
        assert_eq!(s.text(), "void f() {\nx();\n}");
    }

    #[test]
    fn test_execute_dispatch() {
        let mut s = surface("abc");
        assert_eq!(
            s.execute(Command::Caret(CaretCommand::SelectAll)).unwrap(),
            CommandResult::Success
        );
        assert_eq!(
            s.execute(Command::Edit(EditCommand::Copy)).unwrap(),
            CommandResult::Text("abc".into())
        );
        assert_eq!(
            s.execute(Command::Edit(EditCommand::Undo)).unwrap(),
            CommandResult::Applied(false)
        );
        assert!(matches!(
            s.execute(Command::File(FileCommand::Save)),
            Err(CommandError::Persistence(PersistenceError::NoPath))
        ));
    }
}
