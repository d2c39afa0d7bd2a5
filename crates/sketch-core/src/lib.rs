#![warn(missing_docs)]
//! Sketch Core - Headless Editing Engine for Processing-style Sketches
//!
//! # Overview
//!
//! `sketch-core` is the editing kernel behind a sketch editor. It owns a document's text and
//! keeps everything derived from it current as the user types: the lexical classification
//! (strings, character literals, comments), per-character styles, bracket matching, and an undo
//! history that groups keystrokes into sensible steps. Rendering, windows and the compiler
//! launcher live outside; they talk to a [`DocumentSurface`].
//!
//! # Core Features
//!
//! - **Incremental Classification**: re-scans only until the classification rejoins the
//!   previous one, and repaints a minimal window
//! - **Coalescing Undo Log**: typing a word, a run of backspaces or a run of deletes is one step
//! - **Delimiter Pairing**: auto-inserted closers, skip-over, cascading removal, auto-indent
//! - **Bracket Matching**: ignores brackets inside literals and comments
//! - **State Tracking**: version number mechanism and change notifications
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Command Interface & State Tracking         │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Pairing, Brackets, Search, Edit Log        │  ← Editing Rules
//! ├─────────────────────────────────────────────┤
//! │  Highlighter (spans) + Style Map (paint)    │  ← Classification
//! ├─────────────────────────────────────────────┤
//! │  Text Buffer (Rope-based)                   │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use sketch_core::{DocumentSurface, STRING_STYLE_ID};
//!
//! let mut surface = DocumentSurface::default();
//! for c in "println(\"hi".chars() {
//!     surface.type_char(c).unwrap();
//! }
//! // Both the parenthesis and the quote were closed automatically.
//! assert_eq!(surface.text(), "println(\"hi\")");
//! assert_eq!(surface.style_at(9), Some(STRING_STYLE_ID));
//!
//! // Typing inside the new string literal is its own undo step.
//! surface.undo().unwrap();
//! assert_eq!(surface.text(), "println(\"\")");
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - Rope-backed text storage
//! - [`highlight`] - Lexical classification and painting
//! - [`styles`] - Style ids and the per-character style map
//! - [`edit_log`] - Undo/redo history with coalescing
//! - [`pairing`] - Auto-pairing, word units and indentation rules
//! - [`bracket`] - Bracket matching
//! - [`search`] - Find and replace
//! - [`commands`] - The document surface and its command interface
//! - [`state`] - Change notification
//! - [`persistence`] - Reading and writing sketch files
//! - [`launcher`] - Run output and compiler error locations

pub mod attribute;
pub mod bracket;
pub mod buffer;
pub mod clipboard;
pub mod commands;
pub mod delta;
pub mod edit_log;
pub mod error;
pub mod highlight;
pub mod launcher;
pub mod pairing;
pub mod persistence;
pub mod range;
pub mod search;
pub mod state;
pub mod styles;

pub use bracket::{BracketMatcher, BracketPair};
pub use buffer::TextBuffer;
pub use clipboard::{Clipboard, MemoryClipboard};
pub use commands::{
    CaretCommand, Command, CommandError, CommandResult, DeleteUnit, DocumentSurface,
    EditCommand, FileCommand,
};
pub use delta::TextDelta;
pub use edit_log::{EditLog, EditRecord, EditTarget};
pub use error::{EditError, PersistenceError};
pub use highlight::{Highlighter, SpanKind};
pub use launcher::{ErrorLocation, RunLog};
pub use pairing::{PairingEngine, TypedAction};
pub use range::Range;
pub use search::{SearchError, SearchMatch, SearchOptions};
pub use state::{DocumentState, StateChange, StateChangeCallback, StateChangeType, StateTracker};
pub use styles::{
    BRACKET_MATCH_STYLE_ID, CHAR_STYLE_ID, COMMENT_STYLE_ID, ESCAPE_STYLE_ID, Interval,
    NUMBER_STYLE_ID, PLAIN_STYLE_ID, STRING_STYLE_ID, StyleId, StyleMap,
};

pub use sketch_lang::{EditorConfig, EditorOptions};
