//! Change notification and state snapshots.
//!
//! Every observable change to a [`DocumentSurface`](crate::DocumentSurface) bumps a version
//! number and is reported to subscribers as a [`StateChange`]. Frontends poll
//! [`StateTracker::has_changed_since`] or subscribe with a callback.
//!
//! # Example
//!
//! ```rust
//! use sketch_core::{DocumentSurface, StateChangeType};
//! use std::sync::{Arc, Mutex};
//!
//! let mut surface = DocumentSurface::default();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! surface.subscribe(move |change| sink.lock().unwrap().push(change.change_type));
//!
//! surface.type_char('x').unwrap();
//! assert_eq!(seen.lock().unwrap()[0], StateChangeType::TextChanged);
//! ```

use crate::delta::TextDelta;
use crate::range::Range;

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateChangeType {
    /// The text was edited (typing, undo, replace, open...).
    TextChanged,
    /// The caret moved without a text change.
    CaretMoved,
    /// The selection changed without a text change.
    SelectionChanged,
    /// Styles were repainted without a text change (for example after a configuration update).
    StyleChanged,
    /// The document was saved.
    Saved,
}

/// One change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// Change type
    pub change_type: StateChangeType,
    /// Version before the change
    pub old_version: u64,
    /// Version after the change
    pub new_version: u64,
    /// Affected character range, if known
    pub affected_region: Option<Range>,
    /// The text edit, for text changes
    pub text_delta: Option<TextDelta>,
}

impl StateChange {
    /// A change record without a region or delta.
    pub fn new(change_type: StateChangeType, old_version: u64, new_version: u64) -> Self {
        Self {
            change_type,
            old_version,
            new_version,
            affected_region: None,
            text_delta: None,
        }
    }

    /// Attach the affected character range.
    pub fn with_region(mut self, region: Range) -> Self {
        self.affected_region = Some(region);
        self
    }

    /// Attach the text edit.
    pub fn with_text_delta(mut self, delta: TextDelta) -> Self {
        self.text_delta = Some(delta);
        self
    }
}

/// State change callback function type
pub type StateChangeCallback = Box<dyn FnMut(&StateChange) + Send>;

/// Version counter plus subscribers.
#[derive(Default)]
pub struct StateTracker {
    version: u64,
    callbacks: Vec<StateChangeCallback>,
}

impl std::fmt::Debug for StateTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateTracker")
            .field("version", &self.version)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl StateTracker {
    /// Version 0, no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current version. Starts at 0 and only grows.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Check if state has changed since a version
    pub fn has_changed_since(&self, version: u64) -> bool {
        self.version > version
    }

    /// Subscribe to state change notifications
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&StateChange) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Bump the version and notify subscribers.
    pub fn mark(&mut self, change_type: StateChangeType) {
        self.mark_with(change_type, |change| change);
    }

    /// Bump the version and notify subscribers with a change record refined by `build`.
    pub fn mark_with(
        &mut self,
        change_type: StateChangeType,
        build: impl FnOnce(StateChange) -> StateChange,
    ) {
        let old_version = self.version;
        self.version += 1;
        let change = build(StateChange::new(change_type, old_version, self.version));
        for callback in &mut self.callbacks {
            callback(&change);
        }
    }
}

/// A snapshot of document-level state for frontends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentState {
    /// Number of characters.
    pub char_count: usize,
    /// Number of lines.
    pub line_count: usize,
    /// Whether the text matches the last save (or open).
    pub is_saved: bool,
    /// State version.
    pub version: u64,
    /// Caret offset.
    pub caret: usize,
    /// Selected range, if any.
    pub selection: Option<Range>,
    /// Whether undo is available.
    pub can_undo: bool,
    /// Whether redo is available.
    pub can_redo: bool,
}
