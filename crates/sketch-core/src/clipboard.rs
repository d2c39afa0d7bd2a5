//! Clipboard access for cut, copy and paste.
//!
//! The host provides the real system clipboard; [`MemoryClipboard`] keeps text in-process for
//! tests and headless use.

/// A source and sink of clipboard text.
pub trait Clipboard {
    /// The clipboard text, or `None` when nothing textual is available.
    fn get_text(&mut self) -> Option<String>;

    /// Replace the clipboard contents.
    fn set_text(&mut self, text: &str);
}

/// An in-process clipboard.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl MemoryClipboard {
    /// An empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard already holding `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn get_text(&mut self) -> Option<String> {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text = Some(text.to_string());
    }
}
