//! Error types shared across the engine.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// A buffer mutation or query was rejected. Nothing was changed.
pub enum EditError {
    #[error(
        "{operation}: range {offset}+{length} is outside the buffer (length {buffer_len})"
    )]
    /// The offsets involved fall outside `0..=buffer_len`.
    OutOfBounds {
        /// The operation that was attempted.
        operation: &'static str,
        /// Start of the rejected range.
        offset: usize,
        /// Length of the rejected range.
        length: usize,
        /// Buffer length at the time of the call.
        buffer_len: usize,
    },

    #[error("{operation}: expected {expected:?} at {offset}, found {found:?}")]
    /// Recorded text no longer matches the buffer (the undo log is out of sync).
    TextMismatch {
        /// The operation that was attempted.
        operation: &'static str,
        /// Where the text was expected.
        offset: usize,
        /// The recorded text.
        expected: String,
        /// What the buffer holds instead.
        found: String,
    },
}

#[derive(Debug, Error)]
/// Opening or saving a document failed.
pub enum PersistenceError {
    #[error("'{}' could not be read: {source}", path.display())]
    /// The file does not exist or is not readable.
    NotReadable {
        /// The file that was being opened.
        path: PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    #[error("'{}' is not valid UTF-8", path.display())]
    /// The file was read but is not UTF-8 text.
    InvalidEncoding {
        /// The file that was being opened.
        path: PathBuf,
    },

    #[error("'{}' could not be written: {source}", path.display())]
    /// The file could not be created or written.
    NotWritable {
        /// The file that was being saved.
        path: PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    #[error("the document has no file yet; use save-as")]
    /// `save` was requested for a document that was never opened or saved.
    NoPath,
}
