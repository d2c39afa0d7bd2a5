//! Reading and writing sketch files.
//!
//! Files on disk always end with a newline; the in-editor text does not carry it. Opening strips
//! one trailing `\n` and saving adds it back when missing, so open/save round-trips exactly.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use crate::error::PersistenceError;

/// Read a UTF-8 document, dropping one trailing newline.
pub fn read_document(path: &Path) -> Result<String, PersistenceError> {
    let bytes = fs::read(path).map_err(|source| PersistenceError::NotReadable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut text = String::from_utf8(bytes).map_err(|_| PersistenceError::InvalidEncoding {
        path: path.to_path_buf(),
    })?;

    if text.ends_with('\n') {
        text.pop();
    }
    tracing::info!(path = %path.display(), chars = text.chars().count(), "opened document");
    Ok(text)
}

/// `text` as written to disk: ending in a newline. An empty document is a single `\n`.
pub fn normalize_for_save(text: &str) -> Cow<'_, str> {
    if text.ends_with('\n') {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("{text}\n"))
    }
}

/// Write `text`, normalized, to `path`.
pub fn write_document(path: &Path, text: &str) -> Result<(), PersistenceError> {
    fs::write(path, normalize_for_save(text).as_bytes()).map_err(|source| {
        tracing::warn!(path = %path.display(), error = %source, "save failed");
        PersistenceError::NotWritable {
            path: path.to_path_buf(),
            source,
        }
    })?;
    tracing::info!(path = %path.display(), "saved document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "sketch-core-persistence-{}-{name}",
            std::process::id()
        ))
    }

    #[test]
    fn test_normalize_for_save() {
        assert_eq!(normalize_for_save(""), "\n");
        assert_eq!(normalize_for_save("a"), "a\n");
        assert_eq!(normalize_for_save("a\n"), "a\n");
        assert_eq!(normalize_for_save("a\n\n"), "a\n\n");
    }

    #[test]
    fn test_round_trip() {
        let path = temp_path("round-trip.pde");
        for text in ["", "void setup() {\n}", "x\n\n"] {
            write_document(&path, text).unwrap();
            assert_eq!(read_document(&path).unwrap(), text);
        }
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_read_errors() {
        let missing = temp_path("missing.pde");
        assert!(matches!(
            read_document(&missing),
            Err(PersistenceError::NotReadable { .. })
        ));

        let binary = temp_path("binary.pde");
        fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            read_document(&binary),
            Err(PersistenceError::InvalidEncoding { .. })
        ));
        let _ = fs::remove_file(&binary);
    }

    #[test]
    fn test_write_error() {
        let dir = temp_path("not-a-file");
        fs::create_dir_all(&dir).unwrap();
        assert!(matches!(
            write_document(&dir, "x"),
            Err(PersistenceError::NotWritable { .. })
        ));
        let _ = fs::remove_dir(&dir);
    }
}
