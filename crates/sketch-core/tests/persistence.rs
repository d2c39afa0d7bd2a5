use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sketch_core::{
    CommandError, DocumentSurface, EditorConfig, ErrorLocation, PersistenceError,
};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("sketch-core-it-{}-{name}", std::process::id()))
}

#[test]
fn test_open_edit_save_round_trip() {
    let path = temp_path("round_trip.pde");
    fs::write(&path, "void setup() {\n}\n").unwrap();

    let mut s = DocumentSurface::default();
    s.open(&path).unwrap();
    assert_eq!(s.text(), "void setup() {\n}");
    assert_eq!(s.path(), Some(path.as_path()));
    assert!(s.is_saved());
    assert!(s.in_use());

    s.move_to(s.len_chars());
    s.type_char(';').unwrap();
    assert!(!s.is_saved());
    s.undo().unwrap();
    assert!(s.is_saved());

    s.type_char(';').unwrap();
    s.save().unwrap();
    assert!(s.is_saved());
    assert_eq!(fs::read_to_string(&path).unwrap(), "void setup() {\n};\n");

    let _ = fs::remove_file(&path);
}

#[test]
fn test_empty_document_saves_as_single_newline() {
    let path = temp_path("empty.pde");
    let mut s = DocumentSurface::default();
    assert!(!s.in_use());
    assert!(matches!(
        s.save(),
        Err(CommandError::Persistence(PersistenceError::NoPath))
    ));

    s.save_as(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "\n");
    assert_eq!(s.path(), Some(path.as_path()));

    let mut reopened = DocumentSurface::default();
    reopened.open(&path).unwrap();
    assert_eq!(reopened.text(), "");

    let _ = fs::remove_file(&path);
}

#[test]
fn test_failed_open_keeps_document() {
    let mut s = DocumentSurface::with_text(Arc::new(EditorConfig::default()), "keep");
    let err = s.open(temp_path("does-not-exist.pde")).unwrap_err();
    assert!(matches!(
        err,
        CommandError::Persistence(PersistenceError::NotReadable { .. })
    ));
    assert_eq!(s.text(), "keep");
    assert_eq!(s.path(), None);
}

#[test]
fn test_failed_save_stays_unsaved() {
    let dir = temp_path("dir-target");
    fs::create_dir_all(&dir).unwrap();

    let mut s = DocumentSurface::default();
    s.type_char('x').unwrap();
    assert!(s.save_as(&dir).is_err());
    assert!(!s.is_saved());
    assert_eq!(s.path(), None);

    let _ = fs::remove_dir(&dir);
}

#[test]
fn test_launch_text_and_error_jump() {
    let path = temp_path("sketch.pde");
    fs::write(&path, "void draw() {\n\tellipse(50, 50);\n}").unwrap();

    let mut s = DocumentSurface::default();
    s.open(&path).unwrap();
    assert_eq!(s.text_for_launch(), "void draw() {\n\tellipse(50, 50);\n}\n");

    let name = path.file_name().unwrap().to_string_lossy();
    let location = ErrorLocation::parse(&format!("{name}:2:10: missing argument")).unwrap();
    assert!(s.goto_error(&location));
    assert_eq!(s.caret(), 14);

    let other = ErrorLocation::parse("Other.pde:2:1: error").unwrap();
    s.move_to(0);
    assert!(!s.goto_error(&other));
    assert_eq!(s.caret(), 0);

    s.run_log_mut().push_line("Could not run the sketch.");
    s.run_log_mut().push_line("done");
    assert_eq!(s.run_log().lines(), ["done"]);

    let mut config = EditorConfig::default();
    config.options.find_error_line = false;
    s.update_config(Arc::new(config));
    assert!(!s.goto_error(&location));

    let _ = fs::remove_file(&path);
}
