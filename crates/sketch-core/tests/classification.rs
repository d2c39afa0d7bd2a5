use std::sync::Arc;

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sketch_core::{
    COMMENT_STYLE_ID, DocumentSurface, EditorConfig, ESCAPE_STYLE_ID, NUMBER_STYLE_ID,
    PLAIN_STYLE_ID, Range, STRING_STYLE_ID, SpanKind,
};
use sketch_core::styles::keyword_style_id;
use sketch_lang::KeywordCategory;

fn config() -> Arc<EditorConfig> {
    Arc::new(EditorConfig::default())
}

fn surface(text: &str) -> DocumentSurface {
    DocumentSurface::with_text(config(), text)
}

/// The incrementally maintained classification equals a from-scratch one.
fn assert_converged(s: &DocumentSurface, context: &str) {
    let fresh = surface(&s.text());
    for kind in SpanKind::ALL {
        assert_eq!(
            s.highlighter().spans(kind),
            fresh.highlighter().spans(kind),
            "{kind:?} spans after {context}: {:?}",
            s.text()
        );
    }
    assert_eq!(
        s.styles().as_slice(),
        fresh.styles().as_slice(),
        "styles after {context}: {:?}",
        s.text()
    );
}

#[test]
fn test_char_literal_validation() {
    let s = surface("'a' '\\n' '\\u00FF' 'ab'");
    assert_eq!(
        s.highlighter().chars(),
        vec![Range::new(0, 3), Range::new(4, 4), Range::new(9, 8)]
    );
}

#[test]
fn test_literal_styles() {
    let s = surface("x = \"a\\tb\"; // 12\nfloat f = -1.5e3f;");
    assert_eq!(s.style_at(0), Some(PLAIN_STYLE_ID));
    assert_eq!(s.style_at(4), Some(STRING_STYLE_ID));
    assert_eq!(s.style_at(6), Some(ESCAPE_STYLE_ID));
    assert_eq!(s.style_at(7), Some(ESCAPE_STYLE_ID));
    assert_eq!(s.style_at(8), Some(STRING_STYLE_ID));
    // Numbers inside comments stay comments.
    assert_eq!(s.style_at(15), Some(COMMENT_STYLE_ID));
    assert_eq!(s.style_at(29), Some(NUMBER_STYLE_ID));
}

#[test]
fn test_opening_a_block_comment_recolors_the_rest() {
    let mut s = surface("int a;\nint b;\nint c;");
    s.move_to(0);
    s.type_char('/').unwrap();
    s.type_char('*').unwrap();
    assert!((0..s.len_chars()).all(|i| s.style_at(i) == Some(COMMENT_STYLE_ID)));
    assert_converged(&s, "opening a comment");

    s.move_to(9);
    s.type_char('*').unwrap();
    s.type_char('/').unwrap();
    assert_eq!(s.text(), "/*int a;\n*/int b;\nint c;");
    assert_eq!(
        s.style_at(11),
        Some(keyword_style_id(KeywordCategory::Primitive))
    );
    assert_converged(&s, "closing a comment");

    s.undo().unwrap();
    assert_converged(&s, "undoing the close");
}

#[test]
fn test_unterminated_string_ends_at_line_break() {
    let mut s = surface("a = 1;\nb = 2;");
    s.move_to(4);
    s.replace_selection("\"").unwrap();
    assert_eq!(s.style_at(5), Some(STRING_STYLE_ID));
    assert_eq!(s.style_at(12), Some(NUMBER_STYLE_ID));
    assert_converged(&s, "an unterminated string");
}

#[test]
fn test_random_edits_converge() {
    const SNIPPETS: &[&str] = &[
        "\"", "'", "/*", "*/", "//", "\n", "\\", "x", "12", "#ff", "int ", "void f(", ")", "{",
        "}", "'a'", "\"s\"", " ",
    ];
    let base = "void setup() {\n\tsize(200, 200); // canvas\n\tString s = \"a/*b\";\n}\n\
                /* block\n comment */\nint x = 0x1F + 'c';\n";

    for seed in 0..40 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut s = surface(base);

        for step in 0..30 {
            let len = s.len_chars();
            let at = rng.gen_range(0..=len);
            if rng.gen_bool(0.7) {
                let snippet = SNIPPETS[rng.gen_range(0..SNIPPETS.len())];
                s.move_to(at);
                s.replace_selection(snippet).unwrap();
            } else {
                let end = (at + rng.gen_range(1..6)).min(len);
                s.select(at, end);
                s.replace_selection("").unwrap();
            }
            assert_converged(&s, &format!("seed {seed} step {step}"));
        }

        while s.undo().unwrap() {
            assert_converged(&s, &format!("seed {seed} undo"));
        }
        assert_eq!(s.text(), base);
    }
}

#[test]
fn test_disabled_highlighting_paints_plain() {
    let mut plain = EditorConfig::default();
    plain.options.highlight = false;
    let mut s = DocumentSurface::with_text(Arc::new(plain), "\"text\" // c");
    assert!(s.style_runs().is_empty());
    assert_eq!(s.highlighter().strings(), vec![Range::new(0, 6)]);

    s.update_config(config());
    assert_eq!(s.style_at(1), Some(STRING_STYLE_ID));
}
