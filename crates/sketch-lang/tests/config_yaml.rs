use pretty_assertions::assert_eq;
use sketch_lang::{
    ConfigError, EditorConfig, EditorOptions, KeywordCategory, Rgb, TextStyle, Theme,
};

#[test]
fn test_empty_document_yields_defaults() {
    let config = EditorConfig::from_yaml_str("{}").unwrap();
    assert_eq!(config, EditorConfig::default());
    assert_eq!(config.options.tab_width, 8);
    assert_eq!(config.keywords.len(), KeywordCategory::ALL.len());
}

#[test]
fn test_partial_options_keep_remaining_defaults() {
    let config = EditorConfig::from_yaml_str(
        "options:\n  insert_end_chars: false\n  tab_width: 4\n",
    )
    .unwrap();
    assert_eq!(
        config.options,
        EditorOptions {
            insert_end_chars: false,
            tab_width: 4,
            ..EditorOptions::default()
        }
    );
}

#[test]
fn test_theme_colors_parse_from_hex() {
    let config = EditorConfig::from_yaml_str(
        "theme:\n  string:\n    color: '#102030'\n    bold: true\n",
    )
    .unwrap();
    assert_eq!(
        config.theme.string,
        TextStyle::new(Rgb::new(0x10, 0x20, 0x30), true)
    );
    assert_eq!(config.theme.comment, Theme::default().comment);
}

#[test]
fn test_keyword_words_are_sorted_on_load() {
    let yaml = r##"
keywords:
  - category: flow
    words: [while, if, else, if]
    style:
      color: "#ffffff"
      bold: true
"##;
    let config = EditorConfig::from_yaml_str(yaml).unwrap();
    let flow = config.keyword_class(KeywordCategory::Flow).unwrap();
    assert_eq!(flow.words(), &["else", "if", "while"]);
    assert!(config.keyword_class(KeywordCategory::Access).is_none());
}

#[test]
fn test_invalid_color_is_reported() {
    let err = EditorConfig::from_yaml_str("theme:\n  number:\n    color: red\n").unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)));
    assert!(err.to_string().contains("invalid color"));
}

#[test]
fn test_yaml_roundtrip_preserves_config() {
    let config = EditorConfig::default();
    let yaml = config.to_yaml_string().unwrap();
    assert_eq!(EditorConfig::from_yaml_str(&yaml).unwrap(), config);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = EditorConfig::load("/definitely/not/here/sketch.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
