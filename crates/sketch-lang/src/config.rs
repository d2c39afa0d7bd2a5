use crate::error::ConfigError;
use crate::keywords::{KeywordCategory, KeywordClass, default_keyword_classes};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Behavior toggles consulted by the editing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    /// Copy the previous line's indentation on Enter.
    pub auto_tab: bool,
    /// Auto-insert and skip over closing delimiters.
    pub insert_end_chars: bool,
    /// Paint lexical classes. Classification itself always runs.
    pub highlight: bool,
    /// Display width of a tab, in columns.
    pub tab_width: usize,
    /// Default case sensitivity of find/replace.
    pub ignore_case: bool,
    /// Jump to the line reported by the compiler on error.
    pub find_error_line: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            auto_tab: true,
            insert_end_chars: true,
            highlight: true,
            tab_width: 8,
            ignore_case: true,
            find_error_line: true,
        }
    }
}

/// The immutable configuration snapshot handed to the editing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Behavior toggles.
    pub options: EditorOptions,
    /// Literal styles.
    pub theme: Theme,
    /// Keyword classes, in paint order.
    pub keywords: Vec<KeywordClass>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            options: EditorOptions::default(),
            theme: Theme::default(),
            keywords: default_keyword_classes(),
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from YAML. Missing sections keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            keyword_classes = config.keywords.len(),
            "loaded editor configuration"
        );
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The first keyword class bound to `category`, if any.
    pub fn keyword_class(&self, category: KeywordCategory) -> Option<&KeywordClass> {
        self.keywords.iter().find(|k| k.category == category)
    }
}
