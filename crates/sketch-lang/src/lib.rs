#![warn(missing_docs)]
//! `sketch-lang` - data-driven language configuration for `sketch-core`.
//!
//! This crate intentionally stays free of any editing logic. It provides the plain data the
//! editing engine is handed at construction time:
//!
//! - [`KeywordClass`] - a keyword category with its sorted word list and matching rules
//! - [`Theme`] - the style (color + bold) of every literal class
//! - [`EditorOptions`] - behavior toggles (auto-indent, auto-pairing, highlighting, ...)
//! - [`EditorConfig`] - the bundle of the above, loadable from YAML
//!
//! # Example
//!
//! ```rust
//! use sketch_lang::{EditorConfig, KeywordCategory};
//!
//! let config = EditorConfig::from_yaml_str("options:\n  tab_width: 4\n").unwrap();
//! assert_eq!(config.options.tab_width, 4);
//! assert!(config.options.auto_tab);
//!
//! let flow = config.keyword_class(KeywordCategory::Flow).unwrap();
//! assert!(flow.contains("while"));
//! ```

mod color;
mod config;
mod error;
mod keywords;
mod theme;

pub use color::{Rgb, TextStyle};
pub use config::{EditorConfig, EditorOptions};
pub use error::ConfigError;
pub use keywords::{KeywordCategory, KeywordClass, default_keyword_classes};
pub use theme::Theme;
