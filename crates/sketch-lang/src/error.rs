use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while loading an [`crate::EditorConfig`].
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    /// YAML parsing failed.
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read '{}': {source}", path.display())]
    /// The configuration file could not be read.
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    #[error("invalid color '{0}', expected #rrggbb")]
    /// A color string did not use the `#rrggbb` notation.
    InvalidColor(String),
}
