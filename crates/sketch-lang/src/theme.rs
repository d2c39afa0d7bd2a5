use crate::color::{Rgb, TextStyle};
use serde::{Deserialize, Serialize};

/// Styles of the non-keyword classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Ordinary code.
    pub plain: TextStyle,
    /// String literals.
    pub string: TextStyle,
    /// Single-line and multi-line comments.
    pub comment: TextStyle,
    /// Character literals.
    pub char: TextStyle,
    /// Numeric literals and `#rrggbb` colors.
    pub number: TextStyle,
    /// Escape sequences inside string and char literals.
    pub escape: TextStyle,
    /// The currently matched bracket pair.
    pub bracket_match: TextStyle,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            plain: TextStyle::regular(Rgb::new(225, 225, 225)),
            string: TextStyle::regular(Rgb::new(242, 229, 46)),
            comment: TextStyle::regular(Rgb::new(160, 160, 160)),
            char: TextStyle::regular(Rgb::new(196, 127, 0)),
            number: TextStyle::regular(Rgb::new(213, 247, 22)),
            escape: TextStyle::regular(Rgb::new(244, 151, 22)),
            bracket_match: TextStyle::new(Rgb::new(255, 80, 80), true),
        }
    }
}
