//! Keyword categories and their word lists.

use crate::color::{Rgb, TextStyle};
use serde::{Deserialize, Deserializer, Serialize};

/// A configured keyword category.
///
/// The declaration order is also the paint order: when a word belongs to several categories,
/// the later category wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCategory {
    /// Access and storage modifiers (`public`, `static`, ...).
    Access,
    /// Built-in variables (`width`, `mouseX`, ...).
    Vars,
    /// Composite (reference) types (`String`, `PVector`, ...).
    Composite,
    /// Built-in functions, matched only when followed by `(`.
    Predefined,
    /// Control flow (`if`, `while`, ...).
    Flow,
    /// `import` / `package`.
    Import,
    /// Library objects used with dotted access (`Math`, `System`, ...).
    Object,
    /// Callbacks a sketch may define (`setup`, `draw`, ...), matched only when followed by `(`.
    Definable,
    /// Primitive types.
    Primitive,
    /// `true`, `false`, `null`.
    Tfn,
    /// Type-declaring keywords (`class`, `extends`, ...).
    Class,
}

impl KeywordCategory {
    /// Every category in paint order.
    pub const ALL: [KeywordCategory; 11] = [
        KeywordCategory::Access,
        KeywordCategory::Vars,
        KeywordCategory::Composite,
        KeywordCategory::Predefined,
        KeywordCategory::Flow,
        KeywordCategory::Import,
        KeywordCategory::Object,
        KeywordCategory::Definable,
        KeywordCategory::Primitive,
        KeywordCategory::Tfn,
        KeywordCategory::Class,
    ];

    /// Position of this category in [`KeywordCategory::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Default style of the category.
    pub fn default_style(self) -> TextStyle {
        match self {
            KeywordCategory::Access | KeywordCategory::Class => {
                TextStyle::new(Rgb::new(87, 224, 29), true)
            }
            KeywordCategory::Composite => TextStyle::regular(Rgb::new(206, 125, 18)),
            KeywordCategory::Definable => TextStyle::new(Rgb::new(76, 125, 239), true),
            KeywordCategory::Flow | KeywordCategory::Object => {
                TextStyle::new(Rgb::new(255, 255, 255), true)
            }
            KeywordCategory::Import => TextStyle::regular(Rgb::new(176, 124, 239)),
            KeywordCategory::Predefined => TextStyle::regular(Rgb::new(46, 232, 242)),
            KeywordCategory::Primitive => TextStyle::new(Rgb::new(46, 242, 121), true),
            KeywordCategory::Tfn => TextStyle::regular(Rgb::new(242, 104, 46)),
            KeywordCategory::Vars => TextStyle::regular(Rgb::new(242, 92, 197)),
        }
    }

    /// Whether the category only matches words followed (after whitespace) by `(`.
    pub fn default_declarations_only(self) -> bool {
        matches!(self, KeywordCategory::Predefined | KeywordCategory::Definable)
    }

    /// Whether `.` ends a candidate token for this category.
    pub fn default_period_delimiter(self) -> bool {
        matches!(
            self,
            KeywordCategory::Access
                | KeywordCategory::Class
                | KeywordCategory::Definable
                | KeywordCategory::Import
                | KeywordCategory::Object
        )
    }

    fn default_words(self) -> &'static [&'static str] {
        match self {
            KeywordCategory::Access => &[
                "abstract",
                "final",
                "native",
                "private",
                "protected",
                "public",
                "static",
                "synchronized",
                "transient",
                "volatile",
            ],
            KeywordCategory::Vars => &[
                "HALF_PI",
                "PI",
                "QUARTER_PI",
                "TAU",
                "TWO_PI",
                "displayHeight",
                "displayWidth",
                "focused",
                "frameCount",
                "height",
                "key",
                "keyCode",
                "mouseButton",
                "mouseX",
                "mouseY",
                "pixelHeight",
                "pixelWidth",
                "pixels",
                "pmouseX",
                "pmouseY",
                "width",
            ],
            KeywordCategory::Composite => &[
                "ArrayList",
                "FloatDict",
                "FloatList",
                "HashMap",
                "IntDict",
                "IntList",
                "JSONArray",
                "JSONObject",
                "PFont",
                "PGraphics",
                "PImage",
                "PShape",
                "PVector",
                "String",
                "StringDict",
                "StringList",
                "Table",
                "TableRow",
                "XML",
            ],
            KeywordCategory::Predefined => &[
                "abs",
                "arc",
                "background",
                "beginShape",
                "constrain",
                "cos",
                "delay",
                "dist",
                "ellipse",
                "endShape",
                "fill",
                "frameRate",
                "image",
                "line",
                "loadImage",
                "map",
                "millis",
                "noFill",
                "noStroke",
                "point",
                "popMatrix",
                "print",
                "println",
                "pushMatrix",
                "quad",
                "random",
                "rect",
                "rotate",
                "sin",
                "size",
                "sqrt",
                "stroke",
                "strokeWeight",
                "text",
                "textSize",
                "translate",
                "triangle",
                "vertex",
            ],
            KeywordCategory::Flow => &[
                "break", "case", "catch", "continue", "default", "do", "else", "finally", "for",
                "if", "return", "switch", "throw", "try", "while",
            ],
            KeywordCategory::Import => &["import", "package"],
            KeywordCategory::Object => &[
                "Boolean",
                "Character",
                "Float",
                "Integer",
                "Math",
                "Object",
                "System",
                "Thread",
            ],
            KeywordCategory::Definable => &[
                "draw",
                "keyPressed",
                "keyReleased",
                "keyTyped",
                "mouseClicked",
                "mouseDragged",
                "mouseMoved",
                "mousePressed",
                "mouseReleased",
                "mouseWheel",
                "settings",
                "setup",
            ],
            KeywordCategory::Primitive => &[
                "boolean", "byte", "char", "color", "double", "float", "int", "long", "short",
                "void",
            ],
            KeywordCategory::Tfn => &["false", "null", "true"],
            KeywordCategory::Class => &[
                "class",
                "enum",
                "extends",
                "implements",
                "instanceof",
                "interface",
                "new",
                "super",
                "this",
            ],
        }
    }
}

/// One keyword category bound to its style and matching rules.
///
/// `words` is kept sorted and free of duplicates so lookups can binary search it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordClass {
    /// The category this class paints.
    pub category: KeywordCategory,
    #[serde(deserialize_with = "sorted_words")]
    words: Vec<String>,
    /// Color and weight applied to matches.
    pub style: TextStyle,
    #[serde(default)]
    /// Only match words followed (after optional whitespace) by `(`.
    pub declarations_only: bool,
    #[serde(default)]
    /// Treat `.` as a token boundary.
    pub period_delimiter: bool,
}

impl KeywordClass {
    /// Create a class; `words` is sorted and deduplicated.
    pub fn new<I, S>(category: KeywordCategory, words: I, style: TextStyle) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words: Vec<String> = words.into_iter().map(Into::into).collect();
        words.sort();
        words.dedup();
        Self {
            category,
            words,
            style,
            declarations_only: category.default_declarations_only(),
            period_delimiter: category.default_period_delimiter(),
        }
    }

    /// The default class for `category`.
    pub fn default_for(category: KeywordCategory) -> Self {
        Self::new(
            category,
            category.default_words().iter().copied(),
            category.default_style(),
        )
    }

    /// Override the declaration-only flag.
    pub fn with_declarations_only(mut self, declarations_only: bool) -> Self {
        self.declarations_only = declarations_only;
        self
    }

    /// Override the period-delimiter flag.
    pub fn with_period_delimiter(mut self, period_delimiter: bool) -> Self {
        self.period_delimiter = period_delimiter;
        self
    }

    /// The sorted word list.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Returns `true` if `word` is one of this class's words.
    pub fn contains(&self, word: &str) -> bool {
        self.words
            .binary_search_by(|probe| probe.as_str().cmp(word))
            .is_ok()
    }
}

fn sorted_words<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let mut words = Vec::<String>::deserialize(deserializer)?;
    words.sort();
    words.dedup();
    Ok(words)
}

/// The default Processing keyword classes, in paint order.
pub fn default_keyword_classes() -> Vec<KeywordClass> {
    KeywordCategory::ALL
        .iter()
        .map(|&category| KeywordClass::default_for(category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_are_sorted_and_deduplicated() {
        let class = KeywordClass::new(
            KeywordCategory::Flow,
            ["while", "if", "for", "if"],
            KeywordCategory::Flow.default_style(),
        );
        assert_eq!(class.words(), &["for", "if", "while"]);
        assert!(class.contains("if"));
        assert!(!class.contains("iff"));
    }

    #[test]
    fn test_default_lists_are_sorted() {
        for class in default_keyword_classes() {
            let mut sorted = class.words().to_vec();
            sorted.sort();
            assert_eq!(class.words(), sorted.as_slice(), "{:?}", class.category);
        }
    }

    #[test]
    fn test_category_flags() {
        assert!(KeywordCategory::Definable.default_declarations_only());
        assert!(KeywordCategory::Predefined.default_declarations_only());
        assert!(!KeywordCategory::Flow.default_declarations_only());
        assert!(KeywordCategory::Object.default_period_delimiter());
        assert!(!KeywordCategory::Predefined.default_period_delimiter());
    }
}
