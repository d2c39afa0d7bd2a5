//! The boundary to the external compile/run launcher.
//!
//! The launcher itself (process spawning, stdin plumbing) lives outside the engine. It feeds
//! output lines into a [`RunLog`] and reports compiler errors as `file:line:...` strings, which
//! [`ErrorLocation::parse`] turns into something
//! [`DocumentSurface::goto_error`](crate::DocumentSurface::goto_error) can act on.

use std::path::Path;

/// Launcher output lines that are rewritten (`Some`) or dropped (`None`) before display.
const REWRITES: &[(&str, Option<&str>)] = &[
    (
        "Could not run the sketch (Target VM failed to initialize).",
        Some("An unknown error occurred running the sketch."),
    ),
    (
        "The output folder already exists. Use --force to remove it.",
        Some("The output folder already exists. Remove it first."),
    ),
    ("Could not run the sketch.", None),
];

const DROPPED_PREFIXES: &[&str] = &["For more information, read Help "];

/// Append-only output of the last run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one output line, after rewriting known launcher noise. Returns whether the line
    /// was kept.
    pub fn push_line(&mut self, line: impl Into<String>) -> bool {
        let line = line.into();
        if DROPPED_PREFIXES.iter().any(|p| line.starts_with(p)) {
            return false;
        }
        let line = match REWRITES.iter().find(|(from, _)| *from == line) {
            Some((_, Some(to))) => (*to).to_string(),
            Some((_, None)) => return false,
            None => line,
        };
        tracing::trace!(line = %line, "run output");
        self.lines.push(line);
        true
    }

    /// Lines in arrival order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Returns `true` if nothing was logged.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Forget everything (a new run starts).
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Where a compiler error points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLocation {
    /// The file name as reported.
    pub file: String,
    /// 1-based line number.
    pub line: usize,
}

impl ErrorLocation {
    /// Parse `file:line:...`. The text after the second colon is ignored; a missing colon or a
    /// non-numeric (or zero) line gives `None`.
    pub fn parse(message: &str) -> Option<Self> {
        let mut parts = message.splitn(3, ':');
        let file = parts.next()?;
        let line = parts.next()?;
        parts.next()?;

        let line = line.trim().parse().ok().filter(|&line| line > 0)?;
        Some(Self {
            file: file.to_string(),
            line,
        })
    }

    /// Whether this error is about the document stored at `path`. Documents without a file
    /// accept any error.
    pub fn refers_to(&self, path: Option<&Path>) -> bool {
        let Some(path) = path else {
            return true;
        };
        let reported = Path::new(&self.file);
        reported == path || reported.file_name().is_some_and(|name| Some(name) == path.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_run_log_rewrites() {
        let mut log = RunLog::new();
        assert!(log.push_line("hello"));
        assert!(!log.push_line("Could not run the sketch."));
        assert!(!log.push_line("For more information, read Help > Troubleshooting."));
        assert!(log.push_line("The output folder already exists. Use --force to remove it."));
        assert_eq!(
            log.lines(),
            ["hello", "The output folder already exists. Remove it first."]
        );
        assert_eq!(
            log.text(),
            "hello\nThe output folder already exists. Remove it first."
        );

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_parse_error_location() {
        assert_eq!(
            ErrorLocation::parse("sketch.pde:12:3:12:8: Syntax Error - missing ';'"),
            Some(ErrorLocation {
                file: "sketch.pde".into(),
                line: 12
            })
        );
        assert_eq!(ErrorLocation::parse("no colon here"), None);
        assert_eq!(ErrorLocation::parse("a.pde:12"), None);
        assert_eq!(ErrorLocation::parse("a.pde:x:1"), None);
        assert_eq!(ErrorLocation::parse("a.pde:0:1"), None);
    }

    #[test]
    fn test_refers_to() {
        let location = ErrorLocation::parse("/tmp/build/sketch.pde:3:1: error").unwrap();
        assert!(location.refers_to(None));
        assert!(location.refers_to(Some(Path::new("/home/me/sketch.pde"))));
        assert!(!location.refers_to(Some(Path::new("/home/me/other.pde"))));
    }
}
