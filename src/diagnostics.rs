//! Structured per-directive diagnostics
//!
//! Every recoverable condition during expansion (unreadable include,
//! disallowed extension, ambiguous class/style attachment) is recorded as an
//! ordered `Diagnostic` and returned alongside the expanded document, so
//! hosts and tests can assert on them without parsing log output.

use std::fmt;
use std::path::PathBuf;

use colored::Colorize;

/// Category of a recoverable expansion condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Include target's suffix is not on the extension allow-list.
    DisallowedExtension,
    /// Include target could not be read.
    UnreadableFile,
    /// Fragment has zero or several root elements, so a `class`/`style`
    /// attribute on the include tag has no attachment point.
    AmbiguousAttributeTarget,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::DisallowedExtension => "disallowed-extension",
            DiagnosticKind::UnreadableFile => "unreadable-file",
            DiagnosticKind::AmbiguousAttributeTarget => "ambiguous-attribute-target",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded condition, in the order it occurred during expansion.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Include target the condition refers to, when one was resolved.
    pub path: Option<PathBuf>,
    /// Entry document the expansion started from, when known.
    pub origin: Option<PathBuf>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: None,
            origin: None,
            message: message.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<PathBuf>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Terminal rendering with a yellow "Warning:" prefix.
    ///
    /// Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.
    pub fn render(&self) -> String {
        format!("{}: {}", "Warning".yellow(), self)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}
