//! Typed diagnostic messages collected per-entity, per-blueprint, and
//! at process level. Any `Error` diagnostic flips the owning scope's
//! failure flag; nothing else in the crate decides success or failure
//! by inspecting diagnostic text.

use std::fmt::{self, Display};

/// The severity of a single diagnostic message.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum DiagnosticKind {
    General,
    Note,
    Warning,
    Error,
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::General => "",
            DiagnosticKind::Note => "note",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Error => "error",
        };
        f.write_str(s)
    }
}

/// A single message attached to an entity, blueprint, or the process as a
/// whole.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, message)
    }

    pub fn note(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Note, message)
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::General, message)
    }

    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == DiagnosticKind::General {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

/// An append-only collection of diagnostics that tracks whether any `Error`
/// has been recorded. Entities, blueprints, and the process-level driver
/// each own one of these rather than sharing a single global sink.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSink {
    messages: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.has_errors = true;
        }
        self.messages.push(diagnostic);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::error(message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::warning(message));
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::note(message));
    }

    pub fn general(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::general(message));
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn messages(&self) -> &[Diagnostic] {
        &self.messages
    }

    pub fn extend_from(&mut self, other: &DiagnosticSink) {
        for message in &other.messages {
            self.push(message.clone());
        }
    }
}
