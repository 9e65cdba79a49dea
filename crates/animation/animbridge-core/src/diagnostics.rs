//! Non-fatal conversion diagnostics.
//!
//! Every import/export call returns the diagnostics it accumulated. Each entry is
//! also forwarded to the `log` facade so hosts that install a logger see it live.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
}

/// What went wrong. Mirrors the non-fatal half of the error taxonomy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    UnresolvedTarget,
    UnsupportedInterpolation,
    MisalignedEulerKeys,
    UnknownPropertyGroup,
    IncompleteCurveGroup,
    ScaleUnsupported,
    MismatchedColorKeys,
    IgnoredInterpolator,
    DuplicateCurve,
    MissingData,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{kind:?}: {message}");
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            kind,
            message,
        });
    }

    pub fn info(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        log::info!("{kind:?}: {message}");
        self.entries.push(Diagnostic {
            severity: Severity::Info,
            kind,
            message,
        });
    }

    /// Informational entry that only reaches the log at debug level.
    pub fn note(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        log::debug!("{kind:?}: {message}");
        self.entries.push(Diagnostic {
            severity: Severity::Info,
            kind,
            message,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of entries of the given kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}
