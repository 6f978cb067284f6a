use serde::{Deserialize, Serialize};

use crate::types::{DirectiveKind, Span};

/// Problems found while scanning or resolving directives.
///
/// None of these abort a render: the offending text is passed through
/// unchanged and the error is reported as a [`Diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    #[error("Unclosed directive '{kind}' opened at line {line}")]
    Unclosed { kind: DirectiveKind, line: usize },

    #[error("Closing tag '{{% end{kind} %}}' at line {line} has no matching opening tag")]
    StrayClose { kind: DirectiveKind, line: usize },

    #[error("Unknown directive '{name}' at line {line}")]
    UnknownDirective { name: String, line: usize },

    #[error("{kind} directive is missing a URL")]
    MissingUrl { kind: DirectiveKind },

    #[error("Unrecognized button size '{size}' (expected xs, sm, md or lg)")]
    ButtonSize { size: String },

    #[error("{kind} directive body has no {marker} markers")]
    NoMarkers {
        kind: DirectiveKind,
        marker: &'static str,
    },
}

impl TagError {
    /// Stable diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            TagError::Unclosed { .. } => "W001",
            TagError::StrayClose { .. } => "W002",
            TagError::UnknownDirective { .. } => "W003",
            TagError::MissingUrl {
                kind: DirectiveKind::Link,
            } => "V001",
            TagError::MissingUrl { .. } => "V002",
            TagError::ButtonSize { .. } => "V003",
            TagError::NoMarkers {
                kind: DirectiveKind::Tabs,
                ..
            } => "V004",
            TagError::NoMarkers {
                kind: DirectiveKind::Grid,
                ..
            } => "V005",
            TagError::NoMarkers { .. } => "V006",
        }
    }

    /// Default severity used when this error becomes a diagnostic.
    pub fn severity(&self) -> Severity {
        match self {
            TagError::Unclosed { .. }
            | TagError::StrayClose { .. }
            | TagError::UnknownDirective { .. } => Severity::Warning,
            TagError::MissingUrl {
                kind: DirectiveKind::Link,
            } => Severity::Error,
            TagError::MissingUrl { .. } | TagError::NoMarkers { .. } => Severity::Warning,
            TagError::ButtonSize { .. } => Severity::Info,
        }
    }

    pub fn into_diagnostic(self, span: Option<Span>) -> Diagnostic {
        Diagnostic {
            severity: self.severity(),
            message: self.to_string(),
            span,
            code: Some(self.code().to_string()),
        }
    }
}

/// A diagnostic message produced while rendering.
///
/// Diagnostics are non-fatal: the renderer continues and produces a best-effort
/// result even when diagnostics are emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}
