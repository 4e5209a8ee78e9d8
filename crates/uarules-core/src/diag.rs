// # Diagnostics
//
// Lifecycle operations report back to the host as a list of diagnostics
// instead of a `Result`. An empty list means success.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Error;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Operation failed
    Error,
    /// Operation succeeded but something deserves attention
    Warning,
}

/// A single user-visible message produced by a lifecycle operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of the message
    pub severity: Severity,
    /// One-line summary
    pub summary: String,
    /// Optional longer explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: None,
        }
    }

    /// Create a warning diagnostic
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: None,
        }
    }

    /// Attach a detail message
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Whether this is an error diagnostic
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        write!(f, "{}: {}", label, self.summary)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n\n{}", detail)?;
        }
        Ok(())
    }
}

impl From<Error> for Diagnostic {
    fn from(err: Error) -> Self {
        Diagnostic::error(err.to_string())
    }
}

/// Diagnostics returned by a lifecycle operation (empty on success)
pub type Diagnostics = Vec<Diagnostic>;

/// Turn an error into a single-element diagnostics list
pub fn from_err(err: Error) -> Diagnostics {
    vec![Diagnostic::from(err)]
}

/// Whether any diagnostic in the list is an error
pub fn has_errors(diags: &[Diagnostic]) -> bool {
    diags.iter().any(Diagnostic::is_error)
}
