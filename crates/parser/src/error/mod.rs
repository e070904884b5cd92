//! Severities, diagnostics and fatal front-end errors.

pub mod diagnostic;

pub use diagnostic::{Diagnostic, DiagnosticCollector, DiagnosticKind};

use egg_runtime::SourceLocation;
use thiserror::Error;

/// Log severities, ordered so the worst observed can be kept with a
/// simple `max`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Severity {
    /// Nothing reported.
    None,
    Debug,
    Verbose,
    Information,
    Warning,
    Error,
}

/// A fatal error raised while shaping or promoting source text.
///
/// Syntax errors abort the offending subtree; there is no recovery
/// below module granularity.
#[derive(Debug, Clone, Error)]
#[error("{resource}{location}: {reason}")]
pub struct SyntaxError {
    pub reason: String,
    pub resource: String,
    pub location: SourceLocation,
}

impl SyntaxError {
    pub fn new(
        reason: impl Into<String>,
        resource: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        SyntaxError {
            reason: reason.into(),
            resource: resource.into(),
            location,
        }
    }

    /// Variant that quotes the offending token after the reason.
    pub fn with_token(
        reason: impl Into<String>,
        token: &str,
        resource: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        SyntaxError {
            reason: format!("{}: '{}'", reason.into(), token),
            resource: resource.into(),
            location,
        }
    }
}

/// Compute the 1-based line and column of a byte offset.
pub fn line_column(source: &str, offset: usize) -> SourceLocation {
    let offset = offset.min(source.len());
    let line = source[..offset].chars().filter(|&c| c == '\n').count() + 1;
    let line_start = source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = source[line_start..offset].chars().count() + 1;
    SourceLocation::new(line as u32, column as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Information);
        assert!(Severity::None < Severity::Debug);
    }

    #[test]
    fn test_line_column() {
        let source = "ab\ncde\nf";
        assert_eq!(line_column(source, 0), SourceLocation::new(1, 1));
        assert_eq!(line_column(source, 2), SourceLocation::new(1, 3));
        assert_eq!(line_column(source, 3), SourceLocation::new(2, 1));
        assert_eq!(line_column(source, 6), SourceLocation::new(2, 4));
        assert_eq!(line_column(source, 7), SourceLocation::new(3, 1));
    }

    #[test]
    fn test_syntax_error_display() {
        let error = SyntaxError::new(
            "Expected semicolon after assignment statement",
            "test.egg",
            SourceLocation::new(1, 10),
        );
        assert_eq!(
            error.to_string(),
            "test.egg(1,10): Expected semicolon after assignment statement"
        );
        let with_token = SyntaxError::with_token(
            "Unknown binary operator",
            "~",
            "test.egg",
            SourceLocation::new(2, 3),
        );
        assert!(with_token.to_string().contains("Unknown binary operator: '~'"));
    }
}
