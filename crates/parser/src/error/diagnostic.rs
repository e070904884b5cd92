//! Diagnostic records and the collector the preparation pass logs to.

use super::Severity;
use egg_runtime::SourceLocation;
use std::fmt;

/// User-visible error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DiagnosticKind {
    Syntax,
    Type,
    Context,
    Inference,
    Runtime,
}

/// One report from the pipeline.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: Option<DiagnosticKind>,
    pub resource: String,
    pub location: Option<SourceLocation>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, resource: impl Into<String>, message: String) -> Self {
        Diagnostic {
            severity,
            kind: None,
            resource: resource.into(),
            location: None,
            message,
        }
    }

    pub fn error(resource: impl Into<String>, message: String) -> Self {
        Self::new(Severity::Error, resource, message)
    }

    pub fn warning(resource: impl Into<String>, message: String) -> Self {
        Self::new(Severity::Warning, resource, message)
    }

    pub fn with_kind(mut self, kind: DiagnosticKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        if let Some(location) = self.location {
            write!(f, "{}", location)?;
        }
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "info",
            Severity::Verbose => "verbose",
            Severity::Debug => "debug",
            Severity::None => "note",
        };
        write!(f, ": {}: {}", label, self.message)
    }
}

/// Accumulates diagnostics and tracks the worst severity observed.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
    highest: Option<Severity>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        DiagnosticCollector::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            _ => {}
        }
        self.highest = Some(match self.highest {
            Some(current) => current.max(diagnostic.severity),
            None => diagnostic.severity,
        });
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// The worst severity reported so far.
    pub fn highest(&self) -> Severity {
        self.highest.unwrap_or(Severity::None)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_tracks_highest() {
        let mut collector = DiagnosticCollector::new();
        assert_eq!(collector.highest(), Severity::None);
        collector.report(Diagnostic::warning("t", "w".to_string()));
        assert_eq!(collector.highest(), Severity::Warning);
        collector.report(Diagnostic::error("t", "e".to_string()));
        assert_eq!(collector.highest(), Severity::Error);
        collector.report(Diagnostic::warning("t", "w2".to_string()));
        assert_eq!(collector.highest(), Severity::Error);
        assert_eq!(collector.error_count(), 1);
        assert_eq!(collector.warning_count(), 2);
    }

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::error("demo.egg", "Unknown identifier: 'x'".to_string())
            .with_location(SourceLocation::new(1, 5));
        assert_eq!(
            diagnostic.to_string(),
            "demo.egg(1,5): error: Unknown identifier: 'x'"
        );
    }
}
