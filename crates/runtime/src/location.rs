//! Source and runtime locations.

use std::fmt;

/// A 1-based line/column position in a named resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        SourceLocation { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.column > 0 {
            write!(f, "({},{})", self.line, self.column)
        } else if self.line > 0 {
            write!(f, "({})", self.line)
        } else {
            Ok(())
        }
    }
}

/// A runtime location: resource plus position plus the active function.
#[derive(Debug, Clone, Default)]
pub struct RuntimeLocation {
    pub resource: String,
    pub position: SourceLocation,
    pub function: Option<String>,
}

impl RuntimeLocation {
    pub fn new(resource: impl Into<String>, position: SourceLocation) -> Self {
        RuntimeLocation {
            resource: resource.into(),
            position,
            function: None,
        }
    }

    /// The source-facing form: `resource(line,column)`.
    pub fn to_source_string(&self) -> String {
        format!("{}{}", self.resource, self.position)
    }

    /// The runtime-facing form, which appends `[function]` when known.
    pub fn to_runtime_string(&self) -> String {
        let mut out = self.to_source_string();
        if let Some(function) = &self.function {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push('[');
            out.push_str(function);
            out.push(']');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_string() {
        let loc = RuntimeLocation::new("demo.egg", SourceLocation::new(3, 7));
        assert_eq!(loc.to_source_string(), "demo.egg(3,7)");
    }

    #[test]
    fn test_runtime_string() {
        let mut loc = RuntimeLocation::new("demo.egg", SourceLocation::new(1, 1));
        loc.function = Some("main".to_string());
        assert_eq!(loc.to_runtime_string(), "demo.egg(1,1) [main]");
    }
}
