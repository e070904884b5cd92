//! Immutable code-point strings backed by UTF-8 with a cached length.

use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
struct Buffer {
    utf8: String,
    chars: usize,
}

/// An immutable sequence of Unicode code points.
///
/// Cloning is cheap (shared buffer); `len` is O(1) because the
/// code-point count is computed once at construction.
#[derive(Debug, Clone)]
pub struct Str {
    buffer: Arc<Buffer>,
}

static EMPTY: Lazy<Str> = Lazy::new(|| Str::new(""));

impl Str {
    pub fn new(utf8: impl Into<String>) -> Self {
        let utf8 = utf8.into();
        let chars = utf8.chars().count();
        Str {
            buffer: Arc::new(Buffer { utf8, chars }),
        }
    }

    pub fn empty() -> Self {
        EMPTY.clone()
    }

    /// Number of code points, not bytes.
    pub fn len(&self) -> usize {
        self.buffer.chars
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.chars == 0
    }

    pub fn as_str(&self) -> &str {
        &self.buffer.utf8
    }

    /// The code point at `index`, or `None` past the end.
    pub fn char_at(&self, index: usize) -> Option<char> {
        if index >= self.buffer.chars {
            return None;
        }
        self.buffer.utf8.chars().nth(index)
    }

    /// Forward iteration over code points.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.buffer.utf8.chars()
    }

    /// Reverse iteration over code points.
    pub fn chars_rev(&self) -> impl Iterator<Item = char> + '_ {
        self.buffer.utf8.chars().rev()
    }

    /// Whether the two handles share one buffer. Content equality is
    /// `==`; this is only an optimization probe.
    pub fn same_buffer(&self, other: &Str) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }
}

impl PartialEq for Str {
    fn eq(&self, other: &Self) -> bool {
        self.same_buffer(other) || self.buffer.utf8 == other.buffer.utf8
    }
}

impl Eq for Str {}

impl PartialOrd for Str {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Str {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.buffer.utf8.cmp(&other.buffer.utf8)
    }
}

impl std::hash::Hash for Str {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.buffer.utf8.hash(state);
    }
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buffer.utf8)
    }
}

impl From<&str> for Str {
    fn from(value: &str) -> Self {
        Str::new(value)
    }
}

impl From<String> for Str {
    fn from(value: String) -> Self {
        Str::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_counts_code_points() {
        let s = Str::new("a\u{00e9}\u{4e2d}");
        assert_eq!(s.len(), 3);
        assert_eq!(s.as_str().len(), 6);
    }

    #[test]
    fn test_char_at() {
        let s = Str::new("egg");
        assert_eq!(s.char_at(0), Some('e'));
        assert_eq!(s.char_at(2), Some('g'));
        assert_eq!(s.char_at(3), None);
    }

    #[test]
    fn test_empty() {
        let s = Str::empty();
        assert!(s.is_empty());
        assert_eq!(s.char_at(0), None);
        assert_eq!(s.chars().count(), 0);
    }

    #[test]
    fn test_iteration_yields_every_code_point() {
        let s = Str::new("\u{1f95a}ab");
        assert_eq!(s.chars().count(), s.len());
        let forward: Vec<char> = s.chars().collect();
        let mut reverse: Vec<char> = s.chars_rev().collect();
        reverse.reverse();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_content_equality() {
        assert_eq!(Str::new("egg"), Str::new("egg"));
        assert_ne!(Str::new("egg"), Str::new("Egg"));
    }
}
