//! Captured path parameters.
//!
//! Most routes capture one or two parameters, so pairs live inline in a
//! small vector and only spill to the heap for deep nesting.

use std::str::FromStr;

use smallvec::SmallVec;

const INLINE_PARAMS: usize = 4;

/// Path parameters captured by a route match, in path order.
///
/// ```rust
/// use ergon_router::Params;
///
/// let mut params = Params::new();
/// params.push("id", "42");
///
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.parse::<u64>("id"), Some(42));
/// assert_eq!(params.parse::<u64>("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    pairs: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a captured parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Returns the raw value of a parameter.
    ///
    /// If the same name was captured more than once the innermost (last)
    /// capture wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parses a parameter into `T`, returning `None` if it is absent or does
    /// not parse.
    #[must_use]
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    /// Number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Drops captures past `len`; used to undo a failed branch.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.pairs.truncate(len);
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let params = Params::new();
        assert!(params.is_empty());
        assert_eq!(params.get("id"), None);
    }

    #[test]
    fn test_last_capture_wins() {
        let mut params = Params::new();
        params.push("id", "1");
        params.push("id", "2");
        assert_eq!(params.get("id"), Some("2"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_parse() {
        let mut params = Params::new();
        params.push("id", "17");
        params.push("slug", "hello");
        assert_eq!(params.parse::<u32>("id"), Some(17));
        assert_eq!(params.parse::<u32>("slug"), None);
    }

    #[test]
    fn test_truncate_undoes_captures() {
        let mut params = Params::new();
        params.push("a", "1");
        params.push("b", "2");
        params.truncate(1);
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("a", "1")]);
    }

    #[test]
    fn test_spills_past_inline_capacity() {
        let params: Params = (0..6)
            .map(|i| (format!("p{i}"), i.to_string()))
            .collect();
        assert_eq!(params.len(), 6);
        assert_eq!(params.get("p5"), Some("5"));
    }
}
