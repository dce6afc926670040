//! State paths: the identity of a position in the state hierarchy.
//!
//! A path lists the keys from the first top-level state down to a
//! descendant, e.g. `Login.Loading`. The machine root has the empty path.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered path through the state hierarchy.
///
/// Paths are plain values: cloning one never aliases machine internals.
///
/// # Example
///
/// ```rust
/// use appflow::core::StatePath;
///
/// let path = StatePath::parse("Login.Loading");
///
/// assert_eq!(path.to_string(), "Login.Loading");
/// assert_eq!(path.top_level(), Some("Login"));
/// assert!(path.matches("Login"));
/// assert!(path.matches("Login.Loading"));
/// assert!(!path.matches("Login.Idle"));
/// assert!(!path.matches("Log"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatePath(Vec<String>);

impl StatePath {
    /// The root path (no segments).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted path. Empty segments are ignored.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Return a new path with `key` appended.
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Depth below the root (top-level states have depth 1).
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The last segment, if any.
    pub fn key(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// The first segment, i.e. the active top-level state.
    pub fn top_level(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Check whether `pattern` names this path or one of its ancestors.
    ///
    /// Matching is by whole segments, so `"Log"` never matches `Login`.
    pub fn matches(&self, pattern: &str) -> bool {
        let pattern = StatePath::parse(pattern);
        !pattern.is_root() && self.starts_with(&pattern)
    }

    /// Segment-wise prefix test.
    pub fn starts_with(&self, prefix: &StatePath) -> bool {
        prefix.0.len() <= self.0.len() && self.0.iter().zip(&prefix.0).all(|(a, b)| a == b)
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for StatePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}
