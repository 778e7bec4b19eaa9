use std::collections::HashMap;

/// String-keyed, multi-valued metadata threaded through the dispatch graph:
/// attached to responses, and accumulated on [`crate::context::DispatchContext`]
/// as routers publish "which route was picked, and why".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels(HashMap<String, Vec<String>>);

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values for `key`, or an empty slice if the key was never set.
    pub fn label(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sets (overwriting) `key` to `values` and returns `self` for chaining.
    pub fn with_label(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.0.insert(key.into(), values);
        self
    }

    /// Merges `other` into `self`, with `other`'s entries taking precedence
    /// on key collision.
    pub fn with_labels(mut self, other: Labels) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
