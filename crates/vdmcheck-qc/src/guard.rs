//! Recursion guard for self-referential type definitions.

use crate::error::{SearchError, SearchResult};
use std::collections::BTreeSet;
use tracing::debug;

/// Names of the `Named`/`Record` types currently being expanded.
///
/// One guard belongs to one top-level sampling call and is passed down by
/// mutable borrow; it is never shared between obligations or threads.
#[derive(Debug, Default)]
pub struct RecursionGuard {
    active: BTreeSet<String>,
}

impl RecursionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.active.len()
    }

    /// Run `f` with `name` marked active. Returns `None` without calling `f`
    /// when `name` is already being expanded.
    pub fn expand<T>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> T) -> Option<T> {
        if !self.active.insert(name.to_string()) {
            debug!(ty = name, depth = self.depth(), "recursion cut");
            return None;
        }
        let result = f(self);
        self.active.remove(name);
        Some(result)
    }

    /// Check that every expansion was closed.
    pub fn finish(&self) -> SearchResult<()> {
        if self.active.is_empty() {
            Ok(())
        } else {
            Err(SearchError::GuardViolation {
                active: self.active.iter().cloned().collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_cuts_cycles() {
        let mut guard = RecursionGuard::new();
        let outer = guard.expand("T", |g| {
            assert!(g.contains("T"));
            g.expand("T", |_| 1)
        });
        assert_eq!(outer, Some(None));
        assert!(guard.is_empty());
        assert!(guard.finish().is_ok());
    }

    #[test]
    fn test_nested_distinct_names() {
        let mut guard = RecursionGuard::new();
        let depth = guard.expand("A", |g| g.expand("B", |g| g.depth()));
        assert_eq!(depth, Some(Some(2)));
        assert_eq!(guard.depth(), 0);
    }

    #[test]
    fn test_finish_inside_expansion() {
        let mut guard = RecursionGuard::new();
        let inner = guard.expand("A", |g| g.finish());
        assert!(matches!(
            inner,
            Some(Err(SearchError::GuardViolation { .. }))
        ));
        assert!(guard.finish().is_ok());
    }
}
