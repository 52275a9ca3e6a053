//! Variable bindings with copy-down inheritance.

use std::fmt;

use rhai::Dynamic;

/// Name to value bindings visible to expressions of one node.
///
/// A child scope is a value copy of its parent taken when the child starts
/// processing. Writes to the copy never reach the parent or later siblings.
#[derive(Clone, Default)]
pub struct Scope {
    inner: rhai::Scope<'static>,
}

impl Scope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this scope for a child node.
    #[must_use]
    pub fn child(&self) -> Self {
        self.clone()
    }

    /// Bind `name` to `value`. An existing binding is overwritten in place.
    pub fn set(&mut self, name: &str, value: Dynamic) {
        self.inner.set_or_push(name, value);
    }

    /// Current value of `name`.
    pub fn get(&self, name: &str) -> Option<Dynamic> {
        self.inner.get(name).cloned()
    }

    /// Whether `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the scope has no bindings
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub(crate) fn as_rhai(&self) -> &rhai::Scope<'static> {
        &self.inner
    }

    pub(crate) fn as_rhai_mut(&mut self) -> &mut rhai::Scope<'static> {
        &mut self.inner
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, _, value) in self.inner.iter_raw() {
            map.entry(&name, value);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_writes_do_not_leak() {
        let mut parent = Scope::new();
        parent.set("a", Dynamic::from(1_i64));

        let mut child = parent.child();
        child.set("a", Dynamic::from(2_i64));
        child.set("b", Dynamic::from("x"));

        assert_eq!(parent.get("a").unwrap().as_int(), Ok(1));
        assert!(!parent.contains("b"));
        assert_eq!(child.get("a").unwrap().as_int(), Ok(2));
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let mut scope = Scope::new();
        scope.set("x", Dynamic::from(1_i64));
        scope.set("x", Dynamic::from(2_i64));
        assert_eq!(scope.len(), 1);
        assert_eq!(scope.get("x").unwrap().as_int(), Ok(2));
    }
}
