//! Instruction name to directive mapping.
//!
//! The process-wide registry is built once, on first use, from the built-in
//! directives. An application with its own directives installs a complete
//! registry with [`install`] before rendering anything, or hands one to a
//! single engine with
//! [`TemplateEngine::with_registry`](crate::templating::TemplateEngine::with_registry).

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use super::{
    ConditionDirective, Directive, IgnoreDirective, IncludeDirective, IterationDirective,
    SetDirective,
};
use crate::core::{MochaError, Result};

static GLOBAL: OnceLock<Arc<DirectiveRegistry>> = OnceLock::new();

/// Registered directives by instruction name.
#[derive(Clone, Default)]
pub struct DirectiveRegistry {
    directives: HashMap<String, Arc<dyn Directive>>,
}

impl fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveRegistry").field("instructions", &self.names()).finish()
    }
}

impl DirectiveRegistry {
    /// A registry without any directive.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding `ignore`, `include`, `set`, `for` and `if`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("ignore", IgnoreDirective);
        registry.register("include", IncludeDirective);
        registry.register("set", SetDirective);
        registry.register("for", IterationDirective);
        registry.register("if", ConditionDirective);
        registry
    }

    /// Register `directive` under `name`, returning the one it replaces.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        directive: impl Directive + 'static,
    ) -> Option<Arc<dyn Directive>> {
        let name = name.into();
        debug!("Registering directive '{name}'");
        self.directives.insert(name, Arc::new(directive))
    }

    /// Directive registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<&dyn Directive> {
        self.directives.get(name).map(|d| d.as_ref())
    }

    /// Registered instruction names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.directives.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// The process-wide registry, populated with the built-ins on first use.
pub fn global() -> Arc<DirectiveRegistry> {
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(DirectiveRegistry::with_builtins())))
}

/// Install `registry` as the process-wide registry.
///
/// # Errors
///
/// Returns [`MochaError::ConfigError`] if the process-wide registry was
/// already installed or used.
pub fn install(registry: DirectiveRegistry) -> Result<()> {
    GLOBAL.set(Arc::new(registry)).map_err(|_| MochaError::ConfigError {
        message: "the directive registry is already initialized".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Scope;
    use crate::templating::directives::{Invocation, Outcome};
    use crate::templating::processor::Renderer;

    struct Noop;

    impl Directive for Noop {
        fn apply(
            &self,
            _renderer: &mut Renderer<'_>,
            _invocation: &Invocation<'_>,
            _scope: &mut Scope,
        ) -> Result<Outcome> {
            Ok(Outcome::Continue)
        }
    }

    #[test]
    fn test_builtins() {
        let registry = DirectiveRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["for", "if", "ignore", "include", "set"]);
        assert!(registry.lookup("if").is_some());
        assert!(registry.lookup("type").is_none());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = DirectiveRegistry::with_builtins();
        assert!(registry.register("noop", Noop).is_none());
        assert!(registry.register("noop", Noop).is_some());
        assert!(registry.lookup("noop").is_some());
    }

    #[test]
    fn test_global_is_shared() {
        let a = global();
        let b = global();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(install(DirectiveRegistry::empty()).is_err());
    }
}
