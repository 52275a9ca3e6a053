//! Server-side scripting on top of `rhai`.
//!
//! [`ScriptHost`] owns the `rhai::Engine` used by one render, together with
//! the library of functions declared by the server scripts evaluated so far.
//! Every expression evaluated afterwards can call those functions, so a
//! `fn total(items) { ... }` declared in the page prologue is usable from any
//! `data-if` or `${}` span further down.
//!
//! Variables live in a [`Scope`]. Expressions never add bindings; scripts do:
//! a top-level `let` in a server script persists in the scope it ran against.
//!
//! Host types become iterable by `data-for` when they implement [`Record`] and
//! are registered with [`ScriptHost::register_record`].

mod scope;

pub use scope::Scope;

use rhai::{AST, Dynamic, Engine};
use tracing::{debug, info};

use crate::core::{MochaError, Result};

/// Capability of a host type to list its fields for iteration.
///
/// ```rust
/// use mocha_template::script::{Record, ScriptHost};
/// use rhai::Dynamic;
///
/// #[derive(Clone)]
/// struct Person {
///     name: String,
///     age: i64,
/// }
///
/// impl Record for Person {
///     fn fields(&self) -> Vec<(String, Dynamic)> {
///         vec![
///             ("name".into(), self.name.clone().into()),
///             ("age".into(), self.age.into()),
///         ]
///     }
/// }
///
/// let mut host = ScriptHost::new();
/// host.register_record::<Person>();
/// ```
pub trait Record {
    /// Field names and values in iteration order.
    fn fields(&self) -> Vec<(String, Dynamic)>;
}

type FieldLister = fn(&Dynamic) -> Option<Vec<(String, Dynamic)>>;

fn list_fields<T: Record + Clone + Send + Sync + 'static>(value: &Dynamic) -> Option<Vec<(String, Dynamic)>> {
    value.read_lock::<T>().map(|record| record.fields())
}

/// Expression and script evaluator for a single render.
pub struct ScriptHost {
    engine: Engine,
    library: AST,
    records: Vec<FieldLister>,
}

impl Default for ScriptHost {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptHost")
            .field("functions", &self.library.iter_functions().count())
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl ScriptHost {
    /// Create a host with a fresh engine and an empty function library.
    ///
    /// `print` and `debug` calls in scripts are routed to `tracing`.
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.on_print(|text| info!(target: "mocha::script", "{text}"));
        engine.on_debug(|text, source, position| {
            debug!(target: "mocha::script", "{}{position:?}: {text}", source.unwrap_or_default());
        });

        Self {
            engine,
            library: AST::empty(),
            records: Vec::new(),
        }
    }

    /// Direct access to the engine, e.g. to register host functions.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Make `T` usable from scripts and iterable by `data-for`.
    pub fn register_record<T: Record + Clone + Send + Sync + 'static>(&mut self) -> &mut Self {
        self.engine.register_type::<T>();
        self.records.push(list_fields::<T>);
        self
    }

    /// Fields of `value` if its type was registered as a [`Record`].
    pub fn record_fields(&self, value: &Dynamic) -> Option<Vec<(String, Dynamic)>> {
        self.records.iter().find_map(|list| list(value))
    }

    /// Evaluate a single expression against `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::Expression`] when the expression does not compile
    /// or fails at runtime.
    pub fn evaluate(&self, expression: &str, scope: &mut Scope) -> Result<Dynamic> {
        let ast = self
            .engine
            .compile_expression_with_scope(scope.as_rhai(), expression)
            .map_err(|e| MochaError::expression(expression, e))?;
        let ast = self.library.merge(&ast);
        self.engine
            .eval_ast_with_scope::<Dynamic>(scope.as_rhai_mut(), &ast)
            .map_err(|e| MochaError::expression(expression, e))
    }

    /// Run a script against `scope` and return the value of its last statement.
    ///
    /// Functions the script declares join the render-wide library; top-level
    /// variables stay in `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::Expression`] when the script does not compile or
    /// fails at runtime.
    pub fn execute(&mut self, source: &str, scope: &mut Scope) -> Result<Dynamic> {
        let ast = self
            .engine
            .compile_with_scope(scope.as_rhai(), source)
            .map_err(|e| MochaError::expression(source, e))?;
        let program = self.library.merge(&ast);
        self.library = program.clone_functions_only();
        debug!("Script library now holds {} function(s)", self.library.iter_functions().count());

        self.engine
            .eval_ast_with_scope::<Dynamic>(scope.as_rhai_mut(), &program)
            .map_err(|e| MochaError::expression(source, e))
    }
}
