//! Template rendering for Mocha.
//!
//! A Mocha template is plain HTML with four kinds of server-side markup:
//!
//! - **Directives**: `data-if`, `data-for-item[-index]`, `data-set-name`,
//!   `data-include` and `data-ignore` attributes (see [`directives`])
//! - **Interpolation**: `${expression}` spans in text and attribute values
//! - **Server scripts**: `<script type="server/rhai">` elements, optionally
//!   with a `src`, run once before rendering
//! - **Server templates**: `<template data-type="server/template">` partials,
//!   only visible through `data-include`
//!
//! Comments starting with `server-comment` are dropped from the output.
//!
//! # Rendering
//!
//! [`TemplateEngine::parse`] renders a document in four steps:
//! 1. every server script is collected in document order, removed, and the
//!    concatenated source runs once against the global scope
//! 2. the tree is processed depth-first (see [`processor`])
//! 3. server templates are removed
//! 4. the tree is serialized back to HTML
//!
//! [`TemplateEngine::exec`] only runs step 1 and returns the value of the
//! last script statement, for API-style requests.
//!
//! # Example
//!
//! ```rust
//! use mocha_template::templating::TemplateEngine;
//!
//! let html = r#"<ul><li data-for-item="items">${item}</li></ul>"#;
//! let mut engine = TemplateEngine::from_html(html)?;
//! engine.put_json("items", "[1, 2.5, \"three\"]")?;
//! assert_eq!(engine.parse()?, "<ul><li>1</li><li>2.5</li><li>three</li></ul>");
//! # Ok::<(), mocha_template::core::MochaError>(())
//! ```

pub mod directives;
pub mod interpolation;
pub mod output;
pub mod processor;

pub use output::ApiOutputFormat;
pub use processor::Renderer;

use std::path::Path;
use std::sync::Arc;

use rhai::Dynamic;
use tracing::debug;

use crate::cache::ResourceCaches;
use crate::core::{MochaError, Result};
use crate::markup::{self, Document};
use crate::resolver::{FileResolver, MemoryResolver, ResourceResolver};
use crate::script::{Scope, ScriptHost};
use directives::DirectiveRegistry;
use processor::{Resources, server_scripts, server_templates};

/// Renders one template.
///
/// An engine is single-use: [`parse`](Self::parse), [`exec`](Self::exec) and
/// [`exec_to`](Self::exec_to) consume it. Engines are cheap to build; the
/// expensive parts (cached scripts and partials, the directive registry) are
/// shared through `Arc`s.
pub struct TemplateEngine {
    document: Document,
    host: ScriptHost,
    globals: Scope,
    resolver: Arc<dyn ResourceResolver>,
    caches: Arc<ResourceCaches>,
    registry: Arc<DirectiveRegistry>,
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("globals", &self.globals)
            .field("resolver", &self.resolver)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl TemplateEngine {
    /// Create an engine for an already parsed document.
    ///
    /// External references fail with
    /// [`ResourceNotFound`](MochaError::ResourceNotFound) until a resolver is
    /// set with [`with_resolver`](Self::with_resolver).
    pub fn new(document: Document) -> Self {
        Self {
            document,
            host: ScriptHost::new(),
            globals: Scope::new(),
            resolver: Arc::new(MemoryResolver::new()),
            caches: ResourceCaches::shared(),
            registry: directives::registry::global(),
        }
    }

    /// Parse `html` into a new engine.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::Markup`] if the document does not parse.
    pub fn from_html(html: &str) -> Result<Self> {
        Ok(Self::new(markup::parse(html)?))
    }

    /// Read and parse the template at `path`.
    ///
    /// External references resolve relative to the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::Io`] if the file cannot be read and
    /// [`MochaError::Markup`] if it does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path)?;
        let engine = Self::from_html(&html)?;
        match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => Ok(engine.with_resolver(FileResolver::new(dir)?)),
            None => Ok(engine.with_resolver(FileResolver::new(".")?)),
        }
    }

    /// Resolve external scripts and templates through `resolver`.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl ResourceResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Resolve external scripts and templates through a shared resolver.
    #[must_use]
    pub fn with_shared_resolver(mut self, resolver: Arc<dyn ResourceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Use `caches` instead of the process-wide caches.
    #[must_use]
    pub fn with_caches(mut self, caches: Arc<ResourceCaches>) -> Self {
        self.caches = caches;
        self
    }

    /// Use `registry` instead of the process-wide directive registry.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<DirectiveRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// The script host, e.g. to register host functions or record types.
    pub fn script_host_mut(&mut self) -> &mut ScriptHost {
        &mut self.host
    }

    /// The parsed document as it currently stands.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Bind a global variable.
    pub fn put<T: Clone + Send + Sync + 'static>(&mut self, name: &str, value: T) {
        self.globals.set(name, Dynamic::from(value));
    }

    /// Bind a global variable to the value of a JSON document.
    ///
    /// Objects become maps, arrays become arrays; numbers become integers
    /// when they fit, floats otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::InvalidJson`] if `json` does not parse.
    pub fn put_json(&mut self, name: &str, json: &str) -> Result<()> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| MochaError::InvalidJson {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        self.put_value(name, &value)
    }

    /// Bind a global variable to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::InvalidJson`] if the value cannot be represented
    /// in scripts.
    pub fn put_value(&mut self, name: &str, value: &serde_json::Value) -> Result<()> {
        let dynamic = rhai::serde::to_dynamic(value).map_err(|e| MochaError::InvalidJson {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.globals.set(name, dynamic);
        Ok(())
    }

    /// Render the template to HTML.
    ///
    /// # Errors
    ///
    /// Any failing script, expression, directive or resource aborts the
    /// render; no partial output is produced.
    pub fn parse(mut self) -> Result<String> {
        self.run_prologue()?;

        let resources = Resources::new(self.resolver.as_ref(), self.caches.as_ref());
        let root = self.document.root();
        let mut renderer =
            Renderer::new(&mut self.document, &mut self.host, resources, self.registry.as_ref());
        renderer.process_children(root, &mut self.globals)?;

        for template in server_templates(&self.document, root) {
            self.document.detach(template);
        }

        Ok(markup::serialize(&self.document))
    }

    /// Run the server scripts only and return the value of the last statement.
    ///
    /// # Errors
    ///
    /// Returns the first script or resource error.
    pub fn exec(mut self) -> Result<Dynamic> {
        self.run_prologue()
    }

    /// Run the server scripts and marshal the result into `format`.
    ///
    /// # Errors
    ///
    /// Returns the first script or resource error, or a marshalling error.
    pub fn exec_to(self, format: ApiOutputFormat) -> Result<String> {
        let value = self.exec()?;
        format.render(&value)
    }

    /// Collect, remove and run every server script of the document.
    fn run_prologue(&mut self) -> Result<Dynamic> {
        let resources = Resources::new(self.resolver.as_ref(), self.caches.as_ref());
        let scripts = server_scripts(&self.document, self.document.root());

        let mut source = String::new();
        for &script in &scripts {
            source.push_str(&resources.script_source(&self.document, script)?);
            source.push('\n');
        }
        for &script in &scripts {
            self.document.detach(script);
        }

        if source.trim().is_empty() {
            return Ok(Dynamic::UNIT);
        }
        debug!("Running {} server script(s)", scripts.len());
        self.host.execute(&source, &mut self.globals)
    }
}
