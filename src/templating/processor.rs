//! The recursive node processor.
//!
//! [`Renderer::process`] walks a subtree depth-first:
//! - server templates are skipped, they are only a source for includes
//! - elements get a node-local copy of the scope and run their directive
//!   attributes in declaration order until one stops; the remaining
//!   attributes are interpolated and the current children processed
//! - text nodes are interpolated; markup in the substituted values is
//!   stripped, the surrounding template text is kept as written
//! - server comments are deleted
//!
//! Children are visited from a snapshot of the child list. A child that a
//! directive detached or moved in the meantime is skipped, so removed nodes
//! are never processed.

use std::sync::Arc;

use tracing::{debug, trace};

use super::directives::{DirectiveRegistry, Invocation, Outcome, parse_directive_name};
use super::interpolation::{interpolate, interpolate_with};
use crate::cache::ResourceCaches;
use crate::constants::{SERVER_COMMENT_MARKER, SERVER_SCRIPT_TYPE, SERVER_TEMPLATE_TYPE};
use crate::core::{MochaError, Result};
use crate::markup::{self, Document, Element, NodeId, NodeKind, is_raw_text, strip_markup};
use crate::resolver::ResourceResolver;
use crate::script::{Scope, ScriptHost};

/// Whether `element` is a `<template data-type="server/template">`.
pub fn is_server_template(element: &Element) -> bool {
    element.name == "template" && element.attr("data-type") == Some(SERVER_TEMPLATE_TYPE)
}

/// Whether `element` is a `<script type="server/rhai">`.
pub fn is_server_script(element: &Element) -> bool {
    element.name == "script" && element.attr("type") == Some(SERVER_SCRIPT_TYPE)
}

/// Whether a comment body marks a server comment.
pub fn is_server_comment(body: &str) -> bool {
    body.trim_start()
        .strip_prefix(SERVER_COMMENT_MARKER)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Server template containers below `id`, in document order.
pub fn server_templates(doc: &Document, id: NodeId) -> Vec<NodeId> {
    doc.descendants(id)
        .into_iter()
        .filter(|&node| doc.element(node).is_some_and(is_server_template))
        .collect()
}

/// Server script elements below `id`, in document order.
pub fn server_scripts(doc: &Document, id: NodeId) -> Vec<NodeId> {
    doc.descendants(id)
        .into_iter()
        .filter(|&node| doc.element(node).is_some_and(is_server_script))
        .collect()
}

/// Access to external scripts and templates through the shared caches.
#[derive(Clone, Copy)]
pub struct Resources<'r> {
    resolver: &'r dyn ResourceResolver,
    caches: &'r ResourceCaches,
}

impl<'r> Resources<'r> {
    /// Bundle a resolver with the caches it feeds.
    pub fn new(resolver: &'r dyn ResourceResolver, caches: &'r ResourceCaches) -> Self {
        Self {
            resolver,
            caches,
        }
    }

    /// Body of the script at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::ResourceNotFound`] for unknown locations.
    pub fn script(&self, location: &str) -> Result<Arc<str>> {
        let key = self.resolver.locate(location)?;
        self.caches.scripts.get_or_try_insert_with(&key.location, key.modified, || {
            debug!("Loading script {}", key.location);
            self.resolver.read(&key).map(Arc::from)
        })
    }

    /// Parsed document at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::ResourceNotFound`] for unknown locations and
    /// [`MochaError::Markup`] if the document does not parse.
    pub fn template(&self, location: &str) -> Result<Arc<Document>> {
        let key = self.resolver.locate(location)?;
        self.caches.templates.get_or_try_insert_with(&key.location, key.modified, || {
            debug!("Loading template {}", key.location);
            let content = self.resolver.read(&key)?;
            markup::parse(&content).map(Arc::new)
        })
    }

    /// Full source of a server script element of `doc`: the external body
    /// named by `src`, if any, followed by the inline body.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::ResourceNotFound`] if `src` does not resolve.
    pub fn script_source(&self, doc: &Document, script: NodeId) -> Result<String> {
        let mut source = String::new();
        if let Some(src) = doc.element(script).and_then(|e| e.attr("src")) {
            source.push_str(&self.script(src)?);
            source.push('\n');
        }
        source.push_str(&doc.text_content(script));
        Ok(source)
    }
}

/// Walks and rewrites one document during a render.
pub struct Renderer<'r> {
    doc: &'r mut Document,
    host: &'r mut ScriptHost,
    resources: Resources<'r>,
    registry: &'r DirectiveRegistry,
}

impl<'r> Renderer<'r> {
    /// Create a renderer over `doc`.
    pub fn new(
        doc: &'r mut Document,
        host: &'r mut ScriptHost,
        resources: Resources<'r>,
        registry: &'r DirectiveRegistry,
    ) -> Self {
        Self {
            doc,
            host,
            resources,
            registry,
        }
    }

    /// The document being rendered
    pub fn document(&self) -> &Document {
        &*self.doc
    }

    /// Mutable access to the document being rendered
    pub fn document_mut(&mut self) -> &mut Document {
        &mut *self.doc
    }

    /// The script host of this render
    pub fn host(&self) -> &ScriptHost {
        &*self.host
    }

    /// Mutable access to the script host, e.g. to run scripts
    pub fn host_mut(&mut self) -> &mut ScriptHost {
        &mut *self.host
    }

    /// External resources of this render
    pub fn resources(&self) -> Resources<'r> {
        self.resources
    }

    /// Evaluate an expression against `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::Expression`] on compile or runtime failure.
    pub fn evaluate(&self, expression: &str, scope: &mut Scope) -> Result<rhai::Dynamic> {
        self.host.evaluate(expression, scope)
    }

    /// Interpolate `${}` spans of `text` against `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`MochaError::Expression`] if a span fails.
    pub fn interpolate(&self, text: &str, scope: &mut Scope) -> Result<Option<String>> {
        interpolate(&*self.host, text, scope)
    }

    /// Remove an attribute from an element of the document.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(element) = self.doc.element_mut(node) {
            element.remove_attr(name);
        }
    }

    /// Process `node` and its subtree with `scope` as the enclosing scope.
    ///
    /// # Errors
    ///
    /// The first failing directive, expression or resource aborts the walk.
    pub fn process(&mut self, node: NodeId, scope: &mut Scope) -> Result<()> {
        match self.doc.kind(node) {
            NodeKind::Element(element) if is_server_template(element) => {
                trace!("Skipping server template");
                Ok(())
            }
            NodeKind::Element(_) => self.process_element(node, scope),
            NodeKind::Text(text) => {
                let in_raw_text = self
                    .doc
                    .parent(node)
                    .and_then(|parent| self.doc.element(parent))
                    .is_some_and(|parent| is_raw_text(&parent.name));
                if in_raw_text {
                    return Ok(());
                }
                let text = text.clone();
                if let Some(value) = interpolate_with(&*self.host, &text, scope, strip_markup)? {
                    *self.doc.kind_mut(node) = NodeKind::Text(value);
                }
                Ok(())
            }
            NodeKind::Comment(body) if is_server_comment(body) => {
                trace!("Removing server comment");
                self.doc.detach(node);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Process the current children of `node` with `scope`.
    ///
    /// # Errors
    ///
    /// The first failing child aborts the walk.
    pub fn process_children(&mut self, node: NodeId, scope: &mut Scope) -> Result<()> {
        let children = self.doc.children(node).to_vec();
        for child in children {
            if self.doc.parent(child) != Some(node) {
                continue;
            }
            self.process(child, scope)?;
        }
        Ok(())
    }

    fn process_element(&mut self, node: NodeId, scope: &Scope) -> Result<()> {
        let mut local = scope.child();
        let attributes = match self.doc.element(node) {
            Some(element) => element.attributes.clone(),
            None => return Ok(()),
        };

        let registry = self.registry;
        let mut consumed: Vec<String> = Vec::new();
        for attribute in &attributes {
            let Some((instruction, arguments)) = parse_directive_name(&attribute.name) else {
                continue;
            };
            let Some(directive) = registry.lookup(instruction) else {
                continue;
            };

            debug!("Applying {}=\"{}\"", attribute.name, attribute.value);
            let invocation = Invocation {
                node,
                attribute: &attribute.name,
                instruction,
                arguments: &arguments,
                expression: &attribute.value,
            };
            let outcome = directive.apply(self, &invocation, &mut local)?;
            consumed.push(attribute.name.clone());

            match outcome {
                Outcome::Continue => {}
                Outcome::Stop => return Ok(()),
                Outcome::Descend => break,
            }
        }

        let pending: Vec<(String, String)> = self
            .doc
            .element(node)
            .map(|element| {
                element
                    .attributes
                    .iter()
                    .filter(|a| !consumed.contains(&a.name))
                    .map(|a| (a.name.clone(), a.value.clone()))
                    .collect()
            })
            .unwrap_or_default();
        for (name, value) in pending {
            if let Some(interpolated) = interpolate(&*self.host, &value, &mut local)? {
                if let Some(element) = self.doc.element_mut(node) {
                    element.set_attr(&name, interpolated);
                }
            }
        }

        self.process_children(node, &mut local)
    }
}

/// Build the error for a directive used with the wrong arguments.
pub(crate) fn malformed(invocation: &Invocation<'_>, reason: impl Into<String>) -> MochaError {
    MochaError::malformed(invocation.attribute, reason)
}
