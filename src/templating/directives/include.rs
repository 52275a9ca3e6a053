//! `data-include`: append the content of server templates to an element.
//!
//! Two reference forms are understood, after `${}` interpolation of the
//! attribute value:
//! - `selector`: matches among the server templates of the current document
//! - `@location[:selector]`: matches among the server templates of an external
//!   document; without a selector every container matches
//!
//! The children of every match are cloned and appended to the element in
//! order. Server scripts of an external match run once against the element's
//! scope before its children are copied; the script elements themselves are
//! not copied.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{Directive, Invocation, Outcome};
use crate::core::Result;
use crate::markup::{Selector, select};
use crate::script::Scope;
use crate::templating::processor::{
    Renderer, is_server_script, malformed, server_scripts, server_templates,
};

static EXTERNAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@([^:]+)(:(.+))?$").expect("include pattern should be a valid regex")
});

/// The `include` directive.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeDirective;

impl Directive for IncludeDirective {
    fn apply(
        &self,
        renderer: &mut Renderer<'_>,
        invocation: &Invocation<'_>,
        scope: &mut Scope,
    ) -> Result<Outcome> {
        let reference = renderer
            .interpolate(invocation.expression, scope)?
            .unwrap_or_else(|| invocation.expression.to_string());
        let reference = reference.trim();

        if reference.starts_with('@') {
            include_external(renderer, invocation, reference, scope)?;
        } else {
            include_local(renderer, invocation, reference)?;
        }

        renderer.remove_attribute(invocation.node, invocation.attribute);
        Ok(Outcome::Descend)
    }
}

fn parse_selector(invocation: &Invocation<'_>, text: &str) -> Result<Selector> {
    Selector::parse(text.trim()).map_err(|e| malformed(invocation, e.to_string()))
}

fn include_local(
    renderer: &mut Renderer<'_>,
    invocation: &Invocation<'_>,
    reference: &str,
) -> Result<()> {
    let selector = parse_selector(invocation, reference)?;
    let doc = renderer.document_mut();
    let containers = server_templates(doc, doc.root());
    let matches = select(doc, &containers, &selector);
    debug!("Including {} local match(es) for '{reference}'", matches.len());

    for found in matches {
        for child in doc.children(found).to_vec() {
            let copy = doc.deep_clone(child);
            doc.append_child(invocation.node, copy);
        }
    }
    Ok(())
}

fn include_external(
    renderer: &mut Renderer<'_>,
    invocation: &Invocation<'_>,
    reference: &str,
    scope: &mut Scope,
) -> Result<()> {
    let captures = EXTERNAL.captures(reference).ok_or_else(|| {
        malformed(invocation, format!("'{reference}' is not of the form @location[:selector]"))
    })?;
    let location = captures.get(1).map_or("", |m| m.as_str()).trim();
    if location.is_empty() {
        return Err(malformed(invocation, "missing location"));
    }

    let resources = renderer.resources();
    let source = resources.template(location)?;
    let containers = server_templates(&source, source.root());
    let matches = match captures.get(3) {
        Some(selector) => select(&source, &containers, &parse_selector(invocation, selector.as_str())?),
        None => containers,
    };
    debug!("Including {} match(es) from {location}", matches.len());

    for found in matches {
        for script in server_scripts(&source, found) {
            let code = resources.script_source(&source, script)?;
            renderer.host_mut().execute(&code, scope)?;
        }

        let doc = renderer.document_mut();
        for &child in source.children(found) {
            if source.element(child).is_some_and(is_server_script) {
                continue;
            }
            let copy = doc.import(&source, child);
            for nested in server_scripts(doc, copy) {
                doc.detach(nested);
            }
            doc.append_child(invocation.node, copy);
        }
    }
    Ok(())
}
