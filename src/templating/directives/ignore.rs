use super::{Directive, Invocation, Outcome};
use crate::core::Result;
use crate::script::Scope;
use crate::templating::processor::Renderer;

/// `data-ignore`: leave the element's other directives and its children
/// untouched for this pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreDirective;

impl Directive for IgnoreDirective {
    fn apply(
        &self,
        renderer: &mut Renderer<'_>,
        invocation: &Invocation<'_>,
        _scope: &mut Scope,
    ) -> Result<Outcome> {
        renderer.remove_attribute(invocation.node, invocation.attribute);
        Ok(Outcome::Stop)
    }
}
