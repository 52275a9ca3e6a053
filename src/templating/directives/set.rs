use super::{Directive, Invocation, Outcome};
use crate::core::Result;
use crate::script::Scope;
use crate::templating::processor::{Renderer, malformed};

/// `data-set-<name>`: bind the expression's value to `name` for the element
/// and its subtree.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetDirective;

impl Directive for SetDirective {
    fn apply(
        &self,
        renderer: &mut Renderer<'_>,
        invocation: &Invocation<'_>,
        scope: &mut Scope,
    ) -> Result<Outcome> {
        let [name] = invocation.arguments else {
            return Err(malformed(
                invocation,
                format!("expected exactly one variable name, got {}", invocation.arguments.len()),
            ));
        };

        let value = renderer.evaluate(invocation.expression, scope)?;
        scope.set(name, value);
        renderer.remove_attribute(invocation.node, invocation.attribute);
        Ok(Outcome::Continue)
    }
}
