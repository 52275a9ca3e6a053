use rhai::Dynamic;
use tracing::trace;

use super::{Directive, Invocation, Outcome};
use crate::core::Result;
use crate::script::Scope;
use crate::templating::processor::Renderer;

/// `data-if`: keep the element only when the expression is truthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionDirective;

impl Directive for ConditionDirective {
    fn apply(
        &self,
        renderer: &mut Renderer<'_>,
        invocation: &Invocation<'_>,
        scope: &mut Scope,
    ) -> Result<Outcome> {
        let value = renderer.evaluate(invocation.expression, scope)?;
        if is_truthy(&value) {
            renderer.remove_attribute(invocation.node, invocation.attribute);
            Ok(Outcome::Continue)
        } else {
            trace!("Condition '{}' is false, removing element", invocation.expression);
            renderer.document_mut().detach(invocation.node);
            Ok(Outcome::Stop)
        }
    }
}

/// Truthiness of a condition value.
///
/// `false`, numeric zero, blank strings and unit are false; every other value
/// is true.
pub fn is_truthy(value: &Dynamic) -> bool {
    if value.is_unit() {
        return false;
    }
    if let Ok(flag) = value.as_bool() {
        return flag;
    }
    if let Ok(int) = value.as_int() {
        return int != 0;
    }
    if let Ok(float) = value.as_float() {
        return float != 0.0 && !float.is_nan();
    }
    if value.is_string() {
        return value.clone().into_string().is_ok_and(|s| !s.trim().is_empty());
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhai::{Array, Map};

    #[test]
    fn test_falsy_values() {
        for value in [
            Dynamic::UNIT,
            Dynamic::FALSE,
            Dynamic::from(0_i64),
            Dynamic::from(0.0_f64),
            Dynamic::from(f64::NAN),
            Dynamic::from(""),
            Dynamic::from("  \n"),
        ] {
            assert!(!is_truthy(&value), "{value:?}");
        }
    }

    #[test]
    fn test_truthy_values() {
        for value in [
            Dynamic::TRUE,
            Dynamic::from(-1_i64),
            Dynamic::from(0.5_f64),
            Dynamic::from("false"),
            Dynamic::from('x'),
            Dynamic::from(Array::new()),
            Dynamic::from(Map::new()),
        ] {
            assert!(is_truthy(&value), "{value:?}");
        }
    }
}
