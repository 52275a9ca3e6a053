//! Attribute directives.
//!
//! A directive is an attribute named `data-<instruction>(-<argument>)*` whose
//! instruction is registered in the [`DirectiveRegistry`]. The attribute value
//! is the directive's expression, taken verbatim. For example
//! `data-for-item-index="items"` invokes `for` with arguments `item` and
//! `index` and the expression `items`.
//!
//! Built-in instructions:
//!
//! | instruction | arguments | effect |
//! |---|---|---|
//! | `ignore` | none | leave the element and its subtree untouched |
//! | `if` | none | remove the element unless the expression is truthy |
//! | `set` | variable | bind the expression's value for the element's subtree |
//! | `for` | item, optional index | repeat the element once per value |
//! | `include` | none | append the children of matching server templates |
//!
//! Attributes named like a directive but with an unregistered instruction are
//! ordinary attributes and get interpolated.

mod condition;
mod ignore;
mod include;
mod iteration;
pub mod registry;
mod set;

pub use condition::{ConditionDirective, is_truthy};
pub use ignore::IgnoreDirective;
pub use include::IncludeDirective;
pub use iteration::{IterationDirective, Pairs, iteration_pairs};
pub use registry::DirectiveRegistry;
pub use set::SetDirective;

use crate::constants::{DIRECTIVE_PREFIX, DIRECTIVE_SEPARATOR};
use crate::core::Result;
use crate::markup::NodeId;
use crate::script::Scope;
use crate::templating::processor::Renderer;

/// What the processor does after a directive ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Keep going with the next attribute
    Continue,
    /// Skip the remaining attributes and the children
    Stop,
    /// Skip the remaining attributes but process the children
    Descend,
}

/// One directive attribute being applied to an element.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// The element carrying the attribute
    pub node: NodeId,
    /// Full attribute name, e.g. `data-for-item-index`
    pub attribute: &'a str,
    /// Instruction, e.g. `for`
    pub instruction: &'a str,
    /// Positional arguments, e.g. `["item", "index"]`
    pub arguments: &'a [String],
    /// Attribute value
    pub expression: &'a str,
}

/// An attribute-driven instruction.
///
/// Directives receive the element's node-local scope by `&mut`: bindings
/// written there are visible to the element's subtree only.
pub trait Directive: Send + Sync {
    /// Apply the directive to `invocation.node`.
    ///
    /// # Errors
    ///
    /// Any error aborts the render.
    fn apply(
        &self,
        renderer: &mut Renderer<'_>,
        invocation: &Invocation<'_>,
        scope: &mut Scope,
    ) -> Result<Outcome>;
}

/// Split a directive attribute name into instruction and arguments.
///
/// Returns `None` for names without the `data-` prefix or with empty or
/// non-alphanumeric tokens (`_` is allowed).
///
/// ```rust
/// use mocha_template::templating::directives::parse_directive_name;
///
/// let (instruction, args) = parse_directive_name("data-for-item-index").unwrap();
/// assert_eq!(instruction, "for");
/// assert_eq!(args, vec!["item", "index"]);
/// assert!(parse_directive_name("class").is_none());
/// ```
pub fn parse_directive_name(name: &str) -> Option<(&str, Vec<String>)> {
    let rest = name.strip_prefix(DIRECTIVE_PREFIX)?;
    let mut tokens = rest.split(DIRECTIVE_SEPARATOR);
    let instruction = tokens.next().filter(|t| is_token(t))?;

    let mut arguments = Vec::new();
    for token in tokens {
        if !is_token(token) {
            return None;
        }
        arguments.push(token.to_string());
    }
    Some((instruction, arguments))
}

fn is_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_and_arguments() {
        let (instruction, args) =
            parse_directive_name("data-instruction-argument1-argument2-argument3").unwrap();
        assert_eq!(instruction, "instruction");
        assert_eq!(args, vec!["argument1", "argument2", "argument3"]);
    }

    #[test]
    fn test_no_arguments() {
        let (instruction, args) = parse_directive_name("data-if").unwrap();
        assert_eq!(instruction, "if");
        assert!(args.is_empty());
    }

    #[test]
    fn test_not_directives() {
        for name in ["width", "data-", "data--x", "data-for-", "data-a.b", "xdata-if"] {
            assert!(parse_directive_name(name).is_none(), "{name}");
        }
    }

    #[test]
    fn test_underscore_in_arguments() {
        let (_, args) = parse_directive_name("data-set-page_title").unwrap();
        assert_eq!(args, vec!["page_title"]);
    }
}
