//! `data-for-<item>[-<index>]`: repeat an element once per value.
//!
//! The expression is classified into ordered `(key, value)` pairs:
//!
//! | value | pairs |
//! |---|---|
//! | `"1...4"` (literal or string result) | `(0, 1)`, `(1, 2)`, `(2, 3)`, `(3, 4)` |
//! | rhai range `1..4` / `1..=4` | indices and integers, like above |
//! | array | `(index, element)` |
//! | object map | `(key, value)` in key order |
//! | other string | `(index, one-character string)` |
//! | registered [`Record`](crate::script::Record) | `(field name, field value)` |
//! | unit | nothing |
//! | anything else | `(0, value)` |
//!
//! For each pair the item (and index) are written into the element's scope,
//! the element is cloned after the previous surviving clone and the clone is
//! processed. The original element is removed at the end.

use std::ops::{Range, RangeInclusive};
use std::sync::LazyLock;

use regex::Regex;
use rhai::{Array, Dynamic, INT, Map};
use tracing::{debug, trace};

use super::{Directive, Invocation, Outcome};
use crate::core::Result;
use crate::script::{Scope, ScriptHost};
use crate::templating::processor::{Renderer, malformed};

static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.\.\.(\d+)$").expect("range pattern should be a valid regex")
});

/// The `for` directive.
#[derive(Debug, Clone, Copy, Default)]
pub struct IterationDirective;

impl Directive for IterationDirective {
    fn apply(
        &self,
        renderer: &mut Renderer<'_>,
        invocation: &Invocation<'_>,
        scope: &mut Scope,
    ) -> Result<Outcome> {
        let (item, index) = match invocation.arguments {
            [item] => (item, None),
            [item, index] => (item, Some(index)),
            other => {
                return Err(malformed(
                    invocation,
                    format!("expected an item and an optional index name, got {} name(s)", other.len()),
                ));
            }
        };

        let node = invocation.node;
        renderer.remove_attribute(node, invocation.attribute);

        let pairs = match range_pairs(invocation.expression) {
            Some(pairs) => pairs,
            None => {
                let value = renderer.evaluate(invocation.expression, scope)?;
                iteration_pairs(renderer.host(), value)
            }
        };
        debug!("Expanding {}", invocation.attribute);

        let mut anchor = node;
        for (key, value) in pairs {
            scope.set(item, value);
            if let Some(index) = index {
                scope.set(index, key);
            }

            let doc = renderer.document_mut();
            let clone = doc.deep_clone(node);
            doc.insert_after(anchor, clone);
            renderer.process(clone, scope)?;

            if renderer.document().parent(clone).is_some() {
                anchor = clone;
            } else {
                trace!("Clone was removed while processing");
            }
        }

        renderer.document_mut().detach(node);
        Ok(Outcome::Stop)
    }
}

/// Lazily produced `(key, value)` pairs of one loop.
pub type Pairs = Box<dyn Iterator<Item = (Dynamic, Dynamic)>>;

fn indexed(items: impl Iterator<Item = Dynamic> + 'static) -> Pairs {
    Box::new((0 as INT..).zip(items).map(|(i, item)| (Dynamic::from(i), item)))
}

fn range(low: INT, high: INT) -> Pairs {
    indexed((low..=high).map(Dynamic::from))
}

/// Pairs of a `low...high` range descriptor, or `None` if `text` is not one.
///
/// Bounds that do not fit an integer are not a descriptor.
pub fn range_pairs(text: &str) -> Option<Pairs> {
    let captures = RANGE.captures(text)?;
    let low = captures.get(1)?.as_str().parse::<INT>().ok()?;
    let high = captures.get(2)?.as_str().parse::<INT>().ok()?;
    Some(range(low, high))
}

/// Classify a value into the `(key, value)` pairs a loop iterates.
pub fn iteration_pairs(host: &ScriptHost, value: Dynamic) -> Pairs {
    if value.is_unit() {
        return Box::new(std::iter::empty());
    }
    if value.is_array() {
        return indexed(value.cast::<Array>().into_iter());
    }
    if value.is_map() {
        let map = value.cast::<Map>();
        return Box::new(map.into_iter().map(|(key, item)| (Dynamic::from(key.to_string()), item)));
    }
    if value.is_string() {
        let text = value.cast::<rhai::ImmutableString>();
        if let Some(pairs) = range_pairs(&text) {
            return pairs;
        }
        let chars: Vec<char> = text.chars().collect();
        return indexed(chars.into_iter().map(|c| Dynamic::from(c.to_string())));
    }
    if let Some(range) = value.read_lock::<Range<INT>>() {
        let (start, end) = (range.start, range.end);
        if end <= start {
            return Box::new(std::iter::empty());
        }
        return self::range(start, end - 1);
    }
    if let Some(range) = value.read_lock::<RangeInclusive<INT>>() {
        return self::range(*range.start(), *range.end());
    }
    if let Some(fields) = host.record_fields(&value) {
        return Box::new(fields.into_iter().map(|(name, item)| (Dynamic::from(name), item)));
    }
    indexed(std::iter::once(value))
}
