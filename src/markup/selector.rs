//! A small CSS selector subset.
//!
//! Supported: comma separated alternatives of descendant chains of compound
//! selectors built from `tag`, `*`, `#id`, `.class`, `[attr]` and
//! `[attr=value]` with bare, single or double quoted values.
//!
//! ```rust
//! use mocha_template::markup::{Selector, parse, select};
//!
//! let doc = parse(r#"<div id="a"><p class="x">1</p></div><p class="x y">2</p>"#).unwrap();
//! let selector = Selector::parse("div p.x, p.y").unwrap();
//! assert_eq!(select(&doc, &[doc.root()], &selector).len(), 2);
//! ```

use std::fmt;

use super::{Document, Element, NodeId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attributes.is_empty()
    }

    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && *tag != element.name {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| element.classes().any(|c| c == class)) {
            return false;
        }
        self.attributes.iter().all(|(name, expected)| match (element.attr(name), expected) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Vec<Compound>>,
}

/// Why a selector did not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError {
    /// The selector text
    pub selector: String,
    /// What was wrong with it
    pub reason: String,
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid selector '{}': {}", self.selector, self.reason)
    }
}

impl std::error::Error for SelectorError {}

impl Selector {
    /// Parse selector text.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] for empty alternatives, unterminated
    /// attribute brackets or characters outside the supported subset.
    pub fn parse(text: &str) -> Result<Self, SelectorError> {
        let fail = |reason: &str| SelectorError {
            selector: text.to_string(),
            reason: reason.to_string(),
        };

        let mut alternatives = Vec::new();
        for alternative in text.split(',') {
            let mut chain = Vec::new();
            for part in alternative.split_whitespace() {
                chain.push(parse_compound(part).map_err(|reason| fail(&reason))?);
            }
            if chain.is_empty() {
                return Err(fail("empty selector"));
            }
            alternatives.push(chain);
        }

        Ok(Self {
            alternatives,
        })
    }

    /// Whether the element `id` matches any alternative.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.alternatives.iter().any(|chain| matches_chain(doc, id, chain))
    }
}

fn matches_chain(doc: &Document, id: NodeId, chain: &[Compound]) -> bool {
    let Some((last, ancestors)) = chain.split_last() else {
        return false;
    };
    let Some(element) = doc.element(id) else {
        return false;
    };
    if !last.matches(element) {
        return false;
    }

    let mut remaining = ancestors;
    let mut current = doc.parent(id);
    while let Some((wanted, rest)) = remaining.split_last() {
        let Some(node) = current else {
            return false;
        };
        if doc.element(node).is_some_and(|e| wanted.matches(e)) {
            remaining = rest;
        }
        current = doc.parent(node);
    }
    true
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn take_name(chars: &[char], mut i: usize) -> (String, usize) {
    let start = i;
    while i < chars.len() && is_name_char(chars[i]) {
        i += 1;
    }
    (chars[start..i].iter().collect(), i)
}

fn parse_compound(part: &str) -> Result<Compound, String> {
    let chars: Vec<char> = part.chars().collect();
    let mut compound = Compound::default();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if i == 0 => {
                compound.tag = Some("*".to_string());
                i += 1;
            }
            '#' | '.' => {
                let (name, next) = take_name(&chars, i + 1);
                if name.is_empty() {
                    return Err(format!("missing name after '{}'", chars[i]));
                }
                if chars[i] == '#' {
                    compound.id = Some(name);
                } else {
                    compound.classes.push(name);
                }
                i = next;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == ']')
                    .ok_or_else(|| "unterminated attribute selector".to_string())?;
                let inner: String = chars[i + 1..i + close].iter().collect();
                compound.attributes.push(parse_attribute(&inner)?);
                i += close + 1;
            }
            c if is_name_char(c) && i == 0 => {
                let (name, next) = take_name(&chars, i);
                compound.tag = Some(name.to_ascii_lowercase());
                i = next;
            }
            c => return Err(format!("unsupported character '{c}'")),
        }
    }

    if compound.is_empty() {
        return Err("empty compound selector".to_string());
    }
    Ok(compound)
}

fn parse_attribute(inner: &str) -> Result<(String, Option<String>), String> {
    let (name, value) = match inner.split_once('=') {
        Some((name, value)) => {
            let value = value.trim();
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (name.trim(), Some(unquoted.to_string()))
        }
        None => (inner.trim(), None),
    };
    if name.is_empty() || !name.chars().all(is_name_char) {
        return Err(format!("invalid attribute name '{name}'"));
    }
    Ok((name.to_ascii_lowercase(), value))
}

/// Elements matching `selector` among `containers` and their descendants,
/// in document order without duplicates.
pub fn select(doc: &Document, containers: &[NodeId], selector: &Selector) -> Vec<NodeId> {
    let mut found = Vec::new();
    for &container in containers {
        let candidates = std::iter::once(container).chain(doc.descendants(container));
        for id in candidates {
            if selector.matches(doc, id) && !found.contains(&id) {
                found.push(id);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse;

    fn ids(doc: &Document, selector: &str) -> Vec<String> {
        let selector = Selector::parse(selector).unwrap();
        select(doc, &[doc.root()], &selector)
            .into_iter()
            .map(|id| doc.element(id).and_then(|e| e.attr("id")).unwrap_or_default().to_string())
            .collect()
    }

    const DOC: &str = r#"<section id="s"><div id="a" class="card big"><p id="b" data-role='x'></p></div><p id="c" class="card"></p></section>"#;

    #[test]
    fn test_simple_selectors() {
        let doc = parse(DOC).unwrap();
        assert_eq!(ids(&doc, "p"), vec!["b", "c"]);
        assert_eq!(ids(&doc, "#a"), vec!["a"]);
        assert_eq!(ids(&doc, ".card"), vec!["a", "c"]);
        assert_eq!(ids(&doc, "div.card.big"), vec!["a"]);
        assert_eq!(ids(&doc, "[data-role]"), vec!["b"]);
        assert_eq!(ids(&doc, "[data-role=\"x\"]"), vec!["b"]);
        assert_eq!(ids(&doc, "[data-role=y]"), Vec::<String>::new());
    }

    #[test]
    fn test_lists_and_descendants() {
        let doc = parse(DOC).unwrap();
        assert_eq!(ids(&doc, "#c, #a"), vec!["a", "c"]);
        assert_eq!(ids(&doc, "div p"), vec!["b"]);
        assert_eq!(ids(&doc, "section .card"), vec!["a", "c"]);
    }

    #[test]
    fn test_container_itself_is_searched() {
        let doc = parse(DOC).unwrap();
        let section = doc.children(doc.root())[0];
        let selector = Selector::parse("section").unwrap();
        assert_eq!(select(&doc, &[section], &selector), vec![section]);
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("a,").is_err());
        assert!(Selector::parse("[x").is_err());
        assert!(Selector::parse("a > b").is_err());
        assert!(Selector::parse("#").is_err());
    }
}
