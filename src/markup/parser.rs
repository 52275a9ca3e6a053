//! HTML tokenizing on top of `quick-xml`.
//!
//! `quick-xml` is an XML reader, so a few HTML rules are layered on top:
//! - end tag names are not checked and unmatched end tags are ignored
//! - void elements never take children, with or without `/>`
//! - `script` and `style` bodies are read raw up to their end tag
//! - attribute values may be unquoted or missing; duplicates keep the first
//! - HTML5 named entities are decoded in text and attribute values
//! - element and attribute names are lowercased
//!
//! Elements left open at the end of input are closed implicitly.

use quick_xml::Reader;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use tracing::{trace, warn};

use super::{Attribute, Document, Element, NodeId, NodeKind, is_raw_text, is_void};
use crate::core::{MochaError, Result};

/// Parse an HTML document or fragment.
///
/// # Errors
///
/// Returns [`MochaError::Markup`] when `quick-xml` cannot tokenize the input,
/// for example on an unterminated tag or attribute quote.
pub fn parse(input: &str) -> Result<Document> {
    TreeBuilder::new(input).run()
}

/// Text content of a markup fragment.
///
/// Tags are removed and `script`/`style` bodies dropped; entities are decoded.
/// A `<` that cannot open a tag (not followed by a letter, `/` or `!`) is
/// text. Input that still does not tokenize is kept as decoded text; the
/// serializer escapes it on output.
pub fn strip_markup(value: &str) -> String {
    if !value.contains('<') {
        return decode(value);
    }
    match parse(&escape_bare_lt(value)) {
        Ok(doc) => {
            let mut out = String::new();
            collect_text(&doc, doc.root(), &mut out);
            out
        }
        Err(e) => {
            trace!("Keeping untokenizable fragment as text: {e}");
            decode(value)
        }
    }
}

fn escape_bare_lt(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        let opens_tag = chars
            .peek()
            .is_some_and(|&next| next.is_ascii_alphabetic() || matches!(next, '/' | '!'));
        if c == '<' && !opens_tag {
            out.push_str("&lt;");
        } else {
            out.push(c);
        }
    }
    out
}

fn collect_text(doc: &Document, id: NodeId, out: &mut String) {
    for &child in doc.children(id) {
        match doc.kind(child) {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(element) if is_raw_text(&element.name) => {}
            NodeKind::Element(_) => collect_text(doc, child, out),
            _ => {}
        }
    }
}

fn reader_for(input: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(input);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.expand_empty_elements = false;
    config.trim_text(false);
    reader
}

fn decode(raw: &str) -> String {
    match unescape_with(raw, resolve_html5_entity) {
        Ok(text) => text.into_owned(),
        Err(_) => decode_lenient(raw),
    }
}

/// Decode entity by entity; a stray `&` or unknown entity is plain text in HTML.
fn decode_lenient(raw: &str) -> String {
    let mut segments = raw.split('&');
    let mut out = segments.next().unwrap_or_default().to_string();
    for segment in segments {
        let decoded = segment.find(';').and_then(|end| {
            let entity = format!("&{};", &segment[..end]);
            unescape_with(&entity, resolve_html5_entity).ok().map(|text| (text.into_owned(), end + 1))
        });
        match decoded {
            Some((text, consumed)) => {
                out.push_str(&text);
                out.push_str(&segment[consumed..]);
            }
            None => {
                out.push('&');
                out.push_str(segment);
            }
        }
    }
    out
}

fn lowercase_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

struct TreeBuilder<'a> {
    input: &'a str,
    doc: Document,
    open: Vec<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            doc: Document::new(),
            open: Vec::new(),
        }
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or_else(|| self.doc.root())
    }

    fn run(mut self) -> Result<Document> {
        let input = self.input;
        let mut base = 0usize;
        let mut reader = reader_for(input);

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(MochaError::Markup {
                        position: base + reader.error_position() as usize,
                        reason: e.to_string(),
                    });
                }
            };

            match event {
                Event::Start(start) => {
                    let id = self.open_element(&start);
                    let name = self.element_name(id);
                    if is_raw_text(&name) {
                        let body_start = base + reader.buffer_position() as usize;
                        let resume = self.read_raw_body(id, &name, body_start);
                        base = resume;
                        reader = reader_for(&input[resume..]);
                    } else if !is_void(&name) {
                        self.open.push(id);
                    }
                }
                Event::Empty(start) => {
                    self.open_element(&start);
                }
                Event::End(end) => {
                    let name = lowercase_name(end.name().as_ref());
                    let doc = &self.doc;
                    match self.open.iter().rposition(|&id| doc.is_element_named(id, &name)) {
                        Some(index) => self.open.truncate(index),
                        None if is_void(&name) => {}
                        None => warn!("Ignoring unmatched end tag </{name}>"),
                    }
                }
                Event::Text(text) => {
                    let raw = String::from_utf8_lossy(&text);
                    self.push_text(&decode(&raw));
                }
                Event::CData(data) => {
                    self.push_text(&String::from_utf8_lossy(&data));
                }
                Event::Comment(comment) => {
                    let body = String::from_utf8_lossy(&comment).into_owned();
                    let id = self.doc.create(NodeKind::Comment(body));
                    self.doc.append_child(self.current(), id);
                }
                Event::DocType(doctype) => {
                    let body = String::from_utf8_lossy(&doctype).trim().to_string();
                    let id = self.doc.create(NodeKind::Doctype(body));
                    self.doc.append_child(self.current(), id);
                }
                Event::Decl(_) | Event::PI(_) => {
                    trace!("Skipping processing instruction");
                }
                Event::Eof => break,
            }
        }

        Ok(self.doc)
    }

    fn element_name(&self, id: NodeId) -> String {
        self.doc.element(id).map(|e| e.name.clone()).unwrap_or_default()
    }

    fn open_element(&mut self, start: &BytesStart<'_>) -> NodeId {
        let mut element = Element::new(lowercase_name(start.name().as_ref()));
        for attribute in start.html_attributes().with_checks(false).flatten() {
            let name = lowercase_name(attribute.key.as_ref());
            if element.has_attr(&name) {
                continue;
            }
            let raw = String::from_utf8_lossy(&attribute.value);
            element.attributes.push(Attribute {
                name,
                value: decode(&raw),
            });
        }
        let id = self.doc.create_element(element);
        self.doc.append_child(self.current(), id);
        id
    }

    /// Store the raw body of a `script`/`style` element starting at
    /// `body_start` and return the offset just past its end tag.
    fn read_raw_body(&mut self, id: NodeId, name: &str, body_start: usize) -> usize {
        let rest = &self.input[body_start..];
        let closing = format!("</{name}");
        let (body_len, resume) = match rest.to_ascii_lowercase().find(&closing) {
            Some(end) => {
                let after = rest[end..].find('>').map_or(rest.len(), |gt| end + gt + 1);
                (end, body_start + after)
            }
            None => (rest.len(), self.input.len()),
        };

        if body_len > 0 {
            let text = self.doc.create_text(&rest[..body_len]);
            self.doc.append_child(id, text);
        }
        resume
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let parent = self.current();
        if let Some(&last) = self.doc.children(parent).last() {
            if let NodeKind::Text(existing) = self.doc.kind_mut(last) {
                existing.push_str(text);
                return;
            }
        }
        let id = self.doc.create_text(text);
        self.doc.append_child(parent, id);
    }
}
