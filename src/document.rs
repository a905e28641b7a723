//! Element tree over `bkr job-results` XML, built with `quick-xml`.
//!
//! The job-results schema is consumed, not validated: only the
//! elements and attributes the extractor reads need to exist.

use crate::error::ReportError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One XML element: tag, attributes in document order, child elements
/// in document order. Text content is not retained; the job-results
/// format carries everything of interest in attributes.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute lookup that fails with enough context to locate the
    /// offending element in the report.
    pub fn require_attr(&self, name: &str) -> Result<&str, ReportError> {
        self.attr(name).ok_or_else(|| ReportError::MissingAttribute {
            element: self.tag.clone(),
            id: self.attr("id").unwrap_or("?").to_string(),
            attr: name.to_string(),
        })
    }

    /// All descendants with the given tag, in document order. The
    /// element itself is never included, and the search crosses every
    /// nesting level (a guest recipe's tasks are descendants of the
    /// hosting recipe too).
    pub fn find_all<'a>(&'a self, tag: &str) -> Vec<&'a Element> {
        let mut out = Vec::new();
        collect_descendants(self, tag, &mut out);
        out
    }
}

/// A parsed job-results document: zero or more root elements.
#[derive(Debug, Clone)]
pub struct Document {
    pub roots: Vec<Element>,
}

impl Document {
    /// All elements with the given tag anywhere in the document, in
    /// document order, roots included.
    pub fn find_all<'a>(&'a self, tag: &str) -> Vec<&'a Element> {
        let mut out = Vec::new();
        for root in &self.roots {
            if root.tag == tag {
                out.push(root);
            }
            collect_descendants(root, tag, &mut out);
        }
        out
    }
}

fn collect_descendants<'a>(el: &'a Element, tag: &str, out: &mut Vec<&'a Element>) {
    for child in &el.children {
        if child.tag == tag {
            out.push(child);
        }
        collect_descendants(child, tag, out);
    }
}

/// Parse a byte stream into a [`Document`]. Fatal on anything that is
/// not well-formed XML; no recovery is attempted.
pub fn parse_bytes(bytes: &[u8]) -> Result<Document, ReportError> {
    let xml = std::str::from_utf8(bytes)
        .map_err(|err| ReportError::Xml(format!("invalid UTF-8: {err}")))?;
    parse(xml)
}

pub fn parse(xml: &str) -> Result<Document, ReportError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut roots = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(element_from(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let el = element_from(e)?;
                attach(&mut stack, &mut roots, el);
            }
            Ok(Event::End(_)) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| ReportError::Xml("unexpected closing tag".into()))?;
                attach(&mut stack, &mut roots, el);
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(ReportError::Xml(err.to_string())),
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ReportError::Xml(format!(
            "document truncated inside <{}>",
            open.tag
        )));
    }
    if roots.is_empty() {
        return Err(ReportError::Xml("no root element".into()));
    }

    Ok(Document { roots })
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, ReportError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| ReportError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| ReportError::Xml(err.to_string()))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        tag,
        attrs,
        children: Vec::new(),
    })
}

fn attach(stack: &mut Vec<Element>, roots: &mut Vec<Element>, el: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(el),
        None => roots.push(el),
    }
}
