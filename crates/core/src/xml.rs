//! Owned XML element trees built on `quick-xml`.
//!
//! Interface files are small enough to hold in memory, and every later
//! stage walks them several times, so the event stream is folded into a
//! plain tree once. Namespace prefixes are dropped (`cd:command` becomes
//! `command`); text nodes carry no information in the interface grammar and
//! are discarded.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `true` when the attribute is present and equal to `yes`.
    pub fn flag(&self, key: &str) -> bool {
        self.attr(key) == Some("yes")
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All elements in the subtree (including `self`) with the given local
    /// name, in document order.
    pub fn descendants_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        if self.name == name {
            out.push(self);
        }
        for child in &self.children {
            child.descendants_named(name, out);
        }
    }
}

/// Parse a complete document into its root element.
pub fn parse(text: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("at byte {}: {}", reader.buffer_position(), e))?;
        match event {
            Event::Start(start) => stack.push(open(&start)?),
            Event::Empty(start) => {
                let element = open(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "closing tag without an open element".to_string())?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element <{}>", open.name));
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

fn open(start: &BytesStart) -> Result<Element, String> {
    let mut element = Element::new(String::from_utf8_lossy(start.local_name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        element.attrs.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), String> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(format!("second root element <{}>", element.name)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_namespace_prefixes_and_text() {
        let doc = r#"<?xml version="1.0"?>
<cd:interface xmlns:cd="http://www.pragma-ade.com/commands">
  <cd:command name="foo" file="foo.mkiv">
    some prose
    <cd:arguments><cd:content/></cd:arguments>
  </cd:command>
</cd:interface>"#;
        let root = parse(doc).unwrap();
        assert_eq!(root.name, "interface");
        assert!(root.attrs.is_empty(), "xmlns bindings are not attributes");
        let command = root.child("command").unwrap();
        assert_eq!(command.attr("name"), Some("foo"));
        assert_eq!(command.children.len(), 1);
        assert_eq!(command.children[0].children[0].name, "content");
    }

    #[test]
    fn unescapes_attribute_values() {
        let root = parse(r#"<constant value="a&amp;b"/>"#).unwrap();
        assert_eq!(root.attr("value"), Some("a&b"));
    }

    #[test]
    fn flag_is_yes_only() {
        let root = parse(r#"<keywords list="yes" optional="no"/>"#).unwrap();
        assert!(root.flag("list"));
        assert!(!root.flag("optional"));
        assert!(!root.flag("missing"));
    }

    #[test]
    fn mismatched_end_tag_is_an_error() {
        assert!(parse("<a><b></a>").is_err());
    }

    #[test]
    fn unclosed_element_is_an_error() {
        let err = parse("<a><b/>").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn empty_document_is_an_error() {
        assert!(parse("   ").is_err());
    }

    #[test]
    fn descendants_are_collected_in_document_order() {
        let root = parse(
            r#"<interface><define name="a"/><x><define name="b"/></x><define name="c"/></interface>"#,
        )
        .unwrap();
        let mut out = Vec::new();
        root.descendants_named("define", &mut out);
        let names: Vec<_> = out.iter().filter_map(|e| e.attr("name")).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
