//! Syntax encoder: turns argument and definition nodes into canonical
//! [`SyntaxElement`]s.
//!
//! The same encoder serves both definition passes and command encoding; the
//! only difference is how `resolve` is treated (see [`Resolution`]).

use crate::error::CompileError;
use crate::syntax::{ElementKind, SyntaxElement, Tag};
use crate::xml::Element;
use std::collections::{BTreeMap, HashMap};

/// One item of a definition's (or any node's) content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionItem {
    /// A literal keyword or value fragment.
    Fragment(String),
    /// A reference to another command whose settings are inherited.
    Inherit(String),
    /// A named assignment key with its possible values.
    Parameter {
        name: String,
        values: Vec<String>,
        inherits: Vec<String>,
    },
    /// A complete argument.
    Element(SyntaxElement),
}

/// Name to content table built by the definition resolver.
pub type DefinitionTable = HashMap<String, Vec<DefinitionItem>>;

/// How `resolve` nodes are handled.
#[derive(Debug, Clone, Copy)]
pub enum Resolution<'a> {
    /// Forward references cannot be resolved yet; `resolve` yields nothing.
    Deferred,
    /// Look references up; a missing name is an error.
    Table(&'a DefinitionTable),
}

/// Encoder scoped to one `define` or `command`, so errors can name it.
pub struct Encoder<'a> {
    pub file: &'a str,
    pub name: &'a str,
    pub resolution: Resolution<'a>,
}

/// Children of a keywords/assignments/parameter node, flattened.
#[derive(Default)]
struct Collected {
    fragments: Vec<String>,
    inherits: Vec<String>,
    parameters: BTreeMap<String, Vec<String>>,
}

impl Encoder<'_> {
    /// Encode the children of an `arguments` node into one variant's
    /// elements, in order.
    pub fn arguments(&self, arguments: &Element) -> Result<Vec<SyntaxElement>, CompileError> {
        let mut elements = Vec::new();
        for child in &arguments.children {
            for item in self.items(child)? {
                match item {
                    DefinitionItem::Fragment(text) => elements.push(SyntaxElement::constant(text)),
                    DefinitionItem::Element(element) => elements.push(element),
                    DefinitionItem::Inherit(_) => return Err(self.unexpected("inherit")),
                    DefinitionItem::Parameter { .. } => return Err(self.unexpected("parameter")),
                }
            }
        }
        Ok(elements)
    }

    /// Encode one node of any known kind.
    pub fn items(&self, node: &Element) -> Result<Vec<DefinitionItem>, CompileError> {
        let tag = Tag::from_name(&node.name).ok_or_else(|| self.unexpected(&node.name))?;
        let items = match tag {
            Tag::Constant => vec![DefinitionItem::Fragment(self.constant(node)?)],
            Tag::Keywords => vec![DefinitionItem::Element(self.keywords(node)?)],
            Tag::Assignments => vec![DefinitionItem::Element(self.assignments(node)?)],
            Tag::Parameter => {
                let collected = self.collect(node)?;
                if !collected.parameters.is_empty() {
                    return Err(self.unexpected("parameter"));
                }
                vec![DefinitionItem::Parameter {
                    name: node.attr("name").unwrap_or_default().to_string(),
                    values: collected.fragments,
                    inherits: collected.inherits,
                }]
            }
            Tag::Inherit => vec![DefinitionItem::Inherit(
                node.attr("name").unwrap_or_default().to_string(),
            )],
            Tag::Resolve => self.resolve(node)?,
            Tag::Delimiter => {
                let mut element =
                    SyntaxElement::delimiter(format!("\\{}", node.attr("name").unwrap_or_default()));
                element.optional = node.flag("optional");
                vec![DefinitionItem::Element(element)]
            }
            Tag::Generic(kind) => vec![DefinitionItem::Element(SyntaxElement::generic(
                kind,
                node.flag("optional"),
            ))],
        };
        Ok(items)
    }

    fn resolve(&self, node: &Element) -> Result<Vec<DefinitionItem>, CompileError> {
        let reference = node.attr("name").unwrap_or_default();
        match self.resolution {
            Resolution::Deferred => Ok(Vec::new()),
            Resolution::Table(table) => {
                table
                    .get(reference)
                    .cloned()
                    .ok_or_else(|| CompileError::UnresolvedReference {
                        file: self.file.to_string(),
                        name: self.name.to_string(),
                        reference: reference.to_string(),
                    })
            }
        }
    }

    /// Literal fragment: prefix, type, name and value, each escaped.
    fn constant(&self, node: &Element) -> Result<String, CompileError> {
        let part = |key: &str| quick_xml::escape::escape(node.attr(key).unwrap_or_default()).into_owned();
        let joiner = match node.attr("method") {
            None => "",
            Some("range") => ":",
            Some("apply") => "->",
            Some("factor") => "*",
            Some(other) => return Err(self.unsupported("method", other)),
        };
        let prefix = part("prefix");
        let body = format!("{}{}{}", part("type"), part("name"), part("value"));
        let text = if prefix.is_empty() {
            body
        } else {
            format!("{}{}{}", prefix, joiner, body)
        };
        if node.flag("default") {
            Ok(format!("<u>{}</u>", text))
        } else {
            Ok(text)
        }
    }

    fn keywords(&self, node: &Element) -> Result<SyntaxElement, CompileError> {
        let collected = self.collect(node)?;
        if !collected.parameters.is_empty() {
            return Err(self.unexpected("parameter"));
        }
        let inner = if node.flag("list") { "...,..." } else { "..." };
        Ok(SyntaxElement {
            kind: ElementKind::Keywords(collected.fragments),
            rendering: self.delimited(node, inner)?,
            inherits: collected.inherits,
            optional: node.flag("optional"),
        })
    }

    fn assignments(&self, node: &Element) -> Result<SyntaxElement, CompileError> {
        let collected = self.collect(node)?;
        if !collected.fragments.is_empty() {
            return Err(self.unexpected("constant"));
        }
        let inner = if node.flag("list") {
            "..,..=..,.."
        } else {
            "..=.."
        };
        Ok(SyntaxElement {
            kind: ElementKind::Assignments(collected.parameters),
            rendering: self.delimited(node, inner)?,
            inherits: collected.inherits,
            optional: node.flag("optional"),
        })
    }

    /// Wrap `inner` in the delimiters named by the `delimiters` attribute.
    fn delimited(&self, node: &Element, inner: &str) -> Result<String, CompileError> {
        let (open, close) = match node.attr("delimiters") {
            None | Some("brackets") => ("[", "]"),
            Some("braces") => ("{", "}"),
            Some("parenthesis") => ("(", ")"),
            Some("none") => ("", ""),
            Some(other) => return Err(self.unsupported("delimiters", other)),
        };
        Ok(format!("{}{}{}", open, inner, close))
    }

    fn collect(&self, node: &Element) -> Result<Collected, CompileError> {
        let mut out = Collected::default();
        for child in &node.children {
            for item in self.items(child)? {
                match item {
                    DefinitionItem::Fragment(text) => out.fragments.push(text),
                    DefinitionItem::Inherit(name) => out.inherits.push(name),
                    DefinitionItem::Parameter {
                        name,
                        values,
                        inherits,
                    } => {
                        out.parameters.entry(name).or_default().extend(values);
                        out.inherits.extend(inherits);
                    }
                    DefinitionItem::Element(element) => {
                        out.inherits.extend(element.inherits);
                        match element.kind {
                            ElementKind::Keywords(items) => out.fragments.extend(items),
                            ElementKind::Assignments(map) => {
                                for (name, values) in map {
                                    out.parameters.entry(name).or_default().extend(values);
                                }
                            }
                            ElementKind::Constant(text) => out.fragments.push(text),
                            ElementKind::Delimiter | ElementKind::Generic(_) => {
                                out.fragments.push(element.rendering)
                            }
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    fn unexpected(&self, tag: &str) -> CompileError {
        CompileError::UnexpectedTag {
            file: self.file.to_string(),
            name: self.name.to_string(),
            tag: tag.to_string(),
        }
    }

    fn unsupported(&self, attribute: &str, value: &str) -> CompileError {
        CompileError::UnsupportedValue {
            file: self.file.to_string(),
            name: self.name.to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }
}
