//! Pass 3: command expansion -- turn each `command` element into concrete
//! command names and encode one syntax variant per name.

use crate::database::CommandEntry;
use crate::encode::{DefinitionItem, DefinitionTable, Encoder, Resolution};
use crate::error::{CompileError, Policy};
use crate::pass1_load::LoadedFile;
use crate::syntax::{ElementKind, SyntaxElement, SyntaxVariant};
use crate::xml::Element;
use std::collections::BTreeMap;

const DEFAULT_BEGIN: &str = "start";
const DEFAULT_END: &str = "stop";

/// Rendering of the placeholder standing for an environment's body.
pub const ENVIRONMENT_BODY: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Normal,
    Environment,
}

/// The attributes and subtrees of one `command` element, borrowed for the
/// duration of expansion.
#[derive(Debug)]
pub struct RawCommandNode<'a> {
    pub name: &'a str,
    /// Source file attribution (`file` attribute), when documented.
    pub file: Option<&'a str>,
    pub command_type: CommandType,
    pub begin: &'a str,
    pub end: &'a str,
    pub instances: Option<&'a Element>,
    pub sequence: Option<&'a Element>,
    pub arguments: Option<&'a Element>,
}

/// One piece of a name template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NamePart {
    Literal(String),
    Instance,
}

/// Collect every command in the corpus into name-keyed entries.
///
/// Errors are scoped to one `command` element: when tolerated, that command
/// contributes nothing and the rest of the corpus still loads.
pub fn collect_commands(
    files: &[LoadedFile],
    definitions: &DefinitionTable,
    policy: Policy,
) -> Result<BTreeMap<String, CommandEntry>, CompileError> {
    let mut entries: BTreeMap<String, CommandEntry> = BTreeMap::new();
    for file in files {
        let mut commands = Vec::new();
        file.root.descendants_named("command", &mut commands);
        for command in commands {
            let expanded = RawCommandNode::from_element(command, &file.name)
                .and_then(|node| node.expand(&file.name, definitions));
            match expanded {
                Ok(variants) => {
                    for (name, variant) in variants {
                        if name.is_empty() {
                            tracing::warn!(file = %file.name, "command expanded to an empty name; skipped");
                            continue;
                        }
                        entries.entry(name).or_default().push(variant);
                    }
                }
                Err(err) => policy.handle(err)?,
            }
        }
    }
    tracing::info!(commands = entries.len(), "commands expanded");
    Ok(entries)
}

impl<'a> RawCommandNode<'a> {
    pub fn from_element(element: &'a Element, source: &str) -> Result<Self, CompileError> {
        let name = element.attr("name").unwrap_or_default();
        let unsupported = |attribute: &str, value: &str| CompileError::UnsupportedValue {
            file: source.to_string(),
            name: name.to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
        };
        if name.is_empty() {
            return Err(unsupported("name", ""));
        }
        let command_type = match element.attr("type") {
            None | Some("normal") => CommandType::Normal,
            Some("environment") => CommandType::Environment,
            Some(other) => return Err(unsupported("type", other)),
        };
        Ok(RawCommandNode {
            name,
            file: element.attr("file"),
            command_type,
            begin: element.attr("begin").unwrap_or(DEFAULT_BEGIN),
            end: element.attr("end").unwrap_or(DEFAULT_END),
            instances: element.child("instances"),
            sequence: element.child("sequence"),
            arguments: element.child("arguments"),
        })
    }

    /// Expand into `(concrete name, variant)` pairs.
    pub fn expand(
        &self,
        source: &str,
        definitions: &DefinitionTable,
    ) -> Result<Vec<(String, SyntaxVariant)>, CompileError> {
        let encoder = Encoder {
            file: source,
            name: self.name,
            resolution: Resolution::Table(definitions),
        };
        let elements = match self.arguments {
            Some(arguments) => encoder.arguments(arguments)?,
            None => Vec::new(),
        };
        let template = self.template(source)?;
        let file = self.file.map(str::to_string);

        let mut out = Vec::new();
        for key in self.instance_keys(source, definitions)? {
            let name = substitute(&template, &key);
            match self.command_type {
                CommandType::Normal => {
                    out.push((name, SyntaxVariant::new(elements.clone(), file.clone())));
                }
                CommandType::Environment => {
                    let begin_name = format!("{}{}", self.begin, name);
                    let end_name = format!("{}{}", self.end, name);
                    let mut begin = elements.clone();
                    begin.push(SyntaxElement::delimiter(ENVIRONMENT_BODY));
                    begin.push(SyntaxElement::delimiter(format!("\\{}", end_name)));
                    out.push((begin_name, SyntaxVariant::new(begin, file.clone())));
                    out.push((end_name, SyntaxVariant::new(Vec::new(), file.clone())));
                }
            }
        }
        Ok(out)
    }

    /// Name fragments contributed by `instances`, or the element's own name.
    fn instance_keys(
        &self,
        source: &str,
        definitions: &DefinitionTable,
    ) -> Result<Vec<String>, CompileError> {
        let Some(instances) = self.instances else {
            return Ok(vec![self.name.to_string()]);
        };
        let mut keys = Vec::new();
        for child in &instances.children {
            match child.name.as_str() {
                "constant" => keys.push(child.attr("value").unwrap_or_default().to_string()),
                "resolve" => {
                    let reference = child.attr("name").unwrap_or_default();
                    let items = definitions.get(reference).ok_or_else(|| {
                        CompileError::UnresolvedReference {
                            file: source.to_string(),
                            name: self.name.to_string(),
                            reference: reference.to_string(),
                        }
                    })?;
                    for item in items {
                        match item {
                            DefinitionItem::Fragment(key) => keys.push(key.clone()),
                            DefinitionItem::Element(SyntaxElement {
                                kind: ElementKind::Keywords(list),
                                ..
                            }) => keys.extend(list.iter().cloned()),
                            _ => {
                                return Err(CompileError::UnsupportedValue {
                                    file: source.to_string(),
                                    name: self.name.to_string(),
                                    attribute: "resolve".to_string(),
                                    value: reference.to_string(),
                                })
                            }
                        }
                    }
                }
                other => {
                    return Err(CompileError::UnexpectedTag {
                        file: source.to_string(),
                        name: self.name.to_string(),
                        tag: other.to_string(),
                    })
                }
            }
        }
        Ok(keys)
    }

    fn template(&self, source: &str) -> Result<Vec<NamePart>, CompileError> {
        let Some(sequence) = self.sequence else {
            return Ok(Vec::new());
        };
        sequence
            .children
            .iter()
            .map(|part| match part.name.as_str() {
                "string" | "constant" | "variable" => Ok(NamePart::Literal(
                    part.attr("value").unwrap_or_default().to_string(),
                )),
                "instance" => Ok(NamePart::Instance),
                other => Err(CompileError::UnexpectedTag {
                    file: source.to_string(),
                    name: self.name.to_string(),
                    tag: other.to_string(),
                }),
            })
            .collect()
    }
}

/// Substitute `key` into the template's placeholder.
fn substitute(template: &[NamePart], key: &str) -> String {
    if template.is_empty() {
        return key.to_string();
    }
    let name: String = template
        .iter()
        .map(|part| match part {
            NamePart::Literal(text) => text.as_str(),
            NamePart::Instance => key,
        })
        .collect();
    if name.len() == 2 * key.len() && name.starts_with(key) && name.ends_with(key) {
        key.to_string()
    } else {
        name
    }
}
