//! Pass 2: definition resolution -- build the name to content table from
//! `define` elements, allowing references to definitions declared later.
//!
//! Two passes over the same files: the first records every definition with
//! its `resolve` children left empty, the second re-encodes every definition
//! against the first table and replaces it.

use crate::encode::{DefinitionItem, DefinitionTable, Encoder, Resolution};
use crate::error::{CompileError, Policy};
use crate::pass1_load::LoadedFile;
use crate::xml::Element;

/// Resolve all definitions in the corpus.
pub fn resolve_definitions(
    files: &[LoadedFile],
    policy: Policy,
) -> Result<DefinitionTable, CompileError> {
    let pass1 = collect_definitions_pass1(files);
    let pass2 = collect_definitions_pass2(files, &pass1, policy)?;
    tracing::info!(definitions = pass2.len(), "definitions resolved");
    Ok(pass2)
}

/// First pass: `resolve` yields nothing. A definition that fails to encode
/// is left out here; the second pass encodes it again and reports it.
pub fn collect_definitions_pass1(files: &[LoadedFile]) -> DefinitionTable {
    let mut table = DefinitionTable::new();
    for (file, define) in defines(files) {
        let name = define.attr("name").unwrap_or_default();
        let encoder = Encoder {
            file,
            name,
            resolution: Resolution::Deferred,
        };
        match encode_define(&encoder, define) {
            Ok(items) => {
                table.insert(name.to_string(), items);
            }
            Err(err) => tracing::debug!(file, name, "deferred definition failed: {}", err),
        }
    }
    table
}

/// Second pass: `resolve` is looked up in the first-pass table. Errors are
/// scoped to the one definition.
pub fn collect_definitions_pass2(
    files: &[LoadedFile],
    pass1: &DefinitionTable,
    policy: Policy,
) -> Result<DefinitionTable, CompileError> {
    let mut table = DefinitionTable::new();
    for (file, define) in defines(files) {
        let name = define.attr("name").unwrap_or_default();
        let encoder = Encoder {
            file,
            name,
            resolution: Resolution::Table(pass1),
        };
        match encode_define(&encoder, define) {
            Ok(items) => {
                if table.insert(name.to_string(), items).is_some() {
                    tracing::debug!(file, name, "definition redeclared; last one wins");
                }
            }
            Err(err) => policy.handle(err)?,
        }
    }
    Ok(table)
}

fn encode_define(encoder: &Encoder, define: &Element) -> Result<Vec<DefinitionItem>, CompileError> {
    let mut items = Vec::new();
    for child in &define.children {
        items.extend(encoder.items(child)?);
    }
    Ok(items)
}

/// Every `define` in the corpus, paired with its file name, in load order.
fn defines(files: &[LoadedFile]) -> Vec<(&str, &Element)> {
    let mut out = Vec::new();
    for file in files {
        let mut found = Vec::new();
        file.root.descendants_named("define", &mut found);
        out.extend(found.into_iter().map(|d| (file.name.as_str(), d)));
    }
    out
}
