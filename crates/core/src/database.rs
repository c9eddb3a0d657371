//! The command database: the immutable result of a compilation, with its
//! lookup, serialization and sharding contracts.

use crate::pass4_simplify;
use crate::syntax::SyntaxVariant;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// File name of the index artifact written next to the shard directory.
pub const INDEX_FILE: &str = "index.json";
/// Directory (under the output directory) holding the shard files.
pub const SHARD_DIR: &str = "shards";

/// All documented syntaxes of one command name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandEntry {
    pub variants: Vec<SyntaxVariant>,
    /// Source files the command is documented in.
    pub files: BTreeSet<String>,
}

impl CommandEntry {
    /// Append a variant unless a structurally equal one is already present.
    /// Its file is recorded either way.
    pub fn push(&mut self, variant: SyntaxVariant) {
        if let Some(file) = &variant.file {
            self.files.insert(file.clone());
        }
        if !self.variants.iter().any(|v| v.same_syntax(&variant)) {
            self.variants.push(variant);
        }
    }

    pub fn max_arg_count(&self) -> usize {
        self.variants
            .iter()
            .map(SyntaxVariant::arg_count)
            .max()
            .unwrap_or(0)
    }

    fn sort(&mut self) {
        self.variants.sort_by_cached_key(SyntaxVariant::render);
    }

    pub fn to_json_value(&self) -> Value {
        json!({
            "files": self.files.iter().collect::<Vec<_>>(),
            "syntax_variants": self
                .variants
                .iter()
                .map(SyntaxVariant::to_json_value)
                .collect::<Vec<_>>(),
        })
    }
}

/// Immutable name to entry map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandDatabase {
    entries: BTreeMap<String, CommandEntry>,
    arg_counts: BTreeMap<String, usize>,
}

/// A group of consecutive entries, named after its last key.
#[derive(Debug, Clone, PartialEq)]
pub struct Shard {
    pub key: String,
    pub entries: Map<String, Value>,
}

impl CommandDatabase {
    /// Build from raw (unsimplified) entries. The arg-count index is taken
    /// here, so it is the same for the raw and the simplified database.
    pub fn from_entries(entries: BTreeMap<String, CommandEntry>) -> Self {
        let arg_counts = entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.max_arg_count()))
            .collect();
        let mut db = CommandDatabase {
            entries,
            arg_counts,
        };
        db.entries.values_mut().for_each(CommandEntry::sort);
        db
    }

    /// A new database with every entry's variants simplified.
    pub fn simplified(&self) -> Self {
        let mut entries = self.entries.clone();
        let mut merged = 0usize;
        for entry in entries.values_mut() {
            let before = entry.variants.len();
            entry.variants = pass4_simplify::simplify(&entry.variants);
            entry.sort();
            merged += before - entry.variants.len();
        }
        tracing::info!(merged, "variants simplified");
        CommandDatabase {
            entries,
            arg_counts: self.arg_counts.clone(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.get(name)
    }

    /// Variants of `name`, ordered by rendered text.
    pub fn variants(&self, name: &str) -> Option<&[SyntaxVariant]> {
        self.entries.get(name).map(|e| e.variants.as_slice())
    }

    pub fn arg_count(&self, name: &str) -> Option<usize> {
        self.arg_counts.get(name).copied()
    }

    /// Command names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `{name: {syntax_variants, files}}` with keys sorted.
    pub fn to_detail_json(&self) -> Value {
        let mut m = Map::new();
        for (name, entry) in &self.entries {
            m.insert(name.clone(), entry.to_json_value());
        }
        Value::Object(m)
    }

    /// Sorted `"<max_arg_count>:<name>"` strings.
    pub fn to_index(&self) -> Vec<String> {
        let mut index: Vec<String> = self
            .arg_counts
            .iter()
            .filter(|(name, _)| self.entries.contains_key(*name))
            .map(|(name, count)| format!("{}:{}", count, name))
            .collect();
        index.sort();
        index
    }

    /// Group entries in name order, flushing a shard once its cumulative
    /// serialized size reaches `threshold` bytes.
    pub fn shard(&self, threshold: usize) -> Vec<Shard> {
        let mut shards = Vec::new();
        let mut current = Map::new();
        let mut size = 0usize;
        for (name, entry) in &self.entries {
            let value = entry.to_json_value();
            size += name.len() + to_ascii_json(&value).len();
            current.insert(name.clone(), value);
            if size >= threshold {
                shards.push(Shard {
                    key: name.clone(),
                    entries: std::mem::take(&mut current),
                });
                size = 0;
            }
        }
        if let Some(last) = current.keys().next_back().cloned() {
            shards.push(Shard {
                key: last,
                entries: current,
            });
        }
        shards
    }

    /// Write the index and the shards under `dir`.
    pub fn write(&self, dir: &Path, threshold: usize) -> std::io::Result<()> {
        let shard_dir = dir.join(SHARD_DIR);
        std::fs::create_dir_all(&shard_dir)?;
        std::fs::write(dir.join(INDEX_FILE), to_ascii_json(&json!(self.to_index())))?;
        let shards = self.shard(threshold);
        for shard in &shards {
            let path = shard_dir.join(shard_file_name(&shard.key));
            std::fs::write(path, to_ascii_json(&Value::Object(shard.entries.clone())))?;
        }
        tracing::info!(shards = shards.len(), dir = %dir.display(), "database written");
        Ok(())
    }
}

/// Serialize compactly with every non-ASCII character escaped as `\uXXXX`.
pub fn to_ascii_json(value: &Value) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len());
    let mut units = [0u16; 2];
    for c in raw.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

/// File name of the shard keyed `key`. Command names may hold path
/// separators or dots, so the key is percent-encoded.
fn shard_file_name(key: &str) -> String {
    format!("{}.json", urlencoding::encode(key))
}

/// The shard holding `name`: the smallest shard key not less than it.
/// `keys` must be sorted.
pub fn locate_shard<'k>(keys: &'k [String], name: &str) -> Option<&'k str> {
    let at = keys.partition_point(|k| k.as_str() < name);
    keys.get(at).map(String::as_str)
}

/// Lazy reader over a database written by [`CommandDatabase::write`]:
/// loads one shard per lookup.
pub struct ShardReader {
    shard_dir: PathBuf,
    keys: Vec<String>,
}

impl ShardReader {
    pub fn open(dir: &Path) -> std::io::Result<Self> {
        let shard_dir = dir.join(SHARD_DIR);
        let mut keys: Vec<String> = std::fs::read_dir(&shard_dir)?
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let file_name = e.file_name();
                let stem = file_name.to_str()?.strip_suffix(".json")?;
                urlencoding::decode(stem).ok().map(|key| key.into_owned())
            })
            .collect();
        keys.sort();
        Ok(ShardReader { shard_dir, keys })
    }

    /// Detail record of `name`, or `None` when it is not in the database.
    pub fn lookup(&self, name: &str) -> std::io::Result<Option<Value>> {
        let Some(key) = locate_shard(&self.keys, name) else {
            return Ok(None);
        };
        let text = std::fs::read_to_string(self.shard_dir.join(shard_file_name(key)))?;
        let mut shard: Map<String, Value> = serde_json::from_str(&text)?;
        Ok(shard.remove(name))
    }
}
