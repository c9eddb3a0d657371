//! Shared syntax types for the interface compiler.
//!
//! These types are produced by the encoder and consumed by the expander,
//! the simplifier and the database. They live here so that pass modules can
//! import them without depending on each other.

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

// ──────────────────────────────────────────────
// Argument tags
// ──────────────────────────────────────────────

/// Every element tag the argument and definition grammar knows about.
///
/// Adding a kind means extending this enum, which forces every `match` over
/// it to handle the new case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Constant,
    Keywords,
    Assignments,
    Parameter,
    Inherit,
    Resolve,
    Delimiter,
    Generic(GenericKind),
}

impl Tag {
    pub fn from_name(name: &str) -> Option<Tag> {
        let tag = match name {
            "constant" => Tag::Constant,
            "keywords" => Tag::Keywords,
            "assignments" => Tag::Assignments,
            "parameter" => Tag::Parameter,
            "inherit" => Tag::Inherit,
            "resolve" => Tag::Resolve,
            "delimiter" => Tag::Delimiter,
            "content" => Tag::Generic(GenericKind::Content),
            "csname" => Tag::Generic(GenericKind::Csname),
            "text" => Tag::Generic(GenericKind::Text),
            "angles" => Tag::Generic(GenericKind::Angles),
            "template" => Tag::Generic(GenericKind::Template),
            "triplet" => Tag::Generic(GenericKind::Triplet),
            "position" => Tag::Generic(GenericKind::Position),
            "index" => Tag::Generic(GenericKind::Index),
            "apply" => Tag::Generic(GenericKind::Apply),
            _ => return None,
        };
        Some(tag)
    }
}

/// Placeholder arguments with a fixed rendering and no nested content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GenericKind {
    Content,
    Csname,
    Text,
    Angles,
    Template,
    Triplet,
    Position,
    Index,
    Apply,
}

impl GenericKind {
    pub fn tag(self) -> &'static str {
        match self {
            GenericKind::Content => "CONTENT",
            GenericKind::Csname => "CSNAME",
            GenericKind::Text => "TEXT",
            GenericKind::Angles => "ANGLES",
            GenericKind::Template => "TEMPLATE",
            GenericKind::Triplet => "TRIPLET",
            GenericKind::Position => "POSITION",
            GenericKind::Index => "INDEX",
            GenericKind::Apply => "APPLY",
        }
    }

    pub fn rendering(self) -> &'static str {
        match self {
            GenericKind::Content => "{...}",
            GenericKind::Csname => "\\...",
            GenericKind::Text => "...",
            GenericKind::Angles => "<<...>>",
            GenericKind::Template => "[|...|]",
            GenericKind::Triplet => "[x:y:z=]",
            GenericKind::Position => "(...,...)",
            GenericKind::Index => "{..+...+..}",
            GenericKind::Apply => "...->...",
        }
    }
}

// ──────────────────────────────────────────────
// Syntax elements
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Constant(String),
    Keywords(Vec<String>),
    Assignments(BTreeMap<String, Vec<String>>),
    Delimiter,
    Generic(GenericKind),
}

/// One canonical argument of a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyntaxElement {
    pub kind: ElementKind,
    pub rendering: String,
    /// Commands whose syntax this element additionally documents.
    pub inherits: Vec<String>,
    pub optional: bool,
}

impl SyntaxElement {
    pub fn constant(text: impl Into<String>) -> Self {
        let text = text.into();
        SyntaxElement {
            rendering: text.clone(),
            kind: ElementKind::Constant(text),
            inherits: Vec::new(),
            optional: false,
        }
    }

    pub fn delimiter(rendering: impl Into<String>) -> Self {
        SyntaxElement {
            kind: ElementKind::Delimiter,
            rendering: rendering.into(),
            inherits: Vec::new(),
            optional: false,
        }
    }

    pub fn generic(kind: GenericKind, optional: bool) -> Self {
        SyntaxElement {
            kind: ElementKind::Generic(kind),
            rendering: kind.rendering().to_string(),
            inherits: Vec::new(),
            optional,
        }
    }

    /// A copy of this element with the given optional flag.
    pub fn with_optional(&self, optional: bool) -> Self {
        SyntaxElement {
            optional,
            ..self.clone()
        }
    }

    /// Whether the element documents anything: content of its own or an
    /// inherited reference. Delimiters never count.
    pub fn has_content(&self) -> bool {
        let own = match &self.kind {
            ElementKind::Constant(text) => !text.is_empty(),
            ElementKind::Keywords(items) => !items.is_empty(),
            ElementKind::Assignments(map) => !map.is_empty(),
            ElementKind::Delimiter => false,
            ElementKind::Generic(_) => true,
        };
        own || !self.inherits.is_empty()
    }

    /// Serialized form: `{content, inherits, optional, rendering}`.
    pub fn to_json_value(&self) -> Value {
        let content = match &self.kind {
            ElementKind::Constant(text) => json!(text),
            ElementKind::Keywords(items) => json!(items),
            ElementKind::Assignments(map) => {
                let mut m = Map::new();
                for (name, values) in map {
                    m.insert(name.clone(), json!(values));
                }
                Value::Object(m)
            }
            ElementKind::Delimiter => json!(""),
            ElementKind::Generic(kind) => json!(kind.tag()),
        };
        let mut m = Map::new();
        m.insert("content".to_owned(), content);
        m.insert("inherits".to_owned(), json!(self.inherits));
        m.insert("optional".to_owned(), json!(self.optional));
        m.insert("rendering".to_owned(), json!(self.rendering));
        Value::Object(m)
    }
}

// ──────────────────────────────────────────────
// Variants
// ──────────────────────────────────────────────

/// One complete argument signature for a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxVariant {
    pub elements: Vec<SyntaxElement>,
    /// Source file the variant was documented in, when known.
    pub file: Option<String>,
}

impl SyntaxVariant {
    pub fn new(elements: Vec<SyntaxElement>, file: Option<String>) -> Self {
        SyntaxVariant { elements, file }
    }

    /// Structural equality of the signatures, ignoring attribution.
    pub fn same_syntax(&self, other: &SyntaxVariant) -> bool {
        self.elements == other.elements
    }

    /// Renderings joined by spaces, optional elements marked with `?`.
    /// Used as the deterministic sort key for output.
    pub fn render(&self) -> String {
        self.elements
            .iter()
            .map(|e| {
                if e.optional {
                    format!("{}?", e.rendering)
                } else {
                    e.rendering.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn arg_count(&self) -> usize {
        self.elements.iter().filter(|e| e.has_content()).count()
    }

    pub fn to_json_value(&self) -> Value {
        Value::Array(self.elements.iter().map(SyntaxElement::to_json_value).collect())
    }
}
