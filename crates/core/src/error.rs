use serde::{Deserialize, Serialize};

/// A compilation error. Every variant is scoped to one file, and where it
/// applies, to one command or definition name inside that file.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    /// A named interface file was not found in any search directory.
    #[error("interface file not found: {file}")]
    Locate { file: String },

    /// The document is not well-formed XML or is not valid UTF-8.
    #[error("malformed interface file {file}: {message}")]
    XmlParse { file: String, message: String },

    /// An argument or definition child tag outside the known grammar.
    #[error("unexpected tag <{tag}> in '{name}' ({file})")]
    UnexpectedTag {
        file: String,
        name: String,
        tag: String,
    },

    /// A `resolve` with no matching `define` after both resolution passes.
    #[error("unresolved reference '{reference}' in '{name}' ({file})")]
    UnresolvedReference {
        file: String,
        name: String,
        reference: String,
    },

    /// An attribute value with no known rendering.
    #[error("unsupported {attribute}=\"{value}\" in '{name}' ({file})")]
    UnsupportedValue {
        file: String,
        name: String,
        attribute: String,
        value: String,
    },
}

impl CompileError {
    /// The interface file the error is scoped to.
    pub fn file(&self) -> &str {
        match self {
            CompileError::Locate { file }
            | CompileError::XmlParse { file, .. }
            | CompileError::UnexpectedTag { file, .. }
            | CompileError::UnresolvedReference { file, .. }
            | CompileError::UnsupportedValue { file, .. } => file,
        }
    }

    /// Short machine-readable kind, used in JSON diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            CompileError::Locate { .. } => "LocateError",
            CompileError::XmlParse { .. } => "XmlParseError",
            CompileError::UnexpectedTag { .. } => "UnexpectedTagError",
            CompileError::UnresolvedReference { .. } => "UnresolvedReferenceError",
            CompileError::UnsupportedValue { .. } => "UnsupportedValueError",
        }
    }

    /// Serialize to a flat JSON object for tooling that consumes diagnostics.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "file":    self.file(),
            "kind":    self.kind(),
            "message": self.to_string(),
        })
    }
}

/// Failure policy for one compilation.
///
/// `Tolerant` logs a scoped error and continues with the rest of the corpus;
/// `Strict` surfaces the first error to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    #[default]
    Tolerant,
    Strict,
}

impl Policy {
    /// Apply the policy to a scoped error: log and swallow it when tolerant,
    /// return it when strict.
    pub fn handle(self, err: CompileError) -> Result<(), CompileError> {
        match self {
            Policy::Tolerant => {
                tracing::warn!(kind = err.kind(), file = err.file(), "skipped: {}", err);
                Ok(())
            }
            Policy::Strict => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerant_policy_swallows_errors() {
        let err = CompileError::Locate {
            file: "i-missing.xml".to_string(),
        };
        assert!(Policy::Tolerant.handle(err).is_ok());
    }

    #[test]
    fn strict_policy_returns_the_same_error() {
        let err = CompileError::UnexpectedTag {
            file: "i-foo.xml".to_string(),
            name: "foo".to_string(),
            tag: "bogus".to_string(),
        };
        assert_eq!(Policy::Strict.handle(err.clone()), Err(err));
    }

    #[test]
    fn json_diagnostic_names_kind_and_file() {
        let err = CompileError::UnresolvedReference {
            file: "i-foo.xml".to_string(),
            name: "foo".to_string(),
            reference: "keyword-missing".to_string(),
        };
        let v = err.to_json_value();
        assert_eq!(v["kind"], "UnresolvedReferenceError");
        assert_eq!(v["file"], "i-foo.xml");
        assert!(v["message"]
            .as_str()
            .unwrap()
            .contains("keyword-missing"));
    }
}
