//! Compiler configuration.
//!
//! Loads an optional TOML file; every field has a default so a partial file
//! (or none at all) is valid.

use crate::error::Policy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default cumulative serialized size (bytes) at which a shard is flushed.
pub const DEFAULT_SHARD_THRESHOLD: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub policy: Policy,
    /// Also load the interface files of third-party modules.
    pub include_modules: bool,
    /// Run the variant simplifier before publishing the database.
    pub simplify: bool,
    /// Shared definitions, loaded before any other file. Must exist.
    pub common_file: String,
    /// Root manifest of the core interface.
    pub manifest_file: String,
    /// Directory (relative to the root) holding module interface files.
    pub module_dir: PathBuf,
    /// Directories (relative to the root) searched in order when locating a
    /// file by name. The root itself is always searched first.
    pub search_dirs: Vec<PathBuf>,
    pub shard_threshold: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            policy: Policy::Tolerant,
            include_modules: false,
            simplify: true,
            common_file: "i-common-definitions.xml".to_string(),
            manifest_file: "i-context.xml".to_string(),
            module_dir: PathBuf::from("modules"),
            search_dirs: Vec::new(),
            shard_threshold: DEFAULT_SHARD_THRESHOLD,
        }
    }
}

impl CompilerConfig {
    /// Load config from a TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("cannot parse {}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "policy = \"strict\"\ninclude_modules = true").unwrap();
        let config = CompilerConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.policy, Policy::Strict);
        assert!(config.include_modules);
        assert!(config.simplify);
        assert_eq!(config.common_file, "i-common-definitions.xml");
        assert_eq!(config.shard_threshold, DEFAULT_SHARD_THRESHOLD);
    }

    #[test]
    fn search_dirs_are_read_in_order() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "search_dirs = [\"mkiv\", \"mkxl\"]").unwrap();
        let config = CompilerConfig::load_from_path(file.path()).unwrap();
        assert_eq!(
            config.search_dirs,
            vec![PathBuf::from("mkiv"), PathBuf::from("mkxl")]
        );
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "policy = \"lenient\"").unwrap();
        assert!(CompilerConfig::load_from_path(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = CompilerConfig::load_from_path(Path::new("/no/such/ctxdoc.toml")).unwrap_err();
        assert!(err.contains("cannot read"));
    }
}
