//! Interface compiler: XML interface corpus -> command database.
//!
//! This is a thin orchestrator that calls each pass module in order. Every
//! call builds its own tables; nothing is shared between compilations, and
//! a failed compilation publishes nothing.

use crate::config::CompilerConfig;
use crate::database::CommandDatabase;
use crate::error::CompileError;
use crate::pass1_load;
use crate::pass2_definitions;
use crate::pass3_commands;
use crate::source::{CorpusSource, FileSystemSource};
use std::path::Path;

/// Compile the corpus under `root` from the filesystem.
pub fn compile(root: &Path, config: &CompilerConfig) -> Result<CommandDatabase, CompileError> {
    compile_with_source(root, config, &FileSystemSource)
}

/// Compile the corpus under `root`, reading files through `source`.
pub fn compile_with_source(
    root: &Path,
    config: &CompilerConfig,
    source: &dyn CorpusSource,
) -> Result<CommandDatabase, CompileError> {
    // Pass 1: locate and parse every interface file
    let files = pass1_load::load_corpus_with_source(root, config, source)?;

    // Pass 2: definitions, forward references included
    let definitions = pass2_definitions::resolve_definitions(&files, config.policy)?;

    // Pass 3: expand and encode commands
    let entries = pass3_commands::collect_commands(&files, &definitions, config.policy)?;
    let raw = CommandDatabase::from_entries(entries);

    // Pass 4: simplification
    if config.simplify {
        Ok(raw.simplified())
    } else {
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Policy;
    use crate::source::InMemorySource;
    use crate::syntax::{GenericKind, SyntaxElement};

    const COMMON: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<cd:interface xmlns:cd="http://www.pragma-ade.com/commands">
  <cd:define name="argument-content">
    <cd:content/>
  </cd:define>
  <cd:define name="argument-content-optional">
    <cd:content optional="yes"/>
  </cd:define>
</cd:interface>"#;

    fn corpus(manifest: &str) -> InMemorySource {
        InMemorySource::new()
            .with_file("/ctx/i-common-definitions.xml", COMMON)
            .with_file("/ctx/i-context.xml", manifest)
    }

    #[test]
    fn resolved_content_argument_end_to_end() {
        let source = corpus(
            r#"<cd:interface xmlns:cd="http://www.pragma-ade.com/commands">
                 <cd:command name="foo" file="foo.mkiv">
                   <cd:arguments><cd:resolve name="argument-content"/></cd:arguments>
                 </cd:command>
               </cd:interface>"#,
        );
        let db = compile_with_source(Path::new("/ctx"), &CompilerConfig::default(), &source)
            .unwrap();
        assert_eq!(db.names().collect::<Vec<_>>(), vec!["foo"]);
        let variants = db.variants("foo").unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(
            variants[0].elements,
            vec![SyntaxElement::generic(GenericKind::Content, false)]
        );
        assert_eq!(variants[0].elements[0].rendering, "{...}");
        assert_eq!(db.arg_count("foo"), Some(1));
    }

    #[test]
    fn simplify_flag_controls_subsumption() {
        let source = corpus(
            r#"<cd:interface xmlns:cd="http://www.pragma-ade.com/commands">
                 <cd:command name="foo"><cd:arguments><cd:content/></cd:arguments></cd:command>
                 <cd:command name="foo"/>
               </cd:interface>"#,
        );
        let raw_config = CompilerConfig {
            simplify: false,
            ..CompilerConfig::default()
        };
        let raw = compile_with_source(Path::new("/ctx"), &raw_config, &source).unwrap();
        assert_eq!(raw.variants("foo").unwrap().len(), 2);

        let simplified =
            compile_with_source(Path::new("/ctx"), &CompilerConfig::default(), &source).unwrap();
        let variants = simplified.variants("foo").unwrap();
        assert_eq!(variants.len(), 1);
        assert!(variants[0].elements[0].optional);
        assert_eq!(raw.arg_count("foo"), simplified.arg_count("foo"));
    }

    #[test]
    fn environment_with_many_arguments_is_simplified() {
        let arguments = |n: usize| "<cd:content/>".repeat(n);
        let source = corpus(&format!(
            r#"<cd:interface xmlns:cd="http://www.pragma-ade.com/commands">
                 <cd:command name="frob" type="environment"><cd:arguments>{}</cd:arguments></cd:command>
                 <cd:command name="frob" type="environment"><cd:arguments>{}</cd:arguments></cd:command>
               </cd:interface>"#,
            arguments(9),
            arguments(8)
        ));
        let db =
            compile_with_source(Path::new("/ctx"), &CompilerConfig::default(), &source).unwrap();
        let variants = db.variants("startfrob").unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].elements.iter().filter(|e| e.optional).count(), 1);
        assert_eq!(db.arg_count("startfrob"), Some(9));
    }

    #[test]
    fn strict_compilation_surfaces_the_first_error() {
        let source = corpus(
            r#"<cd:interface xmlns:cd="http://www.pragma-ade.com/commands">
                 <cd:command name="foo"><cd:arguments><cd:bogus/></cd:arguments></cd:command>
               </cd:interface>"#,
        );
        let config = CompilerConfig {
            policy: Policy::Strict,
            ..CompilerConfig::default()
        };
        let err = compile_with_source(Path::new("/ctx"), &config, &source).unwrap_err();
        assert_eq!(err.kind(), "UnexpectedTagError");
    }
}
