//! Pass 1: locate and parse interface files, following `interfacefile`
//! inclusions transitively.

use crate::config::CompilerConfig;
use crate::error::{CompileError, Policy};
use crate::source::{CorpusSource, FileSystemSource};
use crate::xml::{self, Element};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// One parsed interface file.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    /// File name as it appears in diagnostics.
    pub name: String,
    pub root: Element,
}

/// Load the whole corpus under `root` from the filesystem.
pub fn load_corpus(root: &Path, config: &CompilerConfig) -> Result<Vec<LoadedFile>, CompileError> {
    load_corpus_with_source(root, config, &FileSystemSource)
}

/// Load the whole corpus under `root` using the given [`CorpusSource`].
///
/// Files come back in load order: the common definitions file first, then
/// the root manifest and its inclusions, then module files (when enabled)
/// and theirs. Each file is loaded at most once.
pub fn load_corpus_with_source(
    root: &Path,
    config: &CompilerConfig,
    source: &dyn CorpusSource,
) -> Result<Vec<LoadedFile>, CompileError> {
    let search = search_dirs(root, config);

    // The shared definitions are required regardless of policy: without
    // them nearly every `resolve` in the corpus would fail.
    let common_path = locate(&config.common_file, &search, None, source)?;
    let common = read_and_parse(&common_path, source)?;

    let mut loader = Loader {
        search,
        source,
        policy: config.policy,
        visited: HashSet::new(),
        queue: VecDeque::new(),
        files: Vec::new(),
    };
    loader.visited.insert(common_path.clone());
    loader.accept(common_path, common);

    loader.queue.push_back(Pending::Named {
        name: config.manifest_file.clone(),
        referrer: None,
    });
    if config.include_modules {
        for path in source.list_files(&root.join(&config.module_dir)) {
            if path.extension().is_some_and(|e| e == "xml") {
                loader.queue.push_back(Pending::Path(path));
            }
        }
    }

    loader.drain()?;
    tracing::info!(files = loader.files.len(), "interface corpus loaded");
    Ok(loader.files)
}

enum Pending {
    Named {
        name: String,
        referrer: Option<PathBuf>,
    },
    Path(PathBuf),
}

struct Loader<'a> {
    search: Vec<PathBuf>,
    source: &'a dyn CorpusSource,
    policy: Policy,
    visited: HashSet<PathBuf>,
    queue: VecDeque<Pending>,
    files: Vec<LoadedFile>,
}

impl Loader<'_> {
    fn drain(&mut self) -> Result<(), CompileError> {
        while let Some(pending) = self.queue.pop_front() {
            let path = match pending {
                Pending::Named { name, referrer } => {
                    match locate(&name, &self.search, referrer.as_deref(), self.source) {
                        Ok(path) => path,
                        Err(err) => {
                            self.policy.handle(err)?;
                            continue;
                        }
                    }
                }
                Pending::Path(path) => path,
            };
            if !self.visited.insert(path.clone()) {
                continue;
            }
            match read_and_parse(&path, self.source) {
                Ok(root) => self.accept(path, root),
                Err(err) => self.policy.handle(err)?,
            }
        }
        Ok(())
    }

    /// Record a parsed file and schedule the files it includes.
    fn accept(&mut self, path: PathBuf, root: Element) {
        let mut includes = Vec::new();
        root.descendants_named("interfacefile", &mut includes);
        let referrer = path.parent().map(Path::to_path_buf);
        for include in includes {
            match include.attr("filename") {
                Some(name) if !name.is_empty() => self.queue.push_back(Pending::Named {
                    name: name.to_string(),
                    referrer: referrer.clone(),
                }),
                _ => tracing::warn!(file = %path.display(), "interfacefile without filename"),
            }
        }
        tracing::debug!(file = %path.display(), "loaded interface file");
        self.files.push(LoadedFile {
            name: display_name(&path),
            root,
        });
    }
}

fn search_dirs(root: &Path, config: &CompilerConfig) -> Vec<PathBuf> {
    let mut dirs = vec![root.to_path_buf()];
    dirs.extend(config.search_dirs.iter().map(|d| root.join(d)));
    dirs
}

/// Find `name` in the search directories, then next to the including file.
/// The first existing candidate wins.
pub fn locate(
    name: &str,
    search: &[PathBuf],
    referrer: Option<&Path>,
    source: &dyn CorpusSource,
) -> Result<PathBuf, CompileError> {
    search
        .iter()
        .map(PathBuf::as_path)
        .chain(referrer)
        .map(|dir| dir.join(name))
        .find(|candidate| source.is_file(candidate))
        .ok_or_else(|| CompileError::Locate {
            file: name.to_string(),
        })
}

/// Read, decode and parse one file. The source is released before parsing.
pub fn read_and_parse(path: &Path, source: &dyn CorpusSource) -> Result<Element, CompileError> {
    let file = display_name(path);
    let bytes = source.read_bytes(path).map_err(|_| CompileError::Locate {
        file: file.clone(),
    })?;
    let text = String::from_utf8(bytes).map_err(|e| CompileError::XmlParse {
        file: file.clone(),
        message: format!("not valid UTF-8: {}", e),
    })?;
    xml::parse(&text).map_err(|message| CompileError::XmlParse { file, message })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
