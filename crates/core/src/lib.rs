#![allow(clippy::result_large_err)]
//! ctxdoc-core: ConTeXt interface compiler.
//!
//! Turns the XML interface corpus shipped with ConTeXt into a
//! [`CommandDatabase`] mapping command names to their argument syntaxes,
//! for editor completion and hover documentation.
//!
//! # Public API
//!
//! - [`compile()`] -- run the full pipeline over a corpus root
//! - [`CommandDatabase`] -- the immutable result, with lookup and sharding
//! - [`CompilerConfig`] / [`Policy`] -- what to load and how to fail
//! - [`CompileError`] -- scoped compilation error
//!
//! Individual pass entry functions are also re-exported for selective
//! pipeline execution.

pub mod compile;
pub mod config;
pub mod database;
pub mod encode;
pub mod error;
pub mod pass1_load;
pub mod pass2_definitions;
pub mod pass3_commands;
pub mod pass4_simplify;
pub mod rebuild;
pub mod source;
pub mod syntax;
pub mod xml;

// ── Convenience re-exports: key types ────────────────────────────────

pub use config::CompilerConfig;
pub use database::{CommandDatabase, CommandEntry, ShardReader};
pub use encode::{DefinitionItem, DefinitionTable};
pub use error::{CompileError, Policy};
pub use rebuild::RebuildRegistry;
pub use syntax::{ElementKind, GenericKind, SyntaxElement, SyntaxVariant};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use compile::{compile, compile_with_source};
pub use pass1_load::load_corpus;
pub use pass2_definitions::{
    collect_definitions_pass1, collect_definitions_pass2, resolve_definitions,
};
pub use pass3_commands::collect_commands;
pub use pass4_simplify::simplify;
