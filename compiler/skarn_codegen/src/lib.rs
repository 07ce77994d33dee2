//! Textual LLVM IR backend for the Skarn compiler.
//!
//! This crate turns a fully type-checked AST (see `skarn_ir`) into one
//! textual IR unit. The front end stays outside: it supplies modules
//! through [`ModuleLoader`] and prints the [`Error`] this crate returns.
//!
//! # Architecture
//!
//! ```text
//! ModuleLoader (front-end seam)
//!        ↓
//!     module        orchestrator: memoized per-path generation,
//!        ↓          initializers, entry-point synthesis
//!   stmt / expr     one dispatch per node kind, emitting through Cx
//!        ↓
//! call / matching / template / generics
//!        ↓
//!   skarn_types     encodings, layout, substitution, registry
//! ```
//!
//! Everything mutable lives in the compilation context (`Cx`): the
//! module cache, the instantiation cache, the string-constant table,
//! and the output buffers. One [`compile_program`] call is a pure
//! function of the loader's contents; nothing survives it.
//!
//! Failures split in two. Conditions only this crate can detect after
//! type checking (a missing entry point, an unloadable import, runaway
//! generic recursion) come back as [`Error`]. Violations of what the
//! checking pass was supposed to guarantee abort through
//! [`ice!`](skarn_ir::ice) and are never caught.

use std::rc::Rc;

use skarn_ir::ast;
use skarn_ir::StringInterner;
use thiserror::Error as ThisError;

mod call;
mod context;
mod expr;
mod func;
mod generics;
mod mangle;
mod matching;
mod module;
mod names;
mod runtime;
mod stmt;
mod template;
mod types;

pub use context::{Cx, Value};
pub use generics::GENERIC_RECURSION_LIMIT;

/// Source of parsed, type-checked modules, keyed by loader path.
///
/// The seam to the external front end. `load` returning `None` for a
/// path the program imports is a user-facing [`Error::MissingModule`];
/// everything else about the returned module is trusted.
pub trait ModuleLoader {
    fn load(&self, path: &str) -> Option<Rc<ast::Module>>;
}

/// User-facing failures.
///
/// The (external) driver prints these and exits nonzero. Anything the
/// checking pass should have ruled out aborts instead of landing here.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The root module declares no `main`.
    #[error("program has no `main` function")]
    MissingMain,

    /// `main` exists but is not a zero-argument, void, non-generic
    /// function.
    #[error("`main` must be a function taking no arguments and returning nothing")]
    BadMainSignature,

    /// An imported path the loader cannot supply.
    #[error("cannot load module `{path}`")]
    MissingModule { path: String },

    /// Mutually recursive instantiation kept demanding new fillers past
    /// the depth limit.
    #[error("generic recursion while instantiating `{name}` (limit {limit})")]
    GenericRecursion { name: String, limit: usize },
}

/// Result alias for the user-facing error class.
pub type Result<T> = std::result::Result<T, Error>;

/// Lower the program rooted at `root_path` to one textual IR unit.
///
/// Loads and generates every reachable module exactly once, synthesizes
/// the entry function around the root module's `main`, and returns the
/// assembled unit with hoisted declarations ahead of the instruction
/// stream. Output is deterministic: the same loader contents yield
/// byte-identical text.
pub fn compile_program(
    interner: &StringInterner,
    loader: &dyn ModuleLoader,
    root_path: &str,
) -> Result<String> {
    let mut cx = Cx::new(interner, loader);
    runtime::emit_prelude(&mut cx);
    let path = interner.intern(root_path);
    let root = module::generate(&mut cx, path)?;
    module::emit_entry(&mut cx, root)?;
    Ok(cx.output())
}
