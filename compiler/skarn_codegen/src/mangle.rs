//! Symbol naming.
//!
//! Every emitted Skarn symbol starts with `_sk_` and joins its path
//! segments with `$`. Instantiation suffixes start with `$G` and keep
//! parameter names in place until substitution specializes them, which
//! is what lets a stored suffix be rewritten textually per instance.

use skarn_ir::{Name, StringInterner};

/// Prefix of every emitted function and global symbol.
pub const SYMBOL_PREFIX: &str = "_sk_";

/// Flatten a loader path into a symbol stem: separators become `$` and
/// the final extension is dropped.
pub fn module_stem(path: &str) -> String {
    let last_sep = path.rfind(|c| c == '/' || c == '\\');
    let end = match path.rfind('.') {
        Some(dot) if dot > last_sep.map_or(0, |s| s + 1) => dot,
        _ => path.len(),
    };
    path[..end]
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '$' } else { c })
        .collect()
}

/// Symbol of a module-level function or variable.
pub fn item_symbol(stem: &str, name: &str) -> String {
    format!("{SYMBOL_PREFIX}{stem}${name}")
}

/// Qualified stem of an aggregate declared in a module. Aggregate stems
/// carry no `_sk_` prefix; they name `%` types.
pub fn agg_stem(stem: &str, name: &str) -> String {
    format!("{stem}${name}")
}

/// Symbol of a method on an instantiated aggregate.
pub fn method_symbol(agg_stem: &str, name: &str) -> String {
    format!("{SYMBOL_PREFIX}{agg_stem}${name}")
}

/// The module initializer symbol.
pub fn init_symbol(stem: &str) -> String {
    format!("{SYMBOL_PREFIX}{stem}$__init")
}

/// The once-guard global for a module initializer.
pub fn ready_global(stem: &str) -> String {
    format!("{SYMBOL_PREFIX}{stem}$__ready")
}

/// Symbol of a partial-application forwarder: one per function token
/// and bound-argument count.
pub fn thunk_symbol(token: &str, bound: usize) -> String {
    format!("{SYMBOL_PREFIX}bind${token}${bound}")
}

/// The suffix fragment of a declaration: empty for a generic-free
/// declaration, otherwise `$G` plus the parameter names joined by `_`.
/// Substituting the active fillers into this fragment yields the
/// instantiation suffix.
pub fn generic_suffix(params: &[Name], interner: &StringInterner) -> String {
    if params.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = params.iter().map(|p| interner.lookup(*p)).collect();
    format!("$G{}", names.join("_"))
}
