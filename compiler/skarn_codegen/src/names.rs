//! Lexical scopes for the lowering walk.
//!
//! `Scope` wraps `im::HashMap` so saving a scope before a block and
//! restoring it afterwards is an O(1) structural-sharing clone. The
//! context keeps one scope for the current function's locals; every
//! module keeps another for its globals, and lookup falls through from
//! the first to the second.

use im::HashMap;
use skarn_ir::Name;
use skarn_types::{FunType, ModuleId, Type};

use crate::context::Value;
use crate::generics::TemplateId;

/// What a name resolves to.
#[derive(Clone, Debug)]
pub enum Binding {
    /// Mutable storage: the typed pointer (a local register or a global
    /// symbol) and the stored type.
    Slot { ptr: String, ty: Type },

    /// An immediate value: a constant, a module reference, a kind.
    Value(Value),

    /// A concrete function known by symbol, without a template: external
    /// declarations.
    Func { symbol: String, fun: FunType },

    /// A registered declaration awaiting instantiation.
    Template(TemplateId),

    /// A bounded overload set; members are resolved against the home
    /// module at each call site.
    Mix { module: ModuleId, members: Vec<Name> },

    /// A type alias.
    Ty(Type),
}

/// A lexical scope with O(1) save and restore.
#[derive(Clone, Default)]
pub struct Scope {
    bindings: HashMap<Name, Binding>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name, shadowing any previous binding.
    pub fn bind(&mut self, name: Name, binding: Binding) {
        self.bindings.insert(name, binding);
    }

    /// Look up a name in this scope only.
    pub fn lookup(&self, name: Name) -> Option<&Binding> {
        self.bindings.get(&name)
    }

    /// Every slot binding, ordered by name id.
    ///
    /// Closure capture walks this list, and its order decides the
    /// capture-record field order, so it must not depend on hash
    /// iteration.
    pub fn slots_sorted(&self) -> Vec<(Name, String, Type)> {
        let mut slots: Vec<(Name, String, Type)> = self
            .bindings
            .iter()
            .filter_map(|(name, binding)| match binding {
                Binding::Slot { ptr, ty } => Some((*name, ptr.clone(), ty.clone())),
                _ => None,
            })
            .collect();
        slots.sort_by_key(|(name, _, _)| name.raw());
        slots
    }
}
