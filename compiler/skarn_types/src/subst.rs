//! Type-parameter substitution.
//!
//! Substitution is applied two ways, uniformly: structurally over a
//! `Type`, and textually over symbol-name fragments. The textual form
//! exists because not-yet-instantiated generic bodies are parameterized
//! through their symbol suffixes; rewriting a suffix segment that equals
//! a bound parameter name specializes every symbol derived from it.

use crate::core::{AggRef, FunType, MixMember, Type};
use rustc_hash::FxHashMap;
use skarn_ir::{Name, StringInterner};

/// The active type environment: parameter name to concrete filler.
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    map: FxHashMap<Name, Type>,
}

impl Bindings {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a parameter name, replacing any previous binding.
    pub fn bind(&mut self, name: Name, ty: Type) {
        self.map.insert(name, ty);
    }

    /// Remove a binding (used when an inner scope shadows a name).
    pub fn unbind(&mut self, name: Name) {
        self.map.remove(&name);
    }

    /// Look up a binding by parameter name.
    pub fn lookup(&self, name: Name) -> Option<&Type> {
        self.map.get(&name)
    }

    /// Look up a binding whose parameter name spells `s`.
    ///
    /// Environments hold a handful of entries, so a scan beats keeping a
    /// second string-keyed map in sync. At most one entry can match:
    /// names are interned.
    pub fn lookup_by_str(&self, s: &str, interner: &StringInterner) -> Option<&Type> {
        self.map
            .iter()
            .find(|(name, _)| interner.lookup(**name) == s)
            .map(|(_, ty)| ty)
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if no parameters are bound.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Apply the environment structurally to a type.
///
/// Unbound parameters stay as they are; a function type's own declared
/// parameters shadow outer bindings of the same name.
pub fn substitute(ty: &Type, bindings: &Bindings, interner: &StringInterner) -> Type {
    match ty {
        Type::Void | Type::Bool | Type::Char | Type::Short | Type::Int | Type::Str => ty.clone(),
        Type::Ptr(inner) => Type::Ptr(Box::new(substitute(inner, bindings, interner))),
        Type::Array(elem, len) => {
            Type::Array(Box::new(substitute(elem, bindings, interner)), *len)
        }
        Type::Fun(fun) => Type::Fun(Box::new(substitute_fun(fun, bindings, interner))),
        Type::Struct(agg) => Type::Struct(substitute_agg(*agg, bindings, interner)),
        Type::Enum(agg) => Type::Enum(substitute_agg(*agg, bindings, interner)),
        Type::StructKind(agg) => Type::StructKind(substitute_agg(*agg, bindings, interner)),
        Type::EnumKind(agg) => Type::EnumKind(substitute_agg(*agg, bindings, interner)),
        Type::Module(id) => Type::Module(*id),
        Type::Mix(members) => Type::Mix(
            members
                .iter()
                .map(|m| MixMember {
                    symbol: m.symbol,
                    fun: substitute_fun(&m.fun, bindings, interner),
                })
                .collect(),
        ),
        Type::Var(name) => match bindings.lookup(*name) {
            Some(bound) => bound.clone(),
            None => Type::Var(*name),
        },
    }
}

/// Apply the environment to a function type, honoring shadowing by the
/// function's own declared parameters.
pub fn substitute_fun(fun: &FunType, bindings: &Bindings, interner: &StringInterner) -> FunType {
    let shadowed = if fun
        .generics
        .iter()
        .any(|g| bindings.lookup(*g).is_some())
    {
        let mut inner = bindings.clone();
        for g in &fun.generics {
            inner.unbind(*g);
        }
        Some(inner)
    } else {
        None
    };
    let env = shadowed.as_ref().unwrap_or(bindings);

    FunType {
        params: fun.params.iter().map(|p| substitute(p, env, interner)).collect(),
        ret: substitute(&fun.ret, env, interner),
        generics: fun.generics.clone(),
        abi: fun.abi,
    }
}

fn substitute_agg(agg: AggRef, bindings: &Bindings, interner: &StringInterner) -> AggRef {
    let stem = interner.lookup(agg.stem);
    let rewritten = substitute_fragment(stem, bindings, interner);
    if rewritten == stem {
        agg
    } else {
        AggRef {
            def: agg.def,
            stem: interner.intern(&rewritten),
        }
    }
}

/// Apply the environment textually to a symbol-name fragment.
///
/// The fragment is split into segments at `$`, `_` and `.` (separators
/// are kept); a segment equal to a bound parameter name is replaced by
/// that filler's mangled token. The first segment of an instantiation
/// suffix carries the `G` marker glued to the parameter name; the
/// marker stays and the name is replaced.
pub fn substitute_fragment(
    fragment: &str,
    bindings: &Bindings,
    interner: &StringInterner,
) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut segment = String::new();

    for ch in fragment.chars() {
        if matches!(ch, '$' | '_' | '.') {
            flush_segment(&mut out, &mut segment, bindings, interner);
            out.push(ch);
        } else {
            segment.push(ch);
        }
    }
    flush_segment(&mut out, &mut segment, bindings, interner);
    out
}

fn flush_segment(
    out: &mut String,
    segment: &mut String,
    bindings: &Bindings,
    interner: &StringInterner,
) {
    if segment.is_empty() {
        return;
    }
    if let Some(ty) = bindings.lookup_by_str(segment, interner) {
        out.push_str(&ty.mangled(interner));
    } else if let Some(rest) = first_param_of(segment, bindings, interner) {
        // The instantiation marker is glued onto the first parameter
        // name, so `GT` carries a bound `T`.
        out.push('G');
        out.push_str(&rest.mangled(interner));
    } else {
        out.push_str(segment);
    }
    segment.clear();
}

fn first_param_of<'a>(
    segment: &str,
    bindings: &'a Bindings,
    interner: &StringInterner,
) -> Option<&'a Type> {
    let rest = segment.strip_prefix('G')?;
    bindings.lookup_by_str(rest, interner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn env(interner: &StringInterner, pairs: &[(&str, Type)]) -> Bindings {
        let mut bindings = Bindings::new();
        for (name, ty) in pairs {
            bindings.bind(interner.intern(name), ty.clone());
        }
        bindings
    }

    #[test]
    fn substitutes_a_bound_var() {
        let interner = StringInterner::new();
        let bindings = env(&interner, &[("T", Type::Int)]);

        let out = substitute(&Type::Var(interner.intern("T")), &bindings, &interner);
        assert_eq!(out, Type::Int);
    }

    #[test]
    fn leaves_an_unbound_var() {
        let interner = StringInterner::new();
        let bindings = env(&interner, &[("T", Type::Int)]);
        let u = interner.intern("U");

        let out = substitute(&Type::Var(u), &bindings, &interner);
        assert_eq!(out, Type::Var(u));
    }

    #[test]
    fn substitutes_through_compounds() {
        let interner = StringInterner::new();
        let bindings = env(&interner, &[("T", Type::Str)]);
        let t = interner.intern("T");

        let ty = Type::Ptr(Box::new(Type::Array(Box::new(Type::Var(t)), 3)));
        let out = substitute(&ty, &bindings, &interner);
        assert_eq!(out, Type::Ptr(Box::new(Type::Array(Box::new(Type::Str), 3))));
    }

    #[test]
    fn own_generics_shadow_outer_bindings() {
        let interner = StringInterner::new();
        let bindings = env(&interner, &[("T", Type::Int)]);
        let t = interner.intern("T");

        let mut fun = FunType::new(vec![Type::Var(t)], Type::Var(t));
        fun.generics = vec![t];

        let out = substitute_fun(&fun, &bindings, &interner);
        assert_eq!(out.params, vec![Type::Var(t)]);
        assert_eq!(out.ret, Type::Var(t));
    }

    #[test]
    fn fragment_rewrites_bound_segments_only() {
        let interner = StringInterner::new();
        let bindings = env(&interner, &[("T", Type::Int), ("U", Type::Str)]);

        assert_eq!(
            substitute_fragment("pair$GT_U", &bindings, &interner),
            "pair$Gint_str"
        );
        assert_eq!(
            substitute_fragment("app$Point", &bindings, &interner),
            "app$Point"
        );
    }

    #[test]
    fn fragment_keeps_separators() {
        let interner = StringInterner::new();
        let bindings = env(&interner, &[("T", Type::Ptr(Box::new(Type::Int)))]);

        assert_eq!(
            substitute_fragment("box$GT$push", &bindings, &interner),
            "box$Gpint$push"
        );
    }

    #[test]
    fn fragment_rewrites_through_the_marker() {
        let interner = StringInterner::new();
        let bindings = env(&interner, &[("T", Type::Int)]);

        // `G` is glued onto the first parameter name; later parameters
        // sit in their own segments.
        assert_eq!(substitute_fragment("id$GT", &bindings, &interner), "id$Gint");
        // An unbound name after the marker is left alone.
        assert_eq!(substitute_fragment("id$GU", &bindings, &interner), "id$GU");
    }

    #[test]
    fn fragment_ignores_partial_segment_matches() {
        let interner = StringInterner::new();
        let bindings = env(&interner, &[("T", Type::Int)]);

        // `Two` contains `T` but is its own segment, so it stays.
        assert_eq!(
            substitute_fragment("m$Two_T", &bindings, &interner),
            "m$Two_int"
        );
    }
}
