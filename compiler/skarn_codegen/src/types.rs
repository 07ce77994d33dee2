//! Source type-annotation resolution.
//!
//! A `TypeExpr` is resolved against the current lowering state: bound
//! type parameters first, then the primitive names, then the scope
//! chain (aliases, aggregate templates, imported modules). Resolving a
//! generic application demands the aggregate instantiation on the spot,
//! so a type annotation alone is enough to force the `%type` definition
//! it mentions.

use skarn_ir::ast::TypeExpr;
use skarn_ir::{ice, Name, TypeExprId, TypeExprRange};
use skarn_types::{FunType, Type};

use crate::context::Cx;
use crate::names::Binding;
use crate::{generics, Result};

/// Resolve one annotation to a concrete type.
pub fn resolve(cx: &mut Cx, id: TypeExprId) -> Result<Type> {
    let te = *cx.ast().arena.type_expr(id);
    match te {
        TypeExpr::Named(name) => resolve_named(cx, name, &[]),
        TypeExpr::Qual { module, name } => resolve_qual(cx, module, name, &[]),
        TypeExpr::Ptr(inner) => Ok(Type::Ptr(Box::new(resolve(cx, inner)?))),
        TypeExpr::Array { elem, len } => Ok(Type::Array(Box::new(resolve(cx, elem)?), len)),
        TypeExpr::Fun { params, ret } => {
            let params = resolve_list(cx, params)?;
            let ret = resolve_ret(cx, ret)?;
            Ok(Type::Fun(Box::new(FunType::new(params, ret))))
        }
        TypeExpr::Apply { head, args } => {
            let fillers = resolve_list(cx, args)?;
            let head = *cx.ast().arena.type_expr(head);
            match head {
                TypeExpr::Named(name) => resolve_named(cx, name, &fillers),
                TypeExpr::Qual { module, name } => resolve_qual(cx, module, name, &fillers),
                other => ice!("type arguments applied to a non-name: {other:?}"),
            }
        }
    }
}

/// Resolve a return slot; the sentinel means void.
pub fn resolve_ret(cx: &mut Cx, id: TypeExprId) -> Result<Type> {
    if id.is_valid() {
        resolve(cx, id)
    } else {
        Ok(Type::Void)
    }
}

/// Resolve an annotation list in order.
pub fn resolve_list(cx: &mut Cx, range: TypeExprRange) -> Result<Vec<Type>> {
    let ast = cx.ast();
    let ids: Vec<TypeExprId> = ast.arena.type_expr_list(range).to_vec();
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        out.push(resolve(cx, id)?);
    }
    Ok(out)
}

fn resolve_named(cx: &mut Cx, name: Name, fillers: &[Type]) -> Result<Type> {
    if let Some(ty) = cx.env.lookup(name) {
        if !fillers.is_empty() {
            ice!(
                "type parameter `{}` takes no type arguments",
                cx.interner.lookup(name)
            );
        }
        return Ok(ty.clone());
    }
    if let Some(prim) = primitive(cx.interner.lookup(name)) {
        if !fillers.is_empty() {
            ice!("`{}` takes no type arguments", cx.interner.lookup(name));
        }
        return Ok(prim);
    }
    match cx.lookup_name(name) {
        Some(Binding::Template(tid)) => generics::ensure_agg(cx, tid, fillers),
        Some(Binding::Ty(ty)) => {
            if !fillers.is_empty() {
                ice!(
                    "alias `{}` takes no type arguments",
                    cx.interner.lookup(name)
                );
            }
            Ok(ty)
        }
        Some(_) => ice!("`{}` is not a type", cx.interner.lookup(name)),
        None => ice!("unknown type `{}`", cx.interner.lookup(name)),
    }
}

fn resolve_qual(cx: &mut Cx, module: Name, name: Name, fillers: &[Type]) -> Result<Type> {
    let id = match cx.lookup_name(module) {
        Some(Binding::Value(v)) => match v.ty {
            Type::Module(id) => id,
            _ => ice!("`{}` is not an imported module", cx.interner.lookup(module)),
        },
        _ => ice!("`{}` is not an imported module", cx.interner.lookup(module)),
    };
    let binding = cx.modules[id.index()].globals.lookup(name).cloned();
    match binding {
        Some(Binding::Template(tid)) => generics::ensure_agg(cx, tid, fillers),
        Some(Binding::Ty(ty)) => {
            if !fillers.is_empty() {
                ice!(
                    "alias `{}` takes no type arguments",
                    cx.interner.lookup(name)
                );
            }
            Ok(ty)
        }
        Some(_) => ice!(
            "`{}.{}` is not a type",
            cx.interner.lookup(module),
            cx.interner.lookup(name)
        ),
        None => ice!(
            "module `{}` has no type `{}`",
            cx.interner.lookup(module),
            cx.interner.lookup(name)
        ),
    }
}

fn primitive(name: &str) -> Option<Type> {
    match name {
        "void" => Some(Type::Void),
        "bool" => Some(Type::Bool),
        "char" => Some(Type::Char),
        "short" => Some(Type::Short),
        "int" => Some(Type::Int),
        "str" => Some(Type::Str),
        _ => None,
    }
}
