//! Statement lowering.
//!
//! Blocks save and restore the local scope around their statements, so
//! a declaration never escapes its block. Structured control emits its
//! full label family unconditionally; code that follows a terminator
//! inside a block is placed in a fresh unreferenced `dead.N` block so
//! the emitted text stays well-formed.

use skarn_ir::{ast, ice, Name, StmtId, StmtRange};

use crate::context::Cx;
use crate::names::Binding;
use crate::{expr, generics, matching, types, Result};

/// Lower a statement list as one block scope.
pub fn lower_block(cx: &mut Cx, range: StmtRange) -> Result<()> {
    let ast = cx.ast();
    let ids: Vec<StmtId> = ast.arena.stmt_list(range).to_vec();
    let saved = cx.scope.clone();
    for id in ids {
        lower_stmt(cx, id)?;
    }
    cx.scope = saved;
    Ok(())
}

fn lower_stmt(cx: &mut Cx, id: StmtId) -> Result<()> {
    if cx.terminated() {
        let n = cx.fresh_label();
        cx.label_line(&format!("dead.{n}"));
    }
    let stmt = *cx.ast().arena.stmt(id);
    match stmt {
        ast::Stmt::Expr(e) => {
            expr::lower(cx, e)?;
            Ok(())
        }
        ast::Stmt::Decl { name, ty } => lower_decl(cx, name, ty),
        ast::Stmt::Init { name, ty, value } => lower_init(cx, name, ty, value),
        ast::Stmt::Save { name, value } => lower_save(cx, name, value),
        ast::Stmt::Assign { target, value } => lower_assign(cx, target, value),
        ast::Stmt::If {
            cond,
            then_body,
            else_body,
        } => lower_if(cx, cond, then_body, else_body),
        ast::Stmt::While { cond, body } => lower_while(cx, cond, body),
        ast::Stmt::Match {
            scrutinee,
            arms,
            default_body,
            has_default,
        } => matching::lower_match(cx, scrutinee, arms, default_body, has_default),
        ast::Stmt::Return(e) => lower_return(cx, e),
        ast::Stmt::Func(fid) => lower_nested_fn(cx, fid),
    }
}

fn lower_decl(cx: &mut Cx, name: Name, ty: skarn_ir::TypeExprId) -> Result<()> {
    if !ty.is_valid() {
        ice!(
            "declaration of `{}` carries no type",
            cx.interner.lookup(name)
        );
    }
    let ty = types::resolve(cx, ty)?;
    // Collector memory arrives zeroed; no initializing store.
    let slot = cx.alloc_slot(name, &ty);
    cx.scope.bind(name, Binding::Slot { ptr: slot, ty });
    Ok(())
}

fn lower_init(
    cx: &mut Cx,
    name: Name,
    ty: skarn_ir::TypeExprId,
    value: skarn_ir::ExprId,
) -> Result<()> {
    let v = expr::lower(cx, value)?;
    let ty = if ty.is_valid() {
        types::resolve(cx, ty)?
    } else {
        v.ty.clone()
    };
    let slot = cx.alloc_slot(name, &ty);
    let enc = ty.encode(cx.interner);
    cx.line(&format!("store {enc} {}, {enc}* {slot}", v.repr));
    cx.scope.bind(name, Binding::Slot { ptr: slot, ty });
    Ok(())
}

/// First save to a name allocates storage; later saves store in place.
fn lower_save(cx: &mut Cx, name: Name, value: skarn_ir::ExprId) -> Result<()> {
    let v = expr::lower(cx, value)?;
    if let Some(Binding::Slot { ptr, ty }) = cx.lookup_name(name) {
        if ty != v.ty {
            ice!(
                "save to `{}` changes its type from {} to {}",
                cx.interner.lookup(name),
                ty.display(cx.interner),
                v.ty.display(cx.interner)
            );
        }
        let enc = ty.encode(cx.interner);
        cx.line(&format!("store {enc} {}, {enc}* {ptr}", v.repr));
        return Ok(());
    }
    let slot = cx.alloc_slot(name, &v.ty);
    let enc = v.ty.encode(cx.interner);
    cx.line(&format!("store {enc} {}, {enc}* {slot}", v.repr));
    cx.scope.bind(
        name,
        Binding::Slot {
            ptr: slot,
            ty: v.ty,
        },
    );
    Ok(())
}

fn lower_assign(cx: &mut Cx, target: skarn_ir::ExprId, value: skarn_ir::ExprId) -> Result<()> {
    let v = expr::lower(cx, value)?;
    let (ptr, ty) = expr::place(cx, target)?;
    if ty != v.ty {
        ice!(
            "assignment stores {} into {} storage",
            v.ty.display(cx.interner),
            ty.display(cx.interner)
        );
    }
    let enc = ty.encode(cx.interner);
    cx.line(&format!("store {enc} {}, {enc}* {ptr}", v.repr));
    Ok(())
}

fn lower_if(
    cx: &mut Cx,
    cond: skarn_ir::ExprId,
    then_body: StmtRange,
    else_body: StmtRange,
) -> Result<()> {
    let n = cx.fresh_label();
    let c = expr::lower(cx, cond)?;
    cx.term(&format!(
        "br i1 {}, label %if.then.{n}, label %if.else.{n}",
        c.repr
    ));

    cx.label_line(&format!("if.then.{n}"));
    lower_block(cx, then_body)?;
    if !cx.terminated() {
        cx.term(&format!("br label %if.end.{n}"));
    }

    cx.label_line(&format!("if.else.{n}"));
    lower_block(cx, else_body)?;
    if !cx.terminated() {
        cx.term(&format!("br label %if.end.{n}"));
    }

    cx.label_line(&format!("if.end.{n}"));
    Ok(())
}

fn lower_while(cx: &mut Cx, cond: skarn_ir::ExprId, body: StmtRange) -> Result<()> {
    let n = cx.fresh_label();
    cx.term(&format!("br label %while.cond.{n}"));

    cx.label_line(&format!("while.cond.{n}"));
    let c = expr::lower(cx, cond)?;
    cx.term(&format!(
        "br i1 {}, label %while.body.{n}, label %while.end.{n}",
        c.repr
    ));

    cx.label_line(&format!("while.body.{n}"));
    lower_block(cx, body)?;
    if !cx.terminated() {
        cx.term(&format!("br label %while.cond.{n}"));
    }

    cx.label_line(&format!("while.end.{n}"));
    Ok(())
}

fn lower_return(cx: &mut Cx, e: skarn_ir::ExprId) -> Result<()> {
    if e.is_valid() {
        let v = expr::lower(cx, e)?;
        if v.ty.is_void() {
            cx.term("ret void");
        } else {
            cx.term(&format!("ret {} {}", v.ty.encode(cx.interner), v.repr));
        }
    } else {
        cx.term("ret void");
    }
    Ok(())
}

/// Register a nested function as a template capturing the slots live
/// here. The binding lands before instantiation so the body can refer
/// to itself.
fn lower_nested_fn(cx: &mut Cx, fid: skarn_ir::FuncId) -> Result<()> {
    let ast = cx.ast();
    let func = *ast.arena.func(fid);
    let explicit: Vec<Name> = ast.arena.name_list(func.generics).to_vec();
    let base_symbol = format!("{}${}", cx.cur_symbol(), cx.interner.lookup(func.name));
    let template = generics::Template {
        module: cx.cur_module,
        kind: generics::TemplateKind::Func(fid),
        explicit: explicit.clone(),
        implicit: cx.generic_params.clone(),
        base_symbol,
        captures: cx.scope.slots_sorted(),
    };
    let tid = generics::register(cx, template);
    cx.scope.bind(func.name, Binding::Template(tid));
    if explicit.is_empty() {
        generics::ensure_fn(cx, tid, &[])?;
    }
    Ok(())
}
