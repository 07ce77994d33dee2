//! Expression lowering.
//!
//! `lower` produces a typed value; `place` produces the address of an
//! lvalue. Aggregate reads stay value-oriented: a struct held in a slot
//! is loaded whole and fields come off with `extractvalue`, while reads
//! through a pointer use `getelementptr` plus a field load. Member
//! access dispatches on the base value's type, which is how one syntax
//! serves module members, fields, methods, and enum cases.

use skarn_ir::ast::{ExprKind, UnaryOp};
use skarn_ir::{ast, ice, ExprId, Name};
use skarn_types::{size_of, AggRef, FunType, MethodInfo, ModuleId, Type};

use crate::context::{Cx, Value};
use crate::generics::{self, TemplateId, TemplateKind};
use crate::names::Binding;
use crate::{call, template, Result};

/// Lower an expression to a value.
pub fn lower(cx: &mut Cx, id: ExprId) -> Result<Value> {
    let kind = *cx.ast().arena.expr(id);
    match kind {
        ExprKind::Bool(b) => Ok(Value::new(Type::Bool, if b { "true" } else { "false" })),
        ExprKind::Int(i) => Ok(Value::new(Type::Int, i.to_string())),
        ExprKind::Char(c) => Ok(Value::new(Type::Char, c.to_string())),
        ExprKind::Str(content) => Ok(cx.str_const(content)),
        ExprKind::Ident(name) => lower_ident(cx, name),
        ExprKind::Field { base, name } => lower_field(cx, base, name),
        ExprKind::Index { base, index } => lower_index(cx, base, index),
        ExprKind::Call { callee, args } => call::lower_call(cx, callee, args),
        ExprKind::Fill { target, args } => call::lower_fill_value(cx, target, args),
        ExprKind::Bind { callee, args } => call::lower_bind(cx, callee, args),
        ExprKind::Unary { op, operand } => lower_unary(cx, op, operand),
        ExprKind::Binary { op, lhs, rhs } => lower_binary(cx, op, lhs, rhs),
        ExprKind::Template { parts, formatter } => template::lower_template(cx, parts, formatter),
    }
}

fn lower_ident(cx: &mut Cx, name: Name) -> Result<Value> {
    match cx.lookup_name(name) {
        Some(Binding::Slot { ptr, ty }) => {
            let enc = ty.encode(cx.interner);
            let reg = cx.fresh_temp();
            cx.line(&format!("{reg} = load {enc}, {enc}* {ptr}"));
            Ok(Value::new(ty, reg))
        }
        Some(Binding::Value(v)) => Ok(v),
        Some(Binding::Func { symbol, fun }) => Ok(extern_pair(cx, &symbol, fun)),
        Some(Binding::Template(tid)) => template_value(cx, tid, &[]),
        Some(Binding::Mix { .. }) => ice!(
            "overload set `{}` cannot be used as a value",
            cx.interner.lookup(name)
        ),
        Some(Binding::Ty(ty)) => kind_value(cx, name, ty),
        None => ice!("unresolved name `{}`", cx.interner.lookup(name)),
    }
}

/// The value of a template mention, with any explicit fillers already
/// resolved. Functions become callable pairs; aggregates become kinds.
pub fn template_value(cx: &mut Cx, tid: TemplateId, fillers: &[Type]) -> Result<Value> {
    let kind = cx.templates[tid.index()].kind;
    match kind {
        TemplateKind::Func(_) => {
            let (symbol, fun) = generics::ensure_fn(cx, tid, fillers)?;
            let env = call::closure_env(cx, tid);
            Ok(fn_pair(cx, &symbol, fun, &env))
        }
        TemplateKind::Struct { .. } => match generics::ensure_agg(cx, tid, fillers)? {
            Type::Struct(agg) => Ok(Value::new(Type::StructKind(agg), String::new())),
            other => ice!("struct template produced {}", other.display(cx.interner)),
        },
        TemplateKind::Enum { .. } => match generics::ensure_agg(cx, tid, fillers)? {
            Type::Enum(agg) => Ok(Value::new(Type::EnumKind(agg), String::new())),
            other => ice!("enum template produced {}", other.display(cx.interner)),
        },
    }
}

/// An alias used in value position: struct and enum aliases stand for
/// their kinds, anything else has no value.
fn kind_value(cx: &Cx, name: Name, ty: Type) -> Result<Value> {
    match ty {
        Type::Struct(agg) => Ok(Value::new(Type::StructKind(agg), String::new())),
        Type::Enum(agg) => Ok(Value::new(Type::EnumKind(agg), String::new())),
        _ => ice!(
            "type alias `{}` cannot be used as a value",
            cx.interner.lookup(name)
        ),
    }
}

/// A callable pair for an external declaration: the code pointer and a
/// null environment, as one constant aggregate.
pub fn extern_pair(cx: &Cx, symbol: &str, fun: FunType) -> Value {
    let code = fun.code_ptr(cx.interner);
    Value::new(
        Type::Fun(Box::new(fun)),
        format!("{{ {code} @{symbol}, i8* null }}"),
    )
}

/// A callable pair for an emitted function with a known environment
/// operand ("null" or an `i8*` register).
pub fn fn_pair(cx: &mut Cx, symbol: &str, fun: FunType, env: &str) -> Value {
    let code = fun.code_ptr(cx.interner);
    if env == "null" {
        return Value::new(
            Type::Fun(Box::new(fun)),
            format!("{{ {code} @{symbol}, i8* null }}"),
        );
    }
    let pair = fun.pair(cx.interner);
    let t = cx.fresh_temp();
    cx.line(&format!(
        "{t} = insertvalue {pair} {{ {code} @{symbol}, i8* undef }}, i8* {env}, 1"
    ));
    Value::new(Type::Fun(Box::new(fun)), t)
}

/// A callable pair for a method with its receiver as the environment.
pub fn method_pair(cx: &mut Cx, recv: &str, recv_enc: &str, info: MethodInfo) -> Value {
    let env = cx.fresh_temp();
    cx.line(&format!("{env} = bitcast {recv_enc} {recv} to i8*"));
    let code = info.fun.code_ptr(cx.interner);
    let pair = info.fun.pair(cx.interner);
    let t = cx.fresh_temp();
    cx.line(&format!(
        "{t} = insertvalue {pair} {{ {code} @{}, i8* undef }}, i8* {env}, 1",
        info.symbol
    ));
    Value::new(Type::Fun(Box::new(info.fun)), t)
}

/// Park a value in fresh collector storage and return the typed
/// pointer. Used when a value receiver needs an address.
pub fn spill(cx: &mut Cx, v: &Value) -> String {
    let size = size_of(&v.ty, &cx.registry, cx.interner);
    let raw = cx.fresh_temp();
    cx.line(&format!("{raw} = call i8* @GC_malloc(i64 {size})"));
    let enc = v.ty.encode(cx.interner);
    let p = cx.fresh_temp();
    cx.line(&format!("{p} = bitcast i8* {raw} to {enc}*"));
    cx.line(&format!("store {enc} {}, {enc}* {p}", v.repr));
    p
}

fn lower_field(cx: &mut Cx, base: ExprId, name: Name) -> Result<Value> {
    let b = lower(cx, base)?;
    match b.ty.clone() {
        Type::Module(mid) => module_member(cx, mid, name),
        Type::EnumKind(agg) => call::make_enum(cx, agg, name, None),
        Type::Struct(agg) => struct_value_member(cx, &b, agg, name),
        Type::Enum(agg) => {
            let info = enum_method(cx, agg, name)?;
            let p = spill(cx, &b);
            let penc = format!("{}*", b.ty.encode(cx.interner));
            Ok(method_pair(cx, &p, &penc, info))
        }
        Type::Ptr(inner) => match *inner {
            Type::Struct(agg) => struct_ptr_member(cx, &b, agg, name),
            Type::Enum(agg) => {
                let info = enum_method(cx, agg, name)?;
                let penc = format!("%{}*", cx.interner.lookup(agg.stem));
                Ok(method_pair(cx, &b.repr, &penc, info))
            }
            other => ice!(
                "no member `{}` on *{}",
                cx.interner.lookup(name),
                other.display(cx.interner)
            ),
        },
        other => ice!(
            "no member `{}` on {}",
            cx.interner.lookup(name),
            other.display(cx.interner)
        ),
    }
}

fn struct_value_member(cx: &mut Cx, b: &Value, agg: AggRef, name: Name) -> Result<Value> {
    let field = {
        let Some(inst) = cx.registry.struct_inst(agg.stem) else {
            ice!("struct `{}` not registered", cx.interner.lookup(agg.stem));
        };
        inst.field_index(name)
            .map(|i| (i, inst.fields[i].ty.clone()))
    };
    if let Some((i, fty)) = field {
        let senc = b.ty.encode(cx.interner);
        let t = cx.fresh_temp();
        cx.line(&format!("{t} = extractvalue {senc} {}, {i}", b.repr));
        return Ok(Value::new(fty, t));
    }
    let info = struct_method(cx, agg, name)?;
    let p = spill(cx, b);
    let penc = format!("{}*", b.ty.encode(cx.interner));
    Ok(method_pair(cx, &p, &penc, info))
}

fn struct_ptr_member(cx: &mut Cx, b: &Value, agg: AggRef, name: Name) -> Result<Value> {
    let field = {
        let Some(inst) = cx.registry.struct_inst(agg.stem) else {
            ice!("struct `{}` not registered", cx.interner.lookup(agg.stem));
        };
        inst.field_index(name)
            .map(|i| (i, inst.fields[i].ty.clone()))
    };
    let senc = format!("%{}", cx.interner.lookup(agg.stem));
    if let Some((i, fty)) = field {
        let fenc = fty.encode(cx.interner);
        let fp = cx.fresh_temp();
        cx.line(&format!(
            "{fp} = getelementptr inbounds {senc}, {senc}* {}, i32 0, i32 {i}",
            b.repr
        ));
        let t = cx.fresh_temp();
        cx.line(&format!("{t} = load {fenc}, {fenc}* {fp}"));
        return Ok(Value::new(fty, t));
    }
    let info = struct_method(cx, agg, name)?;
    Ok(method_pair(cx, &b.repr, &format!("{senc}*"), info))
}

pub fn struct_method(cx: &Cx, agg: AggRef, name: Name) -> Result<MethodInfo> {
    match cx
        .registry
        .struct_inst(agg.stem)
        .and_then(|inst| inst.method(name))
    {
        Some(info) => Ok(info.clone()),
        None => ice!(
            "no member `{}` on `{}`",
            cx.interner.lookup(name),
            cx.interner.lookup(agg.stem)
        ),
    }
}

pub fn enum_method(cx: &Cx, agg: AggRef, name: Name) -> Result<MethodInfo> {
    match cx
        .registry
        .enum_inst(agg.stem)
        .and_then(|inst| inst.method(name))
    {
        Some(info) => Ok(info.clone()),
        None => ice!(
            "no member `{}` on `{}`",
            cx.interner.lookup(name),
            cx.interner.lookup(agg.stem)
        ),
    }
}

fn module_member(cx: &mut Cx, mid: ModuleId, name: Name) -> Result<Value> {
    let binding = cx.modules[mid.index()].globals.lookup(name).cloned();
    match binding {
        Some(Binding::Slot { ptr, ty }) => {
            let enc = ty.encode(cx.interner);
            let reg = cx.fresh_temp();
            cx.line(&format!("{reg} = load {enc}, {enc}* {ptr}"));
            Ok(Value::new(ty, reg))
        }
        Some(Binding::Value(v)) => Ok(v),
        Some(Binding::Func { symbol, fun }) => Ok(extern_pair(cx, &symbol, fun)),
        Some(Binding::Template(tid)) => template_value(cx, tid, &[]),
        Some(Binding::Ty(ty)) => kind_value(cx, name, ty),
        Some(Binding::Mix { .. }) => ice!(
            "overload set `{}` cannot be used as a value",
            cx.interner.lookup(name)
        ),
        None => ice!("no module member `{}`", cx.interner.lookup(name)),
    }
}

fn lower_index(cx: &mut Cx, base: ExprId, index: ExprId) -> Result<Value> {
    if addressable(cx, base) {
        let (bptr, bty) = place(cx, base)?;
        return match bty {
            Type::Array(elem, len) => {
                let eenc = elem.encode(cx.interner);
                let aenc = format!("[{len} x {eenc}]");
                let iv = lower(cx, index)?;
                let ep = cx.fresh_temp();
                cx.line(&format!(
                    "{ep} = getelementptr inbounds {aenc}, {aenc}* {bptr}, i64 0, i64 {}",
                    iv.repr
                ));
                let t = cx.fresh_temp();
                cx.line(&format!("{t} = load {eenc}, {eenc}* {ep}"));
                Ok(Value::new(*elem, t))
            }
            Type::Ptr(elem) => {
                let eenc = elem.encode(cx.interner);
                let pv = cx.fresh_temp();
                cx.line(&format!("{pv} = load {eenc}*, {eenc}** {bptr}"));
                elem_load(cx, &pv, *elem, index)
            }
            Type::Struct(agg) => subscript_call(cx, &bptr, agg, index),
            other => ice!("{} is not indexable", other.display(cx.interner)),
        };
    }
    let b = lower(cx, base)?;
    match b.ty.clone() {
        Type::Ptr(elem) => elem_load(cx, &b.repr, *elem, index),
        Type::Struct(agg) => {
            let p = spill(cx, &b);
            subscript_call(cx, &p, agg, index)
        }
        other => ice!("{} is not indexable", other.display(cx.interner)),
    }
}

fn elem_load(cx: &mut Cx, ptr: &str, elem: Type, index: ExprId) -> Result<Value> {
    let eenc = elem.encode(cx.interner);
    let iv = lower(cx, index)?;
    let ep = cx.fresh_temp();
    cx.line(&format!(
        "{ep} = getelementptr inbounds {eenc}, {eenc}* {ptr}, i64 {}",
        iv.repr
    ));
    let t = cx.fresh_temp();
    cx.line(&format!("{t} = load {eenc}, {eenc}* {ep}"));
    Ok(Value::new(elem, t))
}

/// Indexing a struct goes through its `subscript` capability.
fn subscript_call(cx: &mut Cx, recv: &str, agg: AggRef, index: ExprId) -> Result<Value> {
    let info = {
        let Some(inst) = cx.registry.struct_inst(agg.stem) else {
            ice!("struct `{}` not registered", cx.interner.lookup(agg.stem));
        };
        match &inst.caps.subscriptable {
            Some(info) => info.clone(),
            None => ice!(
                "`{}` has no subscript capability",
                cx.interner.lookup(agg.stem)
            ),
        }
    };
    let iv = lower(cx, index)?;
    let env = cx.fresh_temp();
    cx.line(&format!(
        "{env} = bitcast %{}* {recv} to i8*",
        cx.interner.lookup(agg.stem)
    ));
    Ok(call::emit_known_call(cx, &info.symbol, &info.fun, &env, &[iv]))
}

/// Whether an expression names storage we can take the address of.
pub fn addressable(cx: &Cx, id: ExprId) -> bool {
    match *cx.ast().arena.expr(id) {
        ExprKind::Ident(name) => matches!(cx.lookup_name(name), Some(Binding::Slot { .. })),
        ExprKind::Field { base, .. } | ExprKind::Index { base, .. } => addressable(cx, base),
        _ => false,
    }
}

/// The address and pointee type of an lvalue.
pub fn place(cx: &mut Cx, id: ExprId) -> Result<(String, Type)> {
    let kind = *cx.ast().arena.expr(id);
    match kind {
        ExprKind::Ident(name) => match cx.lookup_name(name) {
            Some(Binding::Slot { ptr, ty }) => Ok((ptr, ty)),
            _ => ice!(
                "`{}` is not assignable storage",
                cx.interner.lookup(name)
            ),
        },
        ExprKind::Field { base, name } => {
            let (bptr, agg) = struct_addr(cx, base)?;
            let (i, fty) = {
                let Some(inst) = cx.registry.struct_inst(agg.stem) else {
                    ice!("struct `{}` not registered", cx.interner.lookup(agg.stem));
                };
                match inst.field_index(name) {
                    Some(i) => (i, inst.fields[i].ty.clone()),
                    None => ice!(
                        "no field `{}` on `{}`",
                        cx.interner.lookup(name),
                        cx.interner.lookup(agg.stem)
                    ),
                }
            };
            let senc = format!("%{}", cx.interner.lookup(agg.stem));
            let reg = cx.fresh_temp();
            cx.line(&format!(
                "{reg} = getelementptr inbounds {senc}, {senc}* {bptr}, i32 0, i32 {i}"
            ));
            Ok((reg, fty))
        }
        ExprKind::Index { base, index } => {
            if addressable(cx, base) {
                let (bptr, bty) = place(cx, base)?;
                return match bty {
                    Type::Array(elem, len) => {
                        let eenc = elem.encode(cx.interner);
                        let aenc = format!("[{len} x {eenc}]");
                        let iv = lower(cx, index)?;
                        let reg = cx.fresh_temp();
                        cx.line(&format!(
                            "{reg} = getelementptr inbounds {aenc}, {aenc}* {bptr}, i64 0, i64 {}",
                            iv.repr
                        ));
                        Ok((reg, *elem))
                    }
                    Type::Ptr(elem) => {
                        let eenc = elem.encode(cx.interner);
                        let pv = cx.fresh_temp();
                        cx.line(&format!("{pv} = load {eenc}*, {eenc}** {bptr}"));
                        let iv = lower(cx, index)?;
                        let reg = cx.fresh_temp();
                        cx.line(&format!(
                            "{reg} = getelementptr inbounds {eenc}, {eenc}* {pv}, i64 {}",
                            iv.repr
                        ));
                        Ok((reg, *elem))
                    }
                    other => ice!("{} is not indexable storage", other.display(cx.interner)),
                };
            }
            let b = lower(cx, base)?;
            match b.ty {
                Type::Ptr(elem) => {
                    let eenc = elem.encode(cx.interner);
                    let iv = lower(cx, index)?;
                    let reg = cx.fresh_temp();
                    cx.line(&format!(
                        "{reg} = getelementptr inbounds {eenc}, {eenc}* {}, i64 {}",
                        b.repr, iv.repr
                    ));
                    Ok((reg, *elem))
                }
                other => ice!("{} is not indexable storage", other.display(cx.interner)),
            }
        }
        _ => ice!("expression is not assignable"),
    }
}

/// The address of a struct value behind a member access: the base's own
/// storage when it has some, the pointer value otherwise.
fn struct_addr(cx: &mut Cx, base: ExprId) -> Result<(String, AggRef)> {
    if addressable(cx, base) {
        let (bptr, bty) = place(cx, base)?;
        return match bty {
            Type::Struct(agg) => Ok((bptr, agg)),
            Type::Ptr(inner) => match *inner {
                Type::Struct(agg) => {
                    let penc = format!("%{}*", cx.interner.lookup(agg.stem));
                    let pv = cx.fresh_temp();
                    cx.line(&format!("{pv} = load {penc}, {penc}* {bptr}"));
                    Ok((pv, agg))
                }
                other => ice!("no fields on *{}", other.display(cx.interner)),
            },
            other => ice!("no fields on {}", other.display(cx.interner)),
        };
    }
    let v = lower(cx, base)?;
    match v.ty {
        Type::Ptr(inner) => match *inner {
            Type::Struct(agg) => Ok((v.repr, agg)),
            other => ice!("no fields on *{}", other.display(cx.interner)),
        },
        Type::Struct(_) => ice!("cannot write into a struct temporary"),
        other => ice!("no fields on {}", other.display(cx.interner)),
    }
}

fn lower_unary(cx: &mut Cx, op: UnaryOp, operand: ExprId) -> Result<Value> {
    let v = lower(cx, operand)?;
    match op {
        UnaryOp::Neg => match v.ty {
            Type::Int | Type::Short => {
                let enc = v.ty.encode(cx.interner);
                let t = cx.fresh_temp();
                cx.line(&format!("{t} = sub {enc} 0, {}", v.repr));
                Ok(Value::new(v.ty, t))
            }
            other => ice!("negation of {}", other.display(cx.interner)),
        },
        UnaryOp::Not => match v.ty {
            Type::Bool => {
                let t = cx.fresh_temp();
                cx.line(&format!("{t} = xor i1 {}, true", v.repr));
                Ok(Value::new(Type::Bool, t))
            }
            other => ice!("logical not of {}", other.display(cx.interner)),
        },
    }
}

fn lower_binary(cx: &mut Cx, op: ast::BinaryOp, lhs: ExprId, rhs: ExprId) -> Result<Value> {
    use ast::BinaryOp;

    let l = lower(cx, lhs)?;
    let r = lower(cx, rhs)?;
    match op {
        BinaryOp::Add if l.ty == Type::Str && r.ty == Type::Str => {
            let helper = cx.interner.intern("str_concat");
            call::call_named(cx, helper, vec![l, r])
        }
        BinaryOp::Mul if l.ty == Type::Str && r.ty == Type::Int => {
            let helper = cx.interner.intern("str_repeat");
            call::call_named(cx, helper, vec![l, r])
        }
        BinaryOp::Add => Ok(arith(cx, "add", &l, &r)),
        BinaryOp::Sub => Ok(arith(cx, "sub", &l, &r)),
        BinaryOp::Mul => Ok(arith(cx, "mul", &l, &r)),
        BinaryOp::Div => Ok(arith(cx, "sdiv", &l, &r)),
        BinaryOp::Rem => Ok(arith(cx, "srem", &l, &r)),
        BinaryOp::Eq => Ok(equality(cx, "eq", &l, &r)),
        BinaryOp::NotEq => Ok(equality(cx, "ne", &l, &r)),
        BinaryOp::Lt => Ok(order(cx, "slt", &l, &r)),
        BinaryOp::LtEq => Ok(order(cx, "sle", &l, &r)),
        BinaryOp::Gt => Ok(order(cx, "sgt", &l, &r)),
        BinaryOp::GtEq => Ok(order(cx, "sge", &l, &r)),
        BinaryOp::And => Ok(logic(cx, "and", &l, &r)),
        BinaryOp::Or => Ok(logic(cx, "or", &l, &r)),
        BinaryOp::Xor => Ok(logic(cx, "xor", &l, &r)),
    }
}

fn is_counting(ty: &Type) -> bool {
    matches!(ty, Type::Int | Type::Short)
}

fn arith(cx: &mut Cx, opcode: &str, l: &Value, r: &Value) -> Value {
    if !is_counting(&l.ty) || l.ty != r.ty {
        ice!(
            "`{opcode}` over {} and {}",
            l.ty.display(cx.interner),
            r.ty.display(cx.interner)
        );
    }
    let enc = l.ty.encode(cx.interner);
    let t = cx.fresh_temp();
    cx.line(&format!("{t} = {opcode} {enc} {}, {}", l.repr, r.repr));
    Value::new(l.ty.clone(), t)
}

fn equality(cx: &mut Cx, pred: &str, l: &Value, r: &Value) -> Value {
    let comparable = matches!(
        l.ty,
        Type::Int | Type::Short | Type::Char | Type::Bool | Type::Ptr(_)
    );
    if !comparable || l.ty != r.ty {
        ice!(
            "`{pred}` over {} and {}",
            l.ty.display(cx.interner),
            r.ty.display(cx.interner)
        );
    }
    let enc = l.ty.encode(cx.interner);
    let t = cx.fresh_temp();
    cx.line(&format!("{t} = icmp {pred} {enc} {}, {}", l.repr, r.repr));
    Value::new(Type::Bool, t)
}

fn order(cx: &mut Cx, pred: &str, l: &Value, r: &Value) -> Value {
    let ordered = matches!(l.ty, Type::Int | Type::Short | Type::Char);
    if !ordered || l.ty != r.ty {
        ice!(
            "`{pred}` over {} and {}",
            l.ty.display(cx.interner),
            r.ty.display(cx.interner)
        );
    }
    let enc = l.ty.encode(cx.interner);
    let t = cx.fresh_temp();
    cx.line(&format!("{t} = icmp {pred} {enc} {}, {}", l.repr, r.repr));
    Value::new(Type::Bool, t)
}

fn logic(cx: &mut Cx, opcode: &str, l: &Value, r: &Value) -> Value {
    let holds = l.ty == Type::Bool || is_counting(&l.ty);
    if !holds || l.ty != r.ty {
        ice!(
            "`{opcode}` over {} and {}",
            l.ty.display(cx.interner),
            r.ty.display(cx.interner)
        );
    }
    let enc = l.ty.encode(cx.interner);
    let t = cx.fresh_temp();
    cx.line(&format!("{t} = {opcode} {enc} {}, {}", l.repr, r.repr));
    Value::new(l.ty.clone(), t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ModuleState;
    use crate::names::Scope;
    use pretty_assertions::assert_eq;
    use skarn_ir::{Arena, StringInterner};
    use std::rc::Rc;

    struct NoLoader;

    impl crate::ModuleLoader for NoLoader {
        fn load(&self, _path: &str) -> Option<Rc<ast::Module>> {
            None
        }
    }

    fn cx_for<'a>(interner: &'a StringInterner, loader: &'a NoLoader, arena: Arena) -> Cx<'a> {
        let mut cx = Cx::new(interner, loader);
        let path = interner.intern("app.sk");
        cx.module_ids.insert(path, skarn_types::ModuleId::new(0));
        cx.modules.push(ModuleState {
            path,
            stem: "app".to_string(),
            globals: Scope::new(),
            init_symbol: "_sk_app$__init".to_string(),
            ast: Rc::new(ast::Module {
                items: Vec::new(),
                arena,
            }),
            init_steps: Vec::new(),
        });
        cx
    }

    #[test]
    fn literals_lower_to_immediate_operands() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut arena = Arena::new();
        let seven = arena.alloc_expr(ExprKind::Int(7));
        let no = arena.alloc_expr(ExprKind::Bool(false));
        let a = arena.alloc_expr(ExprKind::Char(65));
        let mut cx = cx_for(&interner, &loader, arena);

        cx.push_fn("_sk_app$f");
        let v = match lower(&mut cx, seven) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(v.ty, Type::Int);
        assert_eq!(v.repr, "7");
        let v = match lower(&mut cx, no) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(v.repr, "false");
        let v = match lower(&mut cx, a) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(v.ty, Type::Char);
        assert_eq!(v.repr, "65");
        cx.finish_fn("define internal void @_sk_app$f(i8* %__env)");
    }

    #[test]
    fn slot_reads_load_and_arithmetic_folds_nothing() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut arena = Arena::new();
        let x = interner.intern("x");
        let xref = arena.alloc_expr(ExprKind::Ident(x));
        let two = arena.alloc_expr(ExprKind::Int(2));
        let sum = arena.alloc_expr(ExprKind::Binary {
            op: ast::BinaryOp::Add,
            lhs: xref,
            rhs: two,
        });
        let mut cx = cx_for(&interner, &loader, arena);

        cx.push_fn("_sk_app$f");
        cx.scope.bind(
            x,
            Binding::Slot {
                ptr: "%x.addr.0".to_string(),
                ty: Type::Int,
            },
        );
        let v = match lower(&mut cx, sum) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(v.repr, "%t.1");
        cx.finish_fn("define internal void @_sk_app$f(i8* %__env)");

        let text = cx.output();
        assert!(text.contains("%t.0 = load i64, i64* %x.addr.0"));
        assert!(text.contains("%t.1 = add i64 %t.0, 2"));
    }

    #[test]
    fn comparisons_yield_bool() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut arena = Arena::new();
        let one = arena.alloc_expr(ExprKind::Int(1));
        let two = arena.alloc_expr(ExprKind::Int(2));
        let lt = arena.alloc_expr(ExprKind::Binary {
            op: ast::BinaryOp::Lt,
            lhs: one,
            rhs: two,
        });
        let mut cx = cx_for(&interner, &loader, arena);

        cx.push_fn("_sk_app$f");
        let v = match lower(&mut cx, lt) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(v.ty, Type::Bool);
        cx.finish_fn("define internal void @_sk_app$f(i8* %__env)");
        assert!(cx.output().contains("icmp slt i64 1, 2"));
    }

    #[test]
    fn place_of_a_slot_is_its_pointer() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut arena = Arena::new();
        let x = interner.intern("x");
        let xref = arena.alloc_expr(ExprKind::Ident(x));
        let mut cx = cx_for(&interner, &loader, arena);

        cx.push_fn("_sk_app$f");
        cx.scope.bind(
            x,
            Binding::Slot {
                ptr: "%x.addr.0".to_string(),
                ty: Type::Int,
            },
        );
        match place(&mut cx, xref) {
            Ok((ptr, ty)) => {
                assert_eq!(ptr, "%x.addr.0");
                assert_eq!(ty, Type::Int);
            }
            Err(e) => panic!("{e}"),
        }
        cx.finish_fn("define internal void @_sk_app$f(i8* %__env)");
    }

    #[test]
    #[should_panic(expected = "internal compiler error")]
    fn mixed_operand_arithmetic_aborts() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut arena = Arena::new();
        let one = arena.alloc_expr(ExprKind::Int(1));
        let yes = arena.alloc_expr(ExprKind::Bool(true));
        let bad = arena.alloc_expr(ExprKind::Binary {
            op: ast::BinaryOp::Add,
            lhs: one,
            rhs: yes,
        });
        let mut cx = cx_for(&interner, &loader, arena);

        cx.push_fn("_sk_app$f");
        let _ = lower(&mut cx, bad);
    }
}
