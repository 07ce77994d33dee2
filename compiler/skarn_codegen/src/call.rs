//! Call lowering.
//!
//! One call syntax covers direct calls, calls through stored pairs,
//! method calls, module-qualified calls, overload sets, struct
//! construction, and enum case construction. Classification looks at
//! the callee's shape first, so a name that resolves to a declaration
//! is called directly; only callees with no special shape are lowered
//! to a pair value and called through its code pointer.
//!
//! Partial application (`bind`) allocates an environment record holding
//! the original pair and the bound arguments, and pairs it with a
//! forwarding thunk emitted once per function type and bound count.

use smallvec::SmallVec;

use skarn_ir::ast::ExprKind;
use skarn_ir::{ice, ExprId, ExprRange, Name, TypeExprRange};
use skarn_types::{struct_layout, Abi, AggRef, FunType, ModuleId, Type};

use crate::context::{Cx, Value};
use crate::generics::{self, TemplateId, TemplateKind};
use crate::names::Binding;
use crate::{expr, mangle, types, Result};

pub fn lower_call(cx: &mut Cx, callee: ExprId, args: ExprRange) -> Result<Value> {
    let kind = *cx.ast().arena.expr(callee);
    match kind {
        ExprKind::Ident(name) => call_ident(cx, callee, name, args),
        ExprKind::Field { base, name } => call_field(cx, base, name, args),
        ExprKind::Fill {
            target,
            args: fillers,
        } => {
            let tys = types::resolve_list(cx, fillers)?;
            let tid = fill_template(cx, target)?;
            call_template(cx, tid, &tys, args)
        }
        _ => {
            let f = expr::lower(cx, callee)?;
            pair_call(cx, f, args)
        }
    }
}

fn call_ident(cx: &mut Cx, callee: ExprId, name: Name, args: ExprRange) -> Result<Value> {
    match cx.lookup_name(name) {
        Some(Binding::Template(tid)) => call_template(cx, tid, &[], args),
        Some(Binding::Func { symbol, fun }) => {
            let vals = lower_args(cx, args)?;
            Ok(emit_known_call(cx, &symbol, &fun, "null", &vals))
        }
        Some(Binding::Mix { module, members }) => call_mix(cx, module, &members, name, args),
        Some(Binding::Ty(Type::Struct(agg))) => construct(cx, agg, args),
        Some(Binding::Ty(Type::Enum(agg))) => ice!(
            "enum `{}` is constructed by case",
            cx.interner.lookup(agg.stem)
        ),
        Some(Binding::Ty(ty)) => ice!("`{}` is not callable", ty.display(cx.interner)),
        Some(Binding::Slot { .. } | Binding::Value(_)) => {
            let f = expr::lower(cx, callee)?;
            pair_call(cx, f, args)
        }
        None => ice!("unresolved name `{}`", cx.interner.lookup(name)),
    }
}

fn call_template(cx: &mut Cx, tid: TemplateId, fillers: &[Type], args: ExprRange) -> Result<Value> {
    let kind = cx.templates[tid.index()].kind;
    match kind {
        TemplateKind::Func(_) => {
            let (symbol, fun) = generics::ensure_fn(cx, tid, fillers)?;
            let env = closure_env(cx, tid);
            let vals = lower_args(cx, args)?;
            Ok(emit_known_call(cx, &symbol, &fun, &env, &vals))
        }
        TemplateKind::Struct { .. } => match generics::ensure_agg(cx, tid, fillers)? {
            Type::Struct(agg) => construct(cx, agg, args),
            other => ice!("struct template produced {}", other.display(cx.interner)),
        },
        TemplateKind::Enum { .. } => {
            let base = cx.templates[tid.index()].base_symbol.clone();
            ice!("enum `{base}` is constructed by case")
        }
    }
}

fn call_field(cx: &mut Cx, base: ExprId, name: Name, args: ExprRange) -> Result<Value> {
    if expr::addressable(cx, base) {
        let (bptr, bty) = expr::place(cx, base)?;
        return match bty {
            Type::Struct(agg) => struct_recv_call(cx, bptr, agg, name, args),
            Type::Enum(agg) => enum_recv_call(cx, bptr, agg, name, args),
            Type::Ptr(inner) => match *inner {
                Type::Struct(agg) => {
                    let penc = format!("%{}*", cx.interner.lookup(agg.stem));
                    let pv = cx.fresh_temp();
                    cx.line(&format!("{pv} = load {penc}, {penc}* {bptr}"));
                    struct_recv_call(cx, pv, agg, name, args)
                }
                Type::Enum(agg) => {
                    let penc = format!("%{}*", cx.interner.lookup(agg.stem));
                    let pv = cx.fresh_temp();
                    cx.line(&format!("{pv} = load {penc}, {penc}* {bptr}"));
                    enum_recv_call(cx, pv, agg, name, args)
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
        };
    }

    let b = expr::lower(cx, base)?;
    match b.ty.clone() {
        Type::Module(mid) => call_module_member(cx, mid, name, args),
        Type::EnumKind(agg) => {
            let ids = cx.ast().arena.expr_list(args).to_vec();
            let payload = match ids.as_slice() {
                [] => None,
                [one] => Some(expr::lower(cx, *one)?),
                _ => ice!("case `{}` takes at most one payload", cx.interner.lookup(name)),
            };
            make_enum(cx, agg, name, payload)
        }
        Type::Struct(agg) => {
            let p = expr::spill(cx, &b);
            struct_recv_call(cx, p, agg, name, args)
        }
        Type::Enum(agg) => {
            let p = expr::spill(cx, &b);
            enum_recv_call(cx, p, agg, name, args)
        }
        Type::Ptr(inner) => match *inner {
            Type::Struct(agg) => struct_recv_call(cx, b.repr, agg, name, args),
            Type::Enum(agg) => enum_recv_call(cx, b.repr, agg, name, args),
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

fn call_module_member(cx: &mut Cx, mid: ModuleId, name: Name, args: ExprRange) -> Result<Value> {
    let binding = cx.modules[mid.index()].globals.lookup(name).cloned();
    match binding {
        Some(Binding::Template(tid)) => call_template(cx, tid, &[], args),
        Some(Binding::Func { symbol, fun }) => {
            let vals = lower_args(cx, args)?;
            Ok(emit_known_call(cx, &symbol, &fun, "null", &vals))
        }
        Some(Binding::Mix { module, members }) => call_mix(cx, module, &members, name, args),
        Some(Binding::Slot { ptr, ty }) => {
            let enc = ty.encode(cx.interner);
            let reg = cx.fresh_temp();
            cx.line(&format!("{reg} = load {enc}, {enc}* {ptr}"));
            pair_call(cx, Value::new(ty, reg), args)
        }
        Some(Binding::Value(v)) => pair_call(cx, v, args),
        Some(Binding::Ty(Type::Struct(agg))) => construct(cx, agg, args),
        Some(Binding::Ty(ty)) => ice!("`{}` is not callable", ty.display(cx.interner)),
        None => ice!("no module member `{}`", cx.interner.lookup(name)),
    }
}

/// Pick the first alternative whose parameter types match the lowered
/// arguments exactly.
fn call_mix(
    cx: &mut Cx,
    module: ModuleId,
    members: &[Name],
    mix_name: Name,
    args: ExprRange,
) -> Result<Value> {
    let vals = lower_args(cx, args)?;
    for &member in members {
        let binding = cx.modules[module.index()].globals.lookup(member).cloned();
        let Some(Binding::Template(tid)) = binding else {
            ice!("mix member `{}` is not a function", cx.interner.lookup(member));
        };
        if !cx.templates[tid.index()].explicit.is_empty() {
            ice!("mix member `{}` is generic", cx.interner.lookup(member));
        }
        let (symbol, fun) = generics::ensure_fn(cx, tid, &[])?;
        if fun.params.len() != vals.len() {
            continue;
        }
        if fun.params.iter().zip(&vals).any(|(p, v)| *p != v.ty) {
            continue;
        }
        let env = closure_env(cx, tid);
        return Ok(emit_known_call(cx, &symbol, &fun, &env, &vals));
    }
    ice!(
        "no alternative of `{}` matches the call",
        cx.interner.lookup(mix_name)
    )
}

fn struct_recv_call(
    cx: &mut Cx,
    recv: String,
    agg: AggRef,
    name: Name,
    args: ExprRange,
) -> Result<Value> {
    let field = {
        let Some(inst) = cx.registry.struct_inst(agg.stem) else {
            ice!("struct `{}` not registered", cx.interner.lookup(agg.stem));
        };
        inst.field_index(name)
            .map(|i| (i, inst.fields[i].ty.clone()))
    };
    let senc = format!("%{}", cx.interner.lookup(agg.stem));
    // A field shadows any method of the same name; calling it means
    // calling the stored pair.
    if let Some((i, fty)) = field {
        let fp = cx.fresh_temp();
        cx.line(&format!(
            "{fp} = getelementptr inbounds {senc}, {senc}* {recv}, i32 0, i32 {i}"
        ));
        let fenc = fty.encode(cx.interner);
        let fv = cx.fresh_temp();
        cx.line(&format!("{fv} = load {fenc}, {fenc}* {fp}"));
        return pair_call(cx, Value::new(fty, fv), args);
    }
    let info = expr::struct_method(cx, agg, name)?;
    let env = cx.fresh_temp();
    cx.line(&format!("{env} = bitcast {senc}* {recv} to i8*"));
    let vals = lower_args(cx, args)?;
    Ok(emit_known_call(cx, &info.symbol, &info.fun, &env, &vals))
}

fn enum_recv_call(
    cx: &mut Cx,
    recv: String,
    agg: AggRef,
    name: Name,
    args: ExprRange,
) -> Result<Value> {
    let info = expr::enum_method(cx, agg, name)?;
    let env = cx.fresh_temp();
    cx.line(&format!(
        "{env} = bitcast %{}* {recv} to i8*",
        cx.interner.lookup(agg.stem)
    ));
    let vals = lower_args(cx, args)?;
    Ok(emit_known_call(cx, &info.symbol, &info.fun, &env, &vals))
}

/// Construct a struct: zeroed collector storage, then the `init` method
/// over it when the struct declares one. A struct without `init` is
/// default-constructed: zero arguments, fields left zeroed. Arguments
/// for a missing `init` abort. Yields the receiver pointer.
pub fn construct(cx: &mut Cx, agg: AggRef, args: ExprRange) -> Result<Value> {
    let (size, init) = {
        let Some(inst) = cx.registry.struct_inst(agg.stem) else {
            ice!("struct `{}` not registered", cx.interner.lookup(agg.stem));
        };
        (inst.size, inst.caps.constructible.clone())
    };
    let stem = cx.interner.lookup(agg.stem);
    let senc = format!("%{stem}");
    let raw = cx.fresh_temp();
    cx.line(&format!("{raw} = call i8* @GC_malloc(i64 {size})"));
    let p = cx.fresh_temp();
    cx.line(&format!("{p} = bitcast i8* {raw} to {senc}*"));
    match init {
        Some(info) => {
            let vals = lower_args(cx, args)?;
            emit_known_call(cx, &info.symbol, &info.fun, &raw, &vals);
        }
        None => {
            if !cx.ast().arena.expr_list(args).is_empty() {
                ice!("`{stem}` has no `init` and takes no arguments");
            }
        }
    }
    Ok(Value::new(Type::Ptr(Box::new(Type::Struct(agg))), p))
}

/// Construct an enum value: tag store, optional payload store through
/// the raw byte slot, then a whole-value load. Payload accesses go
/// through the packed layout, hence the explicit alignment.
pub fn make_enum(cx: &mut Cx, agg: AggRef, case: Name, payload: Option<Value>) -> Result<Value> {
    let (tag, tag_ir, size, payload_size, payload_ty) = {
        let Some(inst) = cx.registry.enum_inst(agg.stem) else {
            ice!("enum `{}` not registered", cx.interner.lookup(agg.stem));
        };
        let Some(tag) = inst.tag_of(case) else {
            ice!(
                "no case `{}` on `{}`",
                cx.interner.lookup(case),
                cx.interner.lookup(agg.stem)
            );
        };
        (
            tag,
            inst.tag_ir(),
            inst.size(),
            inst.payload_size,
            inst.payload_of(case).cloned(),
        )
    };
    let senc = format!("%{}", cx.interner.lookup(agg.stem));
    let raw = cx.fresh_temp();
    cx.line(&format!("{raw} = call i8* @GC_malloc(i64 {size})"));
    let p = cx.fresh_temp();
    cx.line(&format!("{p} = bitcast i8* {raw} to {senc}*"));
    let tp = cx.fresh_temp();
    cx.line(&format!(
        "{tp} = getelementptr inbounds {senc}, {senc}* {p}, i32 0, i32 0"
    ));
    cx.line(&format!("store {tag_ir} {tag}, {tag_ir}* {tp}, align 1"));
    match (payload, payload_ty) {
        (Some(v), Some(pty)) => {
            let penc = pty.encode(cx.interner);
            let pp = cx.fresh_temp();
            cx.line(&format!(
                "{pp} = getelementptr inbounds {senc}, {senc}* {p}, i32 0, i32 1"
            ));
            let pc = cx.fresh_temp();
            cx.line(&format!(
                "{pc} = bitcast [{payload_size} x i8]* {pp} to {penc}*"
            ));
            cx.line(&format!("store {penc} {}, {penc}* {pc}, align 1", v.repr));
        }
        (None, None) => {}
        (Some(_), None) => ice!("case `{}` carries no payload", cx.interner.lookup(case)),
        (None, Some(_)) => ice!("case `{}` needs a payload", cx.interner.lookup(case)),
    }
    let v = cx.fresh_temp();
    cx.line(&format!("{v} = load {senc}, {senc}* {p}"));
    Ok(Value::new(Type::Enum(agg), v))
}

fn pair_call(cx: &mut Cx, f: Value, args: ExprRange) -> Result<Value> {
    let Type::Fun(fun) = f.ty.clone() else {
        ice!("call of non-function {}", f.ty.display(cx.interner));
    };
    let vals = lower_args(cx, args)?;
    Ok(emit_pair_call(cx, &f, &fun, &vals))
}

/// Call through a pair value: extract the code pointer and environment,
/// then call indirect. External pairs carry a C-convention pointer, so
/// the environment operand is dropped for them.
pub fn emit_pair_call(cx: &mut Cx, pair: &Value, fun: &FunType, args: &[Value]) -> Value {
    if args.len() != fun.params.len() {
        ice!(
            "{} arguments for {} parameters",
            args.len(),
            fun.params.len()
        );
    }
    let pair_enc = fun.pair(cx.interner);
    let code = cx.fresh_temp();
    cx.line(&format!("{code} = extractvalue {pair_enc} {}, 0", pair.repr));
    let env = cx.fresh_temp();
    cx.line(&format!("{env} = extractvalue {pair_enc} {}, 1", pair.repr));
    let mut operands = Vec::with_capacity(args.len() + 1);
    if fun.abi == Abi::Env {
        operands.push(format!("i8* {env}"));
    }
    for (v, pty) in args.iter().zip(&fun.params) {
        operands.push(format!("{} {}", pty.encode(cx.interner), v.repr));
    }
    let operands = operands.join(", ");
    if fun.ret.is_void() {
        cx.line(&format!("call void {code}({operands})"));
        return Value::void();
    }
    let renc = fun.ret.encode(cx.interner);
    let t = cx.fresh_temp();
    cx.line(&format!("{t} = call {renc} {code}({operands})"));
    Value::new(fun.ret.clone(), t)
}

/// Call a function known by symbol. The environment operand is used for
/// the backend convention and ignored for external C declarations.
pub fn emit_known_call(
    cx: &mut Cx,
    symbol: &str,
    fun: &FunType,
    env: &str,
    args: &[Value],
) -> Value {
    if args.len() != fun.params.len() {
        ice!(
            "`@{symbol}` takes {} arguments, got {}",
            fun.params.len(),
            args.len()
        );
    }
    let mut operands = Vec::with_capacity(args.len() + 1);
    if fun.abi == Abi::Env {
        operands.push(format!("i8* {env}"));
    }
    for (v, pty) in args.iter().zip(&fun.params) {
        operands.push(format!("{} {}", pty.encode(cx.interner), v.repr));
    }
    let operands = operands.join(", ");
    if fun.ret.is_void() {
        cx.line(&format!("call void @{symbol}({operands})"));
        return Value::void();
    }
    let renc = fun.ret.encode(cx.interner);
    let t = cx.fresh_temp();
    cx.line(&format!("{t} = call {renc} @{symbol}({operands})"));
    Value::new(fun.ret.clone(), t)
}

/// Build the capture environment for an instance of `tid` at the
/// current site: a record of the captured slots' pointers, or "null"
/// when the declaration captured nothing.
///
/// The record holds pointers, not values, so the closure observes later
/// writes to the captured variables.
pub fn closure_env(cx: &mut Cx, tid: TemplateId) -> String {
    let captures = cx.templates[tid.index()].captures.clone();
    if captures.is_empty() {
        return "null".to_string();
    }
    let fields: Vec<String> = captures
        .iter()
        .map(|(_, _, ty)| format!("{}*", ty.encode(cx.interner)))
        .collect();
    let rec = format!("{{ {} }}", fields.join(", "));
    let size = 8 * captures.len() as u64;
    let raw = cx.fresh_temp();
    cx.line(&format!("{raw} = call i8* @GC_malloc(i64 {size})"));
    let recp = cx.fresh_temp();
    cx.line(&format!("{recp} = bitcast i8* {raw} to {rec}*"));
    for (i, (_, ptr, ty)) in captures.iter().enumerate() {
        let enc = ty.encode(cx.interner);
        let fp = cx.fresh_temp();
        cx.line(&format!(
            "{fp} = getelementptr inbounds {rec}, {rec}* {recp}, i32 0, i32 {i}"
        ));
        cx.line(&format!("store {enc}* {ptr}, {enc}** {fp}"));
    }
    raw
}

/// Call a runtime helper by name with already-lowered arguments. The
/// helper is expected in scope, either as a source function or an
/// external declaration.
pub fn call_named(cx: &mut Cx, name: Name, args: Vec<Value>) -> Result<Value> {
    match cx.lookup_name(name) {
        Some(Binding::Template(tid)) => {
            let (symbol, fun) = generics::ensure_fn(cx, tid, &[])?;
            let env = closure_env(cx, tid);
            Ok(emit_known_call(cx, &symbol, &fun, &env, &args))
        }
        Some(Binding::Func { symbol, fun }) => {
            Ok(emit_known_call(cx, &symbol, &fun, "null", &args))
        }
        _ => ice!("runtime helper `{}` is not in scope", cx.interner.lookup(name)),
    }
}

/// An explicit generic fill in value position: `f[int]` as a pair,
/// `Pair[int, str]` as a kind.
pub fn lower_fill_value(cx: &mut Cx, target: ExprId, fillers: TypeExprRange) -> Result<Value> {
    let tys = types::resolve_list(cx, fillers)?;
    let tid = fill_template(cx, target)?;
    expr::template_value(cx, tid, &tys)
}

fn fill_template(cx: &mut Cx, target: ExprId) -> Result<TemplateId> {
    let kind = *cx.ast().arena.expr(target);
    match kind {
        ExprKind::Ident(name) => match cx.lookup_name(name) {
            Some(Binding::Template(tid)) => Ok(tid),
            _ => ice!(
                "`{}` does not take type arguments",
                cx.interner.lookup(name)
            ),
        },
        ExprKind::Field { base, name } => {
            let b = expr::lower(cx, base)?;
            let Type::Module(mid) = b.ty else {
                ice!("type arguments applied to a non-declaration");
            };
            match cx.modules[mid.index()].globals.lookup(name).cloned() {
                Some(Binding::Template(tid)) => Ok(tid),
                _ => ice!(
                    "`{}` does not take type arguments",
                    cx.interner.lookup(name)
                ),
            }
        }
        _ => ice!("type arguments applied to a non-declaration"),
    }
}

/// Partial application: evaluate the callee pair and the leading
/// arguments, store both in a fresh environment record, and pair that
/// record with the forwarding thunk for this shape.
pub fn lower_bind(cx: &mut Cx, callee: ExprId, args: ExprRange) -> Result<Value> {
    let f = expr::lower(cx, callee)?;
    let Type::Fun(fun) = f.ty.clone() else {
        ice!("bind of non-function {}", f.ty.display(cx.interner));
    };
    let bound = lower_args(cx, args)?;
    if bound.len() > fun.params.len() {
        ice!(
            "bound {} arguments onto {} parameters",
            bound.len(),
            fun.params.len()
        );
    }
    let k = bound.len();

    let token = fun.mangled(cx.interner);
    let symbol = match cx.cached_thunk(&token, k) {
        Some(symbol) => symbol,
        None => emit_thunk(cx, &fun, k, &token),
    };

    // The record holds the original pair first, then the bound
    // arguments by value.
    let mut field_tys = vec![Type::Fun(fun.clone())];
    field_tys.extend(bound.iter().map(|b| b.ty.clone()));
    let layout = struct_layout(&field_tys, &cx.registry, cx.interner);
    let encs: Vec<String> = field_tys.iter().map(|t| t.encode(cx.interner)).collect();
    let rec = format!("{{ {} }}", encs.join(", "));

    let raw = cx.fresh_temp();
    cx.line(&format!("{raw} = call i8* @GC_malloc(i64 {})", layout.size));
    let recp = cx.fresh_temp();
    cx.line(&format!("{recp} = bitcast i8* {raw} to {rec}*"));
    let pp = cx.fresh_temp();
    cx.line(&format!(
        "{pp} = getelementptr inbounds {rec}, {rec}* {recp}, i32 0, i32 0"
    ));
    cx.line(&format!("store {} {}, {}* {pp}", encs[0], f.repr, encs[0]));
    for (i, b) in bound.iter().enumerate() {
        let fp = cx.fresh_temp();
        cx.line(&format!(
            "{fp} = getelementptr inbounds {rec}, {rec}* {recp}, i32 0, i32 {}",
            i + 1
        ));
        let enc = &encs[i + 1];
        cx.line(&format!("store {enc} {}, {enc}* {fp}", b.repr));
    }

    let rest = FunType::new(fun.params[k..].to_vec(), fun.ret.clone());
    Ok(expr::fn_pair(cx, &symbol, rest, &raw))
}

/// Emit the forwarder for binding `k` leading arguments of functions
/// with type token `token`: unpack the record, then tail through to the
/// stored pair with bound plus remaining arguments.
fn emit_thunk(cx: &mut Cx, fun: &FunType, k: usize, token: &str) -> String {
    let symbol = mangle::thunk_symbol(token, k);
    cx.cache_thunk(token.to_string(), k, symbol.clone());

    let pair_enc = fun.pair(cx.interner);
    let mut encs = vec![pair_enc.clone()];
    encs.extend(fun.params[..k].iter().map(|t| t.encode(cx.interner)));
    let rec = format!("{{ {} }}", encs.join(", "));

    cx.push_fn(&symbol);
    let recp = cx.fresh_temp();
    cx.line(&format!("{recp} = bitcast i8* %__env to {rec}*"));
    let pp = cx.fresh_temp();
    cx.line(&format!(
        "{pp} = getelementptr inbounds {rec}, {rec}* {recp}, i32 0, i32 0"
    ));
    let pv = cx.fresh_temp();
    cx.line(&format!("{pv} = load {pair_enc}, {pair_enc}* {pp}"));

    let mut call_args = Vec::with_capacity(fun.params.len());
    for (i, ty) in fun.params[..k].iter().enumerate() {
        let enc = &encs[i + 1];
        let fp = cx.fresh_temp();
        cx.line(&format!(
            "{fp} = getelementptr inbounds {rec}, {rec}* {recp}, i32 0, i32 {}",
            i + 1
        ));
        let bv = cx.fresh_temp();
        cx.line(&format!("{bv} = load {enc}, {enc}* {fp}"));
        call_args.push(Value::new(ty.clone(), bv));
    }
    for (i, ty) in fun.params[k..].iter().enumerate() {
        call_args.push(Value::new(ty.clone(), format!("%a{i}")));
    }

    let inner = Value::new(Type::Fun(Box::new(fun.clone())), pv);
    let out = emit_pair_call(cx, &inner, fun, &call_args);
    if fun.ret.is_void() {
        cx.term("ret void");
    } else {
        cx.term(&format!(
            "ret {} {}",
            fun.ret.encode(cx.interner),
            out.repr
        ));
    }

    let mut header_params = vec!["i8* %__env".to_string()];
    header_params.extend(
        fun.params[k..]
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{} %a{i}", t.encode(cx.interner))),
    );
    cx.finish_fn(&format!(
        "define internal {} @{symbol}({})",
        fun.ret.encode(cx.interner),
        header_params.join(", ")
    ));
    symbol
}

// Most call sites pass at most a handful of arguments.
fn lower_args(cx: &mut Cx, args: ExprRange) -> Result<SmallVec<[Value; 4]>> {
    let ids = cx.ast().arena.expr_list(args).to_vec();
    ids.into_iter().map(|id| expr::lower(cx, id)).collect()
}
