//! Function-body lowering.
//!
//! One path lowers every emitted function: module functions, methods,
//! nested functions, and the bodies behind instantiations. The emitted
//! convention is uniform: a hidden `i8* %__env` first parameter carries
//! nothing for plain functions, the receiver pointer for methods, and
//! the capture record for nested functions.

use skarn_ir::{ast, ice, Name};
use skarn_types::{FunType, Type};

use crate::context::{Cx, Value};
use crate::names::Binding;
use crate::{stmt, Result};

/// Lower one function body under the current ambient state.
///
/// Parameters land in collector-backed slots so assignment and capture
/// treat them like any other local. A body that falls off the end gets
/// `ret void` when the return type is void, `unreachable` otherwise;
/// the checking pass has already proven the latter can't be reached.
pub fn lower_fn(
    cx: &mut Cx,
    func: &ast::Func,
    symbol: &str,
    fun: &FunType,
    captures: &[(Name, String, Type)],
    receiver: Option<Type>,
) -> Result<()> {
    let ast = cx.ast();
    let param_defs: Vec<ast::Param> = ast.arena.param_list(func.params).to_vec();
    if param_defs.len() != fun.params.len() {
        ice!("`{symbol}` parameter count does not match its type");
    }

    let saved = cx.scope.clone();
    cx.push_fn(symbol);

    let mut header_params = vec!["i8* %__env".to_string()];
    for (def, ty) in param_defs.iter().zip(&fun.params) {
        header_params.push(format!(
            "{} %{}",
            ty.encode(cx.interner),
            cx.interner.lookup(def.name)
        ));
    }

    unpack_captures(cx, captures);

    if let Some(ty) = receiver {
        let enc = ty.encode(cx.interner);
        let reg = cx.fresh_temp();
        cx.line(&format!("{reg} = bitcast i8* %__env to {enc}"));
        cx.scope.bind(Name::SELF, Binding::Value(Value::new(ty, reg)));
    }

    for (def, ty) in param_defs.iter().zip(&fun.params) {
        let slot = cx.alloc_slot(def.name, ty);
        let enc = ty.encode(cx.interner);
        cx.line(&format!(
            "store {enc} %{}, {enc}* {slot}",
            cx.interner.lookup(def.name)
        ));
        cx.scope.bind(
            def.name,
            Binding::Slot {
                ptr: slot,
                ty: ty.clone(),
            },
        );
    }

    stmt::lower_block(cx, func.body)?;

    if !cx.terminated() {
        if fun.ret.is_void() {
            cx.term("ret void");
        } else {
            cx.term("unreachable");
        }
    }

    let header = format!(
        "define internal {} @{symbol}({})",
        fun.ret.encode(cx.interner),
        header_params.join(", ")
    );
    cx.finish_fn(&header);
    cx.scope = saved;
    Ok(())
}

/// Rebind captured slots from the capture record the reference site
/// built. The record holds one pointer per captured slot, in the same
/// name order the capture list was taken in.
fn unpack_captures(cx: &mut Cx, captures: &[(Name, String, Type)]) {
    if captures.is_empty() {
        return;
    }
    let fields: Vec<String> = captures
        .iter()
        .map(|(_, _, ty)| format!("{}*", ty.encode(cx.interner)))
        .collect();
    let rec = format!("{{ {} }}", fields.join(", "));
    let base = cx.fresh_temp();
    cx.line(&format!("{base} = bitcast i8* %__env to {rec}*"));
    for (i, (name, _, ty)) in captures.iter().enumerate() {
        let enc = ty.encode(cx.interner);
        let fieldp = cx.fresh_temp();
        cx.line(&format!(
            "{fieldp} = getelementptr inbounds {rec}, {rec}* {base}, i32 0, i32 {i}"
        ));
        let slot = cx.fresh_temp();
        cx.line(&format!("{slot} = load {enc}*, {enc}** {fieldp}"));
        cx.scope.bind(
            *name,
            Binding::Slot {
                ptr: slot,
                ty: ty.clone(),
            },
        );
    }
}
