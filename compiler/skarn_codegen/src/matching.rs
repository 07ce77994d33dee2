//! `match` lowering.
//!
//! The scrutinee is reduced to an enum pointer, the tag is loaded once,
//! and a `switch` fans out to one block per arm. An arm with a binding
//! reads the payload slot through the packed layout into a fresh local,
//! scoped to that arm. A written default body becomes the switch
//! default; without one the default block is unreachable, which is what
//! makes a full match exhaustive by construction.

use skarn_ir::{ast, ice, ArmRange, ExprId, Name, StmtRange};
use skarn_types::{AggRef, Type};

use crate::context::Cx;
use crate::names::Binding;
use crate::{expr, stmt, Result};

pub fn lower_match(
    cx: &mut Cx,
    scrutinee: ExprId,
    arms: ArmRange,
    default_body: StmtRange,
    has_default: bool,
) -> Result<()> {
    let (ptr, agg) = enum_addr(cx, scrutinee)?;
    let arm_list = cx.ast().arena.arm_list(arms).to_vec();

    let (tag_ir, payload_size) = {
        let Some(inst) = cx.registry.enum_inst(agg.stem) else {
            ice!("enum `{}` not registered", cx.interner.lookup(agg.stem));
        };
        (inst.tag_ir(), inst.payload_size)
    };
    let senc = format!("%{}", cx.interner.lookup(agg.stem));

    let n = cx.fresh_label();
    let end = format!("match.end.{n}");
    let default = format!("match.default.{n}");

    let tp = cx.fresh_temp();
    cx.line(&format!(
        "{tp} = getelementptr inbounds {senc}, {senc}* {ptr}, i32 0, i32 0"
    ));
    let tag = cx.fresh_temp();
    cx.line(&format!("{tag} = load {tag_ir}, {tag_ir}* {tp}, align 1"));

    let mut table = String::new();
    for (i, arm) in arm_list.iter().enumerate() {
        let t = case_tag(cx, agg, arm.variant)?;
        table.push_str(&format!("{tag_ir} {t}, label %match.case.{n}.{i} "));
    }
    cx.term(&format!(
        "switch {tag_ir} {tag}, label %{default} [ {table}]"
    ));

    for (i, arm) in arm_list.iter().enumerate() {
        cx.label_line(&format!("match.case.{n}.{i}"));
        let saved = cx.scope.clone();
        if arm.binding != Name::EMPTY {
            bind_payload(cx, &senc, &ptr, payload_size, agg, arm)?;
        }
        stmt::lower_block(cx, arm.body)?;
        cx.scope = saved;
        if !cx.terminated() {
            cx.term(&format!("br label %{end}"));
        }
    }

    cx.label_line(&default);
    if has_default {
        stmt::lower_block(cx, default_body)?;
        if !cx.terminated() {
            cx.term(&format!("br label %{end}"));
        }
    } else {
        cx.term("unreachable");
    }

    cx.label_line(&end);
    Ok(())
}

/// Reduce the scrutinee to a pointer at an enum value. A value
/// scrutinee is parked in collector storage first.
fn enum_addr(cx: &mut Cx, scrutinee: ExprId) -> Result<(String, AggRef)> {
    if expr::addressable(cx, scrutinee) {
        let (ptr, ty) = expr::place(cx, scrutinee)?;
        return match ty {
            Type::Enum(agg) => Ok((ptr, agg)),
            Type::Ptr(inner) => match *inner {
                Type::Enum(agg) => {
                    let penc = format!("%{}*", cx.interner.lookup(agg.stem));
                    let pv = cx.fresh_temp();
                    cx.line(&format!("{pv} = load {penc}, {penc}* {ptr}"));
                    Ok((pv, agg))
                }
                other => ice!("match over *{}", other.display(cx.interner)),
            },
            other => ice!("match over {}", other.display(cx.interner)),
        };
    }
    let v = expr::lower(cx, scrutinee)?;
    match v.ty.clone() {
        Type::Enum(agg) => {
            let p = expr::spill(cx, &v);
            Ok((p, agg))
        }
        Type::Ptr(inner) => match *inner {
            Type::Enum(agg) => Ok((v.repr, agg)),
            other => ice!("match over *{}", other.display(cx.interner)),
        },
        other => ice!("match over {}", other.display(cx.interner)),
    }
}

fn case_tag(cx: &Cx, agg: AggRef, variant: Name) -> Result<u64> {
    let Some(inst) = cx.registry.enum_inst(agg.stem) else {
        ice!("enum `{}` not registered", cx.interner.lookup(agg.stem));
    };
    match inst.tag_of(variant) {
        Some(t) => Ok(t),
        None => ice!(
            "no case `{}` on `{}`",
            cx.interner.lookup(variant),
            cx.interner.lookup(agg.stem)
        ),
    }
}

/// Read the payload for a binding arm into a fresh slot.
fn bind_payload(
    cx: &mut Cx,
    senc: &str,
    ptr: &str,
    payload_size: u64,
    agg: AggRef,
    arm: &ast::MatchArm,
) -> Result<()> {
    let pty = {
        let Some(inst) = cx.registry.enum_inst(agg.stem) else {
            ice!("enum `{}` not registered", cx.interner.lookup(agg.stem));
        };
        match inst.payload_of(arm.variant) {
            Some(ty) => ty.clone(),
            None => ice!(
                "case `{}` carries no payload",
                cx.interner.lookup(arm.variant)
            ),
        }
    };
    let penc = pty.encode(cx.interner);
    let pp = cx.fresh_temp();
    cx.line(&format!(
        "{pp} = getelementptr inbounds {senc}, {senc}* {ptr}, i32 0, i32 1"
    ));
    let pc = cx.fresh_temp();
    cx.line(&format!(
        "{pc} = bitcast [{payload_size} x i8]* {pp} to {penc}*"
    ));
    let pv = cx.fresh_temp();
    cx.line(&format!("{pv} = load {penc}, {penc}* {pc}, align 1"));
    let slot = cx.alloc_slot(arm.binding, &pty);
    cx.line(&format!("store {penc} {pv}, {penc}* {slot}"));
    cx.scope.bind(
        arm.binding,
        Binding::Slot {
            ptr: slot,
            ty: pty,
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ModuleState;
    use crate::names::Scope;
    use skarn_ir::ast::ExprKind;
    use skarn_ir::{Arena, StringInterner};
    use skarn_types::ModuleId;
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
        cx.module_ids.insert(path, ModuleId::new(0));
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

    fn shape_enum(cx: &mut Cx, interner: &StringInterner) -> AggRef {
        let stem = interner.intern("app$Shape");
        let def = cx.registry.alloc_def(interner.intern("Shape"));
        cx.registry.register_enum(
            stem,
            vec![interner.intern("Round")],
            vec![(interner.intern("Sized"), Type::Int)],
            Vec::new(),
            interner,
        );
        AggRef { def, stem }
    }

    #[test]
    fn switch_covers_arms_and_binds_payloads() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut arena = Arena::new();
        let s = interner.intern("s");
        let n = interner.intern("n");
        let round = interner.intern("Round");
        let sized = interner.intern("Sized");
        let sref = arena.alloc_expr(ExprKind::Ident(s));
        let arms = arena.alloc_arms([
            ast::MatchArm {
                variant: round,
                binding: Name::EMPTY,
                body: StmtRange::EMPTY,
            },
            ast::MatchArm {
                variant: sized,
                binding: n,
                body: StmtRange::EMPTY,
            },
        ]);
        let mut cx = cx_for(&interner, &loader, arena);
        let agg = shape_enum(&mut cx, &interner);

        cx.push_fn("_sk_app$f");
        cx.scope.bind(
            s,
            Binding::Slot {
                ptr: "%s.addr.0".to_string(),
                ty: Type::Enum(agg),
            },
        );
        if let Err(e) = lower_match(&mut cx, sref, arms, StmtRange::EMPTY, false) {
            panic!("{e}");
        }
        cx.term("ret void");
        cx.finish_fn("define internal void @_sk_app$f(i8* %__env)");

        let text = cx.output();
        assert!(text.contains("%t.1 = load i8, i8* %t.0, align 1"));
        assert!(text.contains(
            "switch i8 %t.1, label %match.default.0 \
             [ i8 0, label %match.case.0.0 i8 1, label %match.case.0.1 ]"
        ));
        assert!(text.contains("match.case.0.0:\n  br label %match.end.0"));
        // The binding arm reads the payload through the packed slot.
        assert!(text.contains("bitcast [8 x i8]* %t.2 to i64*"));
        assert!(text.contains("%t.4 = load i64, i64* %t.3, align 1"));
        assert!(text.contains("store i64 %t.4, i64* %n.addr.6"));
        assert!(text.contains("match.default.0:\n  unreachable"));
        assert!(text.contains("match.end.0:"));
    }

    #[test]
    fn written_default_branches_to_the_end() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut arena = Arena::new();
        let s = interner.intern("s");
        let round = interner.intern("Round");
        let sref = arena.alloc_expr(ExprKind::Ident(s));
        let arms = arena.alloc_arms([ast::MatchArm {
            variant: round,
            binding: Name::EMPTY,
            body: StmtRange::EMPTY,
        }]);
        let mut cx = cx_for(&interner, &loader, arena);
        let agg = shape_enum(&mut cx, &interner);

        cx.push_fn("_sk_app$f");
        cx.scope.bind(
            s,
            Binding::Slot {
                ptr: "%s.addr.0".to_string(),
                ty: Type::Enum(agg),
            },
        );
        if let Err(e) = lower_match(&mut cx, sref, arms, StmtRange::EMPTY, true) {
            panic!("{e}");
        }
        cx.term("ret void");
        cx.finish_fn("define internal void @_sk_app$f(i8* %__env)");

        let text = cx.output();
        assert!(text.contains("match.default.0:\n  br label %match.end.0"));
        assert!(!text.contains("unreachable"));
    }

    #[test]
    fn pointer_scrutinees_are_dereferenced_once() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut arena = Arena::new();
        let s = interner.intern("s");
        let round = interner.intern("Round");
        let sref = arena.alloc_expr(ExprKind::Ident(s));
        let arms = arena.alloc_arms([ast::MatchArm {
            variant: round,
            binding: Name::EMPTY,
            body: StmtRange::EMPTY,
        }]);
        let mut cx = cx_for(&interner, &loader, arena);
        let agg = shape_enum(&mut cx, &interner);

        cx.push_fn("_sk_app$f");
        cx.scope.bind(
            s,
            Binding::Slot {
                ptr: "%s.addr.0".to_string(),
                ty: Type::Ptr(Box::new(Type::Enum(agg))),
            },
        );
        if let Err(e) = lower_match(&mut cx, sref, arms, StmtRange::EMPTY, true) {
            panic!("{e}");
        }
        cx.term("ret void");
        cx.finish_fn("define internal void @_sk_app$f(i8* %__env)");

        let text = cx.output();
        assert!(text.contains("%t.0 = load %app$Shape*, %app$Shape** %s.addr.0"));
        assert!(text.contains("getelementptr inbounds %app$Shape, %app$Shape* %t.0, i32 0, i32 0"));
    }
}
