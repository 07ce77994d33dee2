//! Template-string lowering.
//!
//! A template reduces to one formatter call over two collector-backed
//! arrays: the literal fragments in order, and the interpolated values
//! after string conversion. The formatter is the expression's named one
//! when the source gave one, otherwise the `format` visible at the use
//! site, so a module can swap the default by shadowing that name.

use skarn_ir::ast::TemplatePart;
use skarn_ir::{Name, PartRange};
use skarn_types::{AggRef, MethodInfo, Type};

use crate::context::{Cx, Value};
use crate::{call, expr, Result};

pub fn lower_template(cx: &mut Cx, parts: PartRange, formatter: Name) -> Result<Value> {
    let list = cx.ast().arena.part_list(parts).to_vec();

    let mut literals: Vec<Value> = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    for part in list {
        match part {
            TemplatePart::Lit(text) => literals.push(cx.str_const(text)),
            TemplatePart::Expr(e) => {
                let v = expr::lower(cx, e)?;
                values.push(stringify(cx, v)?);
            }
        }
    }

    let lit_count = literals.len();
    let val_count = values.len();
    let lit_arr = str_array(cx, &literals);
    let val_arr = str_array(cx, &values);

    let fmt = if formatter == Name::EMPTY {
        Name::FORMAT
    } else {
        formatter
    };
    call::call_named(
        cx,
        fmt,
        vec![
            lit_arr,
            Value::new(Type::Int, lit_count.to_string()),
            val_arr,
            Value::new(Type::Int, val_count.to_string()),
        ],
    )
}

/// A collector-backed `%str` array holding `items` in order.
fn str_array(cx: &mut Cx, items: &[Value]) -> Value {
    let size = 16 * items.len() as u64;
    let raw = cx.fresh_temp();
    cx.line(&format!("{raw} = call i8* @GC_malloc(i64 {size})"));
    let arr = cx.fresh_temp();
    cx.line(&format!("{arr} = bitcast i8* {raw} to %str*"));
    for (i, item) in items.iter().enumerate() {
        let ep = cx.fresh_temp();
        cx.line(&format!(
            "{ep} = getelementptr inbounds %str, %str* {arr}, i64 {i}"
        ));
        cx.line(&format!("store %str {}, %str* {ep}", item.repr));
    }
    Value::new(Type::Ptr(Box::new(Type::Str)), arr)
}

/// Convert an interpolated value to `str`. Primitives go through the
/// runtime helpers, aggregates through their `str` capability; anything
/// without a conversion renders as an opaque placeholder.
fn stringify(cx: &mut Cx, v: Value) -> Result<Value> {
    match v.ty.clone() {
        Type::Str => Ok(v),
        Type::Int => helper_call(cx, "str_of_int", v),
        Type::Short => {
            let wide = cx.fresh_temp();
            cx.line(&format!("{wide} = sext i16 {} to i64", v.repr));
            helper_call(cx, "str_of_int", Value::new(Type::Int, wide))
        }
        Type::Char => helper_call(cx, "str_of_char", v),
        Type::Bool => helper_call(cx, "str_of_bool", v),
        Type::Struct(agg) => match struct_cap(cx, agg) {
            Some(info) => {
                let p = expr::spill(cx, &v);
                cap_call(cx, p, agg, info)
            }
            None => opaque(cx),
        },
        Type::Enum(agg) => match enum_cap(cx, agg) {
            Some(info) => {
                let p = expr::spill(cx, &v);
                cap_call(cx, p, agg, info)
            }
            None => opaque(cx),
        },
        Type::Ptr(inner) => match *inner {
            Type::Struct(agg) => match struct_cap(cx, agg) {
                Some(info) => cap_call(cx, v.repr, agg, info),
                None => opaque(cx),
            },
            Type::Enum(agg) => match enum_cap(cx, agg) {
                Some(info) => cap_call(cx, v.repr, agg, info),
                None => opaque(cx),
            },
            _ => opaque(cx),
        },
        _ => opaque(cx),
    }
}

fn helper_call(cx: &mut Cx, helper: &str, v: Value) -> Result<Value> {
    let name = cx.interner.intern(helper);
    call::call_named(cx, name, vec![v])
}

fn struct_cap(cx: &Cx, agg: AggRef) -> Option<MethodInfo> {
    cx.registry
        .struct_inst(agg.stem)
        .and_then(|inst| inst.caps.stringable.clone())
}

fn enum_cap(cx: &Cx, agg: AggRef) -> Option<MethodInfo> {
    cx.registry
        .enum_inst(agg.stem)
        .and_then(|inst| inst.caps.stringable.clone())
}

fn cap_call(cx: &mut Cx, recv: String, agg: AggRef, info: MethodInfo) -> Result<Value> {
    let env = cx.fresh_temp();
    cx.line(&format!(
        "{env} = bitcast %{}* {recv} to i8*",
        cx.interner.lookup(agg.stem)
    ));
    Ok(call::emit_known_call(cx, &info.symbol, &info.fun, &env, &[]))
}

fn opaque(cx: &mut Cx) -> Result<Value> {
    let text = cx.interner.intern("<object>");
    Ok(cx.str_const(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ModuleState;
    use crate::names::{Binding, Scope};
    use pretty_assertions::assert_eq;
    use skarn_ir::ast::{self, ExprKind};
    use skarn_ir::{Arena, StringInterner};
    use skarn_types::{FunType, ModuleId};
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

    fn formatter_fun() -> FunType {
        FunType::new(
            vec![
                Type::Ptr(Box::new(Type::Str)),
                Type::Int,
                Type::Ptr(Box::new(Type::Str)),
                Type::Int,
            ],
            Type::Str,
        )
    }

    #[test]
    fn template_calls_the_default_formatter() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut arena = Arena::new();
        let n = interner.intern("n");
        let lit = interner.intern("n = ");
        let nref = arena.alloc_expr(ExprKind::Ident(n));
        let parts = arena.alloc_parts([TemplatePart::Lit(lit), TemplatePart::Expr(nref)]);
        let tpl = arena.alloc_expr(ExprKind::Template {
            parts,
            formatter: Name::EMPTY,
        });
        let mut cx = cx_for(&interner, &loader, arena);

        cx.push_fn("_sk_app$f");
        cx.scope.bind(
            n,
            Binding::Slot {
                ptr: "%n.addr.0".to_string(),
                ty: Type::Int,
            },
        );
        cx.scope.bind(
            Name::FORMAT,
            Binding::Func {
                symbol: "format".to_string(),
                fun: formatter_fun(),
            },
        );
        cx.scope.bind(
            interner.intern("str_of_int"),
            Binding::Func {
                symbol: "str_of_int".to_string(),
                fun: FunType::new(vec![Type::Int], Type::Str),
            },
        );
        let v = match expr::lower(&mut cx, tpl) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(v.ty, Type::Str);
        cx.term("ret void");
        cx.finish_fn("define internal void @_sk_app$f(i8* %__env)");

        let text = cx.output();
        assert!(text.contains("@.str.0 = private unnamed_addr constant [5 x i8] c\"n = \\00\""));
        assert!(text.contains("%t.1 = call %str @str_of_int(i8* null, i64 %t.0)"));
        assert!(text.contains("call %str @format(i8* null, %str* %t.3, i64 1, %str* %t.6, i64 1)"));
    }

    #[test]
    fn named_formatter_wins_over_the_default() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut arena = Arena::new();
        let lit = interner.intern("!");
        let hex = interner.intern("hex");
        let parts = arena.alloc_parts([TemplatePart::Lit(lit)]);
        let tpl = arena.alloc_expr(ExprKind::Template {
            parts,
            formatter: hex,
        });
        let mut cx = cx_for(&interner, &loader, arena);

        cx.push_fn("_sk_app$f");
        cx.scope.bind(
            hex,
            Binding::Func {
                symbol: "hex".to_string(),
                fun: formatter_fun(),
            },
        );
        if let Err(e) = expr::lower(&mut cx, tpl) {
            panic!("{e}");
        }
        cx.term("ret void");
        cx.finish_fn("define internal void @_sk_app$f(i8* %__env)");

        let text = cx.output();
        assert!(text.contains("call %str @hex(i8* null"));
        assert!(!text.contains("@format"));
    }

    #[test]
    fn values_without_a_conversion_render_opaque() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut arena = Arena::new();
        let p = interner.intern("p");
        let pref = arena.alloc_expr(ExprKind::Ident(p));
        let parts = arena.alloc_parts([TemplatePart::Expr(pref)]);
        let tpl = arena.alloc_expr(ExprKind::Template {
            parts,
            formatter: Name::EMPTY,
        });
        let mut cx = cx_for(&interner, &loader, arena);

        cx.push_fn("_sk_app$f");
        cx.scope.bind(
            p,
            Binding::Slot {
                ptr: "%p.addr.0".to_string(),
                ty: Type::Ptr(Box::new(Type::Int)),
            },
        );
        cx.scope.bind(
            Name::FORMAT,
            Binding::Func {
                symbol: "format".to_string(),
                fun: formatter_fun(),
            },
        );
        if let Err(e) = expr::lower(&mut cx, tpl) {
            panic!("{e}");
        }
        cx.term("ret void");
        cx.finish_fn("define internal void @_sk_app$f(i8* %__env)");

        assert!(cx.output().contains("c\"<object>\\00\""));
    }
}
