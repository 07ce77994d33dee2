//! Module orchestration and the entry point.
//!
//! A module is generated at most once per context, memoized by its
//! interned loader path; an import found again just links the earlier
//! module's initializer into the importer's setup sequence. Items are
//! walked in three passes: declarations register templates and resolve
//! imports, value items (externs, aliases, constants, module variables)
//! bind into the globals, and finally every generic-free declaration is
//! instantiated in item order. The walk ends by emitting the module's
//! once-guarded initializer.
//!
//! The synthesized entry function owns process setup: collector init,
//! argument capture, the root initializer, then the user `main`.

use skarn_ir::{ast, ice, Name};
use skarn_types::{Abi, Bindings, FunType, ModuleId, Type};
use tracing::debug;

use crate::context::{Cx, InitStep, ModuleState, Value};
use crate::generics::{self, Template, TemplateKind};
use crate::names::{Binding, Scope};
use crate::{expr, mangle, types, Error, Result};

/// Generate the module at `path`, returning its id. Memoized: a path
/// already generated is returned as-is with no emission.
pub fn generate(cx: &mut Cx, path: Name) -> Result<ModuleId> {
    if let Some(&id) = cx.module_ids.get(&path) {
        return Ok(id);
    }
    let path_text = cx.interner.lookup(path).to_string();
    let Some(ast) = cx.loader.load(&path_text) else {
        return Err(Error::MissingModule { path: path_text });
    };
    debug!(path = path_text.as_str(), "generating module");

    let stem = mangle::module_stem(&path_text);
    let id = ModuleId::new(cx.modules.len() as u32);
    cx.module_ids.insert(path, id);
    cx.modules.push(ModuleState {
        path,
        stem: stem.clone(),
        globals: Scope::new(),
        init_symbol: mangle::init_symbol(&stem),
        ast,
        init_steps: Vec::new(),
    });

    // Imports re-enter this function mid-walk, so the walk runs under
    // its own ambient state and puts the caller's back afterwards.
    let saved = enter(cx, id);
    let result = walk(cx, id, &stem).and_then(|()| emit_init(cx, id));
    restore(cx, saved);
    result?;
    Ok(id)
}

struct Ambient {
    env: Bindings,
    suffix: String,
    generic_params: Vec<Name>,
    scope: Scope,
    cur_module: ModuleId,
}

fn enter(cx: &mut Cx, id: ModuleId) -> Ambient {
    let mut saved = Ambient {
        env: Bindings::new(),
        suffix: String::new(),
        generic_params: Vec::new(),
        scope: Scope::new(),
        cur_module: id,
    };
    std::mem::swap(&mut cx.env, &mut saved.env);
    std::mem::swap(&mut cx.suffix, &mut saved.suffix);
    std::mem::swap(&mut cx.generic_params, &mut saved.generic_params);
    std::mem::swap(&mut cx.scope, &mut saved.scope);
    std::mem::swap(&mut cx.cur_module, &mut saved.cur_module);
    saved
}

fn restore(cx: &mut Cx, mut saved: Ambient) {
    std::mem::swap(&mut cx.env, &mut saved.env);
    std::mem::swap(&mut cx.suffix, &mut saved.suffix);
    std::mem::swap(&mut cx.generic_params, &mut saved.generic_params);
    std::mem::swap(&mut cx.scope, &mut saved.scope);
    std::mem::swap(&mut cx.cur_module, &mut saved.cur_module);
}

fn walk(cx: &mut Cx, id: ModuleId, stem: &str) -> Result<()> {
    let items = cx.ast().items.clone();

    // Pass 1: templates, imports, overload sets. Everything a later
    // type annotation or call might name, before anything resolves.
    for item in &items {
        match *item {
            ast::Item::Func(fid) => declare_fn(cx, id, stem, fid),
            ast::Item::Struct(def) => declare_struct(cx, id, stem, def),
            ast::Item::Enum(def) => declare_enum(cx, id, stem, def),
            ast::Item::Import(def) => declare_import(cx, id, def)?,
            ast::Item::Mix(def) => declare_mix(cx, id, def),
            ast::Item::Var(_)
            | ast::Item::Const(_)
            | ast::Item::Extern(_)
            | ast::Item::Alias(_) => {}
        }
    }

    // Pass 2: value bindings. Externs first so bodies instantiated in
    // pass 3 find them regardless of item order.
    for item in &items {
        if let ast::Item::Extern(def) = *item {
            declare_extern(cx, id, def)?;
        }
    }
    for item in &items {
        match *item {
            ast::Item::Alias(def) => {
                let ty = types::resolve(cx, def.ty)?;
                cx.modules[id.index()].globals.bind(def.name, Binding::Ty(ty));
            }
            ast::Item::Const(def) => {
                let v = const_value(cx, def.value);
                cx.modules[id.index()]
                    .globals
                    .bind(def.name, Binding::Value(v));
            }
            ast::Item::Var(def) => declare_var(cx, id, stem, def)?,
            _ => {}
        }
    }

    // Pass 3: one immediate lowering per generic-free declaration, in
    // item order. Generic templates wait for a demand site.
    for item in &items {
        match *item {
            ast::Item::Func(fid) => {
                let func = *cx.ast().arena.func(fid);
                if cx.ast().arena.name_list(func.generics).is_empty() {
                    let tid = template_of(cx, id, func.name);
                    generics::ensure_fn(cx, tid, &[])?;
                }
            }
            ast::Item::Struct(def) => {
                if cx.ast().arena.name_list(def.generics).is_empty() {
                    let tid = template_of(cx, id, def.name);
                    generics::ensure_agg(cx, tid, &[])?;
                }
            }
            ast::Item::Enum(def) => {
                if cx.ast().arena.name_list(def.generics).is_empty() {
                    let tid = template_of(cx, id, def.name);
                    generics::ensure_agg(cx, tid, &[])?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn declare_fn(cx: &mut Cx, id: ModuleId, stem: &str, fid: skarn_ir::FuncId) {
    let func = *cx.ast().arena.func(fid);
    let explicit = cx.ast().arena.name_list(func.generics).to_vec();
    let base_symbol = mangle::item_symbol(stem, cx.interner.lookup(func.name));
    let tid = generics::register(
        cx,
        Template {
            module: id,
            kind: TemplateKind::Func(fid),
            explicit,
            implicit: Vec::new(),
            base_symbol,
            captures: Vec::new(),
        },
    );
    cx.modules[id.index()]
        .globals
        .bind(func.name, Binding::Template(tid));
}

fn declare_struct(cx: &mut Cx, id: ModuleId, stem: &str, def: ast::StructDef) {
    let def_id = cx.registry.alloc_def(def.name);
    let explicit = cx.ast().arena.name_list(def.generics).to_vec();
    let base_symbol = mangle::agg_stem(stem, cx.interner.lookup(def.name));
    let tid = generics::register(
        cx,
        Template {
            module: id,
            kind: TemplateKind::Struct { def, def_id },
            explicit,
            implicit: Vec::new(),
            base_symbol,
            captures: Vec::new(),
        },
    );
    cx.modules[id.index()]
        .globals
        .bind(def.name, Binding::Template(tid));
}

fn declare_enum(cx: &mut Cx, id: ModuleId, stem: &str, def: ast::EnumDef) {
    let def_id = cx.registry.alloc_def(def.name);
    let explicit = cx.ast().arena.name_list(def.generics).to_vec();
    let base_symbol = mangle::agg_stem(stem, cx.interner.lookup(def.name));
    let tid = generics::register(
        cx,
        Template {
            module: id,
            kind: TemplateKind::Enum { def, def_id },
            explicit,
            implicit: Vec::new(),
            base_symbol,
            captures: Vec::new(),
        },
    );
    cx.modules[id.index()]
        .globals
        .bind(def.name, Binding::Template(tid));
}

fn declare_import(cx: &mut Cx, id: ModuleId, def: ast::ImportDef) -> Result<()> {
    let dep = generate(cx, def.path)?;
    cx.modules[id.index()]
        .globals
        .bind(def.alias, Binding::Value(Value::new(Type::Module(dep), "")));
    cx.modules[id.index()].init_steps.push(InitStep::Import(dep));
    Ok(())
}

fn declare_mix(cx: &mut Cx, id: ModuleId, def: ast::MixDef) {
    let members = cx.ast().arena.name_list(def.members).to_vec();
    cx.modules[id.index()].globals.bind(
        def.name,
        Binding::Mix {
            module: id,
            members,
        },
    );
}

fn declare_extern(cx: &mut Cx, id: ModuleId, def: ast::ExternDef) -> Result<()> {
    let params = types::resolve_list(cx, def.params)?;
    let ret = types::resolve_ret(cx, def.ret)?;
    let fun = FunType {
        params,
        ret,
        generics: Vec::new(),
        abi: Abi::C,
    };
    let symbol = cx.interner.lookup(def.name).to_string();
    let encs: Vec<String> = fun.params.iter().map(|p| p.encode(cx.interner)).collect();
    cx.hoist(&format!(
        "declare {} @{symbol}({})",
        fun.ret.encode(cx.interner),
        encs.join(", ")
    ));
    cx.modules[id.index()]
        .globals
        .bind(def.name, Binding::Func { symbol, fun });
    Ok(())
}

fn declare_var(cx: &mut Cx, id: ModuleId, stem: &str, def: ast::VarDef) -> Result<()> {
    let ty = if def.ty.is_valid() {
        types::resolve(cx, def.ty)?
    } else {
        ice!(
            "module variable `{}` carries no type",
            cx.interner.lookup(def.name)
        );
    };
    let global = mangle::item_symbol(stem, cx.interner.lookup(def.name));
    let enc = ty.encode(cx.interner);
    cx.hoist(&format!("@{global} = internal global {enc} zeroinitializer"));
    cx.modules[id.index()].globals.bind(
        def.name,
        Binding::Slot {
            ptr: format!("@{global}"),
            ty: ty.clone(),
        },
    );
    cx.modules[id.index()].init_steps.push(InitStep::Var {
        global,
        ty,
        value: def.value,
    });
    Ok(())
}

/// A module constant is a literal; its value needs no storage.
fn const_value(cx: &mut Cx, value: skarn_ir::ExprId) -> Value {
    match *cx.ast().arena.expr(value) {
        ast::ExprKind::Bool(b) => Value::new(Type::Bool, if b { "true" } else { "false" }),
        ast::ExprKind::Int(i) => Value::new(Type::Int, i.to_string()),
        ast::ExprKind::Char(c) => Value::new(Type::Char, c.to_string()),
        ast::ExprKind::Str(content) => cx.str_const(content),
        other => ice!("constant initializer is not a literal: {other:?}"),
    }
}

fn template_of(cx: &Cx, id: ModuleId, name: Name) -> generics::TemplateId {
    match cx.modules[id.index()].globals.lookup(name) {
        Some(Binding::Template(tid)) => *tid,
        _ => ice!("`{}` lost its template binding", cx.interner.lookup(name)),
    }
}

/// Emit the module initializer: a ready-flag check around the imported
/// initializers and module-variable stores, in declaration order.
fn emit_init(cx: &mut Cx, id: ModuleId) -> Result<()> {
    let init_symbol = cx.modules[id.index()].init_symbol.clone();
    let ready = mangle::ready_global(&cx.modules[id.index()].stem);
    let steps = cx.modules[id.index()].init_steps.clone();
    cx.hoist(&format!("@{ready} = internal global i1 false"));

    cx.push_fn(&init_symbol);
    let n = cx.fresh_label();
    let done = cx.fresh_temp();
    cx.line(&format!("{done} = load i1, i1* @{ready}"));
    cx.term(&format!(
        "br i1 {done}, label %init.done.{n}, label %init.run.{n}"
    ));

    cx.label_line(&format!("init.run.{n}"));
    cx.line(&format!("store i1 true, i1* @{ready}"));
    for step in steps {
        match step {
            InitStep::Import(dep) => {
                let dep_init = cx.modules[dep.index()].init_symbol.clone();
                cx.line(&format!("call void @{dep_init}(i8* null)"));
            }
            InitStep::Var { global, ty, value } => {
                let v = expr::lower(cx, value)?;
                let enc = ty.encode(cx.interner);
                cx.line(&format!("store {enc} {}, {enc}* @{global}", v.repr));
            }
        }
    }
    cx.term(&format!("br label %init.done.{n}"));

    cx.label_line(&format!("init.done.{n}"));
    cx.term("ret void");
    cx.finish_fn(&format!("define internal void @{init_symbol}(i8* %__env)"));
    Ok(())
}

/// Validate `main` and synthesize the externally visible entry function.
///
/// The entry is the one function without the hidden environment
/// parameter: it initializes the collector, captures the argument
/// count and vector, runs the root initializer, and calls the user
/// `main` once.
pub fn emit_entry(cx: &mut Cx, root: ModuleId) -> Result<()> {
    let binding = cx.modules[root.index()].globals.lookup(Name::MAIN).cloned();
    let Some(binding) = binding else {
        return Err(Error::MissingMain);
    };
    let Binding::Template(tid) = binding else {
        return Err(Error::BadMainSignature);
    };
    if !cx.templates[tid.index()].explicit.is_empty() {
        return Err(Error::BadMainSignature);
    }
    // A cache hit: the generic-free root walk already lowered it.
    let (symbol, fun) = generics::ensure_fn(cx, tid, &[])?;
    if !fun.params.is_empty() || !fun.ret.is_void() {
        return Err(Error::BadMainSignature);
    }
    let init_symbol = cx.modules[root.index()].init_symbol.clone();
    debug!(symbol = symbol.as_str(), "emitting entry function");

    cx.push_fn("main");
    cx.line("call void @GC_init()");
    cx.line("store i32 %argc, i32* @sk.argc");
    cx.line("store i8** %argv, i8*** @sk.argv");
    cx.line(&format!("call void @{init_symbol}(i8* null)"));
    cx.line(&format!("call void @{symbol}(i8* null)"));
    cx.term("ret i32 0");
    cx.finish_fn("define i32 @main(i32 %argc, i8** %argv)");
    Ok(())
}
