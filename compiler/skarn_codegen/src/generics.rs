//! Declaration templates and demand-driven instantiation.
//!
//! Every function, struct, and enum declaration registers a template;
//! generic-free declarations are additionally instantiated on the spot
//! with an empty filler tuple, so there is exactly one lowering path.
//! An instantiation binds the fillers, substitutes them into the
//! declaration's suffix fragment, and lowers the body under the
//! resulting environment. Instances are cached by instantiated stem,
//! and the cache is filled before the body is lowered so self-recursion
//! terminates.

use skarn_ir::{ast, ice, FuncId, Name, TypeExprId};
use skarn_types::{
    substitute_fragment, AggRef, Bindings, DefId, FunType, MethodInfo, ModuleId, Type,
};
use tracing::debug;

use crate::context::Cx;
use crate::names::Scope;
use crate::{func, mangle, types, Error, Result};

/// Frames of one template allowed on the instantiation stack before
/// specialization is reported as runaway.
pub const GENERIC_RECURSION_LIMIT: usize = 32;

/// Identifier of a registered template.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct TemplateId(u32);

impl TemplateId {
    pub const fn new(index: u32) -> Self {
        TemplateId(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a template declares.
#[derive(Copy, Clone, Debug)]
pub enum TemplateKind {
    Func(FuncId),
    Struct { def: ast::StructDef, def_id: DefId },
    Enum { def: ast::EnumDef, def_id: DefId },
}

/// A registered declaration.
#[derive(Clone)]
pub struct Template {
    /// Module the declaration lives in; instantiation resolves against
    /// its globals.
    pub module: ModuleId,
    pub kind: TemplateKind,
    /// Own type parameters.
    pub explicit: Vec<Name>,
    /// Enclosing type parameters, outermost first. Their fillers come
    /// from the environment active at the demand site.
    pub implicit: Vec<Name>,
    /// Symbol stem before any instantiation suffix. For nested
    /// functions this already embeds the enclosing instance's suffix.
    pub base_symbol: String,
    /// Captured slots for nested functions, in name order.
    pub captures: Vec<(Name, String, Type)>,
}

/// Register a template, returning its id.
pub fn register(cx: &mut Cx, template: Template) -> TemplateId {
    let id = TemplateId::new(cx.templates.len() as u32);
    cx.templates.push(template);
    id
}

/// Instantiate a function template, lowering its body on a cache miss.
/// Returns the instance symbol and its concrete type.
pub fn ensure_fn(cx: &mut Cx, tid: TemplateId, fillers: &[Type]) -> Result<(String, FunType)> {
    let template = cx.templates[tid.index()].clone();
    let TemplateKind::Func(func_id) = template.kind else {
        ice!("`{}` is not a function", template.base_symbol);
    };
    check_arity(&template, fillers);

    let env = instance_env(cx, &template, fillers);
    let fragment = mangle::generic_suffix(&template.explicit, cx.interner);
    let suffix = substitute_fragment(&fragment, &env, cx.interner);
    let symbol = format!("{}{}", template.base_symbol, suffix);
    let stem = cx.interner.intern(&symbol);

    let saved = enter(cx, &template, env, suffix);
    let result = fn_instance(cx, tid, &template, func_id, &symbol, stem);
    restore(cx, saved);
    result.map(|fun| (symbol, fun))
}

/// Instantiate an aggregate template, registering the instance and
/// lowering its methods on a cache miss. Returns the instance's value
/// type.
pub fn ensure_agg(cx: &mut Cx, tid: TemplateId, fillers: &[Type]) -> Result<Type> {
    let template = cx.templates[tid.index()].clone();
    let (def, def_id) = match template.kind {
        TemplateKind::Struct { def, def_id } => (AggDef::Struct(def), def_id),
        TemplateKind::Enum { def, def_id } => (AggDef::Enum(def), def_id),
        TemplateKind::Func(_) => ice!("`{}` is not a type", template.base_symbol),
    };
    check_arity(&template, fillers);

    let env = instance_env(cx, &template, fillers);
    let fragment = mangle::generic_suffix(&template.explicit, cx.interner);
    let suffix = substitute_fragment(&fragment, &env, cx.interner);
    let stem_text = format!("{}{}", template.base_symbol, suffix);
    let stem = cx.interner.intern(&stem_text);

    let agg = AggRef { def: def_id, stem };
    let value = match def {
        AggDef::Struct(_) => Type::Struct(agg),
        AggDef::Enum(_) => Type::Enum(agg),
    };

    if cx.instances.contains(&(tid, stem)) {
        return Ok(value);
    }
    if frames_of(cx, tid) >= GENERIC_RECURSION_LIMIT {
        return Err(Error::GenericRecursion {
            name: stem_text,
            limit: GENERIC_RECURSION_LIMIT,
        });
    }
    cx.instances.insert((tid, stem));
    cx.in_progress.push(tid);
    debug!(stem = stem_text.as_str(), "lowering aggregate instance");

    let saved = enter(cx, &template, env, suffix);
    let result = match def {
        AggDef::Struct(def) => struct_instance(cx, def, agg, &stem_text),
        AggDef::Enum(def) => enum_instance(cx, def, agg, &stem_text),
    };
    restore(cx, saved);
    cx.in_progress.pop();
    result?;
    Ok(value)
}

enum AggDef {
    Struct(ast::StructDef),
    Enum(ast::EnumDef),
}

/// Saved ambient state around an instantiation.
struct Ambient {
    env: Bindings,
    suffix: String,
    generic_params: Vec<Name>,
    scope: Scope,
    cur_module: ModuleId,
}

fn enter(cx: &mut Cx, template: &Template, env: Bindings, suffix: String) -> Ambient {
    let mut generic_params = template.implicit.clone();
    generic_params.extend_from_slice(&template.explicit);
    let mut saved = Ambient {
        env,
        suffix,
        generic_params,
        scope: Scope::new(),
        cur_module: template.module,
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

fn frames_of(cx: &Cx, tid: TemplateId) -> usize {
    cx.in_progress.iter().filter(|t| **t == tid).count()
}

fn check_arity(template: &Template, fillers: &[Type]) {
    if fillers.len() != template.explicit.len() {
        ice!(
            "`{}` takes {} type arguments, got {}",
            template.base_symbol,
            template.explicit.len(),
            fillers.len()
        );
    }
}

/// Build the instance environment: enclosing parameters rebound from
/// the demand site's environment, own parameters bound to the fillers.
/// Nothing else leaks in from the demand site.
fn instance_env(cx: &Cx, template: &Template, fillers: &[Type]) -> Bindings {
    let mut env = Bindings::new();
    for p in &template.implicit {
        match cx.env.lookup(*p) {
            Some(ty) => env.bind(*p, ty.clone()),
            None => ice!(
                "type parameter `{}` is unbound at this instantiation",
                cx.interner.lookup(*p)
            ),
        }
    }
    for (p, ty) in template.explicit.iter().zip(fillers) {
        env.bind(*p, ty.clone());
    }
    env
}

/// Resolve the signature under the instance environment and lower the
/// body unless this stem is already cached. Runs with the ambient state
/// already swapped to the instance's.
fn fn_instance(
    cx: &mut Cx,
    tid: TemplateId,
    template: &Template,
    func_id: FuncId,
    symbol: &str,
    stem: Name,
) -> Result<FunType> {
    let ast = cx.ast();
    let func = *ast.arena.func(func_id);

    let param_defs: Vec<ast::Param> = ast.arena.param_list(func.params).to_vec();
    let mut params = Vec::with_capacity(param_defs.len());
    for p in &param_defs {
        params.push(types::resolve(cx, p.ty)?);
    }
    let ret = types::resolve_ret(cx, func.ret)?;
    let fun = FunType::new(params, ret);

    if cx.instances.contains(&(tid, stem)) {
        return Ok(fun);
    }
    if frames_of(cx, tid) >= GENERIC_RECURSION_LIMIT {
        return Err(Error::GenericRecursion {
            name: symbol.to_string(),
            limit: GENERIC_RECURSION_LIMIT,
        });
    }
    cx.instances.insert((tid, stem));
    cx.in_progress.push(tid);
    debug!(symbol, "lowering function instance");
    // Let the body refer to its own declaration, for recursion.
    cx.scope.bind(func.name, crate::names::Binding::Template(tid));
    let lowered = func::lower_fn(cx, &func, symbol, &fun, &template.captures, None);
    cx.in_progress.pop();
    lowered?;
    Ok(fun)
}

fn struct_instance(cx: &mut Cx, def: ast::StructDef, agg: AggRef, stem_text: &str) -> Result<()> {
    let ast = cx.ast();

    let field_defs: Vec<ast::FieldDef> = ast.arena.field_list(def.fields).to_vec();
    let mut fields = Vec::with_capacity(field_defs.len());
    for f in &field_defs {
        fields.push((f.name, types::resolve(cx, f.ty)?));
    }
    let encs: Vec<String> = fields
        .iter()
        .map(|(_, ty)| ty.encode(cx.interner))
        .collect();

    let method_ids: Vec<FuncId> = ast.arena.func_list(def.methods).to_vec();
    let methods = method_signatures(cx, &method_ids, stem_text)?;

    cx.registry
        .register_struct(agg.stem, fields, methods.clone(), cx.interner);

    if encs.is_empty() {
        cx.hoist(&format!("%{stem_text} = type {{}}"));
    } else {
        cx.hoist(&format!("%{stem_text} = type {{ {} }}", encs.join(", ")));
    }

    let recv = Type::Ptr(Box::new(Type::Struct(agg)));
    lower_method_bodies(cx, &method_ids, &methods, &recv)
}

fn enum_instance(cx: &mut Cx, def: ast::EnumDef, agg: AggRef, stem_text: &str) -> Result<()> {
    let ast = cx.ast();

    let variant_defs: Vec<ast::VariantDef> = ast.arena.variant_list(def.variants).to_vec();
    let mut plain = Vec::new();
    let mut typed = Vec::new();
    for v in &variant_defs {
        if v.payload == TypeExprId::INVALID {
            plain.push(v.name);
        } else {
            typed.push((v.name, types::resolve(cx, v.payload)?));
        }
    }

    let method_ids: Vec<FuncId> = ast.arena.func_list(def.methods).to_vec();
    let methods = method_signatures(cx, &method_ids, stem_text)?;

    cx.registry
        .register_enum(agg.stem, plain, typed, methods.clone(), cx.interner);

    let (tag, payload) = match cx.registry.enum_inst(agg.stem) {
        Some(inst) => (inst.tag_ir(), inst.payload_size),
        None => ice!("enum `{stem_text}` not registered"),
    };
    cx.hoist(&format!(
        "%{stem_text} = type <{{ {tag}, [{payload} x i8] }}>"
    ));

    let recv = Type::Ptr(Box::new(Type::Enum(agg)));
    lower_method_bodies(cx, &method_ids, &methods, &recv)
}

/// Resolve method signatures against the instance environment. Methods
/// never list the receiver and cannot declare their own parameters.
fn method_signatures(
    cx: &mut Cx,
    method_ids: &[FuncId],
    stem_text: &str,
) -> Result<Vec<(Name, MethodInfo)>> {
    let ast = cx.ast();
    let mut methods = Vec::with_capacity(method_ids.len());
    for &mid in method_ids {
        let m = *ast.arena.func(mid);
        if !ast.arena.name_list(m.generics).is_empty() {
            ice!(
                "method `{}` cannot declare type parameters",
                cx.interner.lookup(m.name)
            );
        }
        let param_defs: Vec<ast::Param> = ast.arena.param_list(m.params).to_vec();
        let mut params = Vec::with_capacity(param_defs.len());
        for p in &param_defs {
            params.push(types::resolve(cx, p.ty)?);
        }
        let ret = types::resolve_ret(cx, m.ret)?;
        methods.push((
            m.name,
            MethodInfo {
                symbol: mangle::method_symbol(stem_text, cx.interner.lookup(m.name)),
                fun: FunType::new(params, ret),
            },
        ));
    }
    Ok(methods)
}

fn lower_method_bodies(
    cx: &mut Cx,
    method_ids: &[FuncId],
    methods: &[(Name, MethodInfo)],
    recv: &Type,
) -> Result<()> {
    let ast = cx.ast();
    for (&mid, (_, info)) in method_ids.iter().zip(methods) {
        let m = *ast.arena.func(mid);
        func::lower_fn(cx, &m, &info.symbol, &info.fun, &[], Some(recv.clone()))?;
    }
    Ok(())
}
