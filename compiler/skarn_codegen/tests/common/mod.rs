//! Shared fixtures: an in-memory module loader and a builder that
//! assembles flat module ASTs without a parser.

#![allow(dead_code)]

use rustc_hash::FxHashMap;
use skarn_codegen::{compile_program, Error, ModuleLoader};
use skarn_ir::{ast, Arena, ExprId, FuncId, Name, StmtId, StmtRange, StringInterner, TypeExprId};
use std::rc::Rc;
use std::sync::Once;

static LOG: Once = Once::new();

/// Honor `RUST_LOG` when a test needs the lowering trace.
fn init_logging() {
    LOG.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Module supplier backed by a path map.
pub struct SourceSet {
    modules: FxHashMap<String, Rc<ast::Module>>,
}

impl SourceSet {
    pub fn new() -> Self {
        SourceSet {
            modules: FxHashMap::default(),
        }
    }

    pub fn add(&mut self, path: &str, module: ast::Module) {
        self.modules.insert(path.to_string(), Rc::new(module));
    }
}

impl ModuleLoader for SourceSet {
    fn load(&self, path: &str) -> Option<Rc<ast::Module>> {
        self.modules.get(path).cloned()
    }
}

pub fn compile(interner: &StringInterner, sources: &SourceSet, root: &str) -> String {
    init_logging();
    match compile_program(interner, sources, root) {
        Ok(text) => text,
        Err(e) => panic!("compilation failed: {e}"),
    }
}

pub fn compile_err(interner: &StringInterner, sources: &SourceSet, root: &str) -> Error {
    init_logging();
    match compile_program(interner, sources, root) {
        Ok(_) => panic!("compilation unexpectedly succeeded"),
        Err(e) => e,
    }
}

/// Assembles one module: expressions and statements go through the
/// arena, declarations collect as items.
pub struct ModuleBuilder<'a> {
    interner: &'a StringInterner,
    pub arena: Arena,
    items: Vec<ast::Item>,
}

impl<'a> ModuleBuilder<'a> {
    pub fn new(interner: &'a StringInterner) -> Self {
        ModuleBuilder {
            interner,
            arena: Arena::new(),
            items: Vec::new(),
        }
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub fn build(self) -> ast::Module {
        ast::Module {
            items: self.items,
            arena: self.arena,
        }
    }

    // ===== Type annotations =====

    pub fn ty(&mut self, name: &str) -> TypeExprId {
        let n = self.name(name);
        self.arena.alloc_type_expr(ast::TypeExpr::Named(n))
    }

    pub fn ptr_ty(&mut self, elem: TypeExprId) -> TypeExprId {
        self.arena.alloc_type_expr(ast::TypeExpr::Ptr(elem))
    }

    // ===== Expressions =====

    pub fn int(&mut self, v: i64) -> ExprId {
        self.arena.alloc_expr(ast::ExprKind::Int(v))
    }

    pub fn boolean(&mut self, v: bool) -> ExprId {
        self.arena.alloc_expr(ast::ExprKind::Bool(v))
    }

    pub fn str_lit(&mut self, text: &str) -> ExprId {
        let content = self.name(text);
        self.arena.alloc_expr(ast::ExprKind::Str(content))
    }

    pub fn ident(&mut self, name: &str) -> ExprId {
        let n = self.name(name);
        self.arena.alloc_expr(ast::ExprKind::Ident(n))
    }

    pub fn field(&mut self, base: ExprId, name: &str) -> ExprId {
        let n = self.name(name);
        self.arena.alloc_expr(ast::ExprKind::Field { base, name: n })
    }

    pub fn call(&mut self, callee: ExprId, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let args = self.arena.alloc_expr_list(args);
        self.arena.alloc_expr(ast::ExprKind::Call { callee, args })
    }

    pub fn call_name(&mut self, name: &str, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let callee = self.ident(name);
        self.call(callee, args)
    }

    /// `name[fillers...]` in value or callee position.
    pub fn fill(&mut self, name: &str, tys: impl IntoIterator<Item = TypeExprId>) -> ExprId {
        let target = self.ident(name);
        let args = self.arena.alloc_type_expr_list(tys);
        self.arena.alloc_expr(ast::ExprKind::Fill { target, args })
    }

    pub fn bind(&mut self, callee: ExprId, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let args = self.arena.alloc_expr_list(args);
        self.arena.alloc_expr(ast::ExprKind::Bind { callee, args })
    }

    pub fn binary(&mut self, op: ast::BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.arena.alloc_expr(ast::ExprKind::Binary { op, lhs, rhs })
    }

    pub fn add(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.binary(ast::BinaryOp::Add, lhs, rhs)
    }

    // ===== Statements =====

    pub fn expr_stmt(&mut self, e: ExprId) -> StmtId {
        self.arena.alloc_stmt(ast::Stmt::Expr(e))
    }

    pub fn decl(&mut self, name: &str, ty: TypeExprId) -> StmtId {
        let n = self.name(name);
        self.arena.alloc_stmt(ast::Stmt::Decl { name: n, ty })
    }

    /// `init name ty = value`; pass `TypeExprId::INVALID` to infer from
    /// the value.
    pub fn init(&mut self, name: &str, ty: TypeExprId, value: ExprId) -> StmtId {
        let n = self.name(name);
        self.arena.alloc_stmt(ast::Stmt::Init { name: n, ty, value })
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> StmtId {
        self.arena.alloc_stmt(ast::Stmt::Assign { target, value })
    }

    pub fn ret(&mut self, e: ExprId) -> StmtId {
        self.arena.alloc_stmt(ast::Stmt::Return(e))
    }

    pub fn ret_void(&mut self) -> StmtId {
        self.arena.alloc_stmt(ast::Stmt::Return(ExprId::INVALID))
    }

    pub fn nested(&mut self, fid: FuncId) -> StmtId {
        self.arena.alloc_stmt(ast::Stmt::Func(fid))
    }

    pub fn body(&mut self, stmts: impl IntoIterator<Item = StmtId>) -> StmtRange {
        self.arena.alloc_stmt_list(stmts)
    }

    pub fn arm(&mut self, variant: &str, binding: Option<&str>, body: StmtRange) -> ast::MatchArm {
        ast::MatchArm {
            variant: self.name(variant),
            binding: binding.map_or(Name::EMPTY, |b| self.name(b)),
            body,
        }
    }

    pub fn match_stmt(
        &mut self,
        scrutinee: ExprId,
        arms: impl IntoIterator<Item = ast::MatchArm>,
        default_body: StmtRange,
        has_default: bool,
    ) -> StmtId {
        let arms = self.arena.alloc_arms(arms);
        self.arena.alloc_stmt(ast::Stmt::Match {
            scrutinee,
            arms,
            default_body,
            has_default,
        })
    }

    // ===== Declarations =====

    /// Allocate a function without declaring it as an item: methods and
    /// nested functions.
    pub fn func_decl(
        &mut self,
        name: &str,
        generics: &[&str],
        params: &[(&str, TypeExprId)],
        ret: TypeExprId,
        body: StmtRange,
    ) -> FuncId {
        let gnames: Vec<Name> = generics.iter().map(|g| self.name(g)).collect();
        let generics = self.arena.alloc_names(gnames);
        let pdefs: Vec<ast::Param> = params
            .iter()
            .map(|(n, t)| ast::Param {
                name: self.name(n),
                ty: *t,
            })
            .collect();
        let params = self.arena.alloc_params(pdefs);
        self.arena.alloc_func(ast::Func {
            name: self.name(name),
            generics,
            params,
            ret,
            body,
        })
    }

    pub fn function(
        &mut self,
        name: &str,
        generics: &[&str],
        params: &[(&str, TypeExprId)],
        ret: TypeExprId,
        body: StmtRange,
    ) -> FuncId {
        let fid = self.func_decl(name, generics, params, ret, body);
        self.items.push(ast::Item::Func(fid));
        fid
    }

    /// A `main` taking nothing, returning nothing.
    pub fn main_fn(&mut self, body: StmtRange) {
        self.function("main", &[], &[], TypeExprId::INVALID, body);
    }

    pub fn struct_item(
        &mut self,
        name: &str,
        generics: &[&str],
        fields: &[(&str, TypeExprId)],
        methods: &[FuncId],
    ) {
        let gnames: Vec<Name> = generics.iter().map(|g| self.name(g)).collect();
        let generics = self.arena.alloc_names(gnames);
        let fdefs: Vec<ast::FieldDef> = fields
            .iter()
            .map(|(n, t)| ast::FieldDef {
                name: self.name(n),
                ty: *t,
            })
            .collect();
        let fields = self.arena.alloc_fields(fdefs);
        let methods = self.arena.alloc_func_list(methods.iter().copied());
        self.items.push(ast::Item::Struct(ast::StructDef {
            name: self.name(name),
            generics,
            fields,
            methods,
        }));
    }

    /// Variants with `None` payloads are plain cases.
    pub fn enum_item(
        &mut self,
        name: &str,
        generics: &[&str],
        variants: &[(&str, Option<TypeExprId>)],
    ) {
        let gnames: Vec<Name> = generics.iter().map(|g| self.name(g)).collect();
        let generics = self.arena.alloc_names(gnames);
        let vdefs: Vec<ast::VariantDef> = variants
            .iter()
            .map(|(n, payload)| ast::VariantDef {
                name: self.name(n),
                payload: payload.unwrap_or(TypeExprId::INVALID),
            })
            .collect();
        let variants = self.arena.alloc_variants(vdefs);
        self.items.push(ast::Item::Enum(ast::EnumDef {
            name: self.name(name),
            generics,
            variants,
            methods: skarn_ir::FuncRange::EMPTY,
        }));
    }

    pub fn var_item(&mut self, name: &str, ty: TypeExprId, value: ExprId) {
        self.items.push(ast::Item::Var(ast::VarDef {
            name: self.name(name),
            ty,
            value,
        }));
    }

    pub fn const_item(&mut self, name: &str, value: ExprId) {
        self.items.push(ast::Item::Const(ast::ConstDef {
            name: self.name(name),
            value,
        }));
    }

    pub fn import(&mut self, path: &str, alias: &str) {
        self.items.push(ast::Item::Import(ast::ImportDef {
            path: self.name(path),
            alias: self.name(alias),
        }));
    }

    pub fn mix_item(&mut self, name: &str, members: &[&str]) {
        let mnames: Vec<Name> = members.iter().map(|m| self.name(m)).collect();
        let members = self.arena.alloc_names(mnames);
        self.items.push(ast::Item::Mix(ast::MixDef {
            name: self.name(name),
            members,
        }));
    }

    pub fn extern_item(&mut self, name: &str, params: &[TypeExprId], ret: TypeExprId) {
        let params = self.arena.alloc_type_expr_list(params.iter().copied());
        self.items.push(ast::Item::Extern(ast::ExternDef {
            name: self.name(name),
            params,
            ret,
        }));
    }

    pub fn alias_item(&mut self, name: &str, ty: TypeExprId) {
        self.items.push(ast::Item::Alias(ast::AliasDef {
            name: self.name(name),
            ty,
        }));
    }
}
