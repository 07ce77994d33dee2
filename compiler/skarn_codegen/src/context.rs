//! Lowering context and output buffers.
//!
//! `Cx` carries everything the walk needs: the interner and loader, the
//! aggregate registry, per-module state, the template table with its
//! instance cache, the active type environment, and the output buffers.
//! Functions under construction form a stack, so lowering one function
//! can demand another (an instantiation, a thunk) without disturbing
//! the text already emitted.

use rustc_hash::{FxHashMap, FxHashSet};
use skarn_ir::{ast, ice, ExprId, Name, StringInterner};
use skarn_types::{size_of, Bindings, ModuleId, Type, TypeRegistry};
use std::rc::Rc;

use crate::generics::{Template, TemplateId};
use crate::names::{Binding, Scope};
use crate::ModuleLoader;

/// A typed value: the lowered type plus the textual operand holding it
/// (a register, a literal, or a constant expression).
#[derive(Clone, Debug)]
pub struct Value {
    pub ty: Type,
    pub repr: String,
}

impl Value {
    pub fn new(ty: Type, repr: impl Into<String>) -> Self {
        Value {
            ty,
            repr: repr.into(),
        }
    }

    /// The absent value, produced by void calls.
    pub fn void() -> Self {
        Value {
            ty: Type::Void,
            repr: String::new(),
        }
    }
}

/// One function body under construction.
struct FnBuf {
    /// Emitted symbol, used to derive nested-function symbols.
    symbol: String,
    /// Accumulated body text.
    text: String,
    /// Next temporary number.
    temp: u32,
    /// Next structured-control label number.
    label: u32,
    /// Whether the current block already ended with a terminator.
    terminated: bool,
}

/// Output buffers.
struct Out {
    /// Type definitions, string constants, declares, globals, and any
    /// function finished while another was still open.
    hoisted: String,
    /// Functions finished with the stack otherwise empty, in completion
    /// order.
    main: String,
    /// Stack of open functions.
    fns: Vec<FnBuf>,
}

/// One step of a module initializer, recorded in item order.
#[derive(Clone)]
pub enum InitStep {
    /// Run an imported module's initializer.
    Import(ModuleId),
    /// Evaluate a module variable's initializer and store it.
    Var {
        global: String,
        ty: Type,
        value: ExprId,
    },
}

/// Per-module state.
pub struct ModuleState {
    /// Loader path, interned.
    pub path: Name,
    /// Symbol stem derived from the path.
    pub stem: String,
    /// Module-level bindings.
    pub globals: Scope,
    /// Initializer function symbol.
    pub init_symbol: String,
    /// The module's AST.
    pub ast: Rc<ast::Module>,
    /// Initializer steps, in declaration order.
    pub init_steps: Vec<InitStep>,
}

/// The lowering context.
pub struct Cx<'a> {
    /// Shared name interner.
    pub interner: &'a StringInterner,
    /// Module source supplier.
    pub loader: &'a dyn ModuleLoader,
    /// Aggregate instantiations.
    pub registry: TypeRegistry,

    /// Generated modules, in first-visit order.
    pub modules: Vec<ModuleState>,
    /// Loader path to module id.
    pub module_ids: FxHashMap<Name, ModuleId>,

    /// Registered declarations.
    pub templates: Vec<Template>,
    /// Lowered instances, keyed by template and instantiated stem.
    pub instances: FxHashSet<(TemplateId, Name)>,
    /// Instantiation frames currently on the lowering stack.
    pub in_progress: Vec<TemplateId>,

    /// Active type environment.
    pub env: Bindings,
    /// Active instantiation suffix; empty outside generic code.
    pub suffix: String,
    /// Type parameters visible to declarations made in this scope.
    pub generic_params: Vec<Name>,
    /// The current function's locals.
    pub scope: Scope,
    /// Module whose code is being generated.
    pub cur_module: ModuleId,

    /// Emitted string constants, by content.
    strings: FxHashMap<Name, u32>,
    /// Emitted partial-application forwarders, by function token and
    /// bound-argument count.
    thunks: FxHashMap<(String, usize), String>,

    out: Out,
}

impl<'a> Cx<'a> {
    pub fn new(interner: &'a StringInterner, loader: &'a dyn ModuleLoader) -> Self {
        Cx {
            interner,
            loader,
            registry: TypeRegistry::new(),
            modules: Vec::new(),
            module_ids: FxHashMap::default(),
            templates: Vec::new(),
            instances: FxHashSet::default(),
            in_progress: Vec::new(),
            env: Bindings::new(),
            suffix: String::new(),
            generic_params: Vec::new(),
            scope: Scope::new(),
            cur_module: ModuleId::new(0),
            strings: FxHashMap::default(),
            thunks: FxHashMap::default(),
            out: Out {
                hoisted: String::with_capacity(4096),
                main: String::with_capacity(4096),
                fns: Vec::new(),
            },
        }
    }

    /// The current module's AST.
    pub fn ast(&self) -> Rc<ast::Module> {
        Rc::clone(&self.modules[self.cur_module.index()].ast)
    }

    /// Resolve a name: current locals first, then the current module's
    /// globals.
    pub fn lookup_name(&self, name: Name) -> Option<Binding> {
        if let Some(binding) = self.scope.lookup(name) {
            return Some(binding.clone());
        }
        self.modules[self.cur_module.index()]
            .globals
            .lookup(name)
            .cloned()
    }

    // ===== Function buffers =====

    /// Open a new function body on the stack.
    pub fn push_fn(&mut self, symbol: &str) {
        self.out.fns.push(FnBuf {
            symbol: symbol.to_string(),
            text: String::with_capacity(256),
            temp: 0,
            label: 0,
            terminated: false,
        });
    }

    /// Close the topmost function: render it under `header` and route it
    /// to the main buffer, or to the hoisted buffer when another
    /// function is still open underneath.
    pub fn finish_fn(&mut self, header: &str) {
        let Some(buf) = self.out.fns.pop() else {
            ice!("no open function to finish");
        };
        let mut rendered = String::with_capacity(header.len() + buf.text.len() + 8);
        rendered.push_str(header);
        rendered.push_str(" {\n");
        rendered.push_str(&buf.text);
        rendered.push_str("}\n\n");
        if self.out.fns.is_empty() {
            self.out.main.push_str(&rendered);
        } else {
            self.out.hoisted.push_str(&rendered);
        }
    }

    /// Symbol of the function currently being lowered.
    pub fn cur_symbol(&self) -> &str {
        match self.out.fns.last() {
            Some(buf) => &buf.symbol,
            None => ice!("no open function"),
        }
    }

    fn fn_buf(&mut self) -> &mut FnBuf {
        match self.out.fns.last_mut() {
            Some(buf) => buf,
            None => ice!("emission outside any open function"),
        }
    }

    /// Append one indented instruction line to the open function.
    pub fn line(&mut self, s: &str) {
        let buf = self.fn_buf();
        buf.text.push_str("  ");
        buf.text.push_str(s);
        buf.text.push('\n');
    }

    /// Append a terminator and mark the current block closed.
    pub fn term(&mut self, s: &str) {
        self.line(s);
        self.fn_buf().terminated = true;
    }

    /// Start a named block. A fresh block is never terminated.
    pub fn label_line(&mut self, label: &str) {
        let buf = self.fn_buf();
        buf.text.push_str(label);
        buf.text.push_str(":\n");
        buf.terminated = false;
    }

    /// Whether the current block already ended with a terminator.
    pub fn terminated(&self) -> bool {
        self.out.fns.last().is_some_and(|buf| buf.terminated)
    }

    fn bump_temp(&mut self) -> u32 {
        let buf = self.fn_buf();
        let n = buf.temp;
        buf.temp += 1;
        n
    }

    /// A fresh temporary register. The dot keeps generated registers
    /// disjoint from source-named parameters.
    pub fn fresh_temp(&mut self) -> String {
        let n = self.bump_temp();
        format!("%t.{n}")
    }

    /// A fresh number for a structured-control label family.
    pub fn fresh_label(&mut self) -> u32 {
        let buf = self.fn_buf();
        let n = buf.label;
        buf.label += 1;
        n
    }

    /// Allocate a collector-backed slot for `name` and return its typed
    /// pointer register.
    pub fn alloc_slot(&mut self, name: Name, ty: &Type) -> String {
        let enc = ty.encode(self.interner);
        let size = size_of(ty, &self.registry, self.interner);
        let raw = self.fresh_temp();
        self.line(&format!("{raw} = call i8* @GC_malloc(i64 {size})"));
        let n = self.bump_temp();
        let slot = format!("%{}.addr.{}", self.interner.lookup(name), n);
        self.line(&format!("{slot} = bitcast i8* {raw} to {enc}*"));
        slot
    }

    // ===== Hoisted output =====

    /// Append one line to the hoisted section.
    pub fn hoist(&mut self, s: &str) {
        self.out.hoisted.push_str(s);
        self.out.hoisted.push('\n');
    }

    /// The string-literal constant for `content`, emitting it on first
    /// use. Identical contents share one constant.
    pub fn str_const(&mut self, content: Name) -> Value {
        let text = self.interner.lookup(content);
        let len = text.len();
        let array = len + 1;
        let label = if let Some(&l) = self.strings.get(&content) {
            l
        } else {
            let l = self.strings.len() as u32;
            self.strings.insert(content, l);
            self.hoist(&format!(
                "@.str.{l} = private unnamed_addr constant [{array} x i8] c\"{}\"",
                escape_bytes(text)
            ));
            l
        };
        Value::new(
            Type::Str,
            format!(
                "{{ i64 {len}, i8* getelementptr inbounds ([{array} x i8], \
                 [{array} x i8]* @.str.{label}, i64 0, i64 0) }}"
            ),
        )
    }

    // ===== Thunk cache =====

    /// Look up an already-emitted partial-application forwarder.
    pub fn cached_thunk(&self, token: &str, bound: usize) -> Option<String> {
        self.thunks.get(&(token.to_string(), bound)).cloned()
    }

    /// Record an emitted forwarder under its token and bound count.
    pub fn cache_thunk(&mut self, token: String, bound: usize, symbol: String) {
        self.thunks.insert((token, bound), symbol);
    }

    /// Assemble the final module text.
    pub fn output(self) -> String {
        let mut text = self.out.hoisted;
        text.push('\n');
        text.push_str(&self.out.main);
        text
    }
}

/// Escape string-literal bytes for a `c"..."` constant, appending the
/// trailing NUL.
fn escape_bytes(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 3);
    for b in s.bytes() {
        if (0x20..=0x7e).contains(&b) && b != b'"' && b != b'\\' {
            out.push(b as char);
        } else {
            out.push('\\');
            out.push_str(&format!("{b:02X}"));
        }
    }
    out.push_str("\\00");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct NoLoader;

    impl ModuleLoader for NoLoader {
        fn load(&self, _path: &str) -> Option<Rc<ast::Module>> {
            None
        }
    }

    #[test]
    fn temps_and_labels_count_per_function() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut cx = Cx::new(&interner, &loader);

        cx.push_fn("outer");
        assert_eq!(cx.fresh_temp(), "%t.0");
        assert_eq!(cx.fresh_temp(), "%t.1");
        assert_eq!(cx.fresh_label(), 0);

        cx.push_fn("inner");
        assert_eq!(cx.fresh_temp(), "%t.0");
        cx.finish_fn("define internal void @inner(i8* %__env)");

        assert_eq!(cx.fresh_temp(), "%t.2");
        cx.finish_fn("define internal void @outer(i8* %__env)");
    }

    #[test]
    fn inner_functions_hoist_outer_functions_do_not() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut cx = Cx::new(&interner, &loader);

        cx.push_fn("outer");
        cx.push_fn("inner");
        cx.term("ret void");
        cx.finish_fn("define internal void @inner(i8* %__env)");
        cx.term("ret void");
        cx.finish_fn("define internal void @outer(i8* %__env)");

        let text = cx.output();
        let inner_at = text.find("@inner").unwrap_or(usize::MAX);
        let outer_at = text.find("@outer").unwrap_or(usize::MAX);
        assert!(inner_at < outer_at, "hoisted functions come first");
    }

    #[test]
    fn string_constants_are_shared_by_content() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut cx = Cx::new(&interner, &loader);

        let hello = interner.intern("hi");
        let first = cx.str_const(hello);
        let second = cx.str_const(hello);
        assert_eq!(first.repr, second.repr);

        let text = cx.output();
        assert!(text.contains("@.str.0"));
        assert!(!text.contains("@.str.1"));
    }

    #[test]
    fn string_constant_shape() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut cx = Cx::new(&interner, &loader);

        let hi = interner.intern("hi");
        let v = cx.str_const(hi);
        assert_eq!(
            v.repr,
            "{ i64 2, i8* getelementptr inbounds ([3 x i8], [3 x i8]* @.str.0, i64 0, i64 0) }"
        );
        assert!(cx
            .output()
            .contains("@.str.0 = private unnamed_addr constant [3 x i8] c\"hi\\00\""));
    }

    #[test]
    fn escapes_quotes_backslashes_and_control_bytes() {
        assert_eq!(escape_bytes("a\"b"), "a\\22b\\00");
        assert_eq!(escape_bytes("a\\b"), "a\\5Cb\\00");
        assert_eq!(escape_bytes("a\nb"), "a\\0Ab\\00");
        assert_eq!(escape_bytes(""), "\\00");
    }

    #[test]
    fn terminator_tracking() {
        let interner = StringInterner::new();
        let loader = NoLoader;
        let mut cx = Cx::new(&interner, &loader);

        cx.push_fn("f");
        assert!(!cx.terminated());
        cx.term("ret void");
        assert!(cx.terminated());
        cx.label_line("dead.0");
        assert!(!cx.terminated());
        cx.finish_fn("define internal void @f(i8* %__env)");
    }
}
