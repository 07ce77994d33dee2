//! Core type definitions.
//!
//! The closed `Type` sum every other component dispatches on. Types are
//! immutable values; equality is structural, and two values are equal iff
//! they denote the same concrete, generic-free type.

use skarn_ir::{ice, Name, StringInterner};

/// Stable identifier of an aggregate definition (the source struct or
/// enum, before any instantiation).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct DefId(u32);

impl DefId {
    /// Create from a raw registry index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        DefId(index)
    }

    /// Index into the registry's definition table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a generated module, assigned in first-visit order by the
/// orchestrator.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct ModuleId(u32);

impl ModuleId {
    /// Create from a raw module index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        ModuleId(index)
    }

    /// Index into the context's module table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Reference to one concrete aggregate instantiation.
///
/// `stem` is the interned instantiated symbol stem (the qualified name
/// with its instantiation suffix, e.g. `app$Pair$Gint_str`); it names the
/// emitted IR type `%<stem>` and keys the registry entry. Two references
/// are equal iff they denote the same instantiation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct AggRef {
    pub def: DefId,
    pub stem: Name,
}

/// Calling convention of a function type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Abi {
    /// Backend-emitted: hidden `i8* %__env` first parameter.
    Env,
    /// External C declaration: no hidden parameter.
    C,
}

/// Function type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct FunType {
    pub params: Vec<Type>,
    pub ret: Type,
    /// Declared type parameters; empty once concrete.
    pub generics: Vec<Name>,
    pub abi: Abi,
}

impl FunType {
    /// A concrete backend function type.
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        FunType {
            params,
            ret,
            generics: Vec::new(),
            abi: Abi::Env,
        }
    }

    /// Whether the type still has unbound declared parameters.
    pub fn is_generic(&self) -> bool {
        !self.generics.is_empty()
    }

    /// The raw code-pointer encoding: `<ret> (i8*, <params>)*` for the
    /// backend convention, `<ret> (<params>)*` for external C.
    pub fn code_ptr(&self, interner: &StringInterner) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.params.len() + 1);
        if self.abi == Abi::Env {
            parts.push("i8*".to_string());
        }
        for p in &self.params {
            parts.push(p.encode(interner));
        }
        format!("{} ({})*", self.ret.encode(interner), parts.join(", "))
    }

    /// The callable-pair encoding: `{ <code-pointer>, i8* }`.
    pub fn pair(&self, interner: &StringInterner) -> String {
        format!("{{ {}, i8* }}", self.code_ptr(interner))
    }

    /// Mangled token: `f<params..>r<ret>` with parameter tokens joined
    /// by `_`.
    pub fn mangled(&self, interner: &StringInterner) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.mangled(interner)).collect();
        format!("f{}r{}", params.join("_"), self.ret.mangled(interner))
    }
}

/// One member of a bounded overload set: the emitted symbol and its
/// concrete function type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct MixMember {
    pub symbol: Name,
    pub fun: FunType,
}

/// Concrete type representation.
///
/// Closed sum: lowering dispatches with exhaustive matches, so adding a
/// variant is a compile error at every dispatch site until handled.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Type {
    // ===== Primitives =====
    /// No value. Legal as a return type only.
    Void,
    /// One-bit boolean.
    Bool,
    /// One-byte character.
    Char,
    /// Two-byte integer.
    Short,
    /// Eight-byte integer.
    Int,
    /// Fat string: `{ i64 length, i8* bytes }`.
    Str,

    // ===== Compound =====
    /// Pointer to an element type.
    Ptr(Box<Type>),
    /// Fixed-length array.
    Array(Box<Type>, u32),
    /// Callable pair (code pointer plus opaque environment).
    Fun(Box<FunType>),

    // ===== Aggregates =====
    /// A struct instantiation's value type.
    Struct(AggRef),
    /// An enum instantiation's value type.
    Enum(AggRef),
    /// The struct type itself, as appears at a constructor site.
    StructKind(AggRef),
    /// The enum type itself, as appears at a case-constructor site.
    EnumKind(AggRef),

    // ===== Compile-time only =====
    /// An imported module reference.
    Module(ModuleId),
    /// A bounded overload set, resolved per call site at compile time.
    Mix(Vec<MixMember>),
    /// A declared type parameter awaiting substitution.
    Var(Name),
}

impl Type {
    /// Check if this is the void type.
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// Check whether any unresolved type parameter occurs in this type.
    pub fn has_var(&self) -> bool {
        match self {
            Type::Void | Type::Bool | Type::Char | Type::Short | Type::Int | Type::Str => false,
            Type::Ptr(inner) => inner.has_var(),
            Type::Array(elem, _) => elem.has_var(),
            Type::Fun(fun) => fun.params.iter().any(Type::has_var) || fun.ret.has_var(),
            Type::Struct(_) | Type::Enum(_) | Type::StructKind(_) | Type::EnumKind(_) => false,
            Type::Module(_) => false,
            Type::Mix(members) => members
                .iter()
                .any(|m| m.fun.params.iter().any(Type::has_var) || m.fun.ret.has_var()),
            Type::Var(_) => true,
        }
    }

    /// Canonical textual encoding, used directly as the IR type
    /// annotation.
    ///
    /// # Panics
    /// Aborts on types with no storage: an unresolved parameter, a kind,
    /// a module reference, or an overload set. The checking pass never
    /// lets a value of those reach an encoding site.
    pub fn encode(&self, interner: &StringInterner) -> String {
        match self {
            Type::Void => "void".to_string(),
            Type::Bool => "i1".to_string(),
            Type::Char => "i8".to_string(),
            Type::Short => "i16".to_string(),
            Type::Int => "i64".to_string(),
            Type::Str => "%str".to_string(),
            Type::Ptr(inner) => format!("{}*", inner.encode(interner)),
            Type::Array(elem, len) => format!("[{} x {}]", len, elem.encode(interner)),
            Type::Fun(fun) => fun.pair(interner),
            Type::Struct(agg) | Type::Enum(agg) => format!("%{}", interner.lookup(agg.stem)),
            Type::StructKind(agg) | Type::EnumKind(agg) => {
                ice!("kind `{}` has no storage encoding", interner.lookup(agg.stem))
            }
            Type::Module(id) => ice!("module reference {id:?} has no storage encoding"),
            Type::Mix(_) => ice!("overload set has no storage encoding"),
            Type::Var(name) => {
                ice!("unresolved type parameter `{}`", interner.lookup(*name))
            }
        }
    }

    /// Mangled token for monomorphized symbol names: the sanitized form
    /// of the encoding. An unresolved parameter mangles to its source
    /// name, which is what makes instantiation suffixes textually
    /// substitutable.
    ///
    /// # Panics
    /// Aborts on kinds, module references, and overload sets, which never
    /// appear inside an instantiation filler.
    pub fn mangled(&self, interner: &StringInterner) -> String {
        match self {
            Type::Void => "void".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Char => "char".to_string(),
            Type::Short => "short".to_string(),
            Type::Int => "int".to_string(),
            Type::Str => "str".to_string(),
            Type::Ptr(inner) => format!("p{}", inner.mangled(interner)),
            Type::Array(elem, len) => format!("a{}x{}", len, elem.mangled(interner)),
            Type::Fun(fun) => fun.mangled(interner),
            Type::Struct(agg) | Type::Enum(agg) => interner.lookup(agg.stem).to_string(),
            Type::StructKind(agg) | Type::EnumKind(agg) => {
                ice!("kind `{}` cannot appear in a filler", interner.lookup(agg.stem))
            }
            Type::Module(id) => ice!("module reference {id:?} cannot appear in a filler"),
            Type::Mix(_) => ice!("overload set cannot appear in a filler"),
            Type::Var(name) => interner.lookup(*name).to_string(),
        }
    }

    /// Format for log and error messages. Total: never aborts.
    pub fn display(&self, interner: &StringInterner) -> String {
        match self {
            Type::Void => "void".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Char => "char".to_string(),
            Type::Short => "short".to_string(),
            Type::Int => "int".to_string(),
            Type::Str => "str".to_string(),
            Type::Ptr(inner) => format!("*{}", inner.display(interner)),
            Type::Array(elem, len) => format!("[{}]{}", len, elem.display(interner)),
            Type::Fun(fun) => {
                let params: Vec<String> =
                    fun.params.iter().map(|p| p.display(interner)).collect();
                if fun.ret.is_void() {
                    format!("fun({})", params.join(", "))
                } else {
                    format!("fun({}) -> {}", params.join(", "), fun.ret.display(interner))
                }
            }
            Type::Struct(agg) | Type::Enum(agg) => interner.lookup(agg.stem).to_string(),
            Type::StructKind(agg) | Type::EnumKind(agg) => {
                format!("type {}", interner.lookup(agg.stem))
            }
            Type::Module(_) => "module".to_string(),
            Type::Mix(members) => format!("mix({} members)", members.len()),
            Type::Var(name) => interner.lookup(*name).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn primitive_encodings() {
        let interner = StringInterner::new();

        assert_eq!(Type::Void.encode(&interner), "void");
        assert_eq!(Type::Bool.encode(&interner), "i1");
        assert_eq!(Type::Char.encode(&interner), "i8");
        assert_eq!(Type::Short.encode(&interner), "i16");
        assert_eq!(Type::Int.encode(&interner), "i64");
        assert_eq!(Type::Str.encode(&interner), "%str");
    }

    #[test]
    fn pointer_and_array_encodings() {
        let interner = StringInterner::new();

        assert_eq!(Type::Ptr(Box::new(Type::Int)).encode(&interner), "i64*");
        assert_eq!(
            Type::Ptr(Box::new(Type::Ptr(Box::new(Type::Str)))).encode(&interner),
            "%str**"
        );
        assert_eq!(
            Type::Array(Box::new(Type::Char), 16).encode(&interner),
            "[16 x i8]"
        );
    }

    #[test]
    fn function_pair_encoding() {
        let interner = StringInterner::new();

        let fun = FunType::new(vec![Type::Int, Type::Bool], Type::Str);
        assert_eq!(fun.code_ptr(&interner), "%str (i8*, i64, i1)*");
        assert_eq!(
            Type::Fun(Box::new(fun)).encode(&interner),
            "{ %str (i8*, i64, i1)*, i8* }"
        );
    }

    #[test]
    fn c_abi_has_no_hidden_parameter() {
        let interner = StringInterner::new();

        let mut fun = FunType::new(vec![Type::Int], Type::Void);
        fun.abi = Abi::C;
        assert_eq!(fun.code_ptr(&interner), "void (i64)*");
    }

    #[test]
    fn mangled_tokens() {
        let interner = StringInterner::new();

        assert_eq!(Type::Int.mangled(&interner), "int");
        assert_eq!(Type::Ptr(Box::new(Type::Int)).mangled(&interner), "pint");
        assert_eq!(
            Type::Array(Box::new(Type::Short), 4).mangled(&interner),
            "a4xshort"
        );
        let fun = FunType::new(vec![Type::Int, Type::Str], Type::Bool);
        assert_eq!(Type::Fun(Box::new(fun)).mangled(&interner), "fint_strrbool");
    }

    #[test]
    fn var_mangles_to_its_source_name() {
        let interner = StringInterner::new();
        let t = interner.intern("T");

        assert_eq!(Type::Var(t).mangled(&interner), "T");
    }

    #[test]
    fn structural_equality() {
        let a = Type::Ptr(Box::new(Type::Int));
        let b = Type::Ptr(Box::new(Type::Int));
        let c = Type::Ptr(Box::new(Type::Bool));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn has_var_sees_through_compounds() {
        let interner = StringInterner::new();
        let t = interner.intern("T");

        assert!(!Type::Int.has_var());
        assert!(Type::Ptr(Box::new(Type::Var(t))).has_var());
        let fun = FunType::new(vec![Type::Int], Type::Var(t));
        assert!(Type::Fun(Box::new(fun)).has_var());
    }

    #[test]
    #[should_panic(expected = "internal compiler error")]
    fn encoding_a_var_aborts() {
        let interner = StringInterner::new();
        let t = interner.intern("T");

        let _ = Type::Var(t).encode(&interner);
    }

    #[test]
    #[should_panic(expected = "internal compiler error")]
    fn encoding_a_mix_aborts() {
        let interner = StringInterner::new();

        let _ = Type::Mix(Vec::new()).encode(&interner);
    }
}
