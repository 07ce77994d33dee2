//! Top-level items.

use crate::{
    ExprId, FieldRange, FuncId, FuncRange, Name, NameRange, ParamRange, StmtRange, TypeExprId,
    TypeExprRange, VariantRange,
};

/// A top-level item of a module, in source order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Item {
    Func(FuncId),
    Struct(StructDef),
    Enum(EnumDef),
    Var(VarDef),
    Const(ConstDef),
    Import(ImportDef),
    Mix(MixDef),
    Extern(ExternDef),
    Alias(AliasDef),
}

/// A function definition: top-level, method, or nested.
///
/// Methods do not list the receiver in `params`; the backend threads it
/// through the hidden environment parameter. `ret` of
/// `TypeExprId::INVALID` means void.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Func {
    pub name: Name,
    pub generics: NameRange,
    pub params: ParamRange,
    pub ret: TypeExprId,
    pub body: StmtRange,
}

/// A declared parameter.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Param {
    pub name: Name,
    pub ty: TypeExprId,
}

/// A struct definition with its methods.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct StructDef {
    pub name: Name,
    pub generics: NameRange,
    pub fields: FieldRange,
    pub methods: FuncRange,
}

/// A declared struct field.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FieldDef {
    pub name: Name,
    pub ty: TypeExprId,
}

/// An enum definition with its methods.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct EnumDef {
    pub name: Name,
    pub generics: NameRange,
    pub variants: VariantRange,
    pub methods: FuncRange,
}

/// An enum variant. `payload` of `TypeExprId::INVALID` marks a plain
/// (payload-free) case.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct VariantDef {
    pub name: Name,
    pub payload: TypeExprId,
}

/// A module variable with its initializer expression. Initial values are
/// stored by the module initializer in declaration order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct VarDef {
    pub name: Name,
    pub ty: TypeExprId,
    pub value: ExprId,
}

/// A named compile-time constant (literal value).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ConstDef {
    pub name: Name,
    pub value: ExprId,
}

/// An import: the loader path and the local alias the module binds to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ImportDef {
    pub path: Name,
    pub alias: Name,
}

/// A bounded overload set over functions declared in the same module.
/// Members are inspected in declaration order at each call site.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct MixDef {
    pub name: Name,
    pub members: NameRange,
}

/// An external C declaration: called without the hidden environment
/// parameter. `ret` of `TypeExprId::INVALID` means void.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ExternDef {
    pub name: Name,
    pub params: TypeExprRange,
    pub ret: TypeExprId,
}

/// A type alias.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct AliasDef {
    pub name: Name,
    pub ty: TypeExprId,
}
