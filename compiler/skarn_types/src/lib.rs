//! Skarn type model.
//!
//! The closed `Type` sum with its canonical IR encodings and mangled
//! tokens, structural and textual substitution, C-style layout rules,
//! and the per-instantiation aggregate registry (fields, cases, methods,
//! capability records).
//!
//! Everything here is passive data plus pure functions; the compilation
//! context in `skarn_codegen` owns the registry instance and decides
//! when instantiations are registered.

mod core;
mod layout;
mod registry;
mod subst;

pub use crate::core::{Abi, AggRef, DefId, FunType, MixMember, ModuleId, Type};
pub use layout::{align_of, enum_tag_bytes, size_of, struct_layout, StructLayout};
pub use registry::{Capabilities, EnumInst, FieldInfo, MethodInfo, StructInst, TypeRegistry};
pub use subst::{substitute, substitute_fragment, substitute_fun, Bindings};
