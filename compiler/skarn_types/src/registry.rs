//! Per-instantiation aggregate descriptors.
//!
//! The registry is owned by the compilation context and keyed by the
//! instantiated symbol stem. Field layout, case numbering, methods, and
//! the capability record are all computed once, when the instantiation
//! is registered; lookups after that are plain map reads.

use crate::core::{DefId, FunType, Type};
use crate::layout::{enum_tag_bytes, struct_layout};
use rustc_hash::FxHashMap;
use skarn_ir::{ice, Name, StringInterner};

/// A resolved method: the emitted symbol (without the leading `@`) and
/// the function type as callers see it (receiver excluded).
#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub symbol: String,
    pub fun: FunType,
}

/// The magic methods an instantiation supports, resolved at
/// registration. A required capability that is absent at a use site is
/// an internal inconsistency, not a user error.
#[derive(Clone, Debug, Default)]
pub struct Capabilities {
    /// `init`: invoked by construction sugar.
    pub constructible: Option<MethodInfo>,
    /// `str`: invoked by template-string conversion.
    pub stringable: Option<MethodInfo>,
    /// `subscript`: invoked by indexing on a struct receiver.
    pub subscriptable: Option<MethodInfo>,
}

impl Capabilities {
    fn from_methods(methods: &FxHashMap<Name, MethodInfo>) -> Self {
        Capabilities {
            constructible: methods.get(&Name::INIT).cloned(),
            stringable: methods.get(&Name::STR).cloned(),
            subscriptable: methods.get(&Name::SUBSCRIPT).cloned(),
        }
    }
}

/// One field of a struct instantiation.
#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub name: Name,
    pub ty: Type,
    pub offset: u64,
}

/// A registered struct instantiation.
#[derive(Clone, Debug)]
pub struct StructInst {
    pub stem: Name,
    pub fields: Vec<FieldInfo>,
    pub size: u64,
    pub align: u64,
    pub methods: FxHashMap<Name, MethodInfo>,
    pub caps: Capabilities,
}

impl StructInst {
    /// Position of a field in the emitted type (the GEP index).
    pub fn field_index(&self, name: Name) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Look up a field by name.
    pub fn field(&self, name: Name) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a method by name.
    pub fn method(&self, name: Name) -> Option<&MethodInfo> {
        self.methods.get(&name)
    }
}

/// A registered enum instantiation.
///
/// Tags number the plain (payload-free) cases first, `0..plain.len()`,
/// then the typed cases in declaration order. The payload slot is sized
/// to the largest typed case; the emitted type is packed, so the whole
/// value has alignment 1 and size `tag_bytes + payload_size`.
#[derive(Clone, Debug)]
pub struct EnumInst {
    pub stem: Name,
    pub plain: Vec<Name>,
    pub typed: Vec<(Name, Type)>,
    pub tag_bytes: u64,
    pub payload_size: u64,
    pub methods: FxHashMap<Name, MethodInfo>,
    pub caps: Capabilities,
}

impl EnumInst {
    /// Total size of a value: tag plus payload.
    pub fn size(&self) -> u64 {
        self.tag_bytes + self.payload_size
    }

    /// Number of cases.
    pub fn case_count(&self) -> usize {
        self.plain.len() + self.typed.len()
    }

    /// The tag value of a case.
    pub fn tag_of(&self, name: Name) -> Option<u64> {
        if let Some(i) = self.plain.iter().position(|&n| n == name) {
            return Some(i as u64);
        }
        self.typed
            .iter()
            .position(|&(n, _)| n == name)
            .map(|i| (self.plain.len() + i) as u64)
    }

    /// The payload type of a case; `None` for plain cases.
    pub fn payload_of(&self, name: Name) -> Option<&Type> {
        self.typed.iter().find(|&&(n, _)| n == name).map(|(_, ty)| ty)
    }

    /// IR encoding of the tag field.
    pub fn tag_ir(&self) -> &'static str {
        match self.tag_bytes {
            1 => "i8",
            2 => "i16",
            4 => "i32",
            other => ice!("enum tag width {other} bytes"),
        }
    }

    /// Look up a method by name.
    pub fn method(&self, name: Name) -> Option<&MethodInfo> {
        self.methods.get(&name)
    }
}

/// All aggregate instantiations registered so far, plus the definition
/// table that ties instantiations of the same source aggregate together.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    def_names: Vec<Name>,
    structs: FxHashMap<Name, StructInst>,
    enums: FxHashMap<Name, EnumInst>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a definition ID for a source struct or enum.
    pub fn alloc_def(&mut self, name: Name) -> DefId {
        let id = DefId::new(self.def_names.len() as u32);
        self.def_names.push(name);
        id
    }

    /// The source name of a definition.
    pub fn def_name(&self, def: DefId) -> Name {
        self.def_names[def.index()]
    }

    /// Check whether a stem already has a registered instantiation.
    pub fn is_registered(&self, stem: Name) -> bool {
        self.structs.contains_key(&stem) || self.enums.contains_key(&stem)
    }

    /// Register a struct instantiation: computes field layout and the
    /// capability record.
    ///
    /// # Panics
    /// Aborts if the stem is already registered; the instantiation cache
    /// check precedes registration.
    pub fn register_struct(
        &mut self,
        stem: Name,
        fields: Vec<(Name, Type)>,
        methods: Vec<(Name, MethodInfo)>,
        interner: &StringInterner,
    ) {
        if self.is_registered(stem) {
            ice!("stem `{}` registered twice", interner.lookup(stem));
        }

        let field_types: Vec<Type> = fields.iter().map(|(_, ty)| ty.clone()).collect();
        let layout = struct_layout(&field_types, self, interner);

        let fields = fields
            .into_iter()
            .zip(layout.offsets)
            .map(|((name, ty), offset)| FieldInfo { name, ty, offset })
            .collect();

        let methods: FxHashMap<Name, MethodInfo> = methods.into_iter().collect();
        let caps = Capabilities::from_methods(&methods);

        self.structs.insert(
            stem,
            StructInst {
                stem,
                fields,
                size: layout.size,
                align: layout.align,
                methods,
                caps,
            },
        );
    }

    /// Register an enum instantiation: computes the tag width and the
    /// payload slot size.
    ///
    /// # Panics
    /// Aborts if the stem is already registered.
    pub fn register_enum(
        &mut self,
        stem: Name,
        plain: Vec<Name>,
        typed: Vec<(Name, Type)>,
        methods: Vec<(Name, MethodInfo)>,
        interner: &StringInterner,
    ) {
        if self.is_registered(stem) {
            ice!("stem `{}` registered twice", interner.lookup(stem));
        }

        let tag_bytes = enum_tag_bytes(plain.len() + typed.len());
        let payload_size = typed
            .iter()
            .map(|(_, ty)| crate::layout::size_of(ty, self, interner))
            .max()
            .unwrap_or(0);

        let methods: FxHashMap<Name, MethodInfo> = methods.into_iter().collect();
        let caps = Capabilities::from_methods(&methods);

        self.enums.insert(
            stem,
            EnumInst {
                stem,
                plain,
                typed,
                tag_bytes,
                payload_size,
                methods,
                caps,
            },
        );
    }

    /// Look up a struct instantiation by stem.
    pub fn struct_inst(&self, stem: Name) -> Option<&StructInst> {
        self.structs.get(&stem)
    }

    /// Look up an enum instantiation by stem.
    pub fn enum_inst(&self, stem: Name) -> Option<&EnumInst> {
        self.enums.get(&stem)
    }
}
