//! Size, alignment, and aggregate layout rules.
//!
//! Struct layout is C-style: each field at its natural alignment, total
//! size rounded up to the widest field's alignment. Enums are a
//! minimum-width tag followed by a byte-array payload and are emitted
//! packed, so their alignment is 1.

use crate::core::Type;
use crate::registry::TypeRegistry;
use skarn_ir::{ice, StringInterner};

/// Computed layout of a struct body.
#[derive(Debug, Clone)]
pub struct StructLayout {
    /// Byte offset of each field, in declaration order.
    pub offsets: Vec<u64>,
    /// Total size, rounded up to `align`.
    pub size: u64,
    /// The widest field alignment (1 for an empty struct).
    pub align: u64,
}

/// Size in bytes of a stored value of `ty`.
///
/// # Panics
/// Aborts for types that have no storage (void, kinds, modules, overload
/// sets, unresolved parameters) and for unregistered aggregate stems.
pub fn size_of(ty: &Type, registry: &TypeRegistry, interner: &StringInterner) -> u64 {
    match ty {
        Type::Void => ice!("void has no size"),
        Type::Bool | Type::Char => 1,
        Type::Short => 2,
        Type::Int => 8,
        Type::Str => 16,
        Type::Ptr(_) => 8,
        Type::Array(elem, len) => u64::from(*len) * size_of(elem, registry, interner),
        Type::Fun(_) => 16,
        Type::Struct(agg) => match registry.struct_inst(agg.stem) {
            Some(inst) => inst.size,
            None => ice!("unregistered struct `{}`", interner.lookup(agg.stem)),
        },
        Type::Enum(agg) => match registry.enum_inst(agg.stem) {
            Some(inst) => inst.size(),
            None => ice!("unregistered enum `{}`", interner.lookup(agg.stem)),
        },
        Type::StructKind(agg) | Type::EnumKind(agg) => {
            ice!("kind `{}` has no size", interner.lookup(agg.stem))
        }
        Type::Module(id) => ice!("module reference {id:?} has no size"),
        Type::Mix(_) => ice!("overload set has no size"),
        Type::Var(name) => ice!("unresolved type parameter `{}`", interner.lookup(*name)),
    }
}

/// Alignment in bytes of a stored value of `ty`.
///
/// # Panics
/// Same conditions as [`size_of`].
pub fn align_of(ty: &Type, registry: &TypeRegistry, interner: &StringInterner) -> u64 {
    match ty {
        Type::Void => ice!("void has no alignment"),
        Type::Bool | Type::Char => 1,
        Type::Short => 2,
        Type::Int => 8,
        Type::Str => 8,
        Type::Ptr(_) => 8,
        Type::Array(elem, _) => align_of(elem, registry, interner),
        Type::Fun(_) => 8,
        Type::Struct(agg) => match registry.struct_inst(agg.stem) {
            Some(inst) => inst.align,
            None => ice!("unregistered struct `{}`", interner.lookup(agg.stem)),
        },
        Type::Enum(_) => 1,
        Type::StructKind(agg) | Type::EnumKind(agg) => {
            ice!("kind `{}` has no alignment", interner.lookup(agg.stem))
        }
        Type::Module(id) => ice!("module reference {id:?} has no alignment"),
        Type::Mix(_) => ice!("overload set has no alignment"),
        Type::Var(name) => ice!("unresolved type parameter `{}`", interner.lookup(*name)),
    }
}

/// Lay out struct fields C-style.
pub fn struct_layout(
    fields: &[Type],
    registry: &TypeRegistry,
    interner: &StringInterner,
) -> StructLayout {
    let mut offset = 0u64;
    let mut max_align = 1u64;
    let mut offsets = Vec::with_capacity(fields.len());

    for field in fields {
        let align = align_of(field, registry, interner);
        offset = align_up(offset, align);
        offsets.push(offset);
        offset += size_of(field, registry, interner);
        max_align = max_align.max(align);
    }

    StructLayout {
        offsets,
        size: align_up(offset, max_align),
        align: max_align,
    }
}

/// Width of the tag field for an enum with `cases` cases.
pub fn enum_tag_bytes(cases: usize) -> u64 {
    if cases <= 256 {
        1
    } else if cases <= 65536 {
        2
    } else {
        4
    }
}

fn align_up(n: u64, align: u64) -> u64 {
    n.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn primitive_sizes() {
        let interner = StringInterner::new();
        let registry = TypeRegistry::new();

        assert_eq!(size_of(&Type::Bool, &registry, &interner), 1);
        assert_eq!(size_of(&Type::Char, &registry, &interner), 1);
        assert_eq!(size_of(&Type::Short, &registry, &interner), 2);
        assert_eq!(size_of(&Type::Int, &registry, &interner), 8);
        assert_eq!(size_of(&Type::Str, &registry, &interner), 16);
        assert_eq!(size_of(&Type::Ptr(Box::new(Type::Str)), &registry, &interner), 8);
    }

    #[test]
    fn array_size_is_the_whole_run() {
        let interner = StringInterner::new();
        let registry = TypeRegistry::new();

        let arr = Type::Array(Box::new(Type::Int), 10);
        assert_eq!(size_of(&arr, &registry, &interner), 80);
        assert_eq!(align_of(&arr, &registry, &interner), 8);
    }

    #[test]
    fn two_int_fields_make_sixteen_bytes() {
        let interner = StringInterner::new();
        let registry = TypeRegistry::new();

        let layout = struct_layout(&[Type::Int, Type::Int], &registry, &interner);
        assert_eq!(layout.offsets, vec![0, 8]);
        assert_eq!(layout.size, 16);
        assert_eq!(layout.align, 8);
    }

    #[test]
    fn fields_pad_to_their_alignment() {
        let interner = StringInterner::new();
        let registry = TypeRegistry::new();

        let layout = struct_layout(&[Type::Char, Type::Int, Type::Short], &registry, &interner);
        assert_eq!(layout.offsets, vec![0, 8, 16]);
        assert_eq!(layout.size, 24);
        assert_eq!(layout.align, 8);
    }

    #[test]
    fn narrow_structs_stay_narrow() {
        let interner = StringInterner::new();
        let registry = TypeRegistry::new();

        let layout = struct_layout(&[Type::Char, Type::Char], &registry, &interner);
        assert_eq!(layout.offsets, vec![0, 1]);
        assert_eq!(layout.size, 2);
        assert_eq!(layout.align, 1);
    }

    #[test]
    fn empty_struct_layout() {
        let interner = StringInterner::new();
        let registry = TypeRegistry::new();

        let layout = struct_layout(&[], &registry, &interner);
        assert_eq!(layout.size, 0);
        assert_eq!(layout.align, 1);
    }

    #[test]
    fn tag_widths() {
        assert_eq!(enum_tag_bytes(2), 1);
        assert_eq!(enum_tag_bytes(256), 1);
        assert_eq!(enum_tag_bytes(257), 2);
        assert_eq!(enum_tag_bytes(65536), 2);
        assert_eq!(enum_tag_bytes(65537), 4);
    }

    #[test]
    #[should_panic(expected = "internal compiler error")]
    fn void_has_no_size() {
        let interner = StringInterner::new();
        let registry = TypeRegistry::new();

        let _ = size_of(&Type::Void, &registry, &interner);
    }
}
