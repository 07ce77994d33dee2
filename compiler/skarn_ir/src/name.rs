//! Interned string identifier.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Interned string identifier.
///
/// A `Name` is an index into the [`StringInterner`](crate::StringInterner);
/// two names are equal iff their strings are equal. Interning order is
/// deterministic, so the reserved-name constants below hold for every
/// interner created with [`StringInterner::new`](crate::StringInterner::new).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);
    /// Pre-interned `self` (hidden receiver binding in methods).
    pub const SELF: Name = Name(1);
    /// Pre-interned `main` (program entry point).
    pub const MAIN: Name = Name(2);
    /// Pre-interned `init` (constructor magic method).
    pub const INIT: Name = Name(3);
    /// Pre-interned `str` (stringification magic method).
    pub const STR: Name = Name(4);
    /// Pre-interned `subscript` (indexing magic method).
    pub const SUBSCRIPT: Name = Name(5);
    /// Pre-interned `format` (default template-string formatter).
    pub const FORMAT: Name = Name(6);

    /// Create from a raw interner index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    /// Index into the interner's string table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl Hash for Name {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_roundtrip() {
        let name = Name::from_raw(42);
        assert_eq!(name.raw(), 42);
        assert_eq!(name.index(), 42);
    }

    #[test]
    fn default_is_empty() {
        assert_eq!(Name::default(), Name::EMPTY);
    }
}
