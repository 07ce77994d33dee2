//! String interner with deterministic, sequential `Name` assignment.
//!
//! Interning is append-only: a string is leaked once and referenced for the
//! lifetime of the process. Sequential assignment keeps `Name` values stable
//! across runs, which the backend relies on for reproducible output and for
//! the reserved-name constants on [`Name`].

use crate::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

struct InternTable {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents, indexed by `Name`.
    strings: Vec<&'static str>,
}

/// String interner shared by the front end and the backend.
///
/// Provides O(1) lookup and equality comparison for interned strings.
/// Interior mutability through `RwLock` lets the backend intern derived
/// names (qualified stems, instantiation suffixes) behind a shared
/// reference during code generation.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    /// Create a new interner with the reserved names pre-interned.
    pub fn new() -> Self {
        let interner = Self {
            table: RwLock::new(InternTable {
                map: FxHashMap::default(),
                strings: Vec::with_capacity(256),
            }),
        };
        interner.pre_intern_reserved();
        interner
    }

    /// Intern a string, returning its Name.
    ///
    /// # Panics
    /// Panics if the interner exceeds capacity (over 4 billion strings).
    pub fn intern(&self, s: &str) -> Name {
        // Fast path: check if already interned
        {
            let guard = self.table.read();
            if let Some(&raw) = guard.map.get(s) {
                return Name::from_raw(raw);
            }
        }

        let mut guard = self.table.write();

        // Double-check after acquiring the write lock
        if let Some(&raw) = guard.map.get(s) {
            return Name::from_raw(raw);
        }

        // Leak the string to get 'static lifetime
        let owned: String = s.to_owned();
        let leaked: &'static str = Box::leak(owned.into_boxed_str());

        let raw = u32::try_from(guard.strings.len())
            .unwrap_or_else(|_| panic!("interner exceeded u32::MAX strings"));
        guard.strings.push(leaked);
        guard.map.insert(leaked, raw);

        Name::from_raw(raw)
    }

    /// Look up the string for a Name.
    pub fn lookup(&self, name: Name) -> &str {
        let guard = self.table.read();
        guard.strings[name.index()]
    }

    /// Pre-intern reserved names.
    ///
    /// The first entries must stay in sync with the constants on [`Name`];
    /// the rest are names the backend looks up on hot paths.
    fn pre_intern_reserved(&self) {
        const RESERVED: &[&str] = &[
            // Constants on Name, in declaration order
            "", "self", "main", "init", "str", "subscript", "format",
            // Library functions resolved by reserved name
            "str_concat", "str_repeat", "str_of_int", "str_of_char",
            "str_of_bool",
            // Primitive type names
            "void", "bool", "char", "short", "int",
        ];

        for s in RESERVED {
            self.intern(s);
        }
    }

    /// Get the number of interned strings.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    /// Check if the interner is empty.
    ///
    /// Never true in practice: `new` pre-interns the reserved names.
    pub fn is_empty(&self) -> bool {
        self.table.read().strings.is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_and_lookup() {
        let interner = StringInterner::new();

        let hello = interner.intern("hello");
        let world = interner.intern("world");
        let hello2 = interner.intern("hello");

        assert_eq!(hello, hello2);
        assert_ne!(hello, world);

        assert_eq!(interner.lookup(hello), "hello");
        assert_eq!(interner.lookup(world), "world");
    }

    #[test]
    fn reserved_constants_line_up() {
        let interner = StringInterner::new();

        assert_eq!(interner.intern(""), Name::EMPTY);
        assert_eq!(interner.intern("self"), Name::SELF);
        assert_eq!(interner.intern("main"), Name::MAIN);
        assert_eq!(interner.intern("init"), Name::INIT);
        assert_eq!(interner.intern("str"), Name::STR);
        assert_eq!(interner.intern("subscript"), Name::SUBSCRIPT);
        assert_eq!(interner.intern("format"), Name::FORMAT);
    }

    #[test]
    fn sequential_assignment() {
        let interner = StringInterner::new();
        let base = interner.len();

        let a = interner.intern("alpha");
        let b = interner.intern("beta");

        assert_eq!(a.index(), base);
        assert_eq!(b.index(), base + 1);
    }

    #[test]
    fn deterministic_across_interners() {
        let first = StringInterner::new();
        let second = StringInterner::new();

        assert_eq!(first.intern("deterministic"), second.intern("deterministic"));
    }
}
