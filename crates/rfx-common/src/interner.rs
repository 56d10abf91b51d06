//! String interner for type and member names.
//!
//! Names are interned into a shared pool and passed around as u32 handles
//! (`Atom`). Comparing two names becomes an integer comparison, and member
//! tables can key on `Atom` instead of owned strings.
//!
//! The interner is shared by every query running against a registry, so it
//! takes `&self` and guards its tables with a `parking_lot::RwLock`.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;

/// An interned string identifier.
///
/// Atoms are cheap to copy (just a u32) and can be compared with == in O(1).
/// To get the actual string, use `Interner::resolve(atom)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// A sentinel value representing no atom / empty string.
    pub const NONE: Atom = Atom(0);

    /// Check if this is the empty/none atom.
    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Get the raw index value.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Names every registry needs; interned up front so their atoms are stable.
const COMMON_NAMES: &[&str] = &[
    "System",
    "System.Collections",
    "System.Collections.Generic",
    "Object",
    "ValueType",
    "String",
    "Array",
    ".ctor",
    "T",
    "TKey",
    "TValue",
    "Key",
    "Value",
    "Count",
    "Add",
];

#[derive(Default)]
struct InternerTables {
    /// Map from string to atom index
    map: FxHashMap<Arc<str>, Atom>,
    /// Vector of all interned strings (index 0 is empty string)
    strings: Vec<Arc<str>>,
}

/// Thread-safe string interner that deduplicates strings and returns Atom handles.
///
/// # Example
/// ```
/// use rfx_common::interner::Interner;
/// let interner = Interner::new();
/// let a1 = interner.intern("Dictionary");
/// let a2 = interner.intern("Dictionary");
/// assert_eq!(a1, a2);
/// assert_eq!(&*interner.resolve(a1), "Dictionary");
/// ```
pub struct Interner {
    tables: RwLock<InternerTables>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    /// Create a new interner with the empty string pre-interned at index 0.
    pub fn new() -> Self {
        let mut tables = InternerTables {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        // Index 0 is reserved for empty/none
        let empty: Arc<str> = Arc::from("");
        tables.strings.push(empty.clone());
        tables.map.insert(empty, Atom::NONE);

        let interner = Interner {
            tables: RwLock::new(tables),
        };
        for name in COMMON_NAMES {
            interner.intern(name);
        }
        interner
    }

    /// Intern a string, returning its Atom handle.
    /// If the string was already interned, returns the existing Atom.
    pub fn intern(&self, s: &str) -> Atom {
        if let Some(&atom) = self.tables.read().map.get(s) {
            return atom;
        }

        let mut tables = self.tables.write();
        // Another thread may have won the race between the read and write lock.
        if let Some(&atom) = tables.map.get(s) {
            return atom;
        }
        let atom = Atom(tables.strings.len() as u32);
        let owned: Arc<str> = Arc::from(s);
        tables.strings.push(owned.clone());
        tables.map.insert(owned, atom);
        atom
    }

    /// Look up a string without interning it.
    pub fn lookup(&self, s: &str) -> Option<Atom> {
        self.tables.read().map.get(s).copied()
    }

    /// Resolve an Atom back to its string value.
    /// Returns the empty string for unknown atoms.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        let tables = self.tables.read();
        tables
            .strings
            .get(atom.0 as usize)
            .cloned()
            .unwrap_or_else(|| tables.strings[0].clone())
    }

    /// Number of interned strings (including the empty string).
    pub fn len(&self) -> usize {
        self.tables.read().strings.len()
    }

    /// Whether only the reserved empty string is present.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod tests;
