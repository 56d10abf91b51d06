//! Type interning for structural deduplication.
//!
//! Converts `TypeData` structures into lightweight `TypeId` handles:
//! - O(1) type equality (just compare ids)
//! - each unique structure stored once
//! - ids are dense, so `lookup` is a vector index
//!
//! `key_to_id` is a `DashMap`; its entry API makes "intern if absent"
//! atomic per shard. `id_to_key` is append-only behind a `RwLock`.

use crate::types::{TypeData, TypeId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;
use tracing::trace;

pub struct TypeInterner {
    key_to_id: DashMap<TypeData, TypeId, FxBuildHasher>,
    id_to_key: RwLock<Vec<TypeData>>,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    /// Create an interner with `Void` pre-interned as `TypeId::VOID`.
    pub fn new() -> Self {
        let interner = TypeInterner {
            key_to_id: DashMap::with_hasher(FxBuildHasher),
            id_to_key: RwLock::new(Vec::with_capacity(256)),
        };
        let void = interner.intern(TypeData::Void);
        debug_assert_eq!(void, TypeId::VOID);
        interner
    }

    /// Intern a type structure, returning the existing id when already present.
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(id) = self.key_to_id.get(&data) {
            return *id;
        }

        match self.key_to_id.entry(data) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let mut keys = self.id_to_key.write();
                let id = TypeId(keys.len() as u32);
                keys.push(entry.key().clone());
                trace!(type_id = id.0, data = ?entry.key(), "TypeInterner::intern");
                entry.insert(id);
                id
            }
        }
    }

    /// Resolve a `TypeId` back to its structure.
    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        self.id_to_key.read().get(id.0 as usize).cloned()
    }

    /// Whether `id` was produced by this interner.
    pub fn contains(&self, id: TypeId) -> bool {
        (id.0 as usize) < self.id_to_key.read().len()
    }

    /// Number of interned types.
    pub fn len(&self) -> usize {
        self.id_to_key.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;
