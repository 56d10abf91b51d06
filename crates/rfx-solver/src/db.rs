//! Type database trait and the concrete registry.
//!
//! Algorithms take `&dyn TypeDatabase`; `TypeRegistry` is the implementation
//! populated at load time (builtins in `new`, everything else through
//! `DefinitionBuilder` or `corelib::CoreLib::install`).

use crate::def::{DefId, DefKind, DefinitionInfo, DefinitionStore};
use crate::intern::TypeInterner;
use crate::types::{ParamOwner, ParamRef, PrimitiveKind, TypeData, TypeId};
use crate::value::Value;
use dashmap::DashMap;
use rfx_common::interner::{Atom, Interner};
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use tracing::debug;

/// Query surface over interned types, definitions and names.
pub trait TypeDatabase: Send + Sync {
    fn types(&self) -> &TypeInterner;
    fn definitions(&self) -> &DefinitionStore;
    fn names(&self) -> &Interner;

    fn intern(&self, data: TypeData) -> TypeId {
        self.types().intern(data)
    }

    fn lookup(&self, id: TypeId) -> Option<TypeData> {
        self.types().lookup(id)
    }

    fn intern_string(&self, s: &str) -> Atom {
        self.names().intern(s)
    }

    fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.names().resolve(atom)
    }

    fn nominal(&self, def: DefId) -> TypeId {
        self.intern(TypeData::Nominal(def))
    }

    /// Intern `def<args>`.
    ///
    /// No arguments, or exactly the definition's own parameters in order,
    /// canonicalize to the definition itself.
    fn application(&self, def: DefId, args: &[TypeId]) -> TypeId {
        if args.is_empty() {
            return self.nominal(def);
        }
        let own_params = args.iter().enumerate().all(|(i, &arg)| {
            self.lookup(arg)
                == Some(TypeData::Param(ParamRef {
                    owner: ParamOwner::Type(def),
                    index: i as u32,
                }))
        });
        if own_params && args.len() == self.definitions().get_arity(def) {
            return self.nominal(def);
        }
        self.intern(TypeData::Application {
            def,
            args: args.iter().copied().collect(),
        })
    }

    fn array(&self, element: TypeId) -> TypeId {
        self.intern(TypeData::Array(element))
    }

    fn param(&self, owner: ParamOwner, index: u32) -> TypeId {
        self.intern(TypeData::Param(ParamRef { owner, index }))
    }

    /// Definition behind a nominal type or application.
    fn def_of(&self, ty: TypeId) -> Option<DefId> {
        match self.lookup(ty)? {
            TypeData::Nominal(def) | TypeData::Application { def, .. } => Some(def),
            _ => None,
        }
    }

    fn def_kind(&self, ty: TypeId) -> Option<DefKind> {
        self.definitions().get_kind(self.def_of(ty)?)
    }
}

// =============================================================================
// TypeRegistry
// =============================================================================

/// Builtin definitions in `DefId` order; `DefId(n)` backs `TypeId(n)`.
const BUILTINS: &[(TypeId, &str)] = &[
    (TypeId::OBJECT, "Object"),
    (TypeId::VALUE_TYPE, "ValueType"),
    (TypeId::BOOL, "Boolean"),
    (TypeId::CHAR, "Char"),
    (TypeId::I8, "SByte"),
    (TypeId::U8, "Byte"),
    (TypeId::I16, "Int16"),
    (TypeId::U16, "UInt16"),
    (TypeId::I32, "Int32"),
    (TypeId::U32, "UInt32"),
    (TypeId::I64, "Int64"),
    (TypeId::U64, "UInt64"),
    (TypeId::F32, "Single"),
    (TypeId::F64, "Double"),
    (TypeId::STRING, "String"),
    (TypeId::ARRAY, "Array"),
];

/// The host registry: interned types, definitions, names and static storage.
///
/// Populate it single-threaded at load time, then share it as
/// `Arc<TypeRegistry>`; every query takes `&self`.
pub struct TypeRegistry {
    types: TypeInterner,
    definitions: DefinitionStore,
    names: Interner,
    statics: DashMap<(TypeId, Atom), Value, FxBuildHasher>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a registry holding only the builtin roots.
    pub fn new() -> Self {
        let registry = Self {
            types: TypeInterner::new(),
            definitions: DefinitionStore::new(),
            names: Interner::new(),
            statics: DashMap::with_hasher(FxBuildHasher),
        };
        registry.register_builtins();
        registry
    }

    fn register_builtins(&self) {
        let system = self.names.intern("System");
        for &(expected, name) in BUILTINS {
            let atom = self.names.intern(name);
            let info = match PrimitiveKind::from_type_id(expected) {
                Some(kind) => DefinitionInfo::primitive(atom, kind),
                None => DefinitionInfo::class(atom, Vec::new()),
            };
            let info = info.with_namespace(system);
            let info = match expected {
                TypeId::OBJECT => info,
                TypeId::VALUE_TYPE | TypeId::STRING | TypeId::ARRAY => {
                    info.with_extends(TypeId::OBJECT)
                }
                _ => info.with_extends(TypeId::VALUE_TYPE),
            };
            let qualified = self.names.intern(&format!("System.{name}"));
            let def = self.definitions.register(info, Some(qualified));
            let ty = self.nominal(def);
            debug_assert_eq!(ty, expected, "builtin {name} registered out of order");
        }
        debug!(count = BUILTINS.len(), "TypeRegistry: builtins registered");
    }

    /// Wrap in an `Arc` for sharing with invokers and threads.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Current value of a static field, initializing it on first access.
    pub fn static_field(&self, owner: TypeId, name: Atom, init: impl FnOnce() -> Value) -> Value {
        self.statics.entry((owner, name)).or_insert_with(init).clone()
    }

    pub fn set_static_field(&self, owner: TypeId, name: Atom, value: Value) {
        self.statics.insert((owner, name), value);
    }

    /// Find a definition by simple or qualified name and arity.
    pub fn find_definition(&self, name: &str, arity: u32) -> Option<DefId> {
        let atom = self.names.lookup(name)?;
        self.definitions.find(atom, arity)
    }
}

impl TypeDatabase for TypeRegistry {
    fn types(&self) -> &TypeInterner {
        &self.types
    }

    fn definitions(&self) -> &DefinitionStore {
        &self.definitions
    }

    fn names(&self) -> &Interner {
        &self.names
    }
}

#[cfg(test)]
#[path = "../tests/db_tests.rs"]
mod tests;
