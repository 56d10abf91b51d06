//! Definition identifiers and storage.
//!
//! A definition is the load-time metadata of one nominal type: its kind,
//! name, generic parameters, declared base type, declared interfaces and
//! members. Definitions are registered once and then only read; every
//! relationship query walks them without caching.
//!
//! ## `DefId` Allocation
//!
//! Ids are sequential per store. The builtin roots are registered first, in a
//! fixed order, so `DefId(n)` for `n <= TypeId::LAST_BUILTIN` lines up with
//! the builtin `TypeId(n)`.

use crate::error::InvokeError;
use crate::types::{MemberId, MemberKind, PrimitiveKind, TypeId, TypeParamInfo, Visibility};
use crate::value::Value;
use dashmap::DashMap;
use rfx_common::interner::Atom;
use rustc_hash::FxBuildHasher;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

// =============================================================================
// DefId
// =============================================================================

/// Identifier of a registered nominal definition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct DefId(pub u32);

impl DefId {
    /// Sentinel value for invalid `DefId`.
    pub const INVALID: Self = Self(0);

    /// First valid `DefId`.
    pub const FIRST_VALID: u32 = 1;

    /// Check if this `DefId` is valid.
    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

// =============================================================================
// DefKind
// =============================================================================

/// Kind of type definition.
///
/// | Kind | Value type | Has base class | Example |
/// |------|------------|----------------|---------|
/// | Class | No | Yes (defaults to `Object`) | `List<T>` |
/// | Struct | Yes | `ValueType` | `KeyValuePair<K, V>` |
/// | Interface | No | No | `IDictionary<K, V>` |
/// | Primitive | Yes | `ValueType` | `Int32` |
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum DefKind {
    Class,
    Struct,
    Interface,
    Primitive(PrimitiveKind),
}

impl DefKind {
    pub const fn is_value_type(self) -> bool {
        matches!(self, Self::Struct | Self::Primitive(_))
    }

    pub const fn is_interface(self) -> bool {
        matches!(self, Self::Interface)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Interface => "interface",
            Self::Primitive(_) => "primitive",
        }
    }
}

// =============================================================================
// Members
// =============================================================================

/// Arguments handed to a member's native implementation.
pub struct NativeCall<'a> {
    /// The receiver; `None` for static members and constructors' allocation step.
    pub this: Option<&'a Value>,
    /// Arguments, already converted to the member's parameter types.
    pub args: &'a [Value],
    /// Bound method type arguments of a generic method.
    pub type_args: &'a [TypeId],
}

/// Native implementation of a method, constructor body or property accessor.
pub type NativeFn = Arc<dyn Fn(NativeCall<'_>) -> Result<Value, InvokeError> + Send + Sync>;

/// Property accessor with its own visibility.
#[derive(Clone)]
pub struct Accessor {
    pub visibility: Visibility,
    pub body: NativeFn,
}

/// What a member does when invoked.
#[derive(Clone)]
pub enum MemberBody {
    /// Storage slot. Instance fields live on the object; static fields in the
    /// registry, starting at `initial` (or the type's default).
    Field { initial: Option<Value> },
    Property {
        getter: Option<Accessor>,
        setter: Option<Accessor>,
    },
    Method(NativeFn),
    /// Runs after the instance is allocated with defaulted fields.
    Constructor(NativeFn),
}

impl fmt::Debug for MemberBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field { initial } => f.debug_struct("Field").field("initial", initial).finish(),
            Self::Property { getter, setter } => f
                .debug_struct("Property")
                .field("getter", &getter.as_ref().map(|a| a.visibility))
                .field("setter", &setter.as_ref().map(|a| a.visibility))
                .finish(),
            Self::Method(_) => f.write_str("Method(<native>)"),
            Self::Constructor(_) => f.write_str("Constructor(<native>)"),
        }
    }
}

/// Declared parameter of a method or constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamInfo {
    pub name: Atom,
    pub ty: TypeId,
}

/// A declared member, in terms of its owner's (and its own) generic parameters.
#[derive(Clone, Debug)]
pub struct MemberInfo {
    /// Member name. Explicit interface implementations are named
    /// `Interface.Member`.
    pub name: Atom,
    /// For properties: the visibility of the getter (setter when write-only).
    pub visibility: Visibility,
    pub is_static: bool,
    /// Occupies a fresh slot (explicit interface implementations).
    pub new_slot: bool,
    /// Method type parameters; empty for non-generic members.
    pub type_params: Vec<TypeParamInfo>,
    pub params: Vec<ParamInfo>,
    /// Field/property value type, method return type, `VOID` for constructors.
    pub value_type: TypeId,
    pub body: MemberBody,
}

impl MemberInfo {
    pub fn kind(&self) -> MemberKind {
        match self.body {
            MemberBody::Field { .. } => MemberKind::Field,
            MemberBody::Property { .. } => MemberKind::Property,
            MemberBody::Method(_) => MemberKind::Method,
            MemberBody::Constructor(_) => MemberKind::Constructor,
        }
    }

    pub fn param_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.params.iter().map(|p| p.ty)
    }

    /// Getter accessor of a property.
    pub fn getter(&self) -> Option<&Accessor> {
        match &self.body {
            MemberBody::Property { getter, .. } => getter.as_ref(),
            _ => None,
        }
    }

    /// Setter accessor of a property.
    pub fn setter(&self) -> Option<&Accessor> {
        match &self.body {
            MemberBody::Property { setter, .. } => setter.as_ref(),
            _ => None,
        }
    }
}

// =============================================================================
// Definition Info - Stored Definition Data
// =============================================================================

/// Complete information about a type definition.
///
/// This is stored in `DefinitionStore` and retrieved by `DefId`.
#[derive(Clone, Debug)]
pub struct DefinitionInfo {
    pub kind: DefKind,

    /// Simple name (`Dictionary`).
    pub name: Atom,

    /// Dotted namespace (`System.Collections.Generic`); `Atom::NONE` for none.
    pub namespace: Atom,

    /// Generic parameters; non-empty makes this a generic definition.
    pub type_params: Vec<TypeParamInfo>,

    /// Declared base type, in terms of this definition's parameters.
    pub extends: Option<TypeId>,

    /// Declared interfaces, in terms of this definition's parameters.
    pub implements: Vec<TypeId>,

    pub members: Vec<Arc<MemberInfo>>,
}

impl DefinitionInfo {
    fn with_kind(kind: DefKind, name: Atom, type_params: Vec<TypeParamInfo>) -> Self {
        Self {
            kind,
            name,
            namespace: Atom::NONE,
            type_params,
            extends: None,
            implements: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Create a new class definition.
    pub fn class(name: Atom, type_params: Vec<TypeParamInfo>) -> Self {
        Self::with_kind(DefKind::Class, name, type_params)
    }

    /// Create a new struct definition.
    pub fn structure(name: Atom, type_params: Vec<TypeParamInfo>) -> Self {
        Self::with_kind(DefKind::Struct, name, type_params)
    }

    /// Create a new interface definition.
    pub fn interface(name: Atom, type_params: Vec<TypeParamInfo>) -> Self {
        Self::with_kind(DefKind::Interface, name, type_params)
    }

    /// Create a primitive definition.
    pub fn primitive(name: Atom, kind: PrimitiveKind) -> Self {
        Self::with_kind(DefKind::Primitive(kind), name, Vec::new())
    }

    /// Set the namespace.
    pub const fn with_namespace(mut self, namespace: Atom) -> Self {
        self.namespace = namespace;
        self
    }

    /// Set the base type.
    pub const fn with_extends(mut self, parent: TypeId) -> Self {
        self.extends = Some(parent);
        self
    }

    /// Set implemented interfaces.
    pub fn with_implements(mut self, interfaces: Vec<TypeId>) -> Self {
        self.implements = interfaces;
        self
    }

    /// Set declared members.
    pub fn with_members(mut self, members: Vec<Arc<MemberInfo>>) -> Self {
        self.members = members;
        self
    }

    pub fn is_generic_definition(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn arity(&self) -> usize {
        self.type_params.len()
    }
}

// =============================================================================
// DefinitionStore - Storage for Definitions
// =============================================================================

/// Thread-safe storage for type definitions.
///
/// Uses `DashMap` so a registry shared behind an `Arc` can be queried from
/// many threads at once.
///
/// ## Usage
///
/// ```ignore
/// let store = DefinitionStore::new();
/// let def_id = store.register(DefinitionInfo::interface(names.intern("IComparer"), params));
/// let info = store.get(def_id).expect("definition exists");
/// ```
pub struct DefinitionStore {
    /// `DefId` -> `DefinitionInfo` mapping
    definitions: DashMap<DefId, DefinitionInfo, FxBuildHasher>,

    /// `(name, arity)` -> `DefId`, for simple and qualified names
    by_name: DashMap<(Atom, u32), DefId, FxBuildHasher>,

    /// Next available `DefId`
    next_id: AtomicU32,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    /// Create a new definition store.
    pub fn new() -> Self {
        Self {
            definitions: DashMap::with_hasher(FxBuildHasher),
            by_name: DashMap::with_hasher(FxBuildHasher),
            next_id: AtomicU32::new(DefId::FIRST_VALID),
        }
    }

    /// Allocate a fresh `DefId`.
    fn allocate(&self) -> DefId {
        DefId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Register a new definition and return its `DefId`.
    ///
    /// `qualified` is the namespace-qualified name, indexed next to the
    /// simple name when present.
    pub fn register(&self, info: DefinitionInfo, qualified: Option<Atom>) -> DefId {
        let id = self.allocate();
        trace!(
            def_id = %id.0,
            kind = ?info.kind,
            arity = info.type_params.len(),
            "DefinitionStore::register"
        );
        let arity = info.type_params.len() as u32;
        self.by_name.insert((info.name, arity), id);
        if let Some(qualified) = qualified {
            self.by_name.insert((qualified, arity), id);
        }
        self.definitions.insert(id, info);
        id
    }

    /// Replace a definition registered earlier (second phase of building).
    ///
    /// The name and arity index is left untouched.
    pub fn replace(&self, id: DefId, info: DefinitionInfo) -> bool {
        match self.definitions.get_mut(&id) {
            Some(mut entry) => {
                trace!(def_id = %id.0, members = info.members.len(), "DefinitionStore::replace");
                *entry = info;
                true
            }
            None => false,
        }
    }

    /// Get definition info by `DefId`.
    pub fn get(&self, id: DefId) -> Option<DefinitionInfo> {
        self.definitions.get(&id).map(|r| r.clone())
    }

    /// Check if a `DefId` exists.
    pub fn contains(&self, id: DefId) -> bool {
        self.definitions.contains_key(&id)
    }

    /// Find a definition by simple or qualified name and arity.
    pub fn find(&self, name: Atom, arity: u32) -> Option<DefId> {
        self.by_name.get(&(name, arity)).map(|r| *r)
    }

    /// All arities registered under a name.
    pub fn arities_of(&self, name: Atom) -> Vec<u32> {
        let mut arities: Vec<u32> = self
            .by_name
            .iter()
            .filter(|entry| entry.key().0 == name)
            .map(|entry| entry.key().1)
            .collect();
        arities.sort_unstable();
        arities.dedup();
        arities
    }

    /// Get the kind of a definition.
    pub fn get_kind(&self, id: DefId) -> Option<DefKind> {
        self.definitions.get(&id).map(|r| r.kind)
    }

    /// Get the simple name of a definition.
    pub fn get_name(&self, id: DefId) -> Option<Atom> {
        self.definitions.get(&id).map(|r| r.name)
    }

    /// Get the namespace of a definition.
    pub fn get_namespace(&self, id: DefId) -> Option<Atom> {
        self.definitions.get(&id).map(|r| r.namespace)
    }

    /// Get the generic parameters of a definition.
    pub fn get_type_params(&self, id: DefId) -> Option<Vec<TypeParamInfo>> {
        self.definitions.get(&id).map(|r| r.type_params.clone())
    }

    /// Number of generic parameters (0 for unknown definitions).
    pub fn get_arity(&self, id: DefId) -> usize {
        self.definitions
            .get(&id)
            .map(|r| r.type_params.len())
            .unwrap_or(0)
    }

    /// Get the declared base type.
    pub fn get_extends(&self, id: DefId) -> Option<TypeId> {
        self.definitions.get(&id).and_then(|r| r.extends)
    }

    /// Get the declared interfaces.
    pub fn get_implements(&self, id: DefId) -> Option<Vec<TypeId>> {
        self.definitions.get(&id).map(|r| r.implements.clone())
    }

    /// Get the declared members.
    pub fn get_members(&self, id: DefId) -> Vec<Arc<MemberInfo>> {
        self.definitions
            .get(&id)
            .map(|r| r.members.clone())
            .unwrap_or_default()
    }

    /// Get one declared member.
    pub fn get_member(&self, id: MemberId) -> Option<Arc<MemberInfo>> {
        self.definitions
            .get(&id.owner)
            .and_then(|r| r.members.get(id.index as usize).cloned())
    }

    /// Set the base type.
    pub fn set_extends(&self, id: DefId, parent: TypeId) {
        if let Some(mut def) = self.definitions.get_mut(&id) {
            def.extends = Some(parent);
        }
    }

    /// Append to the declared interfaces.
    pub fn add_implements(&self, id: DefId, interface: TypeId) {
        if let Some(mut def) = self.definitions.get_mut(&id) {
            if !def.implements.contains(&interface) {
                def.implements.push(interface);
            }
        }
    }

    /// Append a member, returning its id.
    pub fn add_member(&self, id: DefId, member: MemberInfo) -> Option<MemberId> {
        let mut def = self.definitions.get_mut(&id)?;
        let index = def.members.len() as u32;
        def.members.push(Arc::new(member));
        Some(MemberId { owner: id, index })
    }

    /// All registered ids, ascending.
    pub fn all_ids(&self) -> Vec<DefId> {
        let mut ids: Vec<DefId> = self.definitions.iter().map(|r| *r.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
#[path = "../tests/def_tests.rs"]
mod tests;
