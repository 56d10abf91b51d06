//! Member locator.
//!
//! `find_members` enumerates the members visible on a type (its own, then
//! its base chain's, with signatures substituted for generic instantiations)
//! and filters them by kind, name, static flag, visibility, generic method
//! arguments and parameter shape. `find_member` additionally requires the
//! result to be unique: overloads are never disambiguated by guessing.
//!
//! ## Name matching
//!
//! Explicit interface implementations are stored under qualified names
//! (`ICollection<KeyValuePair<TKey, TValue>>.IsReadOnly`). A query for
//! `IsReadOnly` matches the part after the last `.`, and the public filter
//! treats such a member as public when it occupies a fresh slot.

use crate::db::TypeDatabase;
use crate::def::MemberInfo;
use crate::error::{ReflectError, Result};
use crate::format::TypeFormatter;
use crate::graph::{base_types, check_known, generic_arguments};
use crate::inheritance::structurally_inherits;
use crate::instantiate::{Substitution, contains_params, instantiate};
use crate::types::{MemberId, MemberKind, ParamOwner, TypeId, TypeList, Visibility};
use bitflags::bitflags;
use rfx_common::interner::Atom;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::trace;

// =============================================================================
// MemberKinds
// =============================================================================

bitflags! {
    /// Set of member kinds a query accepts.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct MemberKinds: u8 {
        const FIELD = 1 << 0;
        const PROPERTY = 1 << 1;
        const METHOD = 1 << 2;
        const CONSTRUCTOR = 1 << 3;
        const PROPERTY_OR_FIELD = Self::FIELD.bits() | Self::PROPERTY.bits();
        const ALL = Self::FIELD.bits()
            | Self::PROPERTY.bits()
            | Self::METHOD.bits()
            | Self::CONSTRUCTOR.bits();
    }
}

impl MemberKinds {
    pub const fn of(kind: MemberKind) -> Self {
        match kind {
            MemberKind::Field => Self::FIELD,
            MemberKind::Property => Self::PROPERTY,
            MemberKind::Method => Self::METHOD,
            MemberKind::Constructor => Self::CONSTRUCTOR,
        }
    }

    /// Label used in not-found and ambiguity errors.
    pub fn label(self) -> &'static str {
        if self == Self::PROPERTY_OR_FIELD {
            "property or field"
        } else if self == Self::FIELD {
            "field"
        } else if self == Self::PROPERTY {
            "property"
        } else if self == Self::METHOD {
            "method"
        } else if self == Self::CONSTRUCTOR {
            "constructor"
        } else {
            "member"
        }
    }
}

// =============================================================================
// MemberQuery
// =============================================================================

/// Filters of a member lookup.
///
/// Defaults: any name, all kinds, case-sensitive, public, instance members,
/// non-generic methods only, any shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberQuery {
    pub name: Option<String>,
    pub kinds: MemberKinds,
    pub ignore_case: bool,
    pub public_only: bool,
    pub is_static: bool,
    pub require_public_setter: bool,
    /// Method type arguments; `None` entries (or `VOID`) are wildcards.
    /// Absent or empty selects non-generic methods only.
    pub generic_args: Option<Vec<Option<TypeId>>>,
    /// Parameter types followed by the result type (declaring type for
    /// constructors, value type for fields and properties).
    pub shape: Option<Vec<Option<TypeId>>>,
}

impl Default for MemberQuery {
    fn default() -> Self {
        Self {
            name: None,
            kinds: MemberKinds::ALL,
            ignore_case: false,
            public_only: true,
            is_static: false,
            require_public_setter: false,
            generic_args: None,
            shape: None,
        }
    }
}

impl MemberQuery {
    /// Members named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Any member name.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn constructors() -> Self {
        Self {
            kinds: MemberKinds::CONSTRUCTOR,
            ..Self::default()
        }
    }

    pub fn kinds(mut self, kinds: MemberKinds) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// Include non-public members.
    pub fn non_public(mut self) -> Self {
        self.public_only = false;
        self
    }

    pub fn static_members(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn require_public_setter(mut self) -> Self {
        self.require_public_setter = true;
        self
    }

    pub fn with_generic_args(mut self, args: Vec<Option<TypeId>>) -> Self {
        self.generic_args = Some(args);
        self
    }

    /// `arity` wildcard method type arguments.
    pub fn with_generic_arity(self, arity: usize) -> Self {
        self.with_generic_args(vec![None; arity])
    }

    pub fn with_shape(mut self, shape: Vec<Option<TypeId>>) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Exactly `param_count` parameters, any types, any result.
    pub fn with_wildcard_shape(self, param_count: usize) -> Self {
        self.with_shape(vec![None; param_count + 1])
    }

    fn name_matches(&self, member_name: &str) -> bool {
        let Some(name) = &self.name else {
            return true;
        };
        let eq = |a: &str, b: &str| {
            if self.ignore_case {
                a.to_lowercase() == b.to_lowercase()
            } else {
                a == b
            }
        };
        if eq(member_name, name) {
            return true;
        }
        match member_name.rfind('.') {
            Some(dot) => eq(&member_name[dot + 1..], name),
            None => false,
        }
    }

    fn describe_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None if self.kinds == MemberKinds::CONSTRUCTOR => ".ctor".to_string(),
            None => "*".to_string(),
        }
    }
}

// =============================================================================
// MemberDescriptor
// =============================================================================

/// A member as seen from the queried type.
#[derive(Clone, Debug)]
pub struct MemberDescriptor {
    pub id: MemberId,
    pub kind: MemberKind,
    /// The queried type.
    pub reflected_type: TypeId,
    /// The (instantiated) type declaring the member.
    pub declaring_type: TypeId,
    pub name: Atom,
    pub visibility: Visibility,
    pub is_static: bool,
    pub new_slot: bool,
    /// Parameter types, substituted.
    pub params: TypeList,
    /// Field/property type or method return type, substituted.
    pub value_type: TypeId,
    /// Number of method type parameters.
    pub generic_arity: usize,
    /// Bound method type arguments; empty for a generic method definition.
    pub method_type_args: TypeList,
    pub info: Arc<MemberInfo>,
}

impl MemberDescriptor {
    /// Parameters followed by the result: the declaring type for
    /// constructors, the value type otherwise.
    pub fn signature(&self) -> TypeList {
        let mut sig = self.params.clone();
        sig.push(match self.kind {
            MemberKind::Constructor => self.declaring_type,
            _ => self.value_type,
        });
        sig
    }

    pub fn is_generic_method_definition(&self) -> bool {
        self.generic_arity > 0 && self.method_type_args.is_empty()
    }

    /// Whether any part of the signature is still open.
    pub fn contains_generic_parameters(&self, db: &dyn TypeDatabase) -> bool {
        self.is_generic_method_definition()
            || contains_params(db, self.declaring_type)
            || self.signature().iter().any(|&ty| contains_params(db, ty))
    }

    pub fn display(&self, db: &dyn TypeDatabase) -> String {
        let fmt = TypeFormatter::new(db);
        let name = db.resolve_atom(self.name);
        match self.kind {
            MemberKind::Field | MemberKind::Property => format!(
                "{} {}.{}",
                fmt.format(self.value_type),
                fmt.format(self.declaring_type),
                name
            ),
            MemberKind::Method => {
                let type_args = if self.method_type_args.is_empty() {
                    String::new()
                } else {
                    format!("<{}>", fmt.format_list(&self.method_type_args))
                };
                format!(
                    "{} {}.{}{}({})",
                    fmt.format(self.value_type),
                    fmt.format(self.declaring_type),
                    name,
                    type_args,
                    fmt.format_list(&self.params)
                )
            }
            MemberKind::Constructor => format!(
                "{}({})",
                fmt.format(self.declaring_type),
                fmt.format_list(&self.params)
            ),
        }
    }
}

// =============================================================================
// Enumeration and filtering
// =============================================================================

/// Every member visible on `ty` before filtering: own members first, then
/// the base chain's. Constructors come from `ty` only, and a base member
/// with the same kind, name, generic arity and parameter list as a derived
/// one is hidden.
fn visible_members(db: &dyn TypeDatabase, ty: TypeId, kinds: MemberKinds) -> Vec<MemberDescriptor> {
    let mut levels = vec![ty];
    levels.extend(base_types(db, ty));

    let mut hidden: FxHashSet<(MemberKind, Atom, usize, TypeList)> = FxHashSet::default();
    let mut out = Vec::new();
    for (depth, &level) in levels.iter().enumerate() {
        let Some(def) = db.def_of(level) else {
            continue;
        };
        let args = generic_arguments(db, level);
        let subst = Substitution::for_type(def, &args);
        for (index, info) in db.definitions().get_members(def).into_iter().enumerate() {
            let kind = info.kind();
            if !kinds.contains(MemberKinds::of(kind)) {
                continue;
            }
            if kind == MemberKind::Constructor && depth > 0 {
                continue;
            }
            let params: TypeList = info
                .param_types()
                .map(|p| instantiate(db, p, &subst))
                .collect();
            if !hidden.insert((kind, info.name, info.type_params.len(), params.clone())) {
                continue;
            }
            out.push(MemberDescriptor {
                id: MemberId {
                    owner: def,
                    index: index as u32,
                },
                kind,
                reflected_type: ty,
                declaring_type: level,
                name: info.name,
                visibility: info.visibility,
                is_static: info.is_static,
                new_slot: info.new_slot,
                params,
                value_type: instantiate(db, info.value_type, &subst),
                generic_arity: info.type_params.len(),
                method_type_args: TypeList::new(),
                info,
            });
        }
    }
    out
}

fn passes_visibility(query: &MemberQuery, member: &MemberDescriptor, name: &str) -> bool {
    if !query.public_only {
        return match member.kind {
            MemberKind::Property if query.require_public_setter => member.info.setter().is_some(),
            _ => true,
        };
    }
    let explicit_interface = name.contains('.') && member.new_slot;
    let public = match member.kind {
        MemberKind::Property => {
            let getter = member
                .info
                .getter()
                .is_some_and(|g| g.visibility.is_public());
            let setter = !query.require_public_setter
                || member
                    .info
                    .setter()
                    .is_some_and(|s| s.visibility.is_public());
            getter && setter
        }
        _ => member.visibility.is_public(),
    };
    public || explicit_interface
}

/// Apply the method type-argument filter. Returns the (possibly closed)
/// member, or `None` when it doesn't match.
fn close_generic_method(
    db: &dyn TypeDatabase,
    query: &MemberQuery,
    mut member: MemberDescriptor,
) -> Option<MemberDescriptor> {
    let requested = query.generic_args.as_deref().unwrap_or(&[]);
    if requested.is_empty() {
        return (member.generic_arity == 0).then_some(member);
    }
    if member.kind != MemberKind::Method || member.generic_arity != requested.len() {
        return None;
    }
    let is_wildcard = |arg: &Option<TypeId>| arg.is_none_or(TypeId::is_void);
    if requested.iter().all(is_wildcard) {
        return Some(member);
    }

    let owner = ParamOwner::Method(member.id);
    let args: TypeList = requested
        .iter()
        .enumerate()
        .map(|(i, arg)| match arg {
            Some(ty) if !ty.is_void() => *ty,
            _ => db.param(owner, i as u32),
        })
        .collect();

    let type_args = generic_arguments(db, member.declaring_type);
    let type_subst = Substitution::for_type(member.id.owner, &type_args);
    let method_subst = Substitution::for_method(member.id, &args);
    for (param, &arg) in member.info.type_params.iter().zip(&args) {
        if contains_params(db, arg) {
            continue;
        }
        for &constraint in &param.constraints {
            let constraint = instantiate(db, instantiate(db, constraint, &type_subst), &method_subst);
            if contains_params(db, constraint) {
                continue;
            }
            if !structurally_inherits(db, arg, constraint) {
                trace!(
                    member = ?member.id,
                    arg = arg.0,
                    constraint = constraint.0,
                    "find_members: method type argument violates constraint"
                );
                return None;
            }
        }
    }

    member.params = member
        .params
        .iter()
        .map(|&p| instantiate(db, p, &method_subst))
        .collect();
    member.value_type = instantiate(db, member.value_type, &method_subst);
    member.method_type_args = args;
    Some(member)
}

fn passes_shape(query: &MemberQuery, member: &MemberDescriptor) -> bool {
    let Some(shape) = &query.shape else {
        return true;
    };
    let sig = member.signature();
    sig.len() == shape.len()
        && sig.iter().zip(shape).all(|(&actual, expected)| match expected {
            None => true,
            Some(expected) => expected.is_void() || *expected == actual,
        })
}

/// All members of `ty` matching `query`.
pub fn find_members(
    db: &dyn TypeDatabase,
    ty: TypeId,
    query: &MemberQuery,
) -> Result<Vec<MemberDescriptor>> {
    check_known(db, ty)?;
    if query.name.as_deref() == Some("") {
        return Err(ReflectError::InvalidArgument(
            "member name must not be empty".to_string(),
        ));
    }

    let candidates = visible_members(db, ty, query.kinds);
    let total = candidates.len();
    let mut found = Vec::new();
    for member in candidates {
        if member.is_static != query.is_static {
            continue;
        }
        let name = db.resolve_atom(member.name);
        if !query.name_matches(&name) {
            continue;
        }
        if !passes_visibility(query, &member, &name) {
            continue;
        }
        // Indexers take parameters and aren't addressable by name.
        if member.kind == MemberKind::Property && !member.params.is_empty() {
            continue;
        }
        let Some(member) = close_generic_method(db, query, member) else {
            continue;
        };
        if !passes_shape(query, &member) {
            continue;
        }
        found.push(member);
    }
    trace!(ty = ty.0, candidates = total, matched = found.len(), "find_members");
    Ok(found)
}

/// The unique member of `ty` matching `query`.
pub fn find_member(db: &dyn TypeDatabase, ty: TypeId, query: &MemberQuery) -> Result<MemberDescriptor> {
    let mut found = find_members(db, ty, query)?;
    match found.len() {
        1 => Ok(found.remove(0)),
        0 => Err(ReflectError::MemberNotFound {
            ty: TypeFormatter::new(db).format(ty),
            kind: query.kinds.label(),
            name: query.describe_name(),
        }),
        count => Err(ReflectError::AmbiguousMember {
            ty: TypeFormatter::new(db).format(ty),
            kind: query.kinds.label(),
            name: query.describe_name(),
            count,
        }),
    }
}

// =============================================================================
// Convenience lookups
// =============================================================================

/// Public instance property or field named `name`, case-insensitive.
/// Properties and fields are pooled before requiring a unique match.
pub fn instance_property_or_field(
    db: &dyn TypeDatabase,
    ty: TypeId,
    name: &str,
) -> Result<MemberDescriptor> {
    let query = MemberQuery::new(name)
        .kinds(MemberKinds::PROPERTY_OR_FIELD)
        .ignore_case(true);
    find_member(db, ty, &query)
}

/// Public static property or field named `name`, case-insensitive.
pub fn static_property_or_field(
    db: &dyn TypeDatabase,
    ty: TypeId,
    name: &str,
) -> Result<MemberDescriptor> {
    let query = MemberQuery::new(name)
        .kinds(MemberKinds::PROPERTY_OR_FIELD)
        .ignore_case(true)
        .static_members();
    find_member(db, ty, &query)
}

/// Public non-generic instance method, optionally filtered by shape.
pub fn instance_method(
    db: &dyn TypeDatabase,
    ty: TypeId,
    name: &str,
    shape: Option<&[Option<TypeId>]>,
) -> Result<MemberDescriptor> {
    let mut query = MemberQuery::new(name).kinds(MemberKinds::METHOD);
    query.shape = shape.map(<[_]>::to_vec);
    find_member(db, ty, &query)
}

/// Public non-generic static method, optionally filtered by shape.
pub fn static_method(
    db: &dyn TypeDatabase,
    ty: TypeId,
    name: &str,
    shape: Option<&[Option<TypeId>]>,
) -> Result<MemberDescriptor> {
    let mut query = MemberQuery::new(name)
        .kinds(MemberKinds::METHOD)
        .static_members();
    query.shape = shape.map(<[_]>::to_vec);
    find_member(db, ty, &query)
}

/// Public constructor of `ty` taking exactly `params`.
pub fn constructor(db: &dyn TypeDatabase, ty: TypeId, params: &[TypeId]) -> Result<MemberDescriptor> {
    let mut shape: Vec<Option<TypeId>> = params.iter().copied().map(Some).collect();
    shape.push(Some(ty));
    find_member(db, ty, &MemberQuery::constructors().with_shape(shape))
}

#[cfg(test)]
#[path = "../tests/lookup_tests.rs"]
mod tests;
