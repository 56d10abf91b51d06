//! Type graph accessor: base chains, interface sets and descriptors.
//!
//! Everything here is computed from the definition store on each call.
//! Signatures of a generic instantiation are the definition's declared
//! signatures with the instantiation's arguments substituted.
//!
//! Generic parameters take part in the graph through their constraints:
//! the base type of `T : V` is `V`, an unconstrained parameter derives
//! from `Object`, and interface constraints are the parameter's interfaces.

use crate::db::TypeDatabase;
use crate::def::{DefId, DefKind};
use crate::error::{ReflectError, Result};
use crate::format::TypeFormatter;
use crate::instantiate::{Substitution, instantiate, own_type_params};
use crate::types::{ParamOwner, ParamRef, TypeData, TypeId, TypeList, TypeParamInfo};
use rustc_hash::FxHashSet;
use serde::Serialize;

// =============================================================================
// Type classification
// =============================================================================

/// Declared info of a generic parameter.
pub fn param_info(db: &dyn TypeDatabase, param: ParamRef) -> Option<TypeParamInfo> {
    let index = param.index as usize;
    match param.owner {
        ParamOwner::Type(def) => db.definitions().get_type_params(def)?.get(index).cloned(),
        ParamOwner::Method(member) => db
            .definitions()
            .get_member(member)?
            .type_params
            .get(index)
            .cloned(),
    }
}

/// The parameter behind `ty`, if `ty` is a free parameter.
pub fn as_param(db: &dyn TypeDatabase, ty: TypeId) -> Option<ParamRef> {
    match db.lookup(ty)? {
        TypeData::Param(param) => Some(param),
        _ => None,
    }
}

pub fn is_generic_parameter(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    as_param(db, ty).is_some()
}

/// A generic definition: a nominal type whose arguments are its own parameters.
pub fn is_generic_definition(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    match db.lookup(ty) {
        Some(TypeData::Nominal(def)) => db.definitions().get_arity(def) > 0,
        _ => false,
    }
}

/// A generic definition or an instantiation of one.
pub fn is_generic(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    match db.lookup(ty) {
        Some(TypeData::Application { .. }) => true,
        Some(TypeData::Nominal(def)) => db.definitions().get_arity(def) > 0,
        _ => false,
    }
}

/// The generic definition `ty` instantiates (itself for a definition).
pub fn generic_definition(db: &dyn TypeDatabase, ty: TypeId) -> Option<TypeId> {
    match db.lookup(ty)? {
        TypeData::Application { def, .. } => Some(db.nominal(def)),
        TypeData::Nominal(def) if db.definitions().get_arity(def) > 0 => Some(ty),
        _ => None,
    }
}

/// Generic arguments of `ty`; a definition's arguments are its own parameters.
pub fn generic_arguments(db: &dyn TypeDatabase, ty: TypeId) -> TypeList {
    match db.lookup(ty) {
        Some(TypeData::Application { args, .. }) => args,
        Some(TypeData::Nominal(def)) => own_type_params(db, def),
        _ => TypeList::new(),
    }
}

pub fn is_interface(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    db.def_kind(ty).is_some_and(DefKind::is_interface)
}

/// Structs and primitives. Parameters and arrays are not value types.
pub fn is_value_type(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    db.def_kind(ty).is_some_and(DefKind::is_value_type)
}

/// Reject handles this database never produced.
pub fn check_known(db: &dyn TypeDatabase, ty: TypeId) -> Result<()> {
    if db.types().contains(ty) {
        Ok(())
    } else {
        Err(ReflectError::InvalidArgument(format!(
            "unknown type id #{}",
            ty.0
        )))
    }
}

// =============================================================================
// Bases and interfaces
// =============================================================================

/// `(def, args)` of a nominal type or application, with the definition's own
/// parameters standing in for a generic definition's arguments.
fn nominal_parts(db: &dyn TypeDatabase, ty: TypeId) -> Option<(DefId, TypeList)> {
    match db.lookup(ty)? {
        TypeData::Nominal(def) => Some((def, TypeList::new())),
        TypeData::Application { def, args } => Some((def, args)),
        _ => None,
    }
}

/// Direct base type.
pub fn base_type(db: &dyn TypeDatabase, ty: TypeId) -> Option<TypeId> {
    match db.lookup(ty)? {
        TypeData::Void => None,
        TypeData::Param(param) => {
            let info = param_info(db, param)?;
            let class_like = info
                .constraints
                .iter()
                .copied()
                .find(|&c| !is_interface(db, c));
            Some(class_like.unwrap_or(TypeId::OBJECT))
        }
        TypeData::Array(_) => Some(TypeId::ARRAY),
        TypeData::Nominal(_) | TypeData::Application { .. } => {
            let (def, args) = nominal_parts(db, ty)?;
            let base = db.definitions().get_extends(def)?;
            Some(instantiate(db, base, &Substitution::for_type(def, &args)))
        }
    }
}

/// Transitive base chain, nearest first.
pub fn base_types(db: &dyn TypeDatabase, ty: TypeId) -> Vec<TypeId> {
    let mut chain = Vec::new();
    let mut seen = FxHashSet::default();
    seen.insert(ty);
    let mut current = ty;
    while let Some(base) = base_type(db, current) {
        if !seen.insert(base) {
            break;
        }
        chain.push(base);
        current = base;
    }
    chain
}

/// Interfaces declared directly on `ty` (substituted). For a parameter, its
/// interface constraints.
pub fn declared_interfaces(db: &dyn TypeDatabase, ty: TypeId) -> Vec<TypeId> {
    match db.lookup(ty) {
        Some(TypeData::Param(param)) => param_info(db, param)
            .map(|info| {
                info.constraints
                    .into_iter()
                    .filter(|&c| is_interface(db, c))
                    .collect()
            })
            .unwrap_or_default(),
        Some(TypeData::Nominal(_)) | Some(TypeData::Application { .. }) => {
            let Some((def, args)) = nominal_parts(db, ty) else {
                return Vec::new();
            };
            let subst = Substitution::for_type(def, &args);
            db.definitions()
                .get_implements(def)
                .unwrap_or_default()
                .into_iter()
                .map(|iface| instantiate(db, iface, &subst))
                .collect()
        }
        _ => Vec::new(),
    }
}

/// Transitive, de-duplicated interface set of `ty`: declared interfaces of
/// `ty` and of its base chain, plus everything those interfaces extend.
/// Parameters also pick up the interfaces of all their constraints.
pub fn interfaces(db: &dyn TypeDatabase, ty: TypeId) -> Vec<TypeId> {
    let mut seen = FxHashSet::default();
    let mut result = Vec::new();
    let mut worklist: Vec<TypeId> = Vec::new();

    let mut roots = vec![ty];
    roots.extend(base_types(db, ty));
    if let Some(info) = as_param(db, ty).and_then(|p| param_info(db, p)) {
        roots.extend(info.constraints.iter().copied().filter(|&c| !is_interface(db, c)));
    }

    let mut visited_roots = FxHashSet::default();
    let mut root_index = 0;
    while root_index < roots.len() {
        let root = roots[root_index];
        root_index += 1;
        if !visited_roots.insert(root) {
            continue;
        }
        // Other parameter constraints (`T : U`) contribute U's interfaces.
        if root != ty {
            if let Some(info) = as_param(db, root).and_then(|p| param_info(db, p)) {
                roots.extend(base_types(db, root));
                roots.extend(info.constraints.iter().copied().filter(|&c| !is_interface(db, c)));
            }
        }
        let mut declared = declared_interfaces(db, root);
        declared.reverse();
        worklist.extend(declared);
        while let Some(iface) = worklist.pop() {
            if !seen.insert(iface) {
                continue;
            }
            result.push(iface);
            let mut parents = declared_interfaces(db, iface);
            parents.reverse();
            worklist.extend(parents);
        }
    }
    result
}

/// Base chain followed by interfaces, without duplicates.
///
/// Parameters list every constraint (and the constraint's own ancestors) in
/// addition to their base chain.
pub fn inherit_types(db: &dyn TypeDatabase, ty: TypeId) -> Vec<TypeId> {
    let mut seen = FxHashSet::default();
    seen.insert(ty);
    let mut result = Vec::new();
    let mut push = |t: TypeId, result: &mut Vec<TypeId>| {
        if seen.insert(t) {
            result.push(t);
        }
    };

    for base in base_types(db, ty) {
        push(base, &mut result);
    }
    if is_generic_parameter(db, ty) {
        let mut pending = vec![ty];
        let mut expanded = FxHashSet::default();
        while let Some(param) = pending.pop() {
            if !expanded.insert(param) {
                continue;
            }
            let Some(info) = as_param(db, param).and_then(|p| param_info(db, p)) else {
                continue;
            };
            for constraint in info.constraints {
                if is_interface(db, constraint) {
                    continue;
                }
                push(constraint, &mut result);
                for base in base_types(db, constraint) {
                    push(base, &mut result);
                }
                if is_generic_parameter(db, constraint) {
                    pending.push(constraint);
                }
            }
        }
    }
    for iface in interfaces(db, ty) {
        push(iface, &mut result);
    }
    result
}

/// `ty` followed by `inherit_types(ty)`.
pub fn self_and_ancestors(db: &dyn TypeDatabase, ty: TypeId) -> Vec<TypeId> {
    let mut all = vec![ty];
    all.extend(inherit_types(db, ty));
    all
}

// =============================================================================
// TypeDescriptor
// =============================================================================

/// One generic argument position of a descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum GenericArgument {
    /// Still a free parameter.
    Free(TypeId),
    /// Bound to a type (which may itself be partially open).
    Bound(TypeId),
}

impl GenericArgument {
    pub fn ty(self) -> TypeId {
        match self {
            Self::Free(ty) | Self::Bound(ty) => ty,
        }
    }
}

/// Read-only view of a type's position in the graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeDescriptor {
    pub id: TypeId,
    pub name: String,
    pub kind: Option<DefKind>,
    pub is_generic_definition: bool,
    pub contains_generic_parameters: bool,
    pub generic_arguments: Vec<GenericArgument>,
    pub base_type: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
}

/// Describe a type; `InvalidArgument` for unknown handles.
pub fn describe(db: &dyn TypeDatabase, ty: TypeId) -> Result<TypeDescriptor> {
    check_known(db, ty)?;
    let generic_arguments = generic_arguments(db, ty)
        .into_iter()
        .map(|arg| {
            if is_generic_parameter(db, arg) {
                GenericArgument::Free(arg)
            } else {
                GenericArgument::Bound(arg)
            }
        })
        .collect();
    Ok(TypeDescriptor {
        id: ty,
        name: TypeFormatter::new(db).qualified().format(ty),
        kind: db.def_kind(ty),
        is_generic_definition: is_generic_definition(db, ty),
        contains_generic_parameters: crate::instantiate::contains_params(db, ty),
        generic_arguments,
        base_type: base_type(db, ty),
        interfaces: interfaces(db, ty),
    })
}

#[cfg(test)]
#[path = "../tests/graph_tests.rs"]
mod tests;
