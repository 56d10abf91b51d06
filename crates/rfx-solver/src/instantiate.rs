//! Generic type instantiation and substitution.
//!
//! Substitution replaces the parameters of one owner (a type definition or a
//! generic method) with concrete or other open types. A generic definition
//! used as a type (`Nominal(def)` with parameters) stands for `def<params>`,
//! so substituting `def`'s own parameters turns it into an application.

use crate::db::TypeDatabase;
use crate::def::DefId;
use crate::error::{ReflectError, Result};
use crate::format::TypeFormatter;
use crate::inheritance::structurally_inherits;
use crate::types::{MemberId, ParamOwner, ParamRef, TypeData, TypeId, TypeList};
use rustc_hash::FxHashMap;
use tracing::trace;

/// Parameters of one owner mapped positionally to arguments.
#[derive(Clone, Copy, Debug)]
pub struct Substitution<'a> {
    owner: ParamOwner,
    args: &'a [TypeId],
}

impl<'a> Substitution<'a> {
    pub fn new(owner: ParamOwner, args: &'a [TypeId]) -> Self {
        Self { owner, args }
    }

    /// Substitution for the parameters of a type definition.
    pub fn for_type(def: DefId, args: &'a [TypeId]) -> Self {
        Self::new(ParamOwner::Type(def), args)
    }

    /// Substitution for the parameters of a generic method.
    pub fn for_method(member: MemberId, args: &'a [TypeId]) -> Self {
        Self::new(ParamOwner::Method(member), args)
    }

    fn get(&self, param: ParamRef) -> Option<TypeId> {
        if param.owner == self.owner {
            self.args.get(param.index as usize).copied()
        } else {
            None
        }
    }
}

/// Parameter handles of a definition, in order. Empty for non-generic ones.
pub fn own_type_params(db: &dyn TypeDatabase, def: DefId) -> TypeList {
    (0..db.definitions().get_arity(def) as u32)
        .map(|i| db.param(ParamOwner::Type(def), i))
        .collect()
}

/// Rebuild `ty` with every parameter mapped through `f` (unmapped ones stay).
pub fn map_params(
    db: &dyn TypeDatabase,
    ty: TypeId,
    f: &dyn Fn(ParamRef) -> Option<TypeId>,
) -> TypeId {
    match db.lookup(ty) {
        Some(TypeData::Param(param)) => f(param).unwrap_or(ty),
        Some(TypeData::Application { def, args }) => {
            let mapped: TypeList = args.iter().map(|&arg| map_params(db, arg, f)).collect();
            if mapped == args {
                ty
            } else {
                db.application(def, &mapped)
            }
        }
        Some(TypeData::Nominal(def)) => {
            let own = own_type_params(db, def);
            if own.is_empty() {
                return ty;
            }
            let mapped: TypeList = own.iter().map(|&arg| map_params(db, arg, f)).collect();
            if mapped == own {
                ty
            } else {
                db.application(def, &mapped)
            }
        }
        Some(TypeData::Array(element)) => {
            let mapped = map_params(db, element, f);
            if mapped == element {
                ty
            } else {
                db.array(mapped)
            }
        }
        Some(TypeData::Void) | None => ty,
    }
}

/// Apply a positional substitution.
pub fn instantiate(db: &dyn TypeDatabase, ty: TypeId, subst: &Substitution<'_>) -> TypeId {
    if subst.args.is_empty() {
        return ty;
    }
    map_params(db, ty, &|param| subst.get(param))
}

/// Apply a parameter -> type map.
pub fn substitute(
    db: &dyn TypeDatabase,
    ty: TypeId,
    bindings: &FxHashMap<ParamRef, TypeId>,
) -> TypeId {
    if bindings.is_empty() {
        return ty;
    }
    map_params(db, ty, &|param| bindings.get(&param).copied())
}

/// Whether `ty` mentions any free generic parameter.
pub fn contains_params(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    match db.lookup(ty) {
        Some(TypeData::Param(_)) => true,
        Some(TypeData::Application { args, .. }) => {
            args.iter().any(|&arg| contains_params(db, arg))
        }
        Some(TypeData::Nominal(def)) => db.definitions().get_arity(def) > 0,
        Some(TypeData::Array(element)) => contains_params(db, element),
        Some(TypeData::Void) | None => false,
    }
}

/// Free parameters of `ty`, in first-occurrence order.
pub fn collect_params(db: &dyn TypeDatabase, ty: TypeId, out: &mut Vec<ParamRef>) {
    match db.lookup(ty) {
        Some(TypeData::Param(param)) => {
            if !out.contains(&param) {
                out.push(param);
            }
        }
        Some(TypeData::Application { args, .. }) => {
            for arg in args {
                collect_params(db, arg, out);
            }
        }
        Some(TypeData::Nominal(def)) => {
            for arg in own_type_params(db, def) {
                collect_params(db, arg, out);
            }
        }
        Some(TypeData::Array(element)) => collect_params(db, element, out),
        Some(TypeData::Void) | None => {}
    }
}

/// Close a generic definition over `args` (MakeGenericType).
///
/// Each argument is checked against its parameter's constraints, after
/// substituting `args` into the constraint. A pair is only checked when both
/// the argument and the substituted constraint are closed; open pairs are
/// checked again when they are closed later.
pub fn make_generic_type(db: &dyn TypeDatabase, definition: TypeId, args: &[TypeId]) -> Result<TypeId> {
    let fmt = TypeFormatter::new(db);
    let def = match db.lookup(definition) {
        Some(TypeData::Nominal(def)) if db.definitions().get_arity(def) > 0 => def,
        _ => {
            return Err(ReflectError::NotGenericDefinition {
                ty: fmt.format(definition),
            });
        }
    };
    let params = db.definitions().get_type_params(def).unwrap_or_default();
    if params.len() != args.len() {
        return Err(ReflectError::GenericArityMismatch {
            ty: fmt.format(definition),
            expected: params.len(),
            actual: args.len(),
        });
    }

    let subst = Substitution::for_type(def, args);
    for (param, &arg) in params.iter().zip(args) {
        if contains_params(db, arg) {
            continue;
        }
        for &constraint in &param.constraints {
            let constraint = instantiate(db, constraint, &subst);
            if contains_params(db, constraint) {
                continue;
            }
            if !structurally_inherits(db, arg, constraint) {
                return Err(ReflectError::ConstraintViolation {
                    ty: fmt.format(definition),
                    param: db.resolve_atom(param.name).to_string(),
                    argument: fmt.format(arg),
                    constraint: fmt.format(constraint),
                });
            }
        }
    }

    let closed = db.application(def, args);
    trace!(def = def.0, closed = closed.0, "make_generic_type");
    Ok(closed)
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod tests;
