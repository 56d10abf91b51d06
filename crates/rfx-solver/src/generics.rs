//! Generic argument extraction and inherited-instantiation resolution.
//!
//! Every query here must produce exactly one answer or fail: two ancestors
//! instantiating the same definition with different arguments, or a free
//! parameter implied to be two different types, is an ambiguity error.

use crate::db::TypeDatabase;
use crate::error::{ReflectError, Result};
use crate::format::TypeFormatter;
use crate::graph::{
    as_param, check_known, generic_arguments, generic_definition, is_generic,
    is_generic_definition, self_and_ancestors,
};
use crate::inheritance::InheritanceChecker;
use crate::instantiate::{collect_params, make_generic_type, substitute};
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::types::{ParamOwner, ParamRef, TypeData, TypeId, TypeList};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

fn require_generic_definition(db: &dyn TypeDatabase, definition: TypeId) -> Result<()> {
    check_known(db, definition)?;
    if is_generic_definition(db, definition) {
        Ok(())
    } else {
        Err(ReflectError::NotGenericDefinition {
            ty: TypeFormatter::new(db).format(definition),
        })
    }
}

/// `ty` and its ancestors that instantiate `definition`, without duplicates.
fn instantiating_ancestors(db: &dyn TypeDatabase, ty: TypeId, definition: TypeId) -> Vec<TypeId> {
    let def = db.def_of(definition);
    self_and_ancestors(db, ty)
        .into_iter()
        .filter(|&t| def.is_some() && db.def_of(t) == def)
        .collect()
}

// =============================================================================
// Extraction
// =============================================================================

/// Argument lists of every ancestor of `ty` (itself included) instantiating
/// `definition`. Identical lists collapse. `ty == definition` yields a
/// single empty list.
pub fn extract_generic_arguments(
    db: &dyn TypeDatabase,
    ty: TypeId,
    definition: TypeId,
) -> Result<Vec<TypeList>> {
    check_known(db, ty)?;
    require_generic_definition(db, definition)?;
    if ty == definition {
        return Ok(vec![TypeList::new()]);
    }

    let mut lists: Vec<TypeList> = Vec::new();
    for ancestor in instantiating_ancestors(db, ty, definition) {
        let args = generic_arguments(db, ancestor);
        if !lists.contains(&args) {
            lists.push(args);
        }
    }
    trace!(ty = ty.0, definition = definition.0, count = lists.len(), "extract_generic_arguments");
    Ok(lists)
}

/// The single argument list `ty` instantiates `definition` with.
pub fn require_unique_generic_arguments(
    db: &dyn TypeDatabase,
    ty: TypeId,
    definition: TypeId,
) -> Result<TypeList> {
    let mut lists = extract_generic_arguments(db, ty, definition)?.into_iter();
    let fmt = TypeFormatter::new(db);
    match (lists.next(), lists.next()) {
        (Some(args), None) => Ok(args),
        (None, _) => Err(ReflectError::NotRelated {
            ty: fmt.format(ty),
            target: fmt.format(definition),
        }),
        (Some(first), Some(second)) => Err(ReflectError::AmbiguousGenericArguments {
            ty: fmt.format(ty),
            target: fmt.format(definition),
            first: fmt.format_list(&first),
            second: fmt.format_list(&second),
        }),
    }
}

/// Ancestors of `ty` (itself included) that instantiate `definition`.
pub fn generic_instantiations(
    db: &dyn TypeDatabase,
    ty: TypeId,
    definition: TypeId,
) -> Result<Vec<TypeId>> {
    check_known(db, ty)?;
    require_generic_definition(db, definition)?;
    Ok(instantiating_ancestors(db, ty, definition))
}

/// The single instantiation of `definition` among `ty`'s ancestors.
pub fn require_unique_generic_instantiation(
    db: &dyn TypeDatabase,
    ty: TypeId,
    definition: TypeId,
) -> Result<TypeId> {
    let found = generic_instantiations(db, ty, definition)?;
    let fmt = TypeFormatter::new(db);
    match found.as_slice() {
        [single] => Ok(*single),
        [] => Err(ReflectError::NotRelated {
            ty: fmt.format(ty),
            target: fmt.format(definition),
        }),
        [first, second, ..] => Err(ReflectError::AmbiguousGenericArguments {
            ty: fmt.format(ty),
            target: fmt.format(definition),
            first: fmt.format(*first),
            second: fmt.format(*second),
        }),
    }
}

/// Whether some ancestor of `ty` instantiates `definition` with arguments
/// matching `pattern`. `None` (or `VOID`) skips a position.
pub fn inherits_generic_definition(
    db: &dyn TypeDatabase,
    ty: TypeId,
    definition: TypeId,
    pattern: &[Option<TypeId>],
) -> Result<bool> {
    check_known(db, ty)?;
    require_generic_definition(db, definition)?;
    let arity = generic_arguments(db, definition).len();
    if pattern.len() != arity {
        return Err(ReflectError::GenericArityMismatch {
            ty: TypeFormatter::new(db).format(definition),
            expected: arity,
            actual: pattern.len(),
        });
    }

    Ok(instantiating_ancestors(db, ty, definition)
        .into_iter()
        .any(|ancestor| {
            generic_arguments(db, ancestor)
                .iter()
                .zip(pattern)
                .all(|(&arg, expected)| match expected {
                    None => true,
                    Some(expected) => expected.is_void() || *expected == arg,
                })
        }))
}

/// Whether `candidate` satisfies the constraints of `param`, a parameter of
/// `generic_type`'s definition. Constraints naming sibling parameters are
/// resolved through `generic_type`'s arguments.
pub fn parameter_satisfied_by(
    db: &dyn TypeDatabase,
    candidate: TypeId,
    param: TypeId,
    generic_type: TypeId,
) -> Result<bool> {
    check_known(db, candidate)?;
    check_known(db, generic_type)?;
    let fmt = TypeFormatter::new(db);
    let Some(param_ref) = as_param(db, param) else {
        return Err(ReflectError::InvalidArgument(format!(
            "{} isn't a generic parameter",
            fmt.format(param)
        )));
    };
    if !is_generic(db, generic_type) {
        return Err(ReflectError::NotGeneric {
            ty: fmt.format(generic_type),
        });
    }
    let owner_matches = matches!(
        (param_ref.owner, db.def_of(generic_type)),
        (ParamOwner::Type(owner), Some(def)) if owner == def
    );
    if !owner_matches {
        return Err(ReflectError::InvalidArgument(format!(
            "{} isn't a generic parameter of {}",
            fmt.format(param),
            fmt.format(generic_type)
        )));
    }
    let args = generic_arguments(db, generic_type);
    Ok(InheritanceChecker::new(db).is_parameter_satisfied(candidate, param, &args))
}

// =============================================================================
// Inherited instantiation resolution
// =============================================================================

/// Bindings of `ty`'s free parameters implied by one inherited instantiation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenericBinding {
    /// Free parameters of the resolved type, in first-occurrence order.
    params: Vec<ParamRef>,
    bound: FxHashMap<ParamRef, TypeId>,
}

impl GenericBinding {
    /// Bound type of `param`, if any.
    pub fn get(&self, param: ParamRef) -> Option<TypeId> {
        self.bound.get(&param).copied()
    }

    /// Free parameters in first-occurrence order.
    pub fn params(&self) -> &[ParamRef] {
        &self.params
    }

    /// `(param, bound)` pairs in parameter order; unbound parameters are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (ParamRef, TypeId)> + '_ {
        self.params
            .iter()
            .filter_map(|&p| self.bound.get(&p).map(|&ty| (p, ty)))
    }

    pub fn bound_count(&self) -> usize {
        self.bound.len()
    }

    /// Parameters that stayed free.
    pub fn unbound(&self) -> impl Iterator<Item = ParamRef> + '_ {
        self.params.iter().copied().filter(|p| !self.bound.contains_key(p))
    }

    /// Substitute the bindings into `ty`.
    pub fn apply(&self, db: &dyn TypeDatabase, ty: TypeId) -> TypeId {
        substitute(db, ty, &self.bound)
    }
}

/// A free parameter implied to be two different types.
struct Conflict {
    param: ParamRef,
    first: TypeId,
    second: TypeId,
}

/// Structural unification of `pattern` (in terms of `free`) against `actual`.
/// `Ok(false)` means the concrete parts differ.
struct Unifier<'a> {
    db: &'a dyn TypeDatabase,
    free: &'a [ParamRef],
    bindings: FxHashMap<ParamRef, TypeId>,
    depth: DepthCounter,
}

impl<'a> Unifier<'a> {
    fn new(db: &'a dyn TypeDatabase, free: &'a [ParamRef]) -> Self {
        Self {
            db,
            free,
            bindings: FxHashMap::default(),
            depth: DepthCounter::with_profile(RecursionProfile::Unification),
        }
    }

    fn unify(&mut self, pattern: TypeId, actual: TypeId) -> std::result::Result<bool, Conflict> {
        if !self.depth.enter() {
            return Ok(false);
        }
        let result = self.unify_inner(pattern, actual);
        self.depth.leave();
        result
    }

    fn unify_inner(&mut self, pattern: TypeId, actual: TypeId) -> std::result::Result<bool, Conflict> {
        let db = self.db;
        if let Some(TypeData::Param(param)) = db.lookup(pattern) {
            if self.free.contains(&param) {
                return match self.bindings.get(&param) {
                    Some(&bound) if bound == actual => Ok(true),
                    Some(&bound) => Err(Conflict {
                        param,
                        first: bound,
                        second: actual,
                    }),
                    None => {
                        self.bindings.insert(param, actual);
                        Ok(true)
                    }
                };
            }
        }
        if pattern == actual {
            return Ok(true);
        }
        if let (Some(TypeData::Array(p)), Some(TypeData::Array(a))) =
            (db.lookup(pattern), db.lookup(actual))
        {
            return self.unify(p, a);
        }
        if !is_generic(db, pattern) || db.def_of(pattern) != db.def_of(actual) {
            return Ok(false);
        }
        let args = generic_arguments(db, pattern);
        let actual_args = generic_arguments(db, actual);
        if args.len() != actual_args.len() {
            return Ok(false);
        }
        for (&p, &a) in args.iter().zip(&actual_args) {
            if !self.unify(p, a)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Bindings for the free parameters of `ty` that make one of its ancestors
/// equal to `inherited`.
///
/// Candidates are the ancestors (`ty` included) instantiating `inherited`'s
/// definition that still mention free parameters. A candidate whose concrete
/// parts differ from `inherited` is discarded; a parameter implied twice
/// with different types is `AmbiguousBinding`; candidates disagreeing with
/// each other are `AmbiguousGenericArguments`.
pub fn resolve_inherited_bindings(
    db: &dyn TypeDatabase,
    ty: TypeId,
    inherited: TypeId,
) -> Result<GenericBinding> {
    check_known(db, ty)?;
    check_known(db, inherited)?;
    let fmt = TypeFormatter::new(db);
    for t in [ty, inherited] {
        if !is_generic(db, t) {
            return Err(ReflectError::NotGeneric { ty: fmt.format(t) });
        }
    }

    let own_args = generic_arguments(db, ty);
    let mut free = Vec::new();
    for &arg in &own_args {
        collect_params(db, arg, &mut free);
    }

    let inherited_def = db.def_of(inherited);
    let candidates: Vec<TypeId> = self_and_ancestors(db, ty)
        .into_iter()
        .filter(|&t| db.def_of(t) == inherited_def)
        .filter(|&t| {
            let mut params = Vec::new();
            collect_params(db, t, &mut params);
            params.iter().any(|p| free.contains(p))
        })
        .collect();
    trace!(
        ty = ty.0,
        inherited = inherited.0,
        candidates = candidates.len(),
        "resolve_inherited_bindings"
    );

    let mut resolved: Option<(TypeList, FxHashMap<ParamRef, TypeId>)> = None;
    for candidate in candidates {
        let mut unifier = Unifier::new(db, &free);
        match unifier.unify(candidate, inherited) {
            Ok(true) => {}
            Ok(false) => {
                trace!(candidate = candidate.0, "resolve_inherited_bindings: candidate discarded");
                continue;
            }
            Err(conflict) => {
                debug!(param = ?conflict.param, "resolve_inherited_bindings: conflicting binding");
                return Err(ReflectError::AmbiguousBinding {
                    param: fmt.format(db.intern(TypeData::Param(conflict.param))),
                    ty: fmt.format(ty),
                    target: fmt.format(inherited),
                    first: fmt.format(conflict.first),
                    second: fmt.format(conflict.second),
                });
            }
        }
        let bindings = unifier.bindings;
        if substitute(db, candidate, &bindings) != inherited {
            continue;
        }
        let args: TypeList = own_args.iter().map(|&a| substitute(db, a, &bindings)).collect();
        match &resolved {
            None => resolved = Some((args, bindings)),
            Some((existing, _)) if *existing == args => {}
            Some((existing, _)) => {
                return Err(ReflectError::AmbiguousGenericArguments {
                    ty: fmt.format(ty),
                    target: fmt.format(inherited),
                    first: fmt.format_list(existing),
                    second: fmt.format_list(&args),
                });
            }
        }
    }

    match resolved {
        Some((_, bound)) => Ok(GenericBinding { params: free, bound }),
        None => Err(ReflectError::NotRelated {
            ty: fmt.format(ty),
            target: fmt.format(inherited),
        }),
    }
}

/// Re-close `ty`'s definition so that it inherits `inherited`.
///
/// Parameters with no implied binding stay free, so a partially open result
/// can be resolved again against another inherited instantiation.
pub fn resolve_inherited_generic_instantiation(
    db: &dyn TypeDatabase,
    ty: TypeId,
    inherited: TypeId,
) -> Result<TypeId> {
    let binding = resolve_inherited_bindings(db, ty, inherited)?;
    let args: TypeList = generic_arguments(db, ty)
        .into_iter()
        .map(|arg| binding.apply(db, arg))
        .collect();
    let Some(definition) = generic_definition(db, ty) else {
        return Err(ReflectError::NotGeneric {
            ty: TypeFormatter::new(db).format(ty),
        });
    };
    let closed = make_generic_type(db, definition, &args)?;
    debug!(
        ty = ty.0,
        inherited = inherited.0,
        resolved = closed.0,
        bound = binding.bound_count(),
        "resolve_inherited_generic_instantiation"
    );
    Ok(closed)
}

#[cfg(test)]
#[path = "../tests/generics_tests.rs"]
mod tests;
