//! Structural inheritance: is `ty` a `target`?
//!
//! `ty` inherits `target` when `target` is `ty` itself, one of its transitive
//! base types or interfaces, or a compatible instantiation of the same generic
//! definition as one of those. Compatibility is decided per argument position:
//!
//! | candidate arg | target arg | rule |
//! |---------------|------------|------|
//! | any | (bare definition) | matches |
//! | parameter | parameter | same parameter, or the candidate satisfies the target's constraints |
//! | parameter | concrete | the candidate's constraint set inherits the target arg |
//! | concrete | parameter | the candidate satisfies the target parameter's constraints |
//! | concrete | concrete | identical |
//!
//! Constraints that name another parameter of the same definition
//! (`T : V`) are resolved through the candidate's argument list.
//!
//! Recursion through self-referential constraints (`T : IComparable<T>`) is
//! bounded by a `RecursionGuard`; a revisited query answers `false`.

use crate::db::TypeDatabase;
use crate::graph::{as_param, generic_arguments, param_info, self_and_ancestors};
use crate::instantiate::{Substitution, instantiate};
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::types::{ParamOwner, TypeData, TypeId};
use tracing::trace;

/// Guard key: the two recursive questions the checker asks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Query {
    Inherits(TypeId, TypeId),
    Satisfies(TypeId, TypeId),
}

/// Stateful inheritance checker. One instance answers any number of
/// queries; the guard resets between top-level queries.
pub struct InheritanceChecker<'a> {
    db: &'a dyn TypeDatabase,
    guard: RecursionGuard<Query>,
}

impl<'a> InheritanceChecker<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        Self::with_profile(db, RecursionProfile::InheritanceCheck)
    }

    pub fn with_profile(db: &'a dyn TypeDatabase, profile: RecursionProfile) -> Self {
        Self {
            db,
            guard: RecursionGuard::with_profile(profile),
        }
    }

    /// Top-level `ty` inherits `target`.
    pub fn is_inherited(&mut self, ty: TypeId, target: TypeId) -> bool {
        self.guard.reset();
        self.inherits(ty, target)
    }

    /// Top-level: does `candidate` satisfy the constraints of `param`, with
    /// sibling parameters resolved through `args`?
    pub fn is_parameter_satisfied(&mut self, candidate: TypeId, param: TypeId, args: &[TypeId]) -> bool {
        self.guard.reset();
        self.satisfies(candidate, param, args)
    }

    /// Whether a query hit the depth or iteration limit since the last reset.
    pub fn limit_exceeded(&self) -> bool {
        self.guard.is_exceeded()
    }

    fn inherits(&mut self, ty: TypeId, target: TypeId) -> bool {
        if ty == target {
            return true;
        }
        let key = Query::Inherits(ty, target);
        match self.guard.enter(key) {
            RecursionResult::Entered => {}
            denied => {
                trace!(ty = ty.0, target = target.0, ?denied, "inherits: guard denied");
                return false;
            }
        }
        let result = self_and_ancestors(self.db, ty)
            .into_iter()
            .any(|candidate| self.matches(candidate, target));
        self.guard.leave(key);
        result
    }

    /// Match one ancestor against the target.
    fn matches(&mut self, candidate: TypeId, target: TypeId) -> bool {
        if candidate == target {
            return true;
        }
        let db = self.db;
        let (Some(candidate_def), Some(target_def)) = (db.def_of(candidate), db.def_of(target))
        else {
            return false;
        };
        if candidate_def != target_def {
            return false;
        }
        // Bare generic definition: any instantiation.
        if db.lookup(target) == Some(TypeData::Nominal(target_def)) {
            return db.definitions().get_arity(target_def) > 0;
        }

        let candidate_args = generic_arguments(db, candidate);
        let target_args = generic_arguments(db, target);
        if candidate_args.len() != target_args.len() {
            return false;
        }
        candidate_args
            .iter()
            .zip(&target_args)
            .all(|(&a, &b)| self.argument_matches(a, b, &candidate_args))
    }

    fn argument_matches(&mut self, a: TypeId, b: TypeId, candidate_args: &[TypeId]) -> bool {
        if a == b {
            return true;
        }
        let db = self.db;
        match (as_param(db, a).is_some(), as_param(db, b).is_some()) {
            (true, true) => self.satisfies(a, b, candidate_args),
            (true, false) => self.inherits(a, b),
            (false, true) => self.satisfies(a, b, candidate_args),
            (false, false) => false,
        }
    }

    /// `candidate` satisfies every constraint of `param`. A non-parameter
    /// `param` degenerates to `inherits`.
    fn satisfies(&mut self, candidate: TypeId, param: TypeId, args: &[TypeId]) -> bool {
        let db = self.db;
        let Some(param_ref) = as_param(db, param) else {
            return self.inherits(candidate, param);
        };
        let Some(info) = param_info(db, param_ref) else {
            return false;
        };
        if info.constraints.is_empty() {
            return true;
        }

        let key = Query::Satisfies(candidate, param);
        match self.guard.enter(key) {
            RecursionResult::Entered => {}
            denied => {
                trace!(candidate = candidate.0, param = param.0, ?denied, "satisfies: guard denied");
                return false;
            }
        }

        let owner_def = match param_ref.owner {
            ParamOwner::Type(def) => Some(def),
            ParamOwner::Method(_) => None,
        };
        let result = info.constraints.iter().all(|&constraint| {
            // A sibling parameter position: resolve through the argument list.
            if let Some(sibling) = as_param(db, constraint) {
                if sibling.owner == param_ref.owner {
                    return match args.get(sibling.index as usize) {
                        Some(&resolved) if resolved != param => {
                            self.satisfies(candidate, resolved, args)
                        }
                        _ => self.inherits(candidate, constraint),
                    };
                }
            }
            let constraint = match owner_def {
                Some(def) if !args.is_empty() => {
                    instantiate(db, constraint, &Substitution::for_type(def, args))
                }
                _ => constraint,
            };
            self.inherits(candidate, constraint)
        });
        self.guard.leave(key);
        result
    }
}

/// `ty` is `target` or structurally inherits it.
pub fn structurally_inherits(db: &dyn TypeDatabase, ty: TypeId, target: TypeId) -> bool {
    InheritanceChecker::new(db).is_inherited(ty, target)
}

#[cfg(test)]
#[path = "../tests/inheritance_tests.rs"]
mod tests;
