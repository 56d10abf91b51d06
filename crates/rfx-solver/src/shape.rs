//! Requested invoker signatures.

use crate::db::TypeDatabase;
use crate::format::TypeFormatter;
use crate::lookup::MemberDescriptor;
use crate::types::{MemberKind, TypeId};
use smallvec::SmallVec;

/// Parameter and result types of a requested invoker.
///
/// `result == TypeId::VOID` requests an invoker producing no value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallShape {
    pub params: SmallVec<[TypeId; 4]>,
    pub result: TypeId,
}

impl CallShape {
    pub fn new(params: &[TypeId], result: TypeId) -> Self {
        Self {
            params: params.iter().copied().collect(),
            result,
        }
    }

    /// Shape returning `result`.
    pub fn function(params: &[TypeId], result: TypeId) -> Self {
        Self::new(params, result)
    }

    /// Shape returning no value.
    pub fn action(params: &[TypeId]) -> Self {
        Self::new(params, TypeId::VOID)
    }

    /// Array-argument convention: an optional instance parameter followed by
    /// a single `object[]` carrying every argument.
    pub fn array_convention(db: &dyn TypeDatabase, instance: Option<TypeId>, result: TypeId) -> Self {
        let mut params: SmallVec<[TypeId; 4]> = instance.into_iter().collect();
        params.push(db.array(TypeId::OBJECT));
        Self { params, result }
    }

    /// The member's own signature.
    ///
    /// Fields and properties give the getter shape `[instance] -> value`,
    /// methods `[instance,] p0, p1, .. -> return` (an action when the method
    /// returns `VOID`), constructors `p0, p1, .. -> declaring type`. Static
    /// members take no instance parameter.
    pub fn natural(member: &MemberDescriptor) -> Self {
        let mut params = receiver_param(member);
        match member.kind {
            MemberKind::Field | MemberKind::Property => Self {
                params,
                result: member.value_type,
            },
            MemberKind::Constructor => Self {
                params: member.params.iter().copied().collect(),
                result: member.declaring_type,
            },
            MemberKind::Method => {
                params.extend(member.params.iter().copied());
                Self {
                    params,
                    result: member.value_type,
                }
            }
        }
    }

    /// Setter of a field or property: `[instance,] value -> VOID`.
    pub fn natural_setter(member: &MemberDescriptor) -> Self {
        let mut params = receiver_param(member);
        params.push(member.value_type);
        Self::action(&params)
    }

    /// [`natural`](Self::natural) with every position widened to `OBJECT`.
    /// A `VOID` result stays `VOID`.
    pub fn erased(member: &MemberDescriptor) -> Self {
        let natural = Self::natural(member);
        Self {
            params: natural.params.iter().map(|_| TypeId::OBJECT).collect(),
            result: erase(natural.result),
        }
    }

    /// [`natural_setter`](Self::natural_setter) taking `OBJECT`s.
    pub fn erased_setter(member: &MemberDescriptor) -> Self {
        let count = Self::natural_setter(member).params.len();
        Self::action(&vec![TypeId::OBJECT; count])
    }

    /// Array convention over `OBJECT`: `[object,] object[] -> object`, or
    /// an action for methods returning `VOID`.
    pub fn erased_array(db: &dyn TypeDatabase, member: &MemberDescriptor) -> Self {
        let instance = receiver_param(member).first().map(|_| TypeId::OBJECT);
        Self::array_convention(db, instance, erase(Self::natural(member).result))
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn returns_value(&self) -> bool {
        !self.result.is_void()
    }

    /// `(A, B) -> R` rendering for errors and logs.
    pub fn display(&self, db: &dyn TypeDatabase) -> String {
        let fmt = TypeFormatter::new(db);
        format!("({}) -> {}", fmt.format_list(&self.params), fmt.format(self.result))
    }
}

fn receiver_param(member: &MemberDescriptor) -> SmallVec<[TypeId; 4]> {
    if member.is_static || member.kind == MemberKind::Constructor {
        SmallVec::new()
    } else {
        smallvec::smallvec![member.reflected_type]
    }
}

fn erase(result: TypeId) -> TypeId {
    if result.is_void() { TypeId::VOID } else { TypeId::OBJECT }
}

#[cfg(test)]
#[path = "../tests/shape_tests.rs"]
mod tests;
