//! Generic-Aware Type Relationship Resolver
//!
//! Answers questions a dynamic binder asks about a nominal type system with
//! classes, structs, interfaces and open/closed generics:
//!
//! - **Type graph**: interned `TypeId`s over registered definitions, with
//!   base chains, interface closures and generic decomposition
//! - **Unification**: structural inheritance against open generic
//!   definitions, argument extraction and inherited-instantiation resolution
//! - **Member lookup**: name/visibility/static/arity/shape filtered search
//!   with generic-method closing
//! - **Invoker synthesis**: callables with statically checked argument and
//!   result conversions
//!
//! Key properties:
//! - O(1) type equality via interning
//! - Bounded recursion in every graph walk (`RecursionGuard`)
//! - The registry is immutable after load and shared as `Arc<TypeRegistry>`
mod builder;
pub mod convert;
pub mod corelib;
mod db;
pub mod def;
mod error;
mod format;
pub mod generics;
pub mod graph;
pub mod inheritance;
pub mod instantiate;
mod intern;
pub mod invoke;
pub mod lookup;
pub mod parse;
pub mod recursion;
mod shape;
pub mod types;
pub mod value;

pub use builder::{DeclaredType, DefinitionBuilder, MemberBuilder};
pub use convert::Conversion;
pub use corelib::CoreLib;
pub use db::{TypeDatabase, TypeRegistry};
pub use def::{DefId, DefKind, DefinitionInfo, DefinitionStore, MemberInfo, NativeCall, NativeFn};
pub use error::{ErrorKind, InvokeError, ReflectError, Result};
pub use format::{TypeFormatter, format_type};
pub use generics::{
    GenericBinding, extract_generic_arguments, generic_instantiations, inherits_generic_definition,
    parameter_satisfied_by, require_unique_generic_arguments,
    require_unique_generic_instantiation, resolve_inherited_bindings,
    resolve_inherited_generic_instantiation,
};
pub use graph::{
    GenericArgument, TypeDescriptor, base_type, base_types, describe, generic_arguments,
    generic_definition, inherit_types, interfaces, is_generic, is_generic_definition,
    is_generic_parameter, is_interface, is_value_type,
};
pub use inheritance::{InheritanceChecker, structurally_inherits};
pub use instantiate::{Substitution, make_generic_type};
pub use intern::TypeInterner;
pub use invoke::{Invoker, InvokerFactory, default_value_of};
pub use lookup::{
    MemberDescriptor, MemberKinds, MemberQuery, constructor, find_member, find_members,
    instance_method, instance_property_or_field, static_method, static_property_or_field,
};
pub use parse::parse_type;
pub use recursion::{RecursionGuard, RecursionProfile, RecursionResult};
pub use shape::CallShape;
pub use types::{
    MemberId, MemberKind, ParamOwner, ParamRef, PrimitiveKind, TypeData, TypeId, TypeList,
    TypeParamInfo, Visibility,
};
pub use value::{ArrayRef, ObjectRef, Value};

// Test modules: most are loaded by their source files via #[path = "../tests/..."].
// The shared type fixtures live here so every unit test module can reach them.
#[cfg(test)]
#[path = "../tests/fixtures.rs"]
pub(crate) mod fixtures;
