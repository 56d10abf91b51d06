//! rfx: generic-aware runtime type relationships.
//!
//! The resolver itself lives in `rfx-solver`; this crate re-exports it and
//! adds the `rfx` command-line front end.

// Name interning and limits
pub use rfx_common as common;
pub use rfx_common::{Atom, Interner};

// Type graph, unification, member lookup and invoker synthesis
pub use rfx_solver as solver;
pub use rfx_solver::{
    CallShape, CoreLib, DefKind, ErrorKind, InvokeError, Invoker, InvokerFactory, MemberQuery,
    ReflectError, TypeDatabase, TypeId, TypeRegistry, Value, describe, extract_generic_arguments,
    find_member, find_members, make_generic_type, parse_type, require_unique_generic_arguments,
    resolve_inherited_generic_instantiation, structurally_inherits,
};

// Tracing configuration (text / tree / JSON output for debugging)
pub mod tracing_config;

// Native CLI
pub mod cli;
