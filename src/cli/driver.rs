//! Query execution for the rfx binary.
//!
//! A [`Session`] owns a registry with the core library installed (and, unless
//! disabled, a handful of demo dictionary interfaces). Each [`Command`] runs
//! against it and produces an [`Outcome`] the reporter renders.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info_span};

use rfx_solver::{
    CoreLib, DefKind, GenericArgument, MemberQuery, ReflectError, Result, TypeDatabase, TypeFormatter,
    TypeId, TypeRegistry, describe, extract_generic_arguments, find_members, parse_type,
    require_unique_generic_arguments, resolve_inherited_generic_instantiation,
    structurally_inherits,
};

use super::args::Command;

/// Namespace of the demo types.
pub const DEMO_NAMESPACE: &str = "Demo";

/// A loaded type graph.
pub struct Session {
    registry: Arc<TypeRegistry>,
    core: CoreLib,
}

impl Session {
    pub fn new(with_demo: bool) -> Self {
        let registry = TypeRegistry::new().into_shared();
        let core = CoreLib::install(&registry);
        if with_demo {
            install_demo(&registry, &core);
        }
        Session { registry, core }
    }

    pub fn db(&self) -> &dyn TypeDatabase {
        &*self.registry
    }

    pub fn core(&self) -> &CoreLib {
        &self.core
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Parse a type name against the loaded graph.
    pub fn parse(&self, name: &str) -> Result<TypeId> {
        parse_type(self.db(), name)
    }

    fn name(&self, ty: TypeId) -> String {
        TypeFormatter::new(self.db()).format(ty)
    }
}

/// Demo interfaces from the dictionary family:
///
/// ```text
/// IUnaryDictionary<T>        : IDictionary<T, T>
/// IReverseDictionary<K, V>   : IDictionary<V, K>
/// ITripleDictionary<K, V, T> : IDictionary<K, V>, IComparer<T>   where T : V
/// Pairs<K, V>                : IEnumerable<KeyValuePair<K, V>>
/// Dual                       : IEnumerable<Int32>, IEnumerable<String>
/// ```
fn install_demo(r: &TypeRegistry, core: &CoreLib) {
    let unary = r.declare(DefKind::Interface, DEMO_NAMESPACE, "IUnaryDictionary", &["T"]);
    let reverse = r.declare(DefKind::Interface, DEMO_NAMESPACE, "IReverseDictionary", &["K", "V"]);
    let triple = r.declare(DefKind::Interface, DEMO_NAMESPACE, "ITripleDictionary", &["K", "V", "T"]);
    let pairs = r.declare(DefKind::Class, DEMO_NAMESPACE, "Pairs", &["K", "V"]);
    let dual = r.declare(DefKind::Class, DEMO_NAMESPACE, "Dual", &[]);

    let t = unary.param(0);
    r.define(unary.def)
        .implements(r.application(core.i_dictionary, &[t, t]))
        .finish();

    let (k, v) = (reverse.param(0), reverse.param(1));
    r.define(reverse.def)
        .implements(r.application(core.i_dictionary, &[v, k]))
        .finish();

    let (k, v, t) = (triple.param(0), triple.param(1), triple.param(2));
    r.define(triple.def)
        .implements(r.application(core.i_dictionary, &[k, v]))
        .implements(r.application(core.i_comparer, &[t]))
        .constraint(2, v)
        .finish();

    let (k, v) = (pairs.param(0), pairs.param(1));
    let pair = r.application(core.key_value_pair, &[k, v]);
    r.define(pairs.def)
        .implements(r.application(core.i_enumerable_t, &[pair]))
        .finish();

    r.define(dual.def)
        .implements(r.application(core.i_enumerable_t, &[TypeId::I32]))
        .implements(r.application(core.i_enumerable_t, &[TypeId::STRING]))
        .finish();
    debug!(namespace = DEMO_NAMESPACE, "demo types installed");
}

// =============================================================================
// Outcomes
// =============================================================================

/// One listed member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemberLine {
    pub kind: &'static str,
    pub name: String,
    pub signature: String,
    pub visibility: String,
    pub is_static: bool,
    pub declaring_type: String,
}

/// Named view of a `TypeDescriptor`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Description {
    pub name: String,
    pub kind: Option<String>,
    pub is_generic_definition: bool,
    pub contains_generic_parameters: bool,
    /// Formatted arguments; free parameters are prefixed with `?`.
    pub generic_arguments: Vec<String>,
    pub base_type: Option<String>,
    pub interfaces: Vec<String>,
}

/// Result of one command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "query", rename_all = "kebab-case")]
pub enum Outcome {
    Inherits {
        ty: String,
        target: String,
        inherits: bool,
    },
    GenericArgs {
        ty: String,
        definition: String,
        arguments: Vec<Vec<String>>,
    },
    Resolved {
        ty: String,
        inherited: String,
        resolved: String,
    },
    Members {
        ty: String,
        members: Vec<MemberLine>,
    },
    Described(Description),
}

// =============================================================================
// Execution
// =============================================================================

/// Run one command against the session.
pub fn run(session: &Session, command: &Command) -> Result<Outcome> {
    let _span = info_span!("rfx_command", command = ?command).entered();
    let db = session.db();
    match command {
        Command::Inherits { ty, target } => {
            let (ty, target) = (session.parse(ty)?, session.parse(target)?);
            Ok(Outcome::Inherits {
                ty: session.name(ty),
                target: session.name(target),
                inherits: structurally_inherits(db, ty, target),
            })
        }
        Command::GenericArgs {
            ty,
            definition,
            all,
        } => {
            let (ty, definition) = (session.parse(ty)?, session.parse(definition)?);
            let lists = if *all {
                extract_generic_arguments(db, ty, definition)?
            } else {
                vec![require_unique_generic_arguments(db, ty, definition)?]
            };
            let fmt = TypeFormatter::new(db);
            Ok(Outcome::GenericArgs {
                ty: session.name(ty),
                definition: session.name(definition),
                arguments: lists
                    .iter()
                    .map(|list| list.iter().map(|&arg| fmt.format(arg)).collect())
                    .collect(),
            })
        }
        Command::Resolve { ty, inherited } => {
            let (ty, inherited) = (session.parse(ty)?, session.parse(inherited)?);
            let resolved = resolve_inherited_generic_instantiation(db, ty, inherited)?;
            Ok(Outcome::Resolved {
                ty: session.name(ty),
                inherited: session.name(inherited),
                resolved: session.name(resolved),
            })
        }
        Command::Members {
            ty,
            name,
            kind,
            non_public,
            static_members,
            ignore_case,
            arity,
        } => {
            let ty = session.parse(ty)?;
            let mut query = match name {
                Some(name) => MemberQuery::new(name.as_str()),
                None => MemberQuery::any(),
            }
            .ignore_case(*ignore_case);
            if let Some(kind) = kind {
                query = query.kinds(kind.kinds());
            }
            if *non_public {
                query = query.non_public();
            }
            if *static_members {
                query = query.static_members();
            }
            if let Some(arity) = arity {
                query = query.with_generic_arity(*arity);
            }
            let members = find_members(db, ty, &query)?
                .iter()
                .map(|member| MemberLine {
                    kind: member.kind.label(),
                    name: db.resolve_atom(member.name).to_string(),
                    signature: member.display(db),
                    visibility: format!("{:?}", member.visibility).to_lowercase(),
                    is_static: member.is_static,
                    declaring_type: session.name(member.declaring_type),
                })
                .collect();
            Ok(Outcome::Members {
                ty: session.name(ty),
                members,
            })
        }
        Command::Describe { ty } => {
            let ty = session.parse(ty)?;
            let descriptor = describe(db, ty)?;
            let fmt = TypeFormatter::new(db);
            Ok(Outcome::Described(Description {
                name: descriptor.name,
                kind: descriptor.kind.map(|kind| format!("{kind:?}")),
                is_generic_definition: descriptor.is_generic_definition,
                contains_generic_parameters: descriptor.contains_generic_parameters,
                generic_arguments: descriptor
                    .generic_arguments
                    .iter()
                    .map(|arg| match arg {
                        GenericArgument::Free(ty) => format!("?{}", fmt.format(*ty)),
                        GenericArgument::Bound(ty) => fmt.format(*ty),
                    })
                    .collect(),
                base_type: descriptor.base_type.map(|base| fmt.format(base)),
                interfaces: descriptor.interfaces.iter().map(|&i| fmt.format(i)).collect(),
            }))
        }
    }
}

/// Exit status for a failed query: 2 for bad input, 1 otherwise.
pub fn exit_code(error: &ReflectError) -> i32 {
    match error.kind() {
        rfx_solver::ErrorKind::InvalidArgument => 2,
        _ => 1,
    }
}
