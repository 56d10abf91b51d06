//! Two-phase definition builder.
//!
//! Generic signatures refer to their own parameters (`Pair<K, V> :
//! IEnumerable<KeyValuePair<K, V>>`), and hierarchies refer to each other, so
//! a definition is first *declared* (allocating its `DefId` and parameter
//! handles) and then *defined* with bases, interfaces and members.
//!
//! ```ignore
//! let pair = registry.declare(DefKind::Class, "Demo", "Pair", &["K", "V"]);
//! let (k, v) = (pair.param(0), pair.param(1));
//! let kvp = registry.application(core.key_value_pair, &[k, v]);
//! registry
//!     .define(pair.def)
//!     .implements(registry.application(core.i_enumerable_t, &[kvp]))
//!     .field("First", k)
//!     .method("Swap", |m| {
//!         m.returns(registry.application(pair.def, &[v, k]));
//!     })
//!     .finish();
//! ```

use crate::db::{TypeDatabase, TypeRegistry};
use crate::def::{
    Accessor, DefId, DefKind, DefinitionInfo, MemberBody, MemberInfo, NativeCall, NativeFn,
    ParamInfo,
};
use crate::error::InvokeError;
use crate::types::{MemberId, MemberKind, ParamOwner, TypeId, TypeList, TypeParamInfo, Visibility};
use crate::value::Value;
use std::sync::Arc;
use tracing::{trace, warn};

/// Result of the declaration phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclaredType {
    pub def: DefId,
    /// The definition type (open when generic).
    pub ty: TypeId,
    /// Parameter handles, in declaration order.
    pub params: TypeList,
}

impl DeclaredType {
    /// Handle of the `index`-th generic parameter.
    ///
    /// Panics when `index` is out of range; declarations are static code.
    pub fn param(&self, index: usize) -> TypeId {
        self.params[index]
    }
}

fn noop() -> NativeFn {
    Arc::new(|_: NativeCall<'_>| Ok(Value::Unit))
}

impl TypeRegistry {
    /// Declare a definition: allocate its id and parameter handles.
    ///
    /// `namespace` may be empty. The definition has no bases or members
    /// until `define(..).finish()` runs.
    pub fn declare(
        &self,
        kind: DefKind,
        namespace: &str,
        name: &str,
        type_params: &[&str],
    ) -> DeclaredType {
        let name_atom = self.intern_string(name);
        let params = type_params
            .iter()
            .map(|p| TypeParamInfo::new(self.intern_string(p)))
            .collect();
        let info = match kind {
            DefKind::Class => DefinitionInfo::class(name_atom, params),
            DefKind::Struct => DefinitionInfo::structure(name_atom, params),
            DefKind::Interface => DefinitionInfo::interface(name_atom, params),
            DefKind::Primitive(prim) => DefinitionInfo::primitive(name_atom, prim),
        };
        let (info, qualified) = if namespace.is_empty() {
            (info, None)
        } else {
            let ns = self.intern_string(namespace);
            (
                info.with_namespace(ns),
                Some(self.intern_string(&format!("{namespace}.{name}"))),
            )
        };

        let def = self.definitions().register(info, qualified);
        let params: TypeList = (0..type_params.len() as u32)
            .map(|i| self.param(ParamOwner::Type(def), i))
            .collect();
        trace!(def_id = def.0, name, arity = params.len(), "declare");
        DeclaredType {
            def,
            ty: self.nominal(def),
            params,
        }
    }

    /// Start the definition phase for a declared type.
    ///
    /// Unknown ids produce a builder whose `finish` is a no-op.
    pub fn define(&self, def: DefId) -> DefinitionBuilder<'_> {
        let info = self.definitions().get(def);
        DefinitionBuilder {
            registry: self,
            def,
            info,
        }
    }
}

// =============================================================================
// DefinitionBuilder
// =============================================================================

/// Fluent second phase of a definition.
pub struct DefinitionBuilder<'r> {
    registry: &'r TypeRegistry,
    def: DefId,
    info: Option<DefinitionInfo>,
}

impl<'r> DefinitionBuilder<'r> {
    /// Set the base class.
    pub fn extends(mut self, base: TypeId) -> Self {
        if let Some(info) = &mut self.info {
            info.extends = Some(base);
        }
        self
    }

    /// Add a declared interface.
    pub fn implements(mut self, interface: TypeId) -> Self {
        if let Some(info) = &mut self.info {
            if !info.implements.contains(&interface) {
                info.implements.push(interface);
            }
        }
        self
    }

    /// Constrain the `index`-th generic parameter.
    pub fn constraint(mut self, index: usize, constraint: TypeId) -> Self {
        if let Some(param) = self
            .info
            .as_mut()
            .and_then(|info| info.type_params.get_mut(index))
        {
            param.constraints.push(constraint);
        }
        self
    }

    /// Public instance field.
    pub fn field(self, name: &str, ty: TypeId) -> Self {
        self.member(MemberKind::Field, name, |f| {
            f.value_type(ty);
        })
    }

    /// Public static field starting at `initial`.
    pub fn static_field(self, name: &str, ty: TypeId, initial: Value) -> Self {
        self.member(MemberKind::Field, name, |f| {
            f.value_type(ty).static_member().initial(initial);
        })
    }

    pub fn method(self, name: &str, configure: impl FnOnce(&mut MemberBuilder<'r>)) -> Self {
        self.member(MemberKind::Method, name, configure)
    }

    pub fn property(
        self,
        name: &str,
        ty: TypeId,
        configure: impl FnOnce(&mut MemberBuilder<'r>),
    ) -> Self {
        self.member(MemberKind::Property, name, |p| {
            p.value_type(ty);
            configure(p);
        })
    }

    pub fn constructor(self, configure: impl FnOnce(&mut MemberBuilder<'r>)) -> Self {
        self.member(MemberKind::Constructor, ".ctor", configure)
    }

    /// Add a member of any kind.
    pub fn member(
        mut self,
        kind: MemberKind,
        name: &str,
        configure: impl FnOnce(&mut MemberBuilder<'r>),
    ) -> Self {
        let Some(info) = &mut self.info else {
            return self;
        };
        let id = MemberId {
            owner: self.def,
            index: info.members.len() as u32,
        };
        let mut builder = MemberBuilder::new(self.registry, id, kind, name);
        configure(&mut builder);
        info.members.push(Arc::new(builder.build()));
        self
    }

    /// Store the definition. Classes without a base extend `Object`,
    /// structs extend `ValueType`.
    pub fn finish(self) -> DefId {
        if let Some(mut info) = self.info {
            if info.extends.is_none() && self.registry.nominal(self.def) != TypeId::OBJECT {
                info.extends = match info.kind {
                    DefKind::Class => Some(TypeId::OBJECT),
                    DefKind::Struct | DefKind::Primitive(_) => Some(TypeId::VALUE_TYPE),
                    DefKind::Interface => None,
                };
            }
            trace!(
                def_id = self.def.0,
                members = info.members.len(),
                interfaces = info.implements.len(),
                "define: finish"
            );
            self.registry.definitions().replace(self.def, info);
        }
        self.def
    }
}

// =============================================================================
// MemberBuilder
// =============================================================================

/// Configures one member inside `DefinitionBuilder::member`.
pub struct MemberBuilder<'r> {
    registry: &'r TypeRegistry,
    id: MemberId,
    info: MemberInfo,
}

impl<'r> MemberBuilder<'r> {
    fn new(registry: &'r TypeRegistry, id: MemberId, kind: MemberKind, name: &str) -> Self {
        let body = match kind {
            MemberKind::Field => MemberBody::Field { initial: None },
            MemberKind::Property => MemberBody::Property {
                getter: None,
                setter: None,
            },
            MemberKind::Method => MemberBody::Method(noop()),
            MemberKind::Constructor => MemberBody::Constructor(noop()),
        };
        Self {
            registry,
            id,
            info: MemberInfo {
                name: registry.intern_string(name),
                visibility: Visibility::Public,
                is_static: false,
                new_slot: false,
                type_params: Vec::new(),
                params: Vec::new(),
                value_type: TypeId::VOID,
                body,
            },
        }
    }

    /// Id the member will have once added.
    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn visibility(&mut self, visibility: Visibility) -> &mut Self {
        self.info.visibility = visibility;
        self
    }

    pub fn private(&mut self) -> &mut Self {
        self.visibility(Visibility::Private)
    }

    pub fn static_member(&mut self) -> &mut Self {
        self.info.is_static = true;
        self
    }

    /// Mark as an explicit interface implementation slot.
    pub fn new_slot(&mut self) -> &mut Self {
        self.info.new_slot = true;
        self
    }

    /// Declare a method type parameter and return its handle.
    pub fn type_param(&mut self, name: &str) -> TypeId {
        let index = self.info.type_params.len() as u32;
        self.info
            .type_params
            .push(TypeParamInfo::new(self.registry.intern_string(name)));
        self.registry.param(ParamOwner::Method(self.id), index)
    }

    /// Constrain the `index`-th method type parameter.
    pub fn type_param_constraint(&mut self, index: usize, constraint: TypeId) -> &mut Self {
        if let Some(param) = self.info.type_params.get_mut(index) {
            param.constraints.push(constraint);
        }
        self
    }

    pub fn param(&mut self, name: &str, ty: TypeId) -> &mut Self {
        self.info.params.push(ParamInfo {
            name: self.registry.intern_string(name),
            ty,
        });
        self
    }

    /// Method return type.
    pub fn returns(&mut self, ty: TypeId) -> &mut Self {
        self.info.value_type = ty;
        self
    }

    /// Field or property type.
    pub fn value_type(&mut self, ty: TypeId) -> &mut Self {
        self.info.value_type = ty;
        self
    }

    /// Initial value of a static field.
    pub fn initial(&mut self, value: Value) -> &mut Self {
        if let MemberBody::Field { initial } = &mut self.info.body {
            *initial = Some(value);
        }
        self
    }

    /// Native implementation of a method or constructor body.
    pub fn native(
        &mut self,
        body: impl Fn(NativeCall<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    ) -> &mut Self {
        let body: NativeFn = Arc::new(body);
        match &mut self.info.body {
            MemberBody::Method(f) | MemberBody::Constructor(f) => *f = body,
            other => warn!(body = ?other, "native body ignored on a non-callable member"),
        }
        self
    }

    /// Property getter.
    pub fn getter(
        &mut self,
        visibility: Visibility,
        body: impl Fn(NativeCall<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    ) -> &mut Self {
        if let MemberBody::Property { getter, .. } = &mut self.info.body {
            *getter = Some(Accessor {
                visibility,
                body: Arc::new(body),
            });
        }
        self
    }

    /// Property setter; the new value arrives as `args[0]`.
    pub fn setter(
        &mut self,
        visibility: Visibility,
        body: impl Fn(NativeCall<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    ) -> &mut Self {
        if let MemberBody::Property { setter, .. } = &mut self.info.body {
            *setter = Some(Accessor {
                visibility,
                body: Arc::new(body),
            });
        }
        self
    }

    fn build(mut self) -> MemberInfo {
        if let MemberBody::Property { getter, setter } = &self.info.body {
            if let Some(accessor) = getter.as_ref().or(setter.as_ref()) {
                self.info.visibility = accessor.visibility;
            }
        }
        self.info
    }
}

#[cfg(test)]
#[path = "../tests/builder_tests.rs"]
mod tests;
