//! Invoker synthesis.
//!
//! An `Invoker` is a resolved member (or a type, for default values and
//! casts) plus a requested `CallShape` and one pre-selected `Conversion`
//! per value position. Every mismatch that can be decided from types is
//! reported by the `InvokerFactory` method that builds the invoker; calling
//! it only checks argument counts, runtime object types and numeric ranges.
//!
//! Every argument is admitted against its declared shape parameter before
//! any conversion runs, so a typed invoker never sees a foreign receiver or
//! a wrongly typed argument. Array-convention elements are admitted against
//! the array's element type.
//!
//! ## Calling conventions
//!
//! | Factory method | Shape parameters | Result |
//! |----------------|------------------|--------|
//! | `getter` | `[instance]` or `[]` for statics | value |
//! | `setter` | `[instance, value]` or `[value]` | `VOID` |
//! | `method` | `[instance,] p0, p1, ..` | return value or `VOID` |
//! | `method_array` | `[instance,] object[]` | return value or `VOID` |
//! | `constructor` | `p0, p1, ..` | new instance |
//! | `constructor_array` | `object[]` | new instance |
//! | `default_value` | `[]` | default of the type |
//! | `cast` | `[source]` | converted value |
//!
//! The `natural_*` helpers request the member's own signature
//! ([`CallShape::natural`]); the `erased_*` helpers take and return `OBJECT`
//! everywhere ([`CallShape::erased`]). Both turn `VOID` methods into actions.

use crate::convert::{Conversion, admit, primitive_default};
use crate::db::{TypeDatabase, TypeRegistry};
use crate::def::{DefKind, MemberBody, NativeCall, NativeFn};
use crate::error::{InvokeError, ReflectError, Result};
use crate::format::TypeFormatter;
use crate::graph::{base_types, check_known, generic_arguments};
use crate::instantiate::{Substitution, contains_params, instantiate};
use crate::lookup::MemberDescriptor;
use crate::shape::CallShape;
use crate::types::{MemberKind, TypeData, TypeId, TypeList};
use crate::value::{ObjectRef, Value};
use rfx_common::interner::Atom;
use rfx_common::limits::MAX_INSTANTIATION_DEPTH;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

type InvokeResult<T> = std::result::Result<T, InvokeError>;

// =============================================================================
// Instances and defaults
// =============================================================================

/// Allocate an instance of `ty` with every instance field (own and
/// inherited) set to its type's default.
pub fn allocate(db: &dyn TypeDatabase, ty: TypeId) -> ObjectRef {
    allocate_at_depth(db, ty, 0)
}

fn allocate_at_depth(db: &dyn TypeDatabase, ty: TypeId, depth: u32) -> ObjectRef {
    let mut fields = FxHashMap::default();
    let mut levels = vec![ty];
    levels.extend(base_types(db, ty));
    for level in levels {
        let Some(def) = db.def_of(level) else {
            continue;
        };
        let args = generic_arguments(db, level);
        let subst = Substitution::for_type(def, &args);
        for member in db.definitions().get_members(def) {
            if member.is_static || member.kind() != MemberKind::Field {
                continue;
            }
            let field_ty = instantiate(db, member.value_type, &subst);
            fields
                .entry(member.name)
                .or_insert_with(|| default_at_depth(db, field_ty, depth + 1));
        }
    }
    ObjectRef::new(ty, fields)
}

/// Canonical default of `ty`: zero for primitives, a fresh instance with
/// defaulted fields for structs, null otherwise.
pub fn default_value_of(db: &dyn TypeDatabase, ty: TypeId) -> Value {
    default_at_depth(db, ty, 0)
}

fn default_at_depth(db: &dyn TypeDatabase, ty: TypeId, depth: u32) -> Value {
    if ty.is_void() {
        return Value::Unit;
    }
    match db.def_kind(ty) {
        Some(DefKind::Struct) if depth < MAX_INSTANTIATION_DEPTH => {
            Value::Object(allocate_at_depth(db, ty, depth))
        }
        _ => primitive_default(ty),
    }
}

// =============================================================================
// Invoker
// =============================================================================

/// How an invoker obtains its value.
enum InvokePlan {
    FieldGet {
        owner: TypeId,
        name: Atom,
        field_ty: TypeId,
        initial: Option<Value>,
        instance: Option<Conversion>,
        result: Conversion,
    },
    FieldSet {
        owner: TypeId,
        name: Atom,
        instance: Option<Conversion>,
        value: Conversion,
    },
    Accessor {
        body: NativeFn,
        instance: Option<Conversion>,
        args: Vec<Conversion>,
        result: Conversion,
    },
    Call {
        body: NativeFn,
        instance: Option<Conversion>,
        args: Vec<Conversion>,
        spread: Option<TypeId>,
        type_args: TypeList,
        result: Conversion,
    },
    Construct {
        ty: TypeId,
        body: NativeFn,
        args: Vec<Conversion>,
        spread: Option<TypeId>,
        result: Conversion,
    },
    Default {
        ty: TypeId,
        result: Conversion,
    },
    Cast {
        input: Conversion,
        convert: Conversion,
        result: Conversion,
    },
}

struct InvokerInner {
    registry: Arc<TypeRegistry>,
    label: String,
    shape: CallShape,
    plan: InvokePlan,
}

/// A synthesized, reusable callable. Cheap to clone, `Send + Sync`.
#[derive(Clone)]
pub struct Invoker {
    inner: Arc<InvokerInner>,
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invoker")
            .field("label", &self.inner.label)
            .field("shape", &self.inner.shape)
            .finish()
    }
}

impl Invoker {
    /// Member or type the invoker was built for.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn shape(&self) -> &CallShape {
        &self.inner.shape
    }

    /// Invoke with one value per shape parameter.
    pub fn invoke(&self, args: &[Value]) -> InvokeResult<Value> {
        let inner = &*self.inner;
        if args.len() != inner.shape.params.len() {
            return Err(InvokeError::WrongArgumentCount {
                expected: inner.shape.params.len(),
                actual: args.len(),
            });
        }
        let db: &dyn TypeDatabase = &*inner.registry;
        for (arg, &declared) in args.iter().zip(&inner.shape.params) {
            admit(db, arg, declared)?;
        }
        match &inner.plan {
            InvokePlan::FieldGet {
                owner,
                name,
                field_ty,
                initial,
                instance,
                result,
            } => {
                let value = match instance {
                    Some(conv) => {
                        let object = receiver(db, &args[0], *conv)?;
                        object
                            .get_field(*name)
                            .ok_or_else(|| missing_field(db, &object, *name))?
                    }
                    None => inner.registry.static_field(*owner, *name, || {
                        initial
                            .clone()
                            .unwrap_or_else(|| default_value_of(db, *field_ty))
                    }),
                };
                result.apply(db, value)
            }
            InvokePlan::FieldSet {
                owner,
                name,
                instance,
                value,
            } => {
                match instance {
                    Some(conv) => {
                        let object = receiver(db, &args[0], *conv)?;
                        let new_value = value.apply(db, args[1].clone())?;
                        if !object.replace_field(*name, new_value) {
                            return Err(missing_field(db, &object, *name));
                        }
                    }
                    None => {
                        let new_value = value.apply(db, args[0].clone())?;
                        inner.registry.set_static_field(*owner, *name, new_value);
                    }
                }
                Ok(Value::Unit)
            }
            InvokePlan::Accessor {
                body,
                instance,
                args: conversions,
                result,
            } => {
                let (this, rest) = split_receiver(db, args, *instance)?;
                let converted = convert_all(db, conversions, rest)?;
                let value = body(NativeCall {
                    this: this.as_ref(),
                    args: &converted,
                    type_args: &[],
                })?;
                result.apply(db, value)
            }
            InvokePlan::Call {
                body,
                instance,
                args: conversions,
                spread,
                type_args,
                result,
            } => {
                let (this, rest) = split_receiver(db, args, *instance)?;
                let converted = match spread {
                    Some(element) => convert_spread(db, conversions, *element, &rest[0])?,
                    None => convert_all(db, conversions, rest)?,
                };
                let value = body(NativeCall {
                    this: this.as_ref(),
                    args: &converted,
                    type_args,
                })?;
                result.apply(db, value)
            }
            InvokePlan::Construct {
                ty,
                body,
                args: conversions,
                spread,
                result,
            } => {
                let converted = match spread {
                    Some(element) => convert_spread(db, conversions, *element, &args[0])?,
                    None => convert_all(db, conversions, args)?,
                };
                let instance = Value::Object(allocate(db, *ty));
                body(NativeCall {
                    this: Some(&instance),
                    args: &converted,
                    type_args: &[],
                })?;
                result.apply(db, instance)
            }
            InvokePlan::Default { ty, result } => result.apply(db, default_value_of(db, *ty)),
            InvokePlan::Cast {
                input,
                convert,
                result,
            } => {
                let value = input.apply(db, args[0].clone())?;
                let value = convert.apply(db, value)?;
                result.apply(db, value)
            }
        }
    }
}

/// Convert the receiver and require an object or a null-free value.
fn receiver(db: &dyn TypeDatabase, value: &Value, conv: Conversion) -> InvokeResult<ObjectRef> {
    if value.is_null() {
        return Err(InvokeError::NullReference(
            "instance member invoked on null".to_string(),
        ));
    }
    match conv.apply(db, value.clone())? {
        Value::Object(object) => Ok(object),
        other => Err(InvokeError::InvalidCast {
            from: other.to_string(),
            to: "object instance".to_string(),
        }),
    }
}

fn missing_field(db: &dyn TypeDatabase, object: &ObjectRef, name: Atom) -> InvokeError {
    InvokeError::MissingField {
        ty: TypeFormatter::new(db).format(object.ty()),
        field: db.resolve_atom(name).to_string(),
    }
}

fn split_receiver<'v>(
    db: &dyn TypeDatabase,
    args: &'v [Value],
    instance: Option<Conversion>,
) -> InvokeResult<(Option<Value>, &'v [Value])> {
    match instance {
        Some(conv) => {
            if args[0].is_null() {
                return Err(InvokeError::NullReference(
                    "instance member invoked on null".to_string(),
                ));
            }
            Ok((Some(conv.apply(db, args[0].clone())?), &args[1..]))
        }
        None => Ok((None, args)),
    }
}

fn convert_all(db: &dyn TypeDatabase, conversions: &[Conversion], args: &[Value]) -> InvokeResult<Vec<Value>> {
    conversions
        .iter()
        .zip(args)
        .map(|(conv, arg)| conv.apply(db, arg.clone()))
        .collect()
}

/// Array convention: check the length before converting anything.
fn convert_spread(
    db: &dyn TypeDatabase,
    conversions: &[Conversion],
    element: TypeId,
    array: &Value,
) -> InvokeResult<Vec<Value>> {
    let items = match array {
        Value::Array(items) => items.to_vec(),
        Value::Null => {
            return Err(InvokeError::NullReference(
                "argument array is null".to_string(),
            ));
        }
        other => {
            return Err(InvokeError::InvalidCast {
                from: other.to_string(),
                to: "Object[]".to_string(),
            });
        }
    };
    if items.len() != conversions.len() {
        return Err(InvokeError::WrongArgumentCount {
            expected: conversions.len(),
            actual: items.len(),
        });
    }
    for item in &items {
        admit(db, item, element)?;
    }
    convert_all(db, conversions, &items)
}

// =============================================================================
// InvokerFactory
// =============================================================================

/// Builds invokers over one registry.
#[derive(Clone)]
pub struct InvokerFactory {
    registry: Arc<TypeRegistry>,
}

impl InvokerFactory {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    fn db(&self) -> &dyn TypeDatabase {
        &*self.registry
    }

    fn mismatch(&self, member: &str, shape: &CallShape, reason: impl Into<String>) -> ReflectError {
        ReflectError::ShapeMismatch {
            member: member.to_string(),
            shape: shape.display(self.db()),
            reason: reason.into(),
        }
    }

    fn build(&self, label: String, shape: &CallShape, plan: InvokePlan) -> Invoker {
        debug!(invoker = %label, shape = %shape.display(self.db()), "synthesized invoker");
        Invoker {
            inner: Arc::new(InvokerInner {
                registry: Arc::clone(&self.registry),
                label,
                shape: shape.clone(),
                plan,
            }),
        }
    }

    /// Reject open members, and check the instance/static parameter count.
    fn prepare(
        &self,
        member: &MemberDescriptor,
        shape: &CallShape,
        expected_params: usize,
    ) -> Result<(String, Option<Conversion>)> {
        let db = self.db();
        let label = member.display(db);
        if member.contains_generic_parameters(db) {
            return Err(ReflectError::OpenGeneric { ty: label });
        }
        let receiver_count = usize::from(!member.is_static);
        if shape.params.len() != receiver_count + expected_params {
            return Err(self.mismatch(
                &label,
                shape,
                format!(
                    "expected {} parameters, the shape has {}",
                    receiver_count + expected_params,
                    shape.params.len()
                ),
            ));
        }
        let instance = if member.is_static {
            None
        } else {
            Some(Conversion::classify(db, shape.params[0], member.reflected_type)?)
        };
        Ok((label, instance))
    }

    /// Field or property getter.
    pub fn getter(&self, member: &MemberDescriptor, shape: &CallShape) -> Result<Invoker> {
        let db = self.db();
        if !matches!(member.kind, MemberKind::Field | MemberKind::Property) {
            return Err(self.mismatch(&member.display(db), shape, "not a field or property"));
        }
        let (label, instance) = self.prepare(member, shape, 0)?;
        if !shape.returns_value() {
            return Err(self.mismatch(&label, shape, "a getter must return a value"));
        }
        let result = Conversion::classify(db, member.value_type, shape.result)?;
        let plan = match &member.info.body {
            MemberBody::Field { initial } => InvokePlan::FieldGet {
                owner: member.declaring_type,
                name: member.name,
                field_ty: member.value_type,
                initial: initial.clone(),
                instance,
                result,
            },
            MemberBody::Property { getter, .. } => {
                let Some(getter) = getter else {
                    return Err(self.mismatch(&label, shape, "the property has no getter"));
                };
                InvokePlan::Accessor {
                    body: Arc::clone(&getter.body),
                    instance,
                    args: Vec::new(),
                    result,
                }
            }
            _ => return Err(self.mismatch(&label, shape, "not a field or property")),
        };
        Ok(self.build(label, shape, plan))
    }

    /// Field or property setter.
    pub fn setter(&self, member: &MemberDescriptor, shape: &CallShape) -> Result<Invoker> {
        let db = self.db();
        if !matches!(member.kind, MemberKind::Field | MemberKind::Property) {
            return Err(self.mismatch(&member.display(db), shape, "not a field or property"));
        }
        let (label, instance) = self.prepare(member, shape, 1)?;
        if shape.returns_value() {
            return Err(self.mismatch(&label, shape, "a setter returns no value"));
        }
        let value_param = shape.params[shape.params.len() - 1];
        let value = Conversion::classify(db, value_param, member.value_type)?;
        let plan = match &member.info.body {
            MemberBody::Field { .. } => InvokePlan::FieldSet {
                owner: member.declaring_type,
                name: member.name,
                instance,
                value,
            },
            MemberBody::Property { setter, .. } => {
                let Some(setter) = setter else {
                    return Err(self.mismatch(&label, shape, "the property has no setter"));
                };
                InvokePlan::Accessor {
                    body: Arc::clone(&setter.body),
                    instance,
                    args: vec![value],
                    result: Conversion::Discard,
                }
            }
            _ => return Err(self.mismatch(&label, shape, "not a field or property")),
        };
        Ok(self.build(label, shape, plan))
    }

    fn callable(&self, member: &MemberDescriptor, kind: MemberKind, shape: &CallShape) -> Result<NativeFn> {
        let label = member.display(self.db());
        match (&member.info.body, kind) {
            (MemberBody::Method(body), MemberKind::Method)
            | (MemberBody::Constructor(body), MemberKind::Constructor) => Ok(Arc::clone(body)),
            _ => Err(self.mismatch(&label, shape, format!("not a {}", kind.label()))),
        }
    }

    fn result_conversion(&self, from: TypeId, shape: &CallShape) -> Result<Conversion> {
        if !shape.returns_value() {
            return Ok(Conversion::Discard);
        }
        Conversion::classify(self.db(), from, shape.result)
    }

    /// Method with one shape parameter per method parameter.
    pub fn method(&self, member: &MemberDescriptor, shape: &CallShape) -> Result<Invoker> {
        let body = self.callable(member, MemberKind::Method, shape)?;
        let (label, instance) = self.prepare(member, shape, member.params.len())?;
        let offset = usize::from(instance.is_some());
        let args = member
            .params
            .iter()
            .zip(&shape.params[offset..])
            .map(|(&param, &given)| Conversion::classify(self.db(), given, param))
            .collect::<Result<Vec<_>>>()?;
        let result = self.result_conversion(member.value_type, shape)?;
        let plan = InvokePlan::Call {
            body,
            instance,
            args,
            spread: None,
            type_args: member.method_type_args.clone(),
            result,
        };
        Ok(self.build(label, shape, plan))
    }

    /// Method taking every argument in one array parameter.
    pub fn method_array(&self, member: &MemberDescriptor, shape: &CallShape) -> Result<Invoker> {
        let body = self.callable(member, MemberKind::Method, shape)?;
        let (label, instance) = self.prepare(member, shape, 1)?;
        let array_param = shape.params[shape.params.len() - 1];
        let (element, args) = self.element_conversions(&label, shape, array_param, &member.params)?;
        let result = self.result_conversion(member.value_type, shape)?;
        let plan = InvokePlan::Call {
            body,
            instance,
            args,
            spread: Some(element),
            type_args: member.method_type_args.clone(),
            result,
        };
        Ok(self.build(label, shape, plan))
    }

    /// Constructor with one shape parameter per constructor parameter.
    pub fn constructor(&self, member: &MemberDescriptor, shape: &CallShape) -> Result<Invoker> {
        let body = self.callable(member, MemberKind::Constructor, shape)?;
        let db = self.db();
        let label = member.display(db);
        if member.contains_generic_parameters(db) {
            return Err(ReflectError::OpenGeneric { ty: label });
        }
        if shape.params.len() != member.params.len() {
            return Err(self.mismatch(
                &label,
                shape,
                format!(
                    "expected {} parameters, the shape has {}",
                    member.params.len(),
                    shape.params.len()
                ),
            ));
        }
        let args = member
            .params
            .iter()
            .zip(&shape.params)
            .map(|(&param, &given)| Conversion::classify(db, given, param))
            .collect::<Result<Vec<_>>>()?;
        let result = self.constructed_conversion(&label, member, shape)?;
        let plan = InvokePlan::Construct {
            ty: member.declaring_type,
            body,
            args,
            spread: None,
            result,
        };
        Ok(self.build(label, shape, plan))
    }

    /// Constructor taking every argument in one array parameter.
    pub fn constructor_array(&self, member: &MemberDescriptor, shape: &CallShape) -> Result<Invoker> {
        let body = self.callable(member, MemberKind::Constructor, shape)?;
        let db = self.db();
        let label = member.display(db);
        if member.contains_generic_parameters(db) {
            return Err(ReflectError::OpenGeneric { ty: label });
        }
        if shape.params.len() != 1 {
            return Err(self.mismatch(&label, shape, "expected a single array parameter"));
        }
        let (element, args) = self.element_conversions(&label, shape, shape.params[0], &member.params)?;
        let result = self.constructed_conversion(&label, member, shape)?;
        let plan = InvokePlan::Construct {
            ty: member.declaring_type,
            body,
            args,
            spread: Some(element),
            result,
        };
        Ok(self.build(label, shape, plan))
    }

    fn constructed_conversion(
        &self,
        label: &str,
        member: &MemberDescriptor,
        shape: &CallShape,
    ) -> Result<Conversion> {
        if !shape.returns_value() {
            return Err(self.mismatch(label, shape, "a constructor returns the new instance"));
        }
        Conversion::classify(self.db(), member.declaring_type, shape.result)
    }

    fn element_conversions(
        &self,
        label: &str,
        shape: &CallShape,
        array_param: TypeId,
        params: &[TypeId],
    ) -> Result<(TypeId, Vec<Conversion>)> {
        let db = self.db();
        let Some(TypeData::Array(element)) = db.lookup(array_param) else {
            return Err(self.mismatch(label, shape, "the argument parameter isn't an array"));
        };
        let conversions = params
            .iter()
            .map(|&param| Conversion::classify(db, element, param))
            .collect::<Result<Vec<_>>>()?;
        Ok((element, conversions))
    }

    // -------------------------------------------------------------------------
    // Natural and erased shapes
    // -------------------------------------------------------------------------

    /// Getter typed with the member's own types.
    pub fn natural_getter(&self, member: &MemberDescriptor) -> Result<Invoker> {
        self.getter(member, &CallShape::natural(member))
    }

    pub fn natural_setter(&self, member: &MemberDescriptor) -> Result<Invoker> {
        self.setter(member, &CallShape::natural_setter(member))
    }

    /// Method typed with its own signature; an action when it returns `VOID`.
    pub fn natural_method(&self, member: &MemberDescriptor) -> Result<Invoker> {
        self.method(member, &CallShape::natural(member))
    }

    pub fn natural_constructor(&self, member: &MemberDescriptor) -> Result<Invoker> {
        self.constructor(member, &CallShape::natural(member))
    }

    /// `[object] -> object` getter; the receiver is checked at call time.
    pub fn erased_getter(&self, member: &MemberDescriptor) -> Result<Invoker> {
        self.getter(member, &CallShape::erased(member))
    }

    pub fn erased_setter(&self, member: &MemberDescriptor) -> Result<Invoker> {
        self.setter(member, &CallShape::erased_setter(member))
    }

    /// `[object,] object, .. -> object` method invoker.
    pub fn erased_method(&self, member: &MemberDescriptor) -> Result<Invoker> {
        self.method(member, &CallShape::erased(member))
    }

    /// `[object,] object[] -> object` method invoker, or an action for
    /// methods returning `VOID`.
    pub fn erased_method_array(&self, member: &MemberDescriptor) -> Result<Invoker> {
        self.method_array(member, &CallShape::erased_array(self.db(), member))
    }

    /// `object[] -> object` constructor invoker.
    pub fn erased_constructor_array(&self, member: &MemberDescriptor) -> Result<Invoker> {
        self.constructor_array(member, &CallShape::erased_array(self.db(), member))
    }

    /// Zero-argument invoker producing the default value of `ty`.
    pub fn default_value(&self, ty: TypeId, shape: &CallShape) -> Result<Invoker> {
        let db = self.db();
        check_known(db, ty)?;
        let label = TypeFormatter::new(db).format(ty);
        if contains_params(db, ty) {
            return Err(ReflectError::OpenGeneric { ty: label });
        }
        if !shape.params.is_empty() {
            return Err(self.mismatch(&label, shape, "a default value takes no parameters"));
        }
        let result = Conversion::classify(db, ty, shape.result)?;
        trace!(ty = ty.0, ?result, "default_value");
        Ok(self.build(format!("default({label})"), shape, InvokePlan::Default { ty, result }))
    }

    /// One-argument invoker converting `from` to `to` with checked
    /// semantics. Unconvertible pairs fail here, not at call time.
    pub fn cast(&self, from: TypeId, to: TypeId, shape: &CallShape) -> Result<Invoker> {
        let db = self.db();
        let fmt = TypeFormatter::new(db);
        let label = format!("({}) {}", fmt.format(to), fmt.format(from));
        if shape.params.len() != 1 {
            return Err(self.mismatch(&label, shape, "a cast takes exactly one parameter"));
        }
        let input = Conversion::classify(db, shape.params[0], from)?;
        let convert = Conversion::classify(db, from, to)?;
        let result = Conversion::classify(db, to, shape.result)?;
        let plan = InvokePlan::Cast {
            input,
            convert,
            result,
        };
        Ok(self.build(label, shape, plan))
    }
}

#[cfg(test)]
#[path = "../tests/invoke_tests.rs"]
mod tests;
