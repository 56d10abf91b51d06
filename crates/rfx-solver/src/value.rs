//! Dynamic values that synthesized invokers consume and produce.
//!
//! Primitives and strings are carried inline. Objects and arrays are shared
//! references: cloning a `Value::Object` clones the handle, not the instance,
//! and equality on them is identity.

use crate::db::TypeDatabase;
use crate::types::{PrimitiveKind, TypeData, TypeId};
use parking_lot::RwLock;
use rfx_common::interner::Atom;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Value
// =============================================================================

#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Result of an invoker whose shape returns no value.
    #[default]
    Unit,
    /// Null reference.
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(Arc<str>),
    Object(ObjectRef),
    Array(ArrayRef),
}

impl Value {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::String(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }

    /// Primitive kind of an inline primitive value.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            Self::Bool(_) => PrimitiveKind::Bool,
            Self::Char(_) => PrimitiveKind::Char,
            Self::I8(_) => PrimitiveKind::I8,
            Self::U8(_) => PrimitiveKind::U8,
            Self::I16(_) => PrimitiveKind::I16,
            Self::U16(_) => PrimitiveKind::U16,
            Self::I32(_) => PrimitiveKind::I32,
            Self::U32(_) => PrimitiveKind::U32,
            Self::I64(_) => PrimitiveKind::I64,
            Self::U64(_) => PrimitiveKind::U64,
            Self::F32(_) => PrimitiveKind::F32,
            Self::F64(_) => PrimitiveKind::F64,
            _ => return None,
        })
    }

    /// Runtime type of the value; `None` for `Null` and `Unit`.
    pub fn runtime_type(&self, db: &dyn TypeDatabase) -> Option<TypeId> {
        match self {
            Self::Unit | Self::Null => None,
            Self::String(_) => Some(TypeId::STRING),
            Self::Object(obj) => Some(obj.ty()),
            Self::Array(arr) => Some(db.intern(TypeData::Array(arr.element()))),
            other => other.primitive_kind().map(PrimitiveKind::type_id),
        }
    }

    /// Integral view of integer and char values.
    pub fn as_integral(&self) -> Option<i128> {
        Some(match *self {
            Self::Char(c) => c as u32 as i128,
            Self::I8(v) => v as i128,
            Self::U8(v) => v as i128,
            Self::I16(v) => v as i128,
            Self::U16(v) => v as i128,
            Self::I32(v) => v as i128,
            Self::U32(v) => v as i128,
            Self::I64(v) => v as i128,
            Self::U64(v) => v as i128,
            _ => return None,
        })
    }

    /// Floating view of any numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F32(v) => Some(v as f64),
            Self::F64(v) => Some(v),
            _ => self.as_integral().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Self::I32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Self::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Build an integral value of `kind`, or `None` when out of range.
    pub fn from_integral(kind: PrimitiveKind, v: i128) -> Option<Self> {
        let (min, max) = kind.integral_range()?;
        if v < min || v > max {
            return None;
        }
        Some(match kind {
            PrimitiveKind::Char => Self::Char(char::from_u32(v as u32)?),
            PrimitiveKind::I8 => Self::I8(v as i8),
            PrimitiveKind::U8 => Self::U8(v as u8),
            PrimitiveKind::I16 => Self::I16(v as i16),
            PrimitiveKind::U16 => Self::U16(v as u16),
            PrimitiveKind::I32 => Self::I32(v as i32),
            PrimitiveKind::U32 => Self::U32(v as u32),
            PrimitiveKind::I64 => Self::I64(v as i64),
            PrimitiveKind::U64 => Self::U64(v as u64),
            PrimitiveKind::Bool | PrimitiveKind::F32 | PrimitiveKind::F64 => return None,
        })
    }

    /// Zero value of a primitive kind.
    pub fn zero(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Bool => Self::Bool(false),
            PrimitiveKind::Char => Self::Char('\0'),
            PrimitiveKind::I8 => Self::I8(0),
            PrimitiveKind::U8 => Self::U8(0),
            PrimitiveKind::I16 => Self::I16(0),
            PrimitiveKind::U16 => Self::U16(0),
            PrimitiveKind::I32 => Self::I32(0),
            PrimitiveKind::U32 => Self::U32(0),
            PrimitiveKind::I64 => Self::I64(0),
            PrimitiveKind::U64 => Self::U64(0),
            PrimitiveKind::F32 => Self::F32(0.0),
            PrimitiveKind::F64 => Self::F64(0.0),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unit, Self::Unit) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::I8(a), Self::I8(b)) => a == b,
            (Self::U8(a), Self::U8(b)) => a == b,
            (Self::I16(a), Self::I16(b)) => a == b,
            (Self::U16(a), Self::U16(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::U32(a), Self::U32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::U64(a), Self::U64(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a == b,
            (Self::F64(a), Self::F64(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("()"),
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Object(obj) => write!(f, "<object #{}>", obj.ty().0),
            Self::Array(arr) => write!(f, "<array[{}]>", arr.len()),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        })*
    };
}

impl_from!(
    bool => Bool,
    char => Char,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    ObjectRef => Object,
    ArrayRef => Array,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(Arc::from(v))
    }
}

// =============================================================================
// Objects
// =============================================================================

/// Instance storage: runtime type plus named field slots.
#[derive(Debug)]
pub struct ObjectData {
    ty: TypeId,
    fields: RwLock<FxHashMap<Atom, Value>>,
}

/// Shared handle to an instance.
#[derive(Clone, Debug)]
pub struct ObjectRef(Arc<ObjectData>);

impl ObjectRef {
    pub fn new(ty: TypeId, fields: FxHashMap<Atom, Value>) -> Self {
        Self(Arc::new(ObjectData {
            ty,
            fields: RwLock::new(fields),
        }))
    }

    /// Runtime type of the instance.
    pub fn ty(&self) -> TypeId {
        self.0.ty
    }

    pub fn get_field(&self, name: Atom) -> Option<Value> {
        self.0.fields.read().get(&name).cloned()
    }

    pub fn set_field(&self, name: Atom, value: Value) {
        self.0.fields.write().insert(name, value);
    }

    /// Overwrite an existing slot; `false` if the instance has no such field.
    pub fn replace_field(&self, name: Atom, value: Value) -> bool {
        match self.0.fields.write().get_mut(&name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// =============================================================================
// Arrays
// =============================================================================

#[derive(Debug)]
pub struct ArrayData {
    element: TypeId,
    items: RwLock<Vec<Value>>,
}

/// Shared handle to an array.
#[derive(Clone, Debug)]
pub struct ArrayRef(Arc<ArrayData>);

impl ArrayRef {
    pub fn new(element: TypeId, items: Vec<Value>) -> Self {
        Self(Arc::new(ArrayData {
            element,
            items: RwLock::new(items),
        }))
    }

    /// `object[]` holding `items`.
    pub fn of_objects(items: Vec<Value>) -> Self {
        Self::new(TypeId::OBJECT, items)
    }

    pub fn element(&self) -> TypeId {
        self.0.element
    }

    pub fn len(&self) -> usize {
        self.0.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.items.read().get(index).cloned()
    }

    pub fn push(&self, value: Value) {
        self.0.items.write().push(value);
    }

    /// Snapshot of the items.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.items.read().clone()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
#[path = "../tests/value_tests.rs"]
mod tests;
