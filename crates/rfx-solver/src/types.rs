//! Core type terms.
//!
//! Types are interned into `TypeData` structures and handed out as `TypeId`
//! handles. Interning makes structural equality an integer comparison:
//! `List<Int32>` built twice yields the same `TypeId`.
//!
//! The builtin roots (`Object`, `ValueType`, the primitives, `String`, `Array`)
//! occupy fixed ids so algorithms can name them without a registry lookup.

use crate::def::DefId;
use rfx_common::interner::Atom;
use serde::Serialize;
use smallvec::SmallVec;

/// Argument list of a generic application.
pub type TypeList = SmallVec<[TypeId; 4]>;

// =============================================================================
// TypeId
// =============================================================================

/// Interned handle of a type term.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// "No value": method returns, setter results, and the shape wildcard.
    pub const VOID: TypeId = TypeId(0);
    pub const OBJECT: TypeId = TypeId(1);
    pub const VALUE_TYPE: TypeId = TypeId(2);
    pub const BOOL: TypeId = TypeId(3);
    pub const CHAR: TypeId = TypeId(4);
    pub const I8: TypeId = TypeId(5);
    pub const U8: TypeId = TypeId(6);
    pub const I16: TypeId = TypeId(7);
    pub const U16: TypeId = TypeId(8);
    pub const I32: TypeId = TypeId(9);
    pub const U32: TypeId = TypeId(10);
    pub const I64: TypeId = TypeId(11);
    pub const U64: TypeId = TypeId(12);
    pub const F32: TypeId = TypeId(13);
    pub const F64: TypeId = TypeId(14);
    pub const STRING: TypeId = TypeId(15);
    /// Base class of every array type.
    pub const ARRAY: TypeId = TypeId(16);

    /// Last id reserved for builtins. Builtin `TypeId(n)` is `Nominal(DefId(n))`.
    pub const LAST_BUILTIN: u32 = 16;

    /// Whether this is one of the fixed builtin ids.
    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.0 <= Self::LAST_BUILTIN
    }

    #[inline]
    pub const fn is_void(self) -> bool {
        self.0 == Self::VOID.0
    }
}

// =============================================================================
// Members and generic parameters
// =============================================================================

/// A member declared by a definition: `owner` plus its declaration index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MemberId {
    pub owner: DefId,
    pub index: u32,
}

/// Who declares a generic parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ParamOwner {
    /// A parameter of a generic type definition.
    Type(DefId),
    /// A parameter of a generic method definition.
    Method(MemberId),
}

/// A free generic parameter: its owner and its position in the owner's list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ParamRef {
    pub owner: ParamOwner,
    pub index: u32,
}

/// Declared generic parameter.
///
/// Constraints may mention other parameters of the same owner
/// (`TValue : TKey`) or the parameter itself (`T : IComparable<T>`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamInfo {
    pub name: Atom,
    pub constraints: Vec<TypeId>,
}

impl TypeParamInfo {
    pub fn new(name: Atom) -> Self {
        Self {
            name,
            constraints: Vec::new(),
        }
    }
}

// =============================================================================
// TypeData
// =============================================================================

/// Structural representation of a type. Interned into a `TypeId`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    /// No value.
    Void,
    /// A non-generic nominal type, or a generic definition whose arguments
    /// are its own parameters.
    Nominal(DefId),
    /// An instantiation of a generic definition, closed or partially open.
    Application { def: DefId, args: TypeList },
    /// A free generic parameter.
    Param(ParamRef),
    /// Single-dimension array.
    Array(TypeId),
}

// =============================================================================
// Primitive kinds and visibility
// =============================================================================

/// Primitive value types with a native `Value` representation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PrimitiveKind {
    Bool,
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 12] = [
        Self::Bool,
        Self::Char,
        Self::I8,
        Self::U8,
        Self::I16,
        Self::U16,
        Self::I32,
        Self::U32,
        Self::I64,
        Self::U64,
        Self::F32,
        Self::F64,
    ];

    pub const fn type_id(self) -> TypeId {
        match self {
            Self::Bool => TypeId::BOOL,
            Self::Char => TypeId::CHAR,
            Self::I8 => TypeId::I8,
            Self::U8 => TypeId::U8,
            Self::I16 => TypeId::I16,
            Self::U16 => TypeId::U16,
            Self::I32 => TypeId::I32,
            Self::U32 => TypeId::U32,
            Self::I64 => TypeId::I64,
            Self::U64 => TypeId::U64,
            Self::F32 => TypeId::F32,
            Self::F64 => TypeId::F64,
        }
    }

    pub fn from_type_id(id: TypeId) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_id() == id)
    }

    /// Runtime type name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "Boolean",
            Self::Char => "Char",
            Self::I8 => "SByte",
            Self::U8 => "Byte",
            Self::I16 => "Int16",
            Self::U16 => "UInt16",
            Self::I32 => "Int32",
            Self::U32 => "UInt32",
            Self::I64 => "Int64",
            Self::U64 => "UInt64",
            Self::F32 => "Single",
            Self::F64 => "Double",
        }
    }

    /// Short alias accepted by the type-name parser.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::I8 => "sbyte",
            Self::U8 => "byte",
            Self::I16 => "short",
            Self::U16 => "ushort",
            Self::I32 => "int",
            Self::U32 => "uint",
            Self::I64 => "long",
            Self::U64 => "ulong",
            Self::F32 => "float",
            Self::F64 => "double",
        }
    }

    /// Participates in numeric conversions (everything but `Bool`).
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool)
    }

    pub const fn is_floating(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Inclusive integral range; `None` for `Bool` and floating kinds.
    /// `Char` is a UTF-16 code unit.
    pub const fn integral_range(self) -> Option<(i128, i128)> {
        match self {
            Self::Char => Some((0, u16::MAX as i128)),
            Self::I8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::U8 => Some((0, u8::MAX as i128)),
            Self::I16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::U16 => Some((0, u16::MAX as i128)),
            Self::I32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::U32 => Some((0, u32::MAX as i128)),
            Self::I64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::U64 => Some((0, u64::MAX as i128)),
            Self::Bool | Self::F32 | Self::F64 => None,
        }
    }
}

/// Member accessibility.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Internal,
    Private,
}

impl Visibility {
    #[inline]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

/// Kind of a declared member.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum MemberKind {
    Field,
    Property,
    Method,
    Constructor,
}

impl MemberKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Property => "property",
            Self::Method => "method",
            Self::Constructor => "constructor",
        }
    }
}
