//! Value conversions chosen once at synthesis time and applied per call.
//!
//! `Conversion::classify` decides whether `from -> to` is possible at all and
//! which runtime work it needs. Everything knowable from the two types is
//! decided there; only numeric ranges and runtime object types are checked
//! when a value is converted.
//!
//! Identity and upcast conversions trust their input. Values entering an
//! invoker go through [`admit`] against the declared shape type first.

use crate::db::TypeDatabase;
use crate::error::{InvokeError, ReflectError, Result};
use crate::format::TypeFormatter;
use crate::graph::{check_known, is_interface, is_value_type};
use crate::inheritance::structurally_inherits;
use crate::instantiate::contains_params;
use crate::types::{PrimitiveKind, TypeId};
use crate::value::Value;

/// Conversion of one value position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Conversion {
    /// Same type.
    Identity,
    /// Checked numeric conversion to the given kind.
    Numeric(PrimitiveKind),
    /// Reference upcast or boxing; the value passes unchanged.
    Upcast,
    /// Checked downcast or unboxing: the runtime type must inherit the target.
    Downcast(TypeId),
    /// Conversion to "no value".
    Discard,
}

fn numeric_kind(ty: TypeId) -> Option<PrimitiveKind> {
    PrimitiveKind::from_type_id(ty).filter(|kind| kind.is_numeric())
}

impl Conversion {
    /// Classify `from -> to`; `NotConvertible` when no conversion exists.
    pub fn classify(db: &dyn TypeDatabase, from: TypeId, to: TypeId) -> Result<Self> {
        check_known(db, from)?;
        check_known(db, to)?;
        if from == to {
            return Ok(Self::Identity);
        }
        if to.is_void() {
            return Ok(Self::Discard);
        }
        let fmt = TypeFormatter::new(db);
        let not_convertible = || ReflectError::NotConvertible {
            from: fmt.format(from),
            to: fmt.format(to),
        };
        if from.is_void() {
            return Err(not_convertible());
        }
        for ty in [from, to] {
            if contains_params(db, ty) {
                return Err(ReflectError::OpenGeneric { ty: fmt.format(ty) });
            }
        }

        if let (Some(_), Some(target)) = (numeric_kind(from), numeric_kind(to)) {
            return Ok(Self::Numeric(target));
        }
        if structurally_inherits(db, from, to) {
            return Ok(Self::Upcast);
        }
        if structurally_inherits(db, to, from) {
            return Ok(Self::Downcast(to));
        }
        // An unrelated reference type may still implement the interface at
        // runtime.
        let interface_cast = (is_interface(db, to) && !is_value_type(db, from))
            || (is_interface(db, from) && !is_value_type(db, to));
        if interface_cast {
            return Ok(Self::Downcast(to));
        }
        Err(not_convertible())
    }

    /// Whether applying this conversion can fail at call time.
    pub fn is_checked(self) -> bool {
        matches!(self, Self::Numeric(_) | Self::Downcast(_))
    }

    /// Convert one value.
    pub fn apply(self, db: &dyn TypeDatabase, value: Value) -> std::result::Result<Value, InvokeError> {
        match self {
            Self::Identity | Self::Upcast => Ok(value),
            Self::Discard => Ok(Value::Unit),
            Self::Numeric(kind) => convert_numeric(db, value, kind),
            Self::Downcast(target) => downcast(db, value, target),
        }
    }
}

fn invalid_cast(db: &dyn TypeDatabase, value: &Value, to: TypeId) -> InvokeError {
    let fmt = TypeFormatter::new(db);
    InvokeError::InvalidCast {
        from: value
            .runtime_type(db)
            .map(|ty| fmt.format(ty))
            .unwrap_or_else(|| value.to_string()),
        to: fmt.format(to),
    }
}

fn convert_numeric(
    db: &dyn TypeDatabase,
    value: Value,
    kind: PrimitiveKind,
) -> std::result::Result<Value, InvokeError> {
    if value.is_null() {
        return Err(InvokeError::NullReference(format!(
            "null can't be converted to {}",
            kind.name()
        )));
    }
    let overflow = |value: &Value| InvokeError::Overflow {
        value: value.to_string(),
        target: kind.name().to_string(),
    };

    match kind {
        PrimitiveKind::F32 => value
            .as_f64()
            .map(|v| Value::F32(v as f32))
            .ok_or_else(|| invalid_cast(db, &value, kind.type_id())),
        PrimitiveKind::F64 => value
            .as_f64()
            .map(Value::F64)
            .ok_or_else(|| invalid_cast(db, &value, kind.type_id())),
        PrimitiveKind::Bool => Err(invalid_cast(db, &value, kind.type_id())),
        _ => {
            let integral = match value {
                Value::F32(_) | Value::F64(_) => {
                    let Some(v) = value.as_f64() else {
                        return Err(invalid_cast(db, &value, kind.type_id()));
                    };
                    let truncated = v.trunc();
                    if !truncated.is_finite() || truncated.abs() > 1e38 {
                        return Err(overflow(&value));
                    }
                    truncated as i128
                }
                _ => match value.as_integral() {
                    Some(v) => v,
                    None => return Err(invalid_cast(db, &value, kind.type_id())),
                },
            };
            Value::from_integral(kind, integral).ok_or_else(|| overflow(&value))
        }
    }
}

/// Check that `value` is a legal argument for a position declared as
/// `declared`: null only for non-value types, otherwise a runtime type that
/// inherits the declared one.
pub fn admit(db: &dyn TypeDatabase, value: &Value, declared: TypeId) -> std::result::Result<(), InvokeError> {
    if value.is_null() {
        if is_value_type(db, declared) {
            return Err(InvokeError::NullReference(format!(
                "null passed where {} is expected",
                TypeFormatter::new(db).format(declared)
            )));
        }
        return Ok(());
    }
    match value.runtime_type(db) {
        Some(runtime) if runtime == declared || structurally_inherits(db, runtime, declared) => Ok(()),
        _ => Err(invalid_cast(db, value, declared)),
    }
}

fn downcast(db: &dyn TypeDatabase, value: Value, target: TypeId) -> std::result::Result<Value, InvokeError> {
    match value.runtime_type(db) {
        None if value.is_null() => {
            if is_value_type(db, target) {
                Err(InvokeError::NullReference(format!(
                    "null can't be unboxed to {}",
                    TypeFormatter::new(db).format(target)
                )))
            } else {
                Ok(value)
            }
        }
        Some(runtime) if structurally_inherits(db, runtime, target) => Ok(value),
        _ => Err(invalid_cast(db, &value, target)),
    }
}

/// Canonical default of a primitive or reference type: zero, `false`,
/// `'\0'`, or null. Structs need an allocation and are handled by the
/// invoker layer.
pub fn primitive_default(ty: TypeId) -> Value {
    match PrimitiveKind::from_type_id(ty) {
        Some(kind) => Value::zero(kind),
        None => Value::Null,
    }
}

#[cfg(test)]
#[path = "../tests/convert_tests.rs"]
mod tests;
