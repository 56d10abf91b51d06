//! Error types for resolution, lookup, synthesis and invocation.
//!
//! Variants carry already-formatted type names so an error can be displayed
//! (and sent across threads) without a registry in hand.

use thiserror::Error;

/// Coarse classification callers branch on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Nothing matched: not related, member not found.
    NotFound,
    /// More than one candidate survived.
    Ambiguous,
    /// A synthesis request doesn't fit the member or conversion.
    ShapeMismatch,
    /// Bad input: unknown handle, non-generic where generic was required,
    /// arity or constraint violations.
    InvalidArgument,
}

/// Failure of a relationship query, member lookup or invoker synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReflectError {
    #[error("\"{ty}\" isn't a \"{target}\"")]
    NotRelated { ty: String, target: String },

    #[error("{ty} isn't a generic type")]
    NotGeneric { ty: String },

    #[error("{ty} isn't a generic type definition")]
    NotGenericDefinition { ty: String },

    #[error("\"{ty}\" has ambiguous generic arguments for \"{target}\": {first} - {second}")]
    AmbiguousGenericArguments {
        ty: String,
        target: String,
        first: String,
        second: String,
    },

    #[error("{param} has ambiguous types for resolving \"{ty}\" to \"{target}\": {first} - {second}")]
    AmbiguousBinding {
        param: String,
        ty: String,
        target: String,
        first: String,
        second: String,
    },

    #[error("{ty} expects {expected} generic arguments but got {actual}")]
    GenericArityMismatch {
        ty: String,
        expected: usize,
        actual: usize,
    },

    #[error("{argument} violates the constraint {constraint} of {param} in {ty}")]
    ConstraintViolation {
        ty: String,
        param: String,
        argument: String,
        constraint: String,
    },

    #[error("type \"{ty}\" has no {kind} \"{name}\"")]
    MemberNotFound {
        ty: String,
        kind: &'static str,
        name: String,
    },

    #[error("{kind} \"{name}\" is ambiguous for \"{ty}\" ({count} candidates)")]
    AmbiguousMember {
        ty: String,
        kind: &'static str,
        name: String,
        count: usize,
    },

    #[error("cannot bind {member} to ({shape}): {reason}")]
    ShapeMismatch {
        member: String,
        shape: String,
        reason: String,
    },

    #[error("{from} isn't convertible to {to}")]
    NotConvertible { from: String, to: String },

    #[error("{ty} contains generic parameters and can't be invoked")]
    OpenGeneric { ty: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ReflectError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotRelated { .. } | Self::MemberNotFound { .. } => ErrorKind::NotFound,
            Self::AmbiguousGenericArguments { .. }
            | Self::AmbiguousBinding { .. }
            | Self::AmbiguousMember { .. } => ErrorKind::Ambiguous,
            Self::ShapeMismatch { .. } | Self::NotConvertible { .. } | Self::OpenGeneric { .. } => {
                ErrorKind::ShapeMismatch
            }
            Self::NotGeneric { .. }
            | Self::NotGenericDefinition { .. }
            | Self::GenericArityMismatch { .. }
            | Self::ConstraintViolation { .. }
            | Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.kind() == ErrorKind::Ambiguous
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Failure raised while an invoker runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    #[error("parameter count mismatch: expected {expected} arguments but got {actual}")]
    WrongArgumentCount { expected: usize, actual: usize },

    #[error("arithmetic operation resulted in an overflow: {value} doesn't fit {target}")]
    Overflow { value: String, target: String },

    #[error("unable to cast {from} to {to}")]
    InvalidCast { from: String, to: String },

    #[error("null reference: {0}")]
    NullReference(String),

    #[error("field '{field}' not found on {ty}")]
    MissingField { ty: String, field: String },

    #[error("{0}")]
    Native(String),
}

pub type Result<T, E = ReflectError> = std::result::Result<T, E>;
