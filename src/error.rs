//! Error taxonomy for the metaobject core.
//!
//! Mirrors the teacher's `VmError` shape: one flat enum, a hand-written
//! `Display`, and `std::error::Error` via the blanket impl below rather than
//! a derive macro.

use std::fmt;

use crate::type_info::TypeInfo;

/// All recoverable error conditions raised by the core (§7).
#[derive(Debug, Clone, PartialEq)]
pub enum MetaError {
    /// `Variable::type()` called on an empty variable.
    BadTypeId,
    /// `operator T()` found a type mismatch and no applicable converter.
    BadVariableCast { from: TypeInfo, to: TypeInfo },
    /// Operator or converter lookup against a type with no registered vtable.
    UnregisteredType(TypeInfo),
    /// A converter exists for the pair but the value itself could not convert.
    ConversionException { from: TypeInfo, to: TypeInfo },
    /// The converter's function pointer slot was empty.
    InvalidConverter { from: TypeInfo, to: TypeInfo },
    /// The operator vtable slot for this operation was empty.
    UndefinedOperator(&'static str),
    /// A meta-name violated the valid-character alphabet.
    InvalidMetaName(String),
    /// Attempted to mutate a sealed metaclass.
    MetaClassSealed(String),
    /// An extension with this name already exists on the metaclass or a super.
    DuplicateExtension(String),
    /// Attempted to attach an extension that already belongs to another object.
    ExtensionAlreadyOwned(String),
    /// Signal trigger arguments did not satisfy the signal's signature.
    SignatureMismatch,
}

impl fmt::Display for MetaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaError::BadTypeId => write!(f, "Variable::type() called on an empty Variable"),
            MetaError::BadVariableCast { from, to } => {
                write!(f, "cannot cast Variable of type {from} to {to}")
            }
            MetaError::UnregisteredType(t) => write!(f, "type {t} is not registered"),
            MetaError::ConversionException { from, to } => {
                write!(f, "failed to convert value of type {from} to {to}")
            }
            MetaError::InvalidConverter { from, to } => {
                write!(f, "no converter registered from {from} to {to}")
            }
            MetaError::UndefinedOperator(op) => write!(f, "operator '{op}' is not defined"),
            MetaError::InvalidMetaName(name) => write!(f, "invalid meta-name: '{name}'"),
            MetaError::MetaClassSealed(name) => {
                write!(f, "metaclass '{name}' is sealed and cannot be extended")
            }
            MetaError::DuplicateExtension(name) => {
                write!(f, "extension '{name}' is already registered on this metaclass chain")
            }
            MetaError::ExtensionAlreadyOwned(name) => {
                write!(f, "extension '{name}' already belongs to another object")
            }
            MetaError::SignatureMismatch => write!(f, "signal arguments do not match its signature"),
        }
    }
}

impl std::error::Error for MetaError {}

pub type MetaResult<T> = Result<T, MetaError>;
