//! Error types for cadence_core

use thiserror::Error;

use crate::value::ValueKind;

/// Errors raised by the type registry and the object graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// No type with this name is registered
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// The type (or its bases) declares no property with this name
    #[error("type '{type_name}' has no property '{property}'")]
    UnknownProperty { type_name: String, property: String },

    /// The property is declared on a type this object does not derive from
    #[error("property '{property}' does not apply to objects of type '{type_name}'")]
    PropertyNotApplicable { type_name: String, property: String },

    /// The value does not match the property's kind
    #[error("property '{property}' expects {expected:?}, got {actual:?}")]
    ValueKindMismatch {
        property: String,
        expected: ValueKind,
        actual: Option<ValueKind>,
    },

    /// Items were added to an object whose type is not an ordered container
    #[error("objects of type '{0}' cannot hold items")]
    NotAContainer(String),

    /// The object already has a parent
    #[error("object is already the child of another object")]
    AlreadyParented,

    #[error("type '{0}' is already registered")]
    DuplicateType(String),

    #[error("type '{type_name}' already declares property '{property}'")]
    DuplicateProperty { type_name: String, property: String },
}

/// Result type for cadence_core operations
pub type Result<T> = std::result::Result<T, CoreError>;
