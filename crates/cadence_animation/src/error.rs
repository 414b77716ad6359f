//! Error types for cadence_animation

use cadence_core::ValueKind;
use thiserror::Error;

/// Errors raised while parsing or resolving a property path
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("invalid property path '{path}' at offset {position}: {message}")]
    Syntax {
        path: String,
        position: usize,
        message: String,
    },

    #[error("unknown type '{0}' in property path")]
    UnknownType(String),

    #[error("type '{type_name}' has no member '{member}'")]
    UnknownMember { type_name: String, member: String },

    /// A qualified member whose declaring type the object does not derive from
    #[error("'{owner}.{member}' cannot be used on an object of type '{type_name}'")]
    TypeMismatch {
        type_name: String,
        owner: String,
        member: String,
    },

    /// Only the final segment may omit the parentheses
    #[error("segment '{0}' must be parenthesized to traverse into a sub-object")]
    NonFinalBareSegment(String),

    #[error("'{0}' does not hold an indexable collection")]
    NotIndexable(String),

    #[error("index {index} is out of range for '{member}' ({len} items)")]
    IndexOutOfRange {
        member: String,
        index: usize,
        len: usize,
    },

    #[error("'{0}' is null and cannot be traversed")]
    NullIntermediate(String),

    #[error("'{0}' does not hold an object")]
    NotAnObject(String),

    #[error("the final segment '{0}' cannot be indexed")]
    IndexedFinalSegment(String),

    #[error("property '{property}' does not apply to objects of type '{type_name}'")]
    PropertyNotApplicable { type_name: String, property: String },
}

/// Errors raised by timelines, storyboards and the scheduler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("target name '{0}' does not resolve to an object in scope")]
    UnresolvedTargetName(String),

    #[error("{0} has no target")]
    NoTarget(String),

    #[error("{0} has no target property")]
    NoTargetProperty(String),

    #[error("invalid property path: {0}")]
    InvalidPath(#[from] PathError),

    /// Two animations in one tree drive the same property of the same object
    #[error("'{property}' on {target} is driven by more than one animation")]
    ConflictingTarget { target: String, property: String },

    #[error("{animation:?} animation cannot drive '{property}' of kind {expected:?}")]
    TypeMismatch {
        property: String,
        expected: ValueKind,
        animation: ValueKind,
    },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("timeline already belongs to a collection")]
    AlreadyInCollection,

    #[error("no animation scheduler is available")]
    SchedulerUnavailable,

    #[error("invalid scheduler configuration: {0}")]
    Config(String),
}

impl AnimationError {
    /// Whether this error reports an operation that is illegal in the current
    /// state of the timeline or object graph (as opposed to a bad argument)
    pub fn is_invalid_operation(&self) -> bool {
        matches!(
            self,
            AnimationError::UnresolvedTargetName(_)
                | AnimationError::NoTarget(_)
                | AnimationError::NoTargetProperty(_)
                | AnimationError::InvalidPath(_)
                | AnimationError::ConflictingTarget { .. }
                | AnimationError::TypeMismatch { .. }
                | AnimationError::InvalidOperation(_)
        )
    }
}

/// Result type for cadence_animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
