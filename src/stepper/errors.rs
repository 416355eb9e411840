//! Stepper error types
//!
//! Errors fall into three classes:
//!
//! - **Structural**: the node cannot be dispatched at all (a kind with no
//!   stepping protocol). These are *returned* inside the transition
//!   ([`crate::stepper::Transition::error`]) so the driver can surface
//!   them without the stepper aborting.
//! - **Semantic**: the program is wrong (undefined name, address of a
//!   non-addressable binding, a non-callable callee). These are raised as
//!   `Err` and are fatal to the session.
//! - **Delegated**: failures from the value algebra and the memory store,
//!   wrapped via `From`.
//!
//! No error is ever swallowed or downgraded to a no-op.

use crate::ast::NodeKind;
use crate::memory::ops::ValueError;
use crate::memory::MemoryError;
use std::fmt;

/// Errors produced while stepping
#[derive(Debug, Clone, PartialEq)]
pub enum StepError {
    /// No stepping protocol exists for this node kind
    UnsteppableNode { kind: NodeKind },

    /// A node is missing the attribute or child its protocol requires
    MalformedNode {
        kind: NodeKind,
        expected: &'static str,
    },

    /// Name lookup failed everywhere
    UndefinedName { name: String },

    /// The name is bound, but not to addressable storage, and was used
    /// as an lvalue
    NotAddressable { name: String },

    /// `sizeof` over an operand shape the walker does not understand
    UnsupportedSizeof { kind: NodeKind },

    /// The callee value is neither a function nor a builtin
    NotCallable { found: &'static str },

    /// Call arity does not match the function's prototype
    ArgumentCount { expected: usize, got: usize },

    /// String literal whose storage was never materialized by the loader
    MissingStringRef,

    /// `BuiltinType` naming no known scalar type
    UnknownTypeName { name: String },

    /// A literal lexeme that does not parse
    BadLiteral { lexeme: String },

    /// The control chain violated a protocol invariant (wrong result
    /// shape, missing scratch, step out of range)
    Protocol { context: &'static str },

    /// `step` was invoked on the return sentinel
    HaltedControl,

    /// Failure from the value algebra
    Value(ValueError),

    /// Failure from the memory store
    Memory(MemoryError),
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::UnsteppableNode { kind } => {
                write!(f, "no stepping protocol for node kind {}", kind.name())
            }
            StepError::MalformedNode { kind, expected } => {
                write!(f, "malformed {} node: expected {}", kind.name(), expected)
            }
            StepError::UndefinedName { name } => write!(f, "undefined name '{}'", name),
            StepError::NotAddressable { name } => {
                write!(f, "'{}' does not designate addressable storage", name)
            }
            StepError::UnsupportedSizeof { kind } => {
                write!(f, "sizeof over a {} operand is not supported", kind.name())
            }
            StepError::NotCallable { found } => {
                write!(f, "called value is not callable ({} value)", found)
            }
            StepError::ArgumentCount { expected, got } => {
                write!(f, "call expects {} argument(s), got {}", expected, got)
            }
            StepError::MissingStringRef => {
                write!(f, "string literal has no materialized storage")
            }
            StepError::UnknownTypeName { name } => write!(f, "unknown type name '{}'", name),
            StepError::BadLiteral { lexeme } => write!(f, "malformed literal '{}'", lexeme),
            StepError::Protocol { context } => {
                write!(f, "control protocol violation: {}", context)
            }
            StepError::HaltedControl => write!(f, "stepped the return sentinel"),
            StepError::Value(err) => write!(f, "{}", err),
            StepError::Memory(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for StepError {}

impl From<ValueError> for StepError {
    fn from(err: ValueError) -> Self {
        StepError::Value(err)
    }
}

impl From<MemoryError> for StepError {
    fn from(err: MemoryError) -> Self {
        StepError::Memory(err)
    }
}
