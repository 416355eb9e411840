//! The effect protocol
//!
//! The stepper never mutates interpreter state. Every requested change is
//! emitted as an [`Effect`] in the transition, and the driver applies the
//! list in order before invoking the next step. This is what makes a
//! transition replayable: given the same `(state, control)`, the stepper
//! produces the same effects.

use super::control::Control;
use crate::ast::Node;
use crate::memory::value::{PointerValue, Value};
use crate::types::Type;
use std::rc::Rc;

/// A declarative state-change request, applied by the driver
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Open a block scope for this node
    Enter(Rc<Node>),

    /// Close the block scope opened for this node
    Leave(Rc<Node>),

    /// Allocate storage, bind `name` to its address, optionally
    /// initialize it
    VarDecl {
        name: String,
        ty: Type,
        init: Option<Value>,
    },

    /// Observability hook: the stepper has already read through this
    /// pointer
    Load(PointerValue),

    /// Write `value` through the pointer
    Store(PointerValue, Value),

    /// Open a function frame. `cont` is the continuation to resume when
    /// the callee returns; `values[0]` is the callee, the rest are the
    /// arguments.
    Call { cont: Control, values: Vec<Value> },
}
