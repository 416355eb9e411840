//! Reified control: frames, step tags, and transitions
//!
//! The interpreter's "call stack" is an explicit cons list of [`Frame`]s,
//! one per active AST node, each owning its parent through `cont`. A
//! frame records where its node's protocol will resume (`step`), the
//! evaluation mode requested by the parent, an optional sequence-point
//! tag, the loop-frame break target, and per-kind scratch state.
//!
//! [`Control::Return`] is the sentinel continuation: a step that resolves
//! to it tells the driver to unwind one function frame (or, with no frame
//! open, that evaluation is complete).

use super::effects::Effect;
use super::errors::StepError;
use crate::ast::Node;
use crate::memory::value::{PointerValue, Value};
use crate::types::{ParamDecl, Type};
use std::rc::Rc;

/// The current continuation: a live frame or the return sentinel
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Return,
    Frame(Box<Frame>),
}

impl Control {
    pub fn is_return(&self) -> bool {
        matches!(self, Control::Return)
    }

    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Control::Frame(frame) => Some(frame),
            Control::Return => None,
        }
    }
}

/// Whether an expression produces an address-bearing reference or a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Value,
    Lvalue,
}

/// Sequence-point tag observed by drivers for well-defined pause points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqPoint {
    Expr,
    Stmt,
}

/// Where a node's protocol resumes. Most protocols use small indices;
/// the call protocol adds its frame-setup and return re-entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTag {
    At(usize),
    CallEnter,
    CallReturn,
}

impl StepTag {
    pub fn index(self) -> Option<usize> {
        match self {
            StepTag::At(index) => Some(index),
            _ => None,
        }
    }
}

/// Per-kind scratch carried across a node's steps
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scratch {
    #[default]
    None,
    /// Call protocol: `values[0]` is the callee, the rest are arguments
    Values(Vec<Value>),
    /// Binary operator: the evaluated left operand
    Lhs(Value),
    /// Assignment: the evaluated left-hand lvalue
    Lvalue(PointerValue),
    /// Compound assignment: the lvalue and the value loaded through it
    ReadModify { lvalue: PointerValue, old: Value },
    /// Casts: whichever of the two children has completed
    Cast {
        value: Option<Value>,
        ty: Option<Type>,
    },
    /// Array subscript: the evaluated (decayed) base pointer
    Base(Value),
    /// Variable declaration: the evaluated declared type
    DeclType(Type),
    /// Constant array type: the evaluated element type
    Elem(Type),
    /// Function prototype: result type, then parameters as they complete
    Proto {
        result: Type,
        params: Vec<ParamDecl>,
    },
}

/// One active AST node's continuation point
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub node: Rc<Node>,
    pub step: StepTag,
    pub cont: Control,
    pub mode: Mode,
    pub seq: Option<SeqPoint>,
    /// Present exactly on loop frames: the step to resume at after a
    /// `break`
    pub break_step: Option<StepTag>,
    pub scratch: Scratch,
}

impl Frame {
    /// Fresh frame for `node`, starting its protocol at step 0
    pub fn enter(node: Rc<Node>, cont: Control) -> Box<Frame> {
        Box::new(Frame {
            node,
            step: StepTag::At(0),
            cont,
            mode: Mode::Value,
            seq: None,
            break_step: None,
            scratch: Scratch::None,
        })
    }

    /// Re-enter this frame at a numeric step
    pub fn at(mut self: Box<Self>, step: usize) -> Box<Self> {
        self.step = StepTag::At(step);
        self
    }

    pub fn control(self: Box<Self>) -> Control {
        Control::Frame(self)
    }
}

/// What a completed step leaves in the driver-owned result slot
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    /// Statements and declarations complete with no value
    Void,
    Value(Value),
    /// Type expressions evaluate to types
    Type(Type),
    /// A `ParmVarDecl` evaluates to a named parameter
    Param(ParamDecl),
}

impl StepResult {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            StepResult::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&Type> {
        match self {
            StepResult::Type(ty) => Some(ty),
            _ => None,
        }
    }
}

/// The outcome of one `step` invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// The next continuation
    pub control: Control,
    /// If present, the driver stores this into `state.result`
    pub result: Option<StepResult>,
    /// Ordered state-change requests; the driver applies them before the
    /// next step
    pub effects: Vec<Effect>,
    /// Structural failure (undispatchable node); never raised
    pub error: Option<StepError>,
}

impl Transition {
    pub fn to(control: Control) -> Transition {
        Transition {
            control,
            result: None,
            effects: Vec::new(),
            error: None,
        }
    }

    pub fn with_result(mut self, result: StepResult) -> Transition {
        self.result = Some(result);
        self
    }

    pub fn with_value(self, value: Value) -> Transition {
        self.with_result(StepResult::Value(value))
    }

    pub fn with_effect(mut self, effect: Effect) -> Transition {
        self.effects.push(effect);
        self
    }

    /// A structural error: control is left in place for the driver to
    /// inspect
    pub fn structural(control: Control, error: StepError) -> Transition {
        Transition {
            control,
            result: None,
            effects: Vec::new(),
            error: Some(error),
        }
    }
}
