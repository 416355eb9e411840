//! The small-step core
//!
//! [`step`] advances a program by exactly one elementary computation. It
//! is a pure transition function: given the driver-owned [`State`] and
//! the current [`Control`], it returns a [`Transition`] holding the next
//! control, an optional result, and the ordered effects the driver must
//! apply. The stepper mutates nothing itself, so a transition is
//! replayable and a host can pause between any two steps.
//!
//! # Dispatch
//!
//! Each node kind has its own continuation protocol, implemented across:
//! - [`statements`]: compound blocks, declarations, `if`
//! - [`loops`]: `for`, `while`, `do`
//! - [`jumps`]: `break`, `continue`, `return`
//! - [`expressions`]: literals, references, operators, casts, `sizeof`
//! - [`calls`]: the call protocol (argument collection, frame setup,
//!   return forwarding)
//! - [`types`]: type expressions and variable declarations
//!
//! A node kind without a protocol (for example `FunctionDecl`, which the
//! driver consumes during program registration) produces a *structural*
//! error inside the transition rather than a raised one, so the driver
//! can surface it as a diagnostic.

pub mod calls;
pub mod control;
pub mod effects;
pub mod errors;
pub mod expressions;
pub mod jumps;
pub mod loops;
pub mod statements;
pub mod types;

pub use control::{Control, Frame, Mode, Scratch, SeqPoint, StepResult, StepTag, Transition};
pub use effects::Effect;
pub use errors::StepError;

use crate::ast::{Node, NodeKind};
use crate::memory::value::{PointerValue, Value};
use crate::scope::{self, DeclRef};
use crate::state::State;
use crate::types::{ParamDecl, Type};
use std::rc::Rc;

/// A host-provided builtin. Invoked with the state, the caller's
/// continuation, and the collected call values (`values[0]` is the
/// builtin binding itself); its transition is used directly, so a builtin
/// owns all of its sub-steps and effects.
pub type BuiltinFn = fn(&State, Control, &[Value]) -> Result<Transition, StepError>;

/// Advance the program by one step.
///
/// Structural failures (a node kind with no protocol) come back inside
/// the transition; semantic failures are raised as `Err`.
pub fn step(state: &State, control: Control) -> Result<Transition, StepError> {
    let frame = match control {
        Control::Return => return Err(StepError::HaltedControl),
        Control::Frame(frame) => frame,
    };
    match frame.node.kind {
        NodeKind::CompoundStmt => statements::step_compound_stmt(state, frame),
        NodeKind::DeclStmt => statements::step_decl_stmt(state, frame),
        NodeKind::IfStmt => statements::step_if_stmt(state, frame),
        NodeKind::ForStmt => loops::step_for_stmt(state, frame),
        NodeKind::WhileStmt => loops::step_while_stmt(state, frame),
        NodeKind::DoStmt => loops::step_do_stmt(state, frame),
        NodeKind::BreakStmt => jumps::step_break_stmt(state, frame),
        NodeKind::ContinueStmt => jumps::step_continue_stmt(state, frame),
        NodeKind::ReturnStmt => jumps::step_return_stmt(state, frame),
        NodeKind::ParenExpr => expressions::step_paren_expr(state, frame),
        NodeKind::DeclRefExpr => expressions::step_decl_ref_expr(state, frame),
        NodeKind::IntegerLiteral
        | NodeKind::CharacterLiteral
        | NodeKind::FloatingLiteral
        | NodeKind::StringLiteral => expressions::step_literal(state, frame),
        NodeKind::UnaryOperator => expressions::step_unary_operator(state, frame),
        NodeKind::UnaryExprOrTypeTraitExpr => expressions::step_sizeof_expr(state, frame),
        NodeKind::BinaryOperator => expressions::step_binary_operator(state, frame),
        NodeKind::CompoundAssignOperator => {
            expressions::step_compound_assign_operator(state, frame)
        }
        NodeKind::ArraySubscriptExpr => expressions::step_array_subscript_expr(state, frame),
        NodeKind::ConditionalOperator => expressions::step_conditional_operator(state, frame),
        NodeKind::ImplicitCastExpr => expressions::step_implicit_cast_expr(state, frame),
        NodeKind::CStyleCastExpr => expressions::step_cstyle_cast_expr(state, frame),
        NodeKind::CallExpr => calls::step_call_expr(state, frame),
        NodeKind::VarDecl => types::step_var_decl(state, frame),
        NodeKind::ParmVarDecl => types::step_parm_var_decl(state, frame),
        NodeKind::BuiltinType => types::step_builtin_type(state, frame),
        NodeKind::PointerType => types::step_pointer_type(state, frame),
        NodeKind::ConstantArrayType => types::step_constant_array_type(state, frame),
        NodeKind::FunctionProtoType => types::step_function_proto_type(state, frame),
        NodeKind::FunctionNoProtoType => types::step_function_no_proto_type(state, frame),
        kind => {
            let error = StepError::UnsteppableNode { kind };
            Ok(Transition::structural(Control::Frame(frame), error))
        }
    }
}

// ---- frame construction -------------------------------------------------

/// Enter a child as a statement (statement sequence point)
pub(crate) fn enter_stmt(node: &Rc<Node>, cont: Control) -> Control {
    let mut frame = Frame::enter(node.clone(), cont);
    frame.seq = Some(SeqPoint::Stmt);
    frame.control()
}

/// Enter a child as a full expression (expression sequence point)
pub(crate) fn enter_expr(node: &Rc<Node>, cont: Control, mode: Mode) -> Control {
    let mut frame = Frame::enter(node.clone(), cont);
    frame.seq = Some(SeqPoint::Expr);
    frame.mode = mode;
    frame.control()
}

/// Enter a sub-expression operand: no sequence point of its own
pub(crate) fn enter_operand(node: &Rc<Node>, cont: Control, mode: Mode) -> Control {
    let mut frame = Frame::enter(node.clone(), cont);
    frame.mode = mode;
    frame.control()
}

/// Enter a declaration or type child: no sequence point, value mode
pub(crate) fn enter_plain(node: &Rc<Node>, cont: Control) -> Control {
    Frame::enter(node.clone(), cont).control()
}

// ---- protocol accessors -------------------------------------------------

pub(crate) fn expect_result(state: &State) -> Result<&StepResult, StepError> {
    state.result.as_ref().ok_or(StepError::Protocol {
        context: "no result where the protocol requires one",
    })
}

pub(crate) fn expect_value(state: &State) -> Result<Value, StepError> {
    expect_result(state)?
        .as_value()
        .cloned()
        .ok_or(StepError::Protocol {
            context: "expected a value result",
        })
}

pub(crate) fn expect_pointer(state: &State) -> Result<PointerValue, StepError> {
    match expect_result(state)? {
        StepResult::Value(Value::Pointer(ptr)) => Ok(ptr.clone()),
        _ => Err(StepError::Protocol {
            context: "expected a pointer result",
        }),
    }
}

pub(crate) fn expect_type(state: &State) -> Result<Type, StepError> {
    expect_result(state)?
        .as_type()
        .cloned()
        .ok_or(StepError::Protocol {
            context: "expected a type result",
        })
}

pub(crate) fn expect_param(state: &State) -> Result<ParamDecl, StepError> {
    match expect_result(state)? {
        StepResult::Param(param) => Ok(param.clone()),
        _ => Err(StepError::Protocol {
            context: "expected a parameter result",
        }),
    }
}

/// Child accessor that faults as a malformed node instead of panicking
pub(crate) fn child(frame: &Frame, index: usize) -> Result<Rc<Node>, StepError> {
    frame
        .node
        .child(index)
        .cloned()
        .ok_or(StepError::MalformedNode {
            kind: frame.node.kind,
            expected: "more children",
        })
}

/// Scope lookup: walks the chain to the enclosing function barrier, then
/// the global map; failing both is a semantic error
pub(crate) fn lookup(state: &State, name: &str) -> Result<DeclRef, StepError> {
    scope::find_declaration(&state.scope, &state.globals, name).ok_or_else(|| {
        StepError::UndefinedName {
            name: name.to_string(),
        }
    })
}
