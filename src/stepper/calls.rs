//! The call protocol
//!
//! A call collects its children numerically: child 0 is the callee, then
//! one argument per step, each appended to the frame's `values` scratch.
//! With everything collected the callee value decides the dispatch:
//!
//! - a **builtin** is invoked with the caller's continuation and the
//!   collected values and returns the next transition itself;
//! - a **function** first evaluates its declaration's type AST (to learn
//!   the formal parameters), then at [`StepTag::CallEnter`] emits the
//!   `Call` effect capturing the return continuation, one `VarDecl`
//!   effect per parameter/argument pair, and descends into the body with
//!   the return sentinel as its continuation, so falling off the end
//!   behaves as an implicit `return;`;
//! - anything else is a semantic error.
//!
//! At [`StepTag::CallReturn`] the driver has already unwound the callee's
//! scope; the step forwards the returned value to the caller.

use super::control::{Control, Frame, Scratch, StepTag, Transition};
use super::effects::Effect;
use super::errors::StepError;
use super::{child, enter_operand, enter_plain, enter_stmt, expect_type, expect_value, Mode};
use crate::ast::Node;
use crate::memory::value::Value;
use crate::state::State;
use crate::types::Type;
use std::rc::Rc;

pub(super) fn step_call_expr(state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    match frame.step {
        StepTag::At(0) => {
            let callee = child(&frame, 0)?;
            let mut cont = frame.at(1);
            cont.scratch = Scratch::Values(Vec::new());
            Ok(Transition::to(enter_operand(&callee, cont.control(), Mode::Value)))
        }
        StepTag::At(index) => {
            let mut frame = frame;
            let Scratch::Values(values) = &mut frame.scratch else {
                return Err(StepError::Protocol {
                    context: "call frame lost its collected values",
                });
            };
            values.push(expect_value(state)?);
            if index < frame.node.children.len() {
                let argument = child(&frame, index)?;
                let cont = frame.at(index + 1);
                Ok(Transition::to(enter_operand(
                    &argument,
                    cont.control(),
                    Mode::Value,
                )))
            } else {
                dispatch_callee(state, frame)
            }
        }
        StepTag::CallEnter => open_function_frame(state, frame),
        StepTag::CallReturn => {
            let mut transition = Transition::to(frame.cont);
            transition.result = state.result.clone();
            Ok(transition)
        }
    }
}

/// All children are collected; decide what kind of call this is
fn dispatch_callee(state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    let Scratch::Values(values) = &frame.scratch else {
        return Err(StepError::Protocol {
            context: "call frame lost its collected values",
        });
    };
    match values.first() {
        Some(Value::Builtin(builtin)) => {
            let builtin = *builtin;
            let values = values.clone();
            builtin(state, frame.cont, &values)
        }
        Some(Value::Function(decl)) => {
            // The declaration's type AST yields the formal parameters.
            let ty = function_type_node(decl)?;
            let mut cont = frame;
            cont.step = StepTag::CallEnter;
            Ok(Transition::to(enter_plain(&ty, cont.control())))
        }
        Some(other) => Err(StepError::NotCallable {
            found: other.kind_name(),
        }),
        None => Err(StepError::Protocol {
            context: "call frame collected no callee",
        }),
    }
}

/// Emit the frame-opening effects and descend into the callee's body
fn open_function_frame(state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    let ty = expect_type(state)?;
    let Type::Function(signature) = ty else {
        return Err(StepError::Protocol {
            context: "callee type did not evaluate to a function type",
        });
    };
    let Scratch::Values(values) = &frame.scratch else {
        return Err(StepError::Protocol {
            context: "call frame lost its collected values",
        });
    };
    let Some(Value::Function(decl)) = values.first() else {
        return Err(StepError::Protocol {
            context: "call frame lost its callee",
        });
    };
    let body = function_body_node(decl)?;
    let arguments = &values[1..];
    if signature.params.len() != arguments.len() {
        return Err(StepError::ArgumentCount {
            expected: signature.params.len(),
            got: arguments.len(),
        });
    }

    // The return continuation is this frame, re-entered at CallReturn.
    let mut ret = frame.clone();
    ret.step = StepTag::CallReturn;
    let mut transition = Transition::to(Control::Return).with_effect(Effect::Call {
        cont: ret.control(),
        values: values.clone(),
    });
    for (param, argument) in signature.params.iter().zip(arguments) {
        transition = transition.with_effect(Effect::VarDecl {
            name: param.name.clone(),
            ty: param.ty.clone(),
            init: Some(argument.clone()),
        });
    }
    // The body runs against the return sentinel: falling off the end
    // unwinds like an empty return.
    transition.control = enter_stmt(&body, Control::Return);
    Ok(transition)
}

fn function_type_node(decl: &Rc<Node>) -> Result<Rc<Node>, StepError> {
    decl.child(0).cloned().ok_or(StepError::MalformedNode {
        kind: decl.kind,
        expected: "a function type child",
    })
}

fn function_body_node(decl: &Rc<Node>) -> Result<Rc<Node>, StepError> {
    decl.child(1).cloned().ok_or(StepError::MalformedNode {
        kind: decl.kind,
        expected: "a function body child",
    })
}
