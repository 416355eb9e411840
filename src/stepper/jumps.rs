//! Control transfer: `break`, `continue`, `return`
//!
//! `break` and `continue` discard the frames between themselves and the
//! nearest enclosing loop frame (the first ancestor carrying
//! `break_step`). `break` resumes the loop at its break target;
//! `continue` resumes it at the step it already holds, which every loop
//! protocol points at its re-test.
//!
//! `return` evaluates its operand and resolves to the return sentinel;
//! unwinding the function frame is the driver's half of the contract.

use super::control::{Control, Frame, SeqPoint, StepResult, Transition};
use super::errors::StepError;
use super::{child, enter_expr, Mode};
use crate::state::State;

/// Walk up the continuation chain to the nearest loop frame, discarding
/// the frames in between
fn unwind_to_loop(mut control: Control) -> Result<Box<Frame>, StepError> {
    loop {
        match control {
            Control::Return => {
                return Err(StepError::Protocol {
                    context: "break/continue outside of a loop",
                })
            }
            Control::Frame(frame) => {
                if frame.break_step.is_some() {
                    return Ok(frame);
                }
                control = frame.cont;
            }
        }
    }
}

pub(super) fn step_break_stmt(_state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    let mut target = unwind_to_loop(frame.cont)?;
    target.step = target.break_step.expect("unwind stops on loop frames");
    target.seq = Some(SeqPoint::Stmt);
    Ok(Transition::to(target.control()))
}

pub(super) fn step_continue_stmt(
    _state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    // The loop frame's current step already names its re-test point.
    let mut target = unwind_to_loop(frame.cont)?;
    target.seq = Some(SeqPoint::Stmt);
    Ok(Transition::to(target.control()))
}

pub(super) fn step_return_stmt(state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            if frame.node.children.is_empty() {
                return Ok(Transition::to(Control::Return).with_result(StepResult::Void));
            }
            let operand = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_expr(&operand, cont, Mode::Value)))
        }
        Some(1) => {
            let mut transition = Transition::to(Control::Return);
            transition.result = state.result.clone();
            Ok(transition)
        }
        _ => Err(StepError::Protocol {
            context: "return statement step out of range",
        }),
    }
}
