//! Loop stepping: `for`, `while`, `do`
//!
//! A loop frame marks itself with `break_step` when it enters its body;
//! `break`/`continue` (see [`super::jumps`]) search the control chain for
//! that marker. The step a loop frame holds while its body runs is the
//! continue target: the update step for `for`, the condition re-test for
//! `while`, and the condition step for `do`.

use super::control::{Frame, StepResult, StepTag, Transition};
use super::errors::StepError;
use super::{child, enter_expr, enter_stmt, expect_value, Mode};
use crate::state::State;

/// Children: init, condition, update, body.
/// Steps: 0 init → 1 condition → 3 test → body (resume at 2, break at 4)
/// → 2 update → 1.
pub(super) fn step_for_stmt(state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let init = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_stmt(&init, cont)))
        }
        Some(1) => {
            let cond = child(&frame, 1)?;
            let cont = frame.at(3).control();
            Ok(Transition::to(enter_stmt(&cond, cont)))
        }
        Some(2) => {
            let update = child(&frame, 2)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_stmt(&update, cont)))
        }
        Some(3) => {
            if expect_value(state)?.to_bool() {
                let body = child(&frame, 3)?;
                let mut cont = frame.at(2);
                cont.break_step = Some(StepTag::At(4));
                Ok(Transition::to(enter_stmt(&body, cont.control())))
            } else {
                Ok(Transition::to(frame.cont).with_result(StepResult::Void))
            }
        }
        Some(4) => Ok(Transition::to(frame.cont).with_result(StepResult::Void)),
        _ => Err(StepError::Protocol {
            context: "for statement step out of range",
        }),
    }
}

/// Children: condition, body.
/// Steps: 0 condition → 1 test → body (resume at 0, break at 2).
pub(super) fn step_while_stmt(state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let cond = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_expr(&cond, cont, Mode::Value)))
        }
        Some(1) => {
            if expect_value(state)?.to_bool() {
                let body = child(&frame, 1)?;
                let mut cont = frame.at(0);
                cont.break_step = Some(StepTag::At(2));
                Ok(Transition::to(enter_stmt(&body, cont.control())))
            } else {
                Ok(Transition::to(frame.cont).with_result(StepResult::Void))
            }
        }
        Some(2) => Ok(Transition::to(frame.cont).with_result(StepResult::Void)),
        _ => Err(StepError::Protocol {
            context: "while statement step out of range",
        }),
    }
}

/// Children: body, condition.
/// Steps: 0 body (frame preset to 1 so `continue` lands on the
/// condition, break at 3) → 1 condition → 2 re-test → body or exit.
pub(super) fn step_do_stmt(state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let body = child(&frame, 0)?;
            let mut cont = frame.at(1);
            cont.break_step = Some(StepTag::At(3));
            Ok(Transition::to(enter_stmt(&body, cont.control())))
        }
        Some(1) => {
            let cond = child(&frame, 1)?;
            let cont = frame.at(2).control();
            Ok(Transition::to(enter_expr(&cond, cont, Mode::Value)))
        }
        Some(2) => {
            if expect_value(state)?.to_bool() {
                let body = child(&frame, 0)?;
                let mut cont = frame.at(1);
                cont.break_step = Some(StepTag::At(3));
                Ok(Transition::to(enter_stmt(&body, cont.control())))
            } else {
                Ok(Transition::to(frame.cont).with_result(StepResult::Void))
            }
        }
        Some(3) => Ok(Transition::to(frame.cont).with_result(StepResult::Void)),
        _ => Err(StepError::Protocol {
            context: "do statement step out of range",
        }),
    }
}
