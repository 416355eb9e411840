//! Statement stepping: blocks, declarations, `if`
//!
//! A compound block opens its scope with an `Enter` effect on first
//! entry, threads through its children one statement per re-entry, and
//! closes with `Leave`. Declaration statements thread their `VarDecl`
//! children the same way, without a scope of their own.

use super::control::{Frame, StepResult, Transition};
use super::effects::Effect;
use super::errors::StepError;
use super::{child, enter_expr, enter_plain, enter_stmt, expect_value, Mode};
use crate::state::State;

pub(super) fn step_compound_stmt(
    _state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    let step = frame.step.index().ok_or(StepError::Protocol {
        context: "compound statement re-entered at a call step",
    })?;
    let mut effects = Vec::new();
    if step == 0 {
        effects.push(Effect::Enter(frame.node.clone()));
    }
    if step < frame.node.children.len() {
        let next = child(&frame, step)?;
        let cont = frame.at(step + 1).control();
        let mut transition = Transition::to(enter_stmt(&next, cont));
        transition.effects = effects;
        Ok(transition)
    } else {
        effects.push(Effect::Leave(frame.node.clone()));
        let mut transition = Transition::to(frame.cont).with_result(StepResult::Void);
        transition.effects = effects;
        Ok(transition)
    }
}

pub(super) fn step_decl_stmt(_state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    let step = frame.step.index().ok_or(StepError::Protocol {
        context: "declaration statement re-entered at a call step",
    })?;
    if step < frame.node.children.len() {
        let next = child(&frame, step)?;
        let cont = frame.at(step + 1).control();
        // Declarations carry no sequence tag of their own; each
        // initializer is its own full expression.
        Ok(Transition::to(enter_plain(&next, cont)))
    } else {
        Ok(Transition::to(frame.cont).with_result(StepResult::Void))
    }
}

pub(super) fn step_if_stmt(state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let cond = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_expr(&cond, cont, Mode::Value)))
        }
        Some(1) => {
            if expect_value(state)?.to_bool() {
                let then = child(&frame, 1)?;
                let cont = frame.at(2).control();
                Ok(Transition::to(enter_stmt(&then, cont)))
            } else if let Some(otherwise) = frame.node.child(2).cloned() {
                let cont = frame.at(2).control();
                Ok(Transition::to(enter_stmt(&otherwise, cont)))
            } else {
                Ok(Transition::to(frame.cont).with_result(StepResult::Void))
            }
        }
        Some(2) => Ok(Transition::to(frame.cont).with_result(StepResult::Void)),
        _ => Err(StepError::Protocol {
            context: "if statement step out of range",
        }),
    }
}
