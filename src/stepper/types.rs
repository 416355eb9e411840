//! Type expressions and declarations
//!
//! Type ASTs evaluate to [`Type`] results: a `BuiltinType` resolves its
//! name against the scalar-type table, wrapper kinds evaluate their
//! children and build the composite. A `ParmVarDecl` pairs its declared
//! name with its type and hands that to the enclosing prototype; a
//! `VarDecl` finishes by requesting storage through the `VarDecl` effect.

use super::control::{Frame, Mode, Scratch, StepResult, Transition};
use super::effects::Effect;
use super::errors::StepError;
use super::{child, enter_expr, enter_operand, enter_plain, expect_param, expect_type, expect_value};
use crate::state::State;
use crate::types::{scalar_type, ParamDecl, Type};

/// Children: type expression, then an optional initializer
pub(super) fn step_var_decl(state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    let name = named(&frame)?;
    match frame.step.index() {
        Some(0) => {
            let ty = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_plain(&ty, cont)))
        }
        Some(1) => {
            let ty = expect_type(state)?;
            if let Some(init) = frame.node.child(1).cloned() {
                let mut cont = frame.at(2);
                cont.scratch = Scratch::DeclType(ty);
                // Each initializer is a full expression of its own.
                Ok(Transition::to(enter_expr(&init, cont.control(), Mode::Value)))
            } else {
                Ok(Transition::to(frame.cont)
                    .with_effect(Effect::VarDecl {
                        name,
                        ty,
                        init: None,
                    })
                    .with_result(StepResult::Void))
            }
        }
        Some(2) => {
            let init = expect_value(state)?;
            let Frame { cont, scratch, .. } = *frame;
            let Scratch::DeclType(ty) = scratch else {
                return Err(StepError::Protocol {
                    context: "variable declaration lost its type",
                });
            };
            Ok(Transition::to(cont)
                .with_effect(Effect::VarDecl {
                    name,
                    ty,
                    init: Some(init),
                })
                .with_result(StepResult::Void))
        }
        _ => Err(StepError::Protocol {
            context: "variable declaration step out of range",
        }),
    }
}

pub(super) fn step_parm_var_decl(
    state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let ty = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_plain(&ty, cont)))
        }
        Some(1) => {
            let name = named(&frame)?;
            let ty = expect_type(state)?;
            Ok(Transition::to(frame.cont).with_result(StepResult::Param(ParamDecl { name, ty })))
        }
        _ => Err(StepError::Protocol {
            context: "parameter declaration step out of range",
        }),
    }
}

pub(super) fn step_builtin_type(
    _state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    let name = named(&frame)?;
    let ty = scalar_type(&name).ok_or(StepError::UnknownTypeName { name })?;
    Ok(Transition::to(frame.cont).with_result(StepResult::Type(ty)))
}

pub(super) fn step_pointer_type(
    state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let pointee = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_plain(&pointee, cont)))
        }
        Some(1) => {
            let pointee = expect_type(state)?;
            Ok(Transition::to(frame.cont).with_result(StepResult::Type(Type::pointer(pointee))))
        }
        _ => Err(StepError::Protocol {
            context: "pointer type step out of range",
        }),
    }
}

/// Children: element type, then the element count expression
pub(super) fn step_constant_array_type(
    state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let elem = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_plain(&elem, cont)))
        }
        Some(1) => {
            let elem = expect_type(state)?;
            let count = child(&frame, 1)?;
            let mut cont = frame.at(2);
            cont.scratch = Scratch::Elem(elem);
            Ok(Transition::to(enter_operand(&count, cont.control(), Mode::Value)))
        }
        Some(2) => {
            let count = expect_value(state)?;
            let count = count
                .as_integral()
                .filter(|v| v.number >= 0)
                .map(|v| v.number as usize)
                .ok_or(StepError::Protocol {
                    context: "array extent did not evaluate to a non-negative integer",
                })?;
            let Frame { cont, scratch, .. } = *frame;
            let Scratch::Elem(elem) = scratch else {
                return Err(StepError::Protocol {
                    context: "array type lost its element type",
                });
            };
            Ok(Transition::to(cont)
                .with_result(StepResult::Type(Type::constant_array(elem, count))))
        }
        _ => Err(StepError::Protocol {
            context: "array type step out of range",
        }),
    }
}

/// Children: result type, then one `ParmVarDecl` per formal parameter
pub(super) fn step_function_proto_type(
    state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    let step = frame.step.index().ok_or(StepError::Protocol {
        context: "function prototype re-entered at a call step",
    })?;
    match step {
        0 => {
            let result = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_plain(&result, cont)))
        }
        _ => {
            let mut frame = frame;
            if step == 1 {
                frame.scratch = Scratch::Proto {
                    result: expect_type(state)?,
                    params: Vec::new(),
                };
            } else {
                let param = expect_param(state)?;
                let Scratch::Proto { params, .. } = &mut frame.scratch else {
                    return Err(StepError::Protocol {
                        context: "function prototype lost its signature",
                    });
                };
                params.push(param);
            }
            if step < frame.node.children.len() {
                let next = child(&frame, step)?;
                let cont = frame.at(step + 1).control();
                Ok(Transition::to(enter_plain(&next, cont)))
            } else {
                let Frame { cont, scratch, .. } = *frame;
                let Scratch::Proto { result, params } = scratch else {
                    return Err(StepError::Protocol {
                        context: "function prototype lost its signature",
                    });
                };
                Ok(Transition::to(cont)
                    .with_result(StepResult::Type(Type::function(result, params))))
            }
        }
    }
}

/// A prototype-less function type: just the result type
pub(super) fn step_function_no_proto_type(
    state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let result = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_plain(&result, cont)))
        }
        Some(1) => {
            let result = expect_type(state)?;
            Ok(Transition::to(frame.cont)
                .with_result(StepResult::Type(Type::function(result, Vec::new()))))
        }
        _ => Err(StepError::Protocol {
            context: "function type step out of range",
        }),
    }
}

fn named(frame: &Frame) -> Result<String, StepError> {
    frame
        .node
        .name()
        .map(str::to_string)
        .ok_or(StepError::MalformedNode {
            kind: frame.node.kind,
            expected: "a name attribute",
        })
}
