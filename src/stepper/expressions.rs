//! Expression stepping
//!
//! Expressions evaluate under a [`Mode`]: value mode produces a value,
//! lvalue mode produces the typed address of the designated storage.
//! Mode propagates through transparent nodes (parentheses, implicit
//! casts) and resets to value mode at every other child.
//!
//! Loads go through [`read_value`] immediately; the emitted `Load`
//! effect is an observability hook for the driver. Stores are requests:
//! only the driver writes memory.

use super::control::{Frame, Mode, Scratch, Transition};
use super::effects::Effect;
use super::errors::StepError;
use super::{
    child, enter_operand, enter_plain, enter_stmt, expect_pointer, expect_type, expect_value,
    lookup,
};
use crate::ast::{BinaryOpcode, Node, NodeKind, UnaryOpcode};
use crate::memory::ops::{
    eval_binary_operation, eval_cast, eval_pointer_add, eval_unary_operation, ValueError,
};
use crate::memory::read_value;
use crate::memory::value::{FloatingValue, IntegralValue, PointerValue, Value};
use crate::scope::DeclRef;
use crate::state::State;
use crate::types::{ScalarKind, Type};
use std::rc::Rc;

// ---- literals -----------------------------------------------------------

fn parse_integer(lexeme: &str) -> Result<i64, StepError> {
    let bad = || StepError::BadLiteral {
        lexeme: lexeme.to_string(),
    };
    // TODO: u/l suffixes should select unsigned/long types instead of
    // falling through to plain int.
    let body = lexeme.trim_end_matches(|c| matches!(c, 'u' | 'U' | 'l' | 'L'));
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).map_err(|_| bad())
    } else if body.len() > 1 && body.starts_with('0') {
        i64::from_str_radix(&body[1..], 8).map_err(|_| bad())
    } else {
        body.parse().map_err(|_| bad())
    }
}

pub(super) fn step_literal(_state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    let value = match frame.node.kind {
        NodeKind::IntegerLiteral => {
            let lexeme = frame.node.literal().ok_or(StepError::MalformedNode {
                kind: frame.node.kind,
                expected: "a literal lexeme",
            })?;
            Value::int(parse_integer(lexeme)?)
        }
        NodeKind::CharacterLiteral => {
            let lexeme = frame.node.literal().ok_or(StepError::MalformedNode {
                kind: frame.node.kind,
                expected: "a character code",
            })?;
            let code = lexeme.parse().map_err(|_| StepError::BadLiteral {
                lexeme: lexeme.to_string(),
            })?;
            Value::Integral(IntegralValue::new(Type::Scalar(ScalarKind::Char), code))
        }
        NodeKind::FloatingLiteral => {
            let lexeme = frame.node.literal().ok_or(StepError::MalformedNode {
                kind: frame.node.kind,
                expected: "a literal lexeme",
            })?;
            let (body, kind) = match lexeme.strip_suffix(['f', 'F']) {
                Some(body) => (body, ScalarKind::Float),
                None => (lexeme, ScalarKind::Double),
            };
            let number: f64 = body.parse().map_err(|_| StepError::BadLiteral {
                lexeme: lexeme.to_string(),
            })?;
            Value::Floating(FloatingValue::new(Type::Scalar(kind), number))
        }
        NodeKind::StringLiteral => {
            let reference = frame.node.string_ref().ok_or(StepError::MissingStringRef)?;
            Value::Pointer(reference.clone())
        }
        kind => {
            return Err(StepError::MalformedNode {
                kind,
                expected: "a literal node",
            })
        }
    };
    Ok(Transition::to(frame.cont).with_value(value))
}

// ---- references and grouping --------------------------------------------

pub(super) fn step_paren_expr(state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let inner = child(&frame, 0)?;
            let mode = frame.mode;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_operand(&inner, cont, mode)))
        }
        Some(1) => {
            let mut transition = Transition::to(frame.cont);
            transition.result = state.result.clone();
            Ok(transition)
        }
        _ => Err(StepError::Protocol {
            context: "paren expression step out of range",
        }),
    }
}

pub(super) fn step_decl_ref_expr(
    state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    let name = frame.node.identifier().ok_or(StepError::MalformedNode {
        kind: frame.node.kind,
        expected: "an identifier attribute",
    })?;
    let reference = lookup(state, name)?;
    match reference {
        DeclRef::Storage(ptr) => match frame.mode {
            Mode::Lvalue => Ok(Transition::to(frame.cont).with_value(Value::Pointer(ptr))),
            Mode::Value => {
                if let Some(Type::ConstantArray { elem, .. }) = ptr.ty.pointee() {
                    // Array decay: the address of the first element, no load.
                    let decayed =
                        PointerValue::new(Type::pointer((**elem).clone()), ptr.address);
                    Ok(Transition::to(frame.cont).with_value(Value::Pointer(decayed)))
                } else {
                    let value = read_value(&state.memory, &ptr)?;
                    Ok(Transition::to(frame.cont)
                        .with_effect(Effect::Load(ptr))
                        .with_value(value))
                }
            }
        },
        DeclRef::Direct(value) => match frame.mode {
            Mode::Lvalue => Err(StepError::NotAddressable {
                name: name.to_string(),
            }),
            Mode::Value => Ok(Transition::to(frame.cont).with_value(value)),
        },
    }
}

// ---- unary operators ----------------------------------------------------

pub(super) fn step_unary_operator(
    state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    let op = frame.node.unary_opcode().ok_or(StepError::MalformedNode {
        kind: frame.node.kind,
        expected: "a unary opcode",
    })?;
    match op {
        UnaryOpcode::Plus | UnaryOpcode::Minus | UnaryOpcode::Not | UnaryOpcode::LNot => {
            step_simple_unary(state, frame, op)
        }
        UnaryOpcode::PreInc
        | UnaryOpcode::PreDec
        | UnaryOpcode::PostInc
        | UnaryOpcode::PostDec => step_inc_dec(state, frame, op),
        UnaryOpcode::AddrOf => step_addr_of(state, frame),
        UnaryOpcode::Deref => step_deref(state, frame),
    }
}

fn step_simple_unary(
    state: &State,
    frame: Box<Frame>,
    op: UnaryOpcode,
) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let operand = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_operand(&operand, cont, Mode::Value)))
        }
        Some(1) => {
            let operand = expect_value(state)?;
            let value = eval_unary_operation(op, &operand)?;
            Ok(Transition::to(frame.cont).with_value(value))
        }
        _ => Err(StepError::Protocol {
            context: "unary operator step out of range",
        }),
    }
}

fn step_inc_dec(
    state: &State,
    frame: Box<Frame>,
    op: UnaryOpcode,
) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let operand = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_operand(&operand, cont, Mode::Lvalue)))
        }
        Some(1) => {
            let lvalue = expect_pointer(state)?;
            let old = read_value(&state.memory, &lvalue)?;
            let delta = match op {
                UnaryOpcode::PreInc | UnaryOpcode::PostInc => BinaryOpcode::Add,
                _ => BinaryOpcode::Sub,
            };
            let new = eval_binary_operation(delta, &old, &Value::int(1))?;
            let result = match op {
                UnaryOpcode::PreInc | UnaryOpcode::PreDec => new.clone(),
                _ => old,
            };
            Ok(Transition::to(frame.cont)
                .with_effect(Effect::Load(lvalue.clone()))
                .with_effect(Effect::Store(lvalue, new))
                .with_value(result))
        }
        _ => Err(StepError::Protocol {
            context: "increment step out of range",
        }),
    }
}

fn step_addr_of(state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let operand = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_operand(&operand, cont, Mode::Lvalue)))
        }
        Some(1) => {
            let pointer = expect_pointer(state)?;
            Ok(Transition::to(frame.cont).with_value(Value::Pointer(pointer)))
        }
        _ => Err(StepError::Protocol {
            context: "address-of step out of range",
        }),
    }
}

fn step_deref(state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let operand = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_operand(&operand, cont, Mode::Value)))
        }
        Some(1) => {
            let pointer = expect_pointer(state)?;
            match frame.mode {
                Mode::Lvalue => {
                    Ok(Transition::to(frame.cont).with_value(Value::Pointer(pointer)))
                }
                Mode::Value => {
                    let value = read_value(&state.memory, &pointer)?;
                    Ok(Transition::to(frame.cont)
                        .with_effect(Effect::Load(pointer))
                        .with_value(value))
                }
            }
        }
        _ => Err(StepError::Protocol {
            context: "dereference step out of range",
        }),
    }
}

// ---- sizeof -------------------------------------------------------------

/// Walk the operand tree without evaluating it
fn operand_size(state: &State, node: &Rc<Node>) -> Result<i64, StepError> {
    match node.kind {
        NodeKind::ParenExpr => {
            let inner = node.child(0).ok_or(StepError::MalformedNode {
                kind: node.kind,
                expected: "an inner expression",
            })?;
            operand_size(state, inner)
        }
        NodeKind::DeclRefExpr => {
            let name = node.identifier().ok_or(StepError::MalformedNode {
                kind: node.kind,
                expected: "an identifier attribute",
            })?;
            match lookup(state, name)? {
                DeclRef::Storage(ptr) => {
                    Ok(ptr.ty.pointee().map(Type::size).unwrap_or(0) as i64)
                }
                // TODO: report the declared type's size for function and
                // builtin bindings instead of 0.
                DeclRef::Direct(_) => Ok(0),
            }
        }
        kind => Err(StepError::UnsupportedSizeof { kind }),
    }
}

pub(super) fn step_sizeof_expr(state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    let operand = child(&frame, 0)?;
    let size = operand_size(state, &operand)?;
    Ok(Transition::to(frame.cont).with_value(Value::int(size)))
}

// ---- binary operators ---------------------------------------------------

pub(super) fn step_binary_operator(
    state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    let op = frame.node.binary_opcode().ok_or(StepError::MalformedNode {
        kind: frame.node.kind,
        expected: "a binary opcode",
    })?;
    if op == BinaryOpcode::Assign {
        return step_assignment(state, frame);
    }
    match frame.step.index() {
        Some(0) => {
            let lhs = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_operand(&lhs, cont, Mode::Value)))
        }
        Some(1) => {
            let lhs = expect_value(state)?;
            // Short-circuit: when the left operand decides the outcome,
            // it is the result and the right operand is never entered.
            if (op == BinaryOpcode::LAnd && !lhs.to_bool())
                || (op == BinaryOpcode::LOr && lhs.to_bool())
            {
                return Ok(Transition::to(frame.cont).with_value(lhs));
            }
            let rhs = child(&frame, 1)?;
            let mut cont = frame.at(2);
            cont.scratch = Scratch::Lhs(lhs);
            Ok(Transition::to(enter_operand(&rhs, cont.control(), Mode::Value)))
        }
        Some(2) => {
            let rhs = expect_value(state)?;
            let Frame { cont, scratch, .. } = *frame;
            match op {
                BinaryOpcode::Comma | BinaryOpcode::LAnd | BinaryOpcode::LOr => {
                    Ok(Transition::to(cont).with_value(rhs))
                }
                _ => {
                    let Scratch::Lhs(lhs) = scratch else {
                        return Err(StepError::Protocol {
                            context: "binary operator lost its left operand",
                        });
                    };
                    let value = eval_binary_operation(op, &lhs, &rhs)?;
                    Ok(Transition::to(cont).with_value(value))
                }
            }
        }
        _ => Err(StepError::Protocol {
            context: "binary operator step out of range",
        }),
    }
}

fn step_assignment(state: &State, frame: Box<Frame>) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let lhs = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_operand(&lhs, cont, Mode::Lvalue)))
        }
        Some(1) => {
            let lvalue = expect_pointer(state)?;
            let rhs = child(&frame, 1)?;
            let mut cont = frame.at(2);
            cont.scratch = Scratch::Lvalue(lvalue);
            Ok(Transition::to(enter_operand(&rhs, cont.control(), Mode::Value)))
        }
        Some(2) => {
            let value = expect_value(state)?;
            let Frame { cont, scratch, .. } = *frame;
            let Scratch::Lvalue(lvalue) = scratch else {
                return Err(StepError::Protocol {
                    context: "assignment lost its lvalue",
                });
            };
            Ok(Transition::to(cont)
                .with_effect(Effect::Store(lvalue, value.clone()))
                .with_value(value))
        }
        _ => Err(StepError::Protocol {
            context: "assignment step out of range",
        }),
    }
}

pub(super) fn step_compound_assign_operator(
    state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    let op = frame.node.binary_opcode().ok_or(StepError::MalformedNode {
        kind: frame.node.kind,
        expected: "a binary opcode",
    })?;
    match frame.step.index() {
        Some(0) => {
            let lhs = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_operand(&lhs, cont, Mode::Lvalue)))
        }
        Some(1) => {
            let lvalue = expect_pointer(state)?;
            let old = read_value(&state.memory, &lvalue)?;
            let rhs = child(&frame, 1)?;
            let mut cont = frame.at(2);
            cont.scratch = Scratch::ReadModify {
                lvalue: lvalue.clone(),
                old,
            };
            Ok(Transition::to(enter_operand(&rhs, cont.control(), Mode::Value))
                .with_effect(Effect::Load(lvalue)))
        }
        Some(2) => {
            let rhs = expect_value(state)?;
            let Frame { cont, scratch, .. } = *frame;
            let Scratch::ReadModify { lvalue, old } = scratch else {
                return Err(StepError::Protocol {
                    context: "compound assignment lost its lvalue",
                });
            };
            let new = eval_binary_operation(op, &old, &rhs)?;
            Ok(Transition::to(cont)
                .with_effect(Effect::Store(lvalue, new.clone()))
                .with_value(new))
        }
        _ => Err(StepError::Protocol {
            context: "compound assignment step out of range",
        }),
    }
}

// ---- subscript, conditional, casts --------------------------------------

pub(super) fn step_array_subscript_expr(
    state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let array = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_operand(&array, cont, Mode::Value)))
        }
        Some(1) => {
            let base = expect_value(state)?;
            let index = child(&frame, 1)?;
            let mut cont = frame.at(2);
            cont.scratch = Scratch::Base(base);
            Ok(Transition::to(enter_operand(&index, cont.control(), Mode::Value)))
        }
        Some(2) => {
            let index = expect_value(state)?;
            let Frame {
                cont,
                scratch,
                mode,
                ..
            } = *frame;
            let Scratch::Base(base) = scratch else {
                return Err(StepError::Protocol {
                    context: "subscript lost its base pointer",
                });
            };
            let base = base.as_pointer().ok_or(ValueError::OperandType {
                operation: "[]",
                found: "non-pointer",
            })?;
            let element = eval_pointer_add(base, &index)?;
            match mode {
                Mode::Lvalue => Ok(Transition::to(cont).with_value(Value::Pointer(element))),
                Mode::Value => {
                    let value = read_value(&state.memory, &element)?;
                    Ok(Transition::to(cont)
                        .with_effect(Effect::Load(element))
                        .with_value(value))
                }
            }
        }
        _ => Err(StepError::Protocol {
            context: "subscript step out of range",
        }),
    }
}

pub(super) fn step_conditional_operator(
    state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let cond = child(&frame, 0)?;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_operand(&cond, cont, Mode::Value)))
        }
        Some(1) => {
            let branch = if expect_value(state)?.to_bool() {
                child(&frame, 1)?
            } else {
                child(&frame, 2)?
            };
            // Branches step like statements so hosts observe the choice.
            let cont = frame.at(2).control();
            Ok(Transition::to(enter_stmt(&branch, cont)))
        }
        Some(2) => {
            let mut transition = Transition::to(frame.cont);
            transition.result = state.result.clone();
            Ok(transition)
        }
        _ => Err(StepError::Protocol {
            context: "conditional operator step out of range",
        }),
    }
}

/// Implicit conversions wrap value children; the mode is forwarded so a
/// cast around a decaying array stays transparent to lvalue contexts.
/// Children: value expression, then target type expression.
pub(super) fn step_implicit_cast_expr(
    state: &State,
    frame: Box<Frame>,
) -> Result<Transition, StepError> {
    match frame.step.index() {
        Some(0) => {
            let operand = child(&frame, 0)?;
            let mode = frame.mode;
            let cont = frame.at(1).control();
            Ok(Transition::to(enter_operand(&operand, cont, mode)))
        }
        Some(1) => {
            let value = expect_value(state)?;
            let ty = child(&frame, 1)?;
            let mut cont = frame.at(2);
            cont.scratch = Scratch::Cast {
                value: Some(value),
                ty: None,
            };
            Ok(Transition::to(enter_plain(&ty, cont.control())))
        }
        Some(2) => {
            let ty = expect_type(state)?;
            let Frame { cont, scratch, .. } = *frame;
            let Scratch::Cast {
                value: Some(value), ..
            } = scratch
            else {
                return Err(StepError::Protocol {
                    context: "implicit cast lost its operand",
                });
            };
            let value = eval_cast(&ty, &value)?;
            Ok(Transition::to(cont).with_value(value))
        }
        _ => Err(StepError::Protocol {
            context: "implicit cast step out of range",
        }),
    }
}

/// Explicit cast: type expression first, then the value child
pub(super) fn step_cstyle_cast_expr(
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
            let ty = expect_type(state)?;
            let operand = child(&frame, 1)?;
            let mut cont = frame.at(2);
            cont.scratch = Scratch::Cast {
                value: None,
                ty: Some(ty),
            };
            Ok(Transition::to(enter_operand(&operand, cont.control(), Mode::Value)))
        }
        Some(2) => {
            let value = expect_value(state)?;
            let Frame { cont, scratch, .. } = *frame;
            let Scratch::Cast { ty: Some(ty), .. } = scratch else {
                return Err(StepError::Protocol {
                    context: "cast lost its target type",
                });
            };
            let value = eval_cast(&ty, &value)?;
            Ok(Transition::to(cont).with_value(value))
        }
        _ => Err(StepError::Protocol {
            context: "cast step out of range",
        }),
    }
}
