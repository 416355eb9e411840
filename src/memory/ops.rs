//! Primitive value operations
//!
//! Pure evaluators over [`Value`]: unary and binary arithmetic, casts, and
//! scaled pointer arithmetic. The stepping core delegates every actual
//! computation here; control flow, short-circuiting, and load/store
//! sequencing stay in [`crate::stepper`].
//!
//! Arithmetic follows the usual arithmetic conversions over the fixed-size
//! scalar model: operands below `int` rank are promoted, the higher-ranked
//! type wins, and results wrap at their type's width.

use super::value::{FloatingValue, IntegralValue, PointerValue, Value};
use crate::ast::{BinaryOpcode, UnaryOpcode};
use crate::types::{ScalarKind, Type};
use std::fmt;

/// Errors from the value algebra: bad operand shapes, division by zero,
/// unrepresentable casts
#[derive(Debug, Clone, PartialEq)]
pub enum ValueError {
    /// An operand had a shape the operation cannot accept
    OperandType {
        operation: &'static str,
        found: &'static str,
    },

    /// Integer division or remainder by zero
    DivisionByZero,

    /// The requested conversion is not expressible
    InvalidCast { from: &'static str, to: String },

    /// Pointer arithmetic over a zero-sized pointee
    SizelessPointee,
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::OperandType { operation, found } => {
                write!(f, "invalid operand to '{}': {} value", operation, found)
            }
            ValueError::DivisionByZero => write!(f, "division by zero"),
            ValueError::InvalidCast { from, to } => {
                write!(f, "cannot cast {} value to {}", from, to)
            }
            ValueError::SizelessPointee => {
                write!(f, "pointer arithmetic over a zero-sized pointee")
            }
        }
    }
}

impl std::error::Error for ValueError {}

/// Integer promotion: everything below `int` rank computes as `int`
fn promote(kind: ScalarKind) -> ScalarKind {
    if kind.is_integral() && kind.rank() < ScalarKind::Int.rank() {
        ScalarKind::Int
    } else {
        kind
    }
}

/// Usual arithmetic conversions: promote both operands, higher rank wins
fn common_kind(lhs: ScalarKind, rhs: ScalarKind) -> ScalarKind {
    let lhs = promote(lhs);
    let rhs = promote(rhs);
    if lhs.rank() >= rhs.rank() {
        lhs
    } else {
        rhs
    }
}

fn scalar_of(value: &Value, operation: &'static str) -> Result<ScalarKind, ValueError> {
    match value {
        Value::Integral(v) => v.ty.as_scalar(),
        Value::Floating(v) => v.ty.as_scalar(),
        _ => None,
    }
    .ok_or(ValueError::OperandType {
        operation,
        found: value.kind_name(),
    })
}

fn numeric(value: &Value, operation: &'static str) -> Result<f64, ValueError> {
    match value {
        Value::Integral(v) => Ok(v.number as f64),
        Value::Floating(v) => Ok(v.number),
        _ => Err(ValueError::OperandType {
            operation,
            found: value.kind_name(),
        }),
    }
}

fn integral(value: &Value, operation: &'static str) -> Result<i64, ValueError> {
    match value {
        Value::Integral(v) => Ok(v.number),
        _ => Err(ValueError::OperandType {
            operation,
            found: value.kind_name(),
        }),
    }
}

/// Apply a simple unary operator (`+`, `-`, `~`, `!`) to a value.
///
/// Increment/decrement, address-of, and dereference are sequencing
/// concerns and are handled by the stepper, not here.
pub fn eval_unary_operation(op: UnaryOpcode, value: &Value) -> Result<Value, ValueError> {
    match op {
        UnaryOpcode::Plus => {
            let kind = promote(scalar_of(value, "+")?);
            cast_to_scalar(kind, value, "+")
        }
        UnaryOpcode::Minus => {
            let kind = promote(scalar_of(value, "-")?);
            if kind.is_floating() {
                Ok(Value::Floating(FloatingValue::new(
                    Type::Scalar(kind),
                    -numeric(value, "-")?,
                )))
            } else {
                Ok(Value::Integral(IntegralValue::new(
                    Type::Scalar(kind),
                    integral(value, "-")?.wrapping_neg(),
                )))
            }
        }
        UnaryOpcode::Not => {
            let kind = promote(scalar_of(value, "~")?);
            if kind.is_floating() {
                return Err(ValueError::OperandType {
                    operation: "~",
                    found: "floating",
                });
            }
            Ok(Value::Integral(IntegralValue::new(
                Type::Scalar(kind),
                !integral(value, "~")?,
            )))
        }
        UnaryOpcode::LNot => Ok(Value::int(if value.to_bool() { 0 } else { 1 })),
        _ => Err(ValueError::OperandType {
            operation: "unary",
            found: value.kind_name(),
        }),
    }
}

/// Apply a binary operator to two evaluated operands.
///
/// `LAnd`, `LOr`, `Comma`, and `Assign` never reach this function; the
/// stepper gives them their sequencing semantics directly.
pub fn eval_binary_operation(
    op: BinaryOpcode,
    lhs: &Value,
    rhs: &Value,
) -> Result<Value, ValueError> {
    // Pointer forms first: scaled add/sub, element difference, comparison.
    match (op, lhs.as_pointer(), rhs.as_pointer()) {
        (BinaryOpcode::Add, Some(ptr), None) => {
            return Ok(Value::Pointer(eval_pointer_add(ptr, rhs)?));
        }
        (BinaryOpcode::Add, None, Some(ptr)) => {
            return Ok(Value::Pointer(eval_pointer_add(ptr, lhs)?));
        }
        (BinaryOpcode::Sub, Some(ptr), None) => {
            let index = integral(rhs, "-")?;
            let negated = Value::int(index.wrapping_neg());
            return Ok(Value::Pointer(eval_pointer_add(ptr, &negated)?));
        }
        (BinaryOpcode::Sub, Some(a), Some(b)) => {
            let elem = a.ty.pointee().map(Type::size).unwrap_or(0);
            if elem == 0 {
                return Err(ValueError::SizelessPointee);
            }
            let diff = (a.address as i64).wrapping_sub(b.address as i64) / elem as i64;
            return Ok(Value::int(diff));
        }
        _ => {}
    }
    if is_comparison(op) && (lhs.is_pointer() || rhs.is_pointer()) {
        return compare_addresses(op, lhs, rhs);
    }

    let kind = common_kind(scalar_of(lhs, op_name(op))?, scalar_of(rhs, op_name(op))?);
    if kind.is_floating() {
        eval_floating(op, kind, numeric(lhs, op_name(op))?, numeric(rhs, op_name(op))?)
    } else {
        eval_integral(op, kind, integral(lhs, op_name(op))?, integral(rhs, op_name(op))?)
    }
}

fn is_comparison(op: BinaryOpcode) -> bool {
    matches!(
        op,
        BinaryOpcode::Eq
            | BinaryOpcode::Ne
            | BinaryOpcode::Lt
            | BinaryOpcode::Le
            | BinaryOpcode::Gt
            | BinaryOpcode::Ge
    )
}

fn op_name(op: BinaryOpcode) -> &'static str {
    match op {
        BinaryOpcode::Add => "+",
        BinaryOpcode::Sub => "-",
        BinaryOpcode::Mul => "*",
        BinaryOpcode::Div => "/",
        BinaryOpcode::Rem => "%",
        BinaryOpcode::Eq => "==",
        BinaryOpcode::Ne => "!=",
        BinaryOpcode::Lt => "<",
        BinaryOpcode::Le => "<=",
        BinaryOpcode::Gt => ">",
        BinaryOpcode::Ge => ">=",
        BinaryOpcode::And => "&",
        BinaryOpcode::Or => "|",
        BinaryOpcode::Xor => "^",
        BinaryOpcode::Shl => "<<",
        BinaryOpcode::Shr => ">>",
        BinaryOpcode::LAnd => "&&",
        BinaryOpcode::LOr => "||",
        BinaryOpcode::Comma => ",",
        BinaryOpcode::Assign => "=",
    }
}

/// Pointer comparison; an integral operand (a null constant, typically)
/// compares by address value
fn compare_addresses(op: BinaryOpcode, lhs: &Value, rhs: &Value) -> Result<Value, ValueError> {
    let addr = |v: &Value| -> Result<u64, ValueError> {
        match v {
            Value::Pointer(p) => Ok(p.address),
            Value::Integral(i) => Ok(i.number as u64),
            _ => Err(ValueError::OperandType {
                operation: op_name(op),
                found: v.kind_name(),
            }),
        }
    };
    let (a, b) = (addr(lhs)?, addr(rhs)?);
    let truth = match op {
        BinaryOpcode::Eq => a == b,
        BinaryOpcode::Ne => a != b,
        BinaryOpcode::Lt => a < b,
        BinaryOpcode::Le => a <= b,
        BinaryOpcode::Gt => a > b,
        BinaryOpcode::Ge => a >= b,
        _ => unreachable!("caller checked is_comparison"),
    };
    Ok(Value::int(truth as i64))
}

fn eval_floating(
    op: BinaryOpcode,
    kind: ScalarKind,
    lhs: f64,
    rhs: f64,
) -> Result<Value, ValueError> {
    let ty = Type::Scalar(kind);
    let arith = |n: f64| Ok(Value::Floating(FloatingValue::new(ty.clone(), n)));
    match op {
        BinaryOpcode::Add => arith(lhs + rhs),
        BinaryOpcode::Sub => arith(lhs - rhs),
        BinaryOpcode::Mul => arith(lhs * rhs),
        BinaryOpcode::Div => arith(lhs / rhs),
        BinaryOpcode::Eq => Ok(Value::int((lhs == rhs) as i64)),
        BinaryOpcode::Ne => Ok(Value::int((lhs != rhs) as i64)),
        BinaryOpcode::Lt => Ok(Value::int((lhs < rhs) as i64)),
        BinaryOpcode::Le => Ok(Value::int((lhs <= rhs) as i64)),
        BinaryOpcode::Gt => Ok(Value::int((lhs > rhs) as i64)),
        BinaryOpcode::Ge => Ok(Value::int((lhs >= rhs) as i64)),
        _ => Err(ValueError::OperandType {
            operation: op_name(op),
            found: "floating",
        }),
    }
}

fn eval_integral(
    op: BinaryOpcode,
    kind: ScalarKind,
    lhs: i64,
    rhs: i64,
) -> Result<Value, ValueError> {
    let ty = Type::Scalar(kind);
    let signed = kind.is_signed();
    let arith = |n: i64| Ok(Value::Integral(IntegralValue::new(ty.clone(), n)));
    match op {
        BinaryOpcode::Add => arith(lhs.wrapping_add(rhs)),
        BinaryOpcode::Sub => arith(lhs.wrapping_sub(rhs)),
        BinaryOpcode::Mul => arith(lhs.wrapping_mul(rhs)),
        BinaryOpcode::Div => {
            if rhs == 0 {
                Err(ValueError::DivisionByZero)
            } else if signed {
                arith(lhs.wrapping_div(rhs))
            } else {
                arith(((lhs as u64).wrapping_div(rhs as u64)) as i64)
            }
        }
        BinaryOpcode::Rem => {
            if rhs == 0 {
                Err(ValueError::DivisionByZero)
            } else if signed {
                arith(lhs.wrapping_rem(rhs))
            } else {
                arith(((lhs as u64).wrapping_rem(rhs as u64)) as i64)
            }
        }
        BinaryOpcode::Eq => Ok(Value::int((lhs == rhs) as i64)),
        BinaryOpcode::Ne => Ok(Value::int((lhs != rhs) as i64)),
        BinaryOpcode::Lt | BinaryOpcode::Le | BinaryOpcode::Gt | BinaryOpcode::Ge => {
            let truth = if signed {
                match op {
                    BinaryOpcode::Lt => lhs < rhs,
                    BinaryOpcode::Le => lhs <= rhs,
                    BinaryOpcode::Gt => lhs > rhs,
                    _ => lhs >= rhs,
                }
            } else {
                let (l, r) = (lhs as u64, rhs as u64);
                match op {
                    BinaryOpcode::Lt => l < r,
                    BinaryOpcode::Le => l <= r,
                    BinaryOpcode::Gt => l > r,
                    _ => l >= r,
                }
            };
            Ok(Value::int(truth as i64))
        }
        BinaryOpcode::And => arith(lhs & rhs),
        BinaryOpcode::Or => arith(lhs | rhs),
        BinaryOpcode::Xor => arith(lhs ^ rhs),
        BinaryOpcode::Shl => arith(lhs.wrapping_shl(rhs as u32 & 63)),
        BinaryOpcode::Shr => {
            if signed {
                arith(lhs.wrapping_shr(rhs as u32 & 63))
            } else {
                arith(((lhs as u64).wrapping_shr(rhs as u32 & 63)) as i64)
            }
        }
        _ => Err(ValueError::OperandType {
            operation: op_name(op),
            found: "integral",
        }),
    }
}

fn cast_to_scalar(kind: ScalarKind, value: &Value, operation: &'static str) -> Result<Value, ValueError> {
    let ty = Type::Scalar(kind);
    if kind.is_floating() {
        Ok(Value::Floating(FloatingValue::new(
            ty,
            numeric(value, operation)?,
        )))
    } else {
        Ok(Value::Integral(IntegralValue::new(
            ty,
            integral(value, operation)?,
        )))
    }
}

/// Convert a value to a target type.
///
/// Integral casts re-normalize to the target width; floating-to-integral
/// truncates toward zero; pointer and integral values convert to pointers
/// by address.
pub fn eval_cast(ty: &Type, value: &Value) -> Result<Value, ValueError> {
    let fail = || ValueError::InvalidCast {
        from: value.kind_name(),
        to: format!("{:?}", ty),
    };
    match ty {
        Type::Scalar(kind) if kind.is_integral() => {
            let number = match value {
                Value::Integral(v) => v.number,
                Value::Floating(v) => v.number as i64,
                Value::Pointer(p) => p.address as i64,
                _ => return Err(fail()),
            };
            Ok(Value::Integral(IntegralValue::new(ty.clone(), number)))
        }
        Type::Scalar(kind) if kind.is_floating() => {
            let number = match value {
                Value::Integral(v) => v.number as f64,
                Value::Floating(v) => v.number,
                _ => return Err(fail()),
            };
            Ok(Value::Floating(FloatingValue::new(ty.clone(), number)))
        }
        Type::Pointer(_) => {
            let address = match value {
                Value::Pointer(p) => p.address,
                Value::Integral(v) => v.number as u64,
                _ => return Err(fail()),
            };
            Ok(Value::Pointer(PointerValue::new(ty.clone(), address)))
        }
        _ => Err(fail()),
    }
}

/// Scaled pointer arithmetic: `ptr + index` advances by whole elements
pub fn eval_pointer_add(ptr: &PointerValue, index: &Value) -> Result<PointerValue, ValueError> {
    let elem = ptr.ty.pointee().map(Type::size).unwrap_or(0);
    if elem == 0 {
        return Err(ValueError::SizelessPointee);
    }
    let index = integral(index, "pointer +")?;
    let address = (ptr.address as i64).wrapping_add(index.wrapping_mul(elem as i64)) as u64;
    Ok(PointerValue::new(ptr.ty.clone(), address))
}
