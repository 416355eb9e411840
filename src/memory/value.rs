//! Runtime value representation
//!
//! This module defines the [`Value`] enum, which represents all possible
//! runtime values in the interpreter. Values are tagged and every value
//! carries its [`Type`]:
//!
//! - [`Value::Integral`]: integer of any integral scalar type, stored
//!   normalized to that type's width and signedness
//! - [`Value::Floating`]: `float` or `double`
//! - [`Value::Pointer`]: typed memory address
//! - [`Value::Function`]: a function designator (its declaration node)
//! - [`Value::Builtin`]: a host-provided builtin binding
//!
//! Function and builtin values are produced by name lookup and consumed by
//! the call protocol; they are not addressable storage.

use crate::ast::Node;
use crate::stepper::BuiltinFn;
use crate::types::{ScalarKind, Type};
use std::rc::Rc;

/// Memory address type (64-bit)
pub type Address = u64;

/// Runtime values in the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integral(IntegralValue),
    Floating(FloatingValue),
    Pointer(PointerValue),
    Function(Rc<Node>),
    Builtin(BuiltinFn),
}

/// An integer value tagged with its integral type
#[derive(Debug, Clone, PartialEq)]
pub struct IntegralValue {
    pub ty: Type,
    pub number: i64,
}

/// A floating-point value tagged with `float` or `double`
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingValue {
    pub ty: Type,
    pub number: f64,
}

/// A typed address; `ty` is the pointer type, so the pointee type is
/// always recoverable via [`Type::pointee`]
#[derive(Debug, Clone, PartialEq)]
pub struct PointerValue {
    pub ty: Type,
    pub address: Address,
}

impl IntegralValue {
    /// Build an integral value, wrapping `number` to the width and
    /// signedness of `ty` the way a C store would
    pub fn new(ty: Type, number: i64) -> Self {
        let number = match ty.as_scalar() {
            Some(ScalarKind::Char) => number as i8 as i64,
            Some(ScalarKind::UnsignedChar) => number as u8 as i64,
            Some(ScalarKind::Short) => number as i16 as i64,
            Some(ScalarKind::UnsignedShort) => number as u16 as i64,
            Some(ScalarKind::Int) => number as i32 as i64,
            Some(ScalarKind::UnsignedInt) => number as u32 as i64,
            // 64-bit types keep the full bit pattern
            _ => number,
        };
        IntegralValue { ty, number }
    }

    /// The value reinterpreted as unsigned, for unsigned arithmetic
    pub fn as_unsigned(&self) -> u64 {
        self.number as u64
    }
}

impl FloatingValue {
    pub fn new(ty: Type, number: f64) -> Self {
        let number = match ty.as_scalar() {
            Some(ScalarKind::Float) => number as f32 as f64,
            _ => number,
        };
        FloatingValue { ty, number }
    }
}

impl PointerValue {
    pub fn new(ty: Type, address: Address) -> Self {
        PointerValue { ty, address }
    }
}

impl Value {
    /// Convenience constructor for plain `int` values
    pub fn int(number: i64) -> Value {
        Value::Integral(IntegralValue::new(Type::Scalar(ScalarKind::Int), number))
    }

    /// The type carried by this value. Function designators and builtin
    /// bindings occupy no storage and report `void`.
    pub fn ty(&self) -> Type {
        match self {
            Value::Integral(v) => v.ty.clone(),
            Value::Floating(v) => v.ty.clone(),
            Value::Pointer(v) => v.ty.clone(),
            Value::Function(_) | Value::Builtin(_) => Type::Scalar(ScalarKind::Void),
        }
    }

    /// Truthiness, as used by conditionals and short-circuit operators
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Integral(v) => v.number != 0,
            Value::Floating(v) => v.number != 0.0,
            Value::Pointer(v) => v.address != 0,
            Value::Function(_) | Value::Builtin(_) => true,
        }
    }

    pub fn as_integral(&self) -> Option<&IntegralValue> {
        match self {
            Value::Integral(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_floating(&self) -> Option<&FloatingValue> {
        match self {
            Value::Floating(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&PointerValue> {
        match self {
            Value::Pointer(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Value::Pointer(_))
    }

    /// Short tag for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Integral(_) => "integral",
            Value::Floating(_) => "floating",
            Value::Pointer(_) => "pointer",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin",
        }
    }
}
