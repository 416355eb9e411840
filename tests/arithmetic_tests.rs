//! Unit coverage for the value algebra (promotions, wrapping, casts,
//! pointer arithmetic) and the typed memory access layer.

use cstep::ast::{BinaryOpcode, UnaryOpcode};
use cstep::memory::ops::{
    eval_binary_operation, eval_cast, eval_pointer_add, eval_unary_operation, ValueError,
};
use cstep::memory::value::{FloatingValue, IntegralValue, PointerValue, Value};
use cstep::memory::{read_value, write_value, Memory};
use cstep::types::{ScalarKind, Type};

fn int(n: i64) -> Value {
    Value::int(n)
}

fn ch(n: i64) -> Value {
    Value::Integral(IntegralValue::new(Type::Scalar(ScalarKind::Char), n))
}

fn dbl(n: f64) -> Value {
    Value::Floating(FloatingValue::new(Type::Scalar(ScalarKind::Double), n))
}

fn as_int(value: &Value) -> i64 {
    value.as_integral().expect("integral value").number
}

#[test]
fn char_and_int_promote_to_int() {
    // 'a' + 10 computes as int
    let sum = eval_binary_operation(BinaryOpcode::Add, &ch(97), &int(10)).unwrap();
    assert_eq!(as_int(&sum), 107);
    assert_eq!(sum.ty(), Type::Scalar(ScalarKind::Int));

    let diff = eval_binary_operation(BinaryOpcode::Sub, &int(10), &ch(97)).unwrap();
    assert_eq!(as_int(&diff), -87);

    let product = eval_binary_operation(BinaryOpcode::Mul, &ch(97), &ch(2)).unwrap();
    assert_eq!(as_int(&product), 194);
}

#[test]
fn division_and_remainder() {
    assert_eq!(
        as_int(&eval_binary_operation(BinaryOpcode::Div, &int(7), &int(2)).unwrap()),
        3
    );
    assert_eq!(
        as_int(&eval_binary_operation(BinaryOpcode::Rem, &int(7), &int(2)).unwrap()),
        1
    );
    assert_eq!(
        eval_binary_operation(BinaryOpcode::Div, &int(7), &int(0)),
        Err(ValueError::DivisionByZero)
    );
    assert_eq!(
        eval_binary_operation(BinaryOpcode::Rem, &int(7), &int(0)),
        Err(ValueError::DivisionByZero)
    );
}

#[test]
fn comparisons_yield_int_flags() {
    let truth = eval_binary_operation(BinaryOpcode::Lt, &int(1), &int(2)).unwrap();
    assert_eq!(as_int(&truth), 1);
    assert_eq!(truth.ty(), Type::Scalar(ScalarKind::Int));
    assert_eq!(
        as_int(&eval_binary_operation(BinaryOpcode::Ge, &int(1), &int(2)).unwrap()),
        0
    );
    assert_eq!(
        as_int(&eval_binary_operation(BinaryOpcode::Eq, &ch(65), &int(65)).unwrap()),
        1
    );
}

#[test]
fn unsigned_arithmetic_wraps_and_compares_unsigned() {
    let unsigned = |n: i64| {
        Value::Integral(IntegralValue::new(
            Type::Scalar(ScalarKind::UnsignedInt),
            n,
        ))
    };
    let wrapped = eval_binary_operation(BinaryOpcode::Sub, &unsigned(0), &unsigned(1)).unwrap();
    assert_eq!(as_int(&wrapped), 4_294_967_295);
    assert_eq!(
        as_int(&eval_binary_operation(BinaryOpcode::Gt, &wrapped, &unsigned(0)).unwrap()),
        1
    );
}

#[test]
fn bitwise_and_shift_operations() {
    assert_eq!(
        as_int(&eval_binary_operation(BinaryOpcode::And, &int(0b1100), &int(0b1010)).unwrap()),
        0b1000
    );
    assert_eq!(
        as_int(&eval_binary_operation(BinaryOpcode::Xor, &int(0b1100), &int(0b1010)).unwrap()),
        0b0110
    );
    assert_eq!(
        as_int(&eval_binary_operation(BinaryOpcode::Shl, &int(1), &int(5)).unwrap()),
        32
    );
    assert_eq!(
        as_int(&eval_binary_operation(BinaryOpcode::Shr, &int(-8), &int(1)).unwrap()),
        -4
    );
}

#[test]
fn unary_operations() {
    assert_eq!(
        as_int(&eval_unary_operation(UnaryOpcode::Minus, &int(5)).unwrap()),
        -5
    );
    assert_eq!(
        as_int(&eval_unary_operation(UnaryOpcode::Not, &int(0)).unwrap()),
        -1
    );
    assert_eq!(
        as_int(&eval_unary_operation(UnaryOpcode::LNot, &int(0)).unwrap()),
        1
    );
    assert_eq!(
        as_int(&eval_unary_operation(UnaryOpcode::LNot, &int(3)).unwrap()),
        0
    );
    // Unary plus promotes char to int
    let promoted = eval_unary_operation(UnaryOpcode::Plus, &ch(7)).unwrap();
    assert_eq!(promoted.ty(), Type::Scalar(ScalarKind::Int));
}

#[test]
fn floating_arithmetic_uses_the_wider_type() {
    let sum = eval_binary_operation(BinaryOpcode::Add, &int(1), &dbl(0.5)).unwrap();
    assert_eq!(sum.ty(), Type::Scalar(ScalarKind::Double));
    assert_eq!(sum.as_floating().unwrap().number, 1.5);
    assert_eq!(
        as_int(&eval_binary_operation(BinaryOpcode::Lt, &dbl(0.5), &dbl(1.0)).unwrap()),
        1
    );
}

#[test]
fn casts_renormalize() {
    // (int)2.9 truncates toward zero
    let truncated = eval_cast(&Type::Scalar(ScalarKind::Int), &dbl(2.9)).unwrap();
    assert_eq!(as_int(&truncated), 2);

    // (char)300 wraps to the 8-bit range
    let wrapped = eval_cast(&Type::Scalar(ScalarKind::Char), &int(300)).unwrap();
    assert_eq!(as_int(&wrapped), 44);

    // (unsigned char)-1 is 255
    let unsigned = eval_cast(&Type::Scalar(ScalarKind::UnsignedChar), &int(-1)).unwrap();
    assert_eq!(as_int(&unsigned), 255);

    // Pointer casts retype without touching the address
    let ptr = Value::Pointer(PointerValue::new(
        Type::pointer(Type::Scalar(ScalarKind::Int)),
        0x2000,
    ));
    let retyped = eval_cast(&Type::pointer(Type::Scalar(ScalarKind::Char)), &ptr).unwrap();
    let retyped = retyped.as_pointer().unwrap();
    assert_eq!(retyped.address, 0x2000);
    assert_eq!(retyped.ty, Type::pointer(Type::Scalar(ScalarKind::Char)));
}

#[test]
fn pointer_arithmetic_scales_by_element_size() {
    let ptr = PointerValue::new(Type::pointer(Type::Scalar(ScalarKind::Int)), 0x1000);
    let advanced = eval_pointer_add(&ptr, &int(3)).unwrap();
    assert_eq!(advanced.address, 0x1000 + 12);

    let back = eval_pointer_add(&ptr, &int(-1)).unwrap();
    assert_eq!(back.address, 0x1000 - 4);

    // Commutativity through the binary operator
    let sum = eval_binary_operation(BinaryOpcode::Add, &int(2), &Value::Pointer(ptr.clone()))
        .unwrap();
    assert_eq!(sum.as_pointer().unwrap().address, 0x1000 + 8);

    // Element difference
    let diff = eval_binary_operation(
        BinaryOpcode::Sub,
        &Value::Pointer(advanced),
        &Value::Pointer(ptr),
    )
    .unwrap();
    assert_eq!(as_int(&diff), 3);
}

#[test]
fn integral_values_normalize_to_their_width() {
    let c = IntegralValue::new(Type::Scalar(ScalarKind::Char), 200);
    assert_eq!(c.number, -56);
    let u = IntegralValue::new(Type::Scalar(ScalarKind::UnsignedShort), -1);
    assert_eq!(u.number, 65_535);
}

#[test]
fn typed_memory_round_trips() {
    let mut memory = Memory::new();
    let address = memory.allocate(4);
    let ptr = PointerValue::new(Type::pointer(Type::Scalar(ScalarKind::Int)), address);

    write_value(&mut memory, &ptr, &int(-123)).unwrap();
    assert_eq!(read_value(&memory, &ptr).unwrap(), int(-123));

    // Storing through a char* wraps like a C store
    let cptr = PointerValue::new(Type::pointer(Type::Scalar(ScalarKind::Char)), address);
    write_value(&mut memory, &cptr, &int(300)).unwrap();
    assert_eq!(as_int(&read_value(&memory, &cptr).unwrap()), 44);
}

#[test]
fn pointers_survive_a_store_and_load() {
    let mut memory = Memory::new();
    let target = memory.allocate(4);
    let slot = memory.allocate(8);
    let int_ptr = PointerValue::new(Type::pointer(Type::Scalar(ScalarKind::Int)), target);
    let slot_ptr = PointerValue::new(
        Type::pointer(Type::pointer(Type::Scalar(ScalarKind::Int))),
        slot,
    );

    write_value(&mut memory, &slot_ptr, &Value::Pointer(int_ptr.clone())).unwrap();
    let loaded = read_value(&memory, &slot_ptr).unwrap();
    assert_eq!(loaded, Value::Pointer(int_ptr));
}

#[test]
fn uninitialized_reads_are_errors() {
    let memory = {
        let mut memory = Memory::new();
        memory.allocate(4);
        memory
    };
    let ptr = PointerValue::new(Type::pointer(Type::Scalar(ScalarKind::Int)), 0x100);
    assert!(read_value(&memory, &ptr).is_err());
}

#[test]
fn float_storage_narrows_to_single_precision() {
    let mut memory = Memory::new();
    let address = memory.allocate(4);
    let ptr = PointerValue::new(Type::pointer(Type::Scalar(ScalarKind::Float)), address);
    write_value(&mut memory, &ptr, &dbl(1.5)).unwrap();
    let loaded = read_value(&memory, &ptr).unwrap();
    assert_eq!(loaded.as_floating().unwrap().number, 1.5);
    assert_eq!(loaded.ty(), Type::Scalar(ScalarKind::Float));
}
