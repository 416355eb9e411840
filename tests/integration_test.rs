//! End-to-end runs through the driver: each test assembles a small C
//! program as an AST, drives it to completion, and checks the value
//! `main` returns.

use cstep::ast::build::*;
use cstep::ast::{BinaryOpcode, Node, Program, UnaryOpcode};
use cstep::driver::{Interpreter, RunError};
use cstep::memory::value::Value;
use cstep::stepper::StepError;
use std::rc::Rc;

fn int_main(body: Vec<Rc<Node>>) -> Program {
    Program::new(vec![function_decl(
        "main",
        proto_type(int_type(), vec![]),
        compound(body),
    )])
}

fn run_program(program: Program) -> Value {
    let mut interpreter = Interpreter::new(program).expect("program loads");
    interpreter.run().expect("execution succeeds");
    interpreter.result().cloned().expect("main returns a value")
}

fn run_main(body: Vec<Rc<Node>>) -> Value {
    run_program(int_main(body))
}

fn as_int(value: &Value) -> i64 {
    value.as_integral().expect("integral result").number
}

#[test]
fn arithmetic_precedence() {
    // int main() { return 1 + 2 * 3; }
    let body = vec![return_stmt(Some(binary(
        BinaryOpcode::Add,
        int_lit("1"),
        binary(BinaryOpcode::Mul, int_lit("2"), int_lit("3")),
    )))];
    assert_eq!(as_int(&run_main(body)), 7);
}

#[test]
fn for_loop_accumulates() {
    // int main() { int x = 0; for (int i = 0; i < 4; ++i) x += i; return x; }
    let body = vec![
        decl_stmt(vec![var_decl("x", int_type(), Some(int_lit("0")))]),
        for_stmt(
            decl_stmt(vec![var_decl("i", int_type(), Some(int_lit("0")))]),
            binary(BinaryOpcode::Lt, decl_ref("i"), int_lit("4")),
            unary(UnaryOpcode::PreInc, decl_ref("i")),
            compound_assign(BinaryOpcode::Add, decl_ref("x"), decl_ref("i")),
        ),
        return_stmt(Some(decl_ref("x"))),
    ];
    assert_eq!(as_int(&run_main(body)), 6);
}

#[test]
fn array_subscript_reads_stored_element() {
    // int main() { int a[3]; a[0] = 10; a[1] = 20; a[2] = 30; return a[2]; }
    let body = vec![
        decl_stmt(vec![var_decl(
            "a",
            array_type(int_type(), int_lit("3")),
            None,
        )]),
        assign(subscript(decl_ref("a"), int_lit("0")), int_lit("10")),
        assign(subscript(decl_ref("a"), int_lit("1")), int_lit("20")),
        assign(subscript(decl_ref("a"), int_lit("2")), int_lit("30")),
        return_stmt(Some(subscript(decl_ref("a"), int_lit("2")))),
    ];
    assert_eq!(as_int(&run_main(body)), 30);
}

#[test]
fn store_through_pointer() {
    // int main() { int x = 5; int *p = &x; *p = 9; return x; }
    let body = vec![
        decl_stmt(vec![var_decl("x", int_type(), Some(int_lit("5")))]),
        decl_stmt(vec![var_decl(
            "p",
            pointer_type(int_type()),
            Some(unary(UnaryOpcode::AddrOf, decl_ref("x"))),
        )]),
        assign(unary(UnaryOpcode::Deref, decl_ref("p")), int_lit("9")),
        return_stmt(Some(decl_ref("x"))),
    ];
    assert_eq!(as_int(&run_main(body)), 9);
}

#[test]
fn while_loop_with_continue() {
    // int main() {
    //     int i = 0, n = 0;
    //     while (i < 3) { if (i == 1) { ++i; continue; } n += i; ++i; }
    //     return n;
    // }
    let body = vec![
        decl_stmt(vec![
            var_decl("i", int_type(), Some(int_lit("0"))),
            var_decl("n", int_type(), Some(int_lit("0"))),
        ]),
        while_stmt(
            binary(BinaryOpcode::Lt, decl_ref("i"), int_lit("3")),
            compound(vec![
                if_stmt(
                    binary(BinaryOpcode::Eq, decl_ref("i"), int_lit("1")),
                    compound(vec![
                        unary(UnaryOpcode::PreInc, decl_ref("i")),
                        continue_stmt(),
                    ]),
                    None,
                ),
                compound_assign(BinaryOpcode::Add, decl_ref("n"), decl_ref("i")),
                unary(UnaryOpcode::PreInc, decl_ref("i")),
            ]),
        ),
        return_stmt(Some(decl_ref("n"))),
    ];
    assert_eq!(as_int(&run_main(body)), 2);
}

#[test]
fn nested_function_calls() {
    // int f(int x) { return x + 1; }
    // int main() { return f(f(1)); }
    let f = function_decl(
        "f",
        proto_type(int_type(), vec![parm_var_decl("x", int_type())]),
        compound(vec![return_stmt(Some(binary(
            BinaryOpcode::Add,
            decl_ref("x"),
            int_lit("1"),
        )))]),
    );
    let main = function_decl(
        "main",
        proto_type(int_type(), vec![]),
        compound(vec![return_stmt(Some(call(
            decl_ref("f"),
            vec![call(decl_ref("f"), vec![int_lit("1")])],
        )))]),
    );
    assert_eq!(as_int(&run_program(Program::new(vec![f, main]))), 3);
}

#[test]
fn do_while_runs_body_first() {
    // int main() { int i = 0; do { ++i; } while (i < 3); return i; }
    let body = vec![
        decl_stmt(vec![var_decl("i", int_type(), Some(int_lit("0")))]),
        do_stmt(
            compound(vec![unary(UnaryOpcode::PreInc, decl_ref("i"))]),
            binary(BinaryOpcode::Lt, decl_ref("i"), int_lit("3")),
        ),
        return_stmt(Some(decl_ref("i"))),
    ];
    assert_eq!(as_int(&run_main(body)), 3);
}

#[test]
fn continue_in_do_while_reaches_condition() {
    // int main() {
    //     int i = 0, n = 0;
    //     do { ++i; if (i == 2) continue; ++n; } while (i < 4);
    //     return n;
    // }
    let body = vec![
        decl_stmt(vec![
            var_decl("i", int_type(), Some(int_lit("0"))),
            var_decl("n", int_type(), Some(int_lit("0"))),
        ]),
        do_stmt(
            compound(vec![
                unary(UnaryOpcode::PreInc, decl_ref("i")),
                if_stmt(
                    binary(BinaryOpcode::Eq, decl_ref("i"), int_lit("2")),
                    continue_stmt(),
                    None,
                ),
                unary(UnaryOpcode::PreInc, decl_ref("n")),
            ]),
            binary(BinaryOpcode::Lt, decl_ref("i"), int_lit("4")),
        ),
        return_stmt(Some(decl_ref("n"))),
    ];
    assert_eq!(as_int(&run_main(body)), 3);
}

#[test]
fn break_leaves_the_loop() {
    // int main() { int i = 0; while (1) { if (i == 2) break; ++i; } return i; }
    let body = vec![
        decl_stmt(vec![var_decl("i", int_type(), Some(int_lit("0")))]),
        while_stmt(
            int_lit("1"),
            compound(vec![
                if_stmt(
                    binary(BinaryOpcode::Eq, decl_ref("i"), int_lit("2")),
                    break_stmt(),
                    None,
                ),
                unary(UnaryOpcode::PreInc, decl_ref("i")),
            ]),
        ),
        return_stmt(Some(decl_ref("i"))),
    ];
    assert_eq!(as_int(&run_main(body)), 2);
}

#[test]
fn conditional_operator_picks_a_branch() {
    // int main() { int x = 5; return x > 3 ? 10 : 20; }
    let body = vec![
        decl_stmt(vec![var_decl("x", int_type(), Some(int_lit("5")))]),
        return_stmt(Some(conditional(
            binary(BinaryOpcode::Gt, decl_ref("x"), int_lit("3")),
            int_lit("10"),
            int_lit("20"),
        ))),
    ];
    assert_eq!(as_int(&run_main(body)), 10);
}

#[test]
fn explicit_casts_truncate() {
    // int main() { return (int)2.9 + (int)'A'; }
    let body = vec![return_stmt(Some(binary(
        BinaryOpcode::Add,
        cstyle_cast(int_type(), float_lit("2.9")),
        char_lit("65"),
    )))];
    assert_eq!(as_int(&run_main(body)), 67);
}

#[test]
fn comma_yields_its_right_operand() {
    // int main() { int x = 0; return (x = 1, x + 1); }
    let body = vec![
        decl_stmt(vec![var_decl("x", int_type(), Some(int_lit("0")))]),
        return_stmt(Some(paren(binary(
            BinaryOpcode::Comma,
            assign(decl_ref("x"), int_lit("1")),
            binary(BinaryOpcode::Add, decl_ref("x"), int_lit("1")),
        )))),
    ];
    assert_eq!(as_int(&run_main(body)), 2);
}

#[test]
fn string_literal_indexes_as_chars() {
    // int main() { char *s = "hi"; return s[1]; }
    let body = vec![
        decl_stmt(vec![var_decl(
            "s",
            pointer_type(builtin_type("char")),
            Some(string_lit("hi")),
        )]),
        return_stmt(Some(subscript(decl_ref("s"), int_lit("1")))),
    ];
    assert_eq!(as_int(&run_main(body)), 'i' as i64);
}

#[test]
fn pointer_arithmetic_dereferences() {
    // int main() { char *s = "hi"; return *(s + 1); }
    let body = vec![
        decl_stmt(vec![var_decl(
            "s",
            pointer_type(builtin_type("char")),
            Some(string_lit("hi")),
        )]),
        return_stmt(Some(unary(
            UnaryOpcode::Deref,
            paren(binary(BinaryOpcode::Add, decl_ref("s"), int_lit("1"))),
        ))),
    ];
    assert_eq!(as_int(&run_main(body)), 'i' as i64);
}

#[test]
fn double_arithmetic_through_cast() {
    // int main() { double x = 1.5; x = x * 2.0; return (int)x; }
    let body = vec![
        decl_stmt(vec![var_decl(
            "x",
            builtin_type("double"),
            Some(float_lit("1.5")),
        )]),
        assign(
            decl_ref("x"),
            binary(BinaryOpcode::Mul, decl_ref("x"), float_lit("2.0")),
        ),
        return_stmt(Some(cstyle_cast(int_type(), decl_ref("x")))),
    ];
    assert_eq!(as_int(&run_main(body)), 3);
}

#[test]
fn builtin_abs_dispatches() {
    // int main() { return abs(-5); }
    let body = vec![return_stmt(Some(call(
        decl_ref("abs"),
        vec![unary(UnaryOpcode::Minus, int_lit("5"))],
    )))];
    assert_eq!(as_int(&run_main(body)), 5);
}

#[test]
fn sizeof_reports_storage_sizes() {
    // int main() { int a[3]; int *p; return sizeof(a) + sizeof(p); }
    let body = vec![
        decl_stmt(vec![var_decl(
            "a",
            array_type(int_type(), int_lit("3")),
            None,
        )]),
        decl_stmt(vec![var_decl("p", pointer_type(int_type()), None)]),
        return_stmt(Some(binary(
            BinaryOpcode::Add,
            sizeof_expr(decl_ref("a")),
            sizeof_expr(paren(decl_ref("p"))),
        ))),
    ];
    assert_eq!(as_int(&run_main(body)), 12 + 8);
}

#[test]
fn sizeof_of_function_designator_is_zero() {
    // int main() { return sizeof(main); }
    let body = vec![return_stmt(Some(sizeof_expr(decl_ref("main"))))];
    assert_eq!(as_int(&run_main(body)), 0);
}

#[test]
fn address_of_then_dereference_round_trips() {
    // int main() { int x = 42; return *(&x); }
    let body = vec![
        decl_stmt(vec![var_decl("x", int_type(), Some(int_lit("42")))]),
        return_stmt(Some(unary(
            UnaryOpcode::Deref,
            paren(unary(UnaryOpcode::AddrOf, decl_ref("x"))),
        ))),
    ];
    assert_eq!(as_int(&run_main(body)), 42);
}

#[test]
fn post_increment_returns_the_old_value() {
    // int main() { int x = 5; return x++; }
    let body = vec![
        decl_stmt(vec![var_decl("x", int_type(), Some(int_lit("5")))]),
        return_stmt(Some(unary(UnaryOpcode::PostInc, decl_ref("x")))),
    ];
    assert_eq!(as_int(&run_main(body)), 5);

    // int main() { int x = 5; return ++x; }
    let body = vec![
        decl_stmt(vec![var_decl("x", int_type(), Some(int_lit("5")))]),
        return_stmt(Some(unary(UnaryOpcode::PreInc, decl_ref("x")))),
    ];
    assert_eq!(as_int(&run_main(body)), 6);
}

#[test]
fn implicit_cast_wraps_array_decay() {
    // int main() { int a[2]; a[1] = 8; return *(a + 1); }
    // with the array reference wrapped in an implicit decay cast, the
    // way a front-end lowers it
    let decayed = implicit_cast(decl_ref("a"), pointer_type(int_type()));
    let body = vec![
        decl_stmt(vec![var_decl(
            "a",
            array_type(int_type(), int_lit("2")),
            None,
        )]),
        assign(subscript(decl_ref("a"), int_lit("1")), int_lit("8")),
        return_stmt(Some(unary(
            UnaryOpcode::Deref,
            paren(binary(BinaryOpcode::Add, decayed, int_lit("1"))),
        ))),
    ];
    assert_eq!(as_int(&run_main(body)), 8);
}

#[test]
fn call_through_a_prototype_less_function_type() {
    // int f() { return 4; } int main() { return f(); }
    let f = function_decl(
        "f",
        no_proto_type(int_type()),
        compound(vec![return_stmt(Some(int_lit("4")))]),
    );
    let main = function_decl(
        "main",
        proto_type(int_type(), vec![]),
        compound(vec![return_stmt(Some(call(decl_ref("f"), vec![])))]),
    );
    assert_eq!(as_int(&run_program(Program::new(vec![f, main]))), 4);
}

#[test]
fn float_suffix_selects_single_precision() {
    // int main() { float f = 0.5f; return (int)(f * 4.0f); }
    let body = vec![
        decl_stmt(vec![var_decl(
            "f",
            builtin_type("float"),
            Some(float_lit("0.5f")),
        )]),
        return_stmt(Some(cstyle_cast(
            int_type(),
            paren(binary(BinaryOpcode::Mul, decl_ref("f"), float_lit("4.0f"))),
        ))),
    ];
    assert_eq!(as_int(&run_main(body)), 2);
}

#[test]
fn undefined_name_is_a_semantic_error() {
    // int main() { return y; }
    let program = int_main(vec![return_stmt(Some(decl_ref("y")))]);
    let mut interpreter = Interpreter::new(program).expect("program loads");
    let error = interpreter.run().expect_err("lookup must fail");
    assert_eq!(
        error,
        RunError::Step(StepError::UndefinedName {
            name: "y".to_string()
        })
    );
}

#[test]
fn sizeof_of_an_arbitrary_expression_is_unsupported() {
    // int main() { return sizeof(1 + 2); }
    let program = int_main(vec![return_stmt(Some(sizeof_expr(binary(
        BinaryOpcode::Add,
        int_lit("1"),
        int_lit("2"),
    ))))]);
    let mut interpreter = Interpreter::new(program).expect("program loads");
    let error = interpreter.run().expect_err("sizeof walker must fail");
    assert!(matches!(
        error,
        RunError::Step(StepError::UnsupportedSizeof { .. })
    ));
}

#[test]
fn program_without_main_does_not_load() {
    let f = function_decl(
        "f",
        proto_type(int_type(), vec![]),
        compound(vec![return_stmt(Some(int_lit("0")))]),
    );
    assert_eq!(
        Interpreter::new(Program::new(vec![f])).err(),
        Some(RunError::NoMainFunction)
    );
}
