//! Constructors for assembling ASTs by hand
//!
//! The crate has no parser; front-ends lower C source elsewhere and hand
//! the interpreter finished trees. These helpers keep that assembly (and
//! the integration tests) readable. Children are positional and match the
//! stepping protocols exactly.

use super::{Attrs, BinaryOpcode, Node, NodeKind, UnaryOpcode};
use std::rc::Rc;

pub fn int_lit(lexeme: &str) -> Rc<Node> {
    Node::new(
        NodeKind::IntegerLiteral,
        Attrs::Literal(lexeme.to_string()),
        vec![],
    )
}

/// Character literal; `code` is the character's numeric value, already
/// resolved by the front-end
pub fn char_lit(code: &str) -> Rc<Node> {
    Node::new(
        NodeKind::CharacterLiteral,
        Attrs::Literal(code.to_string()),
        vec![],
    )
}

pub fn float_lit(lexeme: &str) -> Rc<Node> {
    Node::new(
        NodeKind::FloatingLiteral,
        Attrs::Literal(lexeme.to_string()),
        vec![],
    )
}

/// String literal; the storage pointer is filled in by the program loader
pub fn string_lit(value: &str) -> Rc<Node> {
    Node::new(
        NodeKind::StringLiteral,
        Attrs::Str {
            value: value.to_string(),
            reference: None,
        },
        vec![],
    )
}

pub fn decl_ref(name: &str) -> Rc<Node> {
    Node::new(
        NodeKind::DeclRefExpr,
        Attrs::Ident(name.to_string()),
        vec![],
    )
}

pub fn paren(expr: Rc<Node>) -> Rc<Node> {
    Node::new(NodeKind::ParenExpr, Attrs::None, vec![expr])
}

pub fn unary(op: UnaryOpcode, operand: Rc<Node>) -> Rc<Node> {
    Node::new(NodeKind::UnaryOperator, Attrs::Unary(op), vec![operand])
}

pub fn binary(op: BinaryOpcode, lhs: Rc<Node>, rhs: Rc<Node>) -> Rc<Node> {
    Node::new(NodeKind::BinaryOperator, Attrs::Binary(op), vec![lhs, rhs])
}

pub fn assign(lhs: Rc<Node>, rhs: Rc<Node>) -> Rc<Node> {
    binary(BinaryOpcode::Assign, lhs, rhs)
}

pub fn compound_assign(op: BinaryOpcode, lhs: Rc<Node>, rhs: Rc<Node>) -> Rc<Node> {
    Node::new(
        NodeKind::CompoundAssignOperator,
        Attrs::Binary(op),
        vec![lhs, rhs],
    )
}

pub fn subscript(array: Rc<Node>, index: Rc<Node>) -> Rc<Node> {
    Node::new(
        NodeKind::ArraySubscriptExpr,
        Attrs::None,
        vec![array, index],
    )
}

pub fn conditional(cond: Rc<Node>, then: Rc<Node>, otherwise: Rc<Node>) -> Rc<Node> {
    Node::new(
        NodeKind::ConditionalOperator,
        Attrs::None,
        vec![cond, then, otherwise],
    )
}

/// Implicit conversion: value child first, then the target type expression
pub fn implicit_cast(expr: Rc<Node>, ty: Rc<Node>) -> Rc<Node> {
    Node::new(NodeKind::ImplicitCastExpr, Attrs::None, vec![expr, ty])
}

/// Explicit cast: type expression first, then the value child
pub fn cstyle_cast(ty: Rc<Node>, expr: Rc<Node>) -> Rc<Node> {
    Node::new(NodeKind::CStyleCastExpr, Attrs::None, vec![ty, expr])
}

pub fn sizeof_expr(operand: Rc<Node>) -> Rc<Node> {
    Node::new(
        NodeKind::UnaryExprOrTypeTraitExpr,
        Attrs::Name("sizeof".to_string()),
        vec![operand],
    )
}

/// Call expression: child 0 is the callee, the rest are arguments
pub fn call(callee: Rc<Node>, args: Vec<Rc<Node>>) -> Rc<Node> {
    let mut children = vec![callee];
    children.extend(args);
    Node::new(NodeKind::CallExpr, Attrs::None, children)
}

pub fn compound(stmts: Vec<Rc<Node>>) -> Rc<Node> {
    Node::new(NodeKind::CompoundStmt, Attrs::None, stmts)
}

pub fn decl_stmt(decls: Vec<Rc<Node>>) -> Rc<Node> {
    Node::new(NodeKind::DeclStmt, Attrs::None, decls)
}

pub fn var_decl(name: &str, ty: Rc<Node>, init: Option<Rc<Node>>) -> Rc<Node> {
    let mut children = vec![ty];
    children.extend(init);
    Node::new(NodeKind::VarDecl, Attrs::Name(name.to_string()), children)
}

pub fn parm_var_decl(name: &str, ty: Rc<Node>) -> Rc<Node> {
    Node::new(
        NodeKind::ParmVarDecl,
        Attrs::Name(name.to_string()),
        vec![ty],
    )
}

pub fn if_stmt(cond: Rc<Node>, then: Rc<Node>, otherwise: Option<Rc<Node>>) -> Rc<Node> {
    let mut children = vec![cond, then];
    children.extend(otherwise);
    Node::new(NodeKind::IfStmt, Attrs::None, children)
}

/// `for` statement; all four children are required, in source order
pub fn for_stmt(init: Rc<Node>, cond: Rc<Node>, update: Rc<Node>, body: Rc<Node>) -> Rc<Node> {
    Node::new(NodeKind::ForStmt, Attrs::None, vec![init, cond, update, body])
}

pub fn while_stmt(cond: Rc<Node>, body: Rc<Node>) -> Rc<Node> {
    Node::new(NodeKind::WhileStmt, Attrs::None, vec![cond, body])
}

pub fn do_stmt(body: Rc<Node>, cond: Rc<Node>) -> Rc<Node> {
    Node::new(NodeKind::DoStmt, Attrs::None, vec![body, cond])
}

pub fn break_stmt() -> Rc<Node> {
    Node::new(NodeKind::BreakStmt, Attrs::None, vec![])
}

pub fn continue_stmt() -> Rc<Node> {
    Node::new(NodeKind::ContinueStmt, Attrs::None, vec![])
}

pub fn return_stmt(expr: Option<Rc<Node>>) -> Rc<Node> {
    Node::new(
        NodeKind::ReturnStmt,
        Attrs::None,
        expr.into_iter().collect(),
    )
}

pub fn builtin_type(name: &str) -> Rc<Node> {
    Node::new(
        NodeKind::BuiltinType,
        Attrs::Name(name.to_string()),
        vec![],
    )
}

pub fn int_type() -> Rc<Node> {
    builtin_type("int")
}

pub fn pointer_type(pointee: Rc<Node>) -> Rc<Node> {
    Node::new(NodeKind::PointerType, Attrs::None, vec![pointee])
}

pub fn array_type(elem: Rc<Node>, count: Rc<Node>) -> Rc<Node> {
    Node::new(NodeKind::ConstantArrayType, Attrs::None, vec![elem, count])
}

/// Function prototype: result type first, then one `ParmVarDecl` per
/// formal parameter
pub fn proto_type(result: Rc<Node>, params: Vec<Rc<Node>>) -> Rc<Node> {
    let mut children = vec![result];
    children.extend(params);
    Node::new(NodeKind::FunctionProtoType, Attrs::None, children)
}

pub fn no_proto_type(result: Rc<Node>) -> Rc<Node> {
    Node::new(NodeKind::FunctionNoProtoType, Attrs::None, vec![result])
}

/// Function definition: type expression, then the body compound statement
pub fn function_decl(name: &str, ty: Rc<Node>, body: Rc<Node>) -> Rc<Node> {
    Node::new(
        NodeKind::FunctionDecl,
        Attrs::Name(name.to_string()),
        vec![ty, body],
    )
}
