//! # Introduction
//!
//! cstep executes a subset of C one elementary computation at a time.
//! The heart of the crate is a pure transition function,
//! [`stepper::step`], which takes the interpreter state and a reified
//! control descriptor and returns the next descriptor together with the
//! *effects* (scope changes, declarations, loads, stores, calls) an
//! outer driver applies. Because the stepper never mutates anything,
//! every intermediate configuration is observable and replayable, which
//! is what stepping debuggers and execution-animation UIs need.
//!
//! ## Execution pipeline
//!
//! ```text
//! AST → step → (control', result, effects) → driver applies effects → step → …
//! ```
//!
//! 1. [`ast`] — the node shapes the stepper consumes; parsing happens
//!    elsewhere, [`ast::build`] assembles trees directly.
//! 2. [`stepper`] — the small-step core: one continuation protocol per
//!    node kind, a reified control chain, and the effect protocol.
//! 3. [`memory`] — the byte-addressable store, tagged values, and the
//!    primitive evaluators (arithmetic, casts, pointer math).
//! 4. [`driver`] — the loop that applies effects, manages scopes and
//!    function frames, and hosts builtins.
//!
//! ## Supported C subset
//!
//! Types: `char`, `short`, `int`, `long` (and unsigned forms), `float`,
//! `double`, pointers, fixed-size arrays.
//! Control flow: `if/else`, `while`, `for`, `do-while`, `break`,
//! `continue`, `return`, the conditional operator.
//! Expressions: the full operator set with C evaluation order,
//! short-circuiting, lvalue/value modes, array decay, and scaled pointer
//! arithmetic; `sizeof`; calls to program functions and host builtins.

pub mod ast;
pub mod driver;
pub mod memory;
pub mod scope;
pub mod state;
pub mod stepper;
pub mod types;
