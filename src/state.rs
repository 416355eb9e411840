//! Driver-owned interpreter state
//!
//! The stepper receives the state read-only; every mutation goes through
//! the effect protocol. `result` is the value slot the driver fills from
//! each transition, read back by parent frames when a child completes.

use crate::memory::Memory;
use crate::scope::{DeclRef, Scope};
use crate::stepper::StepResult;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Everything the stepper may read
#[derive(Debug, Clone)]
pub struct State {
    /// The most recently produced step result
    pub result: Option<StepResult>,
    /// The byte-addressable store
    pub memory: Memory,
    /// The current scope chain
    pub scope: Rc<Scope>,
    /// Top-level bindings: functions and builtins, consulted after the
    /// scope chain is exhausted
    pub globals: FxHashMap<String, DeclRef>,
}

impl State {
    pub fn new() -> Self {
        State {
            result: None,
            memory: Memory::new(),
            scope: Scope::root(),
            globals: FxHashMap::default(),
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
