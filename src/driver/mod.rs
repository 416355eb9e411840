//! The driver loop
//!
//! The stepper is pure; this module owns everything mutable. The driver
//! repeatedly invokes [`crate::stepper::step`], applies the returned
//! effects in order, commits the result slot, and follows the next
//! control. When a step resolves to the return sentinel it unwinds one
//! function frame (or, with none open, finishes the program).
//!
//! Hosts drive it one transition at a time ([`Interpreter::step_once`])
//! for debugger-style stepping, or to completion ([`Interpreter::run`]).
//! The applied-effect log (off by default) gives hosts and tests an
//! ordered trace of every state change.

pub mod builtins;

use crate::ast::{build, Attrs, Node, NodeKind, Program};
use crate::memory::value::{PointerValue, Value};
use crate::memory::{write_value, Memory, MemoryError};
use crate::scope::{DeclRef, Scope, ScopeKind};
use crate::state::State;
use crate::stepper::{
    self, step, BuiltinFn, Control, Effect, SeqPoint, StepError, StepResult,
};
use crate::types::{ScalarKind, Type};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// Default bound on the number of transitions a run may take
const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// Errors surfaced by the driver
#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    /// The program defines no `main` function
    NoMainFunction,

    /// A top-level declaration the loader does not understand
    InvalidDeclaration { kind: NodeKind },

    /// A declaration with no name attribute
    UnnamedDeclaration,

    /// The run exceeded its transition budget
    StepLimitExceeded { limit: usize },

    /// The stepper reported a structural error (undispatchable node)
    Structural(StepError),

    /// The stepper raised a semantic error
    Step(StepError),

    /// Effect application failed in the memory store
    Memory(MemoryError),

    /// A `Leave` effect found no matching open block
    UnbalancedScope,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::NoMainFunction => write!(f, "no main() function found"),
            RunError::InvalidDeclaration { kind } => {
                write!(f, "unsupported top-level declaration: {}", kind.name())
            }
            RunError::UnnamedDeclaration => write!(f, "top-level declaration has no name"),
            RunError::StepLimitExceeded { limit } => {
                write!(f, "exceeded the step limit of {} transitions", limit)
            }
            RunError::Structural(err) => write!(f, "structural error: {}", err),
            RunError::Step(err) => write!(f, "{}", err),
            RunError::Memory(err) => write!(f, "{}", err),
            RunError::UnbalancedScope => write!(f, "leave effect with no matching open block"),
        }
    }
}

impl std::error::Error for RunError {}

impl From<StepError> for RunError {
    fn from(err: StepError) -> Self {
        RunError::Step(err)
    }
}

impl From<MemoryError> for RunError {
    fn from(err: MemoryError) -> Self {
        RunError::Memory(err)
    }
}

/// One open function frame: where to resume, what was called, and the
/// caller's scope to restore
#[derive(Debug, Clone)]
struct CallRecord {
    cont: Control,
    #[allow(dead_code)] // surfaced to hosts via `call_depth`/stack display
    callee: Option<Value>,
    scope: Rc<Scope>,
}

/// The effect-applying interpreter around the pure stepper
#[derive(Debug)]
pub struct Interpreter {
    state: State,
    control: Control,
    frames: Vec<CallRecord>,
    finished: bool,
    steps_taken: usize,
    step_limit: usize,
    record_effects: bool,
    effect_log: Vec<Effect>,
}

impl Interpreter {
    /// Load a program: register the default builtins and its functions
    /// (program definitions shadow builtins of the same name),
    /// materialize string literals, and aim the control at `main()`.
    pub fn new(program: Program) -> Result<Self, RunError> {
        let mut interpreter = Interpreter {
            state: State::new(),
            control: Control::Return,
            frames: Vec::new(),
            finished: false,
            steps_taken: 0,
            step_limit: DEFAULT_STEP_LIMIT,
            record_effects: false,
            effect_log: Vec::new(),
        };
        builtins::install_defaults(&mut interpreter);

        for decl in &program.decls {
            if decl.kind != NodeKind::FunctionDecl {
                return Err(RunError::InvalidDeclaration { kind: decl.kind });
            }
            let name = decl.name().ok_or(RunError::UnnamedDeclaration)?.to_string();
            let decl = materialize_strings(decl, &mut interpreter.state.memory)?;
            interpreter
                .state
                .globals
                .insert(name, DeclRef::Direct(Value::Function(decl)));
        }
        if !interpreter.state.globals.contains_key("main") {
            return Err(RunError::NoMainFunction);
        }

        // The whole run is one synthetic full expression: a call to main.
        let entry = build::call(build::decl_ref("main"), vec![]);
        interpreter.control = stepper::enter_expr(&entry, Control::Return, stepper::Mode::Value);
        Ok(interpreter)
    }

    /// Cap the number of transitions `run` may take
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    /// Keep an ordered log of every applied effect
    pub fn record_effects(mut self, on: bool) -> Self {
        self.record_effects = on;
        self
    }

    /// Bind a builtin by name; calls to `name` dispatch to `builtin`
    pub fn register_builtin(&mut self, name: &str, builtin: BuiltinFn) {
        self.state
            .globals
            .insert(name.to_string(), DeclRef::Direct(Value::Builtin(builtin)));
    }

    /// Drive the program to completion
    pub fn run(&mut self) -> Result<(), RunError> {
        while !self.finished {
            self.step_once()?;
        }
        Ok(())
    }

    /// Apply exactly one transition (or one frame unwind)
    pub fn step_once(&mut self) -> Result<(), RunError> {
        if self.finished {
            return Ok(());
        }
        if self.control.is_return() {
            return self.unwind();
        }
        if self.steps_taken >= self.step_limit {
            return Err(RunError::StepLimitExceeded {
                limit: self.step_limit,
            });
        }
        self.steps_taken += 1;

        let control = std::mem::replace(&mut self.control, Control::Return);
        let transition = step(&self.state, control)?;
        if let Some(error) = transition.error {
            return Err(RunError::Structural(error));
        }
        for effect in transition.effects {
            if self.record_effects {
                self.effect_log.push(effect.clone());
            }
            self.apply(effect)?;
        }
        if let Some(result) = transition.result {
            self.state.result = Some(result);
        }
        self.control = transition.control;
        Ok(())
    }

    /// The stepper resolved to the return sentinel: close the top
    /// function frame, or finish the program when none is open
    fn unwind(&mut self) -> Result<(), RunError> {
        match self.frames.pop() {
            Some(record) => {
                debug!(depth = self.frames.len(), "function returned");
                if self.record_effects {
                    self.log_abandoned_blocks();
                }
                self.state.scope = record.scope;
                self.control = record.cont;
            }
            None => {
                debug!(steps = self.steps_taken, "evaluation complete");
                self.finished = true;
            }
        }
        Ok(())
    }

    /// A `return` bypasses the `Leave` steps of the blocks it jumps out
    /// of; make the scope transition visible in the trace anyway.
    fn log_abandoned_blocks(&mut self) {
        let mut cursor = Some(self.state.scope.clone());
        while let Some(record) = cursor {
            if record.kind == ScopeKind::Function {
                break;
            }
            if record.kind == ScopeKind::Block {
                if let Some(node) = &record.node {
                    self.effect_log.push(Effect::Leave(node.clone()));
                }
            }
            cursor = record.parent.clone();
        }
    }

    fn apply(&mut self, effect: Effect) -> Result<(), RunError> {
        match effect {
            Effect::Enter(node) => {
                trace!("enter block");
                self.state.scope = Scope::block(self.state.scope.clone(), node);
            }
            Effect::Leave(node) => {
                trace!("leave block");
                self.state.scope = leave_block(&self.state.scope, &node)?;
            }
            Effect::VarDecl { name, ty, init } => {
                trace!(name = %name, "declare variable");
                let address = self.state.memory.allocate(ty.size());
                let pointer = PointerValue::new(Type::pointer(ty), address);
                if let Some(value) = init {
                    write_value(&mut self.state.memory, &pointer, &value)?;
                }
                self.state.scope =
                    Scope::binding(self.state.scope.clone(), &name, DeclRef::Storage(pointer));
            }
            Effect::Load(pointer) => {
                // Observability only; the stepper already read the value.
                trace!(address = pointer.address, "load");
            }
            Effect::Store(pointer, value) => {
                trace!(address = pointer.address, "store");
                write_value(&mut self.state.memory, &pointer, &value)?;
            }
            Effect::Call { cont, values } => {
                debug!(depth = self.frames.len() + 1, "function call");
                self.frames.push(CallRecord {
                    cont,
                    callee: values.first().cloned(),
                    scope: self.state.scope.clone(),
                });
                self.state.scope = Scope::function(self.state.scope.clone());
            }
        }
        Ok(())
    }

    // ---- host accessors --------------------------------------------------

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The final value of `main`, once finished
    pub fn result(&self) -> Option<&Value> {
        match &self.state.result {
            Some(StepResult::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn control(&self) -> &Control {
        &self.control
    }

    /// Sequence tag of the frame about to step, for host pause points
    pub fn current_seq(&self) -> Option<SeqPoint> {
        self.control.frame().and_then(|frame| frame.seq)
    }

    /// Number of open function frames
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// The ordered applied-effect log (empty unless recording)
    pub fn effects(&self) -> &[Effect] {
        &self.effect_log
    }
}

/// Pop scope records through the block opened for `node`.
///
/// Inner blocks abandoned by `break`/`continue` never see their own
/// `Leave`, so this walks past their leftovers and re-balances at the
/// enclosing block.
fn leave_block(scope: &Rc<Scope>, node: &Rc<Node>) -> Result<Rc<Scope>, RunError> {
    let mut current = scope.clone();
    loop {
        let matches = current.kind == ScopeKind::Block
            && current.node.as_ref().is_some_and(|open| Rc::ptr_eq(open, node));
        if matches {
            return current.parent.clone().ok_or(RunError::UnbalancedScope);
        }
        if current.kind == ScopeKind::Function {
            return Err(RunError::UnbalancedScope);
        }
        current = current.parent.clone().ok_or(RunError::UnbalancedScope)?;
    }
}

/// Copy a string literal into memory: its bytes plus a NUL terminator.
/// Returns the decayed `char*` pointer stored into the node's attrs.
pub fn intern_string(memory: &mut Memory, text: &str) -> Result<PointerValue, MemoryError> {
    let bytes = text.as_bytes();
    let address = memory.allocate(bytes.len() + 1);
    memory.write_bytes(address, bytes)?;
    memory.write_bytes(address + bytes.len() as u64, &[0])?;
    Ok(PointerValue::new(
        Type::pointer(Type::Scalar(ScalarKind::Char)),
        address,
    ))
}

/// Rebuild a declaration with every string literal materialized
fn materialize_strings(node: &Rc<Node>, memory: &mut Memory) -> Result<Rc<Node>, RunError> {
    let mut children = Vec::with_capacity(node.children.len());
    for c in &node.children {
        children.push(materialize_strings(c, memory)?);
    }
    let attrs = match &node.attrs {
        Attrs::Str {
            value,
            reference: None,
        } => Attrs::Str {
            value: value.clone(),
            reference: Some(intern_string(memory, value)?),
        },
        other => other.clone(),
    };
    Ok(Rc::new(Node {
        kind: node.kind,
        attrs,
        children,
    }))
}
