//! Builtin functions
//!
//! A builtin is an ordinary [`BuiltinFn`]: the call protocol hands it the
//! read-only state, the caller's continuation, and the collected call
//! values (`values[0]` is the builtin binding itself). The builtin
//! returns the next transition, so it controls its own effects and may
//! even keep stepping through a private frame if it needs sub-steps.
//!
//! Hosts register their own with [`super::Interpreter::register_builtin`];
//! the defaults installed here are the small numeric helpers tests and
//! demos lean on.

use super::Interpreter;
use crate::memory::value::Value;
use crate::state::State;
use crate::stepper::{Control, StepError, Transition};

/// Install the default builtin set
pub fn install_defaults(interpreter: &mut Interpreter) {
    interpreter.register_builtin("abs", abs);
}

fn argument<'a>(values: &'a [Value], index: usize) -> Result<&'a Value, StepError> {
    values.get(index + 1).ok_or(StepError::ArgumentCount {
        expected: index + 1,
        got: values.len().saturating_sub(1),
    })
}

/// `int abs(int x)`
pub fn abs(_state: &State, cont: Control, values: &[Value]) -> Result<Transition, StepError> {
    let argument = argument(values, 0)?;
    let number = argument
        .as_integral()
        .ok_or(StepError::Protocol {
            context: "abs expects an integral argument",
        })?
        .number;
    Ok(Transition::to(cont).with_value(Value::int(number.wrapping_abs())))
}
