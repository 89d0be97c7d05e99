//! `describe` / `it` / `test`: cases run the moment they are registered.
//!
//! A [`Harness`] owns the outcome list for one evaluation. The natives it installs share that list through
//! an `Rc<RefCell<_>>`, the same way the interpreter's scopes share bindings. A thrown exception inside a
//! case body fails that case only; an exception in a `describe` body fails one synthetic outcome named
//! `describe: <name>`. Interrupts are never recorded: they propagate out of the native and end the run.

use std::cell::RefCell;
use std::rc::Rc;

use crate::report::AssertionOutcome;
use crate::runtime::object::CallArgs;
use crate::runtime::{Abrupt, Completion, Interpreter, Value};

/// Lifecycle of one harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Registering,
    RunningCase,
    Aggregating,
    Done,
}

#[derive(Debug)]
struct State {
    phase: Phase,
    outcomes: Vec<AssertionOutcome>,
    /// Case bodies currently on the stack; `test` may be called from inside another case.
    running: usize,
}

/// The script-visible bindings of a harness.
#[derive(Debug, Clone)]
pub struct HarnessBindings {
    pub describe: Value,
    pub it: Value,
    pub test: Value,
}

#[derive(Debug, Clone)]
pub struct Harness {
    state: Rc<RefCell<State>>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                phase: Phase::Idle,
                outcomes: Vec::new(),
                running: 0,
            })),
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    /// Create the `describe`, `it` and `test` natives bound to this harness.
    pub fn install(&self, it: &mut Interpreter) -> Completion<HarnessBindings> {
        self.state.borrow_mut().phase = Phase::Registering;

        let state = Rc::clone(&self.state);
        let test = it.new_native("test", 2, move |it, args| run_case(it, &state, &args))?;
        let state = Rc::clone(&self.state);
        let it_fn = it.new_native("it", 2, move |it, args| run_case(it, &state, &args))?;
        let state = Rc::clone(&self.state);
        let describe = it.new_native("describe", 2, move |it, args| run_describe(it, &state, &args))?;

        Ok(HarnessBindings {
            describe: Value::Object(describe),
            it: Value::Object(it_fn),
            test: Value::Object(test),
        })
    }

    /// Close registration and hand back every recorded outcome, in registration order.
    pub fn finish(&self) -> Vec<AssertionOutcome> {
        let mut state = self.state.borrow_mut();
        state.phase = Phase::Aggregating;
        let outcomes = std::mem::take(&mut state.outcomes);
        state.phase = Phase::Done;
        tracing::debug!(cases = outcomes.len(), "harness finished");
        outcomes
    }
}

fn case_name(it: &mut Interpreter, args: &CallArgs<'_>) -> Completion<String> {
    Ok(it.to_string(&args.arg(0))?.to_string())
}

fn record(state: &Rc<RefCell<State>>, outcome: AssertionOutcome) {
    state.borrow_mut().outcomes.push(outcome);
}

fn run_case(it: &mut Interpreter, state: &Rc<RefCell<State>>, args: &CallArgs<'_>) -> Completion<Value> {
    let name = case_name(it, args)?;
    let body = args.arg(1);
    if !it.is_callable(&body) {
        record(state, AssertionOutcome::fail(name, "test body must be a function"));
        return Ok(Value::Undefined);
    }

    {
        let mut s = state.borrow_mut();
        s.running += 1;
        s.phase = Phase::RunningCase;
    }
    let result = it.call(&body, Value::Undefined, &[]);
    {
        let mut s = state.borrow_mut();
        s.running -= 1;
        if s.running == 0 {
            s.phase = Phase::Registering;
        }
    }

    match result {
        Ok(_) => {
            tracing::debug!(case = %name, "case passed");
            record(state, AssertionOutcome::pass(name));
        }
        Err(Abrupt::Throw(error)) => {
            let message = it.thrown_message(&error);
            tracing::debug!(case = %name, %message, "case failed");
            record(state, AssertionOutcome::fail(name, message));
        }
        Err(interrupt @ Abrupt::Interrupt(_)) => return Err(interrupt),
    }
    Ok(Value::Undefined)
}

fn run_describe(it: &mut Interpreter, state: &Rc<RefCell<State>>, args: &CallArgs<'_>) -> Completion<Value> {
    let name = case_name(it, args)?;
    let body = args.arg(1);
    if !it.is_callable(&body) {
        record(
            state,
            AssertionOutcome::fail(format!("describe: {name}"), "test body must be a function"),
        );
        return Ok(Value::Undefined);
    }
    match it.call(&body, Value::Undefined, &[]) {
        Ok(_) => {}
        Err(Abrupt::Throw(error)) => {
            let message = it.thrown_message(&error);
            record(state, AssertionOutcome::fail(format!("describe: {name}"), message));
        }
        Err(interrupt @ Abrupt::Interrupt(_)) => return Err(interrupt),
    }
    Ok(Value::Undefined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::scope::{FunctionFrame, Scope};
    use crate::runtime::{Interrupt, InterruptHandle, Limits};

    fn run(source: &str) -> (Completion<Value>, Vec<AssertionOutcome>, Phase) {
        let program = proctor_syntax::parse_source(source).expect("test source should parse");
        let mut it = Interpreter::new(Limits::default(), InterruptHandle::new()).expect("realm");
        let harness = Harness::new();
        let bindings = harness.install(&mut it).expect("install");
        let expect = crate::matchers::install(&mut it).expect("matchers");
        it.define_global("describe", bindings.describe);
        it.define_global("it", bindings.it);
        it.define_global("test", bindings.test);
        it.define_global("expect", expect);
        let scope = Scope::function(it.global_scope(), FunctionFrame::default());
        let result = it.run_program(&program, &scope);
        let outcomes = harness.finish();
        (result, outcomes, harness.phase())
    }

    #[test]
    fn test_cases_run_immediately_and_in_order() {
        let (result, outcomes, phase) = run(
            "test('first', () => expect(1).toBe(1));
             it('second', () => expect(2).toBe(3));",
        );
        assert!(result.is_ok());
        assert_eq!(phase, Phase::Done);
        assert_eq!(
            outcomes,
            vec![
                AssertionOutcome::pass("first"),
                AssertionOutcome::fail("second", "Expected 2 to be 3"),
            ]
        );
    }

    #[test]
    fn test_failing_case_does_not_abort_siblings() {
        let (_, outcomes, _) = run(
            "describe('math', () => {
                test('a', () => { throw new Error('boom') });
                test('b', () => {});
             });",
        );
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].error.as_deref(), Some("boom"));
        assert!(outcomes[1].passed);
    }

    #[test]
    fn test_describe_failure_is_one_outcome() {
        let (_, outcomes, _) = run(
            "describe('setup', () => { null.x });
             test('after', () => {});",
        );
        assert_eq!(outcomes[0].name, "describe: setup");
        assert!(!outcomes[0].passed);
        assert!(outcomes[1].passed);
    }

    #[test]
    fn test_non_function_body() {
        let (_, outcomes, _) = run("test('broken', 42)");
        assert_eq!(
            outcomes,
            vec![AssertionOutcome::fail("broken", "test body must be a function")]
        );
    }

    #[test]
    fn test_thrown_primitives_are_stringified() {
        let (_, outcomes, _) = run("test('p', () => { throw 'plain' })");
        assert_eq!(outcomes[0].error.as_deref(), Some("plain"));
    }

    #[test]
    fn test_interrupt_is_not_absorbed() {
        let program = proctor_syntax::parse_source("test('spin', () => { while (true) {} })").expect("parse");
        let handle = InterruptHandle::new();
        handle.trigger();
        let mut it = Interpreter::new(Limits::default(), handle).expect("realm");
        let harness = Harness::new();
        let bindings = harness.install(&mut it).expect("install");
        it.define_global("test", bindings.test);
        let scope = Scope::function(it.global_scope(), FunctionFrame::default());
        let result = it.run_program(&program, &scope);
        assert!(matches!(result, Err(Abrupt::Interrupt(Interrupt::Timeout))));
        assert!(harness.finish().is_empty());
    }
}
