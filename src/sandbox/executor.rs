//! One evaluation, start to finish, on the current thread.

use proctor_syntax::ast::Program;

use super::{Capabilities, EvaluationRequest, SourceRole};
use crate::error::EngineError;
use crate::harness::Harness;
use crate::policy::Policy;
use crate::report::AssertionOutcome;
use crate::report::formatter::RawSuite;
use crate::runtime::dom::{self, Document};
use crate::runtime::scope::{BindingKind, FunctionFrame, Scope, ScopeRef};
use crate::runtime::{Abrupt, Interrupt, InterruptHandle, Interpreter, Limits, ObjectId, Value};

/// Screen every unit of `request` in execution order.
pub fn screen(request: &EvaluationRequest, policy: &Policy) -> Result<(), EngineError> {
    for (role, source) in request.units() {
        let verdict = policy.scan(source);
        if !verdict.allowed {
            tracing::info!(role = role.label(), rule = ?verdict.violated_rule, "source rejected by policy");
            return Err(EngineError::Policy {
                rule: verdict.violated_rule.unwrap_or_default(),
                message: verdict.message.unwrap_or_default(),
            });
        }
    }
    Ok(())
}

/// Parse one unit. The first diagnostic becomes the fatal message.
#[tracing::instrument(level = "debug", skip_all, fields(role = role.label(), len = source.len()))]
pub fn compile(role: SourceRole, source: &str) -> Result<Program, EngineError> {
    proctor_syntax::parse_source(source).map_err(|errors| {
        let message = errors
            .first()
            .map(|e| e.display_with_location(source))
            .unwrap_or_else(|| "SyntaxError: invalid source".to_string());
        tracing::debug!(errors = errors.len(), %message, "compile failed");
        EngineError::Compile(format!("{message} in {}", role.label()))
    })
}

/// A fresh realm with the requested capabilities installed.
pub struct Sandbox {
    it: Interpreter,
    document: Option<Document>,
}

impl Sandbox {
    pub fn new(capabilities: Capabilities, limits: Limits, interrupt: InterruptHandle) -> Result<Self, EngineError> {
        let mut it = Interpreter::new(limits, interrupt)
            .map_err(|_| EngineError::Internal("Heap limit too small for the runtime".to_string()))?;
        let document = if capabilities.document {
            Some(dom::install(&mut it).map_err(|a| abrupt_error(&it, a))?)
        } else {
            None
        };
        Ok(Self { it, document })
    }

    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.it
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Run the prelude (if any) and the learner code, each as a function body of `(exports, module)`.
    ///
    /// Returns `module.exports` after the learner code finished, with every name in `capture` that the
    /// learner code bound at top level copied onto it.
    #[tracing::instrument(level = "debug", skip_all, fields(captures = capture.len()))]
    pub fn run_learner(
        &mut self,
        prelude: Option<&Program>,
        learner: &Program,
        capture: &[String],
    ) -> Result<Value, EngineError> {
        let exports = self.new_object()?;
        let module = self.new_object()?;
        self.it.define_data(module, "exports", Value::Object(exports));
        let params = [("exports", Value::Object(exports)), ("module", Value::Object(module))];

        if let Some(prelude) = prelude {
            self.run_unit(prelude, &params)?;
        }
        let scope = self.run_unit(learner, &params)?;

        let surface = self
            .it
            .get_property(module, "exports")
            .map_err(|a| abrupt_error(&self.it, a))?;
        if let Value::Object(target) = surface {
            self.splice(&scope, target, capture)?;
        }
        Ok(surface)
    }

    /// Run the test script as a function body of `(userCode, expect, describe, it, test)`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run_tests(&mut self, tests: &Program, user_code: Value) -> Result<Vec<AssertionOutcome>, EngineError> {
        let harness = Harness::new();
        let bindings = harness.install(&mut self.it).map_err(|a| abrupt_error(&self.it, a))?;
        let expect = crate::matchers::install(&mut self.it).map_err(|a| abrupt_error(&self.it, a))?;
        self.run_unit(
            tests,
            &[
                ("userCode", user_code),
                ("expect", expect),
                ("describe", bindings.describe),
                ("it", bindings.it),
                ("test", bindings.test),
            ],
        )?;
        Ok(harness.finish())
    }

    fn new_object(&mut self) -> Result<ObjectId, EngineError> {
        self.it.new_object().map_err(|a| abrupt_error(&self.it, a))
    }

    /// Run `program` in a new function scope whose parameters are `params`; returns that scope.
    fn run_unit(&mut self, program: &Program, params: &[(&str, Value)]) -> Result<ScopeRef, EngineError> {
        let scope = Scope::function(self.it.global_scope(), FunctionFrame::default());
        {
            let mut s = scope.borrow_mut();
            for (name, value) in params {
                // Fresh scope, distinct names: cannot collide.
                let _ = s.declare(name, BindingKind::Function);
                s.initialize(name, value.clone());
            }
        }
        self.it
            .run_program(program, &scope)
            .map_err(|a| abrupt_error(&self.it, a))?;
        Ok(scope)
    }

    fn splice(&mut self, scope: &ScopeRef, target: ObjectId, capture: &[String]) -> Result<(), EngineError> {
        for name in capture {
            let bound = scope.borrow().get_own(name);
            match bound {
                Some(Ok(value)) => self
                    .it
                    .set_property(target, name, value)
                    .map_err(|a| abrupt_error(&self.it, a))?,
                Some(Err(err)) => tracing::debug!(%name, ?err, "captured binding is not initialized"),
                None => tracing::debug!(%name, "capture not bound by learner code"),
            }
        }
        Ok(())
    }
}

/// The engine error for a completion that escaped a unit.
pub(crate) fn abrupt_error(it: &Interpreter, abrupt: Abrupt) -> EngineError {
    match abrupt {
        Abrupt::Throw(value) => EngineError::Runtime(it.thrown_message(&value)),
        Abrupt::Interrupt(Interrupt::Timeout) => EngineError::Timeout,
        Abrupt::Interrupt(Interrupt::HeapExhausted) => EngineError::Runtime("Out of memory".to_string()),
    }
}

fn run(
    request: &EvaluationRequest,
    policy: &Policy,
    limits: Limits,
    interrupt: InterruptHandle,
) -> Result<Vec<AssertionOutcome>, EngineError> {
    screen(request, policy)?;
    let prelude = request
        .prelude
        .as_deref()
        .map(|p| compile(SourceRole::Prelude, p))
        .transpose()?;
    let learner = compile(SourceRole::Learner, &request.learner)?;
    let tests = compile(SourceRole::TestScript, &request.tests)?;

    let mut sandbox = Sandbox::new(request.capabilities, limits, interrupt)?;
    let user_code = sandbox.run_learner(prelude.as_ref(), &learner, &request.capture)?;
    sandbox.run_tests(&tests, user_code)
}

/// Evaluate `request` on the current thread: screen, compile, run learner code, run tests.
///
/// Blocks until the run ends, the deadline in `limits` passes, or `interrupt` is raised.
#[tracing::instrument(level = "debug", skip_all, fields(learner_len = request.learner.len(), tests_len = request.tests.len()))]
pub fn execute(request: &EvaluationRequest, policy: &Policy, limits: Limits, interrupt: InterruptHandle) -> RawSuite {
    match run(request, policy, limits, interrupt) {
        Ok(outcomes) => RawSuite::Completed(outcomes),
        Err(err) => {
            tracing::debug!(kind = ?err.kind(), error = %err, "evaluation ended early");
            err.into()
        }
    }
}
