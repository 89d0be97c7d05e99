//! The public entry point: one [`Engine`] per configuration, one fresh sandbox per call.
//!
//! ## Examples
//! ```rust
//! use proctor::engine::Engine;
//! use proctor::sandbox::EvaluationRequest;
//!
//! let engine = Engine::default();
//! let request = EvaluationRequest::new(
//!     "exports.add = (a, b) => a + b",
//!     "test('adds', () => expect(userCode.add(2, 3)).toBe(5))",
//! );
//! let result = engine.evaluate_blocking(&request);
//! assert!(result.passed);
//! assert_eq!(result.total, 1);
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::policy::{Policy, PolicyError};
use crate::preview::{self, IsolatedDocument, PreviewTemplate};
use crate::report::formatter::{self, RawSuite};
use crate::report::SuiteResult;
use crate::runtime::InterruptHandle;
use crate::sandbox::{self, EvaluationRequest};

type Job = Box<dyn FnOnce() -> RawSuite + Send>;

/// A configured evaluator. Cheap to clone; holds no per-evaluation state.
#[derive(Debug, Clone)]
pub struct Engine {
    config: Arc<EngineConfig>,
    policy: Arc<Policy>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            config: Arc::new(EngineConfig::default()),
            policy: Arc::new(Policy::default()),
        }
    }
}

impl Engine {
    /// Build an engine, resolving the configured policy.
    pub fn new(config: EngineConfig) -> Result<Self, PolicyError> {
        let policy = config.policy.build()?;
        Ok(Self {
            config: Arc::new(config),
            policy: Arc::new(policy),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Evaluate learner code against a test script.
    ///
    /// Never fails: policy violations, compile errors, escaping exceptions and timeouts all come back as
    /// fatal results.
    #[tracing::instrument(level = "info", skip_all, fields(dom = request.capabilities.document))]
    pub async fn evaluate(&self, request: &EvaluationRequest) -> SuiteResult {
        let (job, budget, interrupt) = self.job(request);
        let raw = sandbox::run_bounded(job, budget, self.config.sandbox_stack_size, interrupt)
            .await
            .unwrap_or_else(RawSuite::from);
        finish(raw)
    }

    /// [`Engine::evaluate`] for synchronous callers. Blocks the calling thread, even inside an async runtime.
    #[tracing::instrument(level = "info", skip_all, fields(dom = request.capabilities.document))]
    pub fn evaluate_blocking(&self, request: &EvaluationRequest) -> SuiteResult {
        let (job, budget, interrupt) = self.job(request);
        let raw = sandbox::run_bounded_blocking(job, budget, self.config.sandbox_stack_size, interrupt)
            .unwrap_or_else(RawSuite::from);
        finish(raw)
    }

    /// Render learner framework code into an isolated static document.
    pub async fn render_preview(&self, learner: &str, template: &PreviewTemplate) -> IsolatedDocument {
        preview::render_preview(learner, template, &self.policy, &self.config).await
    }

    fn job(&self, request: &EvaluationRequest) -> (Job, Duration, InterruptHandle) {
        let budget = request.timeout.unwrap_or_else(|| self.config.timeout());
        let interrupt = InterruptHandle::new();
        let limits = self.config.limits(Instant::now(), budget);
        let policy = Arc::clone(&self.policy);
        let request = request.clone();
        let worker_interrupt = interrupt.clone();
        let job: Job = Box::new(move || sandbox::execute(&request, &policy, limits, worker_interrupt));
        (job, budget, interrupt)
    }
}

fn finish(raw: RawSuite) -> SuiteResult {
    let result = formatter::format(raw);
    tracing::info!(
        passed = result.passed,
        total = result.total,
        failed = result.failed_count,
        fatal = ?result.fatal_kind,
        "evaluation finished"
    );
    result
}

/// Evaluate with the default configuration and a `timeout_ms` budget.
///
/// Blocking; safe to call from synchronous code and from inside a tokio runtime alike.
pub fn evaluate(learner: &str, tests: &str, timeout_ms: u64) -> SuiteResult {
    let request = EvaluationRequest::new(learner, tests).with_timeout(Duration::from_millis(timeout_ms));
    Engine::default().evaluate_blocking(&request)
}

impl From<EngineError> for SuiteResult {
    fn from(err: EngineError) -> Self {
        err.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyConfig;
    use crate::report::FatalKind;

    #[tokio::test]
    async fn test_async_evaluate() {
        let request = EvaluationRequest::new("exports.n = 3", "test('n', () => expect(userCode.n).toBeGreaterThan(2))");
        let result = Engine::default().evaluate(&request).await;
        assert!(result.passed);
    }

    #[test]
    fn test_configured_policy_applies() {
        let config = EngineConfig::default().with_policy(PolicyConfig {
            rules: Some(Vec::new()),
            max_source_length: 5,
        });
        let engine = Engine::new(config).expect("valid config");
        let result = engine.evaluate_blocking(&EvaluationRequest::new("exports.x = 1", ""));
        assert_eq!(result.fatal_kind, Some(FatalKind::Policy));
        assert_eq!(result.fatal_error.as_deref(), Some("Code validation failed: Code is too long"));
    }

    #[test]
    fn test_request_timeout_overrides_config() {
        let request = EvaluationRequest::new("while (true) {}", "").with_timeout(Duration::from_millis(50));
        let result = Engine::default().evaluate_blocking(&request);
        assert_eq!(result.fatal_kind, Some(FatalKind::Timeout));
        assert_eq!(result.outcomes[0].error.as_deref(), Some("Test execution timeout"));
    }

    #[test]
    fn test_engine_error_converts_to_result() {
        let result = SuiteResult::from(EngineError::Internal("lost worker".into()));
        assert_eq!(result.fatal_kind, Some(FatalKind::Internal));
    }
}
