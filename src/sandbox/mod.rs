//! Isolated execution of learner code and test scripts.
//!
//! ## Modules
//!
//! - `executor` - one evaluation inside a fresh realm: scan, compile, run learner code, run tests
//! - `timeout` - the wall-clock guard around a run on a dedicated thread
//!
//! ## Design
//!
//! Isolation is structural. Each evaluation gets its own [`Interpreter`](crate::runtime::Interpreter), so
//! there is no shared heap, no host object and no ambient capability beyond the intrinsics. The only extra
//! surface a unit sees is what [`Capabilities`] grants plus the bindings the executor passes in as
//! parameters (`exports`/`module` for learner code, `userCode`/`expect`/`describe`/`it`/`test` for tests).

pub mod executor;
pub mod timeout;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use executor::{Sandbox, compile, execute};
pub use timeout::{run_bounded, run_bounded_blocking};

/// Host surfaces a unit may see beyond the intrinsics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// A headless `document` plus the `Event` constructors.
    pub document: bool,
}

impl Capabilities {
    pub fn with_document() -> Self {
        Self { document: true }
    }
}

/// Role of a source unit, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    Prelude,
    Learner,
    TestScript,
}

impl SourceRole {
    pub fn label(self) -> &'static str {
        match self {
            SourceRole::Prelude => "prelude",
            SourceRole::Learner => "learner code",
            SourceRole::TestScript => "test code",
        }
    }
}

/// Everything one evaluation needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationRequest {
    pub learner: String,
    pub tests: String,
    /// Instructor code run before the learner code, sharing its `exports`/`module`.
    pub prelude: Option<String>,
    /// Top-level learner bindings copied onto the exports object after the learner code runs.
    pub capture: Vec<String>,
    pub capabilities: Capabilities,
    /// Overrides the engine's default budget.
    #[serde(with = "millis", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl EvaluationRequest {
    pub fn new(learner: impl Into<String>, tests: impl Into<String>) -> Self {
        Self {
            learner: learner.into(),
            tests: tests.into(),
            ..Self::default()
        }
    }

    pub fn with_prelude(mut self, prelude: impl Into<String>) -> Self {
        self.prelude = Some(prelude.into());
        self
    }

    pub fn with_capture<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capture.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The source units in execution order.
    pub fn units(&self) -> impl Iterator<Item = (SourceRole, &str)> {
        self.prelude
            .as_deref()
            .map(|p| (SourceRole::Prelude, p))
            .into_iter()
            .chain([
                (SourceRole::Learner, self.learner.as_str()),
                (SourceRole::TestScript, self.tests.as_str()),
            ])
    }
}

/// `Option<Duration>` as an optional millisecond count.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_order() {
        let request = EvaluationRequest::new("l", "t").with_prelude("p");
        let roles: Vec<SourceRole> = request.units().map(|(r, _)| r).collect();
        assert_eq!(roles, [SourceRole::Prelude, SourceRole::Learner, SourceRole::TestScript]);
    }

    #[test]
    fn test_request_from_json() {
        let request: EvaluationRequest = serde_json::from_str(
            r#"{ "learner": "exports.x = 1", "tests": "", "capture": ["element"],
                 "capabilities": { "document": true }, "timeout": 250 }"#,
        )
        .expect("request should parse");
        assert_eq!(request.capture, ["element"]);
        assert!(request.capabilities.document);
        assert_eq!(request.timeout, Some(Duration::from_millis(250)));
        assert_eq!(request.prelude, None);
    }
}
