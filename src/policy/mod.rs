//! Static screening of untrusted source before anything runs.
//!
//! A [`Policy`] is an ordered list of [`Rule`]s. [`Policy::scan`] lexes the source once, extracts its
//! [sites](sites), and reports the first rule (in policy order) that any site satisfies. Scanning is total:
//! it never fails and never executes anything. Source that does not lex is allowed here, since it cannot
//! run and the compile step reports it.
//!
//! ## Examples
//! ```rust
//! use proctor::policy::Policy;
//!
//! let verdict = Policy::default().scan("const c = document.cookie");
//! assert!(!verdict.allowed);
//! assert_eq!(verdict.violated_rule.as_deref(), Some("document-cookie"));
//! ```

mod defaults;
pub mod sites;

use proctor_syntax::ast::Span;
use serde::{Deserialize, Serialize};

pub use defaults::{DEFAULT_MAX_SOURCE_LENGTH, default_rules};
use sites::{Site, SiteIndex};

/// How a rule recognizes a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Recognizer {
    /// Any free reference to `name`, unless the unit declares `name` at its top level (catches aliasing
    /// such as `const run = eval`).
    DeniedGlobal { name: String },
    /// `name(...)` or `x.name(...)`.
    DeniedCall { name: String },
    /// `object.property` or `object['property']`, also through parentheses, simple aliases and
    /// destructuring; without `object`, any receiver matches.
    DeniedMember {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        object: Option<String>,
        property: String,
    },
    /// `object.method('argument', ...)` with a literal first argument.
    DeniedCallWithArgument {
        object: String,
        method: String,
        argument: String,
    },
    /// Source longer than `limit` characters.
    MaxSourceLength { limit: usize },
}

/// One entry of a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub recognizer: Recognizer,
    /// Learner-facing explanation reported on violation.
    pub message: String,
}

impl Rule {
    pub fn new(id: impl Into<String>, recognizer: Recognizer, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            recognizer,
            message: message.into(),
        }
    }

    /// The span of the first site violating this rule, or `Some(None)` for whole-source rules.
    fn find(&self, source: &str, index: Option<&SiteIndex>) -> Option<Option<Span>> {
        if let Recognizer::MaxSourceLength { limit } = &self.recognizer {
            return (source.chars().count() > *limit).then_some(None);
        }
        let index = index?;
        let hit: Option<&Site> = match &self.recognizer {
            Recognizer::DeniedGlobal { name } => {
                if index.declared.contains(name) {
                    None
                } else {
                    index.references().find(|s| s.name == *name)
                }
            }
            Recognizer::DeniedCall { name } => index.calls().find(|s| s.name == *name),
            Recognizer::DeniedMember { object, property } => {
                let names = object.as_deref().map(|o| index.names_for(o));
                index
                    .members()
                    .find(|s| s.name == *property && names.as_ref().is_none_or(|n| index.receiver_in(s, n)))
            }
            Recognizer::DeniedCallWithArgument {
                object,
                method,
                argument,
            } => {
                let names = index.names_for(object);
                index.members().find(|s| {
                    s.name == *method
                        && index.receiver_in(s, &names)
                        && s
                        .call
                        .as_ref()
                            .is_some_and(|c| c.literal_argument.as_ref() == Some(argument))
                })
            }
            Recognizer::MaxSourceLength { .. } => None,
        };
        hit.map(|s| Some(s.span))
    }
}

/// Outcome of scanning one source unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyVerdict {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violated_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Byte span of the offending construct, when there is one.
    #[serde(skip)]
    pub span: Option<Span>,
}

impl PolicyVerdict {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            violated_rule: None,
            message: None,
            span: None,
        }
    }

    fn violation(rule: &Rule, span: Option<Span>) -> Self {
        Self {
            allowed: false,
            violated_rule: Some(rule.id.clone()),
            message: Some(rule.message.clone()),
            span,
        }
    }
}

/// Errors loading a policy from configuration.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid policy JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate rule id '{0}'")]
    DuplicateId(String),
}

/// An ordered rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub rules: Vec<Rule>,
}

impl Default for Policy {
    fn default() -> Self {
        Self::new(default_rules(DEFAULT_MAX_SOURCE_LENGTH))
    }
}

impl Policy {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Load `{ "rules": [{ "id", "recognizer": { "kind", ... }, "message" }] }`.
    pub fn from_json(text: &str) -> Result<Self, PolicyError> {
        let policy: Policy = serde_json::from_str(text)?;
        policy.validate()?;
        Ok(policy)
    }

    fn validate(&self) -> Result<(), PolicyError> {
        let mut seen = std::collections::HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(PolicyError::DuplicateId(rule.id.clone()));
            }
        }
        Ok(())
    }

    /// Screen `source`. The first rule in policy order with a matching site wins.
    #[tracing::instrument(level = "debug", skip_all, fields(source_len = source.len(), rules = self.rules.len()))]
    pub fn scan(&self, source: &str) -> PolicyVerdict {
        // Extracted on first use, so an over-long source is rejected before it is lexed.
        let mut index: Option<Option<SiteIndex>> = None;
        for rule in &self.rules {
            let sites = match &rule.recognizer {
                Recognizer::MaxSourceLength { .. } => None,
                _ => index
                    .get_or_insert_with(|| {
                        let extracted = sites::extract(source);
                        if extracted.is_none() {
                            tracing::debug!("source does not lex; deferring to the compile step");
                        }
                        extracted
                    })
                    .as_ref(),
            };
            if let Some(span) = rule.find(source, sites) {
                tracing::debug!(rule = %rule.id, "policy violation");
                return PolicyVerdict::violation(rule, span);
            }
        }
        PolicyVerdict::allowed()
    }
}

/// Policy section of the engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PolicyConfig {
    /// Replaces the default denylist when present.
    pub rules: Option<Vec<Rule>>,
    pub max_source_length: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            rules: None,
            max_source_length: DEFAULT_MAX_SOURCE_LENGTH,
        }
    }
}

impl PolicyConfig {
    /// The effective policy: the length limit first, then the configured or default rules.
    pub fn build(&self) -> Result<Policy, PolicyError> {
        let policy = match &self.rules {
            None => Policy::new(default_rules(self.max_source_length)),
            Some(rules) => {
                let mut all = vec![defaults::length_rule(self.max_source_length)];
                all.extend(rules.iter().cloned());
                Policy::new(all)
            }
        };
        policy.validate()?;
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violated(source: &str) -> Option<String> {
        Policy::default().scan(source).violated_rule
    }

    #[test]
    fn test_clean_source_is_allowed() {
        let verdict = Policy::default().scan("exports.add = (a, b) => a + b");
        assert!(verdict.allowed);
        assert_eq!(verdict.message, None);
    }

    #[test]
    fn test_first_rule_in_policy_order_wins() {
        // Both the eval and the cookie rule match; eval comes first.
        assert_eq!(violated("document.cookie; eval('1')").as_deref(), Some("eval"));
    }

    #[test]
    fn test_aliasing_is_caught() {
        assert_eq!(violated("const run = eval").as_deref(), Some("eval"));
        assert_eq!(violated("const F = Function").as_deref(), Some("function-constructor"));
    }

    #[test]
    fn test_constructor_escape() {
        assert_eq!(violated("[].map.constructor('return 1')()").as_deref(), Some("constructor-escape"));
        assert_eq!(violated("x['constructor']").as_deref(), Some("constructor-escape"));
        assert_eq!(violated("class A { constructor() {} }"), None);
    }

    #[test]
    fn test_inner_declarations_do_not_shadow_globals() {
        assert_eq!(violated("function f() { var fetch = 0 } fetch('/api')").as_deref(), Some("fetch"));
        assert_eq!(violated("function g() { let top = 1 } top.location = 'x'").as_deref(), Some("top"));
        assert_eq!(violated("const top = 1; top + 1"), None);
    }

    #[test]
    fn test_indirect_receivers_are_caught() {
        assert_eq!(violated("(window).top.location = 'x'").as_deref(), Some("window-top"));
        assert_eq!(violated("const c = (document).cookie").as_deref(), Some("document-cookie"));
        assert_eq!(violated("const w = window; w.frameElement").as_deref(), Some("window-frame-element"));
        assert_eq!(violated("const { cookie } = document").as_deref(), Some("document-cookie"));
        assert_eq!(violated("const d = document; d.getElementById('root')").as_deref(), Some("document-root-element"));
    }

    #[test]
    fn test_root_lookup_needs_literal_argument() {
        assert_eq!(violated("document.getElementById('root')").as_deref(), Some("document-root-element"));
        assert_eq!(violated("document.getElementById('app')"), None);
    }

    #[test]
    fn test_strings_and_comments_do_not_trigger() {
        assert_eq!(violated("// fetch(url)\nconst msg = 'do not eval() here'"), None);
    }

    #[test]
    fn test_source_length_limit() {
        let policy = PolicyConfig {
            rules: Some(Vec::new()),
            max_source_length: 10,
        }
        .build()
        .expect("valid policy");
        assert!(policy.scan("1234567890").allowed);
        let verdict = policy.scan("12345678901");
        assert_eq!(verdict.violated_rule.as_deref(), Some("max-source-length"));
        assert_eq!(verdict.message.as_deref(), Some("Code is too long"));
        assert_eq!(verdict.span, None);
    }

    #[test]
    fn test_policy_from_json() {
        let policy = Policy::from_json(
            r#"{ "rules": [
                { "id": "no-alert", "recognizer": { "kind": "deniedCall", "name": "alert" }, "message": "alert() is not allowed" },
                { "id": "no-location", "recognizer": { "kind": "deniedMember", "object": "window", "property": "location" }, "message": "no navigation" }
            ] }"#,
        )
        .expect("policy should load");
        let verdict = policy.scan("function f() { alert('hi') }");
        assert_eq!(verdict.violated_rule.as_deref(), Some("no-alert"));
        assert!(policy.scan("const location = 1").allowed);
        assert!(!policy.scan("window.location = 'x'").allowed);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let err = Policy::from_json(
            r#"{ "rules": [
                { "id": "a", "recognizer": { "kind": "deniedGlobal", "name": "x" }, "message": "m" },
                { "id": "a", "recognizer": { "kind": "deniedGlobal", "name": "y" }, "message": "m" }
            ] }"#,
        );
        assert!(matches!(err, Err(PolicyError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn test_violation_span_points_at_site() {
        let source = "const ok = 1;\nconst c = document.cookie;";
        let verdict = Policy::default().scan(source);
        let span = verdict.span.expect("member span");
        assert_eq!(&source[span.start..span.end], "document.cookie");
    }

    #[test]
    fn test_unlexable_source_is_allowed() {
        assert!(Policy::default().scan("const s = 'open").allowed);
    }
}
