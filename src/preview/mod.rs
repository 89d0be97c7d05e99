//! Rendering learner framework code into a static, script-free document.
//!
//! The learner code runs in the same kind of sandbox as an evaluation, with the `document` capability and a
//! detached `<div id="root">` as the render container. Whatever the learner's `render` builds under that
//! container is serialized to static HTML and placed in a page whose CSP forbids every script. Nothing the
//! learner wrote executes in the viewer.
//!
//! Failure is always a document: a policy violation, a compile or runtime error, or a timeout renders an
//! escaped diagnostic block instead of learner output.

pub mod document;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::policy::Policy;
use crate::runtime::dom::{self, serialize};
use crate::runtime::intrinsics::json;
use crate::runtime::{Completion, Interpreter, InterruptHandle, Limits, ObjectId, Value};
use crate::sandbox::executor::abrupt_error;
use crate::sandbox::{self, Capabilities, Sandbox, SourceRole};

/// Node of a template-defined fallback tree, built with the learner's own `createElement`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Text(String),
    Element {
        tag: String,
        #[serde(default)]
        props: serde_json::Map<String, serde_json::Value>,
        #[serde(default)]
        children: Vec<TreeNode>,
    },
}

impl TreeNode {
    fn element(tag: &str, props: serde_json::Value, children: Vec<TreeNode>) -> Self {
        TreeNode::Element {
            tag: tag.to_string(),
            props: props.as_object().cloned().unwrap_or_default(),
            children,
        }
    }

    /// The tree shown when the learner exports both `createElement` and `render`.
    pub fn success() -> Self {
        Self::element(
            "div",
            serde_json::json!({ "className": "success" }),
            vec![
                Self::element("h1", serde_json::json!({}), vec![TreeNode::Text("Framework Working!".into())]),
                Self::element(
                    "p",
                    serde_json::json!({}),
                    vec![TreeNode::Text(
                        "Your createElement and render functions are working correctly.".into(),
                    )],
                ),
            ],
        )
    }
}

/// How a lesson wants its preview built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewTemplate {
    /// Instructor code run before the learner code.
    pub prelude: Option<String>,
    /// Name of the export (or top-level learner binding) to render.
    pub entry: Option<String>,
    /// Rendered when there is no usable entry but the learner exports `createElement` and `render`.
    pub default_tree: TreeNode,
}

impl Default for PreviewTemplate {
    fn default() -> Self {
        Self {
            prelude: None,
            entry: None,
            default_tree: TreeNode::success(),
        }
    }
}

impl PreviewTemplate {
    pub fn with_prelude(mut self, prelude: impl Into<String>) -> Self {
        self.prelude = Some(prelude.into());
        self
    }

    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewStatus {
    /// Learner output was rendered.
    Rendered,
    /// The code ran but offers nothing to render.
    Note,
    /// Rejected by the policy; nothing ran.
    Rejected,
    Error,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IsolatedDocument {
    pub html: String,
    pub status: PreviewStatus,
}

impl IsolatedDocument {
    fn from_error(err: &EngineError) -> Self {
        let (label, status) = match err {
            EngineError::Policy { .. } => ("Code validation failed", PreviewStatus::Rejected),
            EngineError::Timeout => ("Timeout", PreviewStatus::Timeout),
            _ => ("Error", PreviewStatus::Error),
        };
        let detail = match err {
            EngineError::Policy { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            html: document::page(&document::diagnostic(label, &detail)),
            status,
        }
    }
}

/// Scan, run and render `learner` under `template`. Never fails: every failure is a diagnostic document.
#[tracing::instrument(level = "debug", skip_all, fields(learner_len = learner.len()))]
pub async fn render_preview(
    learner: &str,
    template: &PreviewTemplate,
    policy: &Policy,
    config: &EngineConfig,
) -> IsolatedDocument {
    let units = template
        .prelude
        .as_deref()
        .map(|p| (SourceRole::Prelude, p))
        .into_iter()
        .chain([(SourceRole::Learner, learner)]);
    for (role, source) in units {
        let verdict = policy.scan(source);
        if !verdict.allowed {
            tracing::info!(role = role.label(), rule = ?verdict.violated_rule, "preview rejected by policy");
            return IsolatedDocument::from_error(&EngineError::Policy {
                rule: verdict.violated_rule.unwrap_or_default(),
                message: verdict.message.unwrap_or_default(),
            });
        }
    }

    let interrupt = InterruptHandle::new();
    let limits = config.limits(std::time::Instant::now(), config.timeout());
    let learner = learner.to_string();
    let template = template.clone();
    let worker_interrupt = interrupt.clone();
    let result = sandbox::run_bounded(
        move || render_in_sandbox(&learner, &template, limits, worker_interrupt),
        config.timeout(),
        config.sandbox_stack_size,
        interrupt,
    )
    .await
    .and_then(|inner| inner);

    match result {
        Ok((fragment, status)) => IsolatedDocument {
            html: document::page(&fragment),
            status,
        },
        Err(err) => {
            tracing::debug!(error = %err, "preview failed");
            IsolatedDocument::from_error(&err)
        }
    }
}

/// Run the template and learner code on the current thread; returns the `#root` fragment.
fn render_in_sandbox(
    learner: &str,
    template: &PreviewTemplate,
    limits: Limits,
    interrupt: InterruptHandle,
) -> Result<(String, PreviewStatus), EngineError> {
    let prelude = template
        .prelude
        .as_deref()
        .map(|p| sandbox::compile(SourceRole::Prelude, p))
        .transpose()?;
    let program = sandbox::compile(SourceRole::Learner, learner)?;

    let mut unit = Sandbox::new(Capabilities::with_document(), limits, interrupt)?;
    let root = {
        let it = unit.interpreter();
        let root = dom::new_element(it, "div").map_err(|a| abrupt_error(it, a))?;
        if let Some(element) = dom::element_mut(it, root) {
            element.set_attr("id", "root".into());
        }
        root
    };
    if let Some(document) = unit.document() {
        document.set_root(root);
    }

    let capture: Vec<String> = template.entry.iter().cloned().collect();
    let exports = unit.run_learner(prelude.as_ref(), &program, &capture)?;

    let it = unit.interpreter();
    let status = render_entry(it, &exports, root, template).map_err(|a| abrupt_error(it, a))?;
    let fragment = match status {
        PreviewStatus::Note => document::note(),
        _ => serialize::inner_html(it, root),
    };
    Ok((fragment, status))
}

fn render_entry(
    it: &mut Interpreter,
    exports: &Value,
    root: ObjectId,
    template: &PreviewTemplate,
) -> Completion<PreviewStatus> {
    let Value::Object(exports) = exports else {
        return Ok(PreviewStatus::Note);
    };
    let render = it.get_property(*exports, "render")?;

    if let Some(entry) = &template.entry {
        let value = it.get_property(*exports, entry)?;
        if it.is_callable(&render) && !value.is_nullish() {
            it.call(&render, Value::Undefined, &[value, Value::Object(root)])?;
            return Ok(PreviewStatus::Rendered);
        }
        if value.as_object().is_some_and(|id| dom::is_node(it, id)) {
            let append = it.get_property(root, "appendChild")?;
            it.call(&append, Value::Object(root), &[value])?;
            return Ok(PreviewStatus::Rendered);
        }
    }

    let create = it.get_property(*exports, "createElement")?;
    if it.is_callable(&create) && it.is_callable(&render) {
        let tree = build_tree(it, &create, &template.default_tree)?;
        it.call(&render, Value::Undefined, &[tree, Value::Object(root)])?;
        return Ok(PreviewStatus::Rendered);
    }
    Ok(PreviewStatus::Note)
}

/// Build `node` with the learner's `createElement(tag, props, ...children)`.
fn build_tree(it: &mut Interpreter, create: &Value, node: &TreeNode) -> Completion<Value> {
    match node {
        TreeNode::Text(text) => Ok(Value::from(text.as_str())),
        TreeNode::Element { tag, props, children } => {
            let mut args = vec![
                Value::from(tag.as_str()),
                json::from_serde(it, &serde_json::Value::Object(props.clone()))?,
            ];
            for child in children {
                let built = it.nested(|it| build_tree(it, create, child))?;
                args.push(built);
            }
            it.call(create, Value::Undefined, &args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAMEWORK: &str = r#"
        function createElement(type, props, ...children) {
            return { type, props: props || {}, children };
        }
        function render(element, container) {
            if (typeof element === 'string') {
                container.appendChild(document.createTextNode(element));
                return;
            }
            const el = document.createElement(element.type);
            for (const [key, value] of Object.entries(element.props)) {
                if (key === 'className') el.className = value;
                else if (key.startsWith('on')) el[key.toLowerCase()] = value;
                else el.setAttribute(key, value);
            }
            element.children.forEach(child => render(child, el));
            container.appendChild(el);
        }
        exports.createElement = createElement;
        exports.render = render;
    "#;

    fn preview(learner: &str, template: &PreviewTemplate) -> IsolatedDocument {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        runtime.block_on(render_preview(learner, template, &Policy::default(), &EngineConfig::default()))
    }

    #[test]
    fn test_default_success_tree() {
        let doc = preview(FRAMEWORK, &PreviewTemplate::default());
        assert_eq!(doc.status, PreviewStatus::Rendered);
        assert!(doc.html.contains(
            "<div id=\"root\"><div class=\"success\"><h1>Framework Working!</h1><p>Your createElement and render \
             functions are working correctly.</p></div></div>"
        ));
    }

    #[test]
    fn test_note_without_framework() {
        let doc = preview("exports.x = 1", &PreviewTemplate::default());
        assert_eq!(doc.status, PreviewStatus::Note);
        assert!(doc.html.contains(document::NOTE));
    }

    #[test]
    fn test_entry_binding_with_handlers_dropped() {
        let learner = format!(
            "{FRAMEWORK}\nconst app = createElement('button', {{ onClick: () => 1, id: 'go' }}, 'Go <now>')"
        );
        let doc = preview(&learner, &PreviewTemplate::default().with_entry("app"));
        assert_eq!(doc.status, PreviewStatus::Rendered);
        assert!(doc.html.contains("<button id=\"go\">Go &lt;now&gt;</button>"), "{}", doc.html);
        assert!(!doc.html.contains("onclick"));
    }

    #[test]
    fn test_policy_violation_fails_closed() {
        let doc = preview("document.body.innerHTML = '<b>x</b>'", &PreviewTemplate::default());
        assert_eq!(doc.status, PreviewStatus::Rejected);
        assert!(doc.html.contains("Code validation failed:"));
        assert!(!doc.html.contains("<b>x</b>"));
    }

    #[test]
    fn test_runtime_error_is_escaped() {
        let doc = preview("throw new Error('<script>alert(1)</script>')", &PreviewTemplate::default());
        assert_eq!(doc.status, PreviewStatus::Error);
        assert!(doc.html.contains("&lt;script&gt;alert(1)&lt;&#x2F;script&gt;"));
        assert!(!doc.html.contains("<script>"));
    }

    #[test]
    fn test_slow_preview_times_out() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        let config = EngineConfig::default().with_timeout_ms(50);
        let doc = runtime.block_on(render_preview(
            "while (true) {}",
            &PreviewTemplate::default(),
            &Policy::default(),
            &config,
        ));
        assert_eq!(doc.status, PreviewStatus::Timeout);
    }
}
