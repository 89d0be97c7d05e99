//! The default denylist.

use super::{Recognizer, Rule};

pub const DEFAULT_MAX_SOURCE_LENGTH: usize = 100_000;

fn global(id: &str, name: &str, message: &str) -> Rule {
    Rule::new(id, Recognizer::DeniedGlobal { name: name.into() }, message)
}

fn call(id: &str, name: &str, message: &str) -> Rule {
    Rule::new(id, Recognizer::DeniedCall { name: name.into() }, message)
}

fn member(id: &str, object: Option<&str>, property: &str, message: &str) -> Rule {
    Rule::new(
        id,
        Recognizer::DeniedMember {
            object: object.map(Into::into),
            property: property.into(),
        },
        message,
    )
}

pub(super) fn length_rule(limit: usize) -> Rule {
    Rule::new("max-source-length", Recognizer::MaxSourceLength { limit }, "Code is too long")
}

/// Every default rule, in policy order.
pub fn default_rules(max_source_length: usize) -> Vec<Rule> {
    const DOCUMENT_ROOT: &str = "Direct access to document.body, document.head, or document.documentElement is not \
                                 allowed. Use the provided render function instead.";
    const WINDOW_FRAMES: &str = "Access to window.parent, window.top, or window.frameElement is not allowed";
    const SELF_FRAMES: &str = "Access to self.parent or self.top is not allowed";

    vec![
        length_rule(max_source_length),
        // Dynamic evaluation
        global("eval", "eval", "eval() is not allowed"),
        call("eval-call", "eval", "eval() is not allowed"),
        global("function-constructor", "Function", "Function constructor is not allowed"),
        member("constructor-escape", None, "constructor", "Access to .constructor is not allowed"),
        member("proto-escape", None, "__proto__", "Access to __proto__ is not allowed"),
        global("global-this", "globalThis", "globalThis is not allowed"),
        // Timers
        global("set-timeout", "setTimeout", "setTimeout() is not allowed"),
        global("set-interval", "setInterval", "setInterval() is not allowed"),
        // Storage
        member("document-cookie", Some("document"), "cookie", "document.cookie is not allowed"),
        global("local-storage", "localStorage", "localStorage is not allowed"),
        global("session-storage", "sessionStorage", "sessionStorage is not allowed"),
        global("indexed-db", "indexedDB", "indexedDB is not allowed"),
        // Network
        global("xml-http-request", "XMLHttpRequest", "XMLHttpRequest is not allowed"),
        global("fetch", "fetch", "fetch() is not allowed"),
        global("web-socket", "WebSocket", "WebSocket is not allowed"),
        global("import-scripts", "importScripts", "importScripts() is not allowed"),
        // Host document
        member("document-body", Some("document"), "body", DOCUMENT_ROOT),
        member("document-head", Some("document"), "head", DOCUMENT_ROOT),
        member("document-element", Some("document"), "documentElement", DOCUMENT_ROOT),
        Rule::new(
            "document-root-element",
            Recognizer::DeniedCallWithArgument {
                object: "document".into(),
                method: "getElementById".into(),
                argument: "root".into(),
            },
            "Access to document.getElementById('root') is not allowed. Use the container provided to your render \
             function instead.",
        ),
        // Frames
        member("window-parent", Some("window"), "parent", WINDOW_FRAMES),
        member("window-top", Some("window"), "top", WINDOW_FRAMES),
        member("window-frame-element", Some("window"), "frameElement", WINDOW_FRAMES),
        member("self-parent", Some("self"), "parent", SELF_FRAMES),
        member("self-top", Some("self"), "top", SELF_FRAMES),
        global("frames", "frames", "Access to frames array is not allowed"),
        global("parent", "parent", "Access to parent window is not allowed"),
        global("top", "top", "Access to top window is not allowed"),
        // Messaging
        call("post-message", "postMessage", "postMessage() is not allowed"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;

    #[test]
    fn test_rule_ids_are_unique() {
        let rules = default_rules(DEFAULT_MAX_SOURCE_LENGTH);
        let mut ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), rules.len());
    }

    #[test]
    fn test_every_denylisted_operation_is_caught() {
        let cases = [
            ("eval('1 + 1')", "eval"),
            ("window.eval('x')", "eval-call"),
            ("new Function('return 1')", "function-constructor"),
            ("setTimeout(() => {}, 0)", "set-timeout"),
            ("setInterval(tick, 10)", "set-interval"),
            ("const c = document.cookie", "document-cookie"),
            ("localStorage.setItem('k', 'v')", "local-storage"),
            ("sessionStorage.setItem('k', 'v')", "session-storage"),
            ("const x = new XMLHttpRequest()", "xml-http-request"),
            ("fetch('/api')", "fetch"),
            ("document.body.appendChild(el)", "document-body"),
            ("document.head", "document-head"),
            ("document.documentElement", "document-element"),
            ("document.getElementById(\"root\")", "document-root-element"),
            ("window.parent.location", "window-parent"),
            ("window.top", "window-top"),
            ("window.frameElement", "window-frame-element"),
            ("self.parent", "self-parent"),
            ("self.top", "self-top"),
            ("frames[0]", "frames"),
            ("parent.postMessage('x', '*')", "parent"),
            ("top.location = 'evil'", "top"),
            ("window.postMessage('x', '*')", "post-message"),
            ("globalThis.x = 1", "global-this"),
            ("obj.__proto__", "proto-escape"),
        ];
        let policy = Policy::default();
        for (source, rule) in cases {
            let verdict = policy.scan(source);
            assert_eq!(verdict.violated_rule.as_deref(), Some(rule), "source: {source}");
        }
    }

    #[test]
    fn test_lesson_code_is_allowed() {
        let policy = Policy::default();
        for source in [
            "function render(element, container) { const el = document.createElement(element.type); container.appendChild(el) }",
            "const parent = el.parentNode; parent.removeChild(el)",
            "element.children.forEach(child => render(child, domElement))",
            "const style = { top: 0 }",
        ] {
            assert!(policy.scan(source).allowed, "source: {source}");
        }
    }
}
