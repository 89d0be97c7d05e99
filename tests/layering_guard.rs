//! Layering guardrails for the sandboxed runtime.
//!
//! Nothing under `src/runtime/`, nor the harness and matchers that run inside the sandbox, may reach the
//! host: no filesystem, network, process, environment or async runtime. Host access belongs to the CLI and
//! the sandbox boundary. This scans source text, so it is a coarse net, not a proof.

use std::fs;
use std::path::{Path, PathBuf};

const FORBIDDEN: &[&str] = &["std::fs", "std::net", "std::process", "std::env", "tokio::"];

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn collect_rs(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") {
            out.push(path);
        }
    }
}

#[test]
fn sandboxed_code_does_not_touch_the_host() {
    let root = repo_root();
    let mut files = Vec::new();
    collect_rs(&root.join("src/runtime"), &mut files);
    files.push(root.join("src/harness.rs"));
    files.push(root.join("src/matchers.rs"));

    let mut offenders = Vec::new();
    for path in files {
        // Interpreter unit tests spawn a big-stack thread; that is test scaffolding, not runtime code.
        if path.file_name().is_some_and(|n| n == "tests.rs") {
            continue;
        }
        let text = fs::read_to_string(&path).expect("readable source");
        for (idx, line) in text.lines().enumerate() {
            let code = line.split("//").next().unwrap_or("");
            if FORBIDDEN.iter().any(|f| code.contains(f)) {
                offenders.push(format!(
                    "- {}:{}: {}",
                    path.strip_prefix(&root).unwrap_or(&path).display(),
                    idx + 1,
                    line.trim()
                ));
            }
        }
    }
    assert!(offenders.is_empty(), "host access from sandboxed code:\n{}", offenders.join("\n"));
}

#[test]
fn syntax_crate_does_not_depend_on_the_engine() {
    let manifest = include_str!("../crates/proctor_syntax/Cargo.toml");
    let mut in_dependencies = false;

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }
        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }
        let name = line.split(['=', ' ']).next().unwrap_or("");
        assert_ne!(name, "proctor", "proctor_syntax must not depend on the engine crate");
    }
}
