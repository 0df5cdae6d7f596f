//! Layering guardrails to keep the verdict core free of IO and async machinery.
//!
//! `crosscheck_core` holds the data model and the comparison policy. It must stay testable without
//! a runtime, so this test scans its `Cargo.toml` and fails if an async runtime or process crate
//! appears in `[dependencies]`.

const FORBIDDEN: &[&str] = &["tokio", "tempfile", "crosscheck"];

#[test]
fn core_does_not_depend_on_runtime_crates() {
    let manifest = include_str!("../crates/crosscheck_core/Cargo.toml");
    let mut in_dependencies = false;

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit the `[dependencies]` table.
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }

        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Strip inline comments for robustness.
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        let name = line_no_comment.split(['=', ' ', '.']).next().unwrap_or("");
        if FORBIDDEN.contains(&name) {
            panic!("`{name}` must not appear in crosscheck_core [dependencies]; keep IO in the crosscheck crate");
        }
    }
}

#[test]
fn core_sources_do_not_spawn_processes() {
    let sources = [
        include_str!("../crates/crosscheck_core/src/lib.rs"),
        include_str!("../crates/crosscheck_core/src/model.rs"),
        include_str!("../crates/crosscheck_core/src/verdict.rs"),
    ];
    for source in sources {
        assert!(!source.contains("std::process::Command"));
        assert!(!source.contains("std::fs"));
    }
}
