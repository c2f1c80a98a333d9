//! End-to-end scenarios over a small synthetic multi-language project.

use projectindex::config::IndexingConfig;
use projectindex::indexing::callgraph::CallGraph;
use projectindex::indexing::IndexBuilder;
use projectindex::query::QueryEngine;
use std::fs;
use tempfile::TempDir;

fn config() -> IndexingConfig {
    IndexingConfig {
        include_patterns: vec!["**/*".to_string()],
        exclude_patterns: vec!["**/node_modules/**".to_string()],
        max_file_size: 1_000_000,
        languages: vec![],
        parallel: false,
    }
}

fn write(dir: &TempDir, rel: &str, contents: &str) {
    let path = dir.path().join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Scenario A: nested symbols produce dotted qualified keys in the symbol
/// index, and impl-block methods are keyed under the impl label.
#[test]
fn nested_symbols_get_qualified_keys() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "src/widget.rs",
        "pub struct Widget;\n\nimpl Widget {\n    pub fn render(&self) {}\n}\n",
    );

    let builder = IndexBuilder::new(&config());
    let index = builder.build_full(dir.path(), "2026-01-01T00:00:00Z");

    assert!(index.symbol_index.contains_key("Widget"));
    assert!(index.symbol_index.contains_key("impl Widget.render"));
}

/// Scenario B: relative imports resolve to repo-relative paths; external
/// specifiers resolve to themselves and stay out of `imported_by`.
#[test]
fn dependency_resolution_handles_relative_and_external_specifiers() {
    let dir = TempDir::new().unwrap();
    write(&dir, "src/util.ts", "export function helper() {}\n");
    write(
        &dir,
        "src/app.ts",
        "import { helper } from './util';\nimport { z } from 'zod';\n\nexport function run() { helper(); }\n",
    );

    let builder = IndexBuilder::new(&config());
    let index = builder.build_full(dir.path(), "2026-01-01T00:00:00Z");

    let app_deps = &index.dependency_graph["src/app.ts"];
    assert!(app_deps.imports.contains(&"src/util.ts".to_string()));
    assert!(app_deps.imports.contains(&"zod".to_string()));

    let util_deps = &index.dependency_graph["src/util.ts"];
    assert_eq!(util_deps.imported_by, vec!["src/app.ts".to_string()]);
}

/// Scenario C: impact analysis buckets reachable files by BFS depth and
/// assigns severity bands accordingly.
#[test]
fn impact_analysis_buckets_by_depth() {
    let dir = TempDir::new().unwrap();
    write(&dir, "core.ts", "export function base() {}\n");
    write(&dir, "mid.ts", "import { base } from './core';\nexport function useCore() { base(); }\n");
    write(&dir, "edge.ts", "import { useCore } from './mid';\nexport function useMid() { useCore(); }\n");

    let builder = IndexBuilder::new(&config());
    let index = builder.build_full(dir.path(), "2026-01-01T00:00:00Z");
    let engine = QueryEngine::new(&index);

    let impacted = engine.impact("core.ts", 5).unwrap();
    let depth_of = |p: &str| impacted.iter().find(|f| f.path == p).map(|f| f.depth);
    assert_eq!(depth_of("core.ts"), Some(0));
    assert_eq!(depth_of("mid.ts"), Some(1));
    assert_eq!(depth_of("edge.ts"), Some(2));
}

/// Scenario D: call-chain BFS finds a transitive path across functions in
/// the same file.
#[test]
fn call_chain_across_functions() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "chain.rs",
        "fn a() { b(); }\nfn b() { c(); }\nfn c() {}\n",
    );

    let builder = IndexBuilder::new(&config());
    let index = builder.build_full(dir.path(), "2026-01-01T00:00:00Z");
    let graph = CallGraph::new(&index);

    let chain = graph.call_chain("a", "c", 5).unwrap();
    assert_eq!(chain, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
}

/// Scenario F: deleting a file during an incremental update removes its
/// record and every dependency edge that referenced it.
#[test]
fn incremental_update_removes_deleted_file_and_edges() {
    let dir = TempDir::new().unwrap();
    write(&dir, "util.ts", "export function helper() {}\n");
    write(&dir, "main.ts", "import { helper } from './util';\nexport function run() { helper(); }\n");

    let builder = IndexBuilder::new(&config());
    let mut index = builder.build_full(dir.path(), "2026-01-01T00:00:00Z");
    assert!(index.dependency_graph["main.ts"].imports.contains(&"util.ts".to_string()));

    fs::remove_file(dir.path().join("util.ts")).unwrap();
    builder.update(&mut index, dir.path(), &["util.ts".to_string()], "2026-01-02T00:00:00Z");

    assert!(!index.files.contains_key("util.ts"));
    assert!(!index.dependency_graph.contains_key("util.ts"));
    assert!(!index.dependency_graph["main.ts"].imports.contains(&"util.ts".to_string()));
}

/// Universal invariant: every symbol's `calls` list stays sorted and
/// deduplicated end to end, not just at the unit level.
#[test]
fn calls_lists_stay_sorted_and_deduped_after_full_build() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "dup.rs",
        "fn caller() {\n    zeta();\n    alpha();\n    zeta();\n}\nfn zeta() {}\nfn alpha() {}\n",
    );

    let builder = IndexBuilder::new(&config());
    let index = builder.build_full(dir.path(), "2026-01-01T00:00:00Z");
    let caller = index.files["dup.rs"].symbols.iter().find(|s| s.name == "caller").unwrap();
    assert_eq!(caller.calls, vec!["alpha".to_string(), "zeta".to_string()]);
}

/// Rebuilding twice from the same on-disk state is idempotent apart from
/// the timestamp fields.
#[test]
fn build_is_idempotent_given_unchanged_files() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a.py", "def greet():\n    pass\n");

    let builder = IndexBuilder::new(&config());
    let first = builder.build_full(dir.path(), "2026-01-01T00:00:00Z");
    let second = builder.build_full(dir.path(), "2026-01-01T00:00:00Z");

    assert_eq!(first.files.keys().collect::<Vec<_>>(), second.files.keys().collect::<Vec<_>>());
    assert_eq!(first.symbol_index, second.symbol_index);
}
