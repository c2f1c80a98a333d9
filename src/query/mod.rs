//! Structural query operations over a built index (spec §4.4).

use crate::error::{IndexError, IndexResult};
use crate::model::{ProjectIndex, SymbolNode};
use std::collections::{HashMap, VecDeque};

pub struct QueryEngine<'a> {
    index: &'a ProjectIndex,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SearchHit {
    pub path: String,
    pub name: String,
    pub kind: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ImpactedFile {
    pub path: String,
    pub depth: u32,
    pub severity: Severity,
    pub is_test: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SuggestHit {
    pub path: String,
    pub name: String,
    pub score: u32,
    pub confidence: f32,
}

impl<'a> QueryEngine<'a> {
    pub fn new(index: &'a ProjectIndex) -> Self {
        Self { index }
    }

    /// Substring (or, with `exact`, exact-match) case-insensitive search over
    /// every symbol name.
    pub fn search(&self, query: &str, exact: bool) -> Vec<SearchHit> {
        let needle = query.to_lowercase();
        let mut hits = Vec::new();

        for (path, record) in &self.index.files {
            walk_symbols(&record.symbols, &mut |sym| {
                let haystack = sym.name.to_lowercase();
                let matched = if exact { haystack == needle } else { haystack.contains(&needle) };
                if matched {
                    hits.push(SearchHit {
                        path: path.clone(),
                        name: sym.name.clone(),
                        kind: format!("{:?}", sym.kind),
                        line: sym.position.line,
                    });
                }
            });
        }

        hits
    }

    /// Forward and reverse dependency edges for `path`.
    pub fn dependencies(&self, path: &str, reverse: bool) -> IndexResult<Vec<String>> {
        let entry = self
            .index
            .dependency_graph
            .get(path)
            .ok_or_else(|| IndexError::PathNotInGraph { path: path.to_string() })?;

        Ok(if reverse {
            entry.imported_by.clone()
        } else {
            entry.imports.clone()
        })
    }

    /// Files with no incoming and no outgoing dependency edges.
    pub fn orphans(&self) -> Vec<String> {
        self.index
            .dependency_graph
            .iter()
            .filter(|(_, entry)| entry.imports.is_empty() && entry.imported_by.is_empty())
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// BFS over reverse dependency edges from `path`, bucketing every
    /// reached file (including `path` itself, at depth 0) by hop depth into
    /// a severity band. A file reachable via more than one path keeps the
    /// shallower depth (spec §4.4). Test-shaped files whose base name
    /// matches `path` are surfaced even when the dependency graph doesn't
    /// reach them.
    pub fn impact(&self, path: &str, max_depth: u32) -> IndexResult<Vec<ImpactedFile>> {
        if !self.index.dependency_graph.contains_key(path) {
            return Err(IndexError::PathNotInGraph { path: path.to_string() });
        }

        let mut depth_of: HashMap<String, u32> = HashMap::new();
        depth_of.insert(path.to_string(), 0);
        let mut queue: VecDeque<(String, u32)> = VecDeque::new();
        queue.push_back((path.to_string(), 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            if let Some(entry) = self.index.dependency_graph.get(&current) {
                for dependent in &entry.imported_by {
                    let next_depth = depth + 1;
                    let better = depth_of.get(dependent).map(|d| next_depth < *d).unwrap_or(true);
                    if better {
                        depth_of.insert(dependent.clone(), next_depth);
                        queue.push_back((dependent.clone(), next_depth));
                    }
                }
            }
        }

        let stem = target_stem(path);
        for candidate in self.index.files.keys() {
            if !depth_of.contains_key(candidate) && is_related_test_file(&stem, candidate) {
                depth_of.insert(candidate.clone(), max_depth.saturating_add(1));
            }
        }

        let mut impacted: Vec<ImpactedFile> = depth_of
            .into_iter()
            .map(|(file, depth)| ImpactedFile {
                severity: severity_for_depth(depth),
                is_test: is_test_path(&file),
                path: file,
                depth,
            })
            .collect();

        impacted.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.path.cmp(&b.path)));
        Ok(impacted)
    }

    /// Functions/methods never referenced by any `calls` list in the index.
    /// Names prefixed with `_` are excluded unless `include_private`.
    pub fn dead_code(&self, include_private: bool) -> Vec<SearchHit> {
        let mut called: std::collections::HashSet<String> = std::collections::HashSet::new();
        for record in self.index.files.values() {
            walk_symbols(&record.symbols, &mut |sym| {
                for call in &sym.calls {
                    called.insert(call.clone());
                    if let Some((_, method)) = call.rsplit_once('.') {
                        called.insert(method.to_string());
                    }
                }
            });
        }

        let mut dead = Vec::new();
        for (path, record) in &self.index.files {
            walk_symbols(&record.symbols, &mut |sym| {
                let is_callable = matches!(sym.kind, crate::model::SymbolKind::Function | crate::model::SymbolKind::Method);
                if !is_callable {
                    return;
                }
                if sym.name.starts_with('_') && !include_private {
                    return;
                }
                if sym.name == "main" {
                    return;
                }
                if !called.contains(&sym.name) {
                    dead.push(SearchHit {
                        path: path.clone(),
                        name: sym.name.clone(),
                        kind: format!("{:?}", sym.kind),
                        line: sym.position.line,
                    });
                }
            });
        }

        dead
    }

    /// Fuzzy "what might I want" search combining substring match and
    /// component-word overlap scoring (spec §4.4 `suggest`). Returns the
    /// top 3 as primary suggestions; callers may further slice `related`
    /// from the remainder.
    pub fn suggest(&self, context: &str) -> Vec<SuggestHit> {
        let needle = context.to_lowercase();
        let needle_words: Vec<&str> = needle.split_whitespace().collect();
        let mut scored = Vec::new();

        for (path, record) in &self.index.files {
            walk_symbols(&record.symbols, &mut |sym| {
                let name_lower = sym.name.to_lowercase();
                let mut score: u32 = 0;

                if name_lower.contains(&needle) {
                    score += 100;
                }

                for word in &needle_words {
                    if word.len() > 1 && name_lower.contains(word) {
                        score += 50;
                    }
                }

                for keyword in CATEGORY_KEYWORDS {
                    if needle.contains(keyword) && name_lower.contains(keyword) {
                        score += 25;
                    }
                }

                if score > 0 {
                    scored.push(SuggestHit {
                        path: path.clone(),
                        name: sym.name.clone(),
                        score,
                        confidence: (score as f32 / 100.0).min(1.0),
                    });
                }
            });
        }

        scored.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        scored
    }
}

const CATEGORY_KEYWORDS: &[&str] = &[
    "auth", "config", "handler", "controller", "service", "model", "test", "util", "client", "server",
];

fn severity_for_depth(depth: u32) -> Severity {
    match depth {
        0 | 1 => Severity::High,
        2 => Severity::Medium,
        _ => Severity::Low,
    }
}

fn is_test_path(path: &str) -> bool {
    path.contains("/test/") || path.contains("/tests/") || path.starts_with("test/") || path.starts_with("tests/")
        || path.contains(".test.") || path.contains(".spec.")
}

/// File stem (no directory, no extension) used to match a target against
/// its own test variants (e.g. `src/widget.rs` -> `widget`).
fn target_stem(path: &str) -> String {
    std::path::Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

fn is_related_test_file(stem: &str, candidate: &str) -> bool {
    is_test_path(candidate) && candidate.to_lowercase().contains(&stem.to_lowercase())
}

fn walk_symbols<F: FnMut(&SymbolNode)>(symbols: &[SymbolNode], f: &mut F) {
    for symbol in symbols {
        f(symbol);
        walk_symbols(&symbol.children, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DependencyEntry, FileRecord, LanguageTag, Position, SymbolKind};

    fn pos() -> Position {
        Position { line: 1, column: 0, end_line: 1, end_column: 1 }
    }

    fn sample_index() -> ProjectIndex {
        let mut idx = ProjectIndex::new("/repo".to_string(), "2026-01-01T00:00:00Z");

        let mut caller = SymbolNode::new("handle_request", SymbolKind::Function, pos());
        caller.push_call("validate");
        let callee = SymbolNode::new("validate", SymbolKind::Function, pos());
        let unused = SymbolNode::new("orphaned_helper", SymbolKind::Function, pos());

        idx.files.insert(
            "a.rs".to_string(),
            FileRecord {
                path: "a.rs".to_string(),
                language: LanguageTag::Rust,
                size_bytes: 0,
                content_hash: "x".to_string(),
                last_indexed_at: "2026-01-01T00:00:00Z".to_string(),
                imports: vec![],
                exports: vec![],
                symbols: vec![caller, callee, unused],
                outline: vec![],
                ui_components: vec![],
                api_endpoints: vec![],
            },
        );

        idx.dependency_graph.insert(
            "a.rs".to_string(),
            DependencyEntry {
                imports: vec![],
                imported_by: vec!["b.rs".to_string()],
            },
        );
        idx.dependency_graph.insert(
            "b.rs".to_string(),
            DependencyEntry {
                imports: vec!["a.rs".to_string()],
                imported_by: vec![],
            },
        );

        idx
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let idx = sample_index();
        let engine = QueryEngine::new(&idx);
        let hits = engine.search("VALIDATE", false);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "validate");
    }

    #[test]
    fn dead_code_excludes_called_and_main() {
        let idx = sample_index();
        let engine = QueryEngine::new(&idx);
        let dead = engine.dead_code(false);
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].name, "orphaned_helper");
    }

    #[test]
    fn impact_bfs_assigns_depth_and_severity() {
        let idx = sample_index();
        let engine = QueryEngine::new(&idx);
        let impacted = engine.impact("a.rs", 5).unwrap();
        assert_eq!(impacted.len(), 2);
        assert_eq!(impacted[0].path, "a.rs");
        assert_eq!(impacted[0].depth, 0);
        assert_eq!(impacted[1].path, "b.rs");
        assert_eq!(impacted[1].depth, 1);
        assert_eq!(impacted[1].severity, Severity::High);
    }

    /// Scenario C (spec §8): chain x -> y -> z -> w. At depth=2, w sits
    /// beyond the cap and is absent; at depth=3 it's reachable and falls to
    /// Low severity, not Medium.
    #[test]
    fn impact_bucket_boundaries_match_chain_scenario() {
        let mut idx = ProjectIndex::new("/repo".to_string(), "2026-01-01T00:00:00Z");
        for name in ["x.rs", "y.rs", "z.rs", "w.rs"] {
            idx.files.insert(
                name.to_string(),
                FileRecord {
                    path: name.to_string(),
                    language: LanguageTag::Rust,
                    size_bytes: 0,
                    content_hash: "x".to_string(),
                    last_indexed_at: "2026-01-01T00:00:00Z".to_string(),
                    imports: vec![],
                    exports: vec![],
                    symbols: vec![],
                    outline: vec![],
                    ui_components: vec![],
                    api_endpoints: vec![],
                },
            );
        }
        idx.dependency_graph.insert("x.rs".to_string(), DependencyEntry { imports: vec![], imported_by: vec!["y.rs".to_string()] });
        idx.dependency_graph.insert("y.rs".to_string(), DependencyEntry { imports: vec!["x.rs".to_string()], imported_by: vec!["z.rs".to_string()] });
        idx.dependency_graph.insert("z.rs".to_string(), DependencyEntry { imports: vec!["y.rs".to_string()], imported_by: vec!["w.rs".to_string()] });
        idx.dependency_graph.insert("w.rs".to_string(), DependencyEntry { imports: vec!["z.rs".to_string()], imported_by: vec![] });

        let engine = QueryEngine::new(&idx);

        let at_2 = engine.impact("x.rs", 2).unwrap();
        assert!(!at_2.iter().any(|f| f.path == "w.rs"));
        let y = at_2.iter().find(|f| f.path == "y.rs").unwrap();
        assert_eq!(y.severity, Severity::High);
        let z = at_2.iter().find(|f| f.path == "z.rs").unwrap();
        assert_eq!(z.severity, Severity::Medium);

        let at_3 = engine.impact("x.rs", 3).unwrap();
        let w = at_3.iter().find(|f| f.path == "w.rs").unwrap();
        assert_eq!(w.severity, Severity::Low);
    }

    #[test]
    fn impact_surfaces_unreached_test_file_matching_target_stem() {
        let mut idx = sample_index();
        idx.files.insert(
            "a.test.rs".to_string(),
            FileRecord {
                path: "a.test.rs".to_string(),
                language: LanguageTag::Rust,
                size_bytes: 0,
                content_hash: "y".to_string(),
                last_indexed_at: "2026-01-01T00:00:00Z".to_string(),
                imports: vec![],
                exports: vec![],
                symbols: vec![],
                outline: vec![],
                ui_components: vec![],
                api_endpoints: vec![],
            },
        );

        let engine = QueryEngine::new(&idx);
        let impacted = engine.impact("a.rs", 1).unwrap();
        let test_file = impacted.iter().find(|f| f.path == "a.test.rs");
        assert!(test_file.is_some());
        assert!(test_file.unwrap().is_test);
    }

    #[test]
    fn missing_path_is_path_not_in_graph() {
        let idx = sample_index();
        let engine = QueryEngine::new(&idx);
        assert!(matches!(engine.impact("missing.rs", 3), Err(IndexError::PathNotInGraph { .. })));
    }

    #[test]
    fn suggest_ranks_substring_match_first() {
        let idx = sample_index();
        let engine = QueryEngine::new(&idx);
        let hits = engine.suggest("validate");
        assert!(!hits.is_empty());
        assert_eq!(hits[0].name, "validate");
        assert_eq!(hits[0].score, 100);
    }
}
