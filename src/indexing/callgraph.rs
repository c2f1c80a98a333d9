//! Call graph queries derived from `SymbolNode.calls` (spec §4.4).
//!
//! The call graph is not materialized as a separate structure; it's derived
//! on demand from the symbol tree already stored in `ProjectIndex`.

use crate::model::{ProjectIndex, SymbolNode};
use std::collections::{HashSet, VecDeque};

pub struct CallGraph<'a> {
    index: &'a ProjectIndex,
}

impl<'a> CallGraph<'a> {
    pub fn new(index: &'a ProjectIndex) -> Self {
        Self { index }
    }

    /// Names `symbol_name` calls directly, across every file.
    pub fn outgoing(&self, symbol_name: &str) -> Vec<String> {
        let mut out = Vec::new();
        for record in self.index.files.values() {
            for symbol in &record.symbols {
                collect_outgoing(symbol, symbol_name, &mut out);
            }
        }
        out.sort();
        out.dedup();
        out
    }

    /// Symbols that call `symbol_name` directly, across every file, returned
    /// as `"path:symbol_name"` style qualified references.
    pub fn incoming(&self, symbol_name: &str) -> Vec<String> {
        let mut out = Vec::new();
        for (path, record) in &self.index.files {
            for symbol in &record.symbols {
                collect_incoming(symbol, symbol_name, path, &mut out);
            }
        }
        out.sort();
        out.dedup();
        out
    }

    /// Breadth-first search for a call path from `from` to `to`, following
    /// outgoing call edges up to `max_depth` hops. Returns the first path
    /// found; ties are broken by call-name insertion order within each
    /// symbol's `calls` list (spec §9 open question).
    pub fn call_chain(&self, from: &str, to: &str, max_depth: u32) -> Option<Vec<String>> {
        if from == to {
            return Some(vec![from.to_string()]);
        }

        let mut queue: VecDeque<Vec<String>> = VecDeque::new();
        queue.push_back(vec![from.to_string()]);
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(from.to_string());

        while let Some(path) = queue.pop_front() {
            if path.len() as u32 > max_depth {
                continue;
            }
            let current = path.last().unwrap();
            for next in self.outgoing(current) {
                if next == to {
                    let mut found = path.clone();
                    found.push(next);
                    return Some(found);
                }
                if visited.insert(next.clone()) {
                    let mut extended = path.clone();
                    extended.push(next);
                    queue.push_back(extended);
                }
            }
        }

        None
    }
}

fn collect_outgoing(symbol: &SymbolNode, target: &str, out: &mut Vec<String>) {
    if symbol.name == target {
        out.extend(symbol.calls.iter().cloned());
    }
    for child in &symbol.children {
        collect_outgoing(child, target, out);
    }
}

fn collect_incoming(symbol: &SymbolNode, target: &str, path: &str, out: &mut Vec<String>) {
    if symbol.calls.iter().any(|c| c == target || c.ends_with(&format!(".{target}"))) {
        out.push(format!("{path}:{}", symbol.name));
    }
    for child in &symbol.children {
        collect_incoming(child, target, path, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileRecord, LanguageTag, Position, SymbolKind};

    fn pos() -> Position {
        Position { line: 1, column: 0, end_line: 1, end_column: 1 }
    }

    fn index_with(symbols: Vec<SymbolNode>) -> ProjectIndex {
        let mut idx = ProjectIndex::new("/repo".to_string(), "2026-01-01T00:00:00Z");
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
                symbols,
                outline: vec![],
                ui_components: vec![],
                api_endpoints: vec![],
            },
        );
        idx
    }

    #[test]
    fn outgoing_and_incoming() {
        let mut a = SymbolNode::new("a", SymbolKind::Function, pos());
        a.push_call("b");
        let b = SymbolNode::new("b", SymbolKind::Function, pos());
        let idx = index_with(vec![a, b]);
        let graph = CallGraph::new(&idx);

        assert_eq!(graph.outgoing("a"), vec!["b".to_string()]);
        assert_eq!(graph.incoming("b"), vec!["a.rs:a".to_string()]);
    }

    #[test]
    fn call_chain_finds_transitive_path() {
        let mut a = SymbolNode::new("a", SymbolKind::Function, pos());
        a.push_call("b");
        let mut b = SymbolNode::new("b", SymbolKind::Function, pos());
        b.push_call("c");
        let c = SymbolNode::new("c", SymbolKind::Function, pos());
        let idx = index_with(vec![a, b, c]);
        let graph = CallGraph::new(&idx);

        let chain = graph.call_chain("a", "c", 5).unwrap();
        assert_eq!(chain, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[test]
    fn call_chain_respects_depth_cap() {
        let mut a = SymbolNode::new("a", SymbolKind::Function, pos());
        a.push_call("b");
        let mut b = SymbolNode::new("b", SymbolKind::Function, pos());
        b.push_call("c");
        let c = SymbolNode::new("c", SymbolKind::Function, pos());
        let idx = index_with(vec![a, b, c]);
        let graph = CallGraph::new(&idx);

        assert!(graph.call_chain("a", "c", 1).is_none());
    }
}
