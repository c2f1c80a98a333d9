//! Index construction and incremental update (spec §4).
//!
//! [`IndexBuilder`] owns the discover -> hash -> parse -> insert pipeline and
//! the two derived structures rebuilt from `ProjectIndex.files` after every
//! build or update: the qualified symbol index and the dependency graph.

pub mod callgraph;

use crate::config::IndexingConfig;
use crate::discovery::FileDiscoverer;
use crate::hashing::content_hash;
use crate::model::{DependencyEntry, FileRecord, ProjectIndex, SymbolNode};
use crate::parsing::{self, LanguageRouter};
use crate::resolver::PathResolver;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub struct IndexBuilder {
    discoverer: FileDiscoverer,
    router: LanguageRouter,
    parallel: bool,
}

impl IndexBuilder {
    pub fn new(config: &IndexingConfig) -> Self {
        Self {
            discoverer: FileDiscoverer::new(config),
            router: LanguageRouter::new(),
            parallel: config.parallel,
        }
    }

    /// Full build: discover every matching file under `project_root`, parse
    /// each, then rebuild the symbol index and dependency graph from
    /// scratch. `now` is an already-formatted RFC 3339 timestamp. Parsing
    /// fans out across a rayon pool when `config.parallel` is set (spec
    /// §4 "large repositories parse files concurrently").
    pub fn build_full(&self, project_root: &Path, now: &str) -> ProjectIndex {
        let mut index = ProjectIndex::new(project_root.display().to_string(), now);
        let files = self.discoverer.discover(project_root);

        let records: Vec<(String, FileRecord)> = self.parse_files(project_root, &files, now);
        for (rel, record) in records {
            index.files.insert(rel, record);
        }

        self.rebuild_derived(&mut index);
        index.updated_at = now.to_string();
        index
    }

    /// Incremental update: re-parse only `paths` (or, if empty, every file
    /// currently on disk), drop records for files that no longer exist, then
    /// rebuild the symbol index and dependency graph from the full
    /// `files` map so that edges touching untouched files stay correct.
    /// `created_at` is preserved; only `updated_at` advances.
    pub fn update(&self, index: &mut ProjectIndex, project_root: &Path, paths: &[String], now: &str) {
        let targets: Vec<String> = if paths.is_empty() {
            self.discoverer.discover(project_root)
        } else {
            paths.to_vec()
        };

        let mut stale: Vec<String> = Vec::new();
        let mut changed: Vec<String> = Vec::new();

        for rel in &targets {
            let absolute = project_root.join(rel);
            if !absolute.is_file() {
                stale.push(rel.clone());
                continue;
            }

            let new_hash = match fs::read(&absolute) {
                Ok(bytes) => content_hash(&bytes),
                Err(_) => {
                    stale.push(rel.clone());
                    continue;
                }
            };

            let unchanged = index
                .files
                .get(rel)
                .map(|existing| existing.content_hash == new_hash)
                .unwrap_or(false);
            if !unchanged {
                changed.push(rel.clone());
            }
        }

        for rel in &stale {
            index.files.remove(rel);
        }

        let records = self.parse_files(project_root, &changed, now);
        for (rel, record) in records {
            index.files.insert(rel, record);
        }

        self.rebuild_derived(index);
        index.updated_at = now.to_string();
    }

    fn parse_files(&self, project_root: &Path, rels: &[String], now: &str) -> Vec<(String, FileRecord)> {
        if self.parallel {
            tracing::debug!(files = rels.len(), threads = num_cpus::get(), "parsing files in parallel");
            rels.par_iter()
                .filter_map(|rel| self.parse_file(project_root, rel, now).map(|record| (rel.clone(), record)))
                .collect()
        } else {
            rels.iter()
                .filter_map(|rel| self.parse_file(project_root, rel, now).map(|record| (rel.clone(), record)))
                .collect()
        }
    }

    fn parse_file(&self, project_root: &Path, rel: &str, now: &str) -> Option<FileRecord> {
        let absolute = project_root.join(rel);
        let bytes = match fs::read(&absolute) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(path = rel, error = %e, "failed to read file, skipping");
                return None;
            }
        };

        let language = parsing::language_for_path(Path::new(rel));
        let source = String::from_utf8_lossy(&bytes);
        let parsed = self.router.parse(language, &source, rel);

        Some(FileRecord {
            path: rel.to_string(),
            language,
            size_bytes: bytes.len() as u64,
            content_hash: content_hash(&bytes),
            last_indexed_at: now.to_string(),
            imports: parsed.imports,
            exports: parsed.exports,
            symbols: parsed.symbols,
            outline: parsed.outline,
            ui_components: parsed.ui_components,
            api_endpoints: parsed.api_endpoints,
        })
    }

    fn rebuild_derived(&self, index: &mut ProjectIndex) {
        rebuild_symbol_index(index);
        rebuild_dependency_graph(index);
    }
}

/// Flatten every file's symbol tree into `qualified_name -> "path:line"`,
/// keyed by dotted ancestor path. Files are visited in `BTreeMap` (sorted
/// path) order, so a later file's symbol of the same qualified name
/// overwrites an earlier one (last-write-wins, spec §4.4).
fn rebuild_symbol_index(index: &mut ProjectIndex) {
    index.symbol_index.clear();
    let files: Vec<(String, Vec<SymbolNode>)> = index
        .files
        .iter()
        .map(|(path, record)| (path.clone(), record.symbols.clone()))
        .collect();

    for (path, symbols) in files {
        for symbol in &symbols {
            insert_symbol(&mut index.symbol_index, &path, symbol, &[]);
        }
    }
}

fn insert_symbol(
    out: &mut std::collections::BTreeMap<String, String>,
    path: &str,
    symbol: &SymbolNode,
    ancestors: &[&str],
) {
    let qualified = dot_join(ancestors, &symbol.name);
    out.insert(qualified.clone(), format!("{path}:{}", symbol.position.line));

    let mut next_ancestors = ancestors.to_vec();
    next_ancestors.push(&symbol.name);
    for child in &symbol.children {
        insert_symbol(out, path, child, &next_ancestors);
    }
}

fn dot_join(ancestors: &[&str], name: &str) -> String {
    if ancestors.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", ancestors.join("."), name)
    }
}

/// Resolve every file's import specifiers against the current file set and
/// rebuild both the forward (`imports`) and reverse (`imported_by`) edges.
fn rebuild_dependency_graph(index: &mut ProjectIndex) {
    index.dependency_graph.clear();

    let known_paths: BTreeSet<String> = index.files.keys().cloned().collect();
    let resolver = PathResolver::new(&known_paths);

    for (path, record) in &index.files {
        let mut entry = DependencyEntry::default();
        for import in &record.imports {
            let resolved = resolver.resolve(&import.module, path).unwrap_or_else(|| import.module.clone());
            entry.imports.push(resolved);
        }
        index.dependency_graph.insert(path.clone(), entry);
    }

    let reverse_edges: Vec<(String, String)> = index
        .dependency_graph
        .iter()
        .flat_map(|(path, entry)| entry.imports.iter().map(move |dep| (dep.clone(), path.clone())))
        .filter(|(dep, _)| known_paths.contains(dep))
        .collect();

    for (dep, dependent) in reverse_edges {
        index
            .dependency_graph
            .entry(dep)
            .or_default()
            .imported_by
            .push(dependent);
    }

    for entry in index.dependency_graph.values_mut() {
        entry.imported_by.sort();
        entry.imported_by.dedup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config() -> IndexingConfig {
        IndexingConfig {
            include_patterns: vec!["**/*".to_string()],
            exclude_patterns: vec![],
            max_file_size: 1_000_000,
            languages: vec![],
            parallel: false,
        }
    }

    #[test]
    fn build_full_indexes_files_and_resolves_dependencies() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("util.rs"), "pub fn helper() {}\n").unwrap();
        fs::write(
            dir.path().join("main.rs"),
            "mod util;\nfn main() { util::helper(); }\n",
        )
        .unwrap();

        let builder = IndexBuilder::new(&config());
        let index = builder.build_full(dir.path(), "2026-01-01T00:00:00Z");

        assert_eq!(index.files.len(), 2);
        assert!(index.symbol_index.contains_key("helper"));
        assert!(index.symbol_index.contains_key("main"));
    }

    #[test]
    fn update_drops_deleted_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.rs"), "pub fn a() {}\n").unwrap();
        let builder = IndexBuilder::new(&config());
        let mut index = builder.build_full(dir.path(), "2026-01-01T00:00:00Z");
        assert_eq!(index.files.len(), 1);

        fs::remove_file(dir.path().join("a.rs")).unwrap();
        builder.update(&mut index, dir.path(), &["a.rs".to_string()], "2026-01-02T00:00:00Z");

        assert!(index.files.is_empty());
        assert!(index.dependency_graph.is_empty());
        assert_eq!(index.updated_at, "2026-01-02T00:00:00Z");
    }

    #[test]
    fn update_skips_reparse_when_hash_unchanged() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.rs"), "pub fn a() {}\n").unwrap();
        let builder = IndexBuilder::new(&config());
        let mut index = builder.build_full(dir.path(), "2026-01-01T00:00:00Z");
        let original_indexed_at = index.files["a.rs"].last_indexed_at.clone();

        builder.update(&mut index, dir.path(), &["a.rs".to_string()], "2026-01-02T00:00:00Z");
        assert_eq!(index.files["a.rs"].last_indexed_at, original_indexed_at);
    }
}
