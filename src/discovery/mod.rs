//! File discovery (spec §4.3): walk the project root, apply include/exclude
//! globs and a size cap, return a lexicographically sorted list of
//! repo-relative paths.

use crate::config::IndexingConfig;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

pub struct FileDiscoverer {
    include: GlobSet,
    exclude: GlobSet,
    max_file_size: u64,
}

impl FileDiscoverer {
    pub fn new(config: &IndexingConfig) -> Self {
        Self {
            include: build_globset(&config.include_patterns),
            exclude: build_globset(&config.exclude_patterns),
            max_file_size: config.max_file_size,
        }
    }

    /// Walk `root`, returning repo-relative, forward-slash-normalized paths
    /// that match an include pattern, match no exclude pattern, are within
    /// the size cap, and are files (not directories/symlinks). Hidden
    /// entries directly under `root` are excluded unless matched explicitly
    /// by an include pattern.
    pub fn discover(&self, root: &Path) -> Vec<String> {
        let mut out = Vec::new();

        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .follow_links(false)
            .require_git(false)
            .build();

        for entry in walker.filter_map(Result::ok) {
            let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }

            let path = entry.path();
            let rel = match path.strip_prefix(root) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let rel_str = normalize(rel);

            if is_hidden_top_level(rel) && !self.include.is_match(&rel_str) {
                continue;
            }

            if !self.include.is_match(&rel_str) || self.exclude.is_match(&rel_str) {
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(u64::MAX);
            if size > self.max_file_size {
                continue;
            }

            out.push(rel_str);
        }

        out.sort();
        out
    }
}

fn is_hidden_top_level(rel: &Path) -> bool {
    rel.components()
        .next()
        .and_then(|c| c.as_os_str().to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn normalize(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Repo-relative path from an absolute path under `root` (helper for the
/// watcher, which receives absolute paths from filesystem events).
pub fn to_repo_relative(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(normalize)
}

#[allow(dead_code)]
pub fn absolute(root: &Path, repo_relative: &str) -> PathBuf {
    root.join(repo_relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config() -> IndexingConfig {
        IndexingConfig {
            include_patterns: vec!["**/*".to_string()],
            exclude_patterns: vec!["**/node_modules/**".to_string()],
            max_file_size: 1000,
            languages: vec![],
            parallel: false,
        }
    }

    #[test]
    fn finds_files_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.rs"), "fn b() {}").unwrap();
        fs::write(dir.path().join("a.rs"), "fn a() {}").unwrap();

        let discoverer = FileDiscoverer::new(&config());
        let found = discoverer.discover(dir.path());
        assert_eq!(found, vec!["a.rs".to_string(), "b.rs".to_string()]);
    }

    #[test]
    fn respects_exclude_and_size_cap() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/x.js"), "skip").unwrap();
        fs::write(dir.path().join("big.rs"), "x".repeat(2000)).unwrap();
        fs::write(dir.path().join("ok.rs"), "fn ok() {}").unwrap();

        let discoverer = FileDiscoverer::new(&config());
        let found = discoverer.discover(dir.path());
        assert_eq!(found, vec!["ok.rs".to_string()]);
    }

    #[test]
    fn excludes_hidden_top_level_entries() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
        fs::write(dir.path().join("visible.rs"), "fn v() {}").unwrap();

        let discoverer = FileDiscoverer::new(&config());
        let found = discoverer.discover(dir.path());
        assert_eq!(found, vec!["visible.rs".to_string()]);
    }

    #[test]
    fn boundary_exact_max_size_included() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("exact.rs"), "x".repeat(1000)).unwrap();
        fs::write(dir.path().join("over.rs"), "x".repeat(1001)).unwrap();

        let discoverer = FileDiscoverer::new(&config());
        let found = discoverer.discover(dir.path());
        assert_eq!(found, vec!["exact.rs".to_string()]);
    }
}
