//! Path resolution for relative import specifiers (spec §4.5).

use std::collections::BTreeSet;

const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "go", "rs"];

/// Resolve `(specifier, from_path)` against the set of files known to the
/// index. Relative specifiers (starting with `.`) are tried as a file with
/// each supported extension appended, then as `/index.<ext>` under the
/// specifier itself. The first existing candidate wins. Non-relative
/// specifiers resolve to themselves (external).
pub struct PathResolver<'a> {
    known_files: &'a BTreeSet<String>,
}

impl<'a> PathResolver<'a> {
    pub fn new(known_files: &'a BTreeSet<String>) -> Self {
        Self { known_files }
    }

    pub fn resolve(&self, specifier: &str, from_path: &str) -> Option<String> {
        if !specifier.starts_with('.') {
            return None;
        }

        let base = join_relative(from_path, specifier);

        if self.known_files.contains(&base) {
            return Some(base);
        }

        for ext in SOURCE_EXTENSIONS {
            let candidate = format!("{base}.{ext}");
            if self.known_files.contains(&candidate) {
                return Some(candidate);
            }
        }

        for ext in SOURCE_EXTENSIONS {
            let candidate = format!("{base}/index.{ext}");
            if self.known_files.contains(&candidate) {
                return Some(candidate);
            }
        }

        None
    }
}

/// Join a relative specifier against the directory containing `from_path`,
/// collapsing `.`/`..` segments, and normalize to forward slashes.
fn join_relative(from_path: &str, specifier: &str) -> String {
    let from_dir: Vec<&str> = {
        let mut parts: Vec<&str> = from_path.split('/').collect();
        parts.pop();
        parts
    };

    let mut segments: Vec<&str> = from_dir;
    for part in specifier.split('/') {
        match part {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_sibling_file() {
        let known = files(&["src/app.ts", "src/util.ts"]);
        let resolver = PathResolver::new(&known);
        assert_eq!(
            resolver.resolve("./util", "src/app.ts"),
            Some("src/util.ts".to_string())
        );
    }

    #[test]
    fn resolves_index_file() {
        let known = files(&["src/app.ts", "src/lib/index.ts"]);
        let resolver = PathResolver::new(&known);
        assert_eq!(
            resolver.resolve("./lib", "src/app.ts"),
            Some("src/lib/index.ts".to_string())
        );
    }

    #[test]
    fn external_specifier_is_none() {
        let known = files(&["src/app.ts"]);
        let resolver = PathResolver::new(&known);
        assert_eq!(resolver.resolve("external-lib", "src/app.ts"), None);
    }

    #[test]
    fn unresolvable_relative_is_none() {
        let known = files(&["src/app.ts"]);
        let resolver = PathResolver::new(&known);
        assert_eq!(resolver.resolve("./missing", "src/app.ts"), None);
    }

    #[test]
    fn parent_traversal() {
        let known = files(&["src/app.ts", "lib/shared.ts"]);
        let resolver = PathResolver::new(&known);
        assert_eq!(
            resolver.resolve("../lib/shared", "src/app.ts"),
            Some("lib/shared.ts".to_string())
        );
    }
}
