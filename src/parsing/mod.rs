//! Parser adapters (spec §4.1) and the language router (spec §4.2).
//!
//! Each adapter is a pure function of file bytes + path: `parse` never
//! raises out of the adapter boundary. On internal failure it returns an
//! empty `ParseResult` and the caller logs a recoverable warning.

pub mod clike;
pub mod curly;
pub mod indentation;
pub mod ownership;
pub mod shell;

use crate::model::{ComponentDecl, EndpointDecl, ExportDecl, ImportEdge, LanguageTag, OutlineEntry, SymbolNode};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub imports: Vec<ImportEdge>,
    pub exports: Vec<ExportDecl>,
    pub symbols: Vec<SymbolNode>,
    pub outline: Vec<OutlineEntry>,
    pub ui_components: Vec<ComponentDecl>,
    pub api_endpoints: Vec<EndpointDecl>,
}

/// Contract every language family adapter implements. Adapters are
/// stateless producers; the router owns construction and reuse (spec §3
/// ownership notes).
pub trait LanguageAdapter: Send + Sync {
    fn language(&self) -> LanguageTag;

    /// Parse `source` (already UTF-8 lossy decoded) at repo-relative `path`.
    /// Must never panic on malformed input — return an empty `ParseResult`
    /// instead (spec §8 "syntax error" boundary behavior).
    fn parse(&self, source: &str, path: &str) -> ParseResult;
}

/// Extension -> [`LanguageTag`] mapping (spec §4.2). Extensions outside this
/// set route to `Unknown`.
pub fn language_for_extension(ext: &str) -> LanguageTag {
    match ext.to_ascii_lowercase().as_str() {
        "ts" | "tsx" | "mts" | "cts" => LanguageTag::Typescript,
        "js" | "jsx" | "mjs" | "cjs" => LanguageTag::Javascript,
        "py" | "pyi" => LanguageTag::Python,
        "go" => LanguageTag::Go,
        "rs" => LanguageTag::Rust,
        "sh" | "bash" | "zsh" => LanguageTag::Shell,
        _ => LanguageTag::Unknown,
    }
}

pub fn language_for_path(path: &Path) -> LanguageTag {
    path.extension()
        .and_then(|e| e.to_str())
        .map(language_for_extension)
        .unwrap_or(LanguageTag::Unknown)
}

/// Process-wide router. Adapters are constructed lazily and once, then
/// reused for every file of that language (spec §4.2).
pub struct LanguageRouter {
    typescript: OnceLock<curly::CurlyBraceAdapter>,
    javascript: OnceLock<curly::CurlyBraceAdapter>,
    python: OnceLock<indentation::IndentationAdapter>,
    go: OnceLock<clike::CLikeAdapter>,
    rust: OnceLock<ownership::OwnershipAdapter>,
    shell: OnceLock<shell::ShellAdapter>,
}

impl Default for LanguageRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageRouter {
    pub fn new() -> Self {
        Self {
            typescript: OnceLock::new(),
            javascript: OnceLock::new(),
            python: OnceLock::new(),
            go: OnceLock::new(),
            rust: OnceLock::new(),
            shell: OnceLock::new(),
        }
    }

    /// Route `path` to an adapter and parse `source`. `Unknown` files
    /// produce an empty `ParseResult` with no adapter invoked.
    pub fn parse(&self, language: LanguageTag, source: &str, path: &str) -> ParseResult {
        match language {
            LanguageTag::Typescript => self
                .typescript
                .get_or_init(|| curly::CurlyBraceAdapter::new(true))
                .parse(source, path),
            LanguageTag::Javascript => self
                .javascript
                .get_or_init(|| curly::CurlyBraceAdapter::new(false))
                .parse(source, path),
            LanguageTag::Python => self
                .python
                .get_or_init(indentation::IndentationAdapter::new)
                .parse(source, path),
            LanguageTag::Go => self.go.get_or_init(clike::CLikeAdapter::new).parse(source, path),
            LanguageTag::Rust => self
                .rust
                .get_or_init(ownership::OwnershipAdapter::new)
                .parse(source, path),
            LanguageTag::Shell => self
                .shell
                .get_or_init(shell::ShellAdapter::new)
                .parse(source, path),
            LanguageTag::Unknown => ParseResult::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_routing() {
        assert_eq!(language_for_extension("rs"), LanguageTag::Rust);
        assert_eq!(language_for_extension("TS"), LanguageTag::Typescript);
        assert_eq!(language_for_extension("py"), LanguageTag::Python);
        assert_eq!(language_for_extension("go"), LanguageTag::Go);
        assert_eq!(language_for_extension("sh"), LanguageTag::Shell);
        assert_eq!(language_for_extension("md"), LanguageTag::Unknown);
    }

    #[test]
    fn unknown_language_parses_empty() {
        let router = LanguageRouter::new();
        let result = router.parse(LanguageTag::Unknown, "whatever", "f.md");
        assert_eq!(result, ParseResult::default());
    }
}
