//! The data model (spec §3): `ProjectIndex` and the records it owns.
//!
//! `SymbolNode` is a value type — children are owned by inclusion, not by
//! back-pointer. `parent` is a textual label for display and qualified-name
//! construction, never an ownership edge (spec §9 "hierarchical symbol
//! ownership").

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: &str = "1.0.0";

/// One of the language tags in spec §6, or `unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    Typescript,
    Javascript,
    Python,
    Go,
    Rust,
    Shell,
    Unknown,
}

impl LanguageTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Typescript => "typescript",
            Self::Javascript => "javascript",
            Self::Python => "python",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Shell => "shell",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared entity kind (GLOSSARY "Symbol kind").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolKind {
    Module,
    Class,
    Method,
    Property,
    Field,
    Constructor,
    Enum,
    EnumMember,
    Interface,
    Function,
    Variable,
    Constant,
    Struct,
    Trait,
    TypeParameter,
    TypeAlias,
    Component,
    Hook,
    Endpoint,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    /// Module specifier exactly as written, quotes stripped.
    pub module: String,
    /// Imported names as written; empty for side-effect imports; `"dynamic"`
    /// marks a dynamic/lazy import.
    pub names: Vec<String>,
    pub default_import: bool,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Function,
    Class,
    Interface,
    Type,
    Const,
    Let,
    Var,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDecl {
    /// `"default"` for default exports.
    pub name: String,
    pub kind: ExportKind,
    pub line: u32,
    pub signature: Option<String>,
}

/// 1-based lines, 0-based columns (spec §4.1 contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Position {
    /// Whether `other`'s line range is fully contained in this one.
    pub fn contains_range(&self, other: &Position) -> bool {
        other.line >= self.line && other.end_line <= self.end_line
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolNode {
    pub name: String,
    pub kind: SymbolKind,
    pub position: Position,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    /// Textual label of the enclosing declaration, for display / qualified
    /// name construction — not an ownership edge.
    pub parent: Option<String>,
    #[serde(default)]
    pub children: Vec<SymbolNode>,
    /// Outgoing call names, deduplicated and sorted ascending. Macro
    /// invocations are suffixed `!`.
    #[serde(default)]
    pub calls: Vec<String>,
}

impl SymbolNode {
    pub fn new(name: impl Into<String>, kind: SymbolKind, position: Position) -> Self {
        Self {
            name: name.into(),
            kind,
            position,
            signature: None,
            docstring: None,
            parent: None,
            children: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Push a call, keeping `calls` sorted and deduplicated (spec §8
    /// invariant on `SymbolNode.calls`).
    pub fn push_call(&mut self, name: impl Into<String>) {
        let name = name.into();
        if let Err(pos) = self.calls.binary_search(&name) {
            self.calls.insert(pos, name);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub title: String,
    pub level: u32,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    Functional,
    Class,
    ForwardRef,
    Memo,
    HigherOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDecl {
    pub name: String,
    pub kind: ComponentKind,
    pub line: u32,
    #[serde(default)]
    pub hooks: Vec<String>,
    /// For higher-order wrappers: the inner component's name.
    pub wraps: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDecl {
    pub method: String,
    pub path: Option<String>,
    pub handler: String,
    pub line: u32,
    pub framework: Option<String>,
    #[serde(default)]
    pub middleware: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Repo-relative, forward-slash-normalized.
    pub path: String,
    pub language: LanguageTag,
    pub size_bytes: u64,
    /// First 16 hex chars of the content digest.
    pub content_hash: String,
    pub last_indexed_at: String,
    #[serde(default)]
    pub imports: Vec<ImportEdge>,
    #[serde(default)]
    pub exports: Vec<ExportDecl>,
    /// Ordered by source position; may be nested.
    #[serde(default)]
    pub symbols: Vec<SymbolNode>,
    /// Flat, sorted by start line.
    #[serde(default)]
    pub outline: Vec<OutlineEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ui_components: Vec<ComponentDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_endpoints: Vec<EndpointDecl>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyEntry {
    /// Repo-relative resolved paths, or raw external specifiers.
    #[serde(default)]
    pub imports: Vec<String>,
    /// Always repo-relative paths.
    #[serde(default)]
    pub imported_by: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectIndex {
    pub schema_version: String,
    pub project_root: String,
    pub created_at: String,
    pub updated_at: String,
    /// Keyed by repo-relative path; `BTreeMap` keeps output byte-stable.
    pub files: BTreeMap<String, FileRecord>,
    /// `qualified_name -> "path:line"`.
    pub symbol_index: BTreeMap<String, String>,
    pub dependency_graph: BTreeMap<String, DependencyEntry>,
}

impl ProjectIndex {
    pub fn new(project_root: String, now: &str) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            project_root,
            created_at: now.to_string(),
            updated_at: now.to_string(),
            files: BTreeMap::new(),
            symbol_index: BTreeMap::new(),
            dependency_graph: BTreeMap::new(),
        }
    }
}

/// One entry in the semantic cache (spec §3 `DocCache`, §6 on-disk shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocEntry {
    /// `"file:symbol"`.
    pub id: String,
    pub file: String,
    pub line: Option<u32>,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_call_sorted_deduped() {
        let mut s = SymbolNode::new("f", SymbolKind::Function, Position { line: 1, column: 0, end_line: 1, end_column: 1 });
        s.push_call("zeta");
        s.push_call("alpha");
        s.push_call("zeta");
        assert_eq!(s.calls, vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn position_contains_range() {
        let outer = Position { line: 1, column: 0, end_line: 10, end_column: 0 };
        let inner = Position { line: 2, column: 0, end_line: 5, end_column: 0 };
        assert!(outer.contains_range(&inner));
        assert!(!inner.contains_range(&outer));
    }

    #[test]
    fn project_index_roundtrip() {
        let idx = ProjectIndex::new("/repo".to_string(), "2026-01-01T00:00:00Z");
        let json = serde_json::to_string(&idx).unwrap();
        let back: ProjectIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back.project_root, "/repo");
        assert_eq!(back.schema_version, SCHEMA_VERSION);
    }
}
