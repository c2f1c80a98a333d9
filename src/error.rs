//! Error types for the project index system.
//!
//! Structured, actionable errors using `thiserror`, following the taxonomy
//! of user-visible error kinds: a queried resource missing, a parse failure
//! isolated to one file, I/O and config failures, and semantic-search
//! failures that never block structural queries.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for indexing, query, and persistence operations.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("No index found at '{path}'. Run `pindex index` first.")]
    IndexMissing { path: PathBuf },

    #[error("'{path}' is not in the dependency graph")]
    PathNotInGraph { path: String },

    #[error("Symbol '{name}' not found")]
    SymbolNotFound { name: String },

    #[error("Failed to parse {language} file '{path}': {reason}")]
    ParseFailure {
        path: PathBuf,
        language: String,
        reason: String,
    },

    #[error("Failed to read '{path}': {source}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    #[error("Embedding model unavailable or inference failed: {reason}")]
    EmbeddingError { reason: String },

    #[error("Failed to (de)serialize index at '{path}': {source}")]
    SerdeError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    General(String),
}

impl IndexError {
    /// Human-facing recovery hints; the CLI adapter decides whether to print them.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::IndexMissing { .. } => vec![
                "Run `pindex index` to build an index for this project",
            ],
            Self::PathNotInGraph { .. } => vec![
                "Paths are repo-relative and forward-slash-normalized",
                "Run `pindex update <file>` if the file was added after the last index",
            ],
            Self::SymbolNotFound { .. } => vec![
                "Run `pindex search <name>` to look for a close match",
            ],
            Self::ParseFailure { .. } => vec![
                "The file is retained with empty extraction; other files are unaffected",
            ],
            Self::EmbeddingError { .. } => vec![
                "Structural queries (search, deps, impact, calls) are unaffected",
                "Retry `pindex semsearch` once the embedding model is reachable",
            ],
            Self::ConfigError { .. } => vec![
                "Check project_root and the include/exclude pattern lists",
            ],
            _ => vec![],
        }
    }
}

pub type IndexResult<T> = Result<T, IndexError>;
