//! Command-line surface (spec §6).

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pindex", version, about = "Structural and semantic map builder for source repositories")]
pub struct Cli {
    /// Project root to operate on (defaults to the current directory).
    #[arg(long, global = true, env = "PROJECT_INDEX_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a full index from scratch.
    Index,

    /// Re-parse specific files (or every changed file, if none given) and
    /// refresh the derived symbol index and dependency graph.
    Update {
        files: Vec<String>,
    },

    /// Watch the project for changes, re-indexing incrementally.
    Watch {
        /// Also serve the resident HTTP API while watching.
        #[arg(long)]
        daemon: bool,
    },

    /// Print a summary of the current index.
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Substring (or exact) search over symbol names.
    Search {
        query: String,
        #[arg(long)]
        exact: bool,
        #[arg(long)]
        json: bool,
    },

    /// Semantic (embedding) search over symbol and file text.
    Semsearch {
        query: String,
        #[arg(long, default_value_t = 20)]
        k: usize,
        #[arg(long)]
        model: Option<String>,
        /// ONNX execution profile (reserved; forwarded to fastembed as a
        /// hint, not validated further).
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Fuzzy "what might I want" suggestions for free-text context.
    Suggest {
        context: String,
        #[arg(long)]
        json: bool,
    },

    /// Show forward or reverse dependency edges for a file.
    Deps {
        file: String,
        #[arg(long)]
        reverse: bool,
        #[arg(long)]
        orphans: bool,
        #[arg(long)]
        json: bool,
    },

    /// Breadth-first impact analysis from a changed file.
    Impact {
        file: String,
        #[arg(long, default_value_t = 5)]
        depth: u32,
        #[arg(long)]
        json: bool,
    },

    /// Direct outgoing calls from a symbol.
    Calls {
        symbol: String,
        #[arg(long)]
        json: bool,
    },

    /// Direct callers of a symbol.
    CalledBy {
        symbol: String,
        #[arg(long)]
        json: bool,
    },

    /// Shortest call path between two symbols.
    CallChain {
        from: String,
        to: String,
        #[arg(long, default_value_t = 10)]
        depth: u32,
        #[arg(long)]
        json: bool,
    },

    /// Functions/methods never referenced elsewhere in the index.
    DeadCode {
        #[arg(long)]
        include_private: bool,
        #[arg(long)]
        json: bool,
    },
}
