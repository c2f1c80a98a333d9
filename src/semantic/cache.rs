//! On-disk embedding cache and reuse policy (spec §4.6, §6).

use super::{cosine_similarity, EmbeddingProvider};
use crate::error::IndexResult;
use crate::model::{DocEntry, ProjectIndex};
use crate::persistence::{self, DocCacheRow};
use std::path::Path;

pub struct DocCache {
    pub model_id: String,
    pub rows: Vec<DocCacheRow>,
}

impl DocCache {
    /// Load the cache from disk if present; an absent or unreadable file is
    /// treated as an empty cache rather than an error (semantic search
    /// degrades gracefully, spec §7).
    pub fn load(path: &Path) -> Self {
        match persistence::load_doc_cache(path) {
            Ok(file) => Self {
                model_id: file.header.model_id,
                rows: file.rows,
            },
            Err(_) => Self {
                model_id: String::new(),
                rows: Vec::new(),
            },
        }
    }

    pub fn save(&self, path: &Path) -> IndexResult<()> {
        persistence::save_doc_cache(path, &self.model_id, &self.rows)
    }

    /// Whether this cache can be reused as-is for `model_id` against the
    /// current set of doc entries: the model must match and every entry's
    /// text must be byte-identical to what's cached (spec §4.6 reuse
    /// policy). Any mismatch means a full rebuild.
    pub fn is_reusable_for(&self, model_id: &str, entries: &[DocEntry]) -> bool {
        if self.model_id != model_id || self.rows.len() != entries.len() {
            return false;
        }
        self.rows
            .iter()
            .zip(entries)
            .all(|(row, entry)| row.entry.id == entry.id && row.entry.text == entry.text)
    }

    /// Rebuild the cache from scratch: embed every entry's text and store
    /// the resulting vectors alongside it.
    pub fn rebuild(model_id: &str, entries: Vec<DocEntry>) -> IndexResult<Self> {
        let provider = EmbeddingProvider::global(model_id)?;
        let texts: Vec<String> = entries.iter().map(|e| e.text.clone()).collect();
        let embeddings = provider.embed(texts)?;

        let rows = entries
            .into_iter()
            .zip(embeddings)
            .map(|(entry, embedding)| DocCacheRow { entry, embedding })
            .collect();

        Ok(Self {
            model_id: provider.model_id().to_string(),
            rows,
        })
    }
}

/// Flatten an index's symbols and file-level text into the doc entries the
/// semantic cache embeds: one entry per named symbol, plus one per file
/// (its outline titles joined) for whole-file relevance.
pub fn doc_entries(index: &ProjectIndex) -> Vec<DocEntry> {
    let mut out = Vec::new();
    for (path, record) in &index.files {
        for symbol in &record.symbols {
            flatten_symbol(symbol, path, &mut out);
        }
        if !record.outline.is_empty() {
            let text = record.outline.iter().map(|o| o.title.as_str()).collect::<Vec<_>>().join(" ");
            out.push(DocEntry {
                id: format!("{path}:file"),
                file: path.clone(),
                line: None,
                text,
            });
        }
    }
    out
}

fn flatten_symbol(symbol: &crate::model::SymbolNode, path: &str, out: &mut Vec<DocEntry>) {
    let mut text = symbol.name.clone();
    if let Some(sig) = &symbol.signature {
        text.push(' ');
        text.push_str(sig);
    }
    if let Some(doc) = &symbol.docstring {
        text.push(' ');
        text.push_str(doc);
    }

    out.push(DocEntry {
        id: format!("{path}:{}", symbol.name),
        file: path.to_string(),
        line: Some(symbol.position.line),
        text,
    });

    for child in &symbol.children {
        flatten_symbol(child, path, out);
    }
}

/// Rank every cached entry by cosine similarity to `query`'s embedding,
/// returning the top `k`.
pub fn semantic_search(query: &str, cache: &DocCache, k: usize) -> IndexResult<Vec<(DocEntry, f32)>> {
    let provider = EmbeddingProvider::global(&cache.model_id)?;
    let query_vec = provider.embed(vec![query.to_string()])?.remove(0);

    let mut scored: Vec<(DocEntry, f32)> = cache
        .rows
        .iter()
        .map(|row| (row.entry.clone(), cosine_similarity(&query_vec, &row.embedding)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileRecord, LanguageTag, Position, SymbolKind, SymbolNode};

    #[test]
    fn doc_entries_include_symbols_and_file_summary() {
        let mut idx = ProjectIndex::new("/repo".to_string(), "2026-01-01T00:00:00Z");
        let pos = Position { line: 1, column: 0, end_line: 1, end_column: 1 };
        let symbol = SymbolNode::new("greet", SymbolKind::Function, pos);
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
                symbols: vec![symbol],
                outline: vec![crate::model::OutlineEntry {
                    title: "greet".to_string(),
                    level: 0,
                    line: 1,
                }],
                ui_components: vec![],
                api_endpoints: vec![],
            },
        );

        let entries = doc_entries(&idx);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.id == "a.rs:greet"));
        assert!(entries.iter().any(|e| e.id == "a.rs:file"));
    }

    #[test]
    fn cache_is_not_reusable_when_text_changes() {
        let cache = DocCache {
            model_id: "AllMiniLML6V2".to_string(),
            rows: vec![DocCacheRow {
                entry: DocEntry {
                    id: "a.rs:greet".to_string(),
                    file: "a.rs".to_string(),
                    line: Some(1),
                    text: "greet".to_string(),
                },
                embedding: vec![0.1, 0.2],
            }],
        };

        let changed = vec![DocEntry {
            id: "a.rs:greet".to_string(),
            file: "a.rs".to_string(),
            line: Some(1),
            text: "greet updated signature".to_string(),
        }];

        assert!(!cache.is_reusable_for("AllMiniLML6V2", &changed));
    }

    #[test]
    fn cache_reusable_when_model_and_text_match() {
        let entries = vec![DocEntry {
            id: "a.rs:greet".to_string(),
            file: "a.rs".to_string(),
            line: Some(1),
            text: "greet".to_string(),
        }];
        let cache = DocCache {
            model_id: "AllMiniLML6V2".to_string(),
            rows: vec![DocCacheRow {
                entry: entries[0].clone(),
                embedding: vec![0.1, 0.2],
            }],
        };

        assert!(cache.is_reusable_for("AllMiniLML6V2", &entries));
    }
}
