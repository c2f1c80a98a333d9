//! Atomic on-disk persistence for the project index and the semantic doc
//! cache (spec §6). Both are written to a sibling temp file and renamed into
//! place so a crash mid-write never leaves a truncated file behind.

use crate::error::{IndexError, IndexResult};
use crate::model::{DocEntry, ProjectIndex};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

pub fn load_index(path: &Path) -> IndexResult<ProjectIndex> {
    let bytes = fs::read(path).map_err(|source| IndexError::IoRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| IndexError::SerdeError {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_index(path: &Path, index: &ProjectIndex) -> IndexResult<()> {
    let json = serde_json::to_vec_pretty(index).map_err(|source| IndexError::SerdeError {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, &json)
}

/// The semantic cache file's first line is a JSON header (model id + entry
/// count); remaining lines are one `DocEntry` + `Vec<f32>` embedding pair
/// each, JSON-Lines style, so a partial tail from an interrupted write is
/// trivially detected (fewer data lines than the header's count).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DocCacheHeader {
    pub model_id: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DocCacheRow {
    pub entry: DocEntry,
    pub embedding: Vec<f32>,
}

pub struct DocCacheFile {
    pub header: DocCacheHeader,
    pub rows: Vec<DocCacheRow>,
}

pub fn load_doc_cache(path: &Path) -> IndexResult<DocCacheFile> {
    let file = fs::File::open(path).map_err(|source| IndexError::IoRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = BufReader::new(file).lines();

    let header_line = lines
        .next()
        .ok_or_else(|| IndexError::General(format!("doc cache '{}' is empty", path.display())))?;
    let header_line = header_line.map_err(|source| IndexError::IoRead {
        path: path.to_path_buf(),
        source,
    })?;
    let header: DocCacheHeader = serde_json::from_str(&header_line).map_err(|source| IndexError::SerdeError {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rows = Vec::with_capacity(header.entry_count);
    for line in lines {
        let line = line.map_err(|source| IndexError::IoRead {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let row: DocCacheRow = serde_json::from_str(&line).map_err(|source| IndexError::SerdeError {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(row);
    }

    Ok(DocCacheFile { header, rows })
}

pub fn save_doc_cache(path: &Path, model_id: &str, rows: &[DocCacheRow]) -> IndexResult<()> {
    let header = DocCacheHeader {
        model_id: model_id.to_string(),
        entry_count: rows.len(),
    };

    let mut buf = Vec::new();
    serde_json::to_writer(&mut buf, &header).map_err(|source| IndexError::SerdeError {
        path: path.to_path_buf(),
        source,
    })?;
    buf.push(b'\n');
    for row in rows {
        serde_json::to_writer(&mut buf, row).map_err(|source| IndexError::SerdeError {
            path: path.to_path_buf(),
            source,
        })?;
        buf.push(b'\n');
    }

    atomic_write(path, &buf)
}

fn atomic_write(path: &Path, bytes: &[u8]) -> IndexResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| IndexError::IoWrite {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let tmp_path = path.with_extension(match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{ext}.tmp"),
        None => "tmp".to_string(),
    });

    let mut tmp = fs::File::create(&tmp_path).map_err(|source| IndexError::IoWrite {
        path: tmp_path.clone(),
        source,
    })?;
    tmp.write_all(bytes).map_err(|source| IndexError::IoWrite {
        path: tmp_path.clone(),
        source,
    })?;
    tmp.sync_all().map_err(|source| IndexError::IoWrite {
        path: tmp_path.clone(),
        source,
    })?;

    fs::rename(&tmp_path, path).map_err(|source| IndexError::IoWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn index_roundtrips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("PROJECT_INDEX.json");
        let idx = ProjectIndex::new("/repo".to_string(), "2026-01-01T00:00:00Z");

        save_index(&path, &idx).unwrap();
        let loaded = load_index(&path).unwrap();
        assert_eq!(loaded.project_root, idx.project_root);
        assert_eq!(loaded.schema_version, idx.schema_version);
    }

    #[test]
    fn doc_cache_roundtrips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("PROJECT_INDEX.vectors.jsonl");
        let rows = vec![DocCacheRow {
            entry: DocEntry {
                id: "a.rs:foo".to_string(),
                file: "a.rs".to_string(),
                line: Some(3),
                text: "foo".to_string(),
            },
            embedding: vec![0.1, 0.2, 0.3],
        }];

        save_doc_cache(&path, "AllMiniLML6V2", &rows).unwrap();
        let loaded = load_doc_cache(&path).unwrap();
        assert_eq!(loaded.header.model_id, "AllMiniLML6V2");
        assert_eq!(loaded.header.entry_count, 1);
        assert_eq!(loaded.rows.len(), 1);
        assert_eq!(loaded.rows[0].entry.id, "a.rs:foo");
    }

    #[test]
    fn missing_index_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");
        assert!(load_index(&path).is_err());
    }
}
