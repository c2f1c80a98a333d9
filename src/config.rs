//! Layered configuration: defaults -> TOML file -> environment -> CLI.
//!
//! # Environment variables
//!
//! - `PROJECT_INDEX_PORT` / `PROJECT_INDEX_HOST` override the server bind.
//! - `PROJECT_INDEX_TRACE=1` forces debug-level logging.
//! - `PROJECT_INDEX_SERVER=1` makes `pindex watch` also serve HTTP.
//! - `PINDEX_<SECTION>__<FIELD>` overrides any nested settings field, e.g.
//!   `PINDEX_INDEXING__MAX_FILE_SIZE=500000`.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_INDEX_FILE: &str = ".context/.project/PROJECT_INDEX.json";
pub const DEFAULT_VECTORS_FILE: &str = ".context/.project/PROJECT_INDEX.vectors.jsonl";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    #[serde(default = "default_index_file")]
    pub index_file: PathBuf,

    #[serde(default = "default_vectors_file")]
    pub vectors_file: PathBuf,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub watcher: WatcherConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub semantic: SemanticConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexingConfig {
    #[serde(default = "default_include_patterns")]
    pub include_patterns: Vec<String>,

    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Informational list of supported language tags (spec §6).
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatcherConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SemanticConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_index_file() -> PathBuf {
    PathBuf::from(DEFAULT_INDEX_FILE)
}
fn default_vectors_file() -> PathBuf {
    PathBuf::from(DEFAULT_VECTORS_FILE)
}
fn default_include_patterns() -> Vec<String> {
    vec!["**/*".to_string()]
}
fn default_exclude_patterns() -> Vec<String> {
    vec![
        "**/node_modules/**".to_string(),
        "**/target/**".to_string(),
        "**/.git/**".to_string(),
        "**/dist/**".to_string(),
        "**/.context/**".to_string(),
    ]
}
fn default_max_file_size() -> u64 {
    1_000_000
}
fn default_languages() -> Vec<String> {
    vec![
        "typescript".to_string(),
        "javascript".to_string(),
        "python".to_string(),
        "go".to_string(),
        "rust".to_string(),
        "shell".to_string(),
    ]
}
fn default_parallel() -> bool {
    true
}
fn default_debounce_ms() -> u64 {
    750
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    7878
}
fn default_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_top_k() -> usize {
    20
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            index_file: default_index_file(),
            vectors_file: default_vectors_file(),
            indexing: IndexingConfig::default(),
            watcher: WatcherConfig::default(),
            server: ServerConfig::default(),
            semantic: SemanticConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            include_patterns: default_include_patterns(),
            exclude_patterns: default_exclude_patterns(),
            max_file_size: default_max_file_size(),
            languages: default_languages(),
            parallel: default_parallel(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            default_top_k: default_top_k(),
        }
    }
}

impl Settings {
    /// Load layered configuration: defaults -> `.context/settings.toml` (if
    /// present under `project_root`) -> environment -> nothing yet from CLI
    /// (CLI flags are merged by the caller after `load`).
    pub fn load(project_root: &std::path::Path) -> Result<Self, figment::Error> {
        let config_path = project_root.join(".context").join("settings.toml");

        let mut settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("PINDEX_").split("__"))
            .extract()?;

        settings.project_root = project_root.to_path_buf();

        if let Ok(port) = std::env::var("PROJECT_INDEX_PORT") {
            if let Ok(p) = port.parse() {
                settings.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("PROJECT_INDEX_HOST") {
            settings.server.host = host;
        }

        Ok(settings)
    }

    pub fn index_path(&self) -> PathBuf {
        self.project_root.join(&self.index_file)
    }

    pub fn vectors_path(&self) -> PathBuf {
        self.project_root.join(&self.vectors_file)
    }

    pub fn trace_forced() -> bool {
        std::env::var("PROJECT_INDEX_TRACE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn server_forced_from_env() -> bool {
        std::env::var("PROJECT_INDEX_SERVER")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_sane() {
        let s = Settings::default();
        assert!(s.indexing.max_file_size > 0);
        assert!(s.indexing.languages.contains(&"rust".to_string()));
        assert_eq!(s.server.port, 7878);
    }

    #[test]
    fn loads_toml_overrides() {
        let dir = TempDir::new().unwrap();
        let ctx = dir.path().join(".context");
        fs::create_dir_all(&ctx).unwrap();
        fs::write(
            ctx.join("settings.toml"),
            r#"
            [indexing]
            max_file_size = 5000

            [server]
            port = 9001
            "#,
        )
        .unwrap();

        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.indexing.max_file_size, 5000);
        assert_eq!(settings.server.port, 9001);
        assert_eq!(settings.project_root, dir.path());
    }
}
