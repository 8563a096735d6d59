//! Configuration module for the knowledge base.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.knowbase/settings.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `KB_` and use double underscores
//! to separate nested levels:
//! - `KB_RETRIEVAL__TOP_K=5` sets `retrieval.top_k`
//! - `KB_EMBEDDING__PROVIDER=hashing` sets `embedding.provider`
//! - `KB_INDEX__BACKEND=memory` sets `index.backend`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::SourceType;

/// Directory holding the settings file, index and model cache.
pub const CONFIG_DIR: &str = ".knowbase";

const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .knowbase is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where source documents live.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathsConfig {
    /// Directory of static documents
    #[serde(default = "default_knowledge_base")]
    pub knowledge_base: PathBuf,

    /// Directory of `<source>_articles.json` collections
    #[serde(default = "default_online_content")]
    pub online_content: PathBuf,

    /// File extensions picked up from the knowledge-base directory
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// JSON array of freshly fetched articles consumed by `refresh`
    #[serde(default = "default_inbox")]
    pub inbox: PathBuf,
}

/// Vector index storage backend.
#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Linear scan persisted under `index.path`
    #[default]
    Linear,
    /// Linear scan kept only in memory
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexConfig {
    /// Directory holding `data.json` and `embeddings.vec`
    #[serde(default = "default_index_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub backend: BackendKind,
}

/// Per-source chunk size bounds, in characters.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChunkingConfig {
    #[serde(default = "default_static_max_chunk_size")]
    pub static_max_chunk_size: usize,

    #[serde(default = "default_online_max_chunk_size")]
    pub online_max_chunk_size: usize,
}

impl ChunkingConfig {
    /// Chunk bound for documents of `source_type`.
    pub fn max_size_for(&self, source_type: SourceType) -> usize {
        match source_type {
            SourceType::Static => self.static_max_chunk_size,
            SourceType::Online => self.online_max_chunk_size,
        }
    }
}

/// Which embedding provider to construct.
#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local ONNX sentence-embedding model
    #[default]
    FastEmbed,
    /// Deterministic feature hashing, no model download
    Hashing,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    /// fastembed model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector width for the hashing provider (fastembed models report their own)
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Where downloaded models are cached
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    /// Chunks handed to the answer synthesizer
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Hits scoring below this are dropped from the context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default `tracing` filter; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_version() -> u32 {
    1
}
fn default_knowledge_base() -> PathBuf {
    PathBuf::from("data/knowledge_base")
}
fn default_online_content() -> PathBuf {
    PathBuf::from("data/online_content")
}
fn default_static_extensions() -> Vec<String> {
    vec!["md".to_string()]
}
fn default_inbox() -> PathBuf {
    PathBuf::from("data/inbox.json")
}
fn default_index_path() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("index")
}
fn default_static_max_chunk_size() -> usize {
    500
}
fn default_online_max_chunk_size() -> usize {
    800
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_dimension() -> usize {
    384
}
fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("knowbase").join("models"))
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("models"))
}
fn default_batch_size() -> usize {
    64
}
fn default_top_k() -> usize {
    3
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            paths: PathsConfig::default(),
            index: IndexConfig::default(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            knowledge_base: default_knowledge_base(),
            online_content: default_online_content(),
            static_extensions: default_static_extensions(),
            inbox: default_inbox(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            backend: BackendKind::default(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            static_max_chunk_size: default_static_max_chunk_size(),
            online_max_chunk_size: default_online_max_chunk_size(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            cache_dir: default_cache_dir(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            similarity_threshold: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// `KB_SECTION__FIELD` → `section.field`
fn env_provider() -> Env {
    Env::prefixed("KB_").map(|key| key.as_str().to_lowercase().replace("__", ".").into())
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(SETTINGS_FILE));

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            .merge(env_provider())
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(env_provider())
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by looking for a .knowbase directory
    /// from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(SETTINGS_FILE))
    }

    /// Get the workspace root directory (where .knowbase is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Resolves a configured path against the workspace root.
    ///
    /// Absolute paths and settings without a detected root are returned as is.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create `.knowbase/settings.toml` in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join(SETTINGS_FILE);
        Self::write_default_config(&config_path, force)?;
        Ok(config_path)
    }

    /// Write a commented default settings file to `config_path`
    pub fn write_default_config(
        config_path: &Path,
        force: bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r##"# knowbase configuration file

# Version of the configuration schema
version = 1

[paths]
# Static documents, one file per document; the first "# " heading is the title
knowledge_base = "data/knowledge_base"
# Online article collections named <source>_articles.json
online_content = "data/online_content"
static_extensions = ["md"]
# Article batch picked up by `knowbase refresh`
inbox = "data/inbox.json"

[index]
path = ".knowbase/index"
# "linear" persists the index to disk, "memory" keeps it in process only
backend = "linear"

[chunking]
# Maximum characters per chunk
static_max_chunk_size = 500
online_max_chunk_size = 800

[embedding]
# "fastembed" runs a local model, "hashing" needs no download
provider = "fastembed"
# AllMiniLML6V2, AllMiniLML12V2, BGESmallENV15, BGEBaseENV15, MultilingualE5Small
model = "AllMiniLML6V2"
# Only used by the hashing provider
dimension = 384
cache_dir = "{}"
batch_size = 64

[retrieval]
# Number of chunks used as answer context
top_k = 3
# Drop hits scoring below this value
# similarity_threshold = 0.2

[logging]
# trace, debug, info, warn or error (RUST_LOG overrides)
level = "warn"
"##,
            default_cache_dir().display().to_string().replace('\\', "/")
        );

        std::fs::write(config_path, template)?;
        Ok(())
    }
}
