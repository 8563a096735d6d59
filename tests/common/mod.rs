#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use knowbase::chunking::Chunker;
use knowbase::config::{BackendKind, ProviderKind, RetrievalConfig, Settings};
use knowbase::error::IngestResult;
use knowbase::ingest::{ArticleStore, ContentNormalizer};
use knowbase::retrieval::{ContentSource, RetrievalCoordinator};
use knowbase::types::{Article, DocumentChunk, SourceType};
use knowbase::vector::{EmbeddingProvider, HashingProvider, VectorDimension, VectorError};
use parking_lot::Mutex;
use tempfile::TempDir;

/// A throwaway workspace holding a knowledge base, an online article
/// directory and an index directory.
pub struct TestKnowledgeBase {
    pub dir: TempDir,
}

impl TestKnowledgeBase {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("kb")).expect("Failed to create kb dir");
        fs::create_dir_all(dir.path().join("online")).expect("Failed to create online dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn kb_dir(&self) -> PathBuf {
        self.path().join("kb")
    }

    pub fn online_dir(&self) -> PathBuf {
        self.path().join("online")
    }

    pub fn index_dir(&self) -> PathBuf {
        self.path().join("index")
    }

    pub fn add_document(&self, name: &str, content: &str) -> PathBuf {
        let path = self.kb_dir().join(name);
        fs::write(&path, content).expect("Failed to write document");
        path
    }

    pub fn add_collection(&self, source_name: &str, articles: &[Article]) -> PathBuf {
        let path = self
            .online_dir()
            .join(format!("{source_name}_articles.json"));
        let json = serde_json::to_string_pretty(articles).expect("Failed to encode articles");
        fs::write(&path, json).expect("Failed to write collection");
        path
    }

    pub fn normalizer(&self) -> ContentNormalizer {
        ContentNormalizer::new(self.kb_dir(), self.online_dir(), Chunker::default())
    }

    pub fn store(&self) -> ArticleStore {
        ArticleStore::new(self.online_dir())
    }

    /// Settings rooted at this workspace with the offline provider.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.workspace_root = Some(self.path().to_path_buf());
        settings.paths.knowledge_base = PathBuf::from("kb");
        settings.paths.online_content = PathBuf::from("online");
        settings.index.path = PathBuf::from("index");
        settings.index.backend = BackendKind::Linear;
        settings.embedding.provider = ProviderKind::Hashing;
        settings
    }

    /// Coordinator over an in-memory index.
    pub fn coordinator(&self, embedder: Arc<dyn EmbeddingProvider>) -> RetrievalCoordinator {
        let index = Arc::new(knowbase::LinearIndex::in_memory(embedder));
        RetrievalCoordinator::new(
            index,
            self.normalizer(),
            self.store(),
            RetrievalConfig::default(),
        )
    }
}

pub fn hashing() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashingProvider::default())
}

/// Hashing embedder that can be switched into a failing state.
pub struct FlakyEmbedder {
    inner: HashingProvider,
    failing: AtomicBool,
}

impl FlakyEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: HashingProvider::default(),
            failing: AtomicBool::new(false),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl EmbeddingProvider for FlakyEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(VectorError::EmbeddingFailed("model offline".to_string()));
        }
        self.inner.embed_batch(texts)
    }

    fn dimension(&self) -> VectorDimension {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Content source handing out a fixed batch once.
pub struct QueuedSource {
    batch: Mutex<Vec<Article>>,
}

impl QueuedSource {
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            batch: Mutex::new(articles),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl ContentSource for QueuedSource {
    fn fetch_new_content(&self) -> IngestResult<Vec<Article>> {
        Ok(std::mem::take(&mut *self.batch.lock()))
    }
}

pub fn article(source_id: &str, url: &str, title: &str, content: &str) -> Article {
    Article {
        title: title.to_string(),
        url: url.to_string(),
        content: content.to_string(),
        published: "2024-03-02T15:00:00Z".to_string(),
        scraped_at: "2024-03-02T16:00:00Z".to_string(),
        relevance_score: 0.5,
        source: source_id.to_string(),
        source_id: source_id.to_string(),
    }
}

pub fn chunk(id: &str, content: &str) -> DocumentChunk {
    DocumentChunk::new(id, id, content, format!("{id}.md"), SourceType::Static, 0)
}

pub mod sample_docs {
    pub const DRS: &str = "# DRS\n\nThe drag reduction system opens a flap in the rear wing.\n\nIt can only be used inside designated zones on the straights.";

    pub const TYRES: &str = "# Tyres\n\nSoft compounds give more grip but wear quickly.\n\nHard compounds last longer and suit long stints.";

    pub const PIT_STOPS: &str = "# Pit stops\n\nA pit stop changes all four tyres in under three seconds.";
}
