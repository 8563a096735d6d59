use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::chunking::Chunker;
use crate::config::Settings;
use crate::ingest::{OnlineArticleLoader, StaticDocumentLoader};
use crate::types::DocumentChunk;

/// Document counts gathered from a fresh pass over both backends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub total_documents: usize,
    pub static_documents: usize,
    pub online_documents: usize,
    pub static_sources: usize,
    pub online_sources: usize,
    pub total_chunks: usize,
}

/// Produces one uniform chunk stream from static documents and online
/// article collections.
#[derive(Debug, Clone)]
pub struct ContentNormalizer {
    knowledge_base: PathBuf,
    online_content: PathBuf,
    static_extensions: Vec<String>,
    chunker: Chunker,
}

impl ContentNormalizer {
    pub fn new(
        knowledge_base: impl Into<PathBuf>,
        online_content: impl Into<PathBuf>,
        chunker: Chunker,
    ) -> Self {
        Self {
            knowledge_base: knowledge_base.into(),
            online_content: online_content.into(),
            static_extensions: vec!["md".to_string()],
            chunker,
        }
    }

    /// Normalizer over the directories and chunk bounds in `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            knowledge_base: settings.resolve_path(&settings.paths.knowledge_base),
            online_content: settings.resolve_path(&settings.paths.online_content),
            static_extensions: settings.paths.static_extensions.clone(),
            chunker: Chunker::new(settings.chunking.clone()),
        }
    }

    fn static_loader(&self) -> StaticDocumentLoader<'_> {
        StaticDocumentLoader::new(&self.knowledge_base, &self.static_extensions, &self.chunker)
    }

    fn online_loader(&self) -> OnlineArticleLoader<'_> {
        OnlineArticleLoader::new(&self.online_content, &self.chunker)
    }

    /// Every chunk from both backends, static documents first.
    pub fn load_all(&self) -> Vec<DocumentChunk> {
        let mut chunks = self.static_loader().load().chunks;
        chunks.extend(self.online_loader().load().chunks);

        tracing::info!(target: "ingest", "normalized {} chunks", chunks.len());
        chunks
    }

    pub fn stats(&self) -> DocumentStats {
        let statics = self.static_loader().load();
        let online = self.online_loader().load();

        DocumentStats {
            total_documents: statics.documents + online.documents,
            static_documents: statics.documents,
            online_documents: online.documents,
            static_sources: statics.sources.len(),
            online_sources: online.sources.len(),
            total_chunks: statics.chunks.len() + online.chunks.len(),
        }
    }
}
