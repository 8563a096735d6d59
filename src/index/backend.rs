use serde::{Deserialize, Serialize};

use crate::config::BackendKind;
use crate::error::IndexResult;
use crate::types::{ChunkMetadata, DocumentChunk, SourceType};

/// One stored chunk. Its embedding is the matrix row at the same position.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl IndexEntry {
    pub fn to_chunk(&self) -> DocumentChunk {
        DocumentChunk::from_parts(self.content.clone(), self.metadata.clone())
    }
}

impl From<DocumentChunk> for IndexEntry {
    fn from(chunk: DocumentChunk) -> Self {
        let (content, metadata) = chunk.into_parts();
        Self { content, metadata }
    }
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub chunk: DocumentChunk,
    /// Cosine similarity in `[-1, 1]`
    pub score: f32,
}

impl SearchHit {
    pub fn source_type(&self) -> SourceType {
        self.chunk.source_type
    }
}

/// Read-only summary of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub entry_count: usize,
    pub embedding_model: String,
    pub dimension: usize,
    pub backend: BackendKind,
}

/// Capability set shared by every index backend.
///
/// All methods take `&self`; implementations synchronize internally so a
/// backend can be shared as `Arc<dyn VectorBackend>`.
pub trait VectorBackend: Send + Sync {
    /// Embeds and appends `chunks`, returning how many were added.
    ///
    /// On an embedding failure nothing is appended.
    fn add(&self, chunks: Vec<DocumentChunk>) -> IndexResult<usize>;

    /// Top `k` chunks by cosine similarity to `query`, best first.
    ///
    /// Equal scores keep insertion order. An empty index or `k == 0` yields
    /// no hits without embedding the query.
    fn search(&self, query: &str, k: usize) -> IndexResult<Vec<SearchHit>>;

    /// Drops every entry. Idempotent.
    fn clear(&self) -> IndexResult<()>;

    fn info(&self) -> IndexInfo;

    /// Replaces the whole contents with `chunks`.
    ///
    /// All chunks are embedded before anything is touched; if embedding
    /// fails the previous contents survive unchanged.
    fn rebuild(&self, chunks: Vec<DocumentChunk>) -> IndexResult<usize>;

    fn entry_count(&self) -> usize {
        self.info().entry_count
    }

    fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }
}
