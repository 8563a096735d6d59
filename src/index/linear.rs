//! Brute-force cosine index.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockWriteGuard};

use crate::config::BackendKind;
use crate::error::IndexResult;
use crate::index::{IndexEntry, IndexInfo, IndexPersistence, SearchHit, VectorBackend};
use crate::types::DocumentChunk;
use crate::vector::{
    EmbeddingMatrix, EmbeddingProvider, VectorDimension, VectorError, cosine_similarity,
};

/// Entries and their embedding rows. `matrix.row_count() == entries.len()`
/// holds whenever the lock is released.
#[derive(Debug)]
struct IndexState {
    entries: Vec<IndexEntry>,
    matrix: EmbeddingMatrix,
}

impl IndexState {
    fn empty(dimension: VectorDimension) -> Self {
        Self {
            entries: Vec::new(),
            matrix: EmbeddingMatrix::new(dimension),
        }
    }
}

/// Linear-scan vector index, optionally persisted to a directory.
pub struct LinearIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    state: RwLock<IndexState>,
    persistence: Option<IndexPersistence>,
}

impl LinearIndex {
    /// Index that lives only in memory.
    pub fn in_memory(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let state = IndexState::empty(embedder.dimension());
        Self {
            embedder,
            state: RwLock::new(state),
            persistence: None,
        }
    }

    /// Index persisted under `path`, hydrated from it when possible.
    ///
    /// Artifacts that are missing, unreadable, inconsistent or built with a
    /// different model are ignored and the index starts empty.
    pub fn open(path: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let persistence = IndexPersistence::new(path);
        let dimension = embedder.dimension();

        let state = match persistence.load(embedder.model_name(), dimension.get()) {
            Ok(Some((entries, matrix))) => {
                tracing::info!(
                    target: "index",
                    "loaded {} entries from {}",
                    entries.len(),
                    persistence.base_path().display()
                );
                IndexState { entries, matrix }
            }
            Ok(None) => {
                tracing::debug!(
                    target: "index",
                    "no saved index at {}",
                    persistence.base_path().display()
                );
                IndexState::empty(dimension)
            }
            Err(e) => {
                tracing::warn!(
                    target: "index",
                    "ignoring saved index at {}: {e}",
                    persistence.base_path().display()
                );
                IndexState::empty(dimension)
            }
        };

        Self {
            embedder,
            state: RwLock::new(state),
            persistence: Some(persistence),
        }
    }

    pub fn persistence(&self) -> Option<&IndexPersistence> {
        self.persistence.as_ref()
    }

    /// Rows currently held by the embedding matrix.
    pub fn matrix_row_count(&self) -> usize {
        self.state.read().matrix.row_count()
    }

    /// Embeds chunk contents, checking one vector per chunk of the right width.
    fn embed_chunks(&self, chunks: &[DocumentChunk]) -> IndexResult<Vec<Vec<f32>>> {
        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;

        if embeddings.len() != texts.len() {
            return Err(VectorError::BatchLengthMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            }
            .into());
        }
        let dimension = self.embedder.dimension();
        for embedding in &embeddings {
            dimension.validate_vector(embedding)?;
        }

        Ok(embeddings)
    }

    /// Writes the state to disk. Failures are logged; memory stays authoritative.
    fn persist(&self, guard: RwLockWriteGuard<'_, IndexState>) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let state = RwLockWriteGuard::downgrade(guard);
        if let Err(e) = persistence.save(self.embedder.model_name(), &state.entries, &state.matrix)
        {
            tracing::warn!(target: "index", "failed to persist index: {e}");
        }
    }

    fn backend_kind(&self) -> BackendKind {
        if self.persistence.is_some() {
            BackendKind::Linear
        } else {
            BackendKind::Memory
        }
    }
}

impl VectorBackend for LinearIndex {
    fn add(&self, chunks: Vec<DocumentChunk>) -> IndexResult<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embed_chunks(&chunks)?;
        let added = chunks.len();

        let mut state = self.state.write();
        state.matrix.push_rows(&embeddings)?;
        state.entries.extend(chunks.into_iter().map(IndexEntry::from));
        tracing::debug!(target: "index", "added {added} entries ({} total)", state.entries.len());

        self.persist(state);
        Ok(added)
    }

    fn search(&self, query: &str, k: usize) -> IndexResult<Vec<SearchHit>> {
        if k == 0 || self.state.read().entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query)?;
        self.embedder.dimension().validate_vector(&query_embedding)?;

        let state = self.state.read();
        let hits = rank(&state.matrix, &query_embedding, k)
            .into_iter()
            .filter_map(|(position, score)| {
                state.entries.get(position).map(|entry| SearchHit {
                    chunk: entry.to_chunk(),
                    score,
                })
            })
            .collect();

        Ok(hits)
    }

    fn clear(&self) -> IndexResult<()> {
        let mut state = self.state.write();
        *state = IndexState::empty(self.embedder.dimension());
        self.persist(state);
        Ok(())
    }

    fn info(&self) -> IndexInfo {
        IndexInfo {
            entry_count: self.state.read().entries.len(),
            embedding_model: self.embedder.model_name().to_string(),
            dimension: self.embedder.dimension().get(),
            backend: self.backend_kind(),
        }
    }

    fn rebuild(&self, chunks: Vec<DocumentChunk>) -> IndexResult<usize> {
        let embeddings = self.embed_chunks(&chunks)?;
        let matrix = EmbeddingMatrix::from_rows(self.embedder.dimension(), &embeddings)?;
        let entries: Vec<IndexEntry> = chunks.into_iter().map(IndexEntry::from).collect();
        let count = entries.len();

        let mut state = self.state.write();
        *state = IndexState { entries, matrix };
        tracing::info!(target: "index", "rebuilt index with {count} entries");

        self.persist(state);
        Ok(count)
    }
}

/// Positions and scores of the `k` rows most similar to `query`.
///
/// The sort is stable, so rows with equal scores stay in insertion order.
fn rank(matrix: &EmbeddingMatrix, query: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = matrix
        .rows()
        .enumerate()
        .map(|(position, row)| (position, cosine_similarity(query, row)))
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(k);
    scored
}
