//! Vector index: chunk storage plus nearest-neighbour search.
//!
//! Every backend implements [`VectorBackend`]. The shipped backend is a
//! [`LinearIndex`], which scores the query against every stored row; it runs
//! either persisted to disk (`linear`) or purely in memory (`memory`).

mod backend;
mod linear;
mod persistence;

use std::sync::Arc;

pub use backend::{IndexEntry, IndexInfo, SearchHit, VectorBackend};
pub use linear::LinearIndex;
pub use persistence::{IndexPersistence, MATRIX_FILE, RECORD_FILE};

use crate::config::{BackendKind, Settings};
use crate::vector::EmbeddingProvider;

/// Opens the backend selected by `index.backend`.
pub fn open_backend(
    settings: &Settings,
    embedder: Arc<dyn EmbeddingProvider>,
) -> Arc<dyn VectorBackend> {
    match settings.index.backend {
        BackendKind::Linear => {
            let path = settings.resolve_path(&settings.index.path);
            Arc::new(LinearIndex::open(path, embedder))
        }
        BackendKind::Memory => Arc::new(LinearIndex::in_memory(embedder)),
    }
}
