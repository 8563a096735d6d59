//! Retrieval engine for a question-answering knowledge base.
//!
//! Static documents and fetched articles are chunked by paragraph, embedded,
//! and kept in a vector index that is searched by cosine similarity. The
//! [`RetrievalCoordinator`] ties ingestion, indexing and answer synthesis
//! together.

pub mod chunking;
pub mod config;
pub mod display;
pub mod error;
pub mod index;
pub mod ingest;
pub mod logging;
pub mod retrieval;
pub mod types;
pub mod vector;

pub use config::Settings;
pub use error::{
    IndexError, IndexResult, IngestError, IngestResult, RetrievalError, RetrievalResult,
};
pub use index::{IndexInfo, LinearIndex, SearchHit, VectorBackend};
pub use ingest::{ArticleStore, ContentNormalizer, DocumentStats};
pub use retrieval::{
    AnswerSynthesizer, ContentSource, ExtractiveSynthesizer, JsonFileSource, RetrievalCoordinator,
};
pub use types::{Article, ChunkMetadata, DocumentChunk, SourceType};
pub use vector::{EmbeddingProvider, FastEmbedProvider, HashingProvider};
