//! Embeddings and the dense matrix that holds them.
//!
//! # Architecture
//! Providers turn chunk text into vectors; the index keeps those vectors in an
//! [`EmbeddingMatrix`] whose rows line up with its entries. Ranking is a
//! brute-force cosine scan over every row.

mod embedding;
mod matrix;
mod similarity;
mod types;

pub use embedding::{
    EmbeddingProvider, FastEmbedProvider, HashingProvider, create_provider, parse_embedding_model,
};
pub use matrix::{EmbeddingMatrix, MATRIX_VERSION, read_matrix, write_matrix};
pub use similarity::{cosine_similarity, l2_normalize};
pub use types::{VECTOR_DIMENSION_384, VectorDimension, VectorError};
