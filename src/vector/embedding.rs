//! Embedding providers.
//!
//! An [`EmbeddingProvider`] maps text to fixed-width dense vectors. Providers
//! are constructed explicitly and handed to the index as
//! `Arc<dyn EmbeddingProvider>`; nothing here is a process-wide singleton.
//!
//! Two implementations ship with the crate:
//! - [`FastEmbedProvider`] runs a local ONNX sentence-embedding model through
//!   `fastembed` (all-MiniLM-L6-v2 by default, 384 dimensions).
//! - [`HashingProvider`] is a deterministic feature-hashing bag-of-words
//!   embedding. It needs no model download, which makes it the offline choice
//!   and the provider used throughout the test suite.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use sha2::{Digest, Sha256};

use crate::config::{EmbeddingConfig, ProviderKind};
use crate::vector::similarity::l2_normalize;
use crate::vector::{VectorDimension, VectorError};

/// Trait for turning text into embedding vectors.
///
/// Implementations must be thread-safe; the index calls them from whichever
/// thread issues an `add`, `rebuild` or `search`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a batch of texts.
    ///
    /// Returns exactly one vector per input, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError>;

    /// Embeds a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or(VectorError::BatchLengthMismatch {
                expected: 1,
                actual: 0,
            })
    }

    /// Width of every vector this provider returns.
    #[must_use]
    fn dimension(&self) -> VectorDimension;

    /// Identifier persisted next to the index so vectors from different
    /// models are never mixed.
    #[must_use]
    fn model_name(&self) -> &str;
}

/// Builds the provider described by the `[embedding]` settings section.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>, VectorError> {
    match config.provider {
        ProviderKind::FastEmbed => {
            let provider = FastEmbedProvider::new(
                &config.model,
                config.cache_dir.clone(),
                config.batch_size,
                false,
            )?;
            Ok(Arc::new(provider))
        }
        ProviderKind::Hashing => {
            let dimension = VectorDimension::new(config.dimension)?;
            Ok(Arc::new(HashingProvider::new(dimension)))
        }
    }
}

/// Resolves a configured model name to a fastembed model.
///
/// Accepts both the enum spelling (`AllMiniLML6V2`) and the hub spelling
/// (`all-MiniLM-L6-v2`), case-insensitively.
pub fn parse_embedding_model(name: &str) -> Result<EmbeddingModel, VectorError> {
    let key: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    let model = match key.as_str() {
        "allminilml6v2" => EmbeddingModel::AllMiniLML6V2,
        "allminilml12v2" => EmbeddingModel::AllMiniLML12V2,
        "bgesmallenv15" => EmbeddingModel::BGESmallENV15,
        "bgebaseenv15" => EmbeddingModel::BGEBaseENV15,
        "multilinguale5small" => EmbeddingModel::MultilingualE5Small,
        _ => return Err(VectorError::UnknownModel(name.to_string())),
    };
    Ok(model)
}

/// fastembed-backed provider.
///
/// The model output width is measured once at construction, so any of the
/// supported models can be configured without a dimension table.
pub struct FastEmbedProvider {
    model: Mutex<TextEmbedding>,
    dimension: VectorDimension,
    model_name: String,
    batch_size: usize,
}

impl FastEmbedProvider {
    /// Loads (downloading on first use) the named model into `cache_dir`.
    ///
    /// # Errors
    /// Returns an error if the name is unknown or the model fails to
    /// initialize or download.
    pub fn new(
        model_name: &str,
        cache_dir: PathBuf,
        batch_size: usize,
        show_download_progress: bool,
    ) -> Result<Self, VectorError> {
        let model = parse_embedding_model(model_name)?;

        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(show_download_progress),
        )
        .map_err(|e| VectorError::EmbeddingFailed(
            format!("Failed to initialize embedding model: {e}. Ensure you have internet connection for first-time model download")
        ))?;

        let sample = text_model
            .embed(vec!["dimension check"], None)
            .map_err(|e| VectorError::EmbeddingFailed(format!("Failed to measure model output: {e}")))?;
        let width = sample.first().map(Vec::len).unwrap_or_default();
        let dimension = VectorDimension::new(width)?;

        tracing::debug!(
            target: "embedding",
            "loaded fastembed model {model_name} ({dimension} dimensions)"
        );

        Ok(Self {
            model: Mutex::new(text_model),
            dimension,
            model_name: model_name.to_string(),
            batch_size: batch_size.max(1),
        })
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let text_strings: Vec<String> = texts.iter().map(|&s| s.to_string()).collect();

        let embeddings = self
            .model
            .lock()
            .map_err(|_| {
                VectorError::EmbeddingFailed(
                    "Failed to acquire embedding model lock - model may be poisoned".to_string(),
                )
            })?
            .embed(text_strings, Some(self.batch_size))
            .map_err(|e| {
                VectorError::EmbeddingFailed(format!("Failed to generate embeddings: {e}"))
            })?;

        if embeddings.len() != texts.len() {
            return Err(VectorError::BatchLengthMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }
        for embedding in &embeddings {
            self.dimension.validate_vector(embedding)?;
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Deterministic feature-hashing embedding.
///
/// Each lowercase alphanumeric token is hashed with SHA-256; the digest picks
/// a bucket and a sign. The resulting term-count vector is L2-normalized.
/// Texts sharing vocabulary score high under cosine similarity, identical
/// texts score exactly 1.0, and the output never changes between runs or
/// platforms.
#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimension: VectorDimension,
    model_name: String,
}

impl HashingProvider {
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            dimension,
            model_name: format!("hashing-{dimension}"),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let width = self.dimension.get();
        let mut vector = vec![0.0f32; width];

        for token in tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % width as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashingProvider {
    fn default() -> Self {
        Self::new(VectorDimension::dimension_384())
    }
}

impl EmbeddingProvider for HashingProvider {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}
