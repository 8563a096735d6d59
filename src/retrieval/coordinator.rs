use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::{RetrievalConfig, Settings};
use crate::error::{RetrievalError, RetrievalResult};
use crate::index::{IndexInfo, SearchHit, VectorBackend, open_backend};
use crate::ingest::{ArticleStore, ContentNormalizer, DocumentStats};
use crate::retrieval::{AnswerSynthesizer, ContentSource, ExtractiveSynthesizer, format_context};
use crate::vector::EmbeddingProvider;

/// Lifecycle of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinatorState {
    Uninitialized,
    Ready,
    Updating,
}

/// Index and document statistics at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeBaseStats {
    pub index: IndexInfo,
    pub documents: DocumentStats,
    pub generated_at: String,
}

/// Holds `Updating` for its lifetime and returns the state to `Ready` on drop.
struct UpdateGuard<'a> {
    state: &'a Mutex<CoordinatorState>,
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = CoordinatorState::Ready;
    }
}

/// Wires the normalizer, the index and answer synthesis together.
pub struct RetrievalCoordinator {
    index: Arc<dyn VectorBackend>,
    normalizer: ContentNormalizer,
    store: ArticleStore,
    config: RetrievalConfig,
    synthesizer: Option<Arc<dyn AnswerSynthesizer>>,
    fallback: ExtractiveSynthesizer,
    state: Mutex<CoordinatorState>,
}

impl RetrievalCoordinator {
    /// Creates a coordinator and brings it to `Ready`.
    ///
    /// An index that is still empty after hydration is filled from the
    /// normalizer once. Failures during that cold start are logged and leave
    /// the index empty.
    pub fn new(
        index: Arc<dyn VectorBackend>,
        normalizer: ContentNormalizer,
        store: ArticleStore,
        config: RetrievalConfig,
    ) -> Self {
        let coordinator = Self::assemble(index, normalizer, store, config);
        coordinator.initialize();
        coordinator
    }

    /// Coordinator over the index, directories and retrieval settings in
    /// `settings`.
    pub fn from_settings(settings: &Settings, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let coordinator = Self::assemble_from_settings(settings, embedder);
        coordinator.initialize();
        coordinator
    }

    /// Like [`from_settings`](Self::from_settings) but `Ready` without the
    /// cold-start fill, for callers that call [`rebuild`](Self::rebuild)
    /// right away.
    pub fn for_rebuild(settings: &Settings, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let coordinator = Self::assemble_from_settings(settings, embedder);
        *coordinator.state.lock() = CoordinatorState::Ready;
        coordinator
    }

    fn assemble(
        index: Arc<dyn VectorBackend>,
        normalizer: ContentNormalizer,
        store: ArticleStore,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            index,
            normalizer,
            store,
            config,
            synthesizer: None,
            fallback: ExtractiveSynthesizer,
            state: Mutex::new(CoordinatorState::Uninitialized),
        }
    }

    fn assemble_from_settings(settings: &Settings, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let index = open_backend(settings, embedder);
        let normalizer = ContentNormalizer::from_settings(settings);
        let store = ArticleStore::new(settings.resolve_path(&settings.paths.online_content));
        Self::assemble(index, normalizer, store, settings.retrieval.clone())
    }

    /// Uses `synthesizer` for answers instead of the extractive fallback.
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn AnswerSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    fn initialize(&self) {
        if self.index.is_empty() {
            let chunks = self.normalizer.load_all();
            if chunks.is_empty() {
                tracing::info!(target: "retrieval", "no documents to index");
            } else {
                match self.index.add(chunks) {
                    Ok(count) => {
                        tracing::info!(target: "retrieval", "indexed {count} chunks on cold start")
                    }
                    Err(e) => {
                        tracing::error!(target: "retrieval", "failed to populate index: {e}")
                    }
                }
            }
        } else {
            tracing::info!(
                target: "retrieval",
                "index already holds {} chunks",
                self.index.entry_count()
            );
        }
        *self.state.lock() = CoordinatorState::Ready;
    }

    pub fn state(&self) -> CoordinatorState {
        *self.state.lock()
    }

    pub fn index(&self) -> &Arc<dyn VectorBackend> {
        &self.index
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// True when a generator other than the extractive fallback is set.
    pub fn has_generator(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// Moves to `Updating` unless an update already runs.
    fn begin_update(&self) -> Option<UpdateGuard<'_>> {
        let mut state = self.state.lock();
        if *state == CoordinatorState::Updating {
            return None;
        }
        *state = CoordinatorState::Updating;
        Some(UpdateGuard { state: &self.state })
    }

    /// Ranked hits with scores, below-threshold hits removed.
    pub fn search_with_source_info(&self, query: &str, k: usize) -> RetrievalResult<Vec<SearchHit>> {
        let mut hits = self.index.search(query, k)?;
        if let Some(threshold) = self.config.similarity_threshold {
            hits.retain(|hit| hit.score >= threshold);
        }
        Ok(hits)
    }

    /// Context block for `query`, or the no-match sentinel.
    ///
    /// Search errors are logged and reported as no match.
    pub fn retrieve_context(&self, query: &str, k: usize) -> String {
        match self.search_with_source_info(query, k) {
            Ok(hits) => format_context(&hits),
            Err(e) => {
                tracing::error!(target: "retrieval", "search failed: {e}");
                format_context(&[])
            }
        }
    }

    /// Answers `query` from the top `retrieval.top_k` chunks.
    pub fn answer(&self, query: &str) -> String {
        let context = self.retrieve_context(query, self.config.top_k);

        if let Some(synthesizer) = &self.synthesizer {
            match synthesizer.synthesize(query, &context) {
                Ok(answer) => return answer,
                Err(e) => tracing::warn!(
                    target: "retrieval",
                    "answer synthesis failed, using extractive answer: {e}"
                ),
            }
        }
        self.fallback.answer(&context)
    }

    /// Pulls new articles from `source`, stores them and rebuilds the index.
    ///
    /// Returns `false` when nothing new arrived, when another update is
    /// running, or on any error; the index then keeps its previous contents.
    /// The source is acknowledged only after the rebuild succeeds, so a failed
    /// refresh can be retried with the same batch.
    pub fn refresh(&self, source: &dyn ContentSource) -> bool {
        match self.try_refresh(source) {
            Ok(updated) => updated,
            Err(RetrievalError::UpdateInProgress) => {
                tracing::warn!(target: "retrieval", "refresh skipped: update already in progress");
                false
            }
            Err(e) => {
                tracing::error!(target: "retrieval", "refresh failed: {e}");
                false
            }
        }
    }

    /// [`refresh`](Self::refresh) with the failure cause kept.
    pub fn try_refresh(&self, source: &dyn ContentSource) -> RetrievalResult<bool> {
        let _guard = self.begin_update().ok_or(RetrievalError::UpdateInProgress)?;

        let articles = source.fetch_new_content()?;
        if articles.is_empty() {
            tracing::info!(target: "retrieval", "no new articles");
            return Ok(false);
        }

        let saved = self.store.save_articles(&articles)?;

        let chunks = self.normalizer.load_all();
        let count = self.index.rebuild(chunks)?;
        tracing::info!(
            target: "retrieval",
            "stored {saved} new articles, index now holds {count} chunks"
        );

        // Only a batch that reached the index is released from the source
        if let Err(e) = source.acknowledge() {
            tracing::warn!(target: "retrieval", "failed to acknowledge content source: {e}");
        }
        Ok(true)
    }

    /// Rebuilds the index from the current sources.
    pub fn rebuild(&self) -> RetrievalResult<usize> {
        let _guard = self.begin_update().ok_or(RetrievalError::UpdateInProgress)?;
        let chunks = self.normalizer.load_all();
        Ok(self.index.rebuild(chunks)?)
    }

    pub fn stats(&self) -> KnowledgeBaseStats {
        KnowledgeBaseStats {
            index: self.index.info(),
            documents: self.normalizer.stats(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
