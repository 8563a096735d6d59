//! Retrieval coordination.
//!
//! The [`RetrievalCoordinator`] owns the flow from source documents to
//! answers: it fills the index on cold start, rebuilds it when new articles
//! arrive and turns search hits into the context an [`AnswerSynthesizer`]
//! consumes.

mod answer;
mod context;
mod coordinator;
mod source;

pub use answer::{AnswerSynthesizer, ExtractiveSynthesizer, NO_INFORMATION_ANSWER, UNCLEAR_ANSWER};
pub use context::{NO_RELEVANT_INFORMATION, format_context, is_empty_context};
pub use coordinator::{CoordinatorState, KnowledgeBaseStats, RetrievalCoordinator};
pub use source::{ContentSource, JsonFileSource};
