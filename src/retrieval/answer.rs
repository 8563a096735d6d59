//! Answer synthesis from retrieved context.

use crate::error::RetrievalError;
use crate::retrieval::context::is_empty_context;

/// Reply used when retrieval found nothing.
pub const NO_INFORMATION_ANSWER: &str = "I don't have specific information about that topic in my knowledge base. Try rephrasing the question or asking about a topic covered by the indexed documents.";

/// Reply used when the context has sources but no usable text.
pub const UNCLEAR_ANSWER: &str = "I found some information but couldn't extract a clear answer. Please try rephrasing your question.";

const ANSWER_PREFIX: &str = "Based on my knowledge base: ";

/// Lines of context quoted by the extractive answer.
const EXTRACTED_LINES: usize = 3;

/// Turns a query and its retrieved context into an answer.
///
/// Implementations wrap a language model or any other generator. The context
/// is either the no-match sentinel or the formatted retrieval blocks.
pub trait AnswerSynthesizer: Send + Sync {
    fn synthesize(&self, query: &str, context: &str) -> Result<String, RetrievalError>;
}

/// Answers by quoting the first lines of retrieved text.
///
/// This is the fallback used when no generator is configured or the
/// configured one fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveSynthesizer;

impl ExtractiveSynthesizer {
    pub fn answer(&self, context: &str) -> String {
        if is_empty_context(context) {
            return NO_INFORMATION_ANSWER.to_string();
        }

        let lines: Vec<&str> = context
            .lines()
            .filter(|line| !line.trim().is_empty() && !line.starts_with("Source:"))
            .take(EXTRACTED_LINES)
            .collect();

        if lines.is_empty() {
            UNCLEAR_ANSWER.to_string()
        } else {
            format!("{ANSWER_PREFIX}{}", lines.join(" "))
        }
    }
}

impl AnswerSynthesizer for ExtractiveSynthesizer {
    fn synthesize(&self, _query: &str, context: &str) -> Result<String, RetrievalError> {
        Ok(self.answer(context))
    }
}
