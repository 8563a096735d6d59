use crate::index::SearchHit;

/// Context returned when a query matches nothing.
pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found in the knowledge base.";

/// Joins hits into the context handed to an answer synthesizer.
///
/// Each hit becomes `Source: <title>\n<content>\n`; blocks are joined with a
/// newline. No hits gives [`NO_RELEVANT_INFORMATION`].
pub fn format_context(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RELEVANT_INFORMATION.to_string();
    }

    hits.iter()
        .map(|hit| format!("Source: {}\n{}\n", hit.chunk.title, hit.chunk.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// True for the no-match sentinel or blank context.
pub fn is_empty_context(context: &str) -> bool {
    context.trim().is_empty() || context.contains(NO_RELEVANT_INFORMATION)
}
