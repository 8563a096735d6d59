//! Search and mutation properties of the linear index.

use knowbase::index::{LinearIndex, VectorBackend};

use crate::common::{FlakyEmbedder, chunk, hashing};

fn sample_chunks() -> Vec<knowbase::DocumentChunk> {
    vec![
        chunk("drs", "The drag reduction system opens a flap in the rear wing"),
        chunk("tyres", "Soft compounds give more grip but wear quickly"),
        chunk("pits", "A pit stop changes all four tyres in under three seconds"),
        chunk("fuel", "Cars start the race carrying up to one hundred kilograms of fuel"),
    ]
}

#[test]
fn test_every_chunk_is_its_own_top_hit() {
    let index = LinearIndex::in_memory(hashing());
    let chunks = sample_chunks();
    index.add(chunks.clone()).unwrap();

    for chunk in &chunks {
        let hits = index.search(&chunk.content, 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, chunk.id);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
    }
}

#[test]
fn test_clear_is_idempotent() {
    let index = LinearIndex::in_memory(hashing());
    index.add(sample_chunks()).unwrap();

    index.clear().unwrap();
    assert_eq!(index.entry_count(), 0);
    index.clear().unwrap();
    assert_eq!(index.entry_count(), 0);
    assert_eq!(index.info().entry_count, 0);
}

#[test]
fn test_row_count_tracks_entries() {
    let index = LinearIndex::in_memory(hashing());
    let check = |index: &LinearIndex| assert_eq!(index.matrix_row_count(), index.entry_count());

    check(&index);
    index.add(sample_chunks()).unwrap();
    check(&index);
    index.add(vec![chunk("extra", "Safety car period")]).unwrap();
    check(&index);
    assert_eq!(index.entry_count(), 5);
    index.clear().unwrap();
    check(&index);
    index.add(sample_chunks()).unwrap();
    check(&index);
}

#[test]
fn test_empty_index_search_is_empty() {
    let embedder = FlakyEmbedder::new();
    embedder.set_failing(true);
    let index = LinearIndex::in_memory(embedder);

    // The query is never embedded, so the failing embedder is not reached.
    assert!(index.search("anything", 3).unwrap().is_empty());
}

#[test]
fn test_k_is_clamped_to_entry_count() {
    let index = LinearIndex::in_memory(hashing());
    index.add(sample_chunks()).unwrap();

    assert_eq!(index.search("rear wing flap", 10).unwrap().len(), 4);
    assert_eq!(index.search("rear wing flap", 2).unwrap().len(), 2);
    assert!(index.search("rear wing flap", 0).unwrap().is_empty());
}

#[test]
fn test_hits_are_sorted_by_score() {
    let index = LinearIndex::in_memory(hashing());
    index.add(sample_chunks()).unwrap();

    let hits = index.search("soft tyres wear quickly", 4).unwrap();
    assert_eq!(hits[0].chunk.id, "tyres");
    assert!(hits.windows(2).all(|pair| pair[0].score >= pair[1].score));
}

#[test]
fn test_equal_scores_keep_insertion_order() {
    let index = LinearIndex::in_memory(hashing());
    index
        .add(vec![
            chunk("first", "identical body text"),
            chunk("second", "identical body text"),
            chunk("third", "identical body text"),
        ])
        .unwrap();

    let ids: Vec<String> = index
        .search("identical body text", 3)
        .unwrap()
        .into_iter()
        .map(|hit| hit.chunk.id)
        .collect();
    assert_eq!(ids, ["first", "second", "third"]);
}

#[test]
fn test_failed_add_leaves_index_unchanged() {
    let embedder = FlakyEmbedder::new();
    let index = LinearIndex::in_memory(embedder.clone());
    index.add(sample_chunks()).unwrap();

    embedder.set_failing(true);
    assert!(index.add(vec![chunk("late", "Late addition")]).is_err());
    assert_eq!(index.entry_count(), 4);
    assert_eq!(index.matrix_row_count(), 4);
}

#[test]
fn test_failed_rebuild_keeps_previous_contents() {
    let embedder = FlakyEmbedder::new();
    let index = LinearIndex::in_memory(embedder.clone());
    index.add(sample_chunks()).unwrap();

    embedder.set_failing(true);
    assert!(index.rebuild(vec![chunk("only", "Replacement")]).is_err());

    embedder.set_failing(false);
    assert_eq!(index.entry_count(), 4);
    let hits = index.search("drag reduction rear wing", 1).unwrap();
    assert_eq!(hits[0].chunk.id, "drs");
}

#[test]
fn test_rebuild_replaces_contents() {
    let index = LinearIndex::in_memory(hashing());
    index.add(sample_chunks()).unwrap();

    assert_eq!(index.rebuild(vec![chunk("only", "Replacement text")]).unwrap(), 1);
    assert_eq!(index.entry_count(), 1);
    assert_eq!(index.search("Replacement", 5).unwrap()[0].chunk.id, "only");
}
