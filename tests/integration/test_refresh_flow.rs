//! End-to-end flow through the retrieval coordinator.

use std::fs;

use knowbase::retrieval::{
    CoordinatorState, JsonFileSource, NO_RELEVANT_INFORMATION, RetrievalCoordinator,
};
use knowbase::types::SourceType;

use crate::common::{FlakyEmbedder, QueuedSource, TestKnowledgeBase, article, hashing, sample_docs};

fn seeded() -> TestKnowledgeBase {
    let kb = TestKnowledgeBase::new();
    kb.add_document("drs.md", sample_docs::DRS);
    kb.add_document("tyres.md", sample_docs::TYRES);
    kb.add_document("pits.md", sample_docs::PIT_STOPS);
    kb
}

#[test]
fn test_refresh_with_no_items_changes_nothing() {
    let kb = seeded();
    let coordinator = kb.coordinator(hashing());
    let before = coordinator.index().entry_count();

    assert!(!coordinator.refresh(&QueuedSource::empty()));
    assert_eq!(coordinator.index().entry_count(), before);
    assert!(!kb.online_dir().join("metadata.json").exists());
}

#[test]
fn test_refresh_with_articles_rebuilds_index() {
    let kb = seeded();
    let coordinator = kb.coordinator(hashing());
    assert_eq!(coordinator.index().entry_count(), 3);

    let source = QueuedSource::new(vec![
        article(
            "paddock",
            "https://paddock.example/engine",
            "Engine",
            "The new power unit delivers more electrical energy per lap.",
        ),
        article("paddock", "https://paddock.example/blank", "Blank", ""),
    ]);
    assert!(coordinator.refresh(&source));
    assert_eq!(coordinator.state(), CoordinatorState::Ready);
    assert_eq!(coordinator.index().entry_count(), 4);

    let hits = coordinator
        .search_with_source_info("power unit electrical energy", 1)
        .unwrap();
    assert_eq!(hits[0].source_type(), SourceType::Online);
    assert_eq!(hits[0].chunk.title, "Engine");

    // The batch was taken; a second refresh finds nothing new.
    assert!(!coordinator.refresh(&source));
    assert_eq!(coordinator.index().entry_count(), 4);
}

#[test]
fn test_failed_rebuild_keeps_last_good_index() {
    let kb = seeded();
    let embedder = FlakyEmbedder::new();
    let coordinator = kb.coordinator(embedder.clone());
    assert_eq!(coordinator.index().entry_count(), 3);

    embedder.set_failing(true);
    let source = QueuedSource::new(vec![article(
        "paddock",
        "https://paddock.example/1",
        "One",
        "Fresh story.",
    )]);
    assert!(!coordinator.refresh(&source));
    assert_eq!(coordinator.state(), CoordinatorState::Ready);

    embedder.set_failing(false);
    assert_eq!(coordinator.index().entry_count(), 3);
    assert!(coordinator.retrieve_context("drag reduction", 1).contains("Source: DRS"));
}

#[test]
fn test_inbox_is_drained_after_refresh() {
    let kb = seeded();
    let coordinator = kb.coordinator(hashing());
    let inbox = kb.path().join("inbox.json");
    fs::write(
        &inbox,
        r#"[{"title": "Radio", "url": "https://pitwall.example/1", "content": "Box this lap for hards.", "sourceId": "pitwall"}]"#,
    )
    .unwrap();

    let source = JsonFileSource::new(&inbox).draining(true);
    assert!(coordinator.refresh(&source));
    assert!(!inbox.exists());
    assert!(kb.online_dir().join("pitwall_articles.json").exists());
    assert_eq!(coordinator.index().entry_count(), 4);

    assert!(!coordinator.refresh(&source));
}

#[test]
fn test_context_and_answer_from_static_documents() {
    let kb = seeded();
    let coordinator = kb.coordinator(hashing());

    let context = coordinator.retrieve_context("drag reduction flap rear wing", 1);
    assert!(context.starts_with("Source: DRS\nThe drag reduction system"));
    assert!(context.ends_with('\n'));

    let answer = coordinator.answer("drag reduction flap rear wing");
    assert!(answer.starts_with("Based on my knowledge base: "));
    assert!(!coordinator.has_generator());
}

#[test]
fn test_empty_knowledge_base_gives_sentinel() {
    let kb = TestKnowledgeBase::new();
    let coordinator = kb.coordinator(hashing());

    assert_eq!(coordinator.index().entry_count(), 0);
    assert_eq!(
        coordinator.retrieve_context("anything at all", 3),
        NO_RELEVANT_INFORMATION
    );
}

#[test]
fn test_persisted_index_skips_cold_start() {
    let kb = seeded();
    let settings = kb.settings();

    let first = RetrievalCoordinator::from_settings(&settings, hashing());
    assert_eq!(first.index().entry_count(), 3);
    drop(first);

    // New documents are not picked up until a rebuild.
    kb.add_document("fuel.md", "# Fuel\n\nCars carry up to one hundred kilograms.");
    let second = RetrievalCoordinator::from_settings(&settings, hashing());
    assert_eq!(second.index().entry_count(), 3);

    assert_eq!(second.rebuild().unwrap(), 4);
    let stats = second.stats();
    assert_eq!(stats.index.entry_count, 4);
    assert_eq!(stats.documents.static_documents, 4);
}

#[test]
fn test_failed_refresh_keeps_inbox_for_retry() {
    let kb = seeded();
    let embedder = FlakyEmbedder::new();
    let coordinator = kb.coordinator(embedder.clone());
    let inbox = kb.path().join("inbox.json");
    fs::write(
        &inbox,
        r#"[{"title": "Engine", "url": "https://paddock.example/engine", "content": "The new power unit delivers more electrical energy per lap.", "sourceId": "paddock"}]"#,
    )
    .unwrap();
    let source = JsonFileSource::new(&inbox).draining(true);

    embedder.set_failing(true);
    assert!(!coordinator.refresh(&source));
    assert!(inbox.exists());
    assert_eq!(coordinator.index().entry_count(), 3);

    embedder.set_failing(false);
    assert!(coordinator.refresh(&source));
    assert!(!inbox.exists());
    assert_eq!(coordinator.index().entry_count(), 4);

    let hits = coordinator
        .search_with_source_info("power unit electrical energy", 1)
        .unwrap();
    assert_eq!(hits[0].source_type(), SourceType::Online);
    assert_eq!(
        kb.store().load_source("paddock").unwrap().len(),
        1,
        "retried batch is merged, not duplicated"
    );
}
