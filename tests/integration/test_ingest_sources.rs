//! Static documents, online collections and the article store.

use knowbase::ingest::{DocumentStats, METADATA_FILE};
use knowbase::types::SourceType;

use crate::common::{TestKnowledgeBase, article, sample_docs};

#[test]
fn test_empty_article_contributes_no_chunks() {
    let kb = TestKnowledgeBase::new();
    kb.add_collection(
        "blank",
        &[article("blank", "https://blank.example/1", "Nothing", "")],
    );

    assert!(kb.normalizer().load_all().is_empty());
    assert_eq!(kb.normalizer().stats().online_documents, 0);
}

#[test]
fn test_online_chunks_carry_provenance() {
    let kb = TestKnowledgeBase::new();
    kb.add_collection(
        "paddock",
        &[article(
            "paddock",
            "https://paddock.example/upgrade",
            "Upgrade",
            "The team brought a new floor.\n\nIt adds downforce in slow corners.",
        )],
    );

    let chunks = kb.normalizer().load_all();
    assert_eq!(chunks.len(), 1);
    let chunk = &chunks[0];
    assert_eq!(chunk.source_type, SourceType::Online);
    assert_eq!(chunk.source, "https://paddock.example/upgrade");
    assert_eq!(chunk.source_name.as_deref(), Some("paddock"));
    assert_eq!(chunk.published_at.as_deref(), Some("2024-03-02T15:00:00Z"));
    assert_eq!(chunk.relevance_score, Some(0.5));
    assert!(chunk.id.starts_with("online_paddock_"));
    assert!(chunk.id.ends_with("_0"));
}

#[test]
fn test_malformed_collection_is_skipped() {
    let kb = TestKnowledgeBase::new();
    kb.add_document("drs.md", sample_docs::DRS);
    std::fs::write(kb.online_dir().join("broken_articles.json"), "[{").unwrap();

    let chunks = kb.normalizer().load_all();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].title, "DRS");
}

#[test]
fn test_stats_count_source_documents() {
    let kb = TestKnowledgeBase::new();
    kb.add_document("drs.md", sample_docs::DRS);
    kb.add_document("tyres.md", sample_docs::TYRES);
    kb.add_document("notes.txt", "ignored extension");
    kb.add_collection(
        "paddock",
        &[
            article("paddock", "https://paddock.example/1", "One", "First story."),
            article("paddock", "https://paddock.example/2", "Two", "  "),
        ],
    );

    assert_eq!(
        kb.normalizer().stats(),
        DocumentStats {
            total_documents: 3,
            static_documents: 2,
            online_documents: 1,
            static_sources: 2,
            online_sources: 1,
            total_chunks: 3,
        }
    );
}

#[test]
fn test_store_merges_by_url_and_writes_sidecar() {
    let kb = TestKnowledgeBase::new();
    let store = kb.store();

    store
        .save_articles(&[
            article("paddock", "https://paddock.example/1", "One", "Old text."),
            article("paddock", "https://paddock.example/2", "Two", "Second story."),
        ])
        .unwrap();
    let saved = store
        .save_articles(&[
            article("paddock", "https://paddock.example/1", "One", "Corrected text."),
            article("pit wall", "https://pitwall.example/1", "Radio", "Box this lap."),
        ])
        .unwrap();
    assert_eq!(saved, 2);

    let paddock = store.load_source("paddock").unwrap();
    assert_eq!(paddock.len(), 2);
    assert_eq!(paddock[0].content, "Corrected text.");
    assert_eq!(paddock[1].url, "https://paddock.example/2");

    assert!(kb.online_dir().join("pit_wall_articles.json").exists());
    assert!(kb.online_dir().join(METADATA_FILE).exists());

    let update = store.last_update().unwrap().unwrap();
    assert_eq!(update.total_articles, 2);
    assert_eq!(update.sources, ["paddock", "pit_wall"]);
    assert_eq!(update.articles_by_source.get("pit_wall"), Some(&1));
}

#[test]
fn test_stored_articles_are_loaded_by_normalizer() {
    let kb = TestKnowledgeBase::new();
    kb.store()
        .save_articles(&[article(
            "paddock",
            "https://paddock.example/1",
            "One",
            "Stored story.",
        )])
        .unwrap();

    let chunks = kb.normalizer().load_all();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].source_name.as_deref(), Some("paddock"));
}
