//! Defaults, TOML file and `KB_` environment layering.

use knowbase::Settings;
use knowbase::config::{BackendKind, ProviderKind};
use tempfile::TempDir;

#[test]
fn test_file_and_env_layer_over_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(
        &path,
        r#"
[retrieval]
top_k = 7

[chunking]
online_max_chunk_size = 1200

[index]
backend = "memory"

[logging]
level = "info"
"#,
    )
    .unwrap();

    unsafe {
        std::env::set_var("KB_LOGGING__LEVEL", "debug");
        std::env::set_var("KB_RETRIEVAL__SIMILARITY_THRESHOLD", "0.25");
    }
    let settings = Settings::load_from(&path);
    unsafe {
        std::env::remove_var("KB_LOGGING__LEVEL");
        std::env::remove_var("KB_RETRIEVAL__SIMILARITY_THRESHOLD");
    }
    let settings = settings.unwrap();

    // File
    assert_eq!(settings.retrieval.top_k, 7);
    assert_eq!(settings.chunking.online_max_chunk_size, 1200);
    assert_eq!(settings.index.backend, BackendKind::Memory);
    // Env over file
    assert_eq!(settings.logging.level, "debug");
    assert_eq!(settings.retrieval.similarity_threshold, Some(0.25));
    // Defaults
    assert_eq!(settings.chunking.static_max_chunk_size, 500);
    assert_eq!(settings.embedding.provider, ProviderKind::FastEmbed);
    assert_eq!(settings.embedding.dimension, 384);
}

#[test]
fn test_written_default_config_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".knowbase").join("settings.toml");

    Settings::write_default_config(&path, false).unwrap();
    assert!(Settings::write_default_config(&path, false).is_err());

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.retrieval.top_k, 3);
    assert_eq!(settings.chunking.static_max_chunk_size, 500);
}
