use super::*;
use tempfile::TempDir;

#[test]
fn defaults_are_valid() {
    let config = Config::default();
    config.validate().expect("default config should validate");
    assert_eq!(config.chunking.chunk_size, 500);
    assert_eq!(config.chunking.overlap, 100);
    assert_eq!(config.retrieval.top_k, 3);
}

#[test]
fn load_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config::load_from(dir.path()).expect("load should succeed");

    assert_eq!(config.openai, OpenAiConfig::default());
    assert_eq!(config.base_dir, dir.path());
}

#[test]
fn save_and_reload_round_trip() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config {
        base_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    config.chunking.chunk_size = 800;
    config.chunking.overlap = 200;
    config.retrieval.top_k = 5;

    config.save().expect("save should succeed");
    let reloaded = Config::load_from(dir.path()).expect("reload should succeed");

    assert_eq!(reloaded.chunking.chunk_size, 800);
    assert_eq!(reloaded.chunking.overlap, 200);
    assert_eq!(reloaded.retrieval.top_k, 5);
}

#[test]
fn rejects_overlap_not_smaller_than_chunk_size() {
    let mut config = Config::default();
    config.chunking.chunk_size = 100;
    config.chunking.overlap = 100;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidOverlap(100, 100))
    ));
}

#[test]
fn rejects_zero_chunk_size() {
    let mut config = Config::default();
    config.chunking.chunk_size = 0;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidChunkSize(0))
    ));
}

#[test]
fn rejects_bad_protocol() {
    let mut config = Config::default();
    config.openai.protocol = "ftp".to_string();

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidProtocol(_))
    ));
}

#[test]
fn rejects_out_of_range_temperature() {
    let mut config = Config::default();
    config.retrieval.temperature = 3.5;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidTemperature(_))
    ));
}

#[test]
fn openai_url_is_well_formed() {
    let config = Config::default();
    let url = config.openai_url().expect("url should parse");

    assert_eq!(url.scheme(), "https");
    assert_eq!(url.host_str(), Some("api.openai.com"));
}

#[test]
fn staging_and_output_dirs_default_under_base_dir() {
    let config = Config {
        base_dir: PathBuf::from("/tmp/doc-qa-test"),
        ..Config::default()
    };

    assert_eq!(config.staging_dir(), PathBuf::from("/tmp/doc-qa-test/files"));
    assert_eq!(config.output_dir(), PathBuf::from("/tmp/doc-qa-test/output"));
}
