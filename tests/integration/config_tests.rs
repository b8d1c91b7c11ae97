use dupescan::catalog::StoreKind;
use dupescan::config::Config;
use dupescan::output::OutputFormat;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_defaults_extract() {
    // Without Env to avoid interference from other tests
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn test_env_overrides_defaults() {
    std::env::set_var("DUPESCAN_TEST_IO_THREADS", "12");
    std::env::set_var("DUPESCAN_TEST_STORE", "sqlite");

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("DUPESCAN_TEST_").split("__"))
        .extract()
        .unwrap();

    std::env::remove_var("DUPESCAN_TEST_IO_THREADS");
    std::env::remove_var("DUPESCAN_TEST_STORE");

    assert_eq!(config.io_threads, 12);
    assert_eq!(config.store, StoreKind::Sqlite);
}

#[test]
fn test_toml_file_partial() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "output = \"json\"\nignore_patterns = [\"*.bak\", \"cache/\"]\n",
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .extract()
        .unwrap();

    assert_eq!(config.output, OutputFormat::Json);
    assert_eq!(config.ignore_patterns, vec!["*.bak", "cache/"]);
    assert_eq!(config.io_threads, 4);
    assert_eq!(config.store, StoreKind::Memory);
}

#[test]
fn test_load_reads_explicit_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "skip_hidden = true\n").unwrap();

    let config = Config::load(Some(&path));

    assert!(config.skip_hidden);
}

#[test]
fn test_load_falls_back_on_malformed_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "io_threads = \"many\"\n").unwrap();

    let config = Config::load(Some(&path));

    assert_eq!(config.io_threads, Config::default().io_threads);
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let config: Config = Config::figment(Some(&dir.path().join("absent.toml")))
        .extract()
        .unwrap();

    assert_eq!(config.store, Config::default().store);
}
