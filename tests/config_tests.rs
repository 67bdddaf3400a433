// Configuration loading tests
// Author: kelexine (https://github.com/kelexine)

use clap::Parser;
use speech_gateway::cli::Args;
use speech_gateway::config::AppConfig;
use std::io::Write;

#[test]
fn test_config_defaults() {
    let config = AppConfig::default();

    assert_eq!(config.server.listen_addr, ":8080");
    assert_eq!(config.server.max_body_bytes, 50 * 1024 * 1024);
    assert_eq!(config.backend.network, "tcp");
    assert_eq!(config.backend.endpoint, "localhost:9090");
    assert_eq!(config.backend.connect_timeout_seconds, 10);
    assert_eq!(config.backend.request_timeout_seconds, 0);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[server]
listen_addr = "127.0.0.1:8181"

[backend]
network = "unix"
endpoint = "/run/speech/speech.sock"
request_timeout_seconds = 30
"#
    )
    .unwrap();

    let config = AppConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.server.listen_addr, "127.0.0.1:8181");
    assert_eq!(config.backend.network, "unix");
    assert_eq!(config.backend.endpoint, "/run/speech/speech.sock");
    assert_eq!(config.backend.request_timeout_seconds, 30);
    // untouched sections keep their defaults
    assert_eq!(config.backend.connect_timeout_seconds, 10);
    assert_eq!(config.server.max_body_bytes, 50 * 1024 * 1024);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(AppConfig::load(Some(&missing)).is_err());
}

#[test]
fn test_environment_overrides_defaults() {
    std::env::set_var("SPEECH_GATEWAY__LOGGING__FORMAT", "json");
    let config = AppConfig::load(None);
    std::env::remove_var("SPEECH_GATEWAY__LOGGING__FORMAT");

    assert_eq!(config.unwrap().logging.format, "json");
}

#[test]
fn test_environment_overrides_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[backend]
request_timeout_seconds = 7

[logging]
level = "warn"
"#
    )
    .unwrap();

    std::env::set_var("SPEECH_GATEWAY__LOGGING__LEVEL", "debug");
    let config = AppConfig::load(Some(file.path()));
    std::env::remove_var("SPEECH_GATEWAY__LOGGING__LEVEL");

    let config = config.unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.backend.request_timeout_seconds, 7);
}

#[test]
fn test_flags_override_config() {
    let mut config = AppConfig::default();
    let args = Args::parse_from([
        "speech-gateway",
        "--network",
        "unix",
        "--endpoint",
        "/tmp/speech.sock",
    ]);
    config.apply_args(&args);

    assert_eq!(config.backend.network, "unix");
    assert_eq!(config.backend.endpoint, "/tmp/speech.sock");
    // not passed, so not overridden
    assert_eq!(config.server.listen_addr, ":8080");
}
