use super::*;
use crate::agent::AgentRole;
use lazy_static::lazy_static;
use std::env;
use std::sync::Mutex;
use store::{ENV_API_KEY, ENV_BASE_URL, ENV_STREAM_URL};

// Tests that touch STUDIO_* variables hold this lock so parallel tests do
// not observe each other's overrides.
lazy_static! {
    static ref ENV_LOCK: Mutex<()> = Mutex::new(());
}

fn clear_env() {
    env::remove_var(ENV_BASE_URL);
    env::remove_var(ENV_STREAM_URL);
    env::remove_var(ENV_API_KEY);
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.backend.base_url, "http://localhost:3000");
    assert_eq!(config.backend.invoke_path, "api/agent");
    assert!(config.backend.api_key.is_none());
    assert!(config.backend.request_timeout().is_none());
    assert_eq!(config.stream.disconnect_grace_ms, 2000);
    assert!(!config.strict_decoding);
    assert_eq!(
        config.agents.for_role(AgentRole::PostWriter),
        "698bcf5971cc26621aa010f0"
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
strict_decoding = true

[backend]
base_url = "https://agents.example.com"
request_timeout_secs = 90

[agents]
coordinator = "coord-1"
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert!(config.strict_decoding);
    assert_eq!(config.backend.base_url, "https://agents.example.com");
    assert_eq!(config.backend.invoke_path, "api/agent");
    assert_eq!(config.backend.request_timeout_secs, Some(90));
    assert_eq!(config.agents.coordinator, "coord-1");
    assert_eq!(config.agents.image_creator, AgentRole::ImageCreator.default_id());
    assert_eq!(config.stream, StreamConfig::default());
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sub").join("config.toml");

    let mut config = Config::default();
    config.backend.api_key = Some("sk-live".to_string());
    config.stream.disconnect_grace_ms = 500;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_invalid_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[backend\nbase_url = ").unwrap();
    assert!(Config::load(&path).is_err());
}

#[test]
fn test_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    env::set_var(ENV_BASE_URL, "https://override.example.com");
    env::set_var(ENV_API_KEY, "sk-env");
    env::set_var(ENV_STREAM_URL, "");

    let mut config = Config::default();
    config.apply_env_overrides();
    assert_eq!(config.backend.base_url, "https://override.example.com");
    assert_eq!(config.backend.api_key.as_deref(), Some("sk-env"));
    assert_eq!(config.stream.url, StreamConfig::default().url);

    clear_env();
}

#[test]
fn test_load_or_default_missing_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_or_default(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut config = Config::default();
    config.stream.url = "https://not-a-socket".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.backend.api_key = Some("none".to_string());
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.agents.post_writer = "  ".to_string();
    assert!(config.validate().is_err());
}
