use super::{normalize_api_url, read_file_settings, resolve, Settings};

use std::{collections::HashMap, fs};

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_env() {
    assert_eq!(resolve(None, env_of(&[])), Settings::default());
}

#[test]
fn normalizes_bare_host_to_http_url() {
    assert_eq!(normalize_api_url("deals.local:8000/api/"), "http://deals.local:8000/api");
    assert_eq!(normalize_api_url("  https://deals.example.com/api  "), "https://deals.example.com/api");
    assert_eq!(normalize_api_url(""), Settings::default().api_url);
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dealflow.toml");
    fs::write(
        &path,
        "api_url = \"http://10.0.0.5:8000/api/\"\nnotification_ttl_ms = 5000\nlog_filter = \"debug\"\n",
    )
    .expect("write config");

    let file = read_file_settings(&path, true).expect("read config");
    let settings = resolve(file, env_of(&[]));

    assert_eq!(settings.api_url, "http://10.0.0.5:8000/api");
    assert_eq!(settings.notification_ttl_ms, 5000);
    assert_eq!(settings.log_filter, "debug");
    assert_eq!(settings.api_token, None);
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dealflow.toml");
    fs::write(&path, "api_url = \"http://from-file/api\"\napi_token = \"file-token\"\n")
        .expect("write config");

    let file = read_file_settings(&path, true).expect("read config");
    let settings = resolve(
        file,
        env_of(&[
            ("DEALFLOW_API_URL", "http://from-env/api"),
            ("APP__API_URL", "http://from-app-env/api"),
            ("DEALFLOW_API_TOKEN", "env-token"),
            ("APP__NOTIFICATION_TTL_MS", "1200"),
            ("RUST_LOG", "client_core=debug"),
        ]),
    );

    assert_eq!(settings.api_url, "http://from-app-env/api");
    assert_eq!(settings.api_token.as_deref(), Some("env-token"));
    assert_eq!(settings.notification_ttl_ms, 1200);
    assert_eq!(settings.log_filter, "client_core=debug");
}

#[test]
fn invalid_ttl_and_blank_token_are_ignored() {
    let settings = resolve(
        None,
        env_of(&[("APP__NOTIFICATION_TTL_MS", "soon"), ("APP__API_TOKEN", "   ")]),
    );

    assert_eq!(settings.notification_ttl_ms, 3000);
    assert_eq!(settings.api_token, None);
}

#[test]
fn missing_default_file_is_fine_but_explicit_one_is_not() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.toml");

    assert!(read_file_settings(&path, false).expect("optional").is_none());
    assert!(read_file_settings(&path, true).is_err());
}

#[test]
fn malformed_file_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dealflow.toml");
    fs::write(&path, "notification_ttl_ms = \"long\"\n").expect("write config");

    let err = read_file_settings(&path, true).expect_err("must fail");
    assert!(err.to_string().contains("failed to parse config file"));
}
