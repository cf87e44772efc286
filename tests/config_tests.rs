use std::collections::HashMap;

use tailgate_schedule_sync::config::{ConfigError, DEFAULT_FEED_BASE_URL, StoreBackend, SyncConfig};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| map.get(name).cloned()
}

#[test]
fn firebase_backend_needs_database_url() {
    let err = SyncConfig::from_lookup(lookup(&[])).unwrap_err();
    assert_eq!(err, ConfigError::Missing("FIREBASE_DATABASE_URL"));
}

#[test]
fn defaults_fill_optional_values() {
    let config = SyncConfig::from_lookup(lookup(&[
        ("FIREBASE_DATABASE_URL", "https://texas-tailgaters-default-rtdb.firebaseio.com/"),
        ("SYNC_AUTH_TOKEN", "  s3cret "),
        ("FIREBASE_AUTH", ""),
    ]))
    .unwrap();

    assert_eq!(config.feed_base_url, DEFAULT_FEED_BASE_URL);
    assert_eq!(config.team_id, "251");
    assert_eq!(config.season, None);
    assert_eq!(config.time_zone, chrono_tz::America::Chicago);
    assert_eq!(config.store.backend, StoreBackend::Firebase);
    assert_eq!(
        config.store.database_url.as_deref(),
        Some("https://texas-tailgaters-default-rtdb.firebaseio.com")
    );
    // Empty values count as unset
    assert_eq!(config.store.auth, None);
    assert_eq!(config.auth_token.as_deref(), Some("s3cret"));
    assert_eq!(config.bind_addr, "0.0.0.0:8080");
}

#[test]
fn memory_backend_with_overrides() {
    let config = SyncConfig::from_lookup(lookup(&[
        ("STORE_BACKEND", "memory"),
        ("TEAM_ID", "333"),
        ("SEASON", "2024"),
        ("SYNC_TIME_ZONE", "America/New_York"),
        ("FEED_BASE_URL", "http://localhost:9000/cfb/"),
    ]))
    .unwrap();

    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.team_id, "333");
    assert_eq!(config.season, Some(2024));
    assert_eq!(config.time_zone, chrono_tz::America::New_York);
    assert_eq!(config.feed_base_url, "http://localhost:9000/cfb");
}

#[test]
fn rejects_bad_values() {
    let err = SyncConfig::from_lookup(lookup(&[("STORE_BACKEND", "redis")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { name: "STORE_BACKEND", .. }));

    let err = SyncConfig::from_lookup(lookup(&[("STORE_BACKEND", "memory"), ("SEASON", "next")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { name: "SEASON", .. }));

    let err = SyncConfig::from_lookup(lookup(&[("STORE_BACKEND", "memory"), ("SYNC_TIME_ZONE", "Mars/Olympus")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { name: "SYNC_TIME_ZONE", .. }));
}
