use super::*;
use serial_test::serial;

#[test]
#[serial]
fn test_config_store_priority() {
    // CONFIG_STORE wins over the environment
    const TEST_KEY: &str = "API_BASE_URL";
    unsafe {
        std::env::set_var(TEST_KEY, "http://env.example");
    }
    let guard = ConfigGuard::new(TEST_KEY, "http://store.example");
    assert_eq!(get(TEST_KEY).unwrap(), "http://store.example");

    drop(guard);
    assert_eq!(get(TEST_KEY).unwrap(), "http://env.example");

    unsafe {
        std::env::remove_var(TEST_KEY);
    }
}

#[test]
#[serial]
fn test_defaults() {
    unsafe {
        std::env::remove_var("REQUEST_TIMEOUT");
        std::env::remove_var("LOG_FORMAT");
    }
    assert_eq!(get_duration("REQUEST_TIMEOUT").unwrap(), Duration::from_secs(30));
    assert_eq!(get("LOG_FORMAT").unwrap(), "term");
}

#[test]
#[serial]
fn test_fallback_applies_only_when_unset() {
    unsafe {
        std::env::remove_var("POLL_MAX_ATTEMPTS");
        std::env::remove_var("POLL_MAX_WAIT");
    }
    assert_eq!(get_parsed_or("POLL_MAX_ATTEMPTS", 7u32).unwrap(), 7);
    assert_eq!(
        get_duration_or("POLL_MAX_WAIT", Duration::from_secs(9)).unwrap(),
        Duration::from_secs(9)
    );

    let _attempts = ConfigGuard::new("POLL_MAX_ATTEMPTS", "12");
    let _wait = ConfigGuard::new("POLL_MAX_WAIT", "2m");
    assert_eq!(get_parsed_or("POLL_MAX_ATTEMPTS", 7u32).unwrap(), 12);
    assert_eq!(
        get_duration_or("POLL_MAX_WAIT", Duration::from_secs(9)).unwrap(),
        Duration::from_secs(120)
    );
}

#[test]
#[serial]
fn test_fallback_still_rejects_bad_values() {
    let _attempts = ConfigGuard::new("POLL_MAX_ATTEMPTS", "sixty");
    assert!(get_parsed_or("POLL_MAX_ATTEMPTS", 7u32).is_err());
}

#[test]
#[serial]
fn test_empty_store_value_is_error() {
    let _guard = ConfigGuard::new("CACHE_DIR", "");
    assert!(get("CACHE_DIR").is_err());
}

#[test]
#[serial]
fn test_invalid_values_are_reported() {
    let _attempts = ConfigGuard::new("POLL_MAX_ATTEMPTS", "sixty");
    let _interval = ConfigGuard::new("POLL_INTERVAL", "soon");

    let err = get_parsed::<u32>("POLL_MAX_ATTEMPTS").unwrap_err();
    assert!(err.to_string().contains("POLL_MAX_ATTEMPTS"));
    assert!(get_duration("POLL_INTERVAL").is_err());
}

#[test]
fn test_unknown_key() {
    assert!(get("NO_SUCH_KEY_ANYWHERE").is_err());
}

#[test]
fn test_merge_config_local_overrides() {
    let mut base: Config = toml::from_str(
        r#"
        [api]
        base_url = "http://base.example"
        request_timeout = "10s"

        [poll]
        max_attempts = 30
        "#,
    )
    .unwrap();
    let local: Config = toml::from_str(
        r#"
        [poll]
        max_attempts = 90
        interval = "2s"
        "#,
    )
    .unwrap();

    merge_config(&mut base, local);

    assert_eq!(base.api.base_url.as_deref(), Some("http://base.example"));
    assert_eq!(base.api.request_timeout.as_deref(), Some("10s"));
    assert_eq!(base.poll.max_attempts, Some(90));
    assert_eq!(base.poll.interval.as_deref(), Some("2s"));
    assert_eq!(base.cache.dir, None);
}
