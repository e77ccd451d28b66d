use super::*;

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert!(settings.cache_server.site_url.is_none());
    assert!(settings.cache_server.port_override.is_none());
    assert_eq!(settings.dispatch.concurrency.get(), 8);
    assert_eq!(settings.dispatch.request_timeout, Duration::from_secs(10));
    assert_eq!(settings.dispatch.max_retries, 0);
    assert_eq!(settings.dispatch.retry_backoff, Duration::from_millis(200));
    assert!(settings.dispatch.dedup);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.cache_server.port_override = Some(8080);
    raw.logging.level = Some("info".to_string());

    raw.apply_cache_server_overrides(&CacheServerOverrides {
        port_override: Some(6081),
        ..Default::default()
    });
    raw.apply_logging_overrides(&LoggingOverrides {
        log_level: Some("debug".to_string()),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.cache_server.port_override, Some(6081));
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_logging_overrides(&LoggingOverrides {
        log_json: Some(true),
        ..Default::default()
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_site_url_is_treated_as_missing() {
    let mut raw = RawSettings::default();
    raw.cache_server.site_url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.cache_server.site_url.is_none());
}

#[test]
fn zero_port_override_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache_server.port_override = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero port");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache_server.port_override",
            ..
        }
    ));
}

#[test]
fn zero_concurrency_is_rejected() {
    let mut raw = RawSettings::default();
    raw.apply_dispatch_overrides(&DispatchOverrides {
        concurrency: Some(0),
        ..Default::default()
    });

    let err = Settings::from_raw(raw).expect_err("zero concurrency");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "dispatch.concurrency",
            ..
        }
    ));
}

#[test]
fn zero_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.dispatch.request_timeout_ms = Some(0);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn excessive_retries_are_rejected() {
    let mut raw = RawSettings::default();
    raw.dispatch.max_retries = Some(MAX_DISPATCH_RETRIES + 1);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    let err = Settings::from_raw(raw).expect_err("bad level");
    assert!(err.to_string().contains("logging.level"));
}

#[test]
fn dispatch_settings_convert_to_dispatch_config() {
    let mut raw = RawSettings::default();
    raw.apply_dispatch_overrides(&DispatchOverrides {
        concurrency: Some(2),
        request_timeout_ms: Some(1500),
        max_retries: Some(3),
        retry_backoff_ms: Some(25),
        dedup: Some(false),
    });
    let settings = Settings::from_raw(raw).expect("valid settings");

    let config = crate::invalidation::DispatchConfig::from(&settings.dispatch);
    assert_eq!(config.concurrency, 2);
    assert_eq!(config.request_timeout_ms, 1500);
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.retry_backoff_ms, 25);
    assert!(!config.dedup);
}

#[test]
fn parse_ban_arguments() {
    let args = CliArgs::parse_from([
        "vanish",
        "ban",
        "--site-url",
        "https://example.com/",
        "--port",
        "6081",
        "--url",
        "https://example.com/a/",
        "--url",
        "/b",
        "--regex",
        "^/tag/",
        "--dispatch-max-retries",
        "2",
        "--json",
    ]);

    match args.command {
        Command::Ban(ban) => {
            assert_eq!(
                ban.cache_server.site_url.as_deref(),
                Some("https://example.com/")
            );
            assert_eq!(ban.cache_server.port_override, Some(6081));
            assert_eq!(ban.urls, vec!["https://example.com/a/", "/b"]);
            assert_eq!(ban.regexes, vec!["^/tag/"]);
            assert_eq!(ban.dispatch.max_retries, Some(2));
            assert!(ban.json);
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_global_logging_flags_after_subcommand() {
    let args = CliArgs::parse_from([
        "vanish",
        "target",
        "--site-url",
        "http://localhost/",
        "--log-level",
        "warn",
        "--log-json",
        "yes",
    ]);

    assert_eq!(args.logging.log_level.as_deref(), Some("warn"));
    assert_eq!(args.logging.log_json, Some(true));
    assert!(matches!(args.command, Command::Target(_)));
}

#[test]
fn parse_normalize_requires_urls() {
    assert!(CliArgs::try_parse_from(["vanish", "normalize"]).is_err());

    let args = CliArgs::parse_from(["vanish", "normalize", "http://example.com/a", "b"]);
    match args.command {
        Command::Normalize(normalize) => assert_eq!(normalize.urls.len(), 2),
        _ => panic!("wrong command parsed"),
    }
}
