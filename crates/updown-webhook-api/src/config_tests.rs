//! Tests for [`ServiceConfig`] defaults, deserialization and validation.

use super::*;

// ============================================================================
// Defaults
// ============================================================================

mod defaults {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ServiceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_defaults_match_provider() {
        let config = ServiceConfig::default();

        assert_eq!(config.server.port, 8888);
        assert_eq!(config.server.endpoint_path, "/");
        assert_eq!(config.provider.user_agent, "updown.io");
        assert_eq!(config.provider.whitelist_host, "ips.updown.io");
        assert_eq!(config.metrics.namespace, "updown");
        assert_eq!(config.metrics.subsystem, "webhook");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
    }
}

// ============================================================================
// Deserialization
// ============================================================================

mod deserialization {
    use super::*;

    /// An empty document yields the defaults.
    #[test]
    fn test_empty_object_uses_defaults() {
        let config: ServiceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    /// Fields not mentioned keep their defaults when a section is partial.
    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config: ServiceConfig = serde_json::from_value(serde_json::json!({
            "server": { "port": 9090 },
            "metrics": { "subsystem": "staging" },
            "logging": { "json_format": true }
        }))
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.metrics.subsystem, "staging");
        assert_eq!(config.metrics.namespace, "updown");
        assert!(config.logging.json_format);
        assert_eq!(config.provider, ProviderConfig::default());
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let result: Result<ServiceConfig, _> =
            serde_json::from_value(serde_json::json!({ "server": { "port": "eighty" } }));
        assert!(result.is_err());
    }
}

// ============================================================================
// Validation
// ============================================================================

mod validation {
    use super::*;

    #[test]
    fn test_port_zero_fails() {
        let mut config = ServiceConfig::default();
        config.server.port = 0;

        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { .. }),
            "expected Invalid, got: {:?}",
            err
        );
    }

    #[test]
    fn test_endpoint_path_without_slash_fails() {
        let mut config = ServiceConfig::default();
        config.server.endpoint_path = "webhook".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("endpoint_path"));
    }

    #[test]
    fn test_reserved_endpoint_paths_fail() {
        for path in ["/metrics", "/health"] {
            let mut config = ServiceConfig::default();
            config.server.endpoint_path = path.to_string();

            assert!(config.validate().is_err(), "{path} should be refused");
        }
    }

    #[test]
    fn test_nested_endpoint_path_passes() {
        let mut config = ServiceConfig::default();
        config.server.endpoint_path = "/hooks/updown".to_string();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_identifiers_fail() {
        let cases: [(&str, fn(&mut ServiceConfig)); 5] = [
            ("server.host", |c| c.server.host.clear()),
            ("provider.user_agent", |c| c.provider.user_agent.clear()),
            ("provider.whitelist_host", |c| {
                c.provider.whitelist_host = "  ".to_string()
            }),
            ("metrics.namespace", |c| c.metrics.namespace.clear()),
            ("metrics.subsystem", |c| c.metrics.subsystem.clear()),
        ];

        for (key, mutate) in cases {
            let mut config = ServiceConfig::default();
            mutate(&mut config);

            match config.validate() {
                Err(ConfigError::Missing { key: reported }) => assert_eq!(reported, key),
                other => panic!("expected Missing for {key}, got: {other:?}"),
            }
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

mod loading {
    use super::*;
    use std::path::PathBuf;

    fn temp_config(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("updown-webhook-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let path = temp_config("server:\n  port: 9191\nmetrics:\n  subsystem: staging\n");

        let config = ServiceConfig::load(path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.server.port, 9191);
        assert_eq!(config.metrics.subsystem, "staging");
        assert_eq!(config.provider, ProviderConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let path = std::env::temp_dir().join(format!("missing-{}.yaml", uuid::Uuid::new_v4()));

        let err = ServiceConfig::load(path.to_str()).unwrap_err();
        assert!(matches!(err, ConfigError::Loading(_)), "got: {:?}", err);
    }

    #[test]
    fn test_invalid_file_values_fail_validation() {
        let path = temp_config("server:\n  endpoint_path: hooks\n");

        let err = ServiceConfig::load(path.to_str()).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, ConfigError::Invalid { .. }), "got: {:?}", err);
    }
}
