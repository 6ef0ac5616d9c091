//! KDL configuration parser

use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::model::*;

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse a configuration file, falling back to defaults when it does not exist
///
/// A missing file is not an error: every setting has a default and the
/// client is usable without any configuration on disk.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(
            "No configuration at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }
    parse_config(path)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl uses an older miette version, so we need to extract offset/len manually
        let offset = e.span.offset();
        let len = e.span.len();
        let span = miette::SourceSpan::from((offset, len));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => config.global = parse_global(node)?,
            "service" => config.service = parse_service(node)?,
            "timing" => config.timing = parse_timing(node)?,
            "analytics" => config.analytics = parse_analytics(node)?,
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    validate(&config)?;

    Ok(config)
}

fn parse_global(node: &kdl::KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    for child in child_nodes(node) {
        match child.name().value() {
            "log-level" => {
                let val = string_value(child)?;
                global.log_level = val
                    .parse()
                    .map_err(|message| ConfigError::Invalid { message })?;
            }
            name => {
                tracing::warn!("Unknown global config option: {}", name);
            }
        }
    }

    Ok(global)
}

fn parse_service(node: &kdl::KdlNode) -> Result<ServiceConfig, ConfigError> {
    let mut service = ServiceConfig::default();

    for child in child_nodes(node) {
        match child.name().value() {
            "address" => service.address = string_value(child)?.to_string(),
            "port" => {
                let port = integer_value(child)?;
                service.port = u16::try_from(port).map_err(|_| ConfigError::InvalidValue {
                    key: "service.port".to_string(),
                    message: format!("{} is not a valid TCP port", port),
                })?;
            }
            name => {
                tracing::warn!("Unknown service config option: {}", name);
            }
        }
    }

    Ok(service)
}

fn parse_timing(node: &kdl::KdlNode) -> Result<TimingConfig, ConfigError> {
    let mut timing = TimingConfig::default();

    for child in child_nodes(node) {
        match child.name().value() {
            "tick-rate" => {
                let rate = positive_value(child)?;
                timing.tick_rate = u32::try_from(rate).map_err(|_| ConfigError::InvalidValue {
                    key: "timing.tick-rate".to_string(),
                    message: format!("{} Hz is out of range", rate),
                })?;
            }
            "callback-sweep-interval-ms" => {
                timing.callback_sweep_interval = millis_value(child)?;
            }
            "callback-timeout-ms" => timing.callback_timeout = millis_value(child)?,
            "license-change-timeout-ms" => timing.license_change_timeout = millis_value(child)?,
            "input-action-cull-to" => {
                let count = integer_value(child)?;
                timing.input_action_cull_to =
                    usize::try_from(count).map_err(|_| ConfigError::InvalidValue {
                        key: "timing.input-action-cull-to".to_string(),
                        message: "must not be negative".to_string(),
                    })?;
            }
            "hand-data-min-interval-ms" => {
                // Zero disables rate limiting, so this one may be 0
                let ms = integer_value(child)?;
                timing.hand_data_min_interval =
                    Duration::from_millis(u64::try_from(ms).map_err(|_| {
                        ConfigError::InvalidValue {
                            key: "timing.hand-data-min-interval-ms".to_string(),
                            message: "must not be negative".to_string(),
                        }
                    })?);
            }
            name => {
                tracing::warn!("Unknown timing config option: {}", name);
            }
        }
    }

    Ok(timing)
}

fn parse_analytics(node: &kdl::KdlNode) -> Result<AnalyticsConfig, ConfigError> {
    let mut analytics = AnalyticsConfig::default();

    for child in child_nodes(node) {
        match child.name().value() {
            "application-name" => {
                analytics.application_name = string_value(child)?.to_string();
            }
            "heartbeat-interval-ms" => analytics.heartbeat_interval = millis_value(child)?,
            name => {
                tracing::warn!("Unknown analytics config option: {}", name);
            }
        }
    }

    Ok(analytics)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.service.address.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "service.address".to_string(),
            message: "must not be empty".to_string(),
        });
    }

    if config.service.port == 0 {
        return Err(ConfigError::InvalidValue {
            key: "service.port".to_string(),
            message: "must be greater than 0".to_string(),
        });
    }

    if config.timing.license_change_timeout < config.timing.callback_timeout {
        return Err(ConfigError::Invalid {
            message: format!(
                "license-change-timeout-ms ({}ms) is shorter than callback-timeout-ms ({}ms)",
                config.timing.license_change_timeout.as_millis(),
                config.timing.callback_timeout.as_millis()
            ),
        });
    }

    if config.analytics.application_name.contains(':') {
        return Err(ConfigError::InvalidValue {
            key: "analytics.application-name".to_string(),
            message: "must not contain ':' (it separates the session ID)".to_string(),
        });
    }

    Ok(())
}

fn child_nodes(node: &kdl::KdlNode) -> impl Iterator<Item = &kdl::KdlNode> {
    node.children().into_iter().flat_map(|children| children.nodes())
}

fn node_key(node: &kdl::KdlNode) -> String {
    node.name().value().to_string()
}

fn string_value(node: &kdl::KdlNode) -> Result<&str, ConfigError> {
    node.entries()
        .first()
        .and_then(|entry| entry.value().as_string())
        .ok_or_else(|| ConfigError::InvalidValue {
            key: node_key(node),
            message: "expected a string argument".to_string(),
        })
}

fn integer_value(node: &kdl::KdlNode) -> Result<i64, ConfigError> {
    node.entries()
        .first()
        .and_then(|entry| entry.value().as_i64())
        .ok_or_else(|| ConfigError::InvalidValue {
            key: node_key(node),
            message: "expected an integer argument".to_string(),
        })
}

fn positive_value(node: &kdl::KdlNode) -> Result<u64, ConfigError> {
    let value = integer_value(node)?;
    if value <= 0 {
        return Err(ConfigError::InvalidValue {
            key: node_key(node),
            message: format!("must be greater than 0, got {}", value),
        });
    }
    Ok(value as u64)
}

fn millis_value(node: &kdl::KdlNode) -> Result<Duration, ConfigError> {
    positive_value(node).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = r#"
            global {
                log-level "debug"
            }

            service {
                address "192.168.1.20"
                port 9800
            }

            timing {
                tick-rate 30
                callback-sweep-interval-ms 250
                callback-timeout-ms 750
                license-change-timeout-ms 45000
                input-action-cull-to 4
                hand-data-min-interval-ms 0
            }

            analytics {
                application-name "kiosk"
                heartbeat-interval-ms 5000
            }
        "#;

        let result = parse_config_str(config).unwrap();
        assert_eq!(result.global.log_level, LogLevel::Debug);
        assert_eq!(result.service.address, "192.168.1.20");
        assert_eq!(result.service.port, 9800);
        assert_eq!(result.service.url(), "ws://192.168.1.20:9800");
        assert_eq!(result.timing.tick_rate, 30);
        assert_eq!(result.timing.callback_sweep_interval, Duration::from_millis(250));
        assert_eq!(result.timing.callback_timeout, Duration::from_millis(750));
        assert_eq!(result.timing.license_change_timeout, Duration::from_secs(45));
        assert_eq!(result.timing.input_action_cull_to, 4);
        assert_eq!(result.timing.hand_data_min_interval, Duration::ZERO);
        assert_eq!(result.analytics.application_name, "kiosk");
        assert_eq!(result.analytics.heartbeat_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let result = parse_config_str("").unwrap();
        assert_eq!(result, Config::default());
        assert_eq!(result.service.url(), "ws://127.0.0.1:9739");
        assert_eq!(result.timing.tick_rate, 60);
        assert_eq!(result.timing.callback_timeout, Duration::from_millis(500));
        assert_eq!(result.timing.license_change_timeout, Duration::from_secs(30));
        assert_eq!(result.timing.input_action_cull_to, 2);
        assert_eq!(result.analytics.heartbeat_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = r#"
            service {
                port 9000
            }
        "#;

        let result = parse_config_str(config).unwrap();
        assert_eq!(result.service.address, DEFAULT_ADDRESS);
        assert_eq!(result.service.port, 9000);
    }

    #[test]
    fn test_unknown_nodes_are_ignored() {
        let config = r#"
            cursor {
                colour "blue"
            }
            timing {
                frobnicate 3
            }
        "#;

        assert!(parse_config_str(config).is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let config = r#"
            global {
                log-level "loud"
            }
        "#;

        match parse_config_str(config) {
            Err(ConfigError::Invalid { message }) => assert!(message.contains("loud")),
            other => panic!("Expected Invalid error, got: {:?}", other),
        }
    }

    #[test]
    fn test_port_out_of_range() {
        let config = r#"
            service {
                port 70000
            }
        "#;

        match parse_config_str(config) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "service.port"),
            other => panic!("Expected InvalidValue error, got: {:?}", other),
        }
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let config = r#"
            timing {
                tick-rate 0
            }
        "#;

        match parse_config_str(config) {
            Err(ConfigError::InvalidValue { key, message }) => {
                assert_eq!(key, "tick-rate");
                assert!(message.contains("greater than 0"));
            }
            other => panic!("Expected InvalidValue error, got: {:?}", other),
        }
    }

    #[test]
    fn test_string_where_integer_expected() {
        let config = r#"
            timing {
                callback-timeout-ms "fast"
            }
        "#;

        assert!(matches!(
            parse_config_str(config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_license_timeout_shorter_than_callback_timeout() {
        let config = r#"
            timing {
                callback-timeout-ms 5000
                license-change-timeout-ms 1000
            }
        "#;

        match parse_config_str(config) {
            Err(ConfigError::Invalid { message }) => {
                assert!(message.contains("license-change-timeout-ms"));
            }
            other => panic!("Expected Invalid error, got: {:?}", other),
        }
    }

    #[test]
    fn test_application_name_with_separator_rejected() {
        let config = r#"
            analytics {
                application-name "my:app"
            }
        "#;

        assert!(matches!(
            parse_config_str(config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_malformed_kdl_reports_parse_error() {
        let result = parse_config_str("service { port 9739");
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_load_config_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.kdl");

        let config = load_config(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.kdl");
        std::fs::write(&path, "service {\n    address \"10.0.0.5\"\n}\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.service.address, "10.0.0.5");
    }
}
