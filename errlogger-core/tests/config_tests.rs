use errlogger_core::backoff::BackoffStrategy;
use errlogger_core::config::{ENV_ENDPOINT_URL, ENV_MAX_QUEUE_LEN, ENV_PAGE_URL, ENV_PARAMS};
use errlogger_core::{ErrorLoggerError, LoggerConfig};
use serial_test::serial;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn clear_env() {
    for key in [ENV_ENDPOINT_URL, ENV_PAGE_URL, ENV_PARAMS, ENV_MAX_QUEUE_LEN] {
        std::env::remove_var(key);
    }
}

#[test]
fn load_from_toml() {
    let toml_content = r#"
endpoint_url = "https://collector.example.com/js-errors"
page_url = "https://shop.example.com"
request_timeout = "5s"
max_queue_len = 1000

[additional_params]
app = "storefront"
release = "2024.03"

[retry.backoff]
type = "exponential"
base = "200ms"
max = "1m"
multiplier = 2.0
"#;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml_content.as_bytes()).unwrap();

    let config = LoggerConfig::from_file(file.path()).unwrap();
    assert_eq!(
        config.endpoint(),
        Some("https://collector.example.com/js-errors")
    );
    assert_eq!(config.request_timeout, Duration::from_secs(5));
    assert_eq!(config.max_queue_len, Some(1000));
    assert_eq!(config.additional_params.len(), 2);
    assert_eq!(
        config.retry.backoff,
        BackoffStrategy::Exponential {
            base: Duration::from_millis(200),
            max: Duration::from_secs(60),
            multiplier: 2.0,
        }
    );
}

#[test]
fn empty_toml_is_inert() {
    let file = NamedTempFile::new().unwrap();
    let config = LoggerConfig::from_file(file.path()).unwrap();

    assert!(!config.is_enabled());
    assert_eq!(config.retry.backoff, BackoffStrategy::Immediate);
}

#[test]
fn malformed_toml_reports_path() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"endpoint_url = [unclosed").unwrap();

    let err = LoggerConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ErrorLoggerError::ConfigParse { .. }));
    assert!(err
        .to_string()
        .contains(&file.path().display().to_string()));
}

#[test]
fn non_finite_jitter_is_rejected() {
    for range in ["min = nan\nmax = 1.2", "min = 0.8\nmax = inf"] {
        let toml_content = format!(
            "endpoint_url = \"https://collector.example.com/errors\"\n\n\
             [retry.backoff]\ntype = \"fixed\"\ndelay = \"1s\"\n\n\
             [retry.jitter]\ntype = \"proportional_range\"\n{}\n",
            range
        );

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let err = LoggerConfig::from_file(file.path()).unwrap_err();
        assert!(
            matches!(err, ErrorLoggerError::ConfigurationError { ref component, .. } if component == "retry.jitter"),
            "unexpected error for {:?}: {}",
            range,
            err
        );
    }
}

#[test]
fn missing_file_is_io_error() {
    let err = LoggerConfig::from_file("/nonexistent/errlogger.toml").unwrap_err();
    assert!(matches!(err, ErrorLoggerError::IoError(_)));
}

#[test]
#[serial]
fn load_from_env() {
    clear_env();
    std::env::set_var(ENV_ENDPOINT_URL, "http://localhost:8080/errors");
    std::env::set_var(ENV_PAGE_URL, "https://admin.example.com");
    std::env::set_var(ENV_PARAMS, "app=admin,release=7");
    std::env::set_var(ENV_MAX_QUEUE_LEN, "50");

    let config = LoggerConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.endpoint(), Some("http://localhost:8080/errors"));
    assert_eq!(config.page_url.as_deref(), Some("https://admin.example.com"));
    assert_eq!(
        config.additional_params.get("release").map(String::as_str),
        Some("7")
    );
    assert_eq!(config.max_queue_len, Some(50));
}

#[test]
#[serial]
fn env_without_endpoint_is_inert() {
    clear_env();
    let config = LoggerConfig::from_env().unwrap();
    assert!(!config.is_enabled());
}

#[test]
#[serial]
fn invalid_env_values_are_rejected() {
    clear_env();
    std::env::set_var(ENV_ENDPOINT_URL, "http://localhost:8080/errors");
    std::env::set_var(ENV_MAX_QUEUE_LEN, "lots");
    let result = LoggerConfig::from_env();
    clear_env();

    assert!(matches!(
        result,
        Err(ErrorLoggerError::ConfigurationError { .. })
    ));
}
