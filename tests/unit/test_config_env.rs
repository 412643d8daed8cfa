//! Configuration resolved from real process environment variables.

use std::time::Duration;

use portfolio_api::config::{AppConfig, DEFAULT_PORT, LogFormat};
use portfolio_api::services::AiProvider;
use serial_test::serial;

const KEYS: &[&str] = &[
    "PORT",
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "DEFAULT_AI_PROVIDER",
    "AI_TIMEOUT_MS",
    "ADAPTIVE_RATE_LIMIT_MAX",
    "LOG_FORMAT",
];

fn clear_env() {
    for key in KEYS {
        // SAFETY: tests touching the environment run serially
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
#[serial]
fn test_from_env_reads_process_environment() {
    clear_env();
    unsafe {
        std::env::set_var("PORT", "9090");
        std::env::set_var("ANTHROPIC_API_KEY", "sk-ant-from-env");
        std::env::set_var("DEFAULT_AI_PROVIDER", "Anthropic");
        std::env::set_var("AI_TIMEOUT_MS", "2500");
        std::env::set_var("ADAPTIVE_RATE_LIMIT_MAX", "12");
        std::env::set_var("LOG_FORMAT", "json");
    }

    let config = AppConfig::from_env();
    clear_env();

    assert_eq!(config.port, 9090);
    assert!(config.enrichment_enabled());
    assert_eq!(config.default_provider, AiProvider::Anthropic);
    assert_eq!(config.ai_timeout, Duration::from_millis(2_500));
    assert_eq!(config.adaptive_rate_limit.max_requests(), 12);
    assert_eq!(config.log_format, LogFormat::Json);
}

#[test]
#[serial]
fn test_from_env_without_variables_uses_defaults() {
    clear_env();

    let config = AppConfig::from_env();

    assert_eq!(config.port, DEFAULT_PORT);
    assert!(!config.enrichment_enabled());
    assert_eq!(config.default_provider, AiProvider::OpenAi);
    assert_eq!(config.log_format, LogFormat::Pretty);
}
