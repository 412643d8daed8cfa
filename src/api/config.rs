//! Application configuration.
//!
//! Resolved once at startup from the environment and handed to
//! [`crate::routes::AppState`]. Handlers never read environment variables.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::middleware::rate_limit::RateLimitConfig;
use crate::services::ai_service::AiProvider;

pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_AI_TIMEOUT_MS: u64 = 8_000;
const MIN_AI_TIMEOUT_MS: u64 = 1_000;
const MAX_AI_TIMEOUT_MS: u64 = 30_000;

/// `/api/adaptive`: 40 requests per hour per client IP.
pub const ADAPTIVE_RATE_LIMIT: (u32, u64) = (40, 3_600_000);
/// `/api/contact`: 5 submissions per hour per client IP.
pub const CONTACT_RATE_LIMIT: (u32, u64) = (5, 3_600_000);

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Credentials and endpoint for one text-generation provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    /// `None` when `OPENAI_API_KEY` is unset or blank.
    pub openai: Option<ProviderCredentials>,
    /// `None` when `ANTHROPIC_API_KEY` is unset or blank.
    pub anthropic: Option<ProviderCredentials>,
    pub default_provider: AiProvider,
    pub ai_timeout: Duration,
    pub adaptive_rate_limit: RateLimitConfig,
    pub contact_rate_limit: RateLimitConfig,
    /// Empty means permissive CORS.
    pub cors_allowed_origins: Vec<String>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Resolve configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let openai = non_blank("OPENAI_API_KEY").map(|api_key| ProviderCredentials {
            api_key,
            model: non_blank("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            api_url: non_blank("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
        });
        let anthropic = non_blank("ANTHROPIC_API_KEY").map(|api_key| ProviderCredentials {
            api_key,
            model: non_blank("ANTHROPIC_MODEL")
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
            api_url: non_blank("ANTHROPIC_API_URL")
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_URL.to_string()),
        });

        let ai_timeout_ms = non_blank("AI_TIMEOUT_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_AI_TIMEOUT_MS)
            .clamp(MIN_AI_TIMEOUT_MS, MAX_AI_TIMEOUT_MS);

        let rate_limit = |max_key: &str, window_key: &str, default: (u32, u64)| {
            let max = non_blank(max_key).map_or(f64::from(default.0), |v| parse_f64(&v));
            let window = non_blank(window_key).map_or(default.1 as f64, |v| parse_f64(&v));
            RateLimitConfig::from_raw(max, window)
        };

        Self {
            host: non_blank("HOST")
                .and_then(|v| v.parse().ok())
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port: non_blank("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            openai,
            anthropic,
            default_provider: non_blank("DEFAULT_AI_PROVIDER")
                .and_then(|v| AiProvider::parse(&v))
                .unwrap_or(AiProvider::OpenAi),
            ai_timeout: Duration::from_millis(ai_timeout_ms),
            adaptive_rate_limit: rate_limit(
                "ADAPTIVE_RATE_LIMIT_MAX",
                "ADAPTIVE_RATE_LIMIT_WINDOW_MS",
                ADAPTIVE_RATE_LIMIT,
            ),
            contact_rate_limit: rate_limit(
                "CONTACT_RATE_LIMIT_MAX",
                "CONTACT_RATE_LIMIT_WINDOW_MS",
                CONTACT_RATE_LIMIT,
            ),
            cors_allowed_origins: non_blank("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            log_format: match non_blank("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }

    /// True when at least one provider credential is configured.
    pub fn enrichment_enabled(&self) -> bool {
        self.openai.is_some() || self.anthropic.is_some()
    }

    pub fn credentials(&self, provider: AiProvider) -> Option<&ProviderCredentials> {
        match provider {
            AiProvider::OpenAi => self.openai.as_ref(),
            AiProvider::Anthropic => self.anthropic.as_ref(),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for AppConfig {
    /// No credentials, default limits. Used by tests and local runs.
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_f64(raw: &str) -> f64 {
    raw.parse::<f64>().unwrap_or(f64::NAN)
}
