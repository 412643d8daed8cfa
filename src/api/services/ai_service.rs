//! AI narrative enrichment.
//!
//! Optional. The deterministic narrative is always computed first; a
//! provider call only replaces it when it succeeds within the configured
//! timeout. Every provider failure is turned into [`EnrichmentError`] and
//! absorbed by [`EnrichmentService::resolve_narrative`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::config::{AppConfig, ProviderCredentials};
use crate::models::RecommendationBundle;

/// Enrichment output shorter than this is treated as a failure.
pub const MIN_AI_NARRATIVE_CHARS: usize = 40;
const MAX_OUTPUT_TOKENS: u32 = 220;
const ANTHROPIC_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = "You write short, warm, factual introductions for a software engineer's \
portfolio. Use only the facts provided. Two to three sentences, no lists, no markdown.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenAi,
    Anthropic,
}

impl AiProvider {
    /// Case-insensitive parse; unknown names yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(AiProvider::OpenAi),
            "anthropic" => Some(AiProvider::Anthropic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "openai",
            AiProvider::Anthropic => "anthropic",
        }
    }
}

/// Which narrative the response carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeSource {
    Deterministic,
    Ai,
}

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("no AI provider configured")]
    NotConfigured,
    #[error("AI provider timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to reach AI provider: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AI provider returned error {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("invalid AI response format")]
    MalformedResponse,
    #[error("AI narrative too short ({0} characters)")]
    TooShort(usize),
}

/// Narrative chosen for a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeOutcome {
    pub deterministic: String,
    pub ai: Option<String>,
    pub source: NarrativeSource,
}

/// A text-generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> AiProvider;

    async fn generate(&self, system: &str, prompt: &str) -> Result<String, EnrichmentError>;
}

/// OpenAI chat completions.
pub struct OpenAiGenerator {
    client: Client,
    credentials: ProviderCredentials,
}

impl OpenAiGenerator {
    pub fn new(client: Client, credentials: ProviderCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn provider(&self) -> AiProvider {
        AiProvider::OpenAi
    }

    async fn generate(&self, system: &str, prompt: &str) -> Result<String, EnrichmentError> {
        let request_body = json!({
            "model": self.credentials.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.4,
            "max_tokens": MAX_OUTPUT_TOKENS
        });

        let response = self
            .client
            .post(&self.credentials.api_url)
            .bearer_auth(&self.credentials.api_key)
            .json(&request_body)
            .send()
            .await?;
        let response_json = read_json(response).await?;

        response_json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or(EnrichmentError::MalformedResponse)
    }
}

/// Anthropic messages API.
pub struct AnthropicGenerator {
    client: Client,
    credentials: ProviderCredentials,
}

impl AnthropicGenerator {
    pub fn new(client: Client, credentials: ProviderCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    fn provider(&self) -> AiProvider {
        AiProvider::Anthropic
    }

    async fn generate(&self, system: &str, prompt: &str) -> Result<String, EnrichmentError> {
        let request_body = json!({
            "model": self.credentials.model,
            "max_tokens": MAX_OUTPUT_TOKENS,
            "system": system,
            "messages": [
                {"role": "user", "content": prompt}
            ]
        });

        let response = self
            .client
            .post(&self.credentials.api_url)
            .header("x-api-key", &self.credentials.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request_body)
            .send()
            .await?;
        let response_json = read_json(response).await?;

        let text: String = response_json
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or(EnrichmentError::MalformedResponse)?
            .iter()
            .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
            .collect();

        if text.is_empty() {
            return Err(EnrichmentError::MalformedResponse);
        }
        Ok(text)
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, EnrichmentError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EnrichmentError::Provider {
            status: status.as_u16(),
            body: body.chars().take(300).collect(),
        });
    }
    response
        .json()
        .await
        .map_err(|_| EnrichmentError::MalformedResponse)
}

/// Selects a provider and runs bounded enrichment calls.
pub struct EnrichmentService {
    openai: Option<Arc<dyn TextGenerator>>,
    anthropic: Option<Arc<dyn TextGenerator>>,
    default_provider: AiProvider,
    timeout: Duration,
}

impl EnrichmentService {
    /// Service with no providers; every request takes the deterministic path.
    pub fn disabled(timeout: Duration) -> Self {
        Self {
            openai: None,
            anthropic: None,
            default_provider: AiProvider::OpenAi,
            timeout,
        }
    }

    /// Build HTTP-backed generators for every configured credential.
    pub fn from_config(config: &AppConfig) -> Self {
        if !config.enrichment_enabled() {
            info!("No AI provider credentials configured; narratives are deterministic");
            return Self::disabled(config.ai_timeout).with_default_provider(config.default_provider);
        }
        Self::with_client(config, Client::builder().build())
    }

    /// Install generators over `client`. A client that failed to build leaves
    /// enrichment disabled instead of failing startup.
    fn with_client(config: &AppConfig, client: reqwest::Result<Client>) -> Self {
        let mut service =
            Self::disabled(config.ai_timeout).with_default_provider(config.default_provider);

        let client = match client {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build HTTP client, AI enrichment disabled: {}", e);
                return service;
            }
        };

        for provider in [AiProvider::OpenAi, AiProvider::Anthropic] {
            let Some(credentials) = config.credentials(provider).cloned() else {
                continue;
            };
            let generator: Arc<dyn TextGenerator> = match provider {
                AiProvider::OpenAi => Arc::new(OpenAiGenerator::new(client.clone(), credentials)),
                AiProvider::Anthropic => {
                    Arc::new(AnthropicGenerator::new(client.clone(), credentials))
                }
            };
            service = service.with_generator(generator);
        }
        service
    }

    /// Install (or replace) the generator for its provider.
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        match generator.provider() {
            AiProvider::OpenAi => self.openai = Some(generator),
            AiProvider::Anthropic => self.anthropic = Some(generator),
        }
        self
    }

    pub fn with_default_provider(mut self, provider: AiProvider) -> Self {
        self.default_provider = provider;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.openai.is_some() || self.anthropic.is_some()
    }

    fn generator(&self, provider: AiProvider) -> Option<&Arc<dyn TextGenerator>> {
        match provider {
            AiProvider::OpenAi => self.openai.as_ref(),
            AiProvider::Anthropic => self.anthropic.as_ref(),
        }
    }

    /// Requested provider if configured, then the default, then any other.
    pub fn select(&self, requested: Option<AiProvider>) -> Option<&Arc<dyn TextGenerator>> {
        requested
            .and_then(|provider| self.generator(provider))
            .or_else(|| self.generator(self.default_provider))
            .or_else(|| self.openai.as_ref())
            .or_else(|| self.anthropic.as_ref())
    }

    /// Ask a provider for an enriched narrative.
    pub async fn enrich(
        &self,
        requested: Option<AiProvider>,
        bundle: &RecommendationBundle,
        deterministic: &str,
    ) -> Result<(String, AiProvider), EnrichmentError> {
        let generator = self.select(requested).ok_or(EnrichmentError::NotConfigured)?;
        let prompt = build_prompt(bundle, deterministic);

        let text = tokio::time::timeout(self.timeout, generator.generate(SYSTEM_PROMPT, &prompt))
            .await
            .map_err(|_| EnrichmentError::Timeout(self.timeout))??;

        let text = text.trim();
        let length = text.chars().count();
        if length < MIN_AI_NARRATIVE_CHARS {
            return Err(EnrichmentError::TooShort(length));
        }
        Ok((text.to_string(), generator.provider()))
    }

    /// Pick the narrative for a response. Never fails: any enrichment error
    /// is logged and the deterministic narrative is used.
    pub async fn resolve_narrative(
        &self,
        requested: Option<AiProvider>,
        bundle: &RecommendationBundle,
        deterministic: String,
        request_id: Option<&str>,
    ) -> NarrativeOutcome {
        if !self.is_enabled() {
            return NarrativeOutcome {
                deterministic,
                ai: None,
                source: NarrativeSource::Deterministic,
            };
        }

        match self.enrich(requested, bundle, &deterministic).await {
            Ok((narrative, provider)) => {
                info!(
                    request_id = request_id.unwrap_or("-"),
                    provider = provider.as_str(),
                    "AI narrative generated"
                );
                NarrativeOutcome {
                    deterministic,
                    ai: Some(narrative),
                    source: NarrativeSource::Ai,
                }
            }
            Err(e) => {
                warn!(
                    request_id = request_id.unwrap_or("-"),
                    "AI enrichment failed, using deterministic narrative: {}", e
                );
                NarrativeOutcome {
                    deterministic,
                    ai: None,
                    source: NarrativeSource::Deterministic,
                }
            }
        }
    }
}

/// Prompt with the facts the model may use.
pub fn build_prompt(bundle: &RecommendationBundle, deterministic: &str) -> String {
    let titles = bundle
        .top_recommendations
        .iter()
        .map(|r| format!("- {} ({})", r.asset.title, r.reason))
        .collect::<Vec<_>>()
        .join("\n");
    let highlights = bundle.highlights.join("\n");

    format!(
        r#"Visitor company: {company} ({summary})
Visitor persona: {persona_name}, {role}
Visitor goal: {goal}

Recommended work:
{titles}

Highlights:
{highlights}

Baseline introduction:
{deterministic}

Rewrite the baseline introduction for this visitor, mentioning at most three of the recommended titles."#,
        company = bundle.company.name,
        summary = bundle.company.summary,
        persona_name = bundle.persona.name,
        role = bundle.persona.role,
        goal = bundle.persona.recommendation_goal,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::Catalog;
    use crate::services::recommendation_service::RecommendationService;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubGenerator {
        provider: AiProvider,
        reply: Result<&'static str, &'static str>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StubGenerator {
        fn ok(provider: AiProvider, reply: &'static str) -> Self {
            Self {
                provider,
                reply: Ok(reply),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(provider: AiProvider) -> Self {
            Self {
                provider,
                reply: Err("boom"),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        fn provider(&self) -> AiProvider {
            self.provider
        }

        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, EnrichmentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.reply {
                Ok(text) => Ok(text.to_string()),
                Err(body) => Err(EnrichmentError::Provider {
                    status: 500,
                    body: body.to_string(),
                }),
            }
        }
    }

    const LONG_REPLY: &str =
        "Welcome! As a CFO you will care most about the revenue analytics platform and the cloud cost work.";

    fn bundle() -> RecommendationBundle {
        RecommendationService::new(Arc::new(Catalog::builtin()))
            .get_recommendation_bundle("acme", "cfo")
            .unwrap()
    }

    #[test]
    fn provider_parsing() {
        assert_eq!(AiProvider::parse("OpenAI"), Some(AiProvider::OpenAi));
        assert_eq!(AiProvider::parse(" anthropic "), Some(AiProvider::Anthropic));
        assert_eq!(AiProvider::parse("gemini"), None);
        assert_eq!(
            serde_json::to_string(&AiProvider::OpenAi).unwrap(),
            "\"openai\""
        );
    }

    #[test]
    fn selection_prefers_requested_then_default_then_any() {
        let service = EnrichmentService::disabled(Duration::from_secs(1))
            .with_generator(Arc::new(StubGenerator::ok(AiProvider::Anthropic, LONG_REPLY)));

        // Requested provider missing, default (openai) missing, falls to anthropic.
        let selected = service.select(Some(AiProvider::OpenAi)).unwrap();
        assert_eq!(selected.provider(), AiProvider::Anthropic);

        let both = service
            .with_generator(Arc::new(StubGenerator::ok(AiProvider::OpenAi, LONG_REPLY)))
            .with_default_provider(AiProvider::Anthropic);
        assert_eq!(both.select(None).unwrap().provider(), AiProvider::Anthropic);
        assert_eq!(
            both.select(Some(AiProvider::OpenAi)).unwrap().provider(),
            AiProvider::OpenAi
        );
    }

    #[test]
    fn from_config_without_credentials_is_disabled() {
        let service = EnrichmentService::from_config(&AppConfig::default());
        assert!(!service.is_enabled());
        assert!(service.select(None).is_none());
    }

    fn config_with_keys() -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "ANTHROPIC_API_KEY" => Some("sk-ant-test".to_string()),
            "DEFAULT_AI_PROVIDER" => Some("anthropic".to_string()),
            _ => None,
        })
    }

    #[test]
    fn configured_credentials_install_both_generators() {
        let service = EnrichmentService::with_client(&config_with_keys(), Ok(Client::new()));
        assert!(service.is_enabled());
        assert_eq!(service.select(None).unwrap().provider(), AiProvider::Anthropic);
        assert_eq!(
            service.select(Some(AiProvider::OpenAi)).unwrap().provider(),
            AiProvider::OpenAi
        );
    }

    #[test]
    fn client_build_failure_disables_enrichment() {
        let broken = Client::new().get("not a url").build().map(|_| Client::new());
        assert!(broken.is_err());

        let service = EnrichmentService::with_client(&config_with_keys(), broken);
        assert!(!service.is_enabled());
        assert!(service.select(None).is_none());
    }

    #[tokio::test]
    async fn disabled_service_returns_deterministic_narrative() {
        let service = EnrichmentService::disabled(Duration::from_secs(1));
        let outcome = service
            .resolve_narrative(None, &bundle(), "baseline".to_string(), None)
            .await;
        assert_eq!(outcome.source, NarrativeSource::Deterministic);
        assert_eq!(outcome.deterministic, "baseline");
        assert!(outcome.ai.is_none());
    }

    #[tokio::test]
    async fn successful_enrichment_uses_ai_narrative() {
        let service = EnrichmentService::disabled(Duration::from_secs(1))
            .with_generator(Arc::new(StubGenerator::ok(AiProvider::OpenAi, LONG_REPLY)));
        let outcome = service
            .resolve_narrative(None, &bundle(), "baseline".to_string(), Some("req-1"))
            .await;
        assert_eq!(outcome.source, NarrativeSource::Ai);
        assert_eq!(outcome.ai.as_deref(), Some(LONG_REPLY));
        assert_eq!(outcome.deterministic, "baseline");
    }

    #[tokio::test]
    async fn provider_errors_fall_back() {
        let stub = Arc::new(StubGenerator::failing(AiProvider::OpenAi));
        let service = EnrichmentService::disabled(Duration::from_secs(1)).with_generator(stub.clone());
        let outcome = service
            .resolve_narrative(None, &bundle(), "baseline".to_string(), None)
            .await;
        assert_eq!(outcome.source, NarrativeSource::Deterministic);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn short_output_is_rejected() {
        let service = EnrichmentService::disabled(Duration::from_secs(1))
            .with_generator(Arc::new(StubGenerator::ok(AiProvider::OpenAi, "  Hi there.  ")));
        let err = service
            .enrich(None, &bundle(), "baseline")
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::TooShort(9)));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let mut slow = StubGenerator::ok(AiProvider::OpenAi, LONG_REPLY);
        slow.delay = Duration::from_secs(5);
        let service = EnrichmentService::disabled(Duration::from_millis(50))
            .with_generator(Arc::new(slow));

        let err = service
            .enrich(None, &bundle(), "baseline")
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::Timeout(_)));

        let outcome = service
            .resolve_narrative(None, &bundle(), "baseline".to_string(), None)
            .await;
        assert_eq!(outcome.source, NarrativeSource::Deterministic);
    }

    #[test]
    fn prompt_contains_visitor_facts() {
        let bundle = bundle();
        let prompt = build_prompt(&bundle, "baseline text");
        assert!(prompt.contains("Acme Capital"));
        assert!(prompt.contains("CFO"));
        assert!(prompt.contains("Real-time Revenue Analytics Platform"));
        assert!(prompt.contains("baseline text"));
    }
}
