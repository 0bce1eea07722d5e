//! Completion provider abstraction.
//!
//! Each backend implements the same small capability: a cheap reachability
//! probe plus a blocking prompt → completion call with an explicit timeout.
//! Backends are assembled into an ordered set at startup (preferred first,
//! then discovery order); adding a backend means implementing [`Provider`],
//! no orchestrator change.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;

/// Reachability probe timeout. Kept short because the probe runs on the
/// request path.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors from a single provider call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("backend unreachable at {0}")]
    Connection(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("backend returned status {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("backend returned an empty completion")]
    EmptyCompletion,

    #[error("malformed backend response: {0}")]
    Malformed(String),

    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("http error: {0}")]
    Http(String),
}

/// A completion backend.
///
/// `is_available` must never panic and should stay cheap; providers that
/// fail it are excluded from the active set for the request and never
/// attempted.
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;
    fn is_available(&self) -> bool;
    fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, ProviderError>;
}

// ═══════════════════════════════════════════════════════════
// Ollama: local model server over loopback HTTP
// ═══════════════════════════════════════════════════════════

/// Provider backed by a local Ollama instance.
pub struct OllamaProvider {
    base_url: String,
    model: String,
    temperature: f32,
    top_p: f32,
    client: reqwest::blocking::Client,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .build()
            .expect("Failed to create HTTP client");
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature: 0.2,
            top_p: 0.9,
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: serde_json::Value,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: Option<String>,
}

impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        self.client
            .get(&url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: json!({"temperature": self.temperature, "top_p": self.top_p}),
        };

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&body)
            .send()
            .map_err(|e| map_transport_error(e, &self.base_url, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        match parsed.response {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(ProviderError::EmptyCompletion),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// OpenAI: optional hosted API, gated on credential presence
// ═══════════════════════════════════════════════════════════

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_SYSTEM_MESSAGE: &str = "Você é um assistente de redação médica.";
const OPENAI_MAX_TOKENS: u32 = 1200;

/// Provider backed by the hosted OpenAI chat API. Only active when an API
/// key was present in the environment at startup.
pub struct OpenAiProvider {
    api_key: Option<String>,
    model: String,
    temperature: f32,
    top_p: f32,
    client: reqwest::blocking::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: Option<String>, model: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .build()
            .expect("Failed to create HTTP client");
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.to_string(),
            temperature: 0.2,
            top_p: 0.95,
            client,
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials("OPENAI_API_KEY"))?;

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": OPENAI_SYSTEM_MESSAGE},
                {"role": "user", "content": prompt},
            ],
            "temperature": self.temperature,
            "top_p": self.top_p,
            "max_tokens": OPENAI_MAX_TOKENS,
        });

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(api_key)
            .timeout(timeout)
            .json(&body)
            .send()
            .map_err(|e| map_transport_error(e, OPENAI_CHAT_URL, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }
        Ok(content)
    }
}

fn map_transport_error(e: reqwest::Error, endpoint: &str, timeout: Duration) -> ProviderError {
    if e.is_connect() {
        ProviderError::Connection(endpoint.to_string())
    } else if e.is_timeout() {
        ProviderError::Timeout(timeout.as_secs())
    } else {
        ProviderError::Http(e.to_string())
    }
}

// ═══════════════════════════════════════════════════════════
// Assembly
// ═══════════════════════════════════════════════════════════

/// Instantiate the configured providers in priority order: the preferred
/// provider (if named) first, then the rest in discovery order (ollama,
/// openai). Availability is probed per request by the orchestrator, not
/// here, so a backend that comes up later is picked up without a restart.
pub fn build_providers(config: &Config) -> Vec<Box<dyn Provider>> {
    let mut providers: Vec<Box<dyn Provider>> = vec![
        Box::new(OllamaProvider::new(&config.ollama_url, &config.ollama_model)),
        Box::new(OpenAiProvider::new(
            config.openai_api_key.clone(),
            &config.openai_model,
        )),
    ];

    if let Some(preferred) = config.preferred_provider.as_deref() {
        if let Some(idx) = providers.iter().position(|p| p.name() == preferred) {
            let chosen = providers.remove(idx);
            providers.insert(0, chosen);
        } else {
            tracing::warn!(preferred, "Unknown preferred provider, keeping discovery order");
        }
    }

    providers
}

// ═══════════════════════════════════════════════════════════
// Test doubles
// ═══════════════════════════════════════════════════════════

/// Scripted provider for tests: returns a fixed response and counts calls.
pub struct MockProvider {
    name: String,
    response: String,
    available: bool,
    calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl MockProvider {
    pub fn new(name: &str, response: &str) -> Self {
        Self {
            name: name.to_string(),
            response: response.to_string(),
            available: true,
            calls: std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0)),
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Shared call counter, usable after the provider is boxed away.
    pub fn call_counter(&self) -> std::sync::Arc<std::sync::atomic::AtomicUsize> {
        std::sync::Arc::clone(&self.calls)
    }
}

impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn generate(&self, _prompt: &str, _timeout: Duration) -> Result<String, ProviderError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Provider that always fails, counting attempts (for retry-bound tests).
pub struct FailingProvider {
    name: String,
    calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl FailingProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0)),
        }
    }

    pub fn call_counter(&self) -> std::sync::Arc<std::sync::atomic::AtomicUsize> {
        std::sync::Arc::clone(&self.calls)
    }
}

impl Provider for FailingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        true
    }

    fn generate(&self, _prompt: &str, _timeout: Duration) -> Result<String, ProviderError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Err(ProviderError::EmptyCompletion)
    }
}

/// Provider that fails a fixed number of times, then succeeds (for
/// retry-recovery tests).
pub struct FlakyProvider {
    name: String,
    failures: usize,
    response: String,
    calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl FlakyProvider {
    pub fn new(name: &str, failures: usize, response: &str) -> Self {
        Self {
            name: name.to_string(),
            failures,
            response: response.to_string(),
            calls: std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0)),
        }
    }

    pub fn call_counter(&self) -> std::sync::Arc<std::sync::atomic::AtomicUsize> {
        std::sync::Arc::clone(&self.calls)
    }
}

impl Provider for FlakyProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        true
    }

    fn generate(&self, _prompt: &str, _timeout: Duration) -> Result<String, ProviderError> {
        let attempt = self
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if attempt < self.failures {
            Err(ProviderError::Timeout(1))
        } else {
            Ok(self.response.clone())
        }
    }
}
