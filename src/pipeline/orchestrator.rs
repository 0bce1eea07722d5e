//! Pipeline orchestrator: providers, retries, repair, rules, cache.
//!
//! The orchestrator owns the ordered provider set and walks it per request:
//! each available provider gets `max_retries + 1` attempts with exponential
//! backoff, the first usable completion wins, and when everyone fails the
//! deterministic fallback takes over. Generation therefore only fails for
//! an unsupported document type or an internal repair defect.

use std::time::Duration;

use serde_json::Value;

use crate::config::Config;
use crate::glossary::{sanitize_text, Glossary};
use crate::models::{ClinicalPayload, DocumentType, GenerationMeta, GenerationResult, RevisionResult};
use crate::pipeline::cache::{fingerprint, ResponseCache};
use crate::pipeline::fallback::fallback_document;
use crate::pipeline::parser::parse_completion;
use crate::pipeline::prompt::{build_context, build_generation_prompt, build_revision_prompt};
use crate::pipeline::providers::{Provider, ProviderError};
use crate::pipeline::rules::evaluate_rules;
use crate::pipeline::schema::get_schema;
use crate::pipeline::PipelineError;

/// Provider name reported when the deterministic generator produced the
/// output.
pub const FALLBACK_PROVIDER: &str = "fallback";

/// Retry behavior for one provider.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the retry following `attempt` (0-based):
    /// `base_backoff * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt)
    }
}

/// Tunables for a pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    pub cache_capacity: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(45),
            cache_capacity: 64,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_backoff: config.retry_backoff,
            },
            request_timeout: config.request_timeout,
            cache_capacity: config.cache_capacity,
        }
    }
}

/// Document generation pipeline.
///
/// Thread-safe: all interior mutability lives in the caches, so a single
/// instance is shared behind an `Arc` by the API handlers.
pub struct DocumentPipeline {
    providers: Vec<Box<dyn Provider>>,
    glossary: Glossary,
    retry: RetryPolicy,
    request_timeout: Duration,
    gen_cache: ResponseCache<GenerationResult>,
    rev_cache: ResponseCache<RevisionResult>,
}

impl DocumentPipeline {
    pub fn new(
        providers: Vec<Box<dyn Provider>>,
        glossary: Glossary,
        options: PipelineOptions,
    ) -> Self {
        Self {
            providers,
            glossary,
            retry: options.retry,
            request_timeout: options.request_timeout,
            gen_cache: ResponseCache::new(options.cache_capacity),
            rev_cache: ResponseCache::new(options.cache_capacity),
        }
    }

    /// Name and current availability of every configured provider.
    pub fn provider_status(&self) -> Vec<(String, bool)> {
        self.providers
            .iter()
            .map(|p| (p.name().to_string(), p.is_available()))
            .collect()
    }

    /// Generate a document for the payload.
    ///
    /// Stage order is fixed: normalize, context, cache lookup, prompt,
    /// provider loop, parse, validate and repair, rules, metadata, cache
    /// store. Identical normalized inputs hit the cache and never reach a
    /// provider.
    pub fn generate(&self, payload: &ClinicalPayload) -> Result<GenerationResult, PipelineError> {
        let type_name = payload.tipo_documento.trim();
        let doc_type: DocumentType = if type_name.is_empty() {
            DocumentType::Soap
        } else {
            type_name.parse()?
        };

        let normalized = self.glossary.normalize_payload(payload);
        let contexto = build_context(&normalized);
        let payload_json = serde_json::to_string(&normalized).unwrap_or_default();
        let cache_key = fingerprint(&[
            &doc_type.to_string(),
            &sanitize_text(&payload_json),
            &contexto,
        ]);
        if let Some(hit) = self.gen_cache.get(&cache_key) {
            tracing::debug!(tipo = %doc_type, "Cache hit, skipping providers");
            return Ok(hit);
        }

        let schema = get_schema(doc_type);
        let prompt = build_generation_prompt(&doc_type.to_string(), &normalized, schema, &contexto);

        let (fallback_texto, fallback_json) = fallback_document(doc_type, &normalized);

        let (mut texto, provider_json, provider_name) = match self.first_completion(&prompt) {
            Some((raw, name)) => {
                let (prose, json) = parse_completion(&raw);
                (prose, json, name)
            }
            None => {
                tracing::info!(tipo = %doc_type, "All providers failed, using deterministic fallback");
                (
                    fallback_texto.clone(),
                    fallback_json.clone(),
                    FALLBACK_PROVIDER.to_string(),
                )
            }
        };

        if texto.trim().is_empty() {
            texto = fallback_texto;
        }

        let mut json_out = if is_empty_document(&provider_json) {
            fallback_json
        } else if schema.validate(&provider_json).is_ok() {
            provider_json
        } else {
            let merged = merge_documents(&provider_json, fallback_json);
            schema.validate(&merged)?;
            tracing::warn!(
                tipo = %doc_type,
                provider = %provider_name,
                "Provider JSON failed validation, repaired by merge",
            );
            merged
        };

        let alertas = evaluate_rules(doc_type, &json_out, &normalized);

        let meta = GenerationMeta {
            gerado_em: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            tipo_documento: doc_type.to_string(),
            provider: provider_name.clone(),
        };
        if let Some(obj) = json_out.as_object_mut() {
            if let Ok(meta_value) = serde_json::to_value(&meta) {
                obj.insert("_meta".to_string(), meta_value);
            }
        }

        let result = GenerationResult {
            texto,
            json: json_out,
            alertas,
            provider: provider_name,
        };
        self.gen_cache.insert(&cache_key, result.clone());
        Ok(result)
    }

    /// Revise free text. Infallible: when every provider fails the original
    /// text comes back sanitized, attributed to the fallback provider.
    pub fn revise(&self, texto: &str) -> RevisionResult {
        let cache_key = fingerprint(&["revision", &sanitize_text(texto)]);
        if let Some(hit) = self.rev_cache.get(&cache_key) {
            return hit;
        }

        let prompt = build_revision_prompt(texto);
        let result = match self.first_completion(&prompt) {
            Some((revised, name)) => RevisionResult {
                texto: revised.trim().to_string(),
                provider: name,
            },
            None => {
                tracing::info!("Revision falling back to sanitized original text");
                RevisionResult {
                    texto: sanitize_text(texto),
                    provider: FALLBACK_PROVIDER.to_string(),
                }
            }
        };
        self.rev_cache.insert(&cache_key, result.clone());
        result
    }

    /// Walk available providers in order, returning the first completion
    /// along with the provider name.
    fn first_completion(&self, prompt: &str) -> Option<(String, String)> {
        for provider in &self.providers {
            if !provider.is_available() {
                tracing::debug!(provider = provider.name(), "Provider unavailable, skipping");
                continue;
            }
            match self.call_with_retry(provider.as_ref(), prompt) {
                Ok(raw) => return Some((raw, provider.name().to_string())),
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "Provider exhausted");
                }
            }
        }
        None
    }

    fn call_with_retry(&self, provider: &dyn Provider, prompt: &str) -> Result<String, ProviderError> {
        let mut last_error = ProviderError::EmptyCompletion;
        for attempt in 0..=self.retry.max_retries {
            tracing::debug!(provider = provider.name(), attempt = attempt + 1, "Provider attempt");
            match provider.generate(prompt, self.request_timeout) {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        attempt = attempt + 1,
                        error = %e,
                        "Provider attempt failed",
                    );
                    last_error = e;
                }
            }
            if attempt < self.retry.max_retries {
                std::thread::sleep(self.retry.backoff(attempt));
            }
        }
        Err(last_error)
    }
}

fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(obj) => obj.is_empty(),
        _ => false,
    }
}

/// Overlay non-empty provider fields onto the fallback document. A provider
/// value counts as empty when it is null, an empty string, an empty array
/// or an empty object; those never overwrite the fallback. Non-object
/// provider output cannot be merged and yields the fallback unchanged.
fn merge_documents(preferred: &Value, fallback: Value) -> Value {
    let Some(preferred_obj) = preferred.as_object() else {
        return fallback;
    };
    let mut merged = match fallback {
        Value::Object(obj) => obj,
        other => return other,
    };
    for (key, value) in preferred_obj {
        let empty = match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        };
        if !empty {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}
