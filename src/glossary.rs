//! Terminology normalization for free-text clinical input.
//!
//! The glossary canonicalizes lay pt-BR terms ("dor de cabeça") into the
//! clinical vocabulary used in documents ("cefaleia") before any prompt is
//! built, so the same complaint always produces the same normalized payload
//! (and therefore the same cache fingerprint).
//!
//! The glossary is an explicit service constructed once at process start and
//! passed by reference into normalization calls, never a module-level
//! global.

use std::collections::BTreeMap;
use std::path::Path;

use crate::models::ClinicalPayload;

/// Built-in lay-term → clinical-term mappings.
const BUILTIN_SYNONYMS: &[(&str, &str)] = &[
    ("dor de cabeça", "cefaleia"),
    ("dor de barriga", "dor abdominal"),
    ("dor nas costas", "dor lombar"),
    ("pressão alta", "hipertensão arterial"),
    ("pressão baixa", "hipotensão arterial"),
    ("gripe", "síndrome gripal"),
    ("falta de ar", "dispneia"),
    ("coração acelerado", "palpitação"),
    ("enjoo", "náusea"),
    ("azia", "pirose"),
    ("tontura", "vertigem"),
];

/// Dictionary-backed terminology lookup.
///
/// A `BTreeMap` keeps replacement order deterministic, so normalization of
/// a given text is stable across runs.
#[derive(Debug, Clone)]
pub struct Glossary {
    entries: BTreeMap<String, String>,
}

impl Glossary {
    /// Glossary with only the built-in synonym set.
    pub fn builtin() -> Self {
        let entries = BUILTIN_SYNONYMS
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.to_string()))
            .collect();
        Self { entries }
    }

    /// Built-in set merged with entries from a JSON file
    /// (`{"lay term": "clinical term", ...}`). An unreadable or malformed
    /// file is logged and ignored; normalization must never block startup.
    pub fn load(path: &Path) -> Self {
        let mut glossary = Self::builtin();
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(extra) => {
                    for (k, v) in extra {
                        glossary.entries.insert(k.to_lowercase(), v);
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Malformed glossary file ignored");
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Glossary file unreadable, using builtin set");
            }
        }
        glossary
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.entries.contains_key(&term.to_lowercase())
    }

    /// Lowercase, substitute synonyms, then capitalize the first letter.
    pub fn normalize_text(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }
        let mut lowered = text.to_lowercase();
        for (lay, clinical) in &self.entries {
            lowered = lowered.replace(lay, clinical);
        }
        capitalize_first(&lowered)
    }

    /// Normalize each bullet, dropping empty entries.
    pub fn normalize_bullets(&self, bullets: &[String]) -> Vec<String> {
        bullets
            .iter()
            .filter(|b| !b.trim().is_empty())
            .map(|b| self.normalize_text(b))
            .collect()
    }

    /// Canonicalized clone of the payload: chief complaint and bullet list
    /// pass through the glossary; everything else is untouched.
    pub fn normalize_payload(&self, payload: &ClinicalPayload) -> ClinicalPayload {
        let mut normalized = payload.clone();
        normalized.queixa_principal = payload
            .queixa_principal
            .as_deref()
            .map(|q| self.normalize_text(q))
            .filter(|q| !q.is_empty());
        normalized.bullets = self.normalize_bullets(&payload.bullets);
        normalized
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Collapse runs of whitespace and strip carriage returns.
pub fn sanitize_text(text: &str) -> String {
    text.replace('\r', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
