//! Pipeline output types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output of one document generation run.
///
/// `json` always validates against the schema for its document type by the
/// time the pipeline returns it: either directly from the provider, after a
/// merge repair, or because it is the fallback output. It embeds an
/// `identificacao` sub-object and a `_meta` sub-object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Final prose document.
    pub texto: String,
    /// Schema-conformant structured document.
    pub json: Value,
    /// Plausibility alerts, possibly empty. Never blocks generation.
    pub alertas: Vec<String>,
    /// Provider that produced the output, or `"fallback"`.
    pub provider: String,
}

/// Output of one text revision run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionResult {
    pub texto: String,
    pub provider: String,
}

/// Generation metadata embedded as `_meta` in every structured result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMeta {
    /// Local timestamp, seconds precision (ISO 8601 without offset).
    pub gerado_em: String,
    pub tipo_documento: String,
    pub provider: String,
}
