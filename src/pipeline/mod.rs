//! Generation orchestration pipeline.
//!
//! Stages, strictly ordered:
//! normalize → context → cache lookup → prompt → provider loop (retry) →
//! parse → validate (+ merge repair) → rules → metadata → cache store.
//!
//! Only two error shapes ever leave the pipeline: an unsupported document
//! type (input error, rejected immediately) and a repair that still fails
//! validation (an internal defect, since the fallback generator's output
//! must always validate). Every provider, parse, or validation problem along the
//! way is absorbed by the retry loop, the fallback generator, or the merge
//! repair.

pub mod cache;
pub mod fallback;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod providers;
pub mod rules;
pub mod schema;

pub use cache::{fingerprint, ResponseCache};
pub use orchestrator::{DocumentPipeline, PipelineOptions, RetryPolicy, FALLBACK_PROVIDER};
pub use parser::parse_completion;
pub use providers::{build_providers, Provider, ProviderError};
pub use schema::{get_schema, DocumentSchema, SchemaViolation};

use crate::models::UnknownDocumentType;

/// Errors the pipeline surfaces to callers.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Input error: the request names no known document type. Not retried;
    /// the API layer maps this to a client-facing rejection.
    #[error(transparent)]
    UnsupportedDocumentType(#[from] UnknownDocumentType),

    /// Fatal defect: the merge-repaired document still violates its schema.
    /// The fallback generator is total, so this indicates a broken template
    /// or schema and must propagate rather than be swallowed.
    #[error("Documento reparado ainda inválido: {0}")]
    Internal(#[from] SchemaViolation),
}
