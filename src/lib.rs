//! Escriba: drafting assistant for clinical documents in Brazilian primary
//! care (pt-BR).
//!
//! The crate turns a structured clinical payload into one of five document
//! types (SOAP, ATESTADO, ENCAMINHAMENTO, PARECER, LAUDO) through a
//! provider-backed generation pipeline with retries, schema validation,
//! merge repair and a deterministic fallback, so generation never depends
//! on a model being reachable. Around the pipeline sit a small HTTP API,
//! export bundling and JSONL session history.

pub mod api;
pub mod config;
pub mod export;
pub mod glossary;
pub mod history;
pub mod models;
pub mod pipeline;
