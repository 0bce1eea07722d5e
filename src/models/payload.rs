//! Input payload for one generation request.
//!
//! Field names follow the wire contract of the clinic-facing form (pt-BR).
//! Numeric-ish fields that callers routinely send as either numbers or
//! strings (`idade`, `fc`, `temp`) are kept as raw JSON values and read
//! through lenient accessors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed sentinel for any missing free-text datum.
pub const NAO_INFORMADO: &str = "não informado";

/// Patient identification block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identificacao {
    pub nome: Option<String>,
    /// CPF, the Brazilian national ID. 11 digits when well-formed.
    pub cpf: Option<String>,
    /// CNS, the national health-card number. 15 digits when well-formed.
    pub cns: Option<String>,
}

/// Basic demographics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pessoa {
    pub idade: Option<Value>,
    pub sexo: Option<String>,
}

/// Vital signs as captured at triage. `fc` and `temp` tolerate both
/// numeric and string encodings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinaisVitais {
    /// Blood pressure, free text (e.g. "120x80").
    pub pa: Option<String>,
    /// Heart rate, bpm.
    pub fc: Option<Value>,
    /// Temperature, °C.
    pub temp: Option<Value>,
}

impl SinaisVitais {
    /// Temperature as a float, tolerating string encodings.
    pub fn temp_as_f64(&self) -> Option<f64> {
        value_as_f64(self.temp.as_ref()?)
    }
}

/// Structured clinical input for one document generation request.
///
/// Immutable through the pipeline except for the normalization pass, which
/// returns a canonicalized clone (see `Glossary::normalize_payload`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicalPayload {
    pub tipo_documento: String,
    pub identificacao: Option<Identificacao>,
    pub pessoa: Option<Pessoa>,
    pub queixa_principal: Option<String>,
    pub bullets: Vec<String>,
    pub sinais_vitais: Option<SinaisVitais>,
    pub achados_exame: Vec<String>,
    pub hipoteses_previas: Vec<String>,
    pub preferencias_estilo: Option<Value>,
    // Type-specific fields.
    pub cid: Option<String>,
    pub dias_afastamento: Option<i64>,
    pub especialidade: Option<String>,
    pub motivo: Option<String>,
    pub finalidade: Option<String>,
    pub achados_texto: Option<String>,
}

impl Default for ClinicalPayload {
    fn default() -> Self {
        Self {
            tipo_documento: "SOAP".to_string(),
            identificacao: None,
            pessoa: None,
            queixa_principal: None,
            bullets: Vec::new(),
            sinais_vitais: None,
            achados_exame: Vec::new(),
            hipoteses_previas: Vec::new(),
            preferencias_estilo: None,
            cid: None,
            dias_afastamento: None,
            especialidade: None,
            motivo: None,
            finalidade: None,
            achados_texto: None,
        }
    }
}

impl ClinicalPayload {
    /// Patient name, defaulting to the generic "Paciente".
    pub fn nome(&self) -> &str {
        self.identificacao
            .as_ref()
            .and_then(|i| i.nome.as_deref())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Paciente")
    }

    pub fn cpf(&self) -> &str {
        self.identificacao
            .as_ref()
            .and_then(|i| i.cpf.as_deref())
            .unwrap_or("")
    }

    pub fn cns(&self) -> &str {
        self.identificacao
            .as_ref()
            .and_then(|i| i.cns.as_deref())
            .unwrap_or("")
    }

    pub fn idade_text(&self) -> String {
        self.pessoa
            .as_ref()
            .and_then(|p| p.idade.as_ref())
            .map(value_display)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NAO_INFORMADO.to_string())
    }

    pub fn sexo_text(&self) -> String {
        text_or_sentinel(self.pessoa.as_ref().and_then(|p| p.sexo.as_deref()))
    }

    pub fn queixa_text(&self) -> String {
        text_or_sentinel(self.queixa_principal.as_deref())
    }

    pub fn pa_text(&self) -> String {
        text_or_sentinel(self.sinais_vitais.as_ref().and_then(|v| v.pa.as_deref()))
    }

    pub fn fc_text(&self) -> String {
        self.sinais_vitais
            .as_ref()
            .and_then(|v| v.fc.as_ref())
            .map(value_display)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NAO_INFORMADO.to_string())
    }

    pub fn temp_text(&self) -> String {
        self.sinais_vitais
            .as_ref()
            .and_then(|v| v.temp.as_ref())
            .map(value_display)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NAO_INFORMADO.to_string())
    }

    /// Reason/purpose for opinion and report documents: `motivo` wins over
    /// the legacy `finalidade` alias.
    pub fn motivo_text(&self) -> String {
        text_or_sentinel(
            self.motivo
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .or(self.finalidade.as_deref()),
        )
    }

    pub fn achados_text(&self) -> String {
        text_or_sentinel(self.achados_texto.as_deref())
    }
}

fn text_or_sentinel(value: Option<&str>) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => NAO_INFORMADO.to_string(),
    }
}

/// Render a scalar JSON value without surrounding quotes.
fn value_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Lenient float coercion: numbers pass through, numeric strings parse.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// Lenient integer coercion: integers pass through, floats truncate,
/// numeric strings parse.
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| s.trim().parse::<f64>().ok().map(|f| f as i64)),
        _ => None,
    }
}
