//! Plausibility rules over the structured output.
//!
//! Rules never fail generation: each violated rule contributes one pt-BR
//! alert string for the clinician to review. Identification is taken from
//! the generated document when present, otherwise from the request payload,
//! so provider-echoed identification wins.

use serde_json::Value;

use crate::models::{value_as_i64, ClinicalPayload, DocumentType, NAO_INFORMADO};

const TEMP_MIN: f64 = 30.0;
const TEMP_MAX: f64 = 43.0;
const LEAVE_DAYS_MAX: i64 = 30;
const RETURN_DAYS_MAX: i64 = 180;

/// Evaluate all plausibility rules, returning alerts in rule order.
pub fn evaluate_rules(
    doc_type: DocumentType,
    document: &Value,
    payload: &ClinicalPayload,
) -> Vec<String> {
    let mut alertas = Vec::new();

    check_temperature(payload, &mut alertas);
    check_identification(document, payload, &mut alertas);

    match doc_type {
        DocumentType::Atestado => check_atestado(document, &mut alertas),
        DocumentType::Soap => check_soap(document, &mut alertas),
        _ => {}
    }

    alertas
}

fn check_temperature(payload: &ClinicalPayload, alertas: &mut Vec<String>) {
    // Unparseable temperatures are ignored, not flagged.
    if let Some(temp) = payload.sinais_vitais.as_ref().and_then(|v| v.temp_as_f64()) {
        if !(TEMP_MIN..=TEMP_MAX).contains(&temp) {
            alertas.push("Temperatura fora de faixa plausível (30–43 °C).".to_string());
        }
    }
}

fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn check_identification(document: &Value, payload: &ClinicalPayload, alertas: &mut Vec<String>) {
    let from_document = document
        .get("identificacao")
        .and_then(Value::as_object)
        .filter(|obj| !obj.is_empty());

    let (cpf, cns) = match from_document {
        Some(obj) => (
            obj.get("cpf").and_then(Value::as_str).unwrap_or("").to_string(),
            obj.get("cns").and_then(Value::as_str).unwrap_or("").to_string(),
        ),
        None => (payload.cpf().to_string(), payload.cns().to_string()),
    };

    if !cpf.is_empty() && digits_only(&cpf).len() != 11 {
        alertas.push("CPF com formato/quantidade de dígitos inválido (esperado: 11).".to_string());
    }
    if !cns.is_empty() && digits_only(&cns).len() != 15 {
        alertas.push("CNS com formato/quantidade de dígitos inválido (esperado: 15).".to_string());
    }
}

fn check_atestado(document: &Value, alertas: &mut Vec<String>) {
    match document.get("dias_afastamento") {
        None | Some(Value::Null) => {
            alertas.push("Atestado sem 'dias_afastamento'.".to_string());
        }
        Some(value) => match value_as_i64(value) {
            Some(d) if (1..=LEAVE_DAYS_MAX).contains(&d) => {}
            Some(_) => {
                alertas.push("Dias de afastamento fora do intervalo usual (1–30).".to_string());
            }
            None => {
                alertas.push("Dias de afastamento inválido (não numérico).".to_string());
            }
        },
    }

    // The sentinel counts as missing: an atestado whose CID the provider
    // could not determine still needs clinician attention.
    let cid = document.get("cid").and_then(Value::as_str).unwrap_or("");
    if cid.trim().is_empty() || cid == NAO_INFORMADO {
        alertas.push("Atestado sem CID informado.".to_string());
    }
}

fn check_soap(document: &Value, alertas: &mut Vec<String>) {
    for campo in ["S", "O", "A", "P"] {
        if document.get(campo).is_none() {
            alertas.push(format!("Campo SOAP ausente: {campo}."));
        }
    }

    if let Some(retorno) = document.get("retorno_em_dias") {
        match value_as_i64(retorno) {
            Some(r) if (1..=RETURN_DAYS_MAX).contains(&r) => {}
            Some(_) => {
                alertas.push("retorno_em_dias fora do intervalo (1–180).".to_string());
            }
            None => {
                alertas.push("retorno_em_dias inválido (não numérico).".to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Identificacao, SinaisVitais};
    use serde_json::json;

    fn payload_with_temp(temp: Value) -> ClinicalPayload {
        ClinicalPayload {
            sinais_vitais: Some(SinaisVitais {
                temp: Some(temp),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn plausible_temperature_passes() {
        let alertas = evaluate_rules(
            DocumentType::Soap,
            &json!({"S": "", "O": "", "A": [], "P": []}),
            &payload_with_temp(json!(37.0)),
        );
        assert!(alertas.is_empty());
    }

    #[test]
    fn implausible_temperature_flagged() {
        let alertas = evaluate_rules(
            DocumentType::Soap,
            &json!({"S": "", "O": "", "A": [], "P": []}),
            &payload_with_temp(json!(45.2)),
        );
        assert_eq!(alertas, vec!["Temperatura fora de faixa plausível (30–43 °C)."]);
    }

    #[test]
    fn unparseable_temperature_ignored() {
        let alertas = evaluate_rules(
            DocumentType::Soap,
            &json!({"S": "", "O": "", "A": [], "P": []}),
            &payload_with_temp(json!("febril")),
        );
        assert!(alertas.is_empty());
    }

    #[test]
    fn short_cpf_flagged() {
        let payload = ClinicalPayload {
            identificacao: Some(Identificacao {
                cpf: Some("123".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let alertas = evaluate_rules(DocumentType::Encaminhamento, &json!({"texto": "t"}), &payload);
        assert_eq!(
            alertas,
            vec!["CPF com formato/quantidade de dígitos inválido (esperado: 11)."],
        );
    }

    #[test]
    fn formatted_cpf_accepted() {
        let payload = ClinicalPayload {
            identificacao: Some(Identificacao {
                cpf: Some("123.456.789-01".to_string()),
                cns: Some("123 4567 8901 2345".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let alertas = evaluate_rules(DocumentType::Encaminhamento, &json!({"texto": "t"}), &payload);
        assert!(alertas.is_empty());
    }

    #[test]
    fn document_identification_wins_over_payload() {
        let payload = ClinicalPayload {
            identificacao: Some(Identificacao {
                cpf: Some("123".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let document = json!({
            "texto": "t",
            "identificacao": {"cpf": "12345678901"},
        });
        let alertas = evaluate_rules(DocumentType::Encaminhamento, &document, &payload);
        assert!(alertas.is_empty());
    }

    #[test]
    fn empty_document_identification_falls_back_to_payload() {
        let payload = ClinicalPayload {
            identificacao: Some(Identificacao {
                cns: Some("999".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let document = json!({"texto": "t", "identificacao": {}});
        let alertas = evaluate_rules(DocumentType::Encaminhamento, &document, &payload);
        assert_eq!(
            alertas,
            vec!["CNS com formato/quantidade de dígitos inválido (esperado: 15)."],
        );
    }

    #[test]
    fn atestado_missing_days_flagged() {
        let alertas = evaluate_rules(
            DocumentType::Atestado,
            &json!({"texto": "t", "cid": "J06"}),
            &ClinicalPayload::default(),
        );
        assert_eq!(alertas, vec!["Atestado sem 'dias_afastamento'."]);
    }

    #[test]
    fn atestado_days_out_of_range_flagged() {
        let alertas = evaluate_rules(
            DocumentType::Atestado,
            &json!({"texto": "t", "cid": "J06", "dias_afastamento": 45}),
            &ClinicalPayload::default(),
        );
        assert_eq!(alertas, vec!["Dias de afastamento fora do intervalo usual (1–30)."]);
    }

    #[test]
    fn atestado_non_numeric_days_flagged() {
        let alertas = evaluate_rules(
            DocumentType::Atestado,
            &json!({"texto": "t", "cid": "J06", "dias_afastamento": "vários"}),
            &ClinicalPayload::default(),
        );
        assert_eq!(alertas, vec!["Dias de afastamento inválido (não numérico)."]);
    }

    #[test]
    fn atestado_sentinel_cid_counts_as_missing() {
        let alertas = evaluate_rules(
            DocumentType::Atestado,
            &json!({"texto": "t", "cid": NAO_INFORMADO, "dias_afastamento": 3}),
            &ClinicalPayload::default(),
        );
        assert_eq!(alertas, vec!["Atestado sem CID informado."]);
    }

    #[test]
    fn soap_missing_sections_flagged_in_order() {
        let alertas = evaluate_rules(
            DocumentType::Soap,
            &json!({"S": "presente"}),
            &ClinicalPayload::default(),
        );
        assert_eq!(
            alertas,
            vec![
                "Campo SOAP ausente: O.",
                "Campo SOAP ausente: A.",
                "Campo SOAP ausente: P.",
            ],
        );
    }

    #[test]
    fn soap_return_days_out_of_range() {
        let alertas = evaluate_rules(
            DocumentType::Soap,
            &json!({"S": "", "O": "", "A": [], "P": [], "retorno_em_dias": 365}),
            &ClinicalPayload::default(),
        );
        assert_eq!(alertas, vec!["retorno_em_dias fora do intervalo (1–180)."]);
    }

    #[test]
    fn soap_return_days_non_numeric() {
        let alertas = evaluate_rules(
            DocumentType::Soap,
            &json!({"S": "", "O": "", "A": [], "P": [], "retorno_em_dias": [7]}),
            &ClinicalPayload::default(),
        );
        assert_eq!(alertas, vec!["retorno_em_dias inválido (não numérico)."]);
    }

    #[test]
    fn multiple_alerts_accumulate() {
        let payload = ClinicalPayload {
            identificacao: Some(Identificacao {
                cpf: Some("12".to_string()),
                ..Default::default()
            }),
            ..payload_with_temp(json!(29.0))
        };
        let alertas = evaluate_rules(
            DocumentType::Atestado,
            &json!({"texto": "t"}),
            &payload,
        );
        assert_eq!(alertas.len(), 4);
        assert!(alertas[0].contains("Temperatura"));
        assert!(alertas[1].contains("CPF"));
        assert!(alertas[2].contains("dias_afastamento"));
        assert!(alertas[3].contains("CID"));
    }
}
