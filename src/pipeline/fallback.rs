//! Deterministic rule-based document generator.
//!
//! Used whenever every provider fails, returns empty prose, or returns JSON
//! that cannot be repaired. Templates fill gaps with the "não informado"
//! sentinel instead of inventing data. Total over the document type enum:
//! every variant has a template and every template's output validates
//! against its schema.

use serde_json::{json, Value};

use crate::models::{ClinicalPayload, DocumentType, NAO_INFORMADO};

/// Default leave duration (days) when an ATESTADO request carries none.
const DEFAULT_LEAVE_DAYS: i64 = 3;

/// Generate the deterministic (prose, structured JSON) pair for a payload.
pub fn fallback_document(doc_type: DocumentType, payload: &ClinicalPayload) -> (String, Value) {
    match doc_type {
        DocumentType::Soap => soap(payload),
        DocumentType::Atestado => atestado(payload),
        DocumentType::Encaminhamento => encaminhamento(payload),
        DocumentType::Parecer => parecer(payload),
        DocumentType::Laudo => laudo(payload),
    }
}

fn identificacao_json(payload: &ClinicalPayload) -> Value {
    json!({
        "nome": payload.nome(),
        "cpf": payload.cpf(),
        "cns": payload.cns(),
    })
}

fn or_sentinel(value: &str) -> &str {
    if value.is_empty() {
        NAO_INFORMADO
    } else {
        value
    }
}

fn soap(payload: &ClinicalPayload) -> (String, Value) {
    let mut subjetivo = format!(
        "{}, {}, {} anos, refere {}.",
        payload.nome(),
        payload.sexo_text(),
        payload.idade_text(),
        payload.queixa_text(),
    );
    if !payload.bullets.is_empty() {
        subjetivo.push_str(&format!(" Itens adicionais: {}.", payload.bullets.join("; ")));
    }
    let objetivo = format!(
        "Exame físico sem alterações importantes. Sinais vitais: PA {}, FC {} bpm, Temp {} °C.",
        payload.pa_text(),
        payload.fc_text(),
        payload.temp_text(),
    );
    let avaliacao = vec![payload.queixa_text()];
    let plano = vec![
        "Orientações gerais fornecidas".to_string(),
        "Sinais de alarme esclarecidos".to_string(),
        "Retorno programado conforme disponibilidade".to_string(),
    ];

    let texto = format!(
        "S: {subjetivo}\nO: {objetivo}\nA: {}\nP: {}",
        avaliacao.join(", "),
        plano.join("; "),
    );
    let json_out = json!({
        "S": subjetivo,
        "O": objetivo,
        "A": avaliacao,
        "P": plano,
        "referencias": [],
        "identificacao": identificacao_json(payload),
    });
    (texto, json_out)
}

fn atestado(payload: &ClinicalPayload) -> (String, Value) {
    let dias = payload
        .dias_afastamento
        .filter(|d| *d >= 1)
        .unwrap_or(DEFAULT_LEAVE_DAYS);
    let cid = payload
        .cid
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(NAO_INFORMADO);

    let texto = format!(
        "Atesto para fins legais que {} (CPF {}, CNS {}) foi avaliado(a) nesta unidade em {}. \
         Condição compatível com CID {}, com necessidade de afastamento por {} dia(s).",
        payload.nome(),
        or_sentinel(payload.cpf()),
        or_sentinel(payload.cns()),
        payload.motivo_text(),
        cid,
        dias,
    );
    let json_out = json!({
        "texto": texto,
        "cid": cid,
        "dias_afastamento": dias,
        "identificacao": identificacao_json(payload),
    });
    (texto, json_out)
}

fn encaminhamento(payload: &ClinicalPayload) -> (String, Value) {
    let especialidade = payload
        .especialidade
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or("especialidade pertinente");

    let texto = format!(
        "Encaminho {}, {}, {} anos, para avaliação em {}. Motivo: {}. \
         Sinais vitais atuais: PA {}, FC {} bpm, Temp {} °C.",
        payload.nome(),
        payload.sexo_text(),
        payload.idade_text(),
        especialidade,
        payload.queixa_text(),
        payload.pa_text(),
        payload.fc_text(),
        payload.temp_text(),
    );
    let json_out = json!({
        "texto": texto,
        "especialidade": especialidade,
        "referencias": [],
        "identificacao": identificacao_json(payload),
    });
    (texto, json_out)
}

fn parecer(payload: &ClinicalPayload) -> (String, Value) {
    let queixa = payload.queixa_text();
    let mut sintese = format!("SÍNTESE: {queixa}.");
    if !payload.bullets.is_empty() {
        sintese.push_str(&format!(" Itens adicionais: {}.", payload.bullets.join("; ")));
    }

    let texto = format!(
        "IDENTIFICAÇÃO: {} (CPF {}; CNS {}), {}, {} anos.\n\
         MOTIVO: {}.\n\
         {sintese}\n\
         ANÁLISE: {}.\n\
         CONCLUSÃO: quadro compatível com {queixa}.\n\
         RECOMENDAÇÕES: acompanhamento na APS, retorno programado e orientações reforçadas.",
        payload.nome(),
        or_sentinel(payload.cpf()),
        or_sentinel(payload.cns()),
        payload.sexo_text(),
        payload.idade_text(),
        payload.motivo_text(),
        payload.achados_text(),
    );
    let json_out = json!({
        "texto": texto,
        "motivo": payload.motivo_text(),
        "conclusao": [format!("Quadro compatível com {queixa}")],
        "recomendacoes": [
            "Acompanhamento na APS",
            "Retorno programado",
            "Sinais de alarme esclarecidos",
        ],
        "anexos": [],
        "identificacao": identificacao_json(payload),
    });
    (texto, json_out)
}

fn laudo(payload: &ClinicalPayload) -> (String, Value) {
    let queixa = payload.queixa_text();
    let achados_texto = payload.achados_text();

    let texto = format!(
        "IDENTIFICAÇÃO: {} (CPF {}; CNS {}), {}, {} anos.\n\
         MOTIVO: {}.\n\
         PROCEDIMENTO/EXAME: conforme avaliação clínica.\n\
         ACHADOS: {achados_texto}.\n\
         CONCLUSÃO: achados compatíveis com {queixa}.\n\
         RECOMENDAÇÕES: correlacionar com quadro clínico e manter acompanhamento na APS.",
        payload.nome(),
        or_sentinel(payload.cpf()),
        or_sentinel(payload.cns()),
        payload.sexo_text(),
        payload.idade_text(),
        payload.motivo_text(),
    );
    let achados: Vec<String> = achados_texto
        .split(';')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    let json_out = json!({
        "texto": texto,
        "motivo": payload.motivo_text(),
        "achados": achados,
        "conclusao": [format!("Achados compatíveis com {queixa}")],
        "recomendacoes": [
            "Correlacionar clinicamente",
            "Retorno programado",
            "Orientações de sinais de alarme",
        ],
        "anexos": [],
        "identificacao": identificacao_json(payload),
    });
    (texto, json_out)
}
