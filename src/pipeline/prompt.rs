//! Prompt construction for generation and revision calls.
//!
//! Prompts are plain pt-BR text: an instruction block, the document type,
//! the one-line clinical context, the normalized payload as pretty JSON and
//! the schema contract as pretty JSON. Serialization of the payload cannot
//! fail for these types, so the builders are infallible.

use crate::models::ClinicalPayload;
use crate::pipeline::schema::DocumentSchema;

const GENERATION_INSTRUCTIONS: &str = "\
Você é um(a) médico(a) redator(a) que gera documentos clínicos estruturados no Brasil.
Regras obrigatórias:
- Utilize linguagem clínica clara, impessoal e baseada nos dados fornecidos.
- Não invente informações; quando algo estiver ausente, use \"não informado\".
- Harmonize sinais, sintomas, hipóteses e condutas.
- Mantenha foco em escrita e documentação (sem diagnósticos novos ou triagem).
- Responda sempre em duas partes, exatamente no formato:
  TEXTO:
  <documento final em prosa com as seções do tipo solicitado>
  JSON:
  <apenas um JSON válido conforme o esquema abaixo>
- Certifique-se de que o JSON resultante valida contra o schema e reflita o TEXTO.";

const REVISION_INSTRUCTIONS: &str = "\
Você é um(a) revisor(a) clínico-linguístico.
Objetivo: aprimorar a redação, padronizar termos médicos brasileiros e manter o conteúdo factual.
Regras:
- Não invente informações novas.
- Conserve números, nomes próprios e dados clínicos citados.
- Ajuste coerência, ortografia e terminologia técnica conforme boas práticas da APS.
- Responda apenas com o texto revisado em português.";

/// One-line clinical context summarizing the patient and vitals.
pub fn build_context(payload: &ClinicalPayload) -> String {
    format!(
        "{}, {}, {} anos | Queixa principal: {} | Sinais vitais: PA {}, FC {} bpm, Temp {} °C",
        payload.nome(),
        payload.sexo_text(),
        payload.idade_text(),
        payload.queixa_text(),
        payload.pa_text(),
        payload.fc_text(),
        payload.temp_text(),
    )
}

/// Full generation prompt for a normalized payload.
pub fn build_generation_prompt(
    doc_type_name: &str,
    payload: &ClinicalPayload,
    schema: &DocumentSchema,
    clinical_context: &str,
) -> String {
    let payload_json = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "{}".to_string());
    let schema_json = serde_json::to_string_pretty(&schema.to_json())
        .unwrap_or_else(|_| "{}".to_string());

    format!(
        "{GENERATION_INSTRUCTIONS}\n\n\
         TIPO_DOCUMENTO: {doc_type_name}\n\
         CONTEXTO CLÍNICO:\n{clinical_context}\n\n\
         DADOS ESTRUTURADOS:\n{payload_json}\n\n\
         SCHEMA JSON:\n{schema_json}\n\
         Finalize seguindo o formato exigido."
    )
}

/// Revision prompt for an existing document.
pub fn build_revision_prompt(texto: &str) -> String {
    format!("{REVISION_INSTRUCTIONS}\n\nTEXTO_ORIGINAL:\n{}", texto.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentType, Identificacao, Pessoa, SinaisVitais};
    use crate::pipeline::schema::get_schema;
    use serde_json::json;

    fn sample_payload() -> ClinicalPayload {
        ClinicalPayload {
            tipo_documento: "SOAP".to_string(),
            identificacao: Some(Identificacao {
                nome: Some("João Lima".to_string()),
                ..Default::default()
            }),
            pessoa: Some(Pessoa {
                idade: Some(json!(58)),
                sexo: Some("masculino".to_string()),
            }),
            queixa_principal: Some("Dispneia aos esforços".to_string()),
            sinais_vitais: Some(SinaisVitais {
                pa: Some("140x90".to_string()),
                fc: Some(json!(88)),
                temp: Some(json!("36,5")),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn context_line_has_all_segments() {
        let contexto = build_context(&sample_payload());
        assert_eq!(
            contexto,
            "João Lima, masculino, 58 anos | Queixa principal: Dispneia aos esforços | \
             Sinais vitais: PA 140x90, FC 88 bpm, Temp 36,5 °C",
        );
    }

    #[test]
    fn context_uses_sentinels_for_missing_data() {
        let contexto = build_context(&ClinicalPayload::default());
        assert!(contexto.starts_with("Paciente, não informado, não informado anos"));
        assert!(contexto.contains("Queixa principal: não informado"));
    }

    #[test]
    fn generation_prompt_embeds_all_blocks() {
        let payload = sample_payload();
        let schema = get_schema(DocumentType::Soap);
        let contexto = build_context(&payload);
        let prompt = build_generation_prompt("SOAP", &payload, schema, &contexto);

        assert!(prompt.contains("TIPO_DOCUMENTO: SOAP"));
        assert!(prompt.contains("CONTEXTO CLÍNICO:\nJoão Lima"));
        assert!(prompt.contains("DADOS ESTRUTURADOS:"));
        assert!(prompt.contains("\"queixa_principal\": \"Dispneia aos esforços\""));
        assert!(prompt.contains("SCHEMA JSON:"));
        assert!(prompt.contains("\"maxLength\": 6000"));
        assert!(prompt.contains("TEXTO:"));
        assert!(prompt.contains("JSON:"));
        assert!(prompt.ends_with("Finalize seguindo o formato exigido."));
    }

    #[test]
    fn revision_prompt_trims_input() {
        let prompt = build_revision_prompt("  Documento a revisar.  \n");
        assert!(prompt.ends_with("TEXTO_ORIGINAL:\nDocumento a revisar."));
        assert!(prompt.contains("revisor(a) clínico-linguístico"));
    }
}
