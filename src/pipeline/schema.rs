//! Schema registry: one validation contract per document type.
//!
//! The registry is static, process-wide, and read-only. Validation reports
//! the first violation found; extra properties are always allowed (the
//! provider may echo payload fields back, and `_meta` is attached after
//! validation anyway).

use serde_json::{json, Value};

use crate::models::DocumentType;

/// Per-field value contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// String with an optional maximum length in characters.
    Text { max_len: Option<usize> },
    /// Integer ≥ 0.
    NonNegativeInt,
    /// Array of strings.
    TextList,
    /// Nested object (identification block).
    Object,
}

/// One named field of a document schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: false,
    }
}

const TEXT: FieldKind = FieldKind::Text { max_len: None };
const fn text_max(max_len: usize) -> FieldKind {
    FieldKind::Text {
        max_len: Some(max_len),
    }
}

/// Validation contract for one document type.
#[derive(Debug, Clone, Copy)]
pub struct DocumentSchema {
    pub doc_type: DocumentType,
    pub fields: &'static [FieldSpec],
}

static SOAP: DocumentSchema = DocumentSchema {
    doc_type: DocumentType::Soap,
    fields: &[
        required("S", text_max(6000)),
        required("O", text_max(6000)),
        required("A", FieldKind::TextList),
        required("P", FieldKind::TextList),
        optional("referencias", FieldKind::TextList),
        optional("retorno_em_dias", FieldKind::NonNegativeInt),
        optional("identificacao", FieldKind::Object),
    ],
};

static ATESTADO: DocumentSchema = DocumentSchema {
    doc_type: DocumentType::Atestado,
    fields: &[
        required("texto", text_max(4000)),
        required("cid", TEXT),
        required("dias_afastamento", FieldKind::NonNegativeInt),
        optional("identificacao", FieldKind::Object),
    ],
};

static ENCAMINHAMENTO: DocumentSchema = DocumentSchema {
    doc_type: DocumentType::Encaminhamento,
    fields: &[
        required("texto", text_max(5000)),
        optional("especialidade", TEXT),
        optional("referencias", FieldKind::TextList),
        optional("identificacao", FieldKind::Object),
    ],
};

static PARECER: DocumentSchema = DocumentSchema {
    doc_type: DocumentType::Parecer,
    fields: &[
        required("texto", text_max(6000)),
        optional("motivo", TEXT),
        optional("conclusao", FieldKind::TextList),
        optional("recomendacoes", FieldKind::TextList),
        optional("anexos", FieldKind::TextList),
        optional("identificacao", FieldKind::Object),
    ],
};

static LAUDO: DocumentSchema = DocumentSchema {
    doc_type: DocumentType::Laudo,
    fields: &[
        required("texto", text_max(6000)),
        optional("motivo", TEXT),
        optional("achados", FieldKind::TextList),
        optional("conclusao", FieldKind::TextList),
        optional("recomendacoes", FieldKind::TextList),
        optional("anexos", FieldKind::TextList),
        optional("identificacao", FieldKind::Object),
    ],
};

/// Look up the schema for a document type. Infallible: parsing the wire
/// string into `DocumentType` is the input gate.
pub fn get_schema(doc_type: DocumentType) -> &'static DocumentSchema {
    match doc_type {
        DocumentType::Soap => &SOAP,
        DocumentType::Atestado => &ATESTADO,
        DocumentType::Encaminhamento => &ENCAMINHAMENTO,
        DocumentType::Parecer => &PARECER,
        DocumentType::Laudo => &LAUDO,
    }
}

/// First schema violation found in a structured document.
#[derive(Debug, Clone, thiserror::Error)]
#[error("campo '{field}': {message}")]
pub struct SchemaViolation {
    pub field: String,
    pub message: String,
}

impl SchemaViolation {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl DocumentSchema {
    /// Validate a structured document, reporting the first violation.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        let obj = value
            .as_object()
            .ok_or_else(|| SchemaViolation::new("$", "documento deve ser um objeto JSON"))?;

        for spec in self.fields {
            match obj.get(spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(SchemaViolation::new(spec.name, "campo obrigatório ausente"));
                    }
                }
                Some(field_value) => validate_kind(spec, field_value)?,
            }
        }
        Ok(())
    }

    /// Render the JSON-Schema-like contract embedded in generation prompts.
    pub fn to_json(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required_names = Vec::new();
        for spec in self.fields {
            if spec.required {
                required_names.push(spec.name);
            }
            let prop = match spec.kind {
                FieldKind::Text { max_len: Some(max) } => {
                    json!({"type": "string", "maxLength": max})
                }
                FieldKind::Text { max_len: None } => json!({"type": "string"}),
                FieldKind::NonNegativeInt => json!({"type": "integer", "minimum": 0}),
                FieldKind::TextList => json!({"type": "array", "items": {"type": "string"}}),
                FieldKind::Object => identification_schema_json(),
            };
            properties.insert(spec.name.to_string(), prop);
        }
        json!({
            "type": "object",
            "required": required_names,
            "properties": properties,
            "additionalProperties": true,
        })
    }
}

fn identification_schema_json() -> Value {
    json!({
        "type": "object",
        "properties": {
            "nome": {"type": "string"},
            "cpf": {"type": "string"},
            "cns": {"type": "string"},
        },
        "additionalProperties": true,
    })
}

fn validate_kind(spec: &FieldSpec, value: &Value) -> Result<(), SchemaViolation> {
    match spec.kind {
        FieldKind::Text { max_len } => {
            let text = value
                .as_str()
                .ok_or_else(|| SchemaViolation::new(spec.name, "esperado texto"))?;
            if let Some(max) = max_len {
                let len = text.chars().count();
                if len > max {
                    return Err(SchemaViolation::new(
                        spec.name,
                        format!("texto com {len} caracteres excede o máximo de {max}"),
                    ));
                }
            }
            Ok(())
        }
        FieldKind::NonNegativeInt => {
            let n = value
                .as_i64()
                .ok_or_else(|| SchemaViolation::new(spec.name, "esperado número inteiro"))?;
            if n < 0 {
                return Err(SchemaViolation::new(spec.name, "esperado inteiro não negativo"));
            }
            Ok(())
        }
        FieldKind::TextList => {
            let items = value
                .as_array()
                .ok_or_else(|| SchemaViolation::new(spec.name, "esperada lista de textos"))?;
            if items.iter().any(|item| !item.is_string()) {
                return Err(SchemaViolation::new(
                    spec.name,
                    "lista contém item que não é texto",
                ));
            }
            Ok(())
        }
        FieldKind::Object => {
            if value.is_object() {
                Ok(())
            } else {
                Err(SchemaViolation::new(spec.name, "esperado objeto"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn soap_accepts_complete_document() {
        let doc = json!({
            "S": "Paciente refere cefaleia leve.",
            "O": "Exame sem alterações relevantes.",
            "A": ["Cefaleia tensional"],
            "P": ["Orientado repouso e hidratação"],
            "identificacao": {"nome": "Paciente", "cpf": "00000000000"},
        });
        get_schema(DocumentType::Soap).validate(&doc).unwrap();
    }

    #[test]
    fn soap_rejects_missing_section() {
        let doc = json!({"S": "apenas"});
        let err = get_schema(DocumentType::Soap).validate(&doc).unwrap_err();
        assert_eq!(err.field, "O");
        assert!(err.message.contains("obrigatório"));
    }

    #[test]
    fn soap_rejects_wrong_section_type() {
        let doc = json!({
            "S": "ok", "O": "ok", "A": "não é lista", "P": [],
        });
        let err = get_schema(DocumentType::Soap).validate(&doc).unwrap_err();
        assert_eq!(err.field, "A");
    }

    #[test]
    fn atestado_rejects_negative_days() {
        let doc = json!({"texto": "t", "cid": "J06", "dias_afastamento": -1});
        let err = get_schema(DocumentType::Atestado).validate(&doc).unwrap_err();
        assert_eq!(err.field, "dias_afastamento");
    }

    #[test]
    fn atestado_rejects_non_integer_days() {
        let doc = json!({"texto": "t", "cid": "J06", "dias_afastamento": "três"});
        let err = get_schema(DocumentType::Atestado).validate(&doc).unwrap_err();
        assert_eq!(err.field, "dias_afastamento");
        assert!(err.message.contains("inteiro"));
    }

    #[test]
    fn text_length_limit_enforced() {
        let doc = json!({
            "texto": "x".repeat(4001),
            "cid": "J06",
            "dias_afastamento": 3,
        });
        let err = get_schema(DocumentType::Atestado).validate(&doc).unwrap_err();
        assert_eq!(err.field, "texto");
        assert!(err.message.contains("4000"));
    }

    #[test]
    fn non_object_document_rejected() {
        let err = get_schema(DocumentType::Laudo)
            .validate(&json!(["não", "é", "objeto"]))
            .unwrap_err();
        assert_eq!(err.field, "$");
    }

    #[test]
    fn null_required_field_counts_as_missing() {
        let doc = json!({"texto": "t", "cid": null, "dias_afastamento": 1});
        let err = get_schema(DocumentType::Atestado).validate(&doc).unwrap_err();
        assert_eq!(err.field, "cid");
    }

    #[test]
    fn extra_properties_allowed() {
        let doc = json!({
            "texto": "Encaminho o paciente.",
            "campo_extra": {"qualquer": "coisa"},
        });
        get_schema(DocumentType::Encaminhamento).validate(&doc).unwrap();
    }

    #[test]
    fn every_type_has_a_schema_with_texto_or_sections() {
        for doc_type in DocumentType::ALL {
            let schema = get_schema(doc_type);
            assert_eq!(schema.doc_type, doc_type);
            assert!(schema.fields.iter().any(|f| f.required));
        }
    }

    #[test]
    fn schema_json_shape() {
        let rendered = get_schema(DocumentType::Soap).to_json();
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["required"], json!(["S", "O", "A", "P"]));
        assert_eq!(rendered["properties"]["S"]["maxLength"], 6000);
        assert_eq!(
            rendered["properties"]["retorno_em_dias"]["minimum"],
            0,
        );
        assert_eq!(
            rendered["properties"]["identificacao"]["properties"]["cns"]["type"],
            "string",
        );
    }
}
