use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The five supported clinical document types.
///
/// Wire format uses the uppercase Portuguese names (`"SOAP"`, `"ATESTADO"`, …)
/// as submitted by the form/API layer. Parsing is case-insensitive; any other
/// value is a hard input error handled at the pipeline entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    /// Subjective / Objective / Assessment / Plan consultation note.
    Soap,
    /// Work-leave certificate (atestado médico).
    Atestado,
    /// Referral to a specialty (encaminhamento).
    Encaminhamento,
    /// Clinical opinion (parecer).
    Parecer,
    /// Clinical report (laudo).
    Laudo,
}

impl DocumentType {
    /// All supported types, in registry order.
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Soap,
        DocumentType::Atestado,
        DocumentType::Encaminhamento,
        DocumentType::Parecer,
        DocumentType::Laudo,
    ];
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Soap => "SOAP",
            Self::Atestado => "ATESTADO",
            Self::Encaminhamento => "ENCAMINHAMENTO",
            Self::Parecer => "PARECER",
            Self::Laudo => "LAUDO",
        };
        write!(f, "{name}")
    }
}

/// Error returned when a wire string names no known document type.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Tipo de documento não suportado: {0}")]
pub struct UnknownDocumentType(pub String);

impl FromStr for DocumentType {
    type Err = UnknownDocumentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SOAP" => Ok(Self::Soap),
            "ATESTADO" => Ok(Self::Atestado),
            "ENCAMINHAMENTO" => Ok(Self::Encaminhamento),
            "PARECER" => Ok(Self::Parecer),
            "LAUDO" => Ok(Self::Laudo),
            other => Err(UnknownDocumentType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("soap".parse::<DocumentType>().unwrap(), DocumentType::Soap);
        assert_eq!(
            " Atestado ".parse::<DocumentType>().unwrap(),
            DocumentType::Atestado,
        );
        assert_eq!(
            "LAUDO".parse::<DocumentType>().unwrap(),
            DocumentType::Laudo,
        );
    }

    #[test]
    fn rejects_unknown_type() {
        let err = "RECEITA".parse::<DocumentType>().unwrap_err();
        assert!(err.to_string().contains("RECEITA"));
    }

    #[test]
    fn display_is_uppercase_wire_name() {
        assert_eq!(DocumentType::Encaminhamento.to_string(), "ENCAMINHAMENTO");
        assert_eq!(DocumentType::Parecer.to_string(), "PARECER");
    }

    #[test]
    fn serializes_to_wire_name() {
        let json = serde_json::to_string(&DocumentType::Atestado).unwrap();
        assert_eq!(json, "\"ATESTADO\"");
        let back: DocumentType = serde_json::from_str("\"SOAP\"").unwrap();
        assert_eq!(back, DocumentType::Soap);
    }

    #[test]
    fn all_lists_five_types() {
        assert_eq!(DocumentType::ALL.len(), 5);
    }
}
