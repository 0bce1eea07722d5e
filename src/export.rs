//! Document export: professional stamp, JSON bytes and tar.gz bundles.
//!
//! Exports are plain artifacts (UTF-8 text, JSON, optionally gzip) plus a
//! compressed bundle holding the prose document, the structured document
//! and the session metadata side by side.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Professional stamp settings, as configured by the clinician.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StampConfig {
    pub habilitar: bool,
    pub nome: String,
    pub crm: String,
    pub uf: String,
    pub especialidade: String,
}

/// Compose the footer stamp line, `nome | CRM UF nnn | especialidade`.
/// Disabled or fully empty configurations produce no stamp.
pub fn compose_stamp(config: &StampConfig) -> Option<String> {
    if !config.habilitar {
        return None;
    }
    let nome = config.nome.trim();
    let crm = config.crm.trim();
    let uf = config.uf.trim();
    let especialidade = config.especialidade.trim();
    if nome.is_empty() && crm.is_empty() && especialidade.is_empty() {
        return None;
    }

    let mut partes = Vec::new();
    if !nome.is_empty() {
        partes.push(nome.to_string());
    }
    if !crm.is_empty() {
        if uf.is_empty() {
            partes.push(format!("CRM {crm}"));
        } else {
            partes.push(format!("CRM {uf} {crm}"));
        }
    }
    if !especialidade.is_empty() {
        partes.push(especialidade.to_string());
    }
    Some(partes.join(" | "))
}

/// Final prose document with the stamp appended as a footer line.
pub fn render_text_document(texto: &str, stamp: Option<&str>) -> String {
    match stamp {
        Some(stamp) if !stamp.is_empty() => format!("{}\n\n{stamp}\n", texto.trim_end()),
        _ => format!("{}\n", texto.trim_end()),
    }
}

/// Serialize a structured document to bytes, optionally compact and
/// optionally gzip-compressed.
pub fn export_json(data: &Value, compact: bool, compress: bool) -> Result<Vec<u8>, ExportError> {
    let payload = if compact {
        serde_json::to_vec(data)?
    } else {
        serde_json::to_vec_pretty(data)?
    };
    if !compress {
        return Ok(payload);
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&payload)?;
    Ok(encoder.finish()?)
}

/// Export bundle written to disk: the archive bytes and their path.
#[derive(Debug)]
pub struct ExportBundle {
    pub bytes: Vec<u8>,
    pub path: PathBuf,
}

/// Build a tar.gz bundle (`documento.txt`, `documento.json`,
/// `session.json`) and write it under `export_dir`.
///
/// The file name embeds the generation timestamp from `_meta` when present
/// (colons replaced so the name is portable), otherwise the current time.
pub fn create_bundle(
    export_dir: &Path,
    base_name: &str,
    texto: &str,
    document: &Value,
    session: &Value,
) -> Result<ExportBundle, ExportError> {
    std::fs::create_dir_all(export_dir)?;

    let timestamp = document
        .get("_meta")
        .and_then(|m| m.get("gerado_em"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string());
    let safe_name = base_name.replace(' ', "_").to_lowercase();
    let file_name = format!("{safe_name}-{}.tar.gz", timestamp.replace(':', "-"));
    let path = export_dir.join(&file_name);

    let document_bytes = serde_json::to_vec_pretty(document)?;
    let session_bytes = serde_json::to_vec_pretty(session)?;

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut tar = tar::Builder::new(encoder);
    append_entry(&mut tar, "documento.txt", texto.as_bytes())?;
    append_entry(&mut tar, "documento.json", &document_bytes)?;
    append_entry(&mut tar, "session.json", &session_bytes)?;
    let bytes = tar.into_inner()?.finish()?;

    std::fs::write(&path, &bytes)?;
    tracing::info!(path = %path.display(), size = bytes.len(), "Export bundle written");
    Ok(ExportBundle { bytes, path })
}

fn append_entry<W: Write>(
    tar: &mut tar::Builder<W>,
    name: &str,
    data: &[u8],
) -> Result<(), ExportError> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    tar.append_data(&mut header, name, data)?;
    Ok(())
}
