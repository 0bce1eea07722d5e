//! Lightweight session history as JSONL files.
//!
//! One directory per day, one file per session, one JSON record per line.
//! History is best-effort audit material: corrupt lines are skipped, a
//! missing file simply yields nothing.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A recent session file and when it was last written to.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub path: PathBuf,
    /// `"YYYY-MM-DD — <session id>"`, for display.
    pub label: String,
    pub updated_at: std::time::SystemTime,
}

/// JSONL session store rooted at a base directory.
pub struct HistoryStore {
    base_dir: PathBuf,
}

impl HistoryStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Create (touch) a new session file under today's directory.
    pub fn new_session_file(&self) -> Result<PathBuf, HistoryError> {
        let now = Local::now();
        let day_dir = self.base_dir.join(now.format("%Y-%m-%d").to_string());
        std::fs::create_dir_all(&day_dir)?;
        let path = day_dir.join(format!("session-{}.jsonl", now.timestamp()));
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(path)
    }

    /// Append one record as a single JSON line.
    pub fn append_record(&self, path: &Path, record: &Value) -> Result<(), HistoryError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Most recently written session files, newest first.
    pub fn list_recent(&self, limit: usize) -> Vec<SessionEntry> {
        let mut entries = Vec::new();
        let Ok(days) = std::fs::read_dir(&self.base_dir) else {
            return entries;
        };
        for day in days.flatten() {
            let day_path = day.path();
            if !day_path.is_dir() {
                continue;
            }
            let day_name = day.file_name().to_string_lossy().to_string();
            let Ok(files) = std::fs::read_dir(&day_path) else {
                continue;
            };
            for file in files.flatten() {
                let path = file.path();
                let name = file.file_name().to_string_lossy().to_string();
                if !name.starts_with("session-") || !name.ends_with(".jsonl") {
                    continue;
                }
                let Ok(meta) = file.metadata() else {
                    continue;
                };
                let updated_at = meta.modified().unwrap_or(std::time::UNIX_EPOCH);
                let session_id = name
                    .trim_start_matches("session-")
                    .trim_end_matches(".jsonl");
                entries.push(SessionEntry {
                    path,
                    label: format!("{day_name} — {session_id}"),
                    updated_at,
                });
            }
        }
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        entries.truncate(limit);
        entries
    }

    /// Last well-formed record of a session file, if any.
    pub fn load_last_record(&self, path: &Path) -> Option<Value> {
        let file = std::fs::File::open(path).ok()?;
        let reader = std::io::BufReader::new(file);
        let mut last = None;
        for line in reader.lines().map_while(Result::ok) {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&line) {
                Ok(record) => last = Some(record),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping corrupt history line");
                }
            }
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_file_lands_in_day_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path()).unwrap();
        let path = store.new_session_file().unwrap();

        assert!(path.exists());
        let day = path.parent().unwrap().file_name().unwrap().to_str().unwrap();
        assert_eq!(day, Local::now().format("%Y-%m-%d").to_string());
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("session-"));
    }

    #[test]
    fn append_and_load_last_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path()).unwrap();
        let path = store.new_session_file().unwrap();

        store.append_record(&path, &json!({"seq": 1})).unwrap();
        store.append_record(&path, &json!({"seq": 2})).unwrap();

        let last = store.load_last_record(&path).unwrap();
        assert_eq!(last["seq"], 2);
    }

    #[test]
    fn corrupt_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path()).unwrap();
        let path = dir.path().join("2026-08-30").join("session-1.jsonl");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{\"seq\": 1}\nnão é json\n\n").unwrap();

        let last = store.load_last_record(&path).unwrap();
        assert_eq!(last["seq"], 1);
    }

    #[test]
    fn missing_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path()).unwrap();
        assert!(store.load_last_record(&dir.path().join("nada.jsonl")).is_none());
    }

    #[test]
    fn list_recent_orders_newest_first_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path()).unwrap();

        let day = dir.path().join("2026-08-29");
        std::fs::create_dir_all(&day).unwrap();
        for i in 0..3 {
            let path = day.join(format!("session-{i}.jsonl"));
            std::fs::write(&path, "{}\n").unwrap();
            // Distinct mtimes so the ordering is deterministic.
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        let entries = store.list_recent(2);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].updated_at >= entries[1].updated_at);
        assert!(entries[0].label.starts_with("2026-08-29 — "));
    }

    #[test]
    fn list_recent_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path()).unwrap();
        let day = dir.path().join("2026-08-29");
        std::fs::create_dir_all(&day).unwrap();
        std::fs::write(day.join("notes.txt"), "x").unwrap();
        std::fs::write(day.join("session-9.jsonl"), "{}\n").unwrap();

        let entries = store.list_recent(10);
        assert_eq!(entries.len(), 1);
    }
}
