//! Persistence of pipeline results as JSON records.
//!
//! One file per processed recording, named after the original upload plus a
//! filesystem-safe timestamp so repeated runs on the same input never
//! collide. Updates rewrite the whole file; last writer wins.

use crate::alignment::AlignedEntry;
use crate::error::{Result, TolkError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// A persisted pipeline result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    /// Name of the uploaded file this record was produced from.
    pub original_file: String,
    /// When the pipeline completed.
    pub processed_at: DateTime<Utc>,
    /// Speaker-labeled transcript.
    pub transcription: Vec<AlignedEntry>,
    /// Analysis summary, attached after the fact if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// File-backed store for [`ResultRecord`]s.
pub struct ResultStore {
    results_dir: PathBuf,
}

impl ResultStore {
    /// Create a store rooted at `results_dir`, creating it if needed.
    pub fn new(results_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(results_dir)?;
        Ok(Self {
            results_dir: results_dir.to_path_buf(),
        })
    }

    /// Persist a new record for `original_file`, returning the stored
    /// filename.
    #[instrument(skip(self, entries))]
    pub fn save(&self, original_file: &str, entries: Vec<AlignedEntry>) -> Result<String> {
        let record = ResultRecord {
            original_file: original_file.to_string(),
            processed_at: Utc::now(),
            transcription: entries,
            summary: None,
        };

        let stem = Path::new(original_file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("result");
        let filename = format!("{}_{}.json", stem, timestamp_for_filename(&record.processed_at));

        self.write(&filename, &record)?;
        Ok(filename)
    }

    /// Load a previously stored record.
    pub fn load(&self, filename: &str) -> Result<ResultRecord> {
        let path = self.results_dir.join(filename);
        if !path.exists() {
            return Err(TolkError::NotFound(
                "Result file not found in results directory".to_string(),
            ));
        }

        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply a mutation to a stored record and rewrite it in place.
    pub fn update<F>(&self, filename: &str, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut ResultRecord),
    {
        let mut record = self.load(filename)?;
        mutate(&mut record);
        self.write(filename, &record)
    }

    /// Write a record under an explicit filename (e.g. `*_combined.json`).
    pub fn write(&self, filename: &str, record: &ResultRecord) -> Result<()> {
        let path = self.results_dir.join(filename);
        let content = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, content)?;
        debug!("Wrote result record {}", path.display());
        Ok(())
    }
}

/// Render a timestamp safe for filenames: colons and periods become dashes.
fn timestamp_for_filename(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339().replace([':', '.'], "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> Vec<AlignedEntry> {
        vec![AlignedEntry {
            speaker: "SPEAKER_00".to_string(),
            text: "hello".to_string(),
            start: 0.0,
            end: 1.0,
        }]
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path()).unwrap();

        let filename = store.save("interview.mp3", sample_entries()).unwrap();
        assert!(filename.starts_with("interview_"));
        assert!(filename.ends_with(".json"));

        let record = store.load(&filename).unwrap();
        assert_eq!(record.original_file, "interview.mp3");
        assert_eq!(record.transcription.len(), 1);
        assert!(record.summary.is_none());
    }

    #[test]
    fn test_filename_is_filesystem_safe() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path()).unwrap();

        let filename = store.save("interview.mp3", sample_entries()).unwrap();
        let stem = filename.trim_end_matches(".json");
        assert!(!stem.contains(':'));
        assert!(!stem.contains('.'));
    }

    #[test]
    fn test_update_attaches_summary() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path()).unwrap();

        let filename = store.save("interview.mp3", sample_entries()).unwrap();
        store
            .update(&filename, |record| {
                record.summary = Some("solid candidate".to_string());
            })
            .unwrap();

        let record = store.load(&filename).unwrap();
        assert_eq!(record.summary.as_deref(), Some("solid candidate"));
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path()).unwrap();

        let err = store.load("nope.json").unwrap_err();
        assert!(matches!(err, TolkError::NotFound(_)));
    }

    #[test]
    fn test_camel_case_wire_format() {
        let record = ResultRecord {
            original_file: "a.mp3".to_string(),
            processed_at: Utc::now(),
            transcription: vec![],
            summary: None,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("originalFile"));
        assert!(json.contains("processedAt"));
        assert!(!json.contains("summary"));
    }
}
