//! Pipeline orchestration: transcode, transcribe, diarize, align, persist.
//!
//! One request is processed strictly in stage order. Transcription and
//! diarization are data-independent but run sequentially to keep observed
//! behavior stable.

use crate::alignment::{align, AlignedEntry};
use crate::analysis::AnalysisClient;
use crate::audio::convert_to_wav;
use crate::combine::combine;
use crate::config::Settings;
use crate::diarization::DiarizationClient;
use crate::error::{Result, TolkError};
use crate::store::ResultStore;
use crate::transcription::WhisperClient;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Upload extensions accepted by the pipeline.
pub const SUPPORTED_FORMATS: &[&str] = &["mp3", "wav", "ogg", "m4a", "webm", "mp4"];

/// Outcome of a best-effort temp file removal. Never escalated; the caller
/// logs it and moves on.
pub struct CleanupOutcome {
    pub path: PathBuf,
    pub result: std::io::Result<()>,
}

impl CleanupOutcome {
    fn log(&self) {
        if let Err(e) = &self.result {
            warn!("Cleanup failed for {}: {}", self.path.display(), e);
        }
    }
}

/// Result of a full pipeline run.
pub struct ProcessOutcome {
    /// Speaker-labeled transcript.
    pub result: Vec<AlignedEntry>,
    /// Filename of the persisted record.
    pub saved_file: String,
}

/// The pipeline orchestrator. Holds every client, constructed once from the
/// resolved settings.
pub struct Pipeline {
    settings: Settings,
    whisper: WhisperClient,
    diarization: DiarizationClient,
    analysis: AnalysisClient,
    store: ResultStore,
    uploads_dir: PathBuf,
}

impl Pipeline {
    /// Create a pipeline, ensuring the uploads and results directories exist.
    pub fn new(settings: Settings) -> Result<Self> {
        let uploads_dir = settings.uploads_dir();
        std::fs::create_dir_all(&uploads_dir)?;

        let store = ResultStore::new(&settings.results_dir())?;
        let whisper = WhisperClient::new(&settings.transcription);
        let diarization = DiarizationClient::new(&settings.diarization);
        let analysis = AnalysisClient::new(&settings.analysis);

        Ok(Self {
            settings,
            whisper,
            diarization,
            analysis,
            store,
            uploads_dir,
        })
    }

    /// Validate an upload reference: present, on disk, supported format.
    pub fn validate_upload(&self, filename: Option<&str>) -> Result<PathBuf> {
        let filename = filename.ok_or_else(|| {
            TolkError::Validation("Filename is required in request body".to_string())
        })?;

        let input_path = self.uploads_dir.join(filename);
        if !input_path.exists() {
            return Err(TolkError::NotFound(
                "File not found in uploads directory".to_string(),
            ));
        }

        let ext = input_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
            return Err(TolkError::Validation("Unsupported file format".to_string()));
        }

        Ok(input_path)
    }

    /// Run the full pipeline on an uploaded file and persist the result.
    #[instrument(skip(self))]
    pub async fn process(&self, filename: Option<&str>) -> Result<ProcessOutcome> {
        let input_path = self.validate_upload(filename)?;

        let is_wav = input_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);

        let wav_path = if is_wav {
            input_path.clone()
        } else {
            convert_to_wav(&input_path).await?
        };

        let entries = self.run_stages(&wav_path).await;

        // The derived waveform is temporary; the original upload is kept.
        if wav_path != input_path {
            cleanup_file(&wav_path).await.log();
        }

        let entries = entries?;

        let original_file = input_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let saved_file = self.store.save(&original_file, entries.clone())?;
        info!("Saved result record {}", saved_file);

        Ok(ProcessOutcome {
            result: entries,
            saved_file,
        })
    }

    /// The remote stages, separated out so the caller can clean up the
    /// waveform on both success and failure paths.
    async fn run_stages(&self, wav_path: &Path) -> Result<Vec<AlignedEntry>> {
        info!("Transcribing {}", wav_path.display());
        let segments = self.whisper.transcribe(wav_path).await?;
        info!("Transcription completed ({} segments)", segments.len());

        let audio_url = self.public_audio_url(wav_path)?;
        let job_id = self.diarization.submit(&audio_url).await?;
        let intervals = self.diarization.poll(&job_id).await?;
        info!("Diarization completed ({} intervals)", intervals.len());

        Ok(align(&segments, &intervals))
    }

    /// Build the public URL under which the diarization service can fetch
    /// the waveform.
    fn public_audio_url(&self, wav_path: &Path) -> Result<String> {
        let file_name = wav_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| TolkError::Validation("Invalid waveform filename".to_string()))?;

        let mut url = url::Url::parse(&self.settings.server.public_base_url)?;
        url.path_segments_mut()
            .map_err(|_| TolkError::Config("public_base_url cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push("uploads")
            .push(file_name);

        Ok(url.to_string())
    }

    /// Merge consecutive same-speaker entries of a saved record into a new
    /// `*_combined.json` record.
    #[instrument(skip(self))]
    pub fn combine_saved(&self, filename: Option<&str>) -> Result<String> {
        let filename = filename.ok_or_else(|| {
            TolkError::Validation("Filename is required in request body".to_string())
        })?;

        let mut record = self.store.load(filename)?;
        record.transcription = combine(&record.transcription);

        let output_file = format!("{}_combined.json", filename.trim_end_matches(".json"));
        self.store.write(&output_file, &record)?;
        info!("Wrote combined record {}", output_file);

        Ok(output_file)
    }

    /// Analyze a saved record and attach the summary to it in place.
    #[instrument(skip(self))]
    pub async fn analyze_saved(&self, filename: Option<&str>) -> Result<String> {
        let filename = filename.ok_or_else(|| {
            TolkError::Validation("Filename is required in request body".to_string())
        })?;

        let record = self.store.load(filename)?;
        let analysis = self.analysis.analyze(&record.transcription).await?;

        self.store.update(filename, |record| {
            record.summary = Some(analysis.clone());
        })?;

        Ok(analysis)
    }

    /// The uploads directory served at `/uploads`.
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }
}

/// Best-effort file removal.
async fn cleanup_file(path: &Path) -> CleanupOutcome {
    let result = tokio::fs::remove_file(path).await;
    CleanupOutcome {
        path: path.to_path_buf(),
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline_with_uploads(dir: &Path) -> Pipeline {
        let mut settings = Settings::default();
        settings.server.uploads_dir = dir.join("uploads").to_string_lossy().into_owned();
        settings.server.results_dir = dir.join("results").to_string_lossy().into_owned();
        Pipeline::new(settings).unwrap()
    }

    #[test]
    fn test_validate_missing_filename() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with_uploads(dir.path());

        let err = pipeline.validate_upload(None).unwrap_err();
        assert!(matches!(err, TolkError::Validation(_)));
        assert_eq!(err.to_string(), "Filename is required in request body");
    }

    #[test]
    fn test_validate_absent_file() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with_uploads(dir.path());

        let err = pipeline.validate_upload(Some("sample.mp3")).unwrap_err();
        assert!(matches!(err, TolkError::NotFound(_)));
        assert_eq!(err.to_string(), "File not found in uploads directory");
    }

    #[test]
    fn test_validate_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with_uploads(dir.path());
        std::fs::write(pipeline.uploads_dir().join("sample.flac"), b"data").unwrap();

        let err = pipeline.validate_upload(Some("sample.flac")).unwrap_err();
        assert!(matches!(err, TolkError::Validation(_)));
        assert_eq!(err.to_string(), "Unsupported file format");
    }

    #[test]
    fn test_validate_supported_upload() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with_uploads(dir.path());
        std::fs::write(pipeline.uploads_dir().join("sample.mp3"), b"data").unwrap();

        let path = pipeline.validate_upload(Some("sample.mp3")).unwrap();
        assert!(path.ends_with("sample.mp3"));
    }

    #[test]
    fn test_public_audio_url_encodes_filename() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.server.uploads_dir = dir.path().join("uploads").to_string_lossy().into_owned();
        settings.server.results_dir = dir.path().join("results").to_string_lossy().into_owned();
        settings.server.public_base_url = "https://abc123.ngrok.io".to_string();
        let pipeline = Pipeline::new(settings).unwrap();

        let url = pipeline
            .public_audio_url(Path::new("/tmp/uploads/my interview.wav"))
            .unwrap();
        assert_eq!(url, "https://abc123.ngrok.io/uploads/my%20interview.wav");
    }

    #[test]
    fn test_combine_saved_writes_combined_record() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with_uploads(dir.path());

        let entries = vec![
            AlignedEntry {
                speaker: "A".to_string(),
                text: "one".to_string(),
                start: 0.0,
                end: 1.0,
            },
            AlignedEntry {
                speaker: "A".to_string(),
                text: "two".to_string(),
                start: 1.0,
                end: 2.0,
            },
        ];
        let saved = pipeline.store.save("interview.mp3", entries).unwrap();

        let output = pipeline.combine_saved(Some(&saved)).unwrap();
        assert!(output.ends_with("_combined.json"));

        let combined = pipeline.store.load(&output).unwrap();
        assert_eq!(combined.transcription.len(), 1);
        assert_eq!(combined.transcription[0].text, "one two");
    }

    #[test]
    fn test_combine_saved_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with_uploads(dir.path());

        let err = pipeline.combine_saved(Some("missing.json")).unwrap_err();
        assert!(matches!(err, TolkError::NotFound(_)));
    }
}
