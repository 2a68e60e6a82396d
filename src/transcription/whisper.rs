//! OpenAI Whisper transcription client.

use super::models::{shift_segments, TranscriptSegment};
use crate::audio::split_into_chunks;
use crate::config::TranscriptionSettings;
use crate::error::{Result, TolkError};
use crate::openai::create_client;
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Whisper-based transcription client.
///
/// Inputs at or above the configured size threshold are split into
/// fixed-duration chunks first, since the remote API rejects large uploads.
pub struct WhisperClient {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    chunk_duration_seconds: u32,
    size_threshold_bytes: u64,
}

impl WhisperClient {
    /// Create a new Whisper client from transcription settings.
    pub fn new(settings: &TranscriptionSettings) -> Self {
        Self {
            client: create_client(),
            model: settings.model.clone(),
            chunk_duration_seconds: settings.chunk_duration_seconds,
            size_threshold_bytes: settings.size_threshold_bytes,
        }
    }

    /// Transcribe an audio file, chunking it first if it is too large for a
    /// single request.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    pub async fn transcribe(&self, audio_path: &Path) -> Result<Vec<TranscriptSegment>> {
        let file_size = tokio::fs::metadata(audio_path).await?.len();

        if file_size < self.size_threshold_bytes {
            return self.transcribe_single(audio_path).await;
        }

        info!(
            "File is {} bytes, splitting into {}s chunks",
            file_size, self.chunk_duration_seconds
        );
        self.transcribe_chunked(audio_path).await
    }

    /// Transcribe a single audio file (no splitting).
    async fn transcribe_single(&self, audio_path: &Path) -> Result<Vec<TranscriptSegment>> {
        debug!("Transcribing {}", audio_path.display());

        let file_bytes = tokio::fs::read(audio_path).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(async_openai::types::AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.wav")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .build()
            .map_err(|e| TolkError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| TolkError::OpenAI(format!("Whisper API error: {}", e)))?;

        let segments: Vec<TranscriptSegment> = response
            .segments
            .map(|segs| {
                segs.iter()
                    .map(|s| {
                        TranscriptSegment::new(
                            s.start as f64,
                            s.end as f64,
                            s.text.trim().to_string(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_else(|| {
                // Fallback: single segment covering the whole file
                vec![TranscriptSegment::new(
                    0.0,
                    response.duration as f64,
                    response.text.trim().to_string(),
                )]
            });

        debug!("Transcribed {} segments", segments.len());
        Ok(segments)
    }

    /// Transcribe a large file by splitting it into chunks, transcribing
    /// each in order, and shifting timestamps onto the global timeline.
    ///
    /// Every chunk file is deleted right after its transcription attempt,
    /// whether it succeeded or not. Any chunk failure aborts the whole
    /// transcription; no partial result is returned.
    async fn transcribe_chunked(&self, audio_path: &Path) -> Result<Vec<TranscriptSegment>> {
        let chunks = split_into_chunks(audio_path, self.chunk_duration_seconds).await?;
        let scratch_dir = chunks.first().and_then(|p| p.parent().map(Path::to_path_buf));

        info!("Transcribing {} chunks with {}", chunks.len(), self.model);

        let mut all_segments = Vec::new();
        let mut failure: Option<TolkError> = None;

        for (idx, chunk_path) in chunks.iter().enumerate() {
            let result = self.transcribe_single(chunk_path).await;

            // Per-chunk finally: the file goes away no matter what
            if let Err(e) = tokio::fs::remove_file(chunk_path).await {
                warn!("Failed to remove chunk {}: {}", chunk_path.display(), e);
            }

            match result {
                Ok(mut segments) => {
                    let offset = idx as f64 * self.chunk_duration_seconds as f64;
                    shift_segments(&mut segments, offset);
                    all_segments.extend(segments);
                }
                Err(e) => {
                    failure = Some(TolkError::Transcription(format!(
                        "Chunk {} failed: {}",
                        idx, e
                    )));
                    break;
                }
            }
        }

        if failure.is_some() {
            // Remaining chunks were never visited by the loop above
            for chunk_path in &chunks {
                if chunk_path.exists() {
                    if let Err(e) = tokio::fs::remove_file(chunk_path).await {
                        warn!("Failed to remove chunk {}: {}", chunk_path.display(), e);
                    }
                }
            }
        }

        if let Some(dir) = scratch_dir {
            // Only succeeds once all chunk files are gone
            if let Err(e) = tokio::fs::remove_dir(&dir).await {
                warn!("Failed to remove scratch dir {}: {}", dir.display(), e);
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(all_segments),
        }
    }
}
