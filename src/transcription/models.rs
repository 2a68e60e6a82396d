//! Data models for transcription.

use serde::{Deserialize, Serialize};

/// A timestamped span of recognized speech, independent of speaker identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Recognized text.
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: String) -> Self {
        Self { start, end, text }
    }
}

/// Shifts chunk-local segment timestamps onto the global timeline.
pub fn shift_segments(segments: &mut [TranscriptSegment], offset_seconds: f64) {
    for segment in segments {
        segment.start += offset_seconds;
        segment.end += offset_seconds;
    }
}
